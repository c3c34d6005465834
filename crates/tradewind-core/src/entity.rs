//! Entity identifiers, game objects, and the kind-indexed entity registry.
//!
//! A [`GameObject`] is a bundle of named components plus an optional kind tag
//! such as `"city"`. Adding it to a [`World`](crate::world::World) hands each
//! component to the component registry; the world keeps only an
//! [`EntityRecord`] with the resulting [`ComponentId`]s.
//!
//! [`GameObjectRegistry`] buckets records by kind. Buckets are declared at
//! construction; entities of an unset or undeclared kind go to the
//! [`UNNAMED`] bucket instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentId};

/// Name of the fallback bucket.
pub const UNNAMED: &str = "unnamed";

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Handle to a live entity. Stale once the entity is despawned.
///
/// Packs a slot number in the low half and the slot's reuse count in the
/// high half.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Pack a slot number and reuse count.
    #[inline]
    pub fn new(slot: u32, generation: u32) -> Self {
        Self(u64::from(generation) << 32 | u64::from(slot))
    }

    /// Slot number.
    #[inline]
    pub fn index(self) -> u32 {
        (self.0 & u64::from(u32::MAX)) as u32
    }

    /// How many times the slot was reused before this handle.
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId(e{}.{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}.{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct EntitySlot {
    generation: u32,
    live: bool,
}

/// Hands out [`EntityId`]s. A despawned slot is reused with a bumped
/// generation, so old handles never match the new occupant.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<EntitySlot>,
    /// Despawned slots, most recent last.
    vacant: Vec<u32>,
    live: usize,
}

impl EntityAllocator {
    /// Create an allocator with no slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: the most recently vacated slot, or a new one.
    pub fn allocate(&mut self) -> EntityId {
        self.live += 1;
        match self.vacant.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.live = true;
                EntityId::new(slot, entry.generation)
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(EntitySlot {
                    generation: 0,
                    live: true,
                });
                EntityId::new(slot, 0)
            }
        }
    }

    /// Retire `id`. Returns `false` for a stale or unknown id.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let entry = &mut self.slots[id.index() as usize];
        entry.live = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.vacant.push(id.index());
        self.live -= 1;
        true
    }

    /// Whether `id` names a live slot at its current generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index() as usize)
            .is_some_and(|s| s.live && s.generation == id.generation())
    }

    /// Number of live entities.
    pub fn alive_count(&self) -> usize {
        self.live
    }
}

// ---------------------------------------------------------------------------
// GameObject
// ---------------------------------------------------------------------------

/// A freshly constructed entity that still owns its components.
///
/// Components are keyed by field name, one per name, and kept in insertion
/// order. That order is the order in which they are registered.
#[derive(Default)]
pub struct GameObject {
    kind: Option<String>,
    components: Vec<(String, Box<dyn Component>)>,
}

impl GameObject {
    /// Create an empty game object with an optional kind tag.
    pub fn new(kind: Option<&str>) -> Self {
        Self {
            kind: kind.map(str::to_owned),
            components: Vec::new(),
        }
    }

    /// Attach a component under `name` (builder style).
    pub fn with(mut self, name: &str, component: impl Component + 'static) -> Self {
        self.insert(name, Box::new(component));
        self
    }

    /// Attach a boxed component under `name`, replacing any component
    /// previously attached under the same name.
    pub fn insert(&mut self, name: &str, component: Box<dyn Component>) {
        match self.components.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = component,
            None => self.components.push((name.to_owned(), component)),
        }
    }

    /// The kind tag.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Field names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, component)` pairs, in insertion order.
    pub fn components(&self) -> impl Iterator<Item = (&str, &dyn Component)> {
        self.components.iter().map(|(n, c)| (n.as_str(), c.as_ref()))
    }

    /// Number of attached components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no component is attached.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Vec<(String, Box<dyn Component>)>) {
        (self.kind, self.components)
    }
}

impl fmt::Debug for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObject")
            .field("kind", &self.kind)
            .field("components", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// What the world remembers about a registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// The entity's id.
    pub id: EntityId,
    /// Kind tag as given by the factory, even if it fell back to
    /// [`UNNAMED`].
    pub kind: Option<String>,
    /// `(field name, component id)` pairs, in registration order.
    pub components: Vec<(String, ComponentId)>,
}

impl EntityRecord {
    /// Id of the component registered under `name`.
    pub fn component(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// The bucket an entity was placed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// A declared kind.
    Kind(String),
    /// The fallback bucket.
    Unnamed,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Kind(kind) => f.write_str(kind),
            Bucket::Unnamed => f.write_str(UNNAMED),
        }
    }
}

// ---------------------------------------------------------------------------
// GameObjectRegistry
// ---------------------------------------------------------------------------

/// Entity records bucketed by kind, each bucket in insertion order.
///
/// Bucket membership is decided once, on insert.
#[derive(Debug, Clone, Default)]
pub struct GameObjectRegistry {
    buckets: Vec<(String, Vec<EntityRecord>)>,
    unnamed: Vec<EntityRecord>,
}

impl GameObjectRegistry {
    /// Create a registry with one bucket per declared kind.
    ///
    /// Duplicate kinds collapse into one bucket.
    pub fn new<S: AsRef<str>>(kinds: &[S]) -> Self {
        let mut buckets: Vec<(String, Vec<EntityRecord>)> = Vec::new();
        for kind in kinds {
            let kind = kind.as_ref();
            if !buckets.iter().any(|(k, _)| k == kind) {
                buckets.push((kind.to_owned(), Vec::new()));
            }
        }
        Self {
            buckets,
            unnamed: Vec::new(),
        }
    }

    /// Index of the bucket for `kind`, if declared.
    fn bucket_index(&self, kind: Option<&str>) -> Option<usize> {
        let kind = kind?;
        self.buckets.iter().position(|(k, _)| k == kind)
    }

    /// Append a record to its kind's bucket, or to the fallback bucket.
    pub fn insert(&mut self, record: EntityRecord) -> Bucket {
        match self.bucket_index(record.kind.as_deref()) {
            Some(idx) => {
                let bucket = Bucket::Kind(self.buckets[idx].0.clone());
                self.buckets[idx].1.push(record);
                bucket
            }
            None => {
                tracing::debug!(
                    entity = %record.id,
                    kind = record.kind.as_deref().unwrap_or("<unset>"),
                    "no bucket for entity kind -- using '{UNNAMED}'"
                );
                self.unnamed.push(record);
                Bucket::Unnamed
            }
        }
    }

    /// Remove a record, keeping the order of the rest of its bucket.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityRecord> {
        for (_, list) in &mut self.buckets {
            if let Some(pos) = list.iter().position(|r| r.id == id) {
                return Some(list.remove(pos));
            }
        }
        let pos = self.unnamed.iter().position(|r| r.id == id)?;
        Some(self.unnamed.remove(pos))
    }

    /// Records of a declared kind, or `None` if the kind has no bucket.
    pub fn entities(&self, kind: &str) -> Option<&[EntityRecord]> {
        self.bucket_index(Some(kind))
            .map(|idx| self.buckets[idx].1.as_slice())
    }

    /// Records in the fallback bucket.
    pub fn unnamed(&self) -> &[EntityRecord] {
        &self.unnamed
    }

    /// Look a record up by id.
    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.iter().find(|r| r.id == id)
    }

    /// The bucket holding `id`.
    pub fn bucket_of(&self, id: EntityId) -> Option<Bucket> {
        if let Some((kind, _)) = self
            .buckets
            .iter()
            .find(|(_, list)| list.iter().any(|r| r.id == id))
        {
            return Some(Bucket::Kind(kind.clone()));
        }
        self.unnamed
            .iter()
            .any(|r| r.id == id)
            .then_some(Bucket::Unnamed)
    }

    /// Declared kinds, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(k, _)| k.as_str())
    }

    /// All records: declared buckets in order, then the fallback bucket.
    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.buckets
            .iter()
            .flat_map(|(_, list)| list.iter())
            .chain(self.unnamed.iter())
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|(_, l)| l.len()).sum::<usize>() + self.unnamed.len()
    }

    /// Whether the registry holds no record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(alloc: &mut EntityAllocator, kind: Option<&str>) -> EntityRecord {
        EntityRecord {
            id: alloc.allocate(),
            kind: kind.map(str::to_owned),
            components: Vec::new(),
        }
    }

    // -- allocator ----------------------------------------------------------

    #[test]
    fn vacated_slot_is_reused_with_new_generation() {
        let mut slots = EntityAllocator::new();
        let first = slots.allocate();
        let second = slots.allocate();
        assert!(slots.deallocate(first));

        let reused = slots.allocate();
        assert_eq!(reused.index(), first.index());
        assert_eq!(reused.generation(), 1);
        assert_ne!(reused, first);
        assert!(!slots.is_alive(first));
        assert!(slots.is_alive(second) && slots.is_alive(reused));
        assert_eq!(slots.alive_count(), 2);
        assert_eq!(reused.to_string(), "e0.1");
    }

    #[test]
    fn stale_handles_cannot_be_retired_twice() {
        let mut slots = EntityAllocator::new();
        let id = slots.allocate();
        assert!(slots.deallocate(id));
        assert!(!slots.deallocate(id));
        assert!(!slots.deallocate(EntityId::new(42, 0)));
        assert_eq!(slots.alive_count(), 0);
    }

    // -- buckets ------------------------------------------------------------

    #[test]
    fn declared_kind_goes_to_its_bucket() {
        let mut alloc = EntityAllocator::new();
        let mut reg = GameObjectRegistry::new(&["city", "merchant"]);
        let r = record(&mut alloc, Some("city"));
        let id = r.id;

        assert_eq!(reg.insert(r), Bucket::Kind("city".to_owned()));
        assert_eq!(reg.entities("city").unwrap().len(), 1);
        assert_eq!(reg.bucket_of(id), Some(Bucket::Kind("city".to_owned())));
    }

    #[test]
    fn unknown_and_unset_kinds_fall_back() {
        let mut alloc = EntityAllocator::new();
        let mut reg = GameObjectRegistry::new(&["city"]);

        assert_eq!(reg.insert(record(&mut alloc, Some("pirate"))), Bucket::Unnamed);
        assert_eq!(reg.insert(record(&mut alloc, None)), Bucket::Unnamed);

        assert_eq!(reg.unnamed().len(), 2);
        assert_eq!(reg.unnamed()[0].kind.as_deref(), Some("pirate"));
        assert!(reg.entities("pirate").is_none());
        assert_eq!(reg.entities("city").unwrap().len(), 0);
    }

    #[test]
    fn remove_keeps_bucket_order() {
        let mut alloc = EntityAllocator::new();
        let mut reg = GameObjectRegistry::new(&["city"]);
        let ids: Vec<_> = (0..3)
            .map(|_| {
                let r = record(&mut alloc, Some("city"));
                let id = r.id;
                reg.insert(r);
                id
            })
            .collect();

        assert!(reg.remove(ids[0]).is_some());
        let left: Vec<_> = reg.entities("city").unwrap().iter().map(|r| r.id).collect();
        assert_eq!(left, vec![ids[1], ids[2]]);
        assert!(reg.remove(ids[0]).is_none());
    }

    // -- game objects -------------------------------------------------------

    struct Dummy(u8);

    impl Component for Dummy {
        fn category(&self) -> crate::category::Category {
            crate::category::Category::CITIES
        }

        fn update(
            &mut self,
            _ctx: &mut crate::context::EngineContext,
            _delta: f64,
        ) -> Result<bool, crate::ComponentError> {
            Ok(true)
        }
    }

    #[test]
    fn game_object_keeps_one_component_per_name() {
        let obj = GameObject::new(Some("city"))
            .with("granary", Dummy(1))
            .with("market", Dummy(2))
            .with("granary", Dummy(3));

        assert_eq!(obj.names().collect::<Vec<_>>(), vec!["granary", "market"]);
        let (_, first) = obj.components().next().unwrap();
        assert_eq!(first.as_any().downcast_ref::<Dummy>().unwrap().0, 3);
    }
}
