//! Component categories and their update rate.
//!
//! Every [`Component`](crate::component::Component) is statically tagged with
//! a [`Category`]. Categories are declared up front in a [`CategorySet`], each
//! with a [`CategoryKind`] that decides whether the category is advanced by the
//! fixed-step simulation loop or once per rendered frame.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Typed identifier of a component category.
///
/// Categories are compared by name. The associated constants cover the
/// standard trading-game layout returned by [`CategorySet::standard`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(&'static str);

impl Category {
    /// Cities: production and consumption of goods.
    pub const CITIES: Category = Category::new("cities");
    /// Merchants: travelling traders.
    pub const MERCHANTS: Category = Category::new("merchants");
    /// Markets: price formation.
    pub const MARKETS: Category = Category::new("markets");
    /// Sprites: map visuals.
    pub const SPRITES: Category = Category::new("sprites");
    /// Labels: text overlays on the map.
    pub const LABELS: Category = Category::new("labels");
    /// Menus: modal overlay panels.
    pub const MENUS: Category = Category::new("menus");

    /// Create a category identifier.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The category name.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category({})", self.0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// ---------------------------------------------------------------------------
// CategoryKind
// ---------------------------------------------------------------------------

/// How often the components of a category are updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    /// Updated once per fixed simulation tick with the tick length as delta.
    Simulation,
    /// Updated once per frame with the leftover lag as delta. Must not
    /// mutate simulation state.
    Presentation,
}

// ---------------------------------------------------------------------------
// CategorySet
// ---------------------------------------------------------------------------

/// The declared categories, in declaration order.
///
/// Declaration order is the update order between categories of the same
/// kind.
#[derive(Debug, Clone, Default)]
pub struct CategorySet {
    entries: Vec<(Category, CategoryKind)>,
}

impl CategorySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard trading-game categories.
    ///
    /// Simulation: `cities`, `merchants`, `markets`.
    /// Presentation: `sprites`, `labels`, `menus`.
    pub fn standard() -> Self {
        use CategoryKind::{Presentation, Simulation};
        Self {
            entries: vec![
                (Category::CITIES, Simulation),
                (Category::MERCHANTS, Simulation),
                (Category::MARKETS, Simulation),
                (Category::SPRITES, Presentation),
                (Category::LABELS, Presentation),
                (Category::MENUS, Presentation),
            ],
        }
    }

    /// Build a set from a list of simulation and a list of presentation
    /// categories. Simulation categories are declared first.
    pub fn from_lists(
        simulation: &[Category],
        presentation: &[Category],
    ) -> Result<Self, CoreError> {
        let mut set = Self::new();
        for &category in simulation {
            set.declare(category, CategoryKind::Simulation)?;
        }
        for &category in presentation {
            set.declare(category, CategoryKind::Presentation)?;
        }
        Ok(set)
    }

    /// Declare a category.
    ///
    /// # Errors
    ///
    /// [`CoreError::DuplicateCategory`] if the category is already declared,
    /// whatever its kind.
    pub fn declare(&mut self, category: Category, kind: CategoryKind) -> Result<(), CoreError> {
        if self.contains(category) {
            return Err(CoreError::DuplicateCategory(category.name().to_owned()));
        }
        self.entries.push((category, kind));
        Ok(())
    }

    /// Whether the category has been declared.
    pub fn contains(&self, category: Category) -> bool {
        self.position(category).is_some()
    }

    /// The kind of a declared category.
    pub fn kind_of(&self, category: Category) -> Option<CategoryKind> {
        self.position(category).map(|i| self.entries[i].1)
    }

    /// Declaration index of a category.
    pub fn position(&self, category: Category) -> Option<usize> {
        self.entries.iter().position(|(c, _)| *c == category)
    }

    /// The category declared at `index`.
    pub fn get(&self, index: usize) -> Option<(Category, CategoryKind)> {
        self.entries.get(index).copied()
    }

    /// All declared categories with their kind, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, CategoryKind)> + '_ {
        self.entries.iter().copied()
    }

    /// Declared categories of one kind, in declaration order.
    pub fn of_kind(&self, kind: CategoryKind) -> impl Iterator<Item = Category> + '_ {
        self.entries
            .iter()
            .filter(move |(_, k)| *k == kind)
            .map(|(c, _)| *c)
    }

    /// Number of declared categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no category has been declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Comma-separated category names, used in error messages.
    pub fn names(&self) -> String {
        self.entries
            .iter()
            .map(|(c, _)| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
