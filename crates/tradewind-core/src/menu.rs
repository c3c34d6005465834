//! Stack of open overlay menus.
//!
//! Menus are presentation components; the stack refers to them by
//! [`ComponentId`]. Opening or closing a menu marks the stack dirty, and the
//! render scheduler calls [`MenuStack::consume_dirty`] once per frame to
//! decide whether the overlay has to be projected again.

use crate::component::ComponentId;

/// Ordered list of open overlay components plus a dirty flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuStack {
    open: Vec<ComponentId>,
    dirty: bool,
}

impl MenuStack {
    /// Create an empty, clean stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a menu on top and mark the stack dirty.
    pub fn open(&mut self, menu: ComponentId) {
        self.open.push(menu);
        self.dirty = true;
    }

    /// Remove the first occurrence of `menu`.
    ///
    /// Closing a menu that is not open is a no-op and leaves the dirty flag
    /// untouched. Returns whether a menu was removed.
    pub fn close(&mut self, menu: ComponentId) -> bool {
        match self.open.iter().position(|&m| m == menu) {
            Some(pos) => {
                self.open.remove(pos);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Return the dirty flag and clear it.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Whether the stack changed since the last [`consume_dirty`](Self::consume_dirty).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Open menus, bottom first.
    pub fn entries(&self) -> &[ComponentId] {
        &self.open
    }

    /// The top-most open menu.
    pub fn top(&self) -> Option<ComponentId> {
        self.open.last().copied()
    }

    /// Whether `menu` is open.
    pub fn contains(&self, menu: ComponentId) -> bool {
        self.open.contains(&menu)
    }

    /// Number of open menus.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Whether no menu is open.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
