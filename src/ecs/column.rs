//! Type-erased component columns
//!
//! Each archetype stores one column per component type. A column is a
//! [`PagedVector`] of the component behind a [`Column`] trait object, so
//! the archetype can move rows around without knowing element types.
//! Typed access goes through `Any` downcasts, which are always checked.
//!
//! Values are addressed by row index, never by entity id; the archetype's
//! entity index map owns that translation.

use std::any::Any;

use crate::collections::PagedVector;
use crate::error::{Error, Result};
use crate::mem::{Allocator, SystemAllocator};

/// Types usable as components.
///
/// `Default` provides the value a freshly added entity starts with, and
/// `Clone` lets rows be copied between archetypes during migration.
pub trait Component: 'static + Default + Clone {}

impl<T: 'static + Default + Clone> Component for T {}

/// Uniform interface over a typed component column.
pub trait Column<A: Allocator + Clone + 'static>: 'static {
    /// Number of rows.
    fn len(&self) -> usize;

    /// Appends a default-initialised row.
    fn push_default(&mut self);

    /// Appends a copy of `other[row]`. `other` must be a column of the
    /// same component type.
    fn push_from(&mut self, other: &dyn Column<A>, row: usize);

    /// Removes a row, shifting the rows after it down.
    fn erase(&mut self, row: usize) -> Result<()>;

    /// Copies `self[from]` over `self[to]`.
    fn move_within(&mut self, from: usize, to: usize);

    /// Copies `other[from]` over `self[to]`. `other` must be a column of
    /// the same component type.
    fn move_from(&mut self, other: &dyn Column<A>, from: usize, to: usize);

    /// A new, empty column of the same component type and allocator.
    fn clone_empty(&self) -> Box<dyn Column<A>>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The typed storage behind a [`Column`] object.
pub struct ColumnStorage<C: Component, A: Allocator + Clone + 'static = SystemAllocator> {
    items: PagedVector<C, A>,
}

impl<C: Component, A: Allocator + Clone + 'static> ColumnStorage<C, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            items: PagedVector::new_in(alloc),
        }
    }

    /// The underlying paged storage. Row addresses are stable for the
    /// lifetime of the column.
    pub fn items(&self) -> &PagedVector<C, A> {
        &self.items
    }

    pub fn get(&self, row: usize) -> Option<&C> {
        self.items.get(row)
    }

    /// Overwrites an existing row. Fails with `OutOfRange` past the end.
    pub fn set(&mut self, row: usize, value: C) -> Result<()> {
        match self.items.get_mut(row) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::OutOfRange("row past end of column")),
        }
    }

    pub fn push(&mut self, value: C) {
        self.items.push(value);
    }
}

fn typed<C: Component, A: Allocator + Clone + 'static>(
    column: &dyn Column<A>,
) -> &ColumnStorage<C, A> {
    match column.as_any().downcast_ref::<ColumnStorage<C, A>>() {
        Some(storage) => storage,
        None => panic!("component column type mismatch"),
    }
}

impl<C: Component, A: Allocator + Clone + 'static> Column<A> for ColumnStorage<C, A> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn push_default(&mut self) {
        self.items.push(C::default());
    }

    fn push_from(&mut self, other: &dyn Column<A>, row: usize) {
        let other = typed::<C, A>(other);
        self.items.push(other.items[row].clone());
    }

    fn erase(&mut self, row: usize) -> Result<()> {
        self.items.erase(row, row + 1)
    }

    fn move_within(&mut self, from: usize, to: usize) {
        let value = self.items[from].clone();
        self.items[to] = value;
    }

    fn move_from(&mut self, other: &dyn Column<A>, from: usize, to: usize) {
        let other = typed::<C, A>(other);
        self.items[to] = other.items[from].clone();
    }

    fn clone_empty(&self) -> Box<dyn Column<A>> {
        Box::new(Self::new_in(self.items.allocator().clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
