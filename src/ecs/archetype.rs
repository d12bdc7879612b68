//! Archetypes
//!
//! An archetype is the storage shared by every entity with one exact set
//! of component types: one erased column per type, all kept at the same
//! length, plus a dense map from entity to row. Every archetype also
//! carries an implicit `Entity` column so a row can name its owner.
//!
//! Removal compacts by moving the last row into the hole, so rows are
//! dense but unordered.

use crate::collections::{DenseMap, HashTable};
use crate::ecs::column::{Column, ColumnStorage, Component};
use crate::ecs::entity::{component_id, Entity};
use crate::error::{Error, Result};
use crate::mem::{Allocator, SystemAllocator};

/// A set of component types, realised as tuples of up to eight
/// components.
///
/// This is the variadic surface of the ECS: operations like
/// `add_components::<(Position, Velocity)>` are driven entirely through
/// this trait.
pub trait ComponentSet {
    /// Number of component types in the set.
    const COUNT: usize;

    /// XOR of the per-type component ids; 0 for the empty set.
    fn combined_id() -> u64;

    /// Invokes `f` with every component id in the set.
    fn for_each_id(f: impl FnMut(u64));

    /// Adds one empty column per component type to `archetype`.
    fn add_columns<A: Allocator + Clone + 'static>(archetype: &mut Archetype<A>);

    /// Whether `archetype` has a column for every type in the set.
    fn all_in<A: Allocator + Clone + 'static>(archetype: &Archetype<A>) -> bool;

    /// Whether `archetype` has a column for any type in the set.
    fn any_in<A: Allocator + Clone + 'static>(archetype: &Archetype<A>) -> bool;

    /// Writes the set's values into the entity's row.
    fn write<A: Allocator + Clone + 'static>(
        self,
        archetype: &mut Archetype<A>,
        entity: Entity,
    ) -> Result<()>;
}

macro_rules! impl_component_set {
    ($(($component:ident, $value:ident)),*) => {
        impl<$($component: Component),*> ComponentSet for ($($component,)*) {
            const COUNT: usize = 0 $(+ { let _ = stringify!($component); 1 })*;

            fn combined_id() -> u64 {
                0 $(^ component_id::<$component>())*
            }

            #[allow(unused_mut, unused_variables)]
            fn for_each_id(mut f: impl FnMut(u64)) {
                $(f(component_id::<$component>());)*
            }

            #[allow(unused_variables)]
            fn add_columns<A: Allocator + Clone + 'static>(archetype: &mut Archetype<A>) {
                $(archetype.add_column::<$component>();)*
            }

            #[allow(unused_variables)]
            fn all_in<A: Allocator + Clone + 'static>(archetype: &Archetype<A>) -> bool {
                true $(&& archetype.has_component::<$component>())*
            }

            #[allow(unused_variables)]
            fn any_in<A: Allocator + Clone + 'static>(archetype: &Archetype<A>) -> bool {
                false $(|| archetype.has_component::<$component>())*
            }

            #[allow(unused_variables)]
            fn write<A: Allocator + Clone + 'static>(
                self,
                archetype: &mut Archetype<A>,
                entity: Entity,
            ) -> Result<()> {
                let ($($value,)*) = self;
                $(archetype.set_entity_component(entity, $value)?;)*
                Ok(())
            }
        }
    };
}

impl_component_set!();
impl_component_set!((C1, v1));
impl_component_set!((C1, v1), (C2, v2));
impl_component_set!((C1, v1), (C2, v2), (C3, v3));
impl_component_set!((C1, v1), (C2, v2), (C3, v3), (C4, v4));
impl_component_set!((C1, v1), (C2, v2), (C3, v3), (C4, v4), (C5, v5));
impl_component_set!((C1, v1), (C2, v2), (C3, v3), (C4, v4), (C5, v5), (C6, v6));
impl_component_set!(
    (C1, v1),
    (C2, v2),
    (C3, v3),
    (C4, v4),
    (C5, v5),
    (C6, v6),
    (C7, v7)
);
impl_component_set!(
    (C1, v1),
    (C2, v2),
    (C3, v3),
    (C4, v4),
    (C5, v5),
    (C6, v6),
    (C7, v7),
    (C8, v8)
);

/// Column-per-component storage for one component type set.
///
/// # Examples
///
/// ```
/// use plinth::ecs::{Archetype, Entity};
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Health(u32);
///
/// let mut archetype = Archetype::make::<(Health,)>();
/// let entity = Entity::make(0, 1).unwrap();
///
/// archetype.add_entity(entity).unwrap();
/// archetype.set_entity_component(entity, Health(30)).unwrap();
///
/// assert_eq!(
///     archetype.get_entity_component::<Health>(entity).unwrap(),
///     &Health(30)
/// );
/// ```
pub struct Archetype<A: Allocator + Clone + 'static = SystemAllocator> {
    id: u64,
    entity_index_map: DenseMap<Entity, u32, A>,
    columns: HashTable<u64, Box<dyn Column<A>>, A>,
    alloc: A,
}

impl Archetype<SystemAllocator> {
    /// Creates an archetype for the given component set.
    pub fn make<S: ComponentSet>() -> Self {
        Self::make_in::<S>(SystemAllocator)
    }
}

impl<A: Allocator + Clone + 'static> Archetype<A> {
    fn with_id_in(id: u64, alloc: A) -> Self {
        let mut archetype = Self {
            id,
            entity_index_map: DenseMap::new_in(alloc.clone()),
            columns: HashTable::new_in(alloc.clone()),
            alloc,
        };

        // The entity column exists in every archetype and does not
        // contribute to its id.
        archetype.add_column::<Entity>();

        archetype
    }

    /// Creates an archetype for the given component set, with columns
    /// allocated from `alloc`.
    pub fn make_in<S: ComponentSet>(alloc: A) -> Self {
        let mut archetype = Self::with_id_in(S::combined_id(), alloc);

        S::add_columns(&mut archetype);

        archetype
    }

    /// Creates an empty archetype with the same columns as `template`
    /// under a new id.
    pub fn make_from_template(template: &Archetype<A>, id: u64) -> Self {
        let mut archetype = Self {
            id,
            entity_index_map: DenseMap::new_in(template.alloc.clone()),
            columns: HashTable::new_in(template.alloc.clone()),
            alloc: template.alloc.clone(),
        };

        for (&column_id, column) in template.columns.iter() {
            archetype.columns.insert(column_id, column.clone_empty());
        }

        archetype
    }

    /// Like [`make_from_template`](Self::make_from_template), skipping
    /// the columns whose ids appear in `excluded`.
    pub(crate) fn make_from_template_without(
        template: &Archetype<A>,
        id: u64,
        excluded: &[u64],
    ) -> Self {
        let mut archetype = Self {
            id,
            entity_index_map: DenseMap::new_in(template.alloc.clone()),
            columns: HashTable::new_in(template.alloc.clone()),
            alloc: template.alloc.clone(),
        };

        for (&column_id, column) in template.columns.iter() {
            if !excluded.contains(&column_id) {
                archetype.columns.insert(column_id, column.clone_empty());
            }
        }

        archetype
    }

    /// The archetype id: XOR of its component ids.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of entities stored.
    pub fn len(&self) -> usize {
        self.entity_index_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_index_map.is_empty()
    }

    /// The id this archetype's component set would have with the types
    /// of `S` toggled (added when absent, removed when present).
    pub fn extend_id<S: ComponentSet>(&self) -> u64 {
        self.id ^ S::combined_id()
    }

    pub fn has_entity(&self, entity: Entity) -> bool {
        self.entity_index_map.contains(&entity)
    }

    pub fn has_component<C: Component>(&self) -> bool {
        self.has_component_id(component_id::<C>())
    }

    pub fn has_component_id(&self, id: u64) -> bool {
        self.columns.contains(&id)
    }

    /// Adds an empty column for `C` when not yet present.
    pub fn add_column<C: Component>(&mut self) {
        let id = component_id::<C>();

        if !self.columns.contains(&id) {
            self.columns
                .insert(id, Box::new(ColumnStorage::<C, A>::new_in(self.alloc.clone())));
        }
    }

    /// The typed column for `C`. Fails with `OutOfRange` when the
    /// archetype has no such component.
    pub fn column<C: Component>(&self) -> Result<&ColumnStorage<C, A>> {
        let column = self
            .columns
            .get(&component_id::<C>())
            .ok_or(Error::OutOfRange("component not present in archetype"))?;

        column
            .as_any()
            .downcast_ref::<ColumnStorage<C, A>>()
            .ok_or(Error::InvalidArgument("component column type mismatch"))
    }

    fn column_mut<C: Component>(&mut self) -> Result<&mut ColumnStorage<C, A>> {
        let column = self
            .columns
            .get_mut(&component_id::<C>())
            .ok_or(Error::OutOfRange("component not present in archetype"))?;

        column
            .as_any_mut()
            .downcast_mut::<ColumnStorage<C, A>>()
            .ok_or(Error::InvalidArgument("component column type mismatch"))
    }

    /// Row index of an entity. Fails with `OutOfRange` when the entity is
    /// not stored here.
    pub fn row_of(&self, entity: Entity) -> Result<u32> {
        self.entity_index_map
            .get(&entity)
            .copied()
            .ok_or(Error::OutOfRange("entity not present in archetype"))
    }

    /// Appends a row for `entity`: the entity column records the handle,
    /// every other column gets a default value. Returns the row index.
    pub fn add_entity(&mut self, entity: Entity) -> Result<u32> {
        let entity_column_id = component_id::<Entity>();
        let row = self.entity_index_map.len() as u32;

        for (&column_id, column) in self.columns.iter_mut() {
            if column_id == entity_column_id {
                match column.as_any_mut().downcast_mut::<ColumnStorage<Entity, A>>() {
                    Some(storage) => storage.push(entity),
                    None => return Err(Error::InvalidArgument("component column type mismatch")),
                }
            } else {
                column.push_default();
            }
        }

        self.entity_index_map.insert(entity, row);

        Ok(row)
    }

    /// Removes an entity's row, compacting by moving the last row into
    /// its place. Fails with `OutOfRange` when the entity is not here.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<()> {
        let row = self.row_of(entity)? as usize;
        let last = self.entity_index_map.len() - 1;

        if row == last {
            for (_, column) in self.columns.iter_mut() {
                column.erase(row)?;
            }
        } else {
            // Read the displaced entity before the columns shift.
            let moved = *self
                .column::<Entity>()?
                .get(last)
                .ok_or(Error::OutOfRange("entity column shorter than archetype"))?;

            for (_, column) in self.columns.iter_mut() {
                column.move_within(last, row);
                column.erase(last)?;
            }

            self.entity_index_map.insert(moved, row as u32);
        }

        self.entity_index_map.erase(&entity);

        Ok(())
    }

    /// Copies every column value both archetypes share from `source`'s
    /// row for `entity` into this archetype's row for it. Columns this
    /// archetype has and `source` lacks keep their default values.
    pub fn copy_entity_components_from(
        &mut self,
        entity: Entity,
        source: &Archetype<A>,
    ) -> Result<()> {
        let to = self.row_of(entity)? as usize;
        let from = source.row_of(entity)? as usize;

        for (&column_id, source_column) in source.columns.iter() {
            if let Some(column) = self.columns.get_mut(&column_id) {
                column.move_from(source_column.as_ref(), from, to);
            }
        }

        Ok(())
    }

    /// Reads an entity's component value. Fails with `OutOfRange` when
    /// the entity or the component is not here.
    pub fn get_entity_component<C: Component>(&self, entity: Entity) -> Result<&C> {
        let row = self.row_of(entity)? as usize;

        self.column::<C>()?
            .get(row)
            .ok_or(Error::OutOfRange("column shorter than archetype"))
    }

    /// Writes an entity's component value. Fails with `OutOfRange` when
    /// the entity or the component is not here.
    pub fn set_entity_component<C: Component>(&mut self, entity: Entity, value: C) -> Result<()> {
        let row = self.row_of(entity)? as usize;

        self.column_mut::<C>()?.set(row, value)
    }

    /// Entities stored here, in row order.
    pub fn entities(&self) -> Result<&ColumnStorage<Entity, A>> {
        self.column::<Entity>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Position = (f32, f32);

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Health(u32);

    #[test]
    fn test_make_id_is_order_independent() {
        assert_eq!(
            <(Position, Health)>::combined_id(),
            <(Health, Position)>::combined_id()
        );
        assert_eq!(<()>::combined_id(), 0);
    }

    #[test]
    fn test_extend_id_round_trips() {
        let archetype = Archetype::make::<(Position,)>();

        let extended = archetype.extend_id::<(Health,)>();
        assert_eq!(extended, <(Position, Health)>::combined_id());

        let reduced = extended ^ <(Health,)>::combined_id();
        assert_eq!(reduced, archetype.id());
    }

    #[test]
    fn test_add_entity_fills_all_columns() {
        let mut archetype = Archetype::make::<(Position, Health)>();
        let entity = Entity::make(0, 1).unwrap();

        let row = archetype.add_entity(entity).unwrap();

        assert_eq!(row, 0);
        assert_eq!(archetype.len(), 1);
        assert_eq!(
            archetype.get_entity_component::<Health>(entity).unwrap(),
            &Health(0)
        );
        assert_eq!(
            archetype.get_entity_component::<Entity>(entity).unwrap(),
            &entity
        );
    }

    #[test]
    fn test_column_lengths_stay_equal() {
        let mut archetype = Archetype::make::<(Position, Health)>();

        for id in 0..10 {
            let entity = Entity::make(0, id).unwrap();
            archetype.add_entity(entity).unwrap();
        }

        assert_eq!(archetype.column::<Position>().unwrap().items().len(), 10);
        assert_eq!(archetype.column::<Health>().unwrap().items().len(), 10);
        assert_eq!(archetype.entities().unwrap().items().len(), 10);
        assert_eq!(archetype.len(), 10);
    }

    #[test]
    fn test_set_and_get_component() {
        let mut archetype = Archetype::make::<(Health,)>();
        let entity = Entity::make(0, 3).unwrap();

        archetype.add_entity(entity).unwrap();
        archetype.set_entity_component(entity, Health(55)).unwrap();

        assert_eq!(
            archetype.get_entity_component::<Health>(entity).unwrap(),
            &Health(55)
        );
    }

    #[test]
    fn test_missing_component_fails() {
        let mut archetype = Archetype::make::<(Health,)>();
        let entity = Entity::make(0, 0).unwrap();

        archetype.add_entity(entity).unwrap();

        assert!(archetype.get_entity_component::<Position>(entity).is_err());
        assert!(archetype
            .set_entity_component(entity, (0.0f32, 0.0f32))
            .is_err());
    }

    #[test]
    fn test_remove_last_entity() {
        let mut archetype = Archetype::make::<(Health,)>();
        let a = Entity::make(0, 0).unwrap();
        let b = Entity::make(0, 1).unwrap();

        archetype.add_entity(a).unwrap();
        archetype.add_entity(b).unwrap();
        archetype.remove_entity(b).unwrap();

        assert_eq!(archetype.len(), 1);
        assert!(archetype.has_entity(a));
        assert!(!archetype.has_entity(b));
    }

    #[test]
    fn test_remove_compacts_with_last_row() {
        let mut archetype = Archetype::make::<(Health,)>();
        let a = Entity::make(0, 0).unwrap();
        let b = Entity::make(0, 1).unwrap();
        let c = Entity::make(0, 2).unwrap();

        for (entity, hp) in [(a, 1), (b, 2), (c, 3)] {
            archetype.add_entity(entity).unwrap();
            archetype.set_entity_component(entity, Health(hp)).unwrap();
        }

        archetype.remove_entity(a).unwrap();

        // c took a's row; values and the index map moved together.
        assert_eq!(archetype.len(), 2);
        assert_eq!(archetype.row_of(c).unwrap(), 0);
        assert_eq!(
            archetype.get_entity_component::<Health>(c).unwrap(),
            &Health(3)
        );
        assert_eq!(
            archetype.get_entity_component::<Health>(b).unwrap(),
            &Health(2)
        );
        assert!(archetype.remove_entity(a).is_err());
    }

    #[test]
    fn test_copy_components_between_archetypes() {
        let mut source = Archetype::make::<(Health,)>();
        let entity = Entity::make(0, 7).unwrap();

        source.add_entity(entity).unwrap();
        source.set_entity_component(entity, Health(42)).unwrap();

        let mut dest =
            Archetype::make_from_template(&source, source.extend_id::<(Position,)>());
        <(Position,)>::add_columns(&mut dest);

        dest.add_entity(entity).unwrap();
        dest.copy_entity_components_from(entity, &source).unwrap();

        assert_eq!(
            dest.get_entity_component::<Health>(entity).unwrap(),
            &Health(42)
        );
        // The non-shared column stays at its default.
        assert_eq!(
            dest.get_entity_component::<Position>(entity).unwrap(),
            &(0.0, 0.0)
        );
    }

    #[test]
    fn test_template_without_excludes_columns() {
        let source = Archetype::make::<(Position, Health)>();
        let excluded = [component_id::<Health>()];

        let reduced = Archetype::make_from_template_without(
            &source,
            source.extend_id::<(Health,)>(),
            &excluded,
        );

        assert!(reduced.has_component::<Position>());
        assert!(!reduced.has_component::<Health>());
        assert!(reduced.has_component::<Entity>());
    }
}
