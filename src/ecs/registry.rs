//! Entity registry
//!
//! Owns every archetype and moves entities between them as their
//! component sets change. A migration adds the entity to the target
//! archetype first, copies the shared column values over, and only then
//! removes it from the source, so a failure never strands the entity
//! half-moved.
//!
//! Creating the target archetype can grow the archetype map and move
//! existing archetypes in memory, which is why migrations re-resolve the
//! source archetype by id after the target exists.

use crate::collections::DenseMap;
use crate::ecs::archetype::{Archetype, ComponentSet};
use crate::ecs::column::Component;
use crate::ecs::entity::{Entity, MAX_ENTITY_ID};
use crate::ecs::view::{ComponentQuery, View};
use crate::error::{Error, Result};
use crate::mem::{Allocator, SystemAllocator};

/// The ECS root: entity id allocation, archetype storage and migration.
///
/// # Examples
///
/// ```
/// use plinth::ecs::Registry;
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Position { x: f32, y: f32 }
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Velocity { dx: f32, dy: f32 }
///
/// let mut registry = Registry::new();
/// let entity = registry.add_entity().unwrap();
///
/// registry
///     .add_components(entity, (Position { x: 1.0, y: 2.0 },))
///     .unwrap();
///
/// // Adding another component migrates the entity to a new archetype;
/// // the position value travels with it.
/// registry
///     .add_components(entity, (Velocity { dx: 0.5, dy: 0.0 },))
///     .unwrap();
///
/// let position = registry.get_entity_component::<Position>(entity).unwrap();
/// assert_eq!(position, &Position { x: 1.0, y: 2.0 });
///
/// // Views iterate every archetype holding the queried components.
/// let view = registry.view::<(Position, Velocity)>().unwrap();
/// assert_eq!(view.size(), 1);
/// ```
pub struct Registry<A: Allocator + Clone + 'static = SystemAllocator> {
    current_generation: u32,
    next_entity_id: u32,
    archetype_map: DenseMap<u64, Archetype<A>, A>,
    alloc: A,
}

impl Registry<SystemAllocator> {
    pub fn new() -> Self {
        Self::new_in(SystemAllocator)
    }
}

impl<A: Allocator + Clone + 'static> Registry<A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            current_generation: 0,
            next_entity_id: 0,
            archetype_map: DenseMap::new_in(alloc.clone()),
            alloc,
        }
    }

    /// Generation stamped into newly created entities. Advances on
    /// [`clear`](Self::clear).
    pub fn current_generation(&self) -> u32 {
        self.current_generation
    }

    /// Number of archetypes currently alive.
    pub fn archetype_count(&self) -> usize {
        self.archetype_map.len()
    }

    /// Creates a new entity of the current generation.
    ///
    /// The entity owns no components and is invisible to views until
    /// components are added; `add_components(entity, ())` makes it
    /// iterable with none. Fails with `OutOfRange` once the id space is
    /// exhausted.
    pub fn add_entity(&mut self) -> Result<Entity> {
        if self.next_entity_id >= MAX_ENTITY_ID {
            return Err(Error::OutOfRange("maximum number of entities reached"));
        }

        let entity = Entity::make(self.current_generation, self.next_entity_id)?;
        self.next_entity_id += 1;

        Ok(entity)
    }

    /// The archetype currently holding `entity`, found by linear scan.
    pub fn entity_archetype(&self, entity: Entity) -> Option<&Archetype<A>> {
        self.archetype_map
            .values()
            .iter()
            .find(|archetype| archetype.has_entity(entity))
    }

    fn entity_archetype_id(&self, entity: Entity) -> Option<u64> {
        self.entity_archetype(entity).map(Archetype::id)
    }

    /// Adds the components of `S` to an entity, migrating it to the
    /// matching archetype and writing the provided values.
    ///
    /// Fails with `InvalidArgument` when the entity already has any
    /// component of `S`. Adding the empty set places an entity with no
    /// components into the empty archetype.
    pub fn add_components<S: ComponentSet>(&mut self, entity: Entity, components: S) -> Result<()> {
        let source_id = self.entity_archetype_id(entity);

        let target_id = match source_id {
            Some(id) => {
                let source = self.archetype_map.at(&id)?;

                if S::any_in(source) {
                    return Err(Error::InvalidArgument(
                        "component already present on entity",
                    ));
                }

                source.extend_id::<S>()
            }
            None => S::combined_id(),
        };

        if source_id == Some(target_id) {
            // Empty set on an already-placed entity.
            return Ok(());
        }

        if !self.archetype_map.contains(&target_id) {
            let archetype = match source_id {
                Some(id) => {
                    let source = self.archetype_map.at(&id)?;
                    let mut archetype = Archetype::make_from_template(source, target_id);

                    S::add_columns(&mut archetype);

                    archetype
                }
                None => Archetype::make_in::<S>(self.alloc.clone()),
            };

            log::debug!(
                "created archetype {:#018x} ({} entities tracked)",
                target_id,
                self.next_entity_id
            );

            self.archetype_map.insert(target_id, archetype);
        }

        // The insert above may have moved every archetype; resolve both
        // sides by id from here on.
        match source_id {
            Some(source_id) => {
                let (target, source) = self
                    .archetype_map
                    .get_pair_mut(&target_id, &source_id)
                    .ok_or(Error::OutOfRange("archetype lookup failed"))?;

                target.add_entity(entity)?;
                target.copy_entity_components_from(entity, source)?;
                source.remove_entity(entity)?;

                components.write(target, entity)
            }
            None => {
                let target = self.archetype_map.at_mut(&target_id)?;

                target.add_entity(entity)?;

                components.write(target, entity)
            }
        }
    }

    /// Removes the components of `S` from an entity, migrating it to the
    /// reduced archetype.
    ///
    /// Fails with `OutOfRange` when the entity is absent or lacks any
    /// component of `S`.
    pub fn remove_components<S: ComponentSet>(&mut self, entity: Entity) -> Result<()> {
        let source_id = self
            .entity_archetype_id(entity)
            .ok_or(Error::OutOfRange("entity not present in registry"))?;

        let target_id = {
            let source = self.archetype_map.at(&source_id)?;

            if !S::all_in(source) {
                return Err(Error::OutOfRange(
                    "component missing from entity's archetype",
                ));
            }

            source.extend_id::<S>()
        };

        if target_id == source_id {
            // Empty set; nothing to migrate.
            return Ok(());
        }

        if !self.archetype_map.contains(&target_id) {
            // ComponentSet is bounded at eight types.
            let mut excluded = [0u64; 8];
            let mut count = 0;

            S::for_each_id(|id| {
                excluded[count] = id;
                count += 1;
            });

            let source = self.archetype_map.at(&source_id)?;
            let archetype =
                Archetype::make_from_template_without(source, target_id, &excluded[..count]);

            log::debug!("created archetype {:#018x} by component removal", target_id);

            self.archetype_map.insert(target_id, archetype);
        }

        let (target, source) = self
            .archetype_map
            .get_pair_mut(&target_id, &source_id)
            .ok_or(Error::OutOfRange("archetype lookup failed"))?;

        target.add_entity(entity)?;
        target.copy_entity_components_from(entity, source)?;
        source.remove_entity(entity)
    }

    pub fn has_entity(&self, entity: Entity) -> bool {
        self.entity_archetype(entity).is_some()
    }

    /// Whether the entity has every component of `S`.
    pub fn has_components<S: ComponentSet>(&self, entity: Entity) -> bool {
        match self.entity_archetype(entity) {
            Some(archetype) => S::all_in(archetype),
            None => false,
        }
    }

    /// Whether the entity has at least one component of `S`.
    pub fn has_any_components<S: ComponentSet>(&self, entity: Entity) -> bool {
        match self.entity_archetype(entity) {
            Some(archetype) => S::any_in(archetype),
            None => false,
        }
    }

    /// Reads an entity's component. Fails with `OutOfRange` when the
    /// entity is absent or has no such component.
    pub fn get_entity_component<C: Component>(&self, entity: Entity) -> Result<&C> {
        let archetype = self
            .entity_archetype(entity)
            .ok_or(Error::OutOfRange("entity not present in registry"))?;

        archetype.get_entity_component::<C>(entity)
    }

    /// Writes an entity's component. Fails with `OutOfRange` when the
    /// entity is absent or has no such component.
    pub fn set_entity_component<C: Component>(&mut self, entity: Entity, value: C) -> Result<()> {
        let id = self
            .entity_archetype_id(entity)
            .ok_or(Error::OutOfRange("entity not present in registry"))?;

        self.archetype_map.at_mut(&id)?.set_entity_component(entity, value)
    }

    /// Removes an entity and its components. A no-op when the entity is
    /// not present.
    pub fn remove_entity(&mut self, entity: Entity) {
        if let Some(id) = self.entity_archetype_id(entity) {
            if let Some(archetype) = self.archetype_map.get_mut(&id) {
                // Presence was just established.
                let _ = archetype.remove_entity(entity);
            }
        }
    }

    /// Removes an entity that is expected to be present. Fails with
    /// `OutOfRange` when it is not.
    pub fn remove_existing_entity(&mut self, entity: Entity) -> Result<()> {
        let id = self
            .entity_archetype_id(entity)
            .ok_or(Error::OutOfRange("entity not present in registry"))?;

        self.archetype_map.at_mut(&id)?.remove_entity(entity)
    }

    /// Builds a view over every archetype containing all components of
    /// `Q`. Fails with `OutOfRange` when more archetypes match than a
    /// view can hold.
    pub fn view<Q: ComponentQuery>(&self) -> Result<View<'_, Q, A>> {
        let mut view = View::new();

        for archetype in self.archetype_map.values() {
            if Q::all_in(archetype) {
                view.add_archetype(archetype)?;
            }
        }

        Ok(view)
    }

    /// Drops every entity and archetype and advances the generation, so
    /// handles from before the clear never collide with ones created
    /// after it. The generation wraps at its field maximum.
    pub fn clear(&mut self) {
        self.archetype_map.clear();

        self.current_generation = if self.current_generation < Entity::MAX_GENERATION {
            self.current_generation + 1
        } else {
            0
        };
        self.next_entity_id = 0;
    }
}

impl Default for Registry<SystemAllocator> {
    fn default() -> Self {
        Self::new()
    }
}
