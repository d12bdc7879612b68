//! Read-only component views
//!
//! A view captures every archetype holding all of a query's component
//! types and iterates them without further lookups: row-wise with
//! references to each requested component, or archetype-wise with the
//! whole columns at once for batch work.

use std::marker::PhantomData;

use crate::config::ECS_VIEW_MAX_ARCHETYPE_COUNT;
use crate::ecs::archetype::Archetype;
use crate::ecs::column::{ColumnStorage, Component};
use crate::error::{Error, Result};
use crate::mem::{Allocator, SystemAllocator};

/// A set of component types that can be fetched per row.
///
/// Implemented for tuples of one to eight components.
pub trait ComponentQuery {
    /// Per-row references, e.g. `(&Position, &Velocity)`.
    type Refs<'a>;

    /// Per-archetype column references.
    type Columns<'a, A: Allocator + Clone + 'static>;

    /// Number of component types in the query.
    const COUNT: usize;

    /// Whether `archetype` holds every queried component.
    fn all_in<A: Allocator + Clone + 'static>(archetype: &Archetype<A>) -> bool;

    /// Resolves the queried columns of an archetype.
    fn columns<A: Allocator + Clone + 'static>(
        archetype: &Archetype<A>,
    ) -> Result<Self::Columns<'_, A>>;

    /// References into one row of resolved columns.
    fn row<'a, A: Allocator + Clone + 'static>(
        columns: &Self::Columns<'a, A>,
        row: usize,
    ) -> Self::Refs<'a>;
}

macro_rules! impl_component_query {
    ($(($component:ident, $column:ident)),+) => {
        impl<$($component: Component),+> ComponentQuery for ($($component,)+) {
            type Refs<'a> = ($(&'a $component,)+);
            type Columns<'a, A: Allocator + Clone + 'static> =
                ($(&'a ColumnStorage<$component, A>,)+);

            const COUNT: usize = 0 $(+ { let _ = stringify!($component); 1 })+;

            fn all_in<A: Allocator + Clone + 'static>(archetype: &Archetype<A>) -> bool {
                true $(&& archetype.has_component::<$component>())+
            }

            fn columns<A: Allocator + Clone + 'static>(
                archetype: &Archetype<A>,
            ) -> Result<Self::Columns<'_, A>> {
                Ok(($(archetype.column::<$component>()?,)+))
            }

            fn row<'a, A: Allocator + Clone + 'static>(
                columns: &Self::Columns<'a, A>,
                row: usize,
            ) -> Self::Refs<'a> {
                let ($($column,)+) = *columns;
                ($(&$column.items()[row],)+)
            }
        }
    };
}

impl_component_query!((C1, c1));
impl_component_query!((C1, c1), (C2, c2));
impl_component_query!((C1, c1), (C2, c2), (C3, c3));
impl_component_query!((C1, c1), (C2, c2), (C3, c3), (C4, c4));
impl_component_query!((C1, c1), (C2, c2), (C3, c3), (C4, c4), (C5, c5));
impl_component_query!((C1, c1), (C2, c2), (C3, c3), (C4, c4), (C5, c5), (C6, c6));
impl_component_query!(
    (C1, c1),
    (C2, c2),
    (C3, c3),
    (C4, c4),
    (C5, c5),
    (C6, c6),
    (C7, c7)
);
impl_component_query!(
    (C1, c1),
    (C2, c2),
    (C3, c3),
    (C4, c4),
    (C5, c5),
    (C6, c6),
    (C7, c7),
    (C8, c8)
);

/// Read-only access to the archetypes matching a component query.
///
/// # Examples
///
/// ```
/// use plinth::ecs::Registry;
///
/// #[derive(Debug, Default, Clone)]
/// struct Position(f32);
///
/// let mut registry = Registry::new();
///
/// for i in 0..3 {
///     let entity = registry.add_entity().unwrap();
///     registry.add_components(entity, (Position(i as f32),)).unwrap();
/// }
///
/// let view = registry.view::<(Position,)>().unwrap();
/// let mut total = 0.0;
///
/// view.iterate(|(position,)| total += position.0).unwrap();
///
/// assert_eq!(view.size(), 3);
/// assert_eq!(total, 3.0);
/// ```
pub struct View<'a, Q: ComponentQuery, A: Allocator + Clone + 'static = SystemAllocator> {
    archetypes: [Option<&'a Archetype<A>>; ECS_VIEW_MAX_ARCHETYPE_COUNT],
    count: usize,
    _query: PhantomData<fn() -> Q>,
}

impl<'a, Q: ComponentQuery, A: Allocator + Clone + 'static> View<'a, Q, A> {
    pub const MAX_ARCHETYPE_COUNT: usize = ECS_VIEW_MAX_ARCHETYPE_COUNT;

    pub(crate) fn new() -> Self {
        Self {
            archetypes: [None; ECS_VIEW_MAX_ARCHETYPE_COUNT],
            count: 0,
            _query: PhantomData,
        }
    }

    /// Records an archetype. Fails with `OutOfRange` when the view is
    /// full.
    pub(crate) fn add_archetype(&mut self, archetype: &'a Archetype<A>) -> Result<()> {
        if self.count == Self::MAX_ARCHETYPE_COUNT {
            return Err(Error::OutOfRange("too many archetypes in view"));
        }

        debug_assert!(Q::all_in(archetype));

        self.archetypes[self.count] = Some(archetype);
        self.count += 1;

        Ok(())
    }

    /// Number of archetypes captured.
    pub fn archetype_count(&self) -> usize {
        self.count
    }

    /// Total number of entities the view will iterate.
    pub fn size(&self) -> usize {
        self.live().map(Archetype::len).sum()
    }

    fn live(&self) -> impl Iterator<Item = &'a Archetype<A>> + '_ {
        self.archetypes[..self.count].iter().flatten().copied()
    }

    /// Calls `f` once per entity with references to the queried
    /// components, archetype by archetype, row by row.
    pub fn iterate(&self, mut f: impl FnMut(Q::Refs<'a>)) -> Result<()> {
        for archetype in self.live() {
            let columns = Q::columns(archetype)?;

            for row in 0..archetype.len() {
                f(Q::row(&columns, row));
            }
        }

        Ok(())
    }

    /// Calls `f` once per archetype with the full queried columns.
    pub fn iterate_archetypes(&self, mut f: impl FnMut(Q::Columns<'a, A>)) -> Result<()> {
        for archetype in self.live() {
            f(Q::columns(archetype)?);
        }

        Ok(())
    }
}
