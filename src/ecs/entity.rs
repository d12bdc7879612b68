//! Entities and component identity
//!
//! An entity is nothing but a versioned handle; all of its state lives in
//! archetype columns. Component types are identified by a stable 64-bit
//! hash of their `TypeId`, and an archetype's identity is the XOR of its
//! component ids, which makes it independent of declaration order.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

use crate::collections::XxHash64;
use crate::handle::Handle;

/// Tag type for entity handles.
pub enum EntityTag {}

/// A versioned entity handle: `(generation, id)` packed into one word.
pub type Entity = Handle<EntityTag>;

/// Largest entity id a registry can hand out.
pub const MAX_ENTITY_ID: u32 = Entity::MAX_VALUE;

/// Stable in-process identifier of a component type.
///
/// XXH64 over the component's `TypeId`. Two distinct types hashing to the
/// same id would corrupt an archetype; with 64-bit ids the chance is
/// vanishingly small, and the same caveat applies to the XOR-combined
/// archetype ids built from these (see [`archetype_id`]).
pub fn component_id<C: 'static>() -> u64 {
    let mut hasher = XxHash64::default();
    TypeId::of::<C>().hash(&mut hasher);
    hasher.finish()
}

/// Order-independent identity of a component type set: the XOR of the
/// per-type ids.
///
/// XOR keeps the id incrementally extendable (adding or removing a
/// component toggles its bits) at the cost of a theoretical collision
/// between distinct type sets. That trade is accepted here.
pub fn archetype_id(component_ids: impl IntoIterator<Item = u64>) -> u64 {
    component_ids.into_iter().fold(0, |acc, id| acc ^ id)
}
