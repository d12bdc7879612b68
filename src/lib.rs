//! plinth - allocator-aware containers, generational handles and an
//! archetype ECS core.
//!
//! The crate is organised in four layers, each building on the previous:
//!
//! - [`mem`] - the allocator contract and its implementations, raw page
//!   and bit utilities, the tagged pointer and the raw memory pool.
//! - [`collections`] - allocator-aware sequence and hash containers:
//!   [`Vector`](collections::Vector), the pointer-stable
//!   [`PagedVector`](collections::PagedVector),
//!   [`BitSet`](collections::BitSet), [`Deque`](collections::Deque),
//!   [`Ring`](collections::Ring), the chunk-probed
//!   [`HashTable`](collections::HashTable) / [`Set`](collections::Set)
//!   and the [`DenseMap`](collections::DenseMap).
//! - [`handle`] - packed generation/value integers, typed versioned
//!   handles, the generation-tracking
//!   [`HandleManager`](handle::HandleManager) and the
//!   [`ObjectPool`](handle::ObjectPool) built on it.
//! - [`ecs`] - archetype-indexed component storage with entity migration
//!   and read-only views.
//!
//! Nothing in the crate is thread-safe for concurrent mutation. Separate
//! instances on separate threads are independent.

pub mod collections;
pub mod config;
pub mod ecs;
pub mod error;
pub mod handle;
pub mod mem;

pub use error::{Error, Result};
