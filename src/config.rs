//! Compile-time tuning knobs.
//!
//! Every constant here is a build-wide default. Containers read them at
//! compile time; there is no runtime configuration layer.

/// Page size of paged storage, in bytes. Must be a power of two.
///
/// A page holds `PAGE_SIZE / size_of::<T>().next_power_of_two()` slots
/// (at least one), so the slot count per page is always a power of two.
pub const PAGE_SIZE: usize = 4096;

/// Number of consecutive slots probed by the hash containers before a
/// table rebuild is forced.
pub const KEY_CHUNK_SIZE: usize = 16;

/// Minimum capacity of [`Set`](crate::collections::Set). Power of two.
pub const SET_MINIMUM_CAPACITY: usize = 16;

/// Minimum capacity of [`HashTable`](crate::collections::HashTable).
/// Power of two.
pub const HASHTABLE_MINIMUM_CAPACITY: usize = 16;

/// Bits of a handle word reserved for the value part. The remaining high
/// bits hold the generation.
pub const HANDLE_VALUE_WIDTH: u32 = 16;

/// Maximum number of archetypes a single ECS view can reference.
pub const ECS_VIEW_MAX_ARCHETYPE_COUNT: usize = 64;

/// Minimum capacity a deque allocates on first growth.
pub const DEQUE_MINIMUM_CAPACITY: usize = 4;
