//! Allocator-aware containers
//!
//! Sequence containers ([`Vector`], [`PagedVector`], [`Deque`], [`Ring`],
//! [`BitSet`]) and hash containers ([`HashTable`], [`Set`], [`DenseMap`])
//! sharing the crate's allocator contract. None of them are thread-safe
//! for concurrent mutation.

pub mod bitset;
pub mod dense_map;
pub mod deque;
pub mod hash;
pub mod hashtable;
pub mod paged_vector;
pub mod ring;
pub mod set;
pub mod vector;

pub use bitset::BitSet;
pub use dense_map::DenseMap;
pub use deque::{Deque, ResetPolicy};
pub use hash::{xxh64, BuildXxHash64, XxHash64};
pub use hashtable::{HashTable, HashTableIter, HashTableIterMut};
pub use paged_vector::{PagedVector, PagedVectorIter};
pub use ring::Ring;
pub use set::{Set, SetIter};
pub use vector::Vector;
