//! Unordered set over the chunk-probed table
//!
//! A [`HashTable`](crate::collections::HashTable) with no payload: the
//! value type is `()`, which occupies no storage, so the set pays for the
//! key array and the slot map only. All probing behavior, growth and the
//! slot-order iteration contract are inherited from the table.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::collections::{BuildXxHash64, HashTable, HashTableIter};
use crate::mem::{AllocationFlags, Allocator, SystemAllocator};

/// Unordered set of keys.
///
/// # Examples
///
/// ```
/// use plinth::collections::Set;
///
/// let mut tags: Set<&str> = Set::new();
///
/// tags.insert("solid");
/// tags.insert("visible");
/// tags.insert("solid"); // duplicate, no effect
///
/// assert_eq!(tags.len(), 2);
/// assert!(tags.contains(&"visible"));
/// ```
pub struct Set<K, A = SystemAllocator, S = BuildXxHash64>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    table: HashTable<K, (), A, S>,
}

impl<K: Eq + Hash> Set<K> {
    pub fn new() -> Self {
        Self::new_in(SystemAllocator)
    }
}

impl<K, A, S> Set<K, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    pub const MINIMUM_CAPACITY: usize = crate::config::SET_MINIMUM_CAPACITY;

    pub fn new_in(alloc: A) -> Self
    where
        S: Default,
    {
        Self::with_hasher_in(S::default(), alloc)
    }

    pub fn with_hasher_in(hasher: S, alloc: A) -> Self {
        Self::with_flags_hasher_in(AllocationFlags::empty(), hasher, alloc)
    }

    pub fn with_flags_hasher_in(flags: AllocationFlags, hasher: S, alloc: A) -> Self {
        Self {
            table: HashTable::with_flags_hasher_in(flags, hasher, alloc),
        }
    }

    pub fn from_iter_in<I: IntoIterator<Item = K>>(items: I, alloc: A) -> Self
    where
        S: Default,
    {
        let mut set = Self::new_in(alloc);
        set.insert_iter(items);
        set
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Inserts a key. Inserting a present key is a no-op that keeps the
    /// already stored key.
    pub fn insert(&mut self, key: K) {
        if self.table.contains(&key) {
            return;
        }

        self.table.insert(key, ());
    }

    /// Inserts every key of an iterator.
    pub fn insert_iter<I: IntoIterator<Item = K>>(&mut self, items: I) {
        for key in items {
            self.insert(key);
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.table.contains(key)
    }

    /// The stored key equal to `key`, if present.
    pub fn find(&self, key: &K) -> Option<&K> {
        self.table.get_key_value(key).map(|(k, _)| k)
    }

    /// Removes a key. Returns whether it was present.
    pub fn erase(&mut self, key: &K) -> bool {
        self.table.erase(key)
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn reserve(&mut self, new_capacity: usize) {
        self.table.reserve(new_capacity);
    }

    /// Keys in slot order.
    pub fn iter(&self) -> SetIter<'_, K, A, S> {
        SetIter {
            inner: self.table.iter(),
        }
    }
}

impl<K: Eq + Hash> Default for Set<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> FromIterator<K> for Set<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self::from_iter_in(iter, SystemAllocator)
    }
}

impl<K, A, S> fmt::Debug for Set<K, A, S>
where
    K: Eq + Hash + fmt::Debug,
    A: Allocator + Clone,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Slot-order iterator over a set's keys.
pub struct SetIter<'a, K, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    inner: HashTableIter<'a, K, (), A, S>,
}

impl<'a, K, A, S> Iterator for SetIter<'a, K, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }
}

impl<'a, K, A, S> IntoIterator for &'a Set<K, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    type Item = &'a K;
    type IntoIter = SetIter<'a, K, A, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
