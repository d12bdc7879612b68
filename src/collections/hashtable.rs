//! Open-addressed hash table with chunked linear probing
//!
//! Keys and values live in parallel raw arrays; a [`BitSet`] slot map
//! records which slots hold a live entry. A key only ever occupies one of
//! the [`KEY_CHUNK_SIZE`](crate::config::KEY_CHUNK_SIZE) slots starting at
//! its primary index `hash & (capacity - 1)`, wrapping modulo capacity.
//! When a chunk fills up, the table doubles and rebuilds; there are no
//! tombstones, erasure just clears the slot bit.
//!
//! The rebuild itself retries: if any key fails to fit its chunk at the
//! new capacity, the capacity doubles again and the rebuild restarts. For
//! any reasonable hash function this terminates almost immediately.
//!
//! Iteration order is slot order, which is neither insertion nor hash
//! order. Any rehash invalidates outstanding slot positions.

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::ptr::{self, NonNull};

use crate::collections::{BitSet, BuildXxHash64};
use crate::config::{HASHTABLE_MINIMUM_CAPACITY, KEY_CHUNK_SIZE};
use crate::mem::{AllocationFlags, Allocator, AllocatorExt, BitUtil, SystemAllocator};

/// Open-addressed, chunk-probed hash table.
///
/// Capacity is always a power of two of at least
/// [`HASHTABLE_MINIMUM_CAPACITY`](crate::config::HASHTABLE_MINIMUM_CAPACITY)
/// slots.
///
/// # Examples
///
/// ```
/// use plinth::collections::HashTable;
///
/// let mut table = HashTable::new();
///
/// table.insert("hp", 100);
/// table.insert("mp", 50);
/// table.insert("hp", 75); // overwrite keeps a single entry
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.get(&"hp"), Some(&75));
///
/// assert!(table.erase(&"mp"));
/// assert_eq!(table.get(&"mp"), None);
/// ```
pub struct HashTable<K, V, A = SystemAllocator, S = BuildXxHash64>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    keys: NonNull<K>,
    values: NonNull<V>,
    slot_map: BitSet<A>,
    cap: usize,
    len: usize,
    flags: AllocationFlags,
    hasher: S,
    alloc: A,
}

impl<K: Eq + Hash, V> HashTable<K, V> {
    pub fn new() -> Self {
        Self::new_in(SystemAllocator)
    }
}

impl<K, V, A, S> HashTable<K, V, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    pub const MINIMUM_CAPACITY: usize = HASHTABLE_MINIMUM_CAPACITY;

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
        let mut table = Self {
            keys: NonNull::dangling(),
            values: NonNull::dangling(),
            slot_map: BitSet::with_flags_in(flags, alloc.clone()),
            cap: 0,
            len: 0,
            flags,
            hasher,
            alloc,
        };

        table.reserve(Self::MINIMUM_CAPACITY);

        table
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    fn hash_key(hasher: &S, key: &K) -> u64 {
        use std::hash::Hasher;

        let mut state = hasher.build_hasher();
        key.hash(&mut state);
        state.finish()
    }

    fn primary(hasher: &S, key: &K, capacity: usize) -> usize {
        (Self::hash_key(hasher, key) as usize) & (capacity - 1)
    }

    fn chunk_len(capacity: usize) -> usize {
        KEY_CHUNK_SIZE.min(capacity)
    }

    fn key_at(&self, slot: usize) -> &K {
        // Safety: callers only pass occupied slots.
        unsafe { &*self.keys.as_ptr().add(slot) }
    }

    /// Slot holding `key`, if present. The slot stays within the key's
    /// probe chunk by construction.
    fn find_slot(&self, key: &K) -> Option<usize> {
        let primary = Self::primary(&self.hasher, key, self.cap);

        for step in 0..Self::chunk_len(self.cap) {
            let slot = (primary + step) & (self.cap - 1);

            if self.slot_map.test(slot) && self.key_at(slot) == key {
                return Some(slot);
            }
        }

        None
    }

    /// Inserts or overwrites. On overwrite the existing key is kept and
    /// the new value replaces the old one. When the probe chunk has no
    /// room the table grows and the insertion retries.
    pub fn insert(&mut self, key: K, value: V) {
        loop {
            let primary = Self::primary(&self.hasher, &key, self.cap);
            let mut first_empty = None;
            let mut existing = None;

            for step in 0..Self::chunk_len(self.cap) {
                let slot = (primary + step) & (self.cap - 1);

                if self.slot_map.test(slot) {
                    if self.key_at(slot) == &key {
                        existing = Some(slot);
                        break;
                    }
                } else if first_empty.is_none() {
                    first_empty = Some(slot);
                }
            }

            if let Some(slot) = existing {
                // Safety: the slot holds a live value; assignment drops it.
                unsafe { *self.values.as_ptr().add(slot) = value };
                return;
            }

            if let Some(slot) = first_empty {
                // Safety: the slot bit is clear, so both cells are
                // uninitialised. The (key, value) pair is written before
                // the bit transitions 0 -> 1.
                unsafe {
                    self.keys.as_ptr().add(slot).write(key);
                    self.values.as_ptr().add(slot).write(value);
                }

                self.slot_map.set(slot);
                self.len += 1;

                return;
            }

            let target = (self.cap * 2).max(1);
            self.reserve(target);

            // Retry with the same entry; ownership was never given up.
            continue;
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find_slot(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let slot = self.find_slot(key)?;

        // Safety: the slot is occupied.
        Some(unsafe { &*self.values.as_ptr().add(slot) })
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = self.find_slot(key)?;

        // Safety: the slot is occupied.
        Some(unsafe { &mut *self.values.as_ptr().add(slot) })
    }

    /// Entry for `key` as a (key, value) pair.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let slot = self.find_slot(key)?;

        // Safety: the slot is occupied.
        Some(unsafe {
            (
                &*self.keys.as_ptr().add(slot),
                &*self.values.as_ptr().add(slot),
            )
        })
    }

    /// Removes the entry for `key`. Returns whether one was present.
    pub fn erase(&mut self, key: &K) -> bool {
        let Some(slot) = self.find_slot(key) else {
            return false;
        };

        // Safety: the slot is occupied; both cells are dropped exactly
        // once before the bit transitions 1 -> 0.
        unsafe {
            ptr::drop_in_place(self.keys.as_ptr().add(slot));
            ptr::drop_in_place(self.values.as_ptr().add(slot));
        }

        self.slot_map.clear_bit(slot);
        self.len -= 1;

        true
    }

    /// Drops every entry, keeping capacity.
    pub fn clear(&mut self) {
        for slot in 0..self.cap {
            if !self.slot_map.test(slot) {
                continue;
            }

            // Safety: occupied slots hold live entries.
            unsafe {
                ptr::drop_in_place(self.keys.as_ptr().add(slot));
                ptr::drop_in_place(self.values.as_ptr().add(slot));
            }
        }

        self.slot_map.zero();
        self.len = 0;
    }

    /// Grows to at least `new_capacity` slots and re-places every entry.
    ///
    /// The new capacity starts at the smallest power of two covering the
    /// request and doubles until every key fits within its probe chunk.
    /// A request at or below the current capacity is a no-op.
    pub fn reserve(&mut self, new_capacity: usize) {
        if new_capacity <= self.cap && self.cap != 0 {
            return;
        }

        let mut new_cap = BitUtil::grow_capacity(
            self.cap,
            new_capacity.max(Self::MINIMUM_CAPACITY).max(self.cap + 1),
        );

        loop {
            let new_keys = self.alloc.allocate_array::<K>(new_cap, self.flags);
            let new_values = self.alloc.allocate_array::<V>(new_cap, self.flags);
            let mut new_map = BitSet::with_flags_in(self.flags, self.alloc.clone());
            new_map.resize_bits(new_cap);

            let mut rebuilt = true;

            'place: for slot in 0..self.cap {
                if !self.slot_map.test(slot) {
                    continue;
                }

                let primary = Self::primary(&self.hasher, self.key_at(slot), new_cap);

                for step in 0..Self::chunk_len(new_cap) {
                    let target = (primary + step) & (new_cap - 1);

                    if !new_map.test(target) {
                        // Safety: entries move bitwise; the originals stay
                        // untouched in the old arrays and only one of the
                        // two copies is ever dropped or freed as live.
                        unsafe {
                            ptr::copy_nonoverlapping(
                                self.keys.as_ptr().add(slot),
                                new_keys.as_ptr().add(target),
                                1,
                            );
                            ptr::copy_nonoverlapping(
                                self.values.as_ptr().add(slot),
                                new_values.as_ptr().add(target),
                                1,
                            );
                        }

                        new_map.set(target);
                        continue 'place;
                    }
                }

                rebuilt = false;
                break;
            }

            if rebuilt {
                // Safety: entry ownership moved to the new arrays; the old
                // storage is released without dropping.
                unsafe {
                    self.alloc.deallocate_array(self.keys, self.cap, self.flags);
                    self.alloc.deallocate_array(self.values, self.cap, self.flags);
                }

                log::debug!(
                    "hash table rebuilt: {} -> {} slots ({} entries)",
                    self.cap,
                    new_cap,
                    self.len
                );

                self.keys = new_keys;
                self.values = new_values;
                self.slot_map = new_map;
                self.cap = new_cap;

                return;
            }

            // The copies in the new arrays are bitwise duplicates; free
            // the storage without dropping them and try a larger table.
            unsafe {
                self.alloc.deallocate_array(new_keys, new_cap, self.flags);
                self.alloc.deallocate_array(new_values, new_cap, self.flags);
            }

            new_cap <<= 1;
        }
    }

    /// Entries in slot order.
    pub fn iter(&self) -> HashTableIter<'_, K, V, A, S> {
        HashTableIter {
            table: self,
            slot: 0,
        }
    }

    /// Entries in slot order, values mutable.
    pub fn iter_mut(&mut self) -> HashTableIterMut<'_, K, V, A, S> {
        HashTableIterMut {
            table: self,
            slot: 0,
        }
    }

    /// Keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: Eq + Hash, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A, S> Drop for HashTable<K, V, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    fn drop(&mut self) {
        self.clear();

        // Safety: arrays came from our allocator with this capacity.
        unsafe {
            self.alloc.deallocate_array(self.keys, self.cap, self.flags);
            self.alloc.deallocate_array(self.values, self.cap, self.flags);
        }
    }
}

impl<K, V, A, S> fmt::Debug for HashTable<K, V, A, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    A: Allocator + Clone,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// Safety: the raw arrays are uniquely owned.
unsafe impl<K, V, A, S> Send for HashTable<K, V, A, S>
where
    K: Eq + Hash + Send,
    V: Send,
    A: Allocator + Clone + Send,
    S: BuildHasher + Send,
{
}

unsafe impl<K, V, A, S> Sync for HashTable<K, V, A, S>
where
    K: Eq + Hash + Sync,
    V: Sync,
    A: Allocator + Clone + Sync,
    S: BuildHasher + Sync,
{
}

/// Slot-order iterator over a hash table.
pub struct HashTableIter<'a, K, V, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    table: &'a HashTable<K, V, A, S>,
    slot: usize,
}

impl<'a, K, V, A, S> Iterator for HashTableIter<'a, K, V, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.slot < self.table.cap {
            let slot = self.slot;
            self.slot += 1;

            if self.table.slot_map.test(slot) {
                // Safety: the slot is occupied.
                return Some(unsafe {
                    (
                        &*self.table.keys.as_ptr().add(slot),
                        &*self.table.values.as_ptr().add(slot),
                    )
                });
            }
        }

        None
    }
}

/// Slot-order iterator with mutable value access.
pub struct HashTableIterMut<'a, K, V, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    table: &'a mut HashTable<K, V, A, S>,
    slot: usize,
}

impl<'a, K, V, A, S> Iterator for HashTableIterMut<'a, K, V, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.slot < self.table.cap {
            let slot = self.slot;
            self.slot += 1;

            if self.table.slot_map.test(slot) {
                // Safety: the slot is occupied; each slot is yielded at
                // most once, so the mutable borrows never alias.
                return Some(unsafe {
                    (
                        &*self.table.keys.as_ptr().add(slot),
                        &mut *self.table.values.as_ptr().add(slot),
                    )
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut table = HashTable::new();

        table.insert("one", 1);
        table.insert("two", 2);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&"one"), Some(&1));
        assert_eq!(table.get(&"two"), Some(&2));
        assert_eq!(table.get(&"three"), None);
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let mut table = HashTable::new();

        table.insert(7u32, "a");
        table.insert(7u32, "b");

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&7), Some(&"b"));
    }

    #[test]
    fn test_erase() {
        let mut table = HashTable::new();

        table.insert(1u32, 10);
        table.insert(2u32, 20);

        assert!(table.erase(&1));
        assert!(!table.erase(&1));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&1), None);
        assert_eq!(table.get(&2), Some(&20));
    }

    #[test]
    fn test_capacity_is_power_of_two() {
        let mut table = HashTable::new();

        assert_eq!(table.capacity(), HashTable::<u32, u32>::MINIMUM_CAPACITY);

        for i in 0..1000u32 {
            table.insert(i, i);
        }

        assert!(BitUtil::is_power_of_two(table.capacity()));
        assert!(table.capacity() >= 1000);
    }

    #[test]
    fn test_probe_stays_within_chunk() {
        let mut table = HashTable::new();

        for i in 0..500u64 {
            table.insert(i, i * 2);
        }

        for i in 0..500u64 {
            let slot = table.find_slot(&i).unwrap();
            let primary = HashTable::<u64, u64>::primary(table.hasher(), &i, table.capacity());
            let distance = (slot + table.capacity() - primary) & (table.capacity() - 1);

            assert!(distance < KEY_CHUNK_SIZE);
        }
    }

    #[test]
    fn test_uniqueness_under_churn() {
        let mut table = HashTable::new();

        for round in 0..5u64 {
            for i in 0..200u64 {
                table.insert(i, round);
            }
        }

        assert_eq!(table.len(), 200);

        let mut seen = std::collections::HashSet::new();
        for (k, v) in table.iter() {
            assert!(seen.insert(*k), "duplicate key {}", k);
            assert_eq!(*v, 4);
        }
    }

    #[test]
    fn test_grows_when_chunk_overflows() {
        // An identity hash plus keys that are all congruent modulo the
        // initial capacity lands every key in the same chunk. The chunk
        // overflows, the table doubles, and the keys spread out again.
        use std::hash::Hasher;

        #[derive(Default, Clone, Copy)]
        struct Identity;

        #[derive(Default)]
        struct IdentityHasher(u64);

        impl Hasher for IdentityHasher {
            fn write(&mut self, bytes: &[u8]) {
                let mut buf = [0u8; 8];
                let take = bytes.len().min(8);
                buf[..take].copy_from_slice(&bytes[..take]);
                self.0 = u64::from_le_bytes(buf);
            }

            fn write_u64(&mut self, value: u64) {
                self.0 = value;
            }

            fn finish(&self) -> u64 {
                self.0
            }
        }

        impl BuildHasher for Identity {
            type Hasher = IdentityHasher;

            fn build_hasher(&self) -> IdentityHasher {
                IdentityHasher::default()
            }
        }

        let mut table: HashTable<u64, u64, SystemAllocator, Identity> =
            HashTable::with_hasher_in(Identity, SystemAllocator);
        let initial = table.capacity();
        let count = initial as u64 + 4;

        // Every key is a multiple of the initial capacity, so each one
        // probes the chunk starting at slot 0 until the table grows.
        for i in 0..count {
            table.insert(i * initial as u64, i);
        }

        assert!(table.capacity() > initial);

        for i in 0..count {
            assert_eq!(table.get(&(i * initial as u64)), Some(&i));
        }
    }

    #[test]
    fn test_clear() {
        let mut table = HashTable::new();

        for i in 0..100u32 {
            table.insert(i, i.to_string());
        }

        let cap = table.capacity();
        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.capacity(), cap);
        assert_eq!(table.get(&5), None);
    }

    #[test]
    fn test_iter_mut() {
        let mut table = HashTable::new();

        for i in 0..50u32 {
            table.insert(i, i);
        }

        for (_, v) in table.iter_mut() {
            *v += 1;
        }

        for i in 0..50u32 {
            assert_eq!(table.get(&i), Some(&(i + 1)));
        }
    }

    #[test]
    fn test_drops_entries() {
        use std::rc::Rc;

        let witness = Rc::new(());
        let mut table = HashTable::new();

        for i in 0..20u32 {
            table.insert(i, Rc::clone(&witness));
        }

        assert_eq!(Rc::strong_count(&witness), 21);
        table.erase(&0);
        assert_eq!(Rc::strong_count(&witness), 20);
        drop(table);
        assert_eq!(Rc::strong_count(&witness), 1);
    }

    #[test]
    fn test_rehash_preserves_entries() {
        let mut table = HashTable::new();

        for i in 0..32u32 {
            table.insert(i, i * 10);
        }

        table.reserve(4096);

        assert_eq!(table.capacity(), 4096);
        assert_eq!(table.len(), 32);

        for i in 0..32u32 {
            assert_eq!(table.get(&i), Some(&(i * 10)));
        }
    }
}
