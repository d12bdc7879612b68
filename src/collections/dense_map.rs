//! Dense-value map
//!
//! A two-layer map: a chunk-probed [`HashTable`] from key to a `u32`
//! dense index, and a [`Vector`] holding the values tightly packed in
//! insertion order. Lookups pay one probe plus one array access;
//! value-only iteration is a contiguous scan.
//!
//! `erase` is order-preserving and therefore O(n): the dense array shifts
//! and every index greater than the removed one is rewritten. The O(1)
//! alternative that swaps the last value into the hole is available as
//! [`swap_erase`](DenseMap::swap_erase), at the cost of value order.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::collections::{BuildXxHash64, HashTable, Vector};
use crate::error::{Error, Result};
use crate::mem::{AllocationFlags, Allocator, SystemAllocator};

/// Map with hashed keys and densely packed values.
///
/// # Examples
///
/// ```
/// use plinth::collections::DenseMap;
///
/// let mut scores = DenseMap::new();
///
/// scores.insert("alice", 3);
/// scores.insert("bob", 5);
///
/// // Values sit contiguously in insertion order.
/// assert_eq!(scores.values(), &[3, 5]);
///
/// scores.erase(&"alice");
/// assert_eq!(scores.at(&"bob").unwrap(), &5);
/// ```
pub struct DenseMap<K, V, A = SystemAllocator, S = BuildXxHash64>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
    index: HashTable<K, u32, A, S>,
    data: Vector<V, A>,
}

impl<K: Eq + Hash, V> DenseMap<K, V> {
    pub fn new() -> Self {
        Self::new_in(SystemAllocator)
    }
}

impl<K, V, A, S> DenseMap<K, V, A, S>
where
    K: Eq + Hash,
    A: Allocator + Clone,
    S: BuildHasher,
{
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
            index: HashTable::with_flags_hasher_in(flags, hasher, alloc.clone()),
            data: Vector::with_flags_in(flags, alloc),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains(key)
    }

    /// Inserts or overwrites the value for `key`.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(&slot) = self.index.get(&key) {
            self.data[slot as usize] = value;
        } else {
            let slot = self.data.len() as u32;

            self.data.push(value);
            self.index.insert(key, slot);
        }
    }

    /// Binds a new key to a new value. Fails with `InvalidArgument` when
    /// the key is already present.
    pub fn emplace(&mut self, key: K, value: V) -> Result<&mut V> {
        if self.index.contains(&key) {
            return Err(Error::InvalidArgument("key already present"));
        }

        let slot = self.data.len();

        self.data.push(value);
        self.index.insert(key, slot as u32);

        Ok(&mut self.data[slot])
    }

    /// Removes `key`, preserving the order of the remaining values.
    ///
    /// O(n): the dense array shifts down and every index greater than the
    /// removed one is rewritten. Returns whether the key was present.
    pub fn erase(&mut self, key: &K) -> bool {
        let Some(&slot) = self.index.get(key) else {
            return false;
        };

        // The erase cannot fail: slot always indexes into data.
        let _ = self.data.erase(slot as usize, slot as usize + 1);
        self.index.erase(key);

        for (_, dense) in self.index.iter_mut() {
            if *dense > slot {
                *dense -= 1;
            }
        }

        true
    }

    /// Removes `key` by swapping the last value into its place. O(1) on
    /// the dense array, but value order is not preserved. Returns whether
    /// the key was present.
    pub fn swap_erase(&mut self, key: &K) -> bool {
        let Some(&slot) = self.index.get(key) else {
            return false;
        };

        let slot = slot as usize;
        let last = self.data.len() - 1;

        self.index.erase(key);

        if slot != last {
            self.data.as_mut_slice().swap(slot, last);

            for (_, dense) in self.index.iter_mut() {
                if *dense as usize == last {
                    *dense = slot as u32;
                    break;
                }
            }
        }

        self.data.truncate(last);

        true
    }

    /// The value for `key`. Fails with `OutOfRange` when absent.
    pub fn at(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(Error::OutOfRange("key not present"))
    }

    /// The value for `key`, mutable. Fails with `OutOfRange` when absent.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V> {
        self.get_mut(key).ok_or(Error::OutOfRange("key not present"))
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let &slot = self.index.get(key)?;

        Some(&self.data[slot as usize])
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let &slot = self.index.get(key)?;

        Some(&mut self.data[slot as usize])
    }

    /// Dense index of `key`, if present.
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).map(|&slot| slot as usize)
    }

    /// The value for `key`, default-inserting when absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot as usize,
            None => {
                let slot = self.data.len();

                self.data.push(V::default());
                self.index.insert(key, slot as u32);

                slot
            }
        };

        &mut self.data[slot]
    }

    /// Distinct mutable borrows of the values for two different keys.
    /// Returns `None` when either key is absent or the keys are equal.
    pub fn get_pair_mut(&mut self, a: &K, b: &K) -> Option<(&mut V, &mut V)> {
        let &slot_a = self.index.get(a)?;
        let &slot_b = self.index.get(b)?;

        if slot_a == slot_b {
            return None;
        }

        let base = self.data.as_mut_slice().as_mut_ptr();

        // Safety: the slots are distinct in-bounds indices, so the two
        // borrows never alias.
        unsafe {
            Some((
                &mut *base.add(slot_a as usize),
                &mut *base.add(slot_b as usize),
            ))
        }
    }

    /// Values in dense (insertion) order.
    pub fn values(&self) -> &[V] {
        self.data.as_slice()
    }

    /// Values in dense (insertion) order, mutable.
    pub fn values_mut(&mut self) -> &mut [V] {
        self.data.as_mut_slice()
    }

    /// Entries as (key, value) pairs, in the index table's slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.index
            .iter()
            .map(|(key, &slot)| (key, &self.data[slot as usize]))
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.data.clear();
    }
}

impl<K: Eq + Hash, V> Default for DenseMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A, S> fmt::Debug for DenseMap<K, V, A, S>
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
