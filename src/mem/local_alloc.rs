//! Bump allocator over fixed inline storage
//!
//! Useful for a known, small amount of data that should never touch the
//! heap. Pairs with [`CompositeAllocator`](crate::mem::CompositeAllocator)
//! to build small-buffer-optimised containers.

use std::alloc::Layout;
use std::cell::{Cell, UnsafeCell};
use std::ptr::NonNull;

use crate::mem::{AllocationFlags, Allocator, AllocatorFeatures};

/// What a [`LocalAllocator`] does when its storage is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Panic. The local analog of an allocation failure in the default
    /// allocator.
    #[default]
    Panic,

    /// Return `None`, letting the caller fall back elsewhere.
    ReturnNull,
}

/// An allocator serving from `N` bytes of inline storage.
///
/// Allocation bumps an offset; individual deallocation is a no-op and
/// memory is only reclaimed wholesale through [`clear`](Self::clear).
/// Supports ownership queries, which is what makes it usable as the first
/// allocator of a composite.
///
/// Interior mutability keeps the [`Allocator`] interface shared-reference
/// based, which also makes this type `!Sync` by construction.
///
/// # Examples
///
/// ```
/// use plinth::mem::{
///     AllocationFlags, AllocatorExt, ExhaustionPolicy, LocalAllocator,
/// };
///
/// let alloc = LocalAllocator::<64>::new(ExhaustionPolicy::ReturnNull);
///
/// let block = alloc.try_allocate_array::<u64>(4, AllocationFlags::empty());
/// assert!(block.is_some());
///
/// // The buffer only has room for eight u64 values in total.
/// assert!(alloc.try_allocate_array::<u64>(8, AllocationFlags::empty()).is_none());
/// ```
pub struct LocalAllocator<const N: usize> {
    memory: UnsafeCell<[u8; N]>,
    used: Cell<usize>,
    policy: ExhaustionPolicy,
}

impl<const N: usize> LocalAllocator<N> {
    pub fn new(policy: ExhaustionPolicy) -> Self {
        Self {
            memory: UnsafeCell::new([0; N]),
            used: Cell::new(0),
            policy,
        }
    }

    /// Total storage, in bytes.
    pub const fn memory_size(&self) -> usize {
        N
    }

    /// Bytes consumed so far, alignment padding included.
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Forgets every allocation and allows reuse of the whole buffer.
    ///
    /// # Safety contract (logical)
    ///
    /// The caller must ensure no live allocation from this buffer is
    /// accessed afterwards.
    pub fn clear(&self) {
        self.used.set(0);
    }

    fn base(&self) -> usize {
        self.memory.get() as usize
    }
}

impl<const N: usize> Default for LocalAllocator<N> {
    fn default() -> Self {
        Self::new(ExhaustionPolicy::default())
    }
}

impl<const N: usize> Allocator for LocalAllocator<N> {
    fn allocate(&self, layout: Layout, _flags: AllocationFlags) -> Option<NonNull<u8>> {
        let used = self.used.get();
        let cursor = self.base() + used;
        let aligned = cursor.checked_add(layout.align() - 1)? & !(layout.align() - 1);
        let padding = aligned - cursor;
        let needed = layout.size().checked_add(padding)?;

        if needed > N - used {
            match self.policy {
                ExhaustionPolicy::Panic => {
                    panic!("local allocator exhausted ({} of {} bytes used)", used, N)
                }
                ExhaustionPolicy::ReturnNull => return None,
            }
        }

        self.used.set(used + needed);

        NonNull::new(aligned as *mut u8)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        let addr = ptr.as_ptr() as usize;

        addr >= self.base() && addr < self.base() + N
    }

    fn features(&self) -> AllocatorFeatures {
        AllocatorFeatures::OWNERSHIP_QUERY
    }
}
