//! Raw memory pool for same-type slots
//!
//! Hands out pointers to uninitialised, `sizeof(T)`-strided slots carved
//! from page-sized blocks. The pool never constructs or destroys a `T`;
//! callers own the lifetime of whatever they place in a slot. Slot
//! pointers stay valid for the lifetime of the pool.

use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::collections::Vector;
use crate::config::PAGE_SIZE;
use crate::mem::{AllocationFlags, Allocator, AllocatorExt, SystemAllocator};

/// Free-list pool of raw `T` slots backed by page-sized blocks.
///
/// # Examples
///
/// ```
/// use plinth::mem::MemoryPool;
///
/// let mut pool = MemoryPool::<u64>::new();
///
/// let slot = pool.acquire();
///
/// // The pool hands out raw memory; writing and dropping are on the
/// // caller.
/// unsafe { slot.as_ptr().write(7) };
/// assert_eq!(unsafe { slot.as_ptr().read() }, 7);
///
/// pool.release(slot);
/// ```
pub struct MemoryPool<T, A: Allocator + Clone = SystemAllocator> {
    pages: Vector<NonNull<T>, A>,
    free: Vector<NonNull<T>, A>,
    flags: AllocationFlags,
    alloc: A,
    _marker: PhantomData<T>,
}

impl<T> MemoryPool<T> {
    pub fn new() -> Self {
        Self::new_in(SystemAllocator)
    }
}

impl<T, A: Allocator + Clone> MemoryPool<T, A> {
    /// Slots carved from each page.
    pub const SLOTS_PER_PAGE: usize = {
        assert!(std::mem::size_of::<T>() <= PAGE_SIZE, "object type too large");

        if std::mem::size_of::<T>() == 0 {
            1
        } else {
            PAGE_SIZE / std::mem::size_of::<T>()
        }
    };

    pub fn new_in(alloc: A) -> Self {
        Self::with_flags_in(AllocationFlags::empty(), alloc)
    }

    pub fn with_flags_in(flags: AllocationFlags, alloc: A) -> Self {
        Self {
            pages: Vector::new_in(alloc.clone()),
            free: Vector::new_in(alloc.clone()),
            flags,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Number of slots currently sitting on the free stack.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total slots across all allocated pages.
    pub fn capacity(&self) -> usize {
        self.pages.len() * Self::SLOTS_PER_PAGE
    }

    fn add_page(&mut self) {
        let page = self.alloc.allocate_array::<T>(Self::SLOTS_PER_PAGE, self.flags);

        self.pages.push(page);

        // Pushed in reverse so the page's first slot is handed out next.
        for i in (0..Self::SLOTS_PER_PAGE).rev() {
            // Safety: i is within the page just allocated.
            let slot = unsafe { NonNull::new_unchecked(page.as_ptr().add(i)) };
            self.free.push(slot);
        }
    }

    /// Acquires uninitialised memory for one `T`.
    ///
    /// Pops the free stack, growing storage by one page when it is empty.
    /// The returned pointer is valid until [`release`](Self::release) or
    /// the pool is dropped; no constructor runs.
    pub fn acquire(&mut self) -> NonNull<T> {
        if let Some(slot) = self.free.pop() {
            return slot;
        }

        self.add_page();

        log::trace!(
            "memory pool grew to {} slots of {} bytes",
            self.capacity(),
            std::mem::size_of::<T>()
        );

        // The new page put SLOTS_PER_PAGE pointers on the free stack.
        self.acquire()
    }

    /// Returns a slot to the pool. No destructor runs; the caller must
    /// have dropped any value it constructed there.
    pub fn release(&mut self, slot: NonNull<T>) {
        self.free.push(slot);
    }
}

impl<T> Default for MemoryPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator + Clone> Drop for MemoryPool<T, A> {
    fn drop(&mut self) {
        for page in self.pages.iter() {
            // Safety: each page was allocated with SLOTS_PER_PAGE slots.
            unsafe {
                self.alloc
                    .deallocate_array(*page, Self::SLOTS_PER_PAGE, self.flags)
            };
        }
    }
}

// Safety: the pages are uniquely owned raw storage.
unsafe impl<T: Send, A: Allocator + Clone + Send> Send for MemoryPool<T, A> {}
