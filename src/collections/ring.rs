//! Bounded circular buffer
//!
//! Capacity is fixed at construction; enqueueing into a full ring is an
//! error, not a growth trigger. The read index wraps modulo capacity.

use std::fmt;
use std::ptr::{self, NonNull};

use crate::error::{Error, Result};
use crate::mem::{AllocationFlags, Allocator, AllocatorExt, SystemAllocator};

/// Fixed-capacity FIFO ring buffer.
///
/// # Examples
///
/// ```
/// use plinth::collections::Ring;
///
/// let mut ring = Ring::new(2).unwrap();
///
/// ring.enqueue_back('a').unwrap();
/// ring.enqueue_back('b').unwrap();
///
/// // Full rings reject further writes instead of growing.
/// assert!(ring.enqueue_back('c').is_err());
///
/// assert_eq!(ring.dequeue_front().unwrap(), 'a');
/// ring.enqueue_back('c').unwrap();
/// ```
pub struct Ring<T, A: Allocator = SystemAllocator> {
    read_index: usize,
    len: usize,
    cap: usize,
    data: NonNull<T>,
    flags: AllocationFlags,
    alloc: A,
}

impl<T> Ring<T> {
    /// Creates a ring with room for `capacity` elements. Fails with
    /// `InvalidArgument` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::new_in(capacity, SystemAllocator)
    }
}

impl<T, A: Allocator> Ring<T, A> {
    pub fn new_in(capacity: usize, alloc: A) -> Result<Self> {
        Self::with_flags_in(capacity, AllocationFlags::empty(), alloc)
    }

    pub fn with_flags_in(capacity: usize, flags: AllocationFlags, alloc: A) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("ring capacity must not be zero"));
        }

        let data = alloc
            .try_allocate_array::<T>(capacity, flags)
            .ok_or(Error::AllocationFailed("ring buffer allocation"))?;

        Ok(Self {
            read_index: 0,
            len: 0,
            cap: capacity,
            data,
            flags,
            alloc,
        })
    }

    /// Builds a ring sized and filled from an iterator. Fails with
    /// `InvalidArgument` when the iterator is empty.
    pub fn from_iter_in<I>(items: I, alloc: A) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        let mut ring = Self::new_in(items.len(), alloc)?;

        for item in items {
            // Cannot overflow: capacity equals the iterator length.
            ring.enqueue_back(item)?;
        }

        Ok(ring)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.cap
    }

    fn write_index(&self) -> usize {
        (self.read_index + self.len) % self.cap
    }

    /// Appends at the write end. Fails with `OutOfRange` when full.
    pub fn enqueue_back(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            return Err(Error::OutOfRange("ring is full"));
        }

        let index = self.write_index();

        // Safety: the slot is within capacity and outside the live range.
        unsafe { self.data.as_ptr().add(index).write(value) };
        self.len += 1;

        Ok(())
    }

    /// Removes and returns the front element. Fails with `OutOfRange`
    /// when empty.
    pub fn dequeue_front(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(Error::OutOfRange("ring is empty"));
        }

        // Safety: the head slot is initialised and leaves the live range.
        let value = unsafe { self.data.as_ptr().add(self.read_index).read() };

        self.read_index = (self.read_index + 1) % self.cap;
        self.len -= 1;

        Ok(value)
    }

    /// The front element. Fails with `OutOfRange` when empty.
    pub fn front(&self) -> Result<&T> {
        if self.is_empty() {
            return Err(Error::OutOfRange("ring is empty"));
        }

        // Safety: the head slot is initialised.
        Ok(unsafe { &*self.data.as_ptr().add(self.read_index) })
    }

    pub fn front_mut(&mut self) -> Result<&mut T> {
        if self.is_empty() {
            return Err(Error::OutOfRange("ring is empty"));
        }

        // Safety: the head slot is initialised.
        Ok(unsafe { &mut *self.data.as_ptr().add(self.read_index) })
    }

    /// Drops every element. Capacity is unchanged.
    pub fn clear(&mut self) {
        while self.len > 0 {
            // Safety: the head slot is initialised.
            unsafe { ptr::drop_in_place(self.data.as_ptr().add(self.read_index)) };
            self.read_index = (self.read_index + 1) % self.cap;
            self.len -= 1;
        }

        self.read_index = 0;
    }
}

impl<T, A: Allocator> Drop for Ring<T, A> {
    fn drop(&mut self) {
        self.clear();

        // Safety: buffer came from our allocator with this capacity.
        unsafe { self.alloc.deallocate_array(self.data, self.cap, self.flags) };
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Ring<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();

        for i in 0..self.len {
            let index = (self.read_index + i) % self.cap;
            // Safety: slots in the live range are initialised.
            list.entry(unsafe { &*self.data.as_ptr().add(index) });
        }

        list.finish()
    }
}

// Safety: the buffer is uniquely owned.
unsafe impl<T: Send, A: Allocator + Send> Send for Ring<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Ring<T, A> {}
