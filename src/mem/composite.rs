//! Meta-allocator dispatching to two sub-allocators
//!
//! Allocations go to the first allocator and fall back to the second when
//! it returns null. Deallocations are routed by ownership query, which is
//! why the first allocator must support one.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::{Error, Result};
use crate::mem::{AllocationFlags, AllocationInfo, Allocator, AllocatorFeatures};

/// Try-then-fallback allocator pair.
///
/// The canonical use is a small-buffer optimisation: a null-returning
/// [`LocalAllocator`](crate::mem::LocalAllocator) in front of the
/// [`SystemAllocator`](crate::mem::SystemAllocator).
///
/// # Examples
///
/// ```
/// use plinth::collections::Vector;
/// use plinth::mem::{
///     CompositeAllocator, ExhaustionPolicy, LocalAllocator, SystemAllocator,
/// };
///
/// let inline = LocalAllocator::<256>::new(ExhaustionPolicy::ReturnNull);
/// let alloc = CompositeAllocator::new(&inline, SystemAllocator).unwrap();
///
/// // Small enough to live in the inline buffer; grows onto the heap
/// // transparently once that fills up.
/// let mut v = Vector::new_in(&alloc);
/// for i in 0..1_000u32 {
///     v.push(i);
/// }
///
/// assert_eq!(v.len(), 1_000);
/// ```
pub struct CompositeAllocator<A1, A2> {
    first: A1,
    second: A2,
}

impl<A1: Allocator, A2: Allocator> CompositeAllocator<A1, A2> {
    /// Combines two allocators.
    ///
    /// Fails with `InvalidArgument` when `first` does not advertise
    /// ownership queries; without them deallocations cannot be routed.
    pub fn new(first: A1, second: A2) -> Result<Self> {
        if !first.features().contains(AllocatorFeatures::OWNERSHIP_QUERY) {
            return Err(Error::InvalidArgument(
                "first allocator must support ownership queries",
            ));
        }

        Ok(Self { first, second })
    }
}

impl<A1: Allocator, A2: Allocator> Allocator for CompositeAllocator<A1, A2> {
    fn allocate(&self, layout: Layout, flags: AllocationFlags) -> Option<NonNull<u8>> {
        match self.first.allocate(layout, flags) {
            Some(ptr) => Some(ptr),
            None => {
                log::trace!(
                    "composite allocator falling back for {} byte allocation",
                    layout.size()
                );
                self.second.allocate(layout, flags)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if self.first.owns(ptr) {
            self.first.deallocate(ptr, layout);
        } else {
            self.second.deallocate(ptr, layout);
        }
    }

    fn allocation_info(&self, _ptr: NonNull<u8>) -> AllocationInfo {
        AllocationInfo::default()
    }
}
