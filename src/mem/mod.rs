//! Memory substrate
//!
//! The allocator contract and its implementations, plus the low-level
//! helpers the containers are built from:
//!
//! - [`Allocator`] / [`AllocatorExt`] - raw and typed allocation, flags,
//!   optional ownership and introspection features
//! - [`SystemAllocator`], [`NullAllocator`], [`LocalAllocator`],
//!   [`CompositeAllocator`] - the allocator implementations
//! - [`BitUtil`] / [`PageUtil`] - bit math and page address translation
//! - [`TaggedPtr`] - a pointer carrying a tag in its alignment bits
//! - [`MemoryPool`] - a free-list pool of raw same-type slots

pub mod alloc;
pub mod bit_util;
pub mod composite;
pub mod local_alloc;
pub mod memory_pool;
pub mod page_util;
pub mod tagged_ptr;

pub use alloc::{
    default_allocator, set_default_allocator, AllocationFlags, AllocationInfo, Allocator,
    AllocatorExt, AllocatorFeatures, NullAllocator, SystemAllocator,
};
pub use bit_util::BitUtil;
pub use composite::CompositeAllocator;
pub use local_alloc::{ExhaustionPolicy, LocalAllocator};
pub use memory_pool::MemoryPool;
pub use page_util::PageUtil;
pub use tagged_ptr::TaggedPtr;
