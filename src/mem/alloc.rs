//! Memory allocator contract
//!
//! Containers in this crate do not talk to the global heap directly; they
//! go through an [`Allocator`]. Stateless allocators are zero-sized and
//! embed into a container at no cost, stateful ones are shared by
//! reference, so `Vector<T>` and `Vector<T, &LocalAllocator<N>>` have the
//! same code but different storage strategies.

use std::alloc::Layout;
use std::ptr::NonNull;

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};

/// Flags attached to an allocation. Opaque to containers, which pass them
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationFlags(pub u32);

impl AllocationFlags {
    /// The allocation is never freed. Containers skip the matching
    /// deallocation for memory carrying this flag.
    pub const PERMANENT: AllocationFlags = AllocationFlags(1 << 0);

    /// The allocation is expected to be short-lived.
    pub const TEMPORARY: AllocationFlags = AllocationFlags(1 << 1);

    pub const fn empty() -> Self {
        AllocationFlags(0)
    }

    pub const fn contains(self, other: AllocationFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: AllocationFlags) -> Self {
        AllocationFlags(self.0 | other.0)
    }

    pub const fn is_permanent(self) -> bool {
        self.contains(Self::PERMANENT)
    }
}

/// Optional capabilities an allocator may advertise.
///
/// An allocator lacking a feature must answer conservatively: `owns`
/// returns false, `allocation_info` returns a zeroed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocatorFeatures(pub u32);

impl AllocatorFeatures {
    /// `allocation_info` returns meaningful data.
    pub const ALLOCATION_INFO: AllocatorFeatures = AllocatorFeatures(1 << 0);

    /// `owns` returns meaningful data.
    pub const OWNERSHIP_QUERY: AllocatorFeatures = AllocatorFeatures(1 << 1);

    pub const fn empty() -> Self {
        AllocatorFeatures(0)
    }

    pub const fn contains(self, other: AllocatorFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: AllocatorFeatures) -> Self {
        AllocatorFeatures(self.0 | other.0)
    }
}

/// Information held by an allocator about one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationInfo {
    pub size: usize,
    pub alignment: usize,
    pub flags: AllocationFlags,
}

/// Raw memory provider.
///
/// `allocate` returns `None` on failure; whether that is an error or a
/// signal to fall back elsewhere is the caller's business (see
/// [`CompositeAllocator`](crate::mem::CompositeAllocator)).
pub trait Allocator {
    /// Allocates a block satisfying `layout`. Returns `None` on failure.
    fn allocate(&self, layout: Layout, flags: AllocationFlags) -> Option<NonNull<u8>>;

    /// Frees a block previously returned by `allocate`.
    ///
    /// # Safety
    ///
    /// `ptr` must have been allocated by this allocator with `layout`, and
    /// must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Whether this allocator owns the given pointer. Meaningful only when
    /// [`AllocatorFeatures::OWNERSHIP_QUERY`] is advertised; otherwise
    /// must return false.
    fn owns(&self, _ptr: NonNull<u8>) -> bool {
        false
    }

    /// Information about an allocation. Meaningful only when
    /// [`AllocatorFeatures::ALLOCATION_INFO`] is advertised; otherwise
    /// returns a zeroed record.
    fn allocation_info(&self, _ptr: NonNull<u8>) -> AllocationInfo {
        AllocationInfo::default()
    }

    /// The feature set this allocator supports.
    fn features(&self) -> AllocatorFeatures {
        AllocatorFeatures::empty()
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, layout: Layout, flags: AllocationFlags) -> Option<NonNull<u8>> {
        (**self).allocate(layout, flags)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        (**self).owns(ptr)
    }

    fn allocation_info(&self, ptr: NonNull<u8>) -> AllocationInfo {
        (**self).allocation_info(ptr)
    }

    fn features(&self) -> AllocatorFeatures {
        (**self).features()
    }
}

/// Typed array helpers layered on the raw byte interface.
///
/// Zero-sized layouts (empty arrays, zero-sized element types) never reach
/// the allocator; they are represented by dangling pointers, and the
/// matching deallocation is a no-op.
pub trait AllocatorExt: Allocator {
    /// Allocates storage for `n` values of `T` without constructing them.
    ///
    /// # Panics
    ///
    /// Panics if the allocator fails, or if the array layout overflows.
    fn allocate_array<T>(&self, n: usize, flags: AllocationFlags) -> NonNull<T> {
        match self.try_allocate_array(n, flags) {
            Some(ptr) => ptr,
            None => panic!(
                "allocation of {} x {} bytes failed",
                n,
                std::mem::size_of::<T>()
            ),
        }
    }

    /// Fallible variant of [`allocate_array`](Self::allocate_array).
    fn try_allocate_array<T>(&self, n: usize, flags: AllocationFlags) -> Option<NonNull<T>> {
        let layout = Layout::array::<T>(n).ok()?;

        if layout.size() == 0 {
            return Some(NonNull::dangling());
        }

        self.allocate(layout, flags).map(NonNull::cast)
    }

    /// Frees storage obtained from [`allocate_array`](Self::allocate_array).
    ///
    /// Honors the `PERMANENT` flag by leaving the block alone.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_array::<T>(n, flags)` on this
    /// allocator, with the same `n`, and the values must already be
    /// dropped.
    unsafe fn deallocate_array<T>(&self, ptr: NonNull<T>, n: usize, flags: AllocationFlags) {
        if flags.is_permanent() {
            return;
        }

        let layout = match Layout::array::<T>(n) {
            Ok(layout) => layout,
            Err(_) => return,
        };

        if layout.size() == 0 {
            return;
        }

        self.deallocate(ptr.cast(), layout);
    }
}

impl<A: Allocator + ?Sized> AllocatorExt for A {}

/// Zero-sized allocator over the process heap. The default for every
/// container in the crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn allocate(&self, layout: Layout, _flags: AllocationFlags) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0);

        // Safety: layout has non-zero size.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }
}

/// An allocator that allocates nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullAllocator;

impl Allocator for NullAllocator {
    fn allocate(&self, _layout: Layout, _flags: AllocationFlags) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

static DEFAULT_ALLOCATOR: OnceCell<&'static (dyn Allocator + Sync)> = OnceCell::new();
static SYSTEM: SystemAllocator = SystemAllocator;

/// Installs the process-wide default allocator.
///
/// May be called at most once, before the first call to
/// [`default_allocator`] that should observe it. Fails with
/// `InvalidArgument` when a default has already been installed.
pub fn set_default_allocator(allocator: &'static (dyn Allocator + Sync)) -> Result<()> {
    DEFAULT_ALLOCATOR
        .set(allocator)
        .map_err(|_| Error::InvalidArgument("default allocator already installed"))
}

/// The process-wide default allocator. Falls back to the system heap when
/// none has been installed.
pub fn default_allocator() -> &'static (dyn Allocator + Sync) {
    DEFAULT_ALLOCATOR.get().copied().unwrap_or(&SYSTEM)
}
