//! Versioned handles
//!
//! A handle is a `(generation, value)` pair packed into one `u32` and
//! tagged with the type of object it refers to. The generation lets a
//! manager distinguish a stale handle from a live one occupying the same
//! slot.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::config::HANDLE_VALUE_WIDTH;
use crate::error::Result;
use crate::handle::PackedInteger;

/// Marker relating handle tags, enabling [`Handle::cast`] between them.
///
/// Implement `TagUpcast<Base> for Derived` to declare that a handle to
/// `Derived` may be viewed as a handle to `Base`. The relation is
/// reflexive by blanket implementation.
pub trait TagUpcast<Base: ?Sized> {}

impl<T: ?Sized> TagUpcast<T> for T {}

/// Packed integer layout shared by every handle.
pub type HandleRepr = PackedInteger<u32, HANDLE_VALUE_WIDTH>;

/// A generation-tagged reference to an object of type `Tag`.
///
/// Two handles are equal iff their raw words are equal, generation
/// included. Ordering compares values only, with one quirk: `<=` and
/// `>=` treat raw-equal handles as ordered even though `<` and `>`
/// ignore generations. The asymmetry is dubious but intentional; code
/// relying on handle ordering should stick to `<` and `>`.
///
/// # Examples
///
/// ```
/// use plinth::handle::Handle;
///
/// struct Texture;
///
/// let handle: Handle<Texture> = Handle::make(1, 40).unwrap();
///
/// assert_eq!(handle.generation(), 1);
/// assert_eq!(handle.value(), 40);
///
/// let stale: Handle<Texture> = Handle::make(0, 40).unwrap();
/// assert_ne!(handle, stale); // same slot, different generation
/// ```
pub struct Handle<Tag: ?Sized> {
    value: HandleRepr,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag: ?Sized> Handle<Tag> {
    /// Largest generation a handle can carry.
    pub const MAX_GENERATION: u32 = u32::MAX >> HANDLE_VALUE_WIDTH;

    /// Largest value a handle can carry.
    pub const MAX_VALUE: u32 = (1 << HANDLE_VALUE_WIDTH) - 1;

    /// Value marking a handle as null.
    pub const INVALID_VALUE: u32 = Self::MAX_VALUE;

    /// The null handle: generation 0, value all-ones.
    pub fn null() -> Self {
        Self::from_raw(Self::INVALID_VALUE)
    }

    /// Builds a handle from its parts. Fails with `OutOfRange` when a
    /// part does not fit its field.
    pub fn make(generation: u32, value: u32) -> Result<Self> {
        Ok(Self {
            value: HandleRepr::make(generation, value)?,
            _tag: PhantomData,
        })
    }

    pub fn from_raw(raw: u32) -> Self {
        Self {
            value: HandleRepr::from_raw(raw),
            _tag: PhantomData,
        }
    }

    pub fn generation(self) -> u32 {
        self.value.high()
    }

    pub fn value(self) -> u32 {
        self.value.low()
    }

    pub fn raw(self) -> u32 {
        self.value.get()
    }

    pub fn is_null(self) -> bool {
        self.value() == Self::INVALID_VALUE
    }

    /// Re-tags the handle towards a declared base tag, preserving the
    /// `(generation, value)` pair.
    pub fn cast<To: ?Sized>(self) -> Handle<To>
    where
        Tag: TagUpcast<To>,
    {
        Handle::from_raw(self.raw())
    }

    /// Re-tags the handle with no relation between the tags. Preserves
    /// the `(generation, value)` pair; correctness is on the caller.
    pub fn reinterpret<To: ?Sized>(self) -> Handle<To> {
        Handle::from_raw(self.raw())
    }
}

impl<Tag: ?Sized> Clone for Handle<Tag> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag: ?Sized> Copy for Handle<Tag> {}

impl<Tag: ?Sized> Default for Handle<Tag> {
    fn default() -> Self {
        Self::null()
    }
}

impl<Tag: ?Sized> PartialEq for Handle<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl<Tag: ?Sized> Eq for Handle<Tag> {}

impl<Tag: ?Sized> Hash for Handle<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw().hash(state);
    }
}

impl<Tag: ?Sized> PartialOrd for Handle<Tag> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.value().cmp(&other.value()))
    }

    fn lt(&self, other: &Self) -> bool {
        self.value() < other.value()
    }

    fn gt(&self, other: &Self) -> bool {
        self.value() > other.value()
    }

    // Raw equality counts for <= and >= even though lt/gt ignore the
    // generation. See the type-level docs.
    fn le(&self, other: &Self) -> bool {
        self.raw() == other.raw() || self.value() < other.value()
    }

    fn ge(&self, other: &Self) -> bool {
        self.raw() == other.raw() || self.value() > other.value()
    }
}

impl<Tag: ?Sized> fmt::Debug for Handle<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("generation", &self.generation())
            .field("value", &self.value())
            .finish()
    }
}
