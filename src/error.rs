use thiserror::Error;

/// Error kind shared by every fallible operation in the crate.
///
/// Index-addressed accessors (`Index`, `get`) follow the usual Rust
/// convention of panicking or returning `Option`; operations whose failure
/// is part of their contract (popping an empty queue, releasing a stale
/// handle, overflowing a packed field) return one of these instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("out of range: {0}")]
    OutOfRange(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("allocation failed: {0}")]
    AllocationFailed(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
