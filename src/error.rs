use thiserror::Error;

/// Returned by the strict accessors when the key has no entry.
///
/// Misses on `insert`/`erase`/`contains_key` are ordinary boolean outcomes,
/// not errors; only `get`/`get_mut` treat absence as a failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("key not found")]
pub struct KeyNotFound;
