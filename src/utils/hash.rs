//! Content hashing using FxHash.
//!
//! Used to detect whether the config file content actually changed
//! before tearing down and respawning watch targets.

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}
