//! Numeric utilities: centralized integer conversions.
//!
//! Saturating forms are used where clamping is acceptable (ages, byte counters);
//! widening helpers keep call sites searchable.

use std::time::Duration;

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[inline]
#[must_use]
pub fn u128_to_i64_saturating(v: u128) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Milliseconds of a duration, clamped to `i64::MAX`.
#[inline]
#[must_use]
pub fn duration_to_millis_i64(d: Duration) -> i64 {
    u128_to_i64_saturating(d.as_millis())
}
