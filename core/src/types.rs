//! Shared primitive types and guarded arithmetic used across the core.

pub type Year = i32;
pub type Month = u32;

/// Relative change of `new` against `base`, as a fraction (0.10 = +10%).
/// A zero base yields 0.0 — never NaN or infinity.
pub fn pct_change(new: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        new / base - 1.0
    }
}

/// Ratio with a zero-denominator guard. Every ratio in the core goes
/// through this or [`pct_change`] so the substitution is consistent.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
