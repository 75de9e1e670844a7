// Copyright 2025 the Vello Authors and the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mathematical helper functions.

// From <https://github.com/linebender/tiny-skia/blob/68b198a7210a6bbf752b43d6bc4db62445730313/path/src/scalar.rs#L12>
const SCALAR_NEARLY_ZERO: f64 = 1.0 / (1 << 12) as f64;

/// A number of useful methods for f64 numbers.
pub(crate) trait FloatExt {
    /// Whether the number is approximately 0.
    fn is_nearly_zero(&self) -> bool {
        self.is_nearly_zero_within_tolerance(SCALAR_NEARLY_ZERO)
    }

    /// Whether the number is approximately 0, with a given tolerance.
    fn is_nearly_zero_within_tolerance(&self, tolerance: f64) -> bool;
}

impl FloatExt for f64 {
    #[inline(always)]
    fn is_nearly_zero_within_tolerance(&self, tolerance: f64) -> bool {
        debug_assert!(tolerance >= 0.0, "tolerance must be positive");

        self.abs() <= tolerance
    }
}

/// Rounds `n` up to the next multiple of `step` (toward positive infinity).
#[inline]
pub(crate) fn round_up_to_multiple(n: i32, step: i32) -> i32 {
    debug_assert!(step > 0, "step must be positive");
    n.div_euclid(step) * step + if n.rem_euclid(step) == 0 { 0 } else { step }
}
