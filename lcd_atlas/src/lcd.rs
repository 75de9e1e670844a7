// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The LCD coverage-diffusion filter.
//!
//! On an LCD panel the light of one subpixel bleeds into its neighbours. The filter models this
//! with a symmetric 5-tap kernel over subpixel coverage samples: the center tap uses the
//! *primary* weight, the taps at distance 1 the *secondary* weight and the taps at distance 2 the
//! *tertiary* weight. Normalizing so that `primary + 2 * secondary + 2 * tertiary == 1` keeps the
//! total energy of a sample constant.
//!
//! Weighted contributions are precomputed for every coverage byte in 8.8 fixed point, so a
//! convolution is five table lookups and an add.

use alloc::boxed::Box;
use core::fmt;

#[cfg(not(feature = "std"))]
use core_maths::CoreFloat as _;

const PRIMARY: usize = 0;
const SECONDARY: usize = 1;
const TERTIARY: usize = 2;

/// Precomputed coverage-diffusion table.
#[derive(Clone)]
pub struct LcdDistribution {
    weights: [f64; 3],
    // Indexed by coverage, then by channel (primary, secondary, tertiary).
    table: Box<[[u16; 3]; 256]>,
}

impl LcdDistribution {
    /// The conventional LCD filter weights `(1/3, 2/9, 1/9)`.
    pub const CONVENTIONAL: [f64; 3] = [1. / 3., 2. / 9., 1. / 9.];

    /// Weights tuned for text on typical RGB panels, and the default.
    pub const TUNED: [f64; 3] = [0.448, 0.184, 0.092];

    /// Builds the table from the primary, secondary and tertiary weights.
    ///
    /// The weights are normalized so that `prim + 2 * second + 2 * tert == 1`. If their weighted
    /// sum is not a positive finite number, or any weight is negative, the filter degrades to
    /// the identity kernel.
    pub fn new(prim: f64, second: f64, tert: f64) -> Self {
        let sum = prim + second * 2. + tert * 2.;
        let weights = if sum > 0. && sum.is_finite() && prim >= 0. && second >= 0. && tert >= 0. {
            let norm = 1. / sum;
            [prim * norm, second * norm, tert * norm]
        } else {
            log::warn!(
                "invalid LCD filter weights ({prim}, {second}, {tert}), falling back to identity"
            );
            [1., 0., 0.]
        };

        let mut table = Box::new([[0_u16; 3]; 256]);
        for (c, entry) in table.iter_mut().enumerate() {
            let b = (c as u32) << 8;
            let s = round_fixed(weights[SECONDARY] * f64::from(b));
            let t = round_fixed(weights[TERTIARY] * f64::from(b));
            // The primary entry takes whatever rounding left over, so the five taps of one sample
            // always add up to exactly `c << 8`.
            entry[PRIMARY] = to_u16(b.saturating_sub(2 * s + 2 * t));
            entry[SECONDARY] = to_u16(s);
            entry[TERTIARY] = to_u16(t);
        }

        Self { weights, table }
    }

    /// Builds the table from a `[primary, secondary, tertiary]` triple.
    pub fn from_weights(weights: [f64; 3]) -> Self {
        Self::new(weights[0], weights[1], weights[2])
    }

    /// The normalized `[primary, secondary, tertiary]` weights.
    pub fn normalized_weights(&self) -> [f64; 3] {
        self.weights
    }

    /// The fixed-point `[primary, secondary, tertiary]` contributions of coverage `c`.
    #[inline]
    pub fn weights(&self, c: u8) -> [u16; 3] {
        self.table[usize::from(c)]
    }

    /// Filters the sample at `i0` with its neighbours at offsets `-2..=2`.
    ///
    /// Only taps whose index lies in `[i_min, i_max]` contribute. The center itself may lie
    /// outside that range, which is how the bleed of a span into its surrounding padding is
    /// computed. The result is the fixed-point sum divided by 256 with rounding.
    #[inline]
    pub fn convolve(&self, covers: &[u8], i0: isize, i_min: isize, i_max: isize) -> u8 {
        let k_min = (i_min - i0).max(-2);
        let k_max = (i_max - i0).min(2);
        let mut sum = 0_u32;
        for k in k_min..=k_max {
            let channel = k.unsigned_abs() % 3;
            let c = covers[(i0 + k) as usize];
            sum += u32::from(self.table[usize::from(c)][channel]);
        }
        to_u8((sum + 128) >> 8)
    }

    /// Filters `src` into `dst`, where `dst[j]` is the output centered at `src` index
    /// `j - bleed`.
    ///
    /// With `bleed == 2` and `dst.len() == src.len() + 4` this captures everything a span emits,
    /// including its spill into two subpixels on each side.
    pub fn convolve_span(&self, src: &[u8], dst: &mut [u8], bleed: usize) {
        if src.is_empty() {
            dst.fill(0);
            return;
        }
        let i_max = src.len() as isize - 1;
        for (j, out) in dst.iter_mut().enumerate() {
            let i0 = j as isize - bleed as isize;
            *out = self.convolve(src, i0, 0, i_max);
        }
    }
}

impl Default for LcdDistribution {
    fn default() -> Self {
        Self::from_weights(Self::TUNED)
    }
}

impl fmt::Debug for LcdDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LcdDistribution")
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "inputs are non-negative and at most 255 * 256"
)]
#[inline]
fn round_fixed(v: f64) -> u32 {
    v.round() as u32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "table entries never exceed 255 * 256"
)]
#[inline]
fn to_u16(v: u32) -> u16 {
    v as u16
}

#[inline]
fn to_u8(v: u32) -> u8 {
    u8::try_from(v).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn table_rows_conserve_energy() {
        for weights in [
            LcdDistribution::TUNED,
            LcdDistribution::CONVENTIONAL,
            [1., 0., 0.],
            [0.2, 0.2, 0.2],
            [3., 2., 1.],
        ] {
            let lut = LcdDistribution::from_weights(weights);
            for c in 0..=255_u8 {
                let [p, s, t] = lut.weights(c);
                assert_eq!(
                    u32::from(p) + 2 * u32::from(s) + 2 * u32::from(t),
                    u32::from(c) << 8,
                    "coverage {c} with weights {weights:?}"
                );
            }
        }
    }

    #[test]
    fn isolated_sample_spreads_without_losing_energy() {
        let lut = LcdDistribution::default();
        for c in [1_u8, 17, 128, 200, 255] {
            let mut src = vec![0_u8; 9];
            src[4] = c;
            let sum: u32 = (0..9)
                .map(|i| u32::from(lut.convolve(&src, i, 0, 8)))
                .sum();
            // Each of the five outputs rounds independently.
            assert!(
                sum.abs_diff(u32::from(c)) <= 2,
                "coverage {c} spread into {sum}"
            );
        }
    }

    #[test]
    fn full_sample_bleeds_into_neighbours() {
        let lut = LcdDistribution::new(0.448, 0.184, 0.092);
        let mut src = vec![0_u8; 7];
        src[3] = 255;
        let out: Vec<u8> = (0..7).map(|i| lut.convolve(&src, i, 0, 6)).collect();

        assert_eq!(out[0], 0);
        assert_eq!(out[6], 0);
        for neighbour in [1, 2, 4, 5] {
            assert!(out[neighbour] > 0, "no bleed at {neighbour}: {out:?}");
            assert!(out[3] > out[neighbour], "center not brightest: {out:?}");
        }
        assert_eq!(out[2], out[4]);
        assert_eq!(out[1], out[5]);
        assert!(out[2] > out[1]);
    }

    #[test]
    fn taps_outside_bounds_are_ignored() {
        let lut = LcdDistribution::default();
        let src = [255_u8, 255, 255];
        // Three subpixels left of the span: no tap reaches it.
        assert_eq!(lut.convolve(&src, -3, 0, 2), 0);
        // Two left: only the tertiary tap touches index 0.
        let tertiary = lut.weights(255)[2];
        assert_eq!(
            u32::from(lut.convolve(&src, -2, 0, 2)),
            (u32::from(tertiary) + 128) >> 8
        );
        // The right edge mirrors the left edge.
        assert_eq!(lut.convolve(&src, 4, 0, 2), lut.convolve(&src, -2, 0, 2));
    }

    #[test]
    fn span_convolution_is_order_independent() {
        let lut = LcdDistribution::default();
        let src = [0_u8, 40, 255, 255, 90, 0, 12];
        let mut forward = [0_u8; 11];
        lut.convolve_span(&src, &mut forward, 2);
        let mut backward = [0_u8; 11];
        for j in (0..11).rev() {
            backward[j] = lut.convolve(&src, j as isize - 2, 0, 6);
        }
        assert_eq!(forward, backward);
    }

    #[test]
    fn invalid_weights_fall_back_to_identity() {
        let lut = LcdDistribution::new(0., 0., 0.);
        assert_eq!(lut.normalized_weights(), [1., 0., 0.]);
        let src = [10_u8, 20, 30];
        for i in 0..3 {
            assert_eq!(lut.convolve(&src, i, 0, 2), src[i as usize]);
        }
    }

    #[test]
    fn negative_primary_falls_back_to_identity() {
        let lut = LcdDistribution::new(-0.5, 0.5, 0.25);
        assert_eq!(lut.normalized_weights(), [1., 0., 0.]);
        for c in [1_u8, 200, 255] {
            let [p, s, t] = lut.weights(c);
            assert_eq!(
                u32::from(p) + 2 * u32::from(s) + 2 * u32::from(t),
                u32::from(c) << 8,
                "energy lost at {c}"
            );
        }
    }
}
