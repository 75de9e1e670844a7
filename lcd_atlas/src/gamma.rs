// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gamma lookup tables.

use alloc::boxed::Box;
use alloc::vec;
use core::fmt;

#[cfg(not(feature = "std"))]
use core_maths::CoreFloat as _;

/// The gamma exponent used when none is configured.
pub const DEFAULT_GAMMA: f64 = 1.8;

const LINEAR_MAX: f64 = 65535.;

/// A pair of tables converting 8-bit encoded values to 16-bit linear values and back.
///
/// `dir(v) = round((v / 255) ^ gamma * 65535)` and `inv(l) = round((l / 65535) ^ (1 / gamma) *
/// 255)`.
#[derive(Clone)]
pub struct GammaLut {
    gamma: f64,
    dir: Box<[u16; 256]>,
    inv: Box<[u8]>,
}

impl GammaLut {
    /// Builds both tables for `gamma`.
    ///
    /// A gamma that is not a positive finite number is replaced with `1.0`.
    pub fn new(gamma: f64) -> Self {
        let gamma = if gamma > 0. && gamma.is_finite() {
            gamma
        } else {
            log::warn!("invalid gamma {gamma}, using 1.0");
            1.
        };

        let mut dir = Box::new([0_u16; 256]);
        for (i, d) in dir.iter_mut().enumerate() {
            *d = to_u16((i as f64 / 255.).powf(gamma) * LINEAR_MAX);
        }

        let inv_gamma = 1. / gamma;
        let mut inv = vec![0_u8; 65536].into_boxed_slice();
        for (j, v) in inv.iter_mut().enumerate() {
            *v = to_u8((j as f64 / LINEAR_MAX).powf(inv_gamma) * 255.);
        }

        Self { gamma, dir, inv }
    }

    /// The exponent the tables were built with.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Expands an encoded byte to linear 16-bit.
    #[inline]
    pub fn dir(&self, v: u8) -> u16 {
        self.dir[usize::from(v)]
    }

    /// Compresses a linear 16-bit value to an encoded byte.
    #[inline]
    pub fn inv(&self, v: u16) -> u8 {
        self.inv[usize::from(v)]
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new(DEFAULT_GAMMA)
    }
}

impl fmt::Debug for GammaLut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GammaLut")
            .field("gamma", &self.gamma)
            .finish_non_exhaustive()
    }
}

#[expect(clippy::cast_possible_truncation, reason = "clamped to the u16 range")]
#[inline]
fn to_u16(v: f64) -> u16 {
    v.round().clamp(0., LINEAR_MAX) as u16
}

#[expect(clippy::cast_possible_truncation, reason = "clamped to the u8 range")]
#[inline]
fn to_u8(v: f64) -> u8 {
    v.round().clamp(0., 255.) as u8
}
