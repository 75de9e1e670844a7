// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LCD Atlas bakes glyphs into a shared coverage atlas once and composites them onto color
//! surfaces many times, with LCD subpixel filtering and gamma-correct blending.
//!
//! The pipeline has four stages:
//!
//! - [`LcdDistribution`]: the 5-tap coverage-diffusion filter that spreads each subpixel's
//!   coverage over its neighbours, emulating an LCD filter kernel.
//! - [`Renderer::render_codepoint`]: rasterizes one codepoint through a [`FontEngine`] and an
//!   [`OutlineRasterizer`] into an 8-bit coverage surface, optionally at 3x horizontal resolution.
//! - [`bake_font_bitmap`]: lays out a codepoint range in rows, filters and trims every glyph and
//!   records a [`GlyphBitmapInfo`] for each.
//! - [`blend`]: gamma-correct compositing of coverage onto 4-byte-per-pixel surfaces.
//!
//! ## Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library
//!   (likely using your target's libc) and load fonts from files.
//! - `libm`: Use floating point implementations from [libm].
//! - `skrifa` (enabled by default): Provides [`SkrifaFont`], a [`FontEngine`] backed by Skrifa.
//! - `png`: Enables exporting a [`GlyphAtlas`] as a PNG (grayscale, or RGB for subpixel atlases).
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//!
//! [libm]: https://crates.io/crates/libm
//! [`SkrifaFont`]: crate::backends::skrifa::SkrifaFont

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// Suppress the unused_crate_dependencies lint when both std and libm are specified.
#[cfg(all(feature = "std", feature = "libm"))]
use core_maths as _;

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod math;

pub mod atlas;
pub mod backends;
pub mod blend;
pub mod font;
pub mod gamma;
pub mod lcd;
pub mod raster;
pub mod renderer;
pub mod view;

#[cfg(test)]
mod testing;

pub use atlas::{BakeError, GlyphAtlas, GlyphBitmapInfo, bake_font_bitmap};
pub use blend::{ChannelOrder, Color};
pub use font::{FaceMetrics, FontEngine, GlyphId, GlyphOutline, GlyphSize};
pub use gamma::GammaLut;
pub use lcd::LcdDistribution;
pub use raster::{OutlineRasterizer, ZenoRasterizer};
pub use renderer::{NoFontError, RenderOptions, RenderedGlyph, Renderer, VerticalMetrics};
pub use view::{IntRect, RowView, RowViewMut, ViewError};
