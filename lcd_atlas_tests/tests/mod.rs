// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `lcd_atlas`.
//!
//! - The `util` module contains shared utility functions that are needed by different
//!   test methods.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests, which makes shared helpers easy to reach.
//! - For test naming, put the "topic" of the test at the start of the name: `bake_*` for atlas
//!   layout, `blend_*` for compositing baked glyphs, `font_*` for the Skrifa backend and
//!   `text_*` for direct text drawing.
//! - Tests that need real outlines use the DejaVu Sans face bundled in `lcd_atlas_dev`.
//! - Set `LCD_ATLAS_DUMP` to write baked atlases to `current/` for inspection.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod blend;
#[macro_use]
mod util;
