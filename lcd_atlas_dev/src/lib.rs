// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # LCD Atlas Dev
//!
//! This crate provides utilities for developing LCD Atlas: a synthetic font with predictable
//! geometry, text samples, and a bundled real font.

use std::path::{Path, PathBuf};

use kurbo::Vec2;
use lcd_atlas::{FaceMetrics, FontEngine, GlyphId, GlyphOutline, GlyphSize};

/// The directory that contains the bundled font files.
pub fn font_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

/// DejaVu Sans, a hinted TrueType face with a legacy `kern` table.
pub fn test_font_path() -> PathBuf {
    font_dir().join("dejavu/DejaVuSans.ttf")
}

/// A pangram covering the lowercase Latin alphabet.
pub const PANGRAM: &str = "The quick brown fox jumps over the lazy dog.";

/// Units per em of [`BlockFont`].
pub const UNITS_PER_EM: u16 = 1000;

/// A font whose glyphs are solid rectangles.
///
/// Every codepoint in `'!'..='~'` maps to a rectangle spanning x `0.1..0.5` em. Its top sits
/// at `0.3 + (codepoint % 5) * 0.1` em above the baseline, and the descending letters `g j p q y`
/// reach `0.2` em below it. All glyphs, including the outline-less space, advance by `0.6` em.
#[derive(Clone, Debug)]
pub struct BlockFont {
    metrics: FaceMetrics,
    kerning: Vec<(char, char, i32)>,
    size: GlyphSize,
}

impl BlockFont {
    /// Creates the font with an ascender of 0.8 em and a descender of -0.2 em.
    pub fn new() -> Self {
        Self {
            metrics: FaceMetrics {
                units_per_em: UNITS_PER_EM,
                face_height: 1000,
                ascender: 800,
                descender: -200,
            },
            kerning: Vec::new(),
            size: GlyphSize::uniform(0.),
        }
    }

    /// Adds a kerning pair in font units.
    #[must_use]
    pub fn with_kerning(mut self, left: char, right: char, units: i32) -> Self {
        self.kerning.push((left, right, units));
        self
    }

    /// Top of the glyph for `codepoint` in font units above the baseline.
    pub fn glyph_top(codepoint: u32) -> i32 {
        300 + (codepoint % 5) as i32 * 100
    }

    /// Bottom of the glyph for `codepoint` in font units above the baseline.
    pub fn glyph_bottom(codepoint: u32) -> i32 {
        match char::from_u32(codepoint) {
            Some('g' | 'j' | 'p' | 'q' | 'y') => -200,
            _ => 0,
        }
    }

    fn scale(&self) -> (f64, f64) {
        let upem = f64::from(UNITS_PER_EM);
        (self.size.width / upem, self.size.height / upem)
    }
}

impl Default for BlockFont {
    fn default() -> Self {
        Self::new()
    }
}

impl FontEngine for BlockFont {
    fn face_metrics(&self) -> FaceMetrics {
        self.metrics
    }

    fn set_size(&mut self, size: GlyphSize) {
        self.size = size;
    }

    fn glyph_id(&self, codepoint: u32) -> Option<GlyphId> {
        (0x20..=0x7E).contains(&codepoint).then_some(GlyphId(codepoint))
    }

    fn kerning(&self, left: GlyphId, right: GlyphId) -> f64 {
        let (Some(left), Some(right)) = (char::from_u32(left.0), char::from_u32(right.0)) else {
            return 0.;
        };
        self.kerning
            .iter()
            .find(|&&(l, r, _)| (l, r) == (left, right))
            .map_or(0., |&(_, _, units)| f64::from(units) * self.scale().0)
    }

    fn outline(
        &mut self,
        glyph: GlyphId,
        _hinting: bool,
        outline: &mut GlyphOutline,
    ) -> Option<Vec2> {
        outline.clear();
        let (sx, sy) = self.scale();
        if glyph.0 != 0x20 {
            let top = f64::from(Self::glyph_top(glyph.0)) * sy;
            let bottom = f64::from(Self::glyph_bottom(glyph.0)) * sy;
            outline.move_to((100. * sx, bottom));
            outline.line_to((500. * sx, bottom));
            outline.line_to((500. * sx, top));
            outline.line_to((100. * sx, top));
            outline.close();
        }
        Some(Vec2::new(600. * sx, 0.))
    }
}
