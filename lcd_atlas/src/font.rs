// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The font engine seam.
//!
//! A [`FontEngine`] answers the handful of questions the renderer asks of a font: its vertical
//! metrics, which glyph a codepoint maps to, kerning between two glyphs and the outline of a glyph
//! at the current size. [`SkrifaFont`] is the shipped implementation.
//!
//! [`SkrifaFont`]: crate::backends::skrifa::SkrifaFont

use kurbo::{BezPath, Point, Rect, Vec2};

/// A glyph identifier within one font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u32);

/// Face-wide metrics in font units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceMetrics {
    /// Font units per em; 0 for a broken font.
    pub units_per_em: u16,
    /// Distance between consecutive baselines.
    pub face_height: i32,
    /// Distance from the baseline to the top of the face, positive upwards.
    pub ascender: i32,
    /// Distance from the baseline to the bottom of the face, usually negative.
    pub descender: i32,
}

/// The requested glyph size in pixels per em.
///
/// Horizontal and vertical sizes may differ when rendering at an exaggerated horizontal
/// resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphSize {
    /// Vertical pixels per em.
    pub height: f64,
    /// Horizontal pixels per em.
    pub width: f64,
}

impl GlyphSize {
    /// A size with equal horizontal and vertical scale.
    pub const fn uniform(size: f64) -> Self {
        Self {
            height: size,
            width: size,
        }
    }
}

/// Access to one font face.
pub trait FontEngine {
    /// Face-wide metrics in font units.
    fn face_metrics(&self) -> FaceMetrics;

    /// Sets the size used by [`kerning`](Self::kerning) and [`outline`](Self::outline).
    fn set_size(&mut self, size: GlyphSize);

    /// Maps a codepoint to a glyph, `None` when the font has no glyph for it.
    fn glyph_id(&self, codepoint: u32) -> Option<GlyphId>;

    /// Horizontal kerning between two glyphs in pixels at the current size.
    fn kerning(&self, left: GlyphId, right: GlyphId) -> f64;

    /// Writes the outline of `glyph` at the current size into `outline`, replacing its contents.
    ///
    /// Coordinates are pixels with y pointing up from the baseline. Returns the glyph's advance,
    /// or `None` when the glyph cannot be loaded.
    fn outline(&mut self, glyph: GlyphId, hinting: bool, outline: &mut GlyphOutline)
    -> Option<Vec2>;
}

/// A glyph outline and its control-point bounding box.
#[derive(Clone, Debug)]
pub struct GlyphOutline {
    /// The outline path.
    pub path: BezPath,
    /// The bounding box of all points, inverted (infinite) when the outline is empty.
    pub bbox: Rect,
}

const EMPTY_BBOX: Rect = Rect {
    x0: f64::INFINITY,
    y0: f64::INFINITY,
    x1: f64::NEG_INFINITY,
    y1: f64::NEG_INFINITY,
};

impl GlyphOutline {
    /// Creates an empty outline.
    pub fn new() -> Self {
        Self {
            path: BezPath::new(),
            bbox: EMPTY_BBOX,
        }
    }

    /// Removes all segments, keeping the allocation.
    pub fn clear(&mut self) {
        self.path.truncate(0);
        self.bbox = EMPTY_BBOX;
    }

    /// Whether no segments have been added.
    pub fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }

    /// Starts a new contour.
    pub fn move_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        self.path.move_to(p);
        self.bbox = self.bbox.union_pt(p);
    }

    /// Adds a line.
    pub fn line_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        self.path.line_to(p);
        self.bbox = self.bbox.union_pt(p);
    }

    /// Adds a quadratic curve.
    pub fn quad_to(&mut self, c: impl Into<Point>, p: impl Into<Point>) {
        let (c, p) = (c.into(), p.into());
        self.path.quad_to(c, p);
        self.bbox = self.bbox.union_pt(c).union_pt(p);
    }

    /// Adds a cubic curve.
    pub fn curve_to(&mut self, c0: impl Into<Point>, c1: impl Into<Point>, p: impl Into<Point>) {
        let (c0, c1, p) = (c0.into(), c1.into(), p.into());
        self.path.curve_to(c0, c1, p);
        self.bbox = self.bbox.union_pt(c0).union_pt(c1).union_pt(p);
    }

    /// Closes the current contour.
    pub fn close(&mut self) {
        self.path.close_path();
    }
}

impl Default for GlyphOutline {
    fn default() -> Self {
        Self::new()
    }
}
