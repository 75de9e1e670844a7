// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A synthetic font for unit tests.

use kurbo::Vec2;

use crate::font::{FaceMetrics, FontEngine, GlyphId, GlyphOutline, GlyphSize};

/// Monospaced boxes: every printable ASCII glyph is a rectangle spanning x 100..500 and
/// y 0..700 font units with an advance of 600. Space has an advance but no outline. `A` kerns
/// against `V` by -100 units.
#[derive(Clone, Debug)]
pub(crate) struct TestFont {
    pub(crate) metrics: FaceMetrics,
    size: GlyphSize,
}

impl TestFont {
    pub(crate) fn new() -> Self {
        Self {
            metrics: FaceMetrics {
                units_per_em: 1000,
                face_height: 1000,
                ascender: 800,
                descender: -200,
            },
            size: GlyphSize::uniform(0.),
        }
    }

    fn scale(&self) -> (f64, f64) {
        let upem = f64::from(self.metrics.units_per_em.max(1));
        (self.size.width / upem, self.size.height / upem)
    }
}

impl FontEngine for TestFont {
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
        if (left.0, right.0) == (u32::from('A'), u32::from('V')) {
            -100. * self.scale().0
        } else {
            0.
        }
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
            outline.move_to((100. * sx, 0.));
            outline.line_to((500. * sx, 0.));
            outline.line_to((500. * sx, 700. * sy));
            outline.line_to((100. * sx, 700. * sy));
            outline.close();
        }
        Some(Vec2::new(600. * sx, 0.))
    }
}
