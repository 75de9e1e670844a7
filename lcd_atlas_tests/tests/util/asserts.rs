// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Various helper functions to assert truths during testing.

use lcd_atlas::{GlyphBitmapInfo, IntRect, RowView};

/// Assert that no two glyph boxes share a pixel.
pub(crate) fn assert_disjoint(glyphs: &[GlyphBitmapInfo]) {
    for (i, a) in glyphs.iter().enumerate() {
        for (j, b) in glyphs.iter().enumerate().skip(i + 1) {
            assert!(
                !a.rect().overlaps(&b.rect()),
                "glyph {i} {:?} overlaps glyph {j} {:?}",
                a.rect(),
                b.rect()
            );
        }
    }
}

/// Assert that every nonzero coverage byte lies inside some glyph box.
pub(crate) fn assert_coverage_inside(atlas: &RowView<'_>, glyphs: &[GlyphBitmapInfo], s: usize) {
    let boxes: Vec<IntRect> = glyphs
        .iter()
        .filter(|g| !g.is_empty())
        .map(GlyphBitmapInfo::rect)
        .collect();
    for y in 0..atlas.height() {
        for (x, &c) in atlas.row(y).iter().enumerate() {
            if c == 0 {
                continue;
            }
            let (px, py) = ((x / s) as i32, y as i32);
            let pixel = IntRect::new(px, py, px + 1, py + 1);
            assert!(
                boxes.iter().any(|b| b.overlaps(&pixel)),
                "coverage {c} at byte ({x}, {y}) is outside every glyph box"
            );
        }
    }
}

/// The range of pixel columns in a 4-byte-per-pixel surface whose color bytes differ from
/// `background`.
pub(crate) fn touched_columns(
    data: &[u8],
    width: usize,
    background: [u8; 4],
) -> Option<(usize, usize)> {
    let mut range: Option<(usize, usize)> = None;
    for (i, px) in data.chunks_exact(4).enumerate() {
        if px[..3] != background[..3] {
            let x = i % width;
            range = Some(range.map_or((x, x + 1), |(x0, x1)| (x0.min(x), x1.max(x + 1))));
        }
    }
    range
}
