// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gamma-correct compositing of coverage onto 4-byte-per-pixel surfaces.
//!
//! Every compositor expands the destination channel and the color channel to linear 16-bit
//! through [`GammaLut::dir`], interpolates with `alpha = (coverage + 1) * (color.a + 1)`, and
//! compresses the result with [`GammaLut::inv`]. A coverage byte of zero leaves its channel
//! untouched, and the destination's alpha byte is never written.
//!
//! Skipping zero coverage departs from the formula taken literally, which would still blend
//! with `alpha = 256` and tint every uncovered channel (about 12 of 255 for white on black at
//! gamma 1.8).
//!
//! Destination views are addressed in bytes, so a surface `w` pixels wide is a view `4 * w`
//! bytes wide. The processed area is the intersection of the destination and the source.

use crate::atlas::GlyphBitmapInfo;
use crate::gamma::GammaLut;
use crate::lcd::LcdDistribution;
use crate::view::{IntRect, RowView, RowViewMut};

#[cfg(not(feature = "std"))]
use core_maths::CoreFloat as _;

const PIXEL_SIZE: usize = 4;

/// An 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha, scaling the coverage.
    pub a: u8,
}

impl Color {
    /// Creates a color from its components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }
}

/// Where the color bytes live inside a destination pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// Blue, green, red, alpha.
    #[default]
    Bgra,
    /// Red, green, blue, alpha.
    Rgba,
}

impl ChannelOrder {
    /// Byte offsets of the red, green and blue channels.
    #[inline]
    pub const fn rgb_offsets(self) -> [usize; 3] {
        match self {
            Self::Bgra => [2, 1, 0],
            Self::Rgba => [0, 1, 2],
        }
    }
}

/// A color expanded to linear space once per call.
#[derive(Clone, Copy)]
struct LinearSource {
    rgb: [i64; 3],
    alpha: i64,
    offsets: [usize; 3],
}

impl LinearSource {
    fn new(gamma: &GammaLut, color: Color, order: ChannelOrder) -> Self {
        Self {
            rgb: [
                i64::from(gamma.dir(color.r)),
                i64::from(gamma.dir(color.g)),
                i64::from(gamma.dir(color.b)),
            ],
            alpha: i64::from(color.a) + 1,
            offsets: order.rgb_offsets(),
        }
    }

    /// Blends one pixel with a coverage per color channel.
    #[inline]
    fn blend(&self, gamma: &GammaLut, pixel: &mut [u8; 4], covers: [u8; 3]) {
        for ((&cover, &src), &offset) in covers.iter().zip(&self.rgb).zip(&self.offsets) {
            if cover == 0 {
                continue;
            }
            let alpha = (i64::from(cover) + 1) * self.alpha;
            let dst = i64::from(gamma.dir(pixel[offset]));
            let lin = dst + (((src - dst) * alpha) >> 16);
            pixel[offset] = gamma.inv(u16::try_from(lin.clamp(0, 0xFFFF)).unwrap_or(u16::MAX));
        }
    }
}

#[inline]
fn pixels(row: &mut [u8], width: usize) -> &mut [[u8; 4]] {
    bytemuck::cast_slice_mut(&mut row[..width * PIXEL_SIZE])
}

/// Blends one coverage byte per pixel onto `dst`, applying it to all three color channels.
pub fn blend_gamma(
    gamma: &GammaLut,
    dst: &mut RowViewMut<'_>,
    src: &RowView<'_>,
    color: Color,
    order: ChannelOrder,
) {
    let source = LinearSource::new(gamma, color, order);
    let width = (dst.width() / PIXEL_SIZE).min(src.width());
    let height = dst.height().min(src.height());
    for y in 0..height {
        let covers = src.row(y);
        for (pixel, &c) in pixels(dst.row_mut(y), width).iter_mut().zip(covers) {
            source.blend(gamma, pixel, [c; 3]);
        }
    }
}

/// Blends three coverage bytes per pixel (one per R, G, B phase) onto `dst`.
pub fn blend_gamma_subpixel(
    gamma: &GammaLut,
    dst: &mut RowViewMut<'_>,
    src: &RowView<'_>,
    color: Color,
    order: ChannelOrder,
) {
    let source = LinearSource::new(gamma, color, order);
    let width = (dst.width() / PIXEL_SIZE).min(src.width() / 3);
    let height = dst.height().min(src.height());
    for y in 0..height {
        let covers = src.row(y);
        for (pixel, c) in pixels(dst.row_mut(y), width)
            .iter_mut()
            .zip(covers.chunks_exact(3))
        {
            source.blend(gamma, pixel, [c[0], c[1], c[2]]);
        }
    }
}

/// Blends raw 3x horizontal coverage onto `dst`, applying the LCD filter while blending.
///
/// Each row's inked span is widened by two subpixels on either side so the filter's bleed
/// reaches the destination.
pub fn blend_lcd_filtered(
    gamma: &GammaLut,
    lcd: &LcdDistribution,
    dst: &mut RowViewMut<'_>,
    src: &RowView<'_>,
    color: Color,
    order: ChannelOrder,
) {
    let source = LinearSource::new(gamma, color, order);
    let width = (dst.width() / PIXEL_SIZE).min(src.width() / 3);
    let height = dst.height().min(src.height());
    if width == 0 {
        return;
    }
    for y in 0..height {
        let covers = &src.row(y)[..width * 3];
        let (Some(first), Some(last)) = (
            covers.iter().position(|&c| c != 0),
            covers.iter().rposition(|&c| c != 0),
        ) else {
            continue;
        };
        let i_max = covers.len() as isize - 1;
        let px0 = first.saturating_sub(2) / 3;
        let px1 = ((last + 2) / 3).min(width - 1);

        let row = pixels(dst.row_mut(y), width);
        for (px, pixel) in row.iter_mut().enumerate().take(px1 + 1).skip(px0) {
            let cx = (px * 3) as isize;
            let filtered = [
                lcd.convolve(covers, cx, 0, i_max),
                lcd.convolve(covers, cx + 1, 0, i_max),
                lcd.convolve(covers, cx + 2, 0, i_max),
            ];
            source.blend(gamma, pixel, filtered);
        }
    }
}

/// Blends a baked glyph from `atlas` onto `dst`.
///
/// `pen_x` is the pen position in subpixel units and `pen_y` the baseline row. The glyph's
/// top-left lands at pixel `(pen_x / s + xoff, pen_y + yoff)`; the remainder `pen_x mod s`
/// shifts the source right by that many subpixels, so reads that fall outside the glyph's box
/// are zero. Nothing outside `clip` or the destination is written.
#[expect(
    clippy::cast_possible_truncation,
    reason = "glyph offsets are small integral values"
)]
pub fn blend_glyph(
    gamma: &GammaLut,
    dst: &mut RowViewMut<'_>,
    clip: IntRect,
    pen_x: i32,
    pen_y: i32,
    atlas: &RowView<'_>,
    glyph: &GlyphBitmapInfo,
    color: Color,
    subpixel_scale: u32,
    order: ChannelOrder,
) {
    let s = match subpixel_scale {
        1 => 1,
        3 => 3,
        _ => {
            log::warn!("unsupported subpixel scale {subpixel_scale}, glyph skipped");
            return;
        }
    };
    let phase = pen_x.rem_euclid(s);
    let x = pen_x.div_euclid(s) + glyph.xoff.round() as i32;
    let y = pen_y + glyph.yoff.round() as i32;
    let (gx0, gy0) = (i32::from(glyph.x0), i32::from(glyph.y0));
    let (gx1, gy1) = (i32::from(glyph.x1), i32::from(glyph.y1));
    if gx1 <= gx0 || gy1 <= gy0 {
        return;
    }

    let extra = i32::from(phase > 0);
    let placed = IntRect::new(x, y, x + gx1 - gx0 + extra, y + gy1 - gy0);
    let dst_bounds = IntRect::from_size(dst.width() / PIXEL_SIZE, dst.height());
    let area = placed.intersect(&clip).intersect(&dst_bounds);
    if area.is_empty() {
        return;
    }

    // Subpixel range of the glyph inside an atlas row, clamped to the view.
    let src_lo = (gx0 * s).max(0) as usize;
    let src_hi = ((gx1 * s) as usize).min(atlas.width());
    let read = |row: &[u8], sub: i32| -> u8 {
        usize::try_from(sub)
            .ok()
            .filter(|&i| i >= src_lo && i < src_hi)
            .map_or(0, |i| row[i])
    };

    let source = LinearSource::new(gamma, color, order);
    let width = area.x1 as usize;
    for dy in area.y0..area.y1 {
        let src_y = gy0 + dy - y;
        if src_y < 0 || src_y as usize >= atlas.height() {
            continue;
        }
        let src_row = atlas.row(src_y as usize);
        let row = pixels(dst.row_mut(dy as usize), width);
        for dx in area.x0..area.x1 {
            let base = (gx0 + dx - x) * s - phase;
            let covers = if s == 1 {
                [read(src_row, base); 3]
            } else {
                [
                    read(src_row, base),
                    read(src_row, base + 1),
                    read(src_row, base + 2),
                ]
            };
            source.blend(gamma, &mut row[dx as usize], covers);
        }
    }
}
