// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Baking a codepoint range into a glyph atlas.
//!
//! Glyphs are laid out left to right in rows ("bands") of `pixel_height + 2 * pad_y` pixels,
//! starting at the top of the atlas. Every glyph is rendered, LCD filtered when the subpixel
//! scale is 3, and trimmed to its nonzero coverage. The resulting [`GlyphBitmapInfo`] records
//! where the bitmap lives and how to place it relative to a pen on the baseline.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;

use crate::blend::{self, ChannelOrder, Color};
use crate::font::FontEngine;
use crate::gamma::GammaLut;
use crate::lcd::LcdDistribution;
use crate::math::round_up_to_multiple;
use crate::raster::OutlineRasterizer;
use crate::renderer::Renderer;
use crate::view::{IntRect, RowView, RowViewMut, ViewError};

#[cfg(not(feature = "std"))]
use core_maths::CoreFloat as _;

/// Placement of one baked glyph.
///
/// The box is in whole atlas pixels, top-left inclusive and bottom-right exclusive. The
/// offsets lead from a pen on the baseline to the top-left of the box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphBitmapInfo {
    /// Left edge.
    pub x0: u16,
    /// Top edge.
    pub y0: u16,
    /// Right edge (exclusive).
    pub x1: u16,
    /// Bottom edge (exclusive).
    pub y1: u16,
    /// Horizontal offset from the pen to the left edge.
    pub xoff: f32,
    /// Vertical offset from the baseline to the top edge; negative above the baseline.
    pub yoff: f32,
    /// Pen advance in destination pixels.
    pub xadvance: f32,
}

impl GlyphBitmapInfo {
    /// Width in pixels.
    pub fn width(&self) -> u16 {
        self.x1.saturating_sub(self.x0)
    }

    /// Height in pixels.
    pub fn height(&self) -> u16 {
        self.y1.saturating_sub(self.y0)
    }

    /// Whether the glyph has no bitmap, as for a space.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// The box as a rectangle.
    pub fn rect(&self) -> IntRect {
        IntRect::new(
            i32::from(self.x0),
            i32::from(self.y0),
            i32::from(self.x1),
            i32::from(self.y1),
        )
    }
}

/// An error from [`bake_font_bitmap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BakeError {
    /// The renderer has no font.
    NoFont,
    /// The atlas ran out of rows. Records before `baked` were written.
    AtlasFull {
        /// The number of glyphs placed before running out of space.
        baked: usize,
    },
    /// The subpixel scale is neither 1 nor 3.
    InvalidSubpixelScale(u32),
    /// The atlas width in bytes is not a multiple of the subpixel scale.
    SurfaceWidth {
        /// Width of the atlas view in bytes.
        width: usize,
        /// The requested subpixel scale.
        subpixel_scale: u32,
    },
    /// The atlas is larger than glyph boxes can address.
    SurfaceTooLarge {
        /// Width in pixels.
        width: usize,
        /// Height in pixels.
        height: usize,
    },
    /// The atlas storage could not be viewed.
    View(ViewError),
}

impl fmt::Display for BakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFont => f.write_str("no font loaded"),
            Self::AtlasFull { baked } => {
                write!(f, "atlas full after {baked} glyphs")
            }
            Self::InvalidSubpixelScale(s) => write!(f, "invalid subpixel scale {s}"),
            Self::SurfaceWidth {
                width,
                subpixel_scale,
            } => write!(
                f,
                "atlas width {width} is not a multiple of the subpixel scale {subpixel_scale}"
            ),
            Self::SurfaceTooLarge { width, height } => {
                write!(f, "atlas of {width}x{height} pixels exceeds 65535 in a dimension")
            }
            Self::View(err) => write!(f, "invalid atlas storage: {err}"),
        }
    }
}

impl core::error::Error for BakeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::View(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ViewError> for BakeError {
    fn from(err: ViewError) -> Self {
        Self::View(err)
    }
}

/// Bakes `glyphs.len()` codepoints starting at `first_codepoint` into `atlas`.
///
/// `atlas` is a coverage surface `subpixel_scale` bytes per pixel wide. It is cleared first.
/// On success every entry of `glyphs` describes its codepoint; codepoints without a glyph get
/// an empty box and zero advance. On [`BakeError::AtlasFull`] the entries before `baked` are
/// structurally valid but the bake should be retried with a larger atlas.
///
/// The kerning state of the renderer is reset before each glyph, and its pixel height is left
/// at `pixel_height`.
pub fn bake_font_bitmap<F: FontEngine, R: OutlineRasterizer>(
    renderer: &mut Renderer<F, R>,
    pixel_height: u32,
    atlas: &mut RowViewMut<'_>,
    first_codepoint: u32,
    glyphs: &mut [GlyphBitmapInfo],
    subpixel_scale: u32,
) -> Result<(), BakeError> {
    let s: i32 = match subpixel_scale {
        1 => 1,
        3 => 3,
        _ => return Err(BakeError::InvalidSubpixelScale(subpixel_scale)),
    };
    if atlas.width() % s as usize != 0 {
        return Err(BakeError::SurfaceWidth {
            width: atlas.width(),
            subpixel_scale,
        });
    }
    let too_large = BakeError::SurfaceTooLarge {
        width: atlas.width() / s as usize,
        height: atlas.height(),
    };
    let (Ok(atlas_width), Ok(atlas_height)) = (
        u16::try_from(atlas.width() / s as usize),
        u16::try_from(atlas.height()),
    ) else {
        return Err(too_large);
    };
    let (atlas_width, atlas_height) = (i32::from(atlas_width), i32::from(atlas_height));
    let metrics = renderer
        .vertical_metrics()
        .map_err(|_| BakeError::NoFont)?;
    let ph = i32::from(u16::try_from(pixel_height).unwrap_or(u16::MAX));

    atlas.fill(0);

    let ascender_px = round_px(metrics.ascender * f64::from(ph));
    let descender_px = round_px(metrics.descender * f64::from(ph));
    let pad_y = ph / 10;
    let y_step = ph + 2 * pad_y;
    log::debug!(
        "baking {} glyphs from U+{first_codepoint:04X} at {ph}px into {atlas_width}x{atlas_height} \
         (subpixel scale {s}, ascender {ascender_px}, descender {descender_px})",
        glyphs.len()
    );

    renderer.set_pixel_height(f64::from(ph));
    let lcd = renderer.lcd_distribution().clone();
    let mut scratch = Vec::new();

    // The first column stays empty so the filter's left bleed has somewhere to go.
    let x_start = s;
    let (mut x, mut y) = (x_start, atlas_height - 1);
    for (i, info) in glyphs.iter_mut().enumerate() {
        let codepoint = first_codepoint.wrapping_add(u32::try_from(i).unwrap_or(u32::MAX));
        if x + ph * s > atlas_width * s {
            x = x_start;
            y -= y_step;
        }
        if y - y_step < 0 {
            log::warn!(
                "atlas {atlas_width}x{atlas_height} full after {i} of {} glyphs",
                glyphs.len()
            );
            return Err(BakeError::AtlasFull { baked: i });
        }

        // `y` counts rows upwards from the bottom; surfaces count rows down from the top.
        let band_top = atlas_height - 1 - y;
        let baseline = band_top + pad_y + ascender_px;
        // The last pixel column is kept free for the filter's right bleed.
        let clip = IntRect::new(x, band_top, atlas_width * s - s, band_top + y_step);

        renderer.reset_kerning();
        let rendered = renderer.render_codepoint_clipped(
            atlas,
            clip,
            0xFF,
            Point::new(f64::from(x), f64::from(baseline)),
            codepoint,
            subpixel_scale,
        );

        let raw_x1 = rendered
            .ink
            .map_or(x, |ink| round_up_to_multiple(ink.x1, s));
        let mut bbox = BakedBox {
            x0: x / s,
            y0: band_top,
            x1: raw_x1 / s,
            y1: band_top + y_step,
            xoff: 0,
            yoff: -(pad_y + ascender_px),
        };
        if bbox.x1 > bbox.x0 && s == 3 {
            filter_box(atlas, &lcd, &mut scratch, &mut bbox);
        }
        trim_box(atlas, &mut bbox, s);

        *info = bbox.info(advance_px(rendered.pen.x - f64::from(x), s));
        log::trace!(
            "U+{codepoint:04X}: box ({}, {})..({}, {}), offset ({}, {}), advance {}",
            info.x0,
            info.y0,
            info.x1,
            info.y1,
            info.xoff,
            info.yoff,
            info.xadvance
        );

        x = raw_x1 + 2 * s;
    }

    log::debug!("baked {} glyphs", glyphs.len());
    Ok(())
}

/// A glyph box in pixels while it is being filtered and trimmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BakedBox {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    xoff: i32,
    yoff: i32,
}

impl BakedBox {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "advances are converted to the f32 record format"
    )]
    fn info(&self, xadvance: f64) -> GlyphBitmapInfo {
        GlyphBitmapInfo {
            x0: to_u16(self.x0),
            y0: to_u16(self.y0),
            x1: to_u16(self.x1),
            y1: to_u16(self.y1),
            xoff: self.xoff as f32,
            yoff: self.yoff as f32,
            xadvance: xadvance as f32,
        }
    }
}

/// Runs the LCD filter over every row of the box, widening it by one pixel on each side.
///
/// The caller guarantees a free pixel column on either side of the box.
fn filter_box(
    atlas: &mut RowViewMut<'_>,
    lcd: &LcdDistribution,
    scratch: &mut Vec<u8>,
    bbox: &mut BakedBox,
) {
    const S: usize = 3;
    let x0 = bbox.x0 as usize;
    let x1 = bbox.x1 as usize;
    for y in bbox.y0..bbox.y1 {
        let row = atlas.row_mut(y as usize);
        scratch.clear();
        scratch.extend_from_slice(&row[x0 * S..x1 * S]);
        if scratch.iter().all(|&c| c == 0) {
            continue;
        }
        lcd.convolve_span(scratch, &mut row[(x0 - 1) * S..(x1 + 1) * S], S);
    }
    bbox.x0 -= 1;
    bbox.x1 += 1;
    bbox.xoff -= 1;
}

/// Shrinks the box to its nonzero coverage: rows first, then whole pixel columns.
///
/// A box without coverage collapses to zero area at its top-left corner.
fn trim_box(atlas: &RowViewMut<'_>, bbox: &mut BakedBox, s: i32) {
    let sx0 = (bbox.x0 * s) as usize;
    let sx1 = (bbox.x1 * s) as usize;
    let row_inked = |y: i32| atlas.row(y as usize)[sx0..sx1].iter().any(|&c| c != 0);

    let mut y0 = bbox.y0;
    while y0 < bbox.y1 && !row_inked(y0) {
        y0 += 1;
    }
    if y0 == bbox.y1 {
        bbox.x1 = bbox.x0;
        bbox.y1 = bbox.y0;
        return;
    }
    let mut y1 = bbox.y1;
    while y1 > y0 && !row_inked(y1 - 1) {
        y1 -= 1;
    }

    let column_inked = |px: i32| {
        let cols = (px * s) as usize..((px + 1) * s) as usize;
        (y0..y1).any(|y| atlas.row(y as usize)[cols.clone()].iter().any(|&c| c != 0))
    };
    let mut x0 = bbox.x0;
    while x0 < bbox.x1 && !column_inked(x0) {
        x0 += 1;
    }
    let mut x1 = bbox.x1;
    while x1 > x0 && !column_inked(x1 - 1) {
        x1 -= 1;
    }

    bbox.xoff += x0 - bbox.x0;
    bbox.yoff += y0 - bbox.y0;
    *bbox = BakedBox {
        x0,
        y0,
        x1,
        y1,
        ..*bbox
    };
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "pixel metrics are small"
)]
fn round_px(v: f64) -> i32 {
    v.round() as i32
}

fn advance_px(subpixels: f64, s: i32) -> f64 {
    (subpixels / f64::from(s)).max(0.)
}

fn to_u16(v: i32) -> u16 {
    u16::try_from(v.max(0)).unwrap_or(u16::MAX)
}

// ---------------------------------------------------------------------------
// GlyphAtlas: owned storage with grow-and-rebake
// ---------------------------------------------------------------------------

/// An owned atlas and its glyph records.
///
/// [`GlyphAtlas::bake`] retries with a larger atlas whenever it runs out of room, starting at
/// [`GlyphAtlas::INITIAL_SIZE`] and doubling up to [`GlyphAtlas::MAX_SIZE`] pixels square.
#[derive(Clone)]
pub struct GlyphAtlas {
    data: Vec<u8>,
    width: usize,
    height: usize,
    subpixel_scale: u32,
    pixel_height: u32,
    first_codepoint: u32,
    glyphs: Vec<GlyphBitmapInfo>,
}

impl GlyphAtlas {
    /// Side length of the first attempt.
    pub const INITIAL_SIZE: usize = 128;
    /// Largest side length tried.
    pub const MAX_SIZE: usize = 8192;

    /// Bakes `count` codepoints from `first_codepoint` at the renderer's subpixel scale.
    pub fn bake<F: FontEngine, R: OutlineRasterizer>(
        renderer: &mut Renderer<F, R>,
        pixel_height: u32,
        first_codepoint: u32,
        count: usize,
    ) -> Result<Self, BakeError> {
        let subpixel_scale = renderer.subpixel_scale();
        let s = subpixel_scale as usize;
        let mut glyphs = vec![GlyphBitmapInfo::default(); count];
        let mut size = Self::INITIAL_SIZE;
        loop {
            let mut data = vec![0_u8; size * s * size];
            let mut view = RowViewMut::packed(&mut data, size * s, size)?;
            match bake_font_bitmap(
                renderer,
                pixel_height,
                &mut view,
                first_codepoint,
                &mut glyphs,
                subpixel_scale,
            ) {
                Ok(()) => {
                    return Ok(Self {
                        data,
                        width: size,
                        height: size,
                        subpixel_scale,
                        pixel_height,
                        first_codepoint,
                        glyphs,
                    });
                }
                Err(BakeError::AtlasFull { baked }) if size < Self::MAX_SIZE => {
                    log::debug!(
                        "atlas {size}x{size} held {baked} of {count} glyphs, growing to {}",
                        size * 2
                    );
                    size *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Coverage bytes per pixel.
    pub fn subpixel_scale(&self) -> u32 {
        self.subpixel_scale
    }

    /// The pixel height the glyphs were baked at.
    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    /// The first baked codepoint.
    pub fn first_codepoint(&self) -> u32 {
        self.first_codepoint
    }

    /// All glyph records, indexed by `codepoint - first_codepoint`.
    pub fn glyphs(&self) -> &[GlyphBitmapInfo] {
        &self.glyphs
    }

    /// The record for `codepoint`, if it was baked.
    pub fn glyph(&self, codepoint: u32) -> Option<&GlyphBitmapInfo> {
        let index = codepoint.checked_sub(self.first_codepoint)?;
        self.glyphs.get(usize::try_from(index).ok()?)
    }

    /// The coverage data.
    pub fn view(&self) -> RowView<'_> {
        RowView::whole_rows(&self.data, self.width * self.subpixel_scale as usize)
    }

    /// Blends the glyph for `codepoint` onto `dst` and returns its advance in pixels.
    ///
    /// See [`blend_glyph`](crate::blend::blend_glyph) for the meaning of the pen position.
    /// Returns `None` without drawing if the codepoint was not baked.
    pub fn draw_glyph(
        &self,
        gamma: &GammaLut,
        dst: &mut RowViewMut<'_>,
        clip: IntRect,
        pen_x: i32,
        pen_y: i32,
        codepoint: u32,
        color: Color,
        order: ChannelOrder,
    ) -> Option<f32> {
        let glyph = self.glyph(codepoint)?;
        blend::blend_glyph(
            gamma,
            dst,
            clip,
            pen_x,
            pen_y,
            &self.view(),
            glyph,
            color,
            self.subpixel_scale,
            order,
        );
        Some(glyph.xadvance)
    }

    /// Writes the atlas as an 8-bit PNG: grayscale, or RGB with one subpixel per channel.
    #[cfg(feature = "png")]
    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::BufWriter;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let (Ok(width), Ok(height)) = (u32::try_from(self.width), u32::try_from(self.height))
        else {
            return Err(std::io::Error::other("atlas too large for PNG"));
        };

        let w = BufWriter::new(File::create(path)?);
        let mut encoder = png::Encoder::new(w, width, height);
        encoder.set_color(if self.subpixel_scale == 3 {
            png::ColorType::Rgb
        } else {
            png::ColorType::Grayscale
        });
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(std::io::Error::other)?;
        writer
            .write_image_data(&self.data)
            .map_err(std::io::Error::other)?;
        log::debug!("saved {}x{} atlas to {}", self.width, self.height, path.display());
        Ok(())
    }
}

impl fmt::Debug for GlyphAtlas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphAtlas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("subpixel_scale", &self.subpixel_scale)
            .field("pixel_height", &self.pixel_height)
            .field("first_codepoint", &self.first_codepoint)
            .field("glyphs", &self.glyphs.len())
            .finish_non_exhaustive()
    }
}
