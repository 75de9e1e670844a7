// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering codepoints into coverage surfaces.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Point};

use crate::blend::{self, ChannelOrder, Color};
use crate::font::{FontEngine, GlyphId, GlyphOutline, GlyphSize};
use crate::gamma::{DEFAULT_GAMMA, GammaLut};
use crate::lcd::LcdDistribution;
use crate::math::FloatExt as _;
use crate::raster::{OutlineRasterizer, ZenoRasterizer};
use crate::view::{IntRect, RowViewMut};

#[cfg(all(feature = "skrifa", feature = "std"))]
use crate::backends::skrifa::{LoadFontError, SkrifaFont};

#[cfg(not(feature = "std"))]
use core_maths::CoreFloat as _;

/// Horizontal oversampling used when [`RenderOptions::prescale_x`] is set.
const PRESCALE_X: f64 = 100.;

/// Distance between baselines in [`Renderer::draw_text`], relative to the text size.
const LINE_SPACING: f64 = 1.25;

/// Run-time rendering configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Snap baselines to whole pixel rows and hint outlines vertically.
    pub hinting: bool,
    /// Apply kerning between consecutive glyphs.
    pub kerning: bool,
    /// Render at 3x horizontal resolution for LCD subpixel output.
    pub subpixel: bool,
    /// Size the font engine 100x wider and scale outlines back down, which keeps horizontal
    /// positions precise in engines that round advances.
    pub prescale_x: bool,
    /// Exponent of the gamma tables used for blending.
    pub gamma: f64,
    /// Primary, secondary and tertiary weights of the LCD filter.
    pub lcd_weights: [f64; 3],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hinting: true,
            kerning: false,
            subpixel: true,
            prescale_x: false,
            gamma: DEFAULT_GAMMA,
            lcd_weights: LcdDistribution::TUNED,
        }
    }
}

/// Returned by metric queries when no font is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoFontError;

impl fmt::Display for NoFontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no font loaded")
    }
}

impl core::error::Error for NoFontError {}

/// Ascender and descender as fractions of the face height.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VerticalMetrics {
    /// Positive distance from the baseline to the top of the face.
    pub ascender: f64,
    /// Distance from the baseline to the bottom of the face, usually negative.
    pub descender: f64,
}

/// The outcome of rendering one codepoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderedGlyph {
    /// The pen position after the glyph, in surface units.
    pub pen: Point,
    /// Bounds of the nonzero coverage written, `None` if nothing was inked.
    pub ink: Option<IntRect>,
}

/// Owns a font, an outline rasterizer and the blending tables for one rendering configuration.
///
/// Coverage surfaces are addressed in subpixels: with a subpixel scale of 3 a surface that is
/// `w` pixels wide is a view `3 * w` bytes wide, and pen x positions are in the same units.
/// Rows grow downwards.
pub struct Renderer<F, R = ZenoRasterizer> {
    options: RenderOptions,
    font: Option<F>,
    rasterizer: R,
    gamma: GammaLut,
    lcd: LcdDistribution,
    pixel_height: f64,
    prev_glyph: Option<GlyphId>,
    outline: GlyphOutline,
    text_plane: Vec<u8>,
}

impl<F: FontEngine> Renderer<F> {
    /// Creates a renderer without a font, backed by [`ZenoRasterizer`].
    pub fn new(options: RenderOptions) -> Self {
        Self::with_rasterizer(options, ZenoRasterizer::new())
    }
}

impl<F: FontEngine, R: OutlineRasterizer> Renderer<F, R> {
    /// Creates a renderer without a font, backed by `rasterizer`.
    pub fn with_rasterizer(options: RenderOptions, rasterizer: R) -> Self {
        Self {
            gamma: GammaLut::new(options.gamma),
            lcd: LcdDistribution::from_weights(options.lcd_weights),
            options,
            font: None,
            rasterizer,
            pixel_height: 0.,
            prev_glyph: None,
            outline: GlyphOutline::new(),
            text_plane: Vec::new(),
        }
    }

    /// Installs a font, returning the previous one.
    pub fn set_font(&mut self, font: F) -> Option<F> {
        self.prev_glyph = None;
        self.font.replace(font)
    }

    /// The loaded font, if any.
    pub fn font(&self) -> Option<&F> {
        self.font.as_ref()
    }

    /// The options the renderer was created with.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The gamma tables.
    pub fn gamma(&self) -> &GammaLut {
        &self.gamma
    }

    /// The LCD filter.
    pub fn lcd_distribution(&self) -> &LcdDistribution {
        &self.lcd
    }

    /// Coverage bytes per destination pixel: 3 in subpixel mode, otherwise 1.
    pub fn subpixel_scale(&self) -> u32 {
        if self.options.subpixel { 3 } else { 1 }
    }

    /// Sets the pixel height used by [`render_codepoint`](Self::render_codepoint).
    pub fn set_pixel_height(&mut self, pixel_height: f64) {
        self.pixel_height = pixel_height;
    }

    /// The pixel height used by [`render_codepoint`](Self::render_codepoint).
    pub fn pixel_height(&self) -> f64 {
        self.pixel_height
    }

    /// Forgets the previous glyph so the next one is not kerned against it.
    pub fn reset_kerning(&mut self) {
        self.prev_glyph = None;
    }

    /// Ascender and descender divided by the face height, zero if the face height is zero.
    pub fn vertical_metrics(&self) -> Result<VerticalMetrics, NoFontError> {
        let metrics = self.font.as_ref().ok_or(NoFontError)?.face_metrics();
        if metrics.face_height <= 0 {
            return Ok(VerticalMetrics::default());
        }
        let face_height = f64::from(metrics.face_height);
        Ok(VerticalMetrics {
            ascender: f64::from(metrics.ascender) / face_height,
            descender: f64::from(metrics.descender) / face_height,
        })
    }

    /// Pixels per font unit at `size` pixels per em, or `0.0` if the font has no units per em.
    pub fn scale_for_em_to_pixels(&self, size: f32) -> Result<f32, NoFontError> {
        let metrics = self.font.as_ref().ok_or(NoFontError)?.face_metrics();
        if metrics.units_per_em == 0 {
            return Ok(0.);
        }
        Ok(size / f32::from(metrics.units_per_em))
    }

    /// The line height in pixels of the font at `size` pixels per em.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "line heights are far below i32::MAX"
    )]
    pub fn font_height(&self, size: f32) -> Result<i32, NoFontError> {
        let metrics = self.vertical_metrics()?;
        let face_height = self.font.as_ref().ok_or(NoFontError)?.face_metrics().face_height;
        let scale = f64::from(self.scale_for_em_to_pixels(size)?);
        Ok(((metrics.ascender - metrics.descender) * f64::from(face_height) * scale).round() as i32)
    }

    /// Renders `codepoint` with its baseline origin at `pen`, clipped to the surface.
    ///
    /// Codepoints without a glyph, or any codepoint when no font is loaded, leave the surface
    /// untouched and return `pen` unchanged.
    pub fn render_codepoint(
        &mut self,
        surface: &mut RowViewMut<'_>,
        coverage: u8,
        pen: Point,
        codepoint: u32,
        subpixel_scale: u32,
    ) -> RenderedGlyph {
        let clip = surface.bounds();
        self.render_codepoint_clipped(surface, clip, coverage, pen, codepoint, subpixel_scale)
    }

    /// Like [`render_codepoint`](Self::render_codepoint), writing only inside `clip`.
    pub fn render_codepoint_clipped(
        &mut self,
        surface: &mut RowViewMut<'_>,
        clip: IntRect,
        coverage: u8,
        pen: Point,
        codepoint: u32,
        subpixel_scale: u32,
    ) -> RenderedGlyph {
        self.render_glyph(
            surface,
            clip,
            coverage,
            pen,
            self.pixel_height,
            codepoint,
            subpixel_scale,
        )
    }

    fn render_glyph(
        &mut self,
        surface: &mut RowViewMut<'_>,
        clip: IntRect,
        coverage: u8,
        pen: Point,
        size: f64,
        codepoint: u32,
        subpixel_scale: u32,
    ) -> RenderedGlyph {
        let unchanged = RenderedGlyph { pen, ink: None };
        let Some(font) = self.font.as_mut() else {
            return unchanged;
        };
        let Some(glyph) = font.glyph_id(codepoint) else {
            return unchanged;
        };

        let prescale = if self.options.prescale_x {
            PRESCALE_X
        } else {
            1.
        };
        font.set_size(GlyphSize {
            height: size,
            width: size * prescale,
        });
        let kern = match self.prev_glyph {
            Some(prev) if self.options.kerning => font.kerning(prev, glyph),
            _ => 0.,
        };
        self.prev_glyph = Some(glyph);
        let Some(advance) = font.outline(glyph, self.options.hinting, &mut self.outline) else {
            return unchanged;
        };

        let x_scale = f64::from(subpixel_scale) / prescale;
        let baseline = if self.options.hinting {
            (pen.y + 0.5).floor()
        } else {
            pen.y
        };
        let ink = if self.outline.is_empty() {
            None
        } else {
            let transform = Affine::new([x_scale, 0., 0., -1., pen.x + x_scale * kern, baseline]);
            let bounds = transform.transform_rect_bbox(self.outline.bbox);
            let clip_f = kurbo::Rect::new(
                f64::from(clip.x0),
                f64::from(clip.y0),
                f64::from(clip.x1),
                f64::from(clip.y1),
            );
            if bounds.intersect(clip_f).area().is_nearly_zero() {
                None
            } else {
                self.outline.path.apply_affine(transform);
                self.rasterizer
                    .fill(&self.outline.path, clip, coverage, surface)
            }
        };

        RenderedGlyph {
            pen: Point::new(pen.x + x_scale * (kern + advance.x), pen.y - advance.y),
            ink,
        }
    }

    /// Draws `text` onto a 4-byte-per-pixel surface and returns the final pen x in pixels.
    ///
    /// `(x, y)` is the baseline origin of the first line in pixels; a newline moves to the
    /// next line `1.25 * size` pixels down. In subpixel mode the raw coverage is LCD filtered
    /// while blending. Without a font nothing is drawn and `x` is returned.
    pub fn draw_text(
        &mut self,
        dst: &mut RowViewMut<'_>,
        text: &str,
        size: f64,
        x: f64,
        y: f64,
        color: Color,
        order: ChannelOrder,
    ) -> f64 {
        if self.font.is_none() {
            return x;
        }
        let s = self.subpixel_scale();
        let sf = f64::from(s);
        let plane_width = dst.width() / 4 * s as usize;
        let plane_height = dst.height();

        let mut plane = core::mem::take(&mut self.text_plane);
        plane.clear();
        plane.resize(plane_width * plane_height, 0);
        let Ok(mut coverage) = RowViewMut::packed(&mut plane, plane_width, plane_height) else {
            return x;
        };

        self.reset_kerning();
        let clip = coverage.bounds();
        let mut pen = Point::new(x * sf, y);
        for ch in text.chars() {
            if ch == '\n' {
                pen = Point::new(x * sf, pen.y + LINE_SPACING * size);
                self.reset_kerning();
                continue;
            }
            pen = self
                .render_glyph(&mut coverage, clip, 0xFF, pen, size, u32::from(ch), s)
                .pen;
        }

        let coverage = coverage.as_view();
        if s == 3 {
            blend::blend_lcd_filtered(&self.gamma, &self.lcd, dst, &coverage, color, order);
        } else {
            blend::blend_gamma(&self.gamma, dst, &coverage, color, order);
        }
        self.text_plane = plane;
        pen.x / sf
    }
}

#[cfg(all(feature = "skrifa", feature = "std"))]
impl<R: OutlineRasterizer> Renderer<SkrifaFont, R> {
    /// Loads the first font of the file at `path`, replacing the current font.
    pub fn load_font(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), LoadFontError> {
        let font = SkrifaFont::from_path(path, 0)?;
        self.set_font(font);
        Ok(())
    }
}

impl<F: fmt::Debug, R: fmt::Debug> fmt::Debug for Renderer<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("options", &self.options)
            .field("font", &self.font)
            .field("rasterizer", &self.rasterizer)
            .field("pixel_height", &self.pixel_height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFont;
    use alloc::vec;

    fn renderer(options: RenderOptions) -> Renderer<TestFont> {
        let mut renderer = Renderer::new(options);
        renderer.set_font(TestFont::new());
        renderer.set_pixel_height(10.);
        renderer
    }

    fn grayscale() -> RenderOptions {
        RenderOptions {
            subpixel: false,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn no_font_is_a_no_op() {
        let mut renderer = Renderer::<TestFont>::new(RenderOptions::default());
        let mut data = vec![0_u8; 30 * 20];
        let mut surface = RowViewMut::packed(&mut data, 30, 20).unwrap();
        let pen = Point::new(3., 12.);
        let out = renderer.render_codepoint(&mut surface, 255, pen, 'A'.into(), 3);
        assert_eq!(out, RenderedGlyph { pen, ink: None });
        assert!(data.iter().all(|&c| c == 0), "surface written without a font");
        assert_eq!(renderer.vertical_metrics(), Err(NoFontError));
        assert_eq!(renderer.scale_for_em_to_pixels(12.), Err(NoFontError));
        assert_eq!(renderer.font_height(12.), Err(NoFontError));
    }

    #[test]
    fn missing_glyph_leaves_pen_and_surface() {
        let mut renderer = renderer(RenderOptions::default());
        let mut data = vec![0_u8; 30 * 20];
        let mut surface = RowViewMut::packed(&mut data, 30, 20).unwrap();
        let pen = Point::new(3., 12.);
        let out = renderer.render_codepoint(&mut surface, 255, pen, 0xE000, 3);
        assert_eq!(out.pen, pen);
        assert_eq!(out.ink, None);
        assert!(data.iter().all(|&c| c == 0), "missing glyph wrote coverage");
    }

    #[test]
    fn advance_scales_with_subpixels() {
        for (options, s) in [(RenderOptions::default(), 3), (grayscale(), 1)] {
            let mut renderer = renderer(options);
            let mut data = vec![0_u8; 40 * 20];
            let mut surface = RowViewMut::packed(&mut data, 40, 20).unwrap();
            let out = renderer.render_codepoint(&mut surface, 255, Point::new(2., 12.), 'A'.into(), s);
            // 0.6 em at 10 px.
            assert!(
                (out.pen.x - (2. + 6. * f64::from(s))).abs() < 1e-9,
                "{out:?}"
            );
            assert_eq!(out.pen.y, 12.);
            let ink = out.ink.unwrap();
            // The box spans x 0.1..0.5 em and y 0..0.7 em.
            let s = s as i32;
            assert_eq!(ink.x0, 2 + s);
            assert_eq!(ink.x1, 2 + 5 * s);
            assert_eq!((ink.y0, ink.y1), (5, 12));
        }
    }

    #[test]
    fn prescale_keeps_geometry() {
        let options = RenderOptions {
            prescale_x: true,
            ..RenderOptions::default()
        };
        let mut renderer = renderer(options);
        let mut data = vec![0_u8; 40 * 20];
        let mut surface = RowViewMut::packed(&mut data, 40, 20).unwrap();
        let out = renderer.render_codepoint(&mut surface, 255, Point::new(0., 12.), 'A'.into(), 3);
        assert!((out.pen.x - 18.).abs() < 1e-9, "{out:?}");
        assert_eq!(out.ink, Some(IntRect::new(3, 5, 15, 12)));
    }

    #[test]
    fn hinting_snaps_the_baseline() {
        let mut data = vec![0_u8; 40 * 20];
        let mut surface = RowViewMut::packed(&mut data, 40, 20).unwrap();
        let pen = Point::new(0., 12.4);

        let mut hinted = renderer(grayscale());
        let ink = hinted.render_codepoint(&mut surface, 255, pen, 'A'.into(), 1).ink;
        assert_eq!(ink, Some(IntRect::new(1, 5, 5, 12)));

        surface.fill(0);
        let mut unhinted = renderer(RenderOptions {
            hinting: false,
            ..grayscale()
        });
        let ink = unhinted.render_codepoint(&mut surface, 255, pen, 'A'.into(), 1).ink;
        assert_eq!(ink, Some(IntRect::new(1, 5, 5, 13)));
    }

    #[test]
    fn kerning_applies_between_consecutive_glyphs() {
        let mut data = vec![0_u8; 60 * 20];
        let mut surface = RowViewMut::packed(&mut data, 60, 20).unwrap();
        let run = |renderer: &mut Renderer<TestFont>, surface: &mut RowViewMut<'_>| {
            let pen = renderer.render_codepoint(surface, 255, Point::new(0., 12.), 'A'.into(), 1);
            renderer
                .render_codepoint(surface, 255, pen.pen, 'V'.into(), 1)
                .pen
                .x
        };

        let mut plain = renderer(grayscale());
        assert!((run(&mut plain, &mut surface) - 12.).abs() < 1e-9);

        let mut kerned = renderer(RenderOptions {
            kerning: true,
            ..grayscale()
        });
        // The pair pulls V one pixel closer.
        assert!((run(&mut kerned, &mut surface) - 11.).abs() < 1e-9);
        kerned.reset_kerning();
        let pen = kerned.render_codepoint(&mut surface, 255, Point::new(0., 12.), 'V'.into(), 1);
        assert!((pen.pen.x - 6.).abs() < 1e-9);
    }

    #[test]
    fn metrics_follow_the_face() {
        let renderer = renderer(RenderOptions::default());
        assert_eq!(
            renderer.vertical_metrics(),
            Ok(VerticalMetrics {
                ascender: 0.8,
                descender: -0.2
            })
        );
        assert_eq!(renderer.scale_for_em_to_pixels(20.), Ok(0.02));
        assert_eq!(renderer.font_height(20.), Ok(20));

        let mut broken = Renderer::new(RenderOptions::default());
        let mut font = TestFont::new();
        font.metrics.units_per_em = 0;
        font.metrics.face_height = 0;
        broken.set_font(font);
        assert_eq!(broken.vertical_metrics(), Ok(VerticalMetrics::default()));
        assert_eq!(broken.scale_for_em_to_pixels(20.), Ok(0.));
        assert_eq!(broken.font_height(20.), Ok(0));
    }

    #[test]
    fn draw_text_composites_lines() {
        let mut renderer = renderer(RenderOptions::default());
        let mut data = [40_u8, 40, 40, 9].repeat(30 * 30);
        let mut dst = RowViewMut::packed(&mut data, 30 * 4, 30).unwrap();
        let end = renderer.draw_text(
            &mut dst,
            "AB\nC",
            10.,
            2.,
            10.,
            Color::rgb(255, 255, 255),
            ChannelOrder::Bgra,
        );
        // The second line holds one glyph.
        assert!((end - 8.).abs() < 1e-9, "pen ended at {end}");

        let touched = |y: usize| (0..30).any(|x| data[(y * 30 + x) * 4] != 40);
        assert!(touched(5), "first line missing");
        assert!(touched(20), "second line missing");
        assert!(!touched(0), "drew above the first line");
        assert!(data.chunks_exact(4).all(|px| px[3] == 9), "alpha written");
    }

    #[test]
    fn draw_text_without_font_returns_origin() {
        let mut renderer = Renderer::<TestFont>::new(RenderOptions::default());
        let mut data = vec![0_u8; 16];
        let mut dst = RowViewMut::packed(&mut data, 16, 1).unwrap();
        let end = renderer.draw_text(
            &mut dst,
            "A",
            10.,
            1.5,
            0.,
            Color::rgb(255, 255, 255),
            ChannelOrder::Bgra,
        );
        assert_eq!(end, 1.5);
    }
}
