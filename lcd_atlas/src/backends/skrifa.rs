// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`FontEngine`] backed by Skrifa.

#![allow(
    clippy::cast_possible_truncation,
    reason = "Glyph sizes are converted from f64 to f32 for Skrifa, and font unit metrics fit in i32."
)]

use alloc::sync::Arc;
use core::fmt;

use ::skrifa::charmap::MappingIndex;
use ::skrifa::instance::{LocationRef, Size};
use ::skrifa::outline::{
    DrawSettings, Engine, HintingInstance, HintingOptions, OutlineGlyphCollection, OutlinePen,
    SmoothMode, Target,
};
use ::skrifa::raw::TableProvider;
use ::skrifa::raw::tables::kern::{Kern, Subtable, SubtableKind};
use ::skrifa::{FontRef, MetadataProvider};
use hashbrown::HashMap;
use kurbo::Vec2;

use crate::font::{FaceMetrics, FontEngine, GlyphId, GlyphOutline, GlyphSize};

#[cfg(not(feature = "std"))]
use core_maths::CoreFloat as _;

// Vertical-only hinting tuned for LCD rendering; horizontal metrics stay linear so advances
// remain stable across sizes.
const HINTING_OPTIONS: HintingOptions = HintingOptions {
    engine: Engine::AutoFallback,
    target: Target::Smooth {
        mode: SmoothMode::Lcd,
        symmetric_rendering: false,
        preserve_linear_metrics: true,
    },
};

/// An error that occurred while loading a font.
#[derive(Debug)]
pub enum LoadFontError {
    /// The font file could not be read.
    #[cfg(feature = "std")]
    Io(std::io::Error),
    /// The data is not a font, or the collection has no font at the index.
    InvalidFont {
        /// The requested collection index.
        index: u32,
    },
}

impl fmt::Display for LoadFontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "std")]
            Self::Io(err) => write!(f, "failed to read font file: {err}"),
            Self::InvalidFont { index } => write!(f, "no valid font at index {index}"),
        }
    }
}

impl core::error::Error for LoadFontError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            #[cfg(feature = "std")]
            Self::Io(err) => Some(err),
            Self::InvalidFont { .. } => None,
        }
    }
}

/// A font face parsed by Skrifa.
///
/// The font data is shared, so cloning is cheap; each clone keeps its own size and hinting
/// state.
pub struct SkrifaFont {
    data: Arc<[u8]>,
    index: u32,
    metrics: FaceMetrics,
    charmap: MappingIndex,
    kerning: HashMap<(u16, u16), i16>,
    size: GlyphSize,
    hinting: Option<HintingInstance>,
}

impl SkrifaFont {
    /// Parses the font at `index` of a font file or collection.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>, index: u32) -> Result<Self, LoadFontError> {
        let data = data.into();
        let font =
            FontRef::from_index(&data, index).map_err(|_| LoadFontError::InvalidFont { index })?;

        let m = font.metrics(Size::unscaled(), LocationRef::default());
        let metrics = FaceMetrics {
            units_per_em: m.units_per_em,
            face_height: (m.ascent - m.descent + m.leading).round() as i32,
            ascender: m.ascent.round() as i32,
            descender: m.descent.round() as i32,
        };
        let kerning = font
            .kern()
            .map(|kern| kern_pairs(&kern))
            .unwrap_or_default();
        log::debug!(
            "loaded font {index}: {} units per em, {} kerning pairs",
            metrics.units_per_em,
            kerning.len()
        );

        Ok(Self {
            data: data.clone(),
            index,
            metrics,
            charmap: MappingIndex::new(&font),
            kerning,
            size: GlyphSize::uniform(0.),
            hinting: None,
        })
    }

    /// Reads and parses the font at `index` of the file at `path`.
    #[cfg(feature = "std")]
    pub fn from_path(
        path: impl AsRef<std::path::Path>,
        index: u32,
    ) -> Result<Self, LoadFontError> {
        let data = std::fs::read(path).map_err(LoadFontError::Io)?;
        Self::from_bytes(data, index)
    }

    /// The number of pairs in the legacy `kern` table.
    pub fn kerning_pairs(&self) -> usize {
        self.kerning.len()
    }

    fn font(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.index).ok()
    }
}

impl Clone for SkrifaFont {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            index: self.index,
            metrics: self.metrics,
            charmap: self.charmap,
            kerning: self.kerning.clone(),
            size: self.size,
            hinting: None,
        }
    }
}

impl fmt::Debug for SkrifaFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkrifaFont")
            .field("index", &self.index)
            .field("metrics", &self.metrics)
            .field("kerning", &self.kerning.len())
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl FontEngine for SkrifaFont {
    fn face_metrics(&self) -> FaceMetrics {
        self.metrics
    }

    fn set_size(&mut self, size: GlyphSize) {
        self.size = size;
    }

    fn glyph_id(&self, codepoint: u32) -> Option<GlyphId> {
        let gid = self.charmap.charmap(&self.font()?).map(codepoint)?;
        // Glyph 0 is `.notdef`, which cmap uses for unmapped codepoints.
        (gid.to_u32() != 0).then_some(GlyphId(gid.to_u32()))
    }

    fn kerning(&self, left: GlyphId, right: GlyphId) -> f64 {
        let (Ok(left), Ok(right)) = (u16::try_from(left.0), u16::try_from(right.0)) else {
            return 0.;
        };
        match self.kerning.get(&(left, right)) {
            Some(&value) if self.metrics.units_per_em > 0 => {
                f64::from(value) * self.size.width / f64::from(self.metrics.units_per_em)
            }
            _ => 0.,
        }
    }

    fn outline(
        &mut self,
        glyph: GlyphId,
        hinting: bool,
        outline: &mut GlyphOutline,
    ) -> Option<Vec2> {
        outline.clear();
        if self.size.height <= 0. {
            return Some(Vec2::ZERO);
        }
        // Borrow only the `data` field so `self.hinting` can be borrowed mutably below.
        let font = FontRef::from_index(&self.data, self.index).ok()?;
        let gid = ::skrifa::GlyphId::new(glyph.0);

        let advance = font
            .glyph_metrics(Size::new(self.size.width as f32), LocationRef::default())
            .advance_width(gid)?;

        let outlines = font.outline_glyphs();
        if let Some(glyph) = outlines.get(gid) {
            let size = Size::new(self.size.height as f32);
            let instance = if hinting {
                hinting_instance(&mut self.hinting, &outlines, size)
            } else {
                None
            };
            let settings = match instance {
                Some(instance) => DrawSettings::hinted(instance, false),
                None => DrawSettings::unhinted(size, LocationRef::default()),
            };
            let mut pen = StretchPen {
                outline: &mut *outline,
                x_scale: self.size.width / self.size.height,
            };
            if let Err(err) = glyph.draw(settings, &mut pen) {
                log::warn!("failed to draw glyph {}: {err}", gid.to_u32());
                outline.clear();
            }
        }

        Some(Vec2::new(f64::from(advance), 0.))
    }
}

fn hinting_instance<'a>(
    slot: &'a mut Option<HintingInstance>,
    outlines: &OutlineGlyphCollection<'_>,
    size: Size,
) -> Option<&'a HintingInstance> {
    let reusable = slot.as_mut().is_some_and(|instance| {
        instance.size() == size
            || instance
                .reconfigure(outlines, size, LocationRef::default(), HINTING_OPTIONS)
                .is_ok()
    });
    if !reusable {
        *slot = HintingInstance::new(outlines, size, LocationRef::default(), HINTING_OPTIONS).ok();
    }
    slot.as_ref()
}

/// Draws into a [`GlyphOutline`], stretching x to the requested horizontal size.
struct StretchPen<'a> {
    outline: &'a mut GlyphOutline,
    x_scale: f64,
}

impl StretchPen<'_> {
    #[inline]
    fn point(&self, x: f32, y: f32) -> (f64, f64) {
        (f64::from(x) * self.x_scale, f64::from(y))
    }
}

impl OutlinePen for StretchPen<'_> {
    #[inline]
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.outline.move_to(p);
    }

    #[inline]
    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.outline.line_to(p);
    }

    #[inline]
    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let (c, p) = (self.point(cx, cy), self.point(x, y));
        self.outline.quad_to(c, p);
    }

    #[inline]
    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let (c0, c1, p) = (self.point(cx0, cy0), self.point(cx1, cy1), self.point(x, y));
        self.outline.curve_to(c0, c1, p);
    }

    #[inline]
    fn close(&mut self) {
        self.outline.close();
    }
}

/// Collects horizontal format 0 pairs from a `kern` table.
///
/// The first subtable that defines a pair wins. Malformed subtables are skipped.
fn kern_pairs(kern: &Kern<'_>) -> HashMap<(u16, u16), i16> {
    let mut pairs = HashMap::new();
    for subtable in kern.subtables() {
        let subtable = match subtable {
            Ok(subtable) => subtable,
            Err(err) => {
                log::warn!("stopped reading kern table: {err}");
                break;
            }
        };
        if !is_plain_horizontal(&subtable) {
            continue;
        }
        match subtable.kind() {
            Ok(SubtableKind::Format0(format0)) => {
                for pair in format0.pairs() {
                    pairs
                        .entry((pair.left().to_u16(), pair.right().to_u16()))
                        .or_insert(pair.value());
                }
            }
            Ok(_) => {}
            Err(err) => log::warn!("skipped malformed kern subtable: {err}"),
        }
    }
    pairs
}

// Vertical, cross-stream, variation and minimum-value subtables do not adjust advances.
fn is_plain_horizontal(subtable: &Subtable<'_>) -> bool {
    let minimum = matches!(subtable, Subtable::Ot(ot) if ot.coverage() & 0x2 != 0);
    subtable.is_horizontal()
        && !subtable.is_cross_stream()
        && !subtable.is_variable()
        && !minimum
}
