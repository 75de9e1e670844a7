// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filling outlines into coverage surfaces.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{BezPath, PathEl, Point};
use zeno::{Command, Format, Mask, Origin, Scratch, Vector};

use crate::view::{IntRect, RowViewMut};

/// Scan conversion of a path into an 8-bit coverage surface.
pub trait OutlineRasterizer {
    /// Fills `path` (in surface pixels, y down) with the non-zero rule.
    ///
    /// Only pixels inside `clip` and the surface are touched. Each receives `(coverage * (c + 1))
    /// >> 8`, where `c` is the antialiased area coverage, kept as the maximum with the existing
    /// value. Returns the bounds of the pixels that received nonzero coverage.
    fn fill(
        &mut self,
        path: &BezPath,
        clip: IntRect,
        coverage: u8,
        surface: &mut RowViewMut<'_>,
    ) -> Option<IntRect>;
}

/// An [`OutlineRasterizer`] backed by `zeno`.
///
/// Scratch memory for the path commands, the mask and zeno's own edge lists is kept between
/// calls.
pub struct ZenoRasterizer {
    scratch: Scratch,
    commands: Vec<Command>,
    mask: Vec<u8>,
}

impl ZenoRasterizer {
    /// Creates a rasterizer with empty scratch buffers.
    pub fn new() -> Self {
        Self {
            scratch: Scratch::new(),
            commands: Vec::new(),
            mask: Vec::new(),
        }
    }
}

impl Default for ZenoRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ZenoRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZenoRasterizer")
            .field("commands", &self.commands.len())
            .field("mask", &self.mask.len())
            .finish_non_exhaustive()
    }
}

impl OutlineRasterizer for ZenoRasterizer {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "column indices are bounded by the surface width"
    )]
    fn fill(
        &mut self,
        path: &BezPath,
        clip: IntRect,
        coverage: u8,
        surface: &mut RowViewMut<'_>,
    ) -> Option<IntRect> {
        let clip = clip.intersect(&surface.bounds());
        if clip.is_empty() || coverage == 0 {
            return None;
        }

        self.commands.clear();
        self.commands.extend(path.elements().iter().map(|el| match *el {
            PathEl::MoveTo(p) => Command::MoveTo(vector(p)),
            PathEl::LineTo(p) => Command::LineTo(vector(p)),
            PathEl::QuadTo(p1, p2) => Command::QuadTo(vector(p1), vector(p2)),
            PathEl::CurveTo(p1, p2, p3) => Command::CurveTo(vector(p1), vector(p2), vector(p3)),
            PathEl::ClosePath => Command::Close,
        }));
        if self.commands.is_empty() {
            return None;
        }

        let placement = Mask::with_scratch(&self.commands[..], &mut self.scratch)
            .format(Format::Alpha)
            .origin(Origin::TopLeft)
            .inspect(|fmt, w, h| {
                self.mask.clear();
                self.mask.resize(fmt.buffer_size(w, h), 0);
            })
            .render_into(&mut self.mask[..], None);

        let (Ok(width), Ok(height)) = (
            i32::try_from(placement.width),
            i32::try_from(placement.height),
        ) else {
            return None;
        };
        let placed = IntRect::new(
            placement.left,
            placement.top,
            placement.left + width,
            placement.top + height,
        );
        let area = placed.intersect(&clip);
        if area.is_empty() {
            return None;
        }

        let scale = u32::from(coverage);
        let mut ink = IntRect::default();
        for y in area.y0..area.y1 {
            let mask_row = (y - placed.y0) as usize * width as usize;
            let src = &self.mask[mask_row + (area.x0 - placed.x0) as usize..]
                [..area.width() as usize];
            let dst = &mut surface.row_mut(y as usize)[area.x0 as usize..area.x1 as usize];

            let mut row_ink: Option<(i32, i32)> = None;
            for (i, (d, &c)) in dst.iter_mut().zip(src).enumerate() {
                let value = u8::try_from((scale * (u32::from(c) + 1)) >> 8).unwrap_or(u8::MAX);
                if value == 0 {
                    continue;
                }
                *d = (*d).max(value);
                let x = area.x0 + i as i32;
                row_ink = Some(row_ink.map_or((x, x), |(x0, _)| (x0, x)));
            }
            if let Some((x0, x1)) = row_ink {
                ink = ink.union(&IntRect::new(x0, y, x1 + 1, y + 1));
            }
        }

        (!ink.is_empty()).then_some(ink)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "glyph coordinates are well within f32 range"
)]
#[inline]
fn vector(p: Point) -> Vector {
    Vector::new(p.x as f32, p.y as f32)
}
