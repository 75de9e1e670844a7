// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row-addressed views over caller-owned byte buffers.
//!
//! A view describes a rectangle of `height` rows, each `width` bytes long, laid out with a
//! signed `stride` between consecutive rows. Row 0 is always the visual top row: a buffer stored
//! bottom-up is described with a negative stride, in which case row 0 starts at the last
//! `|stride|` block of the buffer.

use core::fmt;

/// An error produced when a buffer cannot back the requested view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// The absolute stride is shorter than a row.
    StrideTooSmall {
        /// The row width in bytes.
        width: usize,
        /// The requested stride.
        stride: isize,
    },
    /// The buffer does not hold all rows.
    BufferTooSmall {
        /// The number of bytes the view needs.
        required: usize,
        /// The number of bytes the buffer has.
        actual: usize,
    },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrideTooSmall { width, stride } => {
                write!(f, "stride {stride} is shorter than the row width {width}")
            }
            Self::BufferTooSmall { required, actual } => {
                write!(f, "buffer holds {actual} bytes but the view needs {required}")
            }
        }
    }
}

impl core::error::Error for ViewError {}

/// An integer rectangle, top-left inclusive and bottom-right exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left edge.
    pub x0: i32,
    /// Top edge.
    pub y0: i32,
    /// Right edge (exclusive).
    pub x1: i32,
    /// Bottom edge (exclusive).
    pub y1: i32,
}

impl IntRect {
    /// Creates a new rectangle from its edges.
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Creates a rectangle anchored at the origin.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "surface dimensions are far below i32::MAX"
    )]
    pub const fn from_size(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// The width, zero when the rectangle is empty.
    pub const fn width(&self) -> i32 {
        if self.x1 > self.x0 {
            self.x1 - self.x0
        } else {
            0
        }
    }

    /// The height, zero when the rectangle is empty.
    pub const fn height(&self) -> i32 {
        if self.y1 > self.y0 {
            self.y1 - self.y0
        } else {
            0
        }
    }

    /// Whether the rectangle covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// The overlap of two rectangles (possibly empty).
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
    }

    /// The smallest rectangle containing both; empty rectangles are ignored.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Whether the two rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
struct Layout {
    width: usize,
    height: usize,
    stride: isize,
    origin: usize,
}

impl Layout {
    fn new(len: usize, width: usize, height: usize, stride: isize) -> Result<Self, ViewError> {
        let step = stride.unsigned_abs();
        if height > 1 && step < width {
            return Err(ViewError::StrideTooSmall { width, stride });
        }
        let required = if height == 0 {
            0
        } else {
            (height - 1) * step + width
        };
        if required > len {
            return Err(ViewError::BufferTooSmall {
                required,
                actual: len,
            });
        }
        let origin = if stride < 0 && height > 0 {
            (height - 1) * step
        } else {
            0
        };
        Ok(Self {
            width,
            height,
            stride,
            origin,
        })
    }

    // Offsets were validated against the buffer length in `new`.
    #[inline]
    fn row_start(&self, y: usize) -> usize {
        debug_assert!(y < self.height, "row {y} out of range 0..{}", self.height);
        (self.origin as isize + y as isize * self.stride) as usize
    }
}

/// A read-only view over rows of bytes.
#[derive(Clone, Copy)]
pub struct RowView<'a> {
    data: &'a [u8],
    layout: Layout,
}

impl<'a> RowView<'a> {
    /// Creates a view with an explicit, possibly negative, stride.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: isize,
    ) -> Result<Self, ViewError> {
        let layout = Layout::new(data.len(), width, height, stride)?;
        Ok(Self { data, layout })
    }

    /// Creates a top-down view whose stride equals its width.
    pub fn packed(data: &'a [u8], width: usize, height: usize) -> Result<Self, ViewError> {
        Self::new(data, width, height, width as isize)
    }

    /// A top-down view over the whole rows of `data`.
    pub(crate) fn whole_rows(data: &'a [u8], width: usize) -> Self {
        let height = data.len().checked_div(width).unwrap_or(0);
        Self {
            data,
            layout: Layout {
                width,
                height,
                stride: width as isize,
                origin: 0,
            },
        }
    }

    /// Row width in bytes.
    pub fn width(&self) -> usize {
        self.layout.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.layout.height
    }

    /// Signed distance in bytes between the starts of consecutive rows.
    pub fn stride(&self) -> isize {
        self.layout.stride
    }

    /// The bytes of row `y`, counted from the top.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = self.layout.row_start(y);
        &self.data[start..start + self.layout.width]
    }

    /// The byte at column `x` of row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.row(y)[x]
    }
}

impl fmt::Debug for RowView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowView")
            .field("width", &self.layout.width)
            .field("height", &self.layout.height)
            .field("stride", &self.layout.stride)
            .finish_non_exhaustive()
    }
}

/// A mutable view over rows of bytes.
pub struct RowViewMut<'a> {
    data: &'a mut [u8],
    layout: Layout,
}

impl<'a> RowViewMut<'a> {
    /// Creates a view with an explicit, possibly negative, stride.
    pub fn new(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: isize,
    ) -> Result<Self, ViewError> {
        let layout = Layout::new(data.len(), width, height, stride)?;
        Ok(Self { data, layout })
    }

    /// Creates a top-down view whose stride equals its width.
    pub fn packed(data: &'a mut [u8], width: usize, height: usize) -> Result<Self, ViewError> {
        Self::new(data, width, height, width as isize)
    }

    /// Row width in bytes.
    pub fn width(&self) -> usize {
        self.layout.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.layout.height
    }

    /// Signed distance in bytes between the starts of consecutive rows.
    pub fn stride(&self) -> isize {
        self.layout.stride
    }

    /// The rectangle covered by the view, in bytes by rows.
    pub fn bounds(&self) -> IntRect {
        IntRect::from_size(self.layout.width, self.layout.height)
    }

    /// The bytes of row `y`, counted from the top.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = self.layout.row_start(y);
        &self.data[start..start + self.layout.width]
    }

    /// The mutable bytes of row `y`, counted from the top.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = self.layout.row_start(y);
        &mut self.data[start..start + self.layout.width]
    }

    /// The byte at column `x` of row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.row(y)[x]
    }

    /// Sets every byte of every row to `value`, leaving stride padding alone.
    pub fn fill(&mut self, value: u8) {
        for y in 0..self.layout.height {
            self.row_mut(y).fill(value);
        }
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> RowView<'_> {
        RowView {
            data: &*self.data,
            layout: self.layout,
        }
    }
}

impl fmt::Debug for RowViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowViewMut")
            .field("width", &self.layout.width)
            .field("height", &self.layout.height)
            .field("stride", &self.layout.stride)
            .finish_non_exhaustive()
    }
}
