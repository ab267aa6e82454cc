//! Geometry model: percentage boxes and the clamping rules used by every
//! drag and resize.
//!
//! Element and watermark geometry is stored as percentages of the card
//! surface (`0..=100` on both axes), so the same template renders at any pixel
//! size. Pointer input arrives in screen pixels; [`pct_delta`] converts a
//! pixel delta into percent space using the card bounds captured when the
//! gesture started, and [`clamp_drag`] / [`clamp_resize`] keep the result on
//! the card.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_BOX_PCT;

/// A point in screen pixels or card percent, depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise `self - other`.
    #[must_use]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// An axis-aligned box given by its top-left origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The normalized box spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `pt` lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.right() && pt.y >= self.y && pt.y <= self.bottom()
    }

    /// Overlap test: true unless the boxes are separated on some axis.
    /// Touching edges count as overlapping, so a zero-area rectangle on an
    /// element's border still hits it.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.x || other.right() < self.x || self.bottom() < other.y || other.bottom() < self.y)
    }

    /// Scale a percent box onto a surface of `surface` pixels.
    #[must_use]
    pub fn pct_to_px(&self, surface: Size) -> Rect {
        Rect {
            x: self.x / 100.0 * surface.width,
            y: self.y / 100.0 * surface.height,
            width: self.width / 100.0 * surface.width,
            height: self.height / 100.0 * surface.height,
        }
    }

    /// Shrink the box by `amount` on every side, never below zero size.
    #[must_use]
    pub fn inset(&self, amount: f64) -> Rect {
        Rect {
            x: self.x + amount,
            y: self.y + amount,
            width: (self.width - 2.0 * amount).max(0.0),
            height: (self.height - 2.0 * amount).max(0.0),
        }
    }
}

/// One of the four corner resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    Nw,
    Ne,
    Se,
    Sw,
}

impl ResizeHandle {
    /// Every handle, in hit-test priority order.
    pub const ALL: [ResizeHandle; 4] = [Self::Se, Self::Sw, Self::Ne, Self::Nw];

    #[must_use]
    pub fn moves_east(self) -> bool {
        matches!(self, Self::Ne | Self::Se)
    }

    #[must_use]
    pub fn moves_west(self) -> bool {
        matches!(self, Self::Nw | Self::Sw)
    }

    #[must_use]
    pub fn moves_north(self) -> bool {
        matches!(self, Self::Nw | Self::Ne)
    }

    #[must_use]
    pub fn moves_south(self) -> bool {
        matches!(self, Self::Sw | Self::Se)
    }

    /// The corner of `rect` this handle sits on.
    #[must_use]
    pub fn corner_of(self, rect: &Rect) -> Point {
        let x = if self.moves_east() { rect.right() } else { rect.x };
        let y = if self.moves_south() { rect.bottom() } else { rect.y };
        Point::new(x, y)
    }
}

/// Convert a pixel delta into a percent-of-card delta.
///
/// Returns `None` when the card has not been laid out yet (non-positive
/// bounds); callers skip the frame instead of producing NaN geometry.
#[must_use]
pub fn pct_delta(delta_px: Point, bounds_px: Size) -> Option<Point> {
    if !bounds_px.is_positive() {
        return None;
    }
    Some(Point::new(delta_px.x / bounds_px.width * 100.0, delta_px.y / bounds_px.height * 100.0))
}

/// Move `origin` by `delta` and clamp so the box stays on the card:
/// `0 <= origin <= 100 - size` on each axis.
///
/// Boxes wider than the card pin to the left/top edge.
#[must_use]
pub fn clamp_drag(origin: Point, size: Size, delta: Point) -> Point {
    Point::new(
        clamp_axis(origin.x + delta.x, 100.0 - size.width),
        clamp_axis(origin.y + delta.y, 100.0 - size.height),
    )
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    value.min(max).max(0.0)
}

/// Resize `start` by dragging `handle` by `delta` (percent units).
///
/// Far edges (east/south) grow the size directly, capped at the space left on
/// the card. Near edges (west/north) shrink the size and shift the origin by
/// the same amount so the opposite edge stays fixed; they may grow the box up
/// to the card edge. Every size is floored at [`MIN_BOX_PCT`]. When the floor
/// does not fit between the fixed edge and the card edge, the box is pushed
/// back onto the card, so the origin stays in `[0, 100 - size]`.
#[must_use]
pub fn clamp_resize(handle: ResizeHandle, start: Rect, delta: Point) -> Rect {
    let mut out = start;

    if handle.moves_east() {
        let w = (start.width + delta.x).min(100.0 - start.x).max(MIN_BOX_PCT);
        out.x = start.x.min(100.0 - w);
        out.width = w;
    }
    if handle.moves_west() {
        let w = (start.width - delta.x).min(start.right()).max(MIN_BOX_PCT);
        out.x = (start.right() - w).max(0.0);
        out.width = w;
    }
    if handle.moves_south() {
        let h = (start.height + delta.y).min(100.0 - start.y).max(MIN_BOX_PCT);
        out.y = start.y.min(100.0 - h);
        out.height = h;
    }
    if handle.moves_north() {
        let h = (start.height - delta.y).min(start.bottom()).max(MIN_BOX_PCT);
        out.y = (start.bottom() - h).max(0.0);
        out.height = h;
    }

    out
}

/// Clamp a manually entered percentage into `[min, 100]`; NaN becomes
/// `fallback`.
#[must_use]
pub fn sanitize_pct(value: f64, min: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        return fallback;
    }
    value.clamp(min, 100.0)
}
