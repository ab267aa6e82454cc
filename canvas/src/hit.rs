//! Hit-testing in card pixel space.
//!
//! Points are relative to the card's top-left corner. Handles are tested
//! before bodies, and later elements before earlier ones, so the topmost
//! visible target wins.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{HANDLE_OUTSET_PX, HANDLE_SIZE_PX};
use crate::doc::{ElementId, Template};
use crate::geom::{Point, Rect, ResizeHandle, Size};

/// What a press landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    /// A corner handle of the single selected element.
    ElementHandle { id: ElementId, handle: ResizeHandle },
    Element(ElementId),
    WatermarkHandle(ResizeHandle),
    Watermark,
    /// Card area not covered by any interactive target.
    Background,
}

/// The square handle drawn on `handle`'s corner of `rect`, sticking out
/// [`HANDLE_OUTSET_PX`] past it.
#[must_use]
pub fn handle_rect(handle: ResizeHandle, rect: Rect) -> Rect {
    let corner = handle.corner_of(&rect);
    let x = if handle.moves_east() { corner.x + HANDLE_OUTSET_PX - HANDLE_SIZE_PX } else { corner.x - HANDLE_OUTSET_PX };
    let y = if handle.moves_south() { corner.y + HANDLE_OUTSET_PX - HANDLE_SIZE_PX } else { corner.y - HANDLE_OUTSET_PX };
    Rect::new(x, y, HANDLE_SIZE_PX, HANDLE_SIZE_PX)
}

/// `pt` expressed in the unrotated frame of a box rotated `deg` degrees
/// clockwise about `pivot`.
#[must_use]
pub fn to_local(pt: Point, pivot: Point, deg: f64) -> Point {
    if deg == 0.0 {
        return pt;
    }
    let (sin, cos) = deg.to_radians().sin_cos();
    let d = pt.sub(pivot);
    Point::new(pivot.x + d.x * cos + d.y * sin, pivot.y - d.x * sin + d.y * cos)
}

/// Interaction context for [`hit_test`].
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    /// Card size in pixels.
    pub card: Size,
    pub selected: &'a [ElementId],
    pub watermark_edit: bool,
}

/// Find the target under `pt`, or `None` if it lies outside the card.
#[must_use]
pub fn hit_test(pt: Point, template: &Template, ctx: &HitContext<'_>) -> Option<Hit> {
    let card_rect = Rect::new(0.0, 0.0, ctx.card.width, ctx.card.height);
    if !card_rect.contains(pt) {
        return None;
    }

    if ctx.watermark_edit {
        return Some(hit_watermark(pt, template, ctx.card).unwrap_or(Hit::Background));
    }

    if let [only] = ctx.selected
        && let Some(el) = template.element(only)
        && let Some(handle) = hit_handle(pt, el.rect().pct_to_px(ctx.card))
    {
        return Some(Hit::ElementHandle { id: el.id.clone(), handle });
    }

    let top = template
        .elements
        .iter()
        .rev()
        .find(|el| el.rect().pct_to_px(ctx.card).contains(pt));
    Some(top.map_or(Hit::Background, |el| Hit::Element(el.id.clone())))
}

fn hit_watermark(pt: Point, template: &Template, card: Size) -> Option<Hit> {
    let wm = template.watermark.as_ref()?;
    let rect = wm.resolve_box().pct_to_px(card);
    let pivot = Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0);
    let local = to_local(pt, pivot, wm.rotation.unwrap_or(0.0));
    if let Some(handle) = hit_handle(local, rect) {
        return Some(Hit::WatermarkHandle(handle));
    }
    rect.contains(local).then_some(Hit::Watermark)
}

fn hit_handle(pt: Point, rect: Rect) -> Option<ResizeHandle> {
    ResizeHandle::ALL.into_iter().find(|&h| handle_rect(h, rect).contains(pt))
}
