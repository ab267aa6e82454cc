//! Painting: draws a [`Scene`] onto a browser 2D context.
//!
//! This module is the only place that issues drawing calls on a
//! [`web_sys::CanvasRenderingContext2d`]. It reads a finished display list
//! and produces pixels; all layout decisions were made by [`crate::render`].
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

#[cfg(test)]
#[path = "paint_test.rs"]
mod paint_test;

use std::cell::RefCell;
use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::ACCENT;
use crate::geom::{Point, Rect, Size};
use crate::render::{ImageFit, Node, Scene, TextAnchor, TextNode, image_placeholder};

/// Dash segment length for dashed outlines and the marquee.
const DASH_PX: f64 = 4.0;

const MARQUEE_FILL: &str = "rgba(103, 80, 164, 0.1)";
const HANDLE_BORDER: &str = "#fff";
const PLACEHOLDER_FAMILY: &str = "sans-serif";

// =============================================================
// Images
// =============================================================

/// Decoded images keyed by source string.
///
/// Sources are loaded on first request. Until an image has finished
/// decoding (or if it fails to), lookups return `None` and the painter shows
/// the node's placeholder instead.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: RefCell<HashMap<String, HtmlImageElement>>,
}

impl ImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoded image for `src`, starting a load if none is pending.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the image element cannot be created.
    pub fn get(&self, src: &str) -> Result<Option<HtmlImageElement>, JsValue> {
        let mut images = self.images.borrow_mut();
        if let Some(img) = images.get(src) {
            return Ok((img.complete() && img.natural_width() > 0).then(|| img.clone()));
        }
        let img = HtmlImageElement::new()?;
        img.set_src(src);
        images.insert(src.to_owned(), img);
        Ok(None)
    }

    /// Forget every cached image.
    pub fn clear(&self) {
        self.images.borrow_mut().clear();
    }
}

/// Source crop and destination box for drawing a `natural`-sized image
/// into `rect` with `fit`.
#[must_use]
pub fn image_rects(fit: ImageFit, rect: Rect, natural: Size) -> (Rect, Rect) {
    let full = Rect::new(0.0, 0.0, natural.width, natural.height);
    if !natural.is_positive() || !rect.size().is_positive() {
        return (full, rect);
    }
    let sx = rect.width / natural.width;
    let sy = rect.height / natural.height;
    match fit {
        ImageFit::Cover => {
            let scale = sx.max(sy);
            let (w, h) = (rect.width / scale, rect.height / scale);
            (Rect::new((natural.width - w) / 2.0, (natural.height - h) / 2.0, w, h), rect)
        }
        ImageFit::Contain => {
            let scale = sx.min(sy);
            let (w, h) = (natural.width * scale, natural.height * scale);
            (full, Rect::new(rect.x + (rect.width - w) / 2.0, rect.y + (rect.height - h) / 2.0, w, h))
        }
    }
}

/// Baseline-middle origin of each line of `node`.
#[must_use]
pub fn line_origins(node: &TextNode) -> Vec<Point> {
    let r = node.rect;
    let lh = node.line_height_px;
    let block = lh * node.lines.len() as f64;
    let (x, top) = match node.anchor {
        TextAnchor::TopLeft => (r.x + node.inset.x, r.y + node.inset.y),
        TextAnchor::MiddleLeft => (r.x + node.inset.x, r.y + (r.height - block) / 2.0),
        TextAnchor::Center => (r.x + r.width / 2.0, r.y + (r.height - block) / 2.0),
    };
    (0..node.lines.len())
        .map(|i| Point::new(x, top + (i as f64 + 0.5) * lh))
        .collect()
}

// =============================================================
// Scene
// =============================================================

/// Clear the canvas and draw `scene`.
///
/// `dpr` is the device pixel ratio; the scene is in CSS pixels.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, scene: &Scene, images: &ImageCache, dpr: f64) -> Result<(), JsValue> {
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, scene.width, scene.height);
    ctx.save();
    ctx.begin_path();
    ctx.rect(0.0, 0.0, scene.width, scene.height);
    ctx.clip();
    for node in &scene.nodes {
        draw_node(ctx, node, images)?;
    }
    ctx.restore();
    Ok(())
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &Node, images: &ImageCache) -> Result<(), JsValue> {
    match node {
        Node::Fill { rect, color } => {
            ctx.set_fill_style_str(color);
            ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            Ok(())
        }
        Node::Gradient { rect, from, to, start_color, end_color } => {
            let g = ctx.create_linear_gradient(from.x, from.y, to.x, to.y);
            g.add_color_stop(0.0, start_color)?;
            g.add_color_stop(1.0, end_color)?;
            ctx.set_fill_style_canvas_gradient(&g);
            ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            Ok(())
        }
        Node::Image { rect, src, fit, fallback_label } => draw_image(ctx, *rect, src, *fit, fallback_label.as_deref(), images),
        Node::Text(text) => draw_text(ctx, text),
        Node::Outline { rect, color, line_width, dashed } => draw_outline(ctx, *rect, color, *line_width, *dashed),
        Node::Handle { rect, .. } => {
            ctx.set_fill_style_str(ACCENT);
            ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            ctx.set_stroke_style_str(HANDLE_BORDER);
            ctx.set_line_width(1.0);
            ctx.stroke_rect(rect.x + 0.5, rect.y + 0.5, rect.width - 1.0, rect.height - 1.0);
            Ok(())
        }
        Node::Marquee { rect } => draw_marquee(ctx, *rect),
        Node::Group { alpha, rotation_deg, pivot, nodes } => {
            ctx.save();
            ctx.set_global_alpha(ctx.global_alpha() * alpha);
            ctx.translate(pivot.x, pivot.y)?;
            ctx.rotate(rotation_deg.to_radians())?;
            ctx.translate(-pivot.x, -pivot.y)?;
            for child in nodes {
                draw_node(ctx, child, images)?;
            }
            ctx.restore();
            Ok(())
        }
    }
}

fn draw_image(
    ctx: &CanvasRenderingContext2d,
    rect: Rect,
    src: &str,
    fit: ImageFit,
    fallback_label: Option<&str>,
    images: &ImageCache,
) -> Result<(), JsValue> {
    let Some(img) = images.get(src)? else {
        if let Some(label) = fallback_label {
            for node in image_placeholder(rect, label, PLACEHOLDER_FAMILY) {
                draw_node(ctx, &node, images)?;
            }
        }
        return Ok(());
    };
    let natural = Size::new(f64::from(img.natural_width()), f64::from(img.natural_height()));
    let (s, d) = image_rects(fit, rect, natural);
    ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
        &img, s.x, s.y, s.width, s.height, d.x, d.y, d.width, d.height,
    )
}

fn draw_text(ctx: &CanvasRenderingContext2d, node: &TextNode) -> Result<(), JsValue> {
    let r = node.rect;
    ctx.save();
    ctx.begin_path();
    ctx.rect(r.x, r.y, r.width, r.height);
    ctx.clip();

    ctx.set_fill_style_str(&node.color);
    ctx.set_font(&node.font);
    ctx.set_text_baseline("middle");
    ctx.set_text_align(match node.anchor {
        TextAnchor::Center => "center",
        TextAnchor::TopLeft | TextAnchor::MiddleLeft => "left",
    });
    for (line, at) in node.lines.iter().zip(line_origins(node)) {
        ctx.fill_text(line, at.x, at.y)?;
    }

    ctx.restore();
    Ok(())
}

/// Stroke inside `rect`, the way a border-box border sits.
fn draw_outline(
    ctx: &CanvasRenderingContext2d,
    rect: Rect,
    color: &str,
    line_width: f64,
    dashed: bool,
) -> Result<(), JsValue> {
    ctx.save();
    if dashed {
        set_dash(ctx)?;
    }
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(line_width);
    let r = rect.inset(line_width / 2.0);
    ctx.stroke_rect(r.x, r.y, r.width, r.height);
    ctx.restore();
    Ok(())
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, rect: Rect) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_fill_style_str(MARQUEE_FILL);
    ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
    set_dash(ctx)?;
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(2.0);
    let r = rect.inset(1.0);
    ctx.stroke_rect(r.x, r.y, r.width, r.height);
    ctx.restore();
    Ok(())
}

fn set_dash(ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
    let dash_array = js_sys::Array::new();
    dash_array.push(&DASH_PX.into());
    dash_array.push(&DASH_PX.into());
    ctx.set_line_dash(&dash_array)
}
