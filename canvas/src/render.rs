//! Scene building: turns a template and an optional record into a flat,
//! pixel-space display list.
//!
//! Rendering is a pure function of its inputs plus the [`FitCache`], which
//! only memoizes fit results. The card surface has a fixed physical size
//! and never reflows. Nodes are emitted bottom to top: background, watermark,
//! elements in array order, then design chrome (outlines, handles, marquee).
//!
//! [`crate::paint`] draws a [`Scene`] onto a browser canvas; the CLI
//! serializes it as JSON.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    ACCENT, CSS_PX_PER_MM, DEFAULT_CARD_HEIGHT_MM, DEFAULT_CARD_WIDTH_MM, EMPTY_BACKGROUND, HORIZONTAL_PADDING_EM,
    IMAGE_PLACEHOLDER_FONT_PX, LINE_HEIGHT_EM, NBSP, VERTICAL_PADDING_EM,
};
use crate::doc::{Background, CardRecord, Element, ElementId, ElementKind, FontWeight, Template, TextStyle, Watermark, WatermarkKind};
use crate::fit::{FitCache, normalize_text};
use crate::geom::{Point, Rect, ResizeHandle, Size};
use crate::hit::handle_rect;
use crate::measure::{FontSpec, TextMeasurer, wrap_lines};

const DEFAULT_TEXT_COLOR: &str = "#000";
const UNSELECTED_OUTLINE: &str = "#999";
const PLACEHOLDER_FILL: &str = "#e0e0e0";
const PLACEHOLDER_TEXT: &str = "#666";
const DEFAULT_IMAGE_LABEL: &str = "Photo";
const DEFAULT_GRADIENT_DIRECTION: &str = "to bottom";

/// Whether the canvas is being edited or produced for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Live data, no chrome.
    #[default]
    Output,
    /// Placeholders instead of data, outlines and handles.
    Design,
}

/// Physical card surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSurface {
    pub width_mm: f64,
    pub height_mm: f64,
    pub px_per_mm: f64,
}

impl Default for CardSurface {
    fn default() -> Self {
        Self { width_mm: DEFAULT_CARD_WIDTH_MM, height_mm: DEFAULT_CARD_HEIGHT_MM, px_per_mm: CSS_PX_PER_MM }
    }
}

impl CardSurface {
    /// Surface size in CSS pixels.
    #[must_use]
    pub fn size_px(&self) -> Size {
        Size::new(self.width_mm * self.px_per_mm, self.height_mm * self.px_per_mm)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub surface: CardSurface,
    pub mode: RenderMode,
    /// Family used when an element names none.
    pub font_family: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { surface: CardSurface::default(), mode: RenderMode::Output, font_family: "sans-serif".into() }
    }
}

/// Interaction state the design chrome reflects. Ignored in output mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overlay<'a> {
    pub selected: &'a [ElementId],
    /// Marquee rectangle in card pixels.
    pub marquee: Option<Rect>,
    pub watermark_edit: bool,
}

// =============================================================
// Display list
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Fill the box, cropping overflow.
    Cover,
    /// Fit inside the box, preserving aspect ratio.
    Contain,
}

/// Where a text block sits inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAnchor {
    TopLeft,
    MiddleLeft,
    Center,
}

/// Pre-wrapped text clipped to `rect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub rect: Rect,
    pub lines: Vec<String>,
    /// CSS font shorthand at `size_px`.
    pub font: String,
    pub size_px: f64,
    pub line_height_px: f64,
    pub color: String,
    pub anchor: TextAnchor,
    /// Horizontal and vertical padding inside `rect`.
    pub inset: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Node {
    Fill {
        rect: Rect,
        color: String,
    },
    /// Linear gradient along `from -> to`.
    Gradient {
        rect: Rect,
        from: Point,
        to: Point,
        start_color: String,
        end_color: String,
    },
    Image {
        rect: Rect,
        src: String,
        fit: ImageFit,
        /// Shown instead when the source cannot be drawn.
        #[serde(skip_serializing_if = "Option::is_none")]
        fallback_label: Option<String>,
    },
    Text(TextNode),
    Outline {
        rect: Rect,
        color: String,
        line_width: f64,
        dashed: bool,
    },
    Handle {
        rect: Rect,
        handle: ResizeHandle,
    },
    Marquee {
        rect: Rect,
    },
    /// Children drawn with shared opacity and a rotation about `pivot`.
    Group {
        alpha: f64,
        rotation_deg: f64,
        pivot: Point,
        nodes: Vec<Node>,
    },
}

/// A rendered card, in CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<Node>,
}

impl Scene {
    /// All text nodes, including those nested in groups.
    #[must_use]
    pub fn texts(&self) -> Vec<&TextNode> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a TextNode>) {
            for n in nodes {
                match n {
                    Node::Text(t) => out.push(t),
                    Node::Group { nodes, .. } => walk(nodes, out),
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Text node drawn for element `id`.
    #[must_use]
    pub fn text_for(&self, id: &str) -> Option<&TextNode> {
        self.texts().into_iter().find(|t| t.element_id.as_deref() == Some(id))
    }
}

// =============================================================
// Field resolution
// =============================================================

/// Text shown by a text or label element. Images show none.
///
/// Design mode never reads the record and shows the placeholder; output
/// mode resolves overrides, then data, then the placeholder, then NBSP.
#[must_use]
pub fn display_text<'a>(el: &'a Element, record: Option<&'a CardRecord>, mode: RenderMode) -> Option<&'a str> {
    match &el.kind {
        ElementKind::Label(l) => Some(l.value.as_str()),
        ElementKind::Text(t) => Some(match mode {
            RenderMode::Design => t.placeholder.as_deref().filter(|p| !p.is_empty()).unwrap_or(NBSP),
            RenderMode::Output => resolve_field(record, t.binding.as_deref())
                .or(t.placeholder.as_deref())
                .unwrap_or(NBSP),
        }),
        ElementKind::Image(_) => None,
    }
}

/// Image source for an image element, if it has a non-empty resolved value.
#[must_use]
pub fn image_source<'a>(el: &'a Element, record: Option<&'a CardRecord>, mode: RenderMode) -> Option<&'a str> {
    match (&el.kind, mode) {
        (ElementKind::Image(i), RenderMode::Output) => {
            resolve_field(record, i.binding.as_deref()).filter(|v| !v.is_empty())
        }
        _ => None,
    }
}

fn resolve_field<'a>(record: Option<&'a CardRecord>, binding: Option<&str>) -> Option<&'a str> {
    record?.field(binding?)
}

// =============================================================
// Render
// =============================================================

/// Build the scene for `template` bound to `record`.
pub fn render<M: TextMeasurer>(
    template: &Template,
    record: Option<&CardRecord>,
    opts: &RenderOptions,
    overlay: &Overlay<'_>,
    measurer: &M,
    fits: &mut FitCache,
) -> Scene {
    let card = opts.surface.size_px();
    let design = opts.mode == RenderMode::Design;
    let mut nodes = Vec::new();

    background_nodes(template.background.as_ref(), card, &mut nodes);

    if let Some(wm) = &template.watermark {
        nodes.push(watermark_group(wm, card, opts, design && overlay.watermark_edit));
    }

    fits.retain_ids(template.elements.iter().map(|e| e.id.as_str()));
    for el in &template.elements {
        element_nodes(el, record, card, opts, measurer, fits, &mut nodes);
    }

    if design && !overlay.watermark_edit {
        chrome_nodes(template, overlay, card, &mut nodes);
    }
    if design && let Some(rect) = overlay.marquee {
        nodes.push(Node::Marquee { rect });
    }

    Scene { width: card.width, height: card.height, nodes }
}

fn background_nodes(background: Option<&Background>, card: Size, out: &mut Vec<Node>) {
    let rect = Rect::new(0.0, 0.0, card.width, card.height);
    match background {
        None => out.push(Node::Fill { rect, color: EMPTY_BACKGROUND.into() }),
        Some(Background::Solid { value }) => out.push(Node::Fill { rect, color: value.clone() }),
        Some(Background::Gradient { value, gradient_color2, gradient_direction }) => {
            let direction = gradient_direction.as_deref().filter(|d| !d.is_empty()).unwrap_or(DEFAULT_GRADIENT_DIRECTION);
            let end = gradient_color2.as_deref().filter(|c| !c.is_empty()).unwrap_or(value);
            let (from, to) = gradient_line(direction, rect);
            out.push(Node::Gradient { rect, from, to, start_color: value.clone(), end_color: end.to_owned() });
        }
        Some(Background::Image { value, .. }) => {
            out.push(Node::Fill { rect, color: EMPTY_BACKGROUND.into() });
            if !value.is_empty() {
                out.push(Node::Image { rect, src: value.clone(), fit: ImageFit::Cover, fallback_label: None });
            }
        }
    }
}

/// Endpoints of a CSS linear-gradient line across `rect`.
///
/// Accepts `to <side>`, `to <corner>` and `<n>deg`; anything else draws top
/// to bottom.
#[must_use]
pub fn gradient_line(direction: &str, rect: Rect) -> (Point, Point) {
    let (w, h) = (rect.width, rect.height);
    let (dx, dy) = gradient_vector(direction, w, h).unwrap_or((0.0, 1.0));
    let half = (w * dx.abs() + h * dy.abs()) / 2.0;
    let c = Point::new(rect.x + w / 2.0, rect.y + h / 2.0);
    (Point::new(c.x - dx * half, c.y - dy * half), Point::new(c.x + dx * half, c.y + dy * half))
}

/// Unit vector of the gradient line.
fn gradient_vector(direction: &str, w: f64, h: f64) -> Option<(f64, f64)> {
    let mut words = direction.split_whitespace();
    let first = words.next()?;
    if let Some(deg) = first.strip_suffix("deg") {
        let Ok(deg) = deg.parse::<f64>() else {
            return None;
        };
        let rad = deg.to_radians();
        return Some((rad.sin(), -rad.cos()));
    }
    if first != "to" {
        return None;
    }
    let (mut sx, mut sy) = (0i8, 0i8);
    for word in words {
        match word {
            "top" => sy = -1,
            "bottom" => sy = 1,
            "left" => sx = -1,
            "right" => sx = 1,
            _ => return None,
        }
    }
    // Corners point perpendicular to the diagonal through the other two
    // corners; sides reduce to the plain axis.
    let (vx, vy) = (f64::from(sx) * h, f64::from(sy) * w);
    let len = vx.hypot(vy);
    (len > 0.0).then(|| (vx / len, vy / len))
}

fn watermark_group(wm: &Watermark, card: Size, opts: &RenderOptions, editing: bool) -> Node {
    let rect = wm.resolve_box().pct_to_px(card);
    let mut nodes = Vec::new();
    match wm.kind {
        WatermarkKind::Text => {
            let font = FontSpec::new(opts.font_family.clone(), FontWeight::Normal);
            let size = wm.font_px();
            nodes.push(Node::Text(TextNode {
                rect,
                lines: vec![single_line(&wm.value)],
                font: font.css(size),
                size_px: size,
                line_height_px: size * LINE_HEIGHT_EM,
                color: DEFAULT_TEXT_COLOR.into(),
                anchor: TextAnchor::Center,
                inset: Point::new(0.0, 0.0),
                element_id: None,
            }));
        }
        WatermarkKind::Image => {
            if !wm.value.is_empty() {
                nodes.push(Node::Image { rect, src: wm.value.clone(), fit: ImageFit::Contain, fallback_label: None });
            }
        }
    }
    if editing {
        nodes.push(Node::Outline { rect, color: ACCENT.into(), line_width: 2.0, dashed: false });
        for handle in ResizeHandle::ALL {
            nodes.push(Node::Handle { rect: handle_rect(handle, rect), handle });
        }
    }
    Node::Group {
        alpha: wm.alpha(),
        rotation_deg: wm.rotation.unwrap_or(0.0),
        pivot: Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0),
        nodes,
    }
}

/// Collapse newlines so watermark text never wraps.
fn single_line(text: &str) -> String {
    text.split('\n').collect::<Vec<_>>().join(" ")
}

fn element_nodes<M: TextMeasurer>(
    el: &Element,
    record: Option<&CardRecord>,
    card: Size,
    opts: &RenderOptions,
    measurer: &M,
    fits: &mut FitCache,
    out: &mut Vec<Node>,
) {
    let rect = el.rect().pct_to_px(card);
    match &el.kind {
        ElementKind::Text(t) => {
            let text = display_text(el, record, opts.mode).unwrap_or(NBSP);
            out.push(Node::Text(text_node(el, text, &t.style, rect, opts, measurer, fits)));
        }
        ElementKind::Label(l) => {
            out.push(Node::Text(text_node(el, &l.value, &l.style, rect, opts, measurer, fits)));
        }
        ElementKind::Image(i) => {
            let label = i.placeholder.clone().unwrap_or_else(|| DEFAULT_IMAGE_LABEL.into());
            if let Some(src) = image_source(el, record, opts.mode) {
                out.push(Node::Image { rect, src: src.to_owned(), fit: ImageFit::Cover, fallback_label: Some(label) });
            } else {
                out.extend(image_placeholder(rect, &label, &opts.font_family));
            }
        }
    }
}

/// Grey block with a centered label, for images without a source.
#[must_use]
pub fn image_placeholder(rect: Rect, label: &str, family: &str) -> [Node; 2] {
    let size = IMAGE_PLACEHOLDER_FONT_PX;
    [
        Node::Fill { rect, color: PLACEHOLDER_FILL.into() },
        Node::Text(TextNode {
            rect,
            lines: vec![label.to_owned()],
            font: FontSpec::new(family, FontWeight::Normal).css(size),
            size_px: size,
            line_height_px: size * LINE_HEIGHT_EM,
            color: PLACEHOLDER_TEXT.into(),
            anchor: TextAnchor::Center,
            inset: Point::new(0.0, 0.0),
            element_id: None,
        }),
    ]
}

fn text_node<M: TextMeasurer>(
    el: &Element,
    text: &str,
    style: &TextStyle,
    rect: Rect,
    opts: &RenderOptions,
    measurer: &M,
    fits: &mut FitCache,
) -> TextNode {
    let family = style.font_family.clone().unwrap_or_else(|| opts.font_family.clone());
    let font = FontSpec::new(family, style.weight());
    let text = normalize_text(text);

    let (size, anchor, inset) = if style.is_auto() {
        let size = fits.size_for(measurer, &el.id, text, &font, el.rect().size(), rect.size());
        (size, TextAnchor::TopLeft, Point::new(size * HORIZONTAL_PADDING_EM, size * VERTICAL_PADDING_EM))
    } else {
        (style.manual_size(), TextAnchor::MiddleLeft, Point::new(0.0, 0.0))
    };

    let wrap_width = (rect.width - 2.0 * inset.x).max(1.0);
    let lines = match measurer.acquire(&font).and_then(|mut s| wrap_lines(&mut s, text, size, wrap_width)) {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!(error = %e, id = %el.id, "text wrap failed; drawing unwrapped");
            text.split('\n').map(str::to_owned).collect()
        }
    };

    TextNode {
        rect,
        lines,
        font: font.css(size),
        size_px: size,
        line_height_px: size * LINE_HEIGHT_EM,
        color: style.color().to_owned(),
        anchor,
        inset,
        element_id: Some(el.id.clone()),
    }
}

fn chrome_nodes(template: &Template, overlay: &Overlay<'_>, card: Size, out: &mut Vec<Node>) {
    let single = match overlay.selected {
        [only] => Some(only.as_str()),
        _ => None,
    };
    for el in &template.elements {
        let rect = el.rect().pct_to_px(card);
        let selected = overlay.selected.iter().any(|id| *id == el.id);
        out.push(if selected {
            Node::Outline { rect, color: ACCENT.into(), line_width: 2.0, dashed: false }
        } else {
            Node::Outline { rect, color: UNSELECTED_OUTLINE.into(), line_width: 1.0, dashed: true }
        });
    }
    if let Some(el) = single.and_then(|id| template.element(id)) {
        let rect = el.rect().pct_to_px(card);
        for handle in ResizeHandle::ALL {
            out.push(Node::Handle { rect: handle_rect(handle, rect), handle });
        }
    }
}
