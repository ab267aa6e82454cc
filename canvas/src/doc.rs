//! Document model: templates, their elements, background and watermark, and
//! the data records bound into them.
//!
//! These types double as the persistence contract: they serialize to the same
//! camelCase JSON shape the storage and CSV-mapping layers exchange, with a
//! `"type"` discriminator on elements, backgrounds and watermarks.
//!
//! Geometry is always in percent of the card (see [`crate::geom`]). A
//! template is only changed through [`Template::apply_patch`] and the
//! element-list operations on [`crate::session::Session`], each of which
//! replaces whole elements rather than editing fields in place.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{DEFAULT_FONT_PX, WATERMARK_DEFAULT_PCT, WATERMARK_FONT_PX, WATERMARK_INSET_PCT};
use crate::geom::{Rect, sanitize_pct};

/// Unique, stable identifier of an element.
pub type ElementId = String;

/// Binding keys offered for every template, before the template's own.
pub const COMMON_BINDINGS: [&str; 7] = ["name", "id", "photo", "department", "company", "course", "date"];

/// Generate a fresh element id.
#[must_use]
pub fn new_element_id() -> ElementId {
    format!("el-{}", Uuid::new_v4().simple())
}

// =============================================================
// Text styling
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    /// CSS keyword for this weight.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bold => "bold",
        }
    }
}

/// Styling shared by text and label elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Compute the size at render time. Absent means auto.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_auto: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl TextStyle {
    /// Style used by newly added text and label elements.
    #[must_use]
    pub fn auto_default() -> Self {
        Self {
            font_size: Some(DEFAULT_FONT_PX),
            font_size_auto: Some(true),
            font_weight: Some(FontWeight::Normal),
            color: Some("#000".into()),
            font_family: None,
        }
    }

    /// Whether the effective size is computed by the fit engine.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.font_size_auto != Some(false)
    }

    /// The stored size used when auto-fit is off.
    #[must_use]
    pub fn manual_size(&self) -> f64 {
        self.font_size.unwrap_or(DEFAULT_FONT_PX)
    }

    #[must_use]
    pub fn weight(&self) -> FontWeight {
        self.font_weight.unwrap_or_default()
    }

    #[must_use]
    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or("#000")
    }
}

// =============================================================
// Elements
// =============================================================

/// Data-bound text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(flatten)]
    pub style: TextStyle,
}

/// Data-bound image (photo, logo).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Static text that never reads a record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelContent {
    #[serde(default)]
    pub value: String,
    #[serde(flatten)]
    pub style: TextStyle,
}

/// What an element shows. Adding a variant forces every render and update
/// site to handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextContent),
    Image(ImageContent),
    Label(LabelContent),
}

/// The kind of element to create with [`crate::session::Session::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Text,
    Image,
    Label,
}

/// One positioned, sized unit on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    /// Left edge, percent of card width.
    pub x: f64,
    /// Top edge, percent of card height.
    pub y: f64,
    /// Width, percent of card width.
    pub width: f64,
    /// Height, percent of card height.
    pub height: f64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// A new element of `ty` with a fresh id and the editor's default box.
    #[must_use]
    pub fn with_defaults(ty: ElementType) -> Self {
        let (width, height, kind) = match ty {
            ElementType::Text => (
                40.0,
                15.0,
                ElementKind::Text(TextContent {
                    binding: Some("name".into()),
                    placeholder: Some("Text".into()),
                    style: TextStyle::auto_default(),
                }),
            ),
            ElementType::Image => (
                35.0,
                45.0,
                ElementKind::Image(ImageContent { binding: Some("photo".into()), placeholder: Some("Photo".into()) }),
            ),
            ElementType::Label => (
                40.0,
                12.0,
                ElementKind::Label(LabelContent { value: "Label".into(), style: TextStyle::auto_default() }),
            ),
        };
        Self { id: new_element_id(), x: 10.0, y: 10.0, width, height, kind }
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self.kind {
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Image(_) => ElementType::Image,
            ElementKind::Label(_) => ElementType::Label,
        }
    }

    /// The element's box in percent.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Data-field key this element displays, if any. Labels never bind.
    #[must_use]
    pub fn binding(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text(t) => t.binding.as_deref(),
            ElementKind::Image(i) => i.binding.as_deref(),
            ElementKind::Label(_) => None,
        }
    }

    /// Text styling, for the kinds that render text.
    #[must_use]
    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.kind {
            ElementKind::Text(t) => Some(&t.style),
            ElementKind::Label(l) => Some(&l.style),
            ElementKind::Image(_) => None,
        }
    }

    /// A copy with a fresh id, shifted by `offset` and capped at `max_origin`.
    #[must_use]
    pub fn cloned_offset(&self, offset: f64, max_origin: f64) -> Self {
        Self {
            id: new_element_id(),
            x: (self.x + offset).min(max_origin),
            y: (self.y + offset).min(max_origin),
            ..self.clone()
        }
    }
}

/// Sparse update for an element. Only present fields are applied; fields
/// that do not exist on the element's kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// `Some(None)` clears the binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_auto: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl ElementPatch {
    /// Patch moving an element's origin.
    #[must_use]
    pub fn origin(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// Patch replacing an element's whole box.
    #[must_use]
    pub fn rect(r: Rect) -> Self {
        Self { x: Some(r.x), y: Some(r.y), width: Some(r.width), height: Some(r.height), ..Default::default() }
    }

    /// This patch with every geometry field it sets replaced by `el`'s value.
    #[must_use]
    pub fn with_geometry_of(&self, el: &Element) -> Self {
        Self {
            x: self.x.map(|_| el.x),
            y: self.y.map(|_| el.y),
            width: self.width.map(|_| el.width),
            height: self.height.map(|_| el.height),
            ..self.clone()
        }
    }

    /// Return `el` with this patch applied. Geometry is clamped into the
    /// valid range; NaN falls back to the range floor.
    #[must_use]
    pub fn applied_to(&self, el: &Element) -> Element {
        let mut out = el.clone();
        if let Some(x) = self.x {
            out.x = sanitize_pct(x, 0.0, 0.0);
        }
        if let Some(y) = self.y {
            out.y = sanitize_pct(y, 0.0, 0.0);
        }
        if let Some(w) = self.width {
            out.width = sanitize_pct(w, 1.0, 1.0);
        }
        if let Some(h) = self.height {
            out.height = sanitize_pct(h, 1.0, 1.0);
        }

        match &mut out.kind {
            ElementKind::Text(t) => {
                if let Some(b) = &self.binding {
                    t.binding.clone_from(b);
                }
                if let Some(p) = &self.placeholder {
                    t.placeholder = Some(p.clone());
                }
                self.apply_style(&mut t.style);
            }
            ElementKind::Image(i) => {
                if let Some(b) = &self.binding {
                    i.binding.clone_from(b);
                }
                if let Some(p) = &self.placeholder {
                    i.placeholder = Some(p.clone());
                }
            }
            ElementKind::Label(l) => {
                if let Some(v) = &self.value {
                    l.value.clone_from(v);
                }
                self.apply_style(&mut l.style);
            }
        }
        out
    }

    fn apply_style(&self, style: &mut TextStyle) {
        if let Some(size) = self.font_size {
            style.font_size = Some(if size.is_nan() { DEFAULT_FONT_PX } else { size.clamp(1.0, 999.0) });
        }
        if let Some(auto) = self.font_size_auto {
            style.font_size_auto = Some(auto);
        }
        if let Some(w) = self.font_weight {
            style.font_weight = Some(w);
        }
        if let Some(c) = &self.color {
            style.color = Some(c.clone());
        }
        if let Some(f) = &self.font_family {
            style.font_family = Some(f.clone());
        }
    }
}

// =============================================================
// Background
// =============================================================

/// Card background fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Background {
    Solid {
        value: String,
    },
    Gradient {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gradient_color2: Option<String>,
        /// CSS direction, e.g. `"to bottom"`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gradient_direction: Option<String>,
    },
    Image {
        /// URL or data URI.
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_file_name: Option<String>,
    },
}

// =============================================================
// Watermark
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    Text,
    Image,
}

/// Named placement used until the watermark is dragged or resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl WatermarkPosition {
    /// Default-size box for this preset.
    #[must_use]
    pub fn preset_box(self) -> Rect {
        let size = WATERMARK_DEFAULT_PCT;
        let near = WATERMARK_INSET_PCT;
        let far = 100.0 - WATERMARK_INSET_PCT - size;
        let (x, y) = match self {
            Self::Center => (50.0 - size / 2.0, 50.0 - size / 2.0),
            Self::TopLeft => (near, near),
            Self::TopRight => (far, near),
            Self::BottomLeft => (near, far),
            Self::BottomRight => (far, far),
        };
        Rect::new(x, y, size, size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watermark {
    #[serde(rename = "type")]
    pub kind: WatermarkKind,
    /// Text content, or image URL / data URI.
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file_name: Option<String>,
    /// `0.0..=1.0`.
    pub opacity: f64,
    #[serde(default)]
    pub position: WatermarkPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Degrees, clockwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl Watermark {
    /// Effective box in percent.
    ///
    /// Explicit geometry wins when all four fields are present with a
    /// positive size; otherwise the position preset decides.
    #[must_use]
    pub fn resolve_box(&self) -> Rect {
        match (self.x, self.y, self.width, self.height) {
            (Some(x), Some(y), Some(w), Some(h)) if w > 0.0 && h > 0.0 => Rect::new(x, y, w, h),
            _ => self.position.preset_box(),
        }
    }

    /// A copy pinned to an explicit box.
    #[must_use]
    pub fn with_box(&self, r: Rect) -> Self {
        Self { x: Some(r.x), y: Some(r.y), width: Some(r.width), height: Some(r.height), ..self.clone() }
    }

    #[must_use]
    pub fn font_px(&self) -> f64 {
        self.font_size.unwrap_or(WATERMARK_FONT_PX)
    }

    /// Opacity clamped into `0..=1`; NaN renders invisible.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        if self.opacity.is_nan() { 0.0 } else { self.opacity.clamp(0.0, 1.0) }
    }
}

// =============================================================
// Template
// =============================================================

/// A reusable card design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    /// Draw order: later elements paint over earlier ones.
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub background: Option<Background>,
    #[serde(default)]
    pub watermark: Option<Watermark>,
}

impl Template {
    /// An empty design with no background or watermark.
    #[must_use]
    pub fn blank() -> Self {
        Self { id: "blank".into(), name: "Blank".into(), elements: Vec::new(), background: None, watermark: None }
    }

    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Replace element `id` with a patched copy. Returns false if it doesn't
    /// exist.
    pub fn apply_patch(&mut self, id: &str, patch: &ElementPatch) -> bool {
        let Some(slot) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        *slot = patch.applied_to(slot);
        true
    }

    /// A copy whose elements all carry fresh ids.
    #[must_use]
    pub fn reidentified(&self) -> Self {
        let elements = self
            .elements
            .iter()
            .map(|e| Element { id: new_element_id(), ..e.clone() })
            .collect();
        Self { elements, ..self.clone() }
    }

    /// Common binding keys followed by those the template uses, without
    /// duplicates, in first-seen order.
    #[must_use]
    pub fn available_bindings(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |key: &str| {
            if !key.is_empty() && !out.iter().any(|k| k == key) {
                out.push(key.to_owned());
            }
        };
        for key in COMMON_BINDINGS {
            push(key);
        }
        for key in self.elements.iter().filter_map(Element::binding) {
            push(key);
        }
        out
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::blank()
    }
}

// =============================================================
// Records
// =============================================================

/// One data row plus manual per-field overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    #[serde(default)]
    pub data: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub overrides: BTreeMap<String, Option<String>>,
}

impl CardRecord {
    /// Displayed value for `binding`: a non-null override wins over data.
    #[must_use]
    pub fn field(&self, binding: &str) -> Option<&str> {
        self.overrides
            .get(binding)
            .and_then(Option::as_deref)
            .or_else(|| self.data.get(binding).and_then(Option::as_deref))
    }

    /// A copy with `field` overridden (`Some`) or reset to data (`None`).
    #[must_use]
    pub fn with_override(&self, field: &str, value: Option<String>) -> Self {
        let mut out = self.clone();
        out.overrides.insert(field.to_owned(), value);
        out
    }
}
