//! Text measurement surfaces.
//!
//! The fit engine never measures text itself. It asks a [`TextMeasurer`] for
//! a transient [`MeasureSurface`] configured for one font, measures through
//! it, and drops it. Dropping the surface is what releases it, so every exit
//! path (including `?` on a failed measurement) cleans up.
//!
//! Three backends ship with the crate:
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`HeuristicMeasurer`] | Deterministic fixed-advance estimate; tests and headless layout |
//! | [`GlyphMeasurer`] | Real glyph advances from TrueType/OpenType data via `ab_glyph` |
//! | [`CanvasMeasurer`] | The browser's own `measureText` on a 2D canvas context |

#[cfg(test)]
#[path = "measure_test.rs"]
mod measure_test;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use web_sys::CanvasRenderingContext2d;

use crate::consts::LINE_HEIGHT_EM;
use crate::doc::FontWeight;

/// Failure to create or use a measurement surface.
#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    #[error("invalid font data: {0}")]
    InvalidFont(String),
    #[error("measurement surface unavailable: {0}")]
    Unavailable(String),
    #[error("text measurement failed: {0}")]
    Failed(String),
}

/// Font settings a surface is configured with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub family: String,
    pub weight: FontWeight,
}

impl FontSpec {
    #[must_use]
    pub fn new(family: impl Into<String>, weight: FontWeight) -> Self {
        Self { family: family.into(), weight }
    }

    /// CSS `font` shorthand at `size_px`.
    #[must_use]
    pub fn css(&self, size_px: f64) -> String {
        format!("{} {size_px}px {}", self.weight.as_css(), self.family)
    }
}

/// Source of transient measurement surfaces.
pub trait TextMeasurer {
    type Surface<'a>: MeasureSurface
    where
        Self: 'a;

    /// Acquire a surface for `font`. The surface is released when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError`] when no surface can be created.
    fn acquire(&self, font: &FontSpec) -> Result<Self::Surface<'_>, MeasureError>;
}

/// A live measurement surface.
pub trait MeasureSurface {
    /// Advance width of `text` on a single unwrapped line at `size_px`.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::Failed`] when the backend cannot measure.
    fn line_width(&mut self, text: &str, size_px: f64) -> Result<f64, MeasureError>;
}

/// Height of `lines` lines of text at `size_px`.
#[must_use]
pub fn block_height(lines: usize, size_px: f64) -> f64 {
    lines as f64 * size_px * LINE_HEIGHT_EM
}

/// Break `text` into lines no wider than `max_width`, the way a
/// `white-space: pre-wrap; overflow-wrap: normal` block does: explicit
/// newlines always break, lines otherwise break only at whitespace, and a
/// word wider than `max_width` overflows on a line of its own rather than
/// being split.
///
/// Whitespace is kept as written, so leading spaces and tabs take up width.
/// Whitespace at a soft break hangs off the end of the line and is dropped.
///
/// # Errors
///
/// Propagates the first measurement failure.
pub fn wrap_lines<S: MeasureSurface + ?Sized>(
    surface: &mut S,
    text: &str,
    size_px: f64,
    max_width: f64,
) -> Result<Vec<String>, MeasureError> {
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for segment in word_segments(paragraph) {
            if current.is_empty() || segment.trim().is_empty() {
                current.push_str(segment);
                continue;
            }
            let candidate = format!("{current}{segment}");
            if surface.line_width(&candidate, size_px)? <= max_width {
                current = candidate;
            } else {
                out.push(std::mem::replace(&mut current, segment.trim_start().to_owned()));
            }
        }
        out.push(current);
    }
    Ok(out)
}

/// Split `line` into pieces that each carry the whitespace run in front of
/// a word. Only the first piece can start with a word.
fn word_segments(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_ws = true;
    for (i, c) in line.char_indices() {
        let ws = c.is_whitespace();
        if ws && !prev_ws {
            out.push(&line[start..i]);
            start = i;
        }
        prev_ws = ws;
    }
    if start < line.len() {
        out.push(&line[start..]);
    }
    out
}

// =============================================================
// Heuristic backend
// =============================================================

/// Fixed-advance estimate: every character is `advance_em` wide, scaled by
/// `bold_scale` for bold text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicMeasurer {
    pub advance_em: f64,
    pub bold_scale: f64,
}

impl Default for HeuristicMeasurer {
    fn default() -> Self {
        Self { advance_em: 0.6, bold_scale: 1.1 }
    }
}

impl TextMeasurer for HeuristicMeasurer {
    type Surface<'a> = HeuristicSurface;

    fn acquire(&self, font: &FontSpec) -> Result<HeuristicSurface, MeasureError> {
        let scale = match font.weight {
            FontWeight::Normal => 1.0,
            FontWeight::Bold => self.bold_scale,
        };
        Ok(HeuristicSurface { advance_em: self.advance_em * scale })
    }
}

#[derive(Debug)]
pub struct HeuristicSurface {
    advance_em: f64,
}

impl MeasureSurface for HeuristicSurface {
    fn line_width(&mut self, text: &str, size_px: f64) -> Result<f64, MeasureError> {
        Ok(text.chars().count() as f64 * self.advance_em * size_px)
    }
}

// =============================================================
// Glyph backend
// =============================================================

/// Measures with real glyph advances and kerning from font files.
///
/// Only one family is loaded; `FontSpec::family` is ignored and bold falls
/// back to the regular face when no bold data is supplied.
#[derive(Clone)]
pub struct GlyphMeasurer {
    regular: FontArc,
    bold: Option<FontArc>,
}

impl std::fmt::Debug for GlyphMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphMeasurer").field("has_bold", &self.bold.is_some()).finish()
    }
}

impl GlyphMeasurer {
    /// Load a regular face and an optional bold face.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidFont`] if either blob fails to parse.
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> Result<Self, MeasureError> {
        let regular = FontArc::try_from_vec(regular).map_err(|e| MeasureError::InvalidFont(e.to_string()))?;
        let bold = bold
            .map(|b| FontArc::try_from_vec(b).map_err(|e| MeasureError::InvalidFont(e.to_string())))
            .transpose()?;
        Ok(Self { regular, bold })
    }
}

impl TextMeasurer for GlyphMeasurer {
    type Surface<'a> = GlyphSurface<'a>;

    fn acquire(&self, font: &FontSpec) -> Result<GlyphSurface<'_>, MeasureError> {
        let face = match (font.weight, &self.bold) {
            (FontWeight::Bold, Some(bold)) => bold,
            _ => &self.regular,
        };
        Ok(GlyphSurface { face })
    }
}

pub struct GlyphSurface<'a> {
    face: &'a FontArc,
}

impl MeasureSurface for GlyphSurface<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn line_width(&mut self, text: &str, size_px: f64) -> Result<f64, MeasureError> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(MeasureError::Failed(format!("invalid font size {size_px}")));
        }
        let scaled = self.face.as_scaled(PxScale::from(size_px as f32));
        let mut width = 0.0f32;
        let mut prev = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        Ok(f64::from(width))
    }
}

// =============================================================
// Browser backend
// =============================================================

/// Measures with the browser's text engine through a 2D canvas context.
///
/// Acquiring saves the context state and releasing restores it, so the
/// host's own font settings survive any number of fits.
#[derive(Debug, Clone)]
pub struct CanvasMeasurer {
    ctx: CanvasRenderingContext2d,
}

impl CanvasMeasurer {
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl TextMeasurer for CanvasMeasurer {
    type Surface<'a> = CanvasSurface<'a>;

    fn acquire(&self, font: &FontSpec) -> Result<CanvasSurface<'_>, MeasureError> {
        self.ctx.save();
        Ok(CanvasSurface { ctx: &self.ctx, font: font.clone() })
    }
}

pub struct CanvasSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    font: FontSpec,
}

impl MeasureSurface for CanvasSurface<'_> {
    fn line_width(&mut self, text: &str, size_px: f64) -> Result<f64, MeasureError> {
        self.ctx.set_font(&self.font.css(size_px));
        let metrics = self
            .ctx
            .measure_text(text)
            .map_err(|e| MeasureError::Failed(format!("{e:?}")))?;
        Ok(metrics.width())
    }
}

impl Drop for CanvasSurface<'_> {
    fn drop(&mut self) {
        self.ctx.restore();
    }
}
