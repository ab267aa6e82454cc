//! Shared numeric constants for the canvas crate.

// ── Card surface ────────────────────────────────────────────────

/// Default physical card width (ISO/IEC 7810 ID-1), in millimetres.
pub const DEFAULT_CARD_WIDTH_MM: f64 = 85.6;

/// Default physical card height (ISO/IEC 7810 ID-1), in millimetres.
pub const DEFAULT_CARD_HEIGHT_MM: f64 = 53.98;

/// CSS pixels per millimetre at 96 dpi.
pub const CSS_PX_PER_MM: f64 = 96.0 / 25.4;

/// Fill used when a template has no background.
pub const EMPTY_BACKGROUND: &str = "#f5f5f5";

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height (percent of card) a resize may produce.
pub const MIN_BOX_PCT: f64 = 5.0;

/// Offset (percent of card) applied to pasted or duplicated elements.
pub const PASTE_OFFSET_PCT: f64 = 5.0;

/// Largest origin a pasted clone may land on.
pub const PASTE_MAX_ORIGIN_PCT: f64 = 95.0;

/// Side of a watermark box derived from a position preset.
pub const WATERMARK_DEFAULT_PCT: f64 = 30.0;

/// Inset of corner watermark presets from the card edges.
pub const WATERMARK_INSET_PCT: f64 = 5.0;

// ── Text fitting ────────────────────────────────────────────────

/// Smallest font size the fit search may return.
pub const MIN_FONT_PX: u32 = 6;

/// Largest font size the fit search may return.
pub const MAX_FONT_PX: u32 = 72;

/// Size returned when the fit box has no area.
pub const DEFAULT_FONT_PX: f64 = 12.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_EM: f64 = 1.2;

/// Top and bottom padding around fitted text.
pub const VERTICAL_PADDING_EM: f64 = 0.3;

/// Left and right padding around fitted text.
pub const HORIZONTAL_PADDING_EM: f64 = 0.5;

/// Width reserved so sub-pixel rounding never clips the right edge.
pub const WIDTH_BUFFER_PX: f64 = 4.0;

/// Height reserved so sub-pixel rounding never clips the bottom edge.
pub const HEIGHT_BUFFER_PX: f64 = 2.0;

/// Slack under which a rendered text box counts as filling its container.
pub const REFIT_TOLERANCE_PX: f64 = 2.0;

/// Stand-in measured for empty or whitespace-only text.
pub const NBSP: &str = "\u{00A0}";

/// Default watermark text size.
pub const WATERMARK_FONT_PX: f64 = 14.0;

/// Label size inside an empty image placeholder.
pub const IMAGE_PLACEHOLDER_FONT_PX: f64 = 10.0;

// ── Hit-testing and chrome ──────────────────────────────────────

/// Side of a square resize handle, in screen pixels.
pub const HANDLE_SIZE_PX: f64 = 12.0;

/// How far a handle sticks out past the corner it sits on.
pub const HANDLE_OUTSET_PX: f64 = 4.0;

/// Accent colour for selection outlines, handles and the marquee.
pub const ACCENT: &str = "#6750A4";
