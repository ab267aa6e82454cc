//! Input model: modifier keys, buttons, cursors, and the gesture state machine.
//!
//! This module defines the types consumed by the manipulation controller.
//! `Modifiers`, `Key` and `FocusTarget` capture the user's intent at the time
//! of an event. `InputState` is the active gesture being tracked between
//! pointer-down and pointer-up; each active variant owns the full context the
//! gesture needs, so there is exactly one copy of it.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::doc::ElementId;
use crate::geom::{Point, Rect, ResizeHandle, Size};

/// Host platform, which decides the copy/paste modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Command (meta) is the shortcut modifier.
    Mac,
    /// Ctrl is the shortcut modifier.
    #[default]
    Other,
}

/// Unrecognized platform name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform {0:?} (expected \"mac\" or \"other\")")]
pub struct ParsePlatformError(pub String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mac" | "macos" => Ok(Self::Mac),
            "other" | "windows" | "linux" => Ok(Self::Other),
            _ => Err(ParsePlatformError(s.to_owned())),
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether the platform's shortcut modifier is held.
    #[must_use]
    pub fn command(self, platform: Platform) -> bool {
        match platform {
            Platform::Mac => self.meta,
            Platform::Other => self.ctrl,
        }
    }

    /// Whether a click should toggle membership instead of replacing the
    /// selection. Either ctrl or meta counts on every platform.
    #[must_use]
    pub fn toggles_selection(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"c"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }

    /// Whether this is the single character `c`, exactly.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        let mut chars = self.0.chars();
        chars.next() == Some(c) && chars.next().is_none()
    }
}

/// Where keyboard focus is when a key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    /// The canvas or any non-editable element.
    #[default]
    Canvas,
    /// A text input, textarea or content-editable element.
    TextInput,
}

/// Root pointer cursor override for an active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cursor {
    Grabbing,
    NwseResize,
    NeswResize,
    Crosshair,
}

impl Cursor {
    /// CSS `cursor` keyword.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Grabbing => "grabbing",
            Self::NwseResize => "nwse-resize",
            Self::NeswResize => "nesw-resize",
            Self::Crosshair => "crosshair",
        }
    }

    /// Diagonal resize cursor matching `handle`.
    #[must_use]
    pub fn for_handle(handle: ResizeHandle) -> Self {
        match handle {
            ResizeHandle::Sw | ResizeHandle::Ne => Self::NeswResize,
            ResizeHandle::Nw | ResizeHandle::Se => Self::NwseResize,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

// =============================================================
// Gesture contexts
// =============================================================

/// Moving one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDrag {
    pub id: ElementId,
    /// Pointer position at press, screen pixels.
    pub start_px: Point,
    /// Element origin at press, percent.
    pub start_origin: Point,
    /// Card size at press, pixels.
    pub bounds: Size,
}

/// Resizing one element by a corner handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementResize {
    pub id: ElementId,
    pub handle: ResizeHandle,
    pub start_px: Point,
    /// Element box at press, percent.
    pub start_rect: Rect,
    pub bounds: Size,
}

/// Moving the watermark.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkDrag {
    pub start_px: Point,
    /// Effective watermark box at press, percent.
    pub start_box: Rect,
    pub bounds: Size,
}

/// Resizing the watermark by a corner handle.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkResize {
    pub handle: ResizeHandle,
    pub start_px: Point,
    pub start_box: Rect,
    pub bounds: Size,
}

/// Rubber-band selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Marquee {
    /// Pointer position at press, screen pixels.
    pub start: Point,
    /// Latest pointer position, screen pixels.
    pub current: Point,
    /// Card bounding box at press, screen pixels.
    pub card: Rect,
}

impl Marquee {
    /// The marquee in card pixels, for drawing.
    #[must_use]
    pub fn rect_px(&self) -> Rect {
        let o = self.card.origin();
        Rect::from_corners(self.start.sub(o), self.current.sub(o))
    }

    /// The marquee in card percent, for selection. `None` if the card had no
    /// area when the gesture started.
    #[must_use]
    pub fn rect_pct(&self) -> Option<Rect> {
        let size = self.card.size();
        if !size.is_positive() {
            return None;
        }
        let r = self.rect_px();
        Some(Rect::new(
            r.x / size.width * 100.0,
            r.y / size.height * 100.0,
            r.width / size.width * 100.0,
            r.height / size.height * 100.0,
        ))
    }
}

/// Internal state for the input state machine.
///
/// Each active variant carries the gesture context needed to compute deltas
/// and emit updates; there is at most one active gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    DraggingElement(ElementDrag),
    ResizingElement(ElementResize),
    DraggingWatermark(WatermarkDrag),
    ResizingWatermark(WatermarkResize),
    MarqueeSelecting(Marquee),
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Cursor to show while this gesture is active.
    #[must_use]
    pub fn cursor(&self) -> Option<Cursor> {
        match self {
            Self::Idle => None,
            Self::DraggingElement(_) | Self::DraggingWatermark(_) => Some(Cursor::Grabbing),
            Self::ResizingElement(r) => Some(Cursor::for_handle(r.handle)),
            Self::ResizingWatermark(r) => Some(Cursor::for_handle(r.handle)),
            Self::MarqueeSelecting(_) => Some(Cursor::Crosshair),
        }
    }

    /// Short gesture name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DraggingElement(_) => "dragging_element",
            Self::ResizingElement(_) => "resizing_element",
            Self::DraggingWatermark(_) => "dragging_watermark",
            Self::ResizingWatermark(_) => "resizing_watermark",
            Self::MarqueeSelecting(_) => "marquee_selecting",
        }
    }
}
