//! Auto-fit text sizing.
//!
//! [`fit`] binary-searches the largest integer font size at which a piece of
//! text fits a pixel box: its longest unbreakable token must fit the padded
//! width on one line, and the whole text, wrapped at that width without ever
//! splitting a word, must fit the padded height. Small safety buffers absorb
//! the sub-pixel rounding a real layout engine applies after measurement.
//!
//! [`FitState`] wraps the search for an element that is rendered repeatedly.
//! It only refits when the text, font, authored box or container size
//! changes, and allows exactly one corrective refit per change when the host
//! reports that the rendered text box came out smaller than expected.

#[cfg(test)]
#[path = "fit_test.rs"]
mod fit_test;

use std::collections::HashMap;

use crate::consts::{
    DEFAULT_FONT_PX, HEIGHT_BUFFER_PX, HORIZONTAL_PADDING_EM, MAX_FONT_PX, MIN_FONT_PX, NBSP, REFIT_TOLERANCE_PX,
    VERTICAL_PADDING_EM, WIDTH_BUFFER_PX,
};
use crate::doc::ElementId;
use crate::geom::Size;
use crate::measure::{FontSpec, MeasureError, MeasureSurface, TextMeasurer, block_height, wrap_lines};

/// Text as it is measured and drawn: trimmed, with empty input replaced by a
/// non-breaking space so it never collapses to nothing.
#[must_use]
pub fn normalize_text(text: &str) -> &str {
    let t = text.trim();
    if t.is_empty() { NBSP } else { t }
}

/// The longest line or whitespace-delimited word of `text`, by character
/// count. This is the run that must fit the box width unbroken.
#[must_use]
pub fn longest_token(text: &str) -> &str {
    let mut longest = "";
    let mut longest_len = 0;
    for line in normalize_text(text).split('\n') {
        for candidate in line.split_whitespace().chain(std::iter::once(line)) {
            let len = candidate.chars().count();
            if len > longest_len {
                longest = candidate;
                longest_len = len;
            }
        }
    }
    if longest.is_empty() { NBSP } else { longest }
}

/// Content box available at font size `size` inside `container`, after the
/// em-based padding and the rounding buffers.
#[must_use]
pub fn content_box(container: Size, size: f64) -> Size {
    let h_pad = size * HORIZONTAL_PADDING_EM;
    let v_pad = size * VERTICAL_PADDING_EM;
    Size::new(
        (container.width - 2.0 * h_pad).floor() - WIDTH_BUFFER_PX,
        (container.height - 2.0 * v_pad).floor() - HEIGHT_BUFFER_PX,
    )
}

/// Largest font size in `6..=min(72, floor(height))` px at which `text`
/// fits `container` without breaking a word.
///
/// Deterministic for fixed inputs. The measurement surface is acquired and
/// released within the call. A box without area yields the 12px default, a
/// box in which nothing fits yields 6px, and a measurement failure degrades
/// to 6px instead of failing the render.
#[must_use]
pub fn fit<M: TextMeasurer>(measurer: &M, text: &str, container: Size, font: &FontSpec) -> f64 {
    if !container.is_positive() {
        return DEFAULT_FONT_PX;
    }
    match search(measurer, text, container, font) {
        Ok(size) => f64::from(size),
        Err(e) => {
            tracing::warn!(error = %e, family = %font.family, "text fit failed; using minimum size");
            f64::from(MIN_FONT_PX)
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn search<M: TextMeasurer>(measurer: &M, text: &str, container: Size, font: &FontSpec) -> Result<u32, MeasureError> {
    let text = normalize_text(text);
    let token = longest_token(text);

    let height_cap = container.height.floor().clamp(0.0, f64::from(MAX_FONT_PX)) as u32;
    let mut low = MIN_FONT_PX;
    let mut high = MAX_FONT_PX.min(height_cap);
    let mut best = MIN_FONT_PX;

    let mut surface = measurer.acquire(font)?;
    while low <= high {
        let mid = (low + high) / 2;
        if fits_at(&mut surface, text, token, container, f64::from(mid))? {
            best = mid;
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }
    Ok(best)
}

fn fits_at<S: MeasureSurface>(
    surface: &mut S,
    text: &str,
    token: &str,
    container: Size,
    size: f64,
) -> Result<bool, MeasureError> {
    let avail = content_box(container, size);

    let token_width = surface.line_width(token, size)?;
    let fits_width = avail.width >= 1.0 && token_width <= avail.width;

    let lines = wrap_lines(surface, text, size, avail.width.max(1.0))?;
    let text_height = block_height(lines.len(), size);
    let fits_height = text_height <= avail.height;

    tracing::trace!(size, token_width, text_height, avail_w = avail.width, avail_h = avail.height, "fit step");
    Ok(fits_width && fits_height)
}

// =============================================================
// Incremental fitting
// =============================================================

/// Everything a fit result depends on.
#[derive(Debug, Clone, PartialEq)]
struct FitKey {
    text: String,
    font: FontSpec,
    box_pct: Size,
    container: Size,
}

/// Fit result for one rendered element, refreshed only on change.
#[derive(Debug, Clone)]
pub struct FitState {
    key: Option<FitKey>,
    size: f64,
    corrected: bool,
}

impl Default for FitState {
    fn default() -> Self {
        Self { key: None, size: DEFAULT_FONT_PX, corrected: false }
    }
}

impl FitState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent fitted size.
    #[must_use]
    pub fn font_size(&self) -> f64 {
        self.size
    }

    /// Whether the corrective pass for the current inputs has been spent.
    #[must_use]
    pub fn corrected(&self) -> bool {
        self.corrected
    }

    /// Refit if the text, font, authored box (percent) or container size
    /// (pixels) changed since the last call; otherwise return the cached size.
    /// A container without area keeps the previous size until it is laid out.
    pub fn update<M: TextMeasurer>(
        &mut self,
        measurer: &M,
        text: &str,
        font: &FontSpec,
        box_pct: Size,
        container: Size,
    ) -> f64 {
        if !container.is_positive() {
            return self.size;
        }
        let key = FitKey { text: text.to_owned(), font: font.clone(), box_pct, container };
        if self.key.as_ref() == Some(&key) {
            return self.size;
        }
        self.size = fit(measurer, text, container, font);
        self.corrected = false;
        self.key = Some(key);
        self.size
    }

    /// Report the box the text actually rendered into.
    ///
    /// When it is more than 2px smaller than the container in either
    /// dimension, the rendered box becomes the fit target and the size is
    /// recomputed once. Further reports are ignored until the next change.
    pub fn observe_rendered<M: TextMeasurer>(&mut self, measurer: &M, rendered: Size) -> Option<f64> {
        if self.corrected || !rendered.is_positive() {
            return None;
        }
        let key = self.key.as_ref()?;
        let undersized = rendered.width < key.container.width - REFIT_TOLERANCE_PX
            || rendered.height < key.container.height - REFIT_TOLERANCE_PX;
        if !undersized {
            return None;
        }
        self.corrected = true;
        self.size = fit(measurer, &key.text, rendered, &key.font);
        tracing::debug!(size = self.size, width = rendered.width, height = rendered.height, "corrective refit");
        Some(self.size)
    }
}

/// Per-element [`FitState`]s for a live canvas.
#[derive(Debug, Default, Clone)]
pub struct FitCache {
    states: HashMap<ElementId, FitState>,
}

impl FitCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted size for element `id`, refitting only if its inputs changed.
    pub fn size_for<M: TextMeasurer>(
        &mut self,
        measurer: &M,
        id: &str,
        text: &str,
        font: &FontSpec,
        box_pct: Size,
        container: Size,
    ) -> f64 {
        self.states
            .entry(id.to_owned())
            .or_default()
            .update(measurer, text, font, box_pct, container)
    }

    /// Forward a rendered-box report to element `id`.
    pub fn observe_rendered<M: TextMeasurer>(&mut self, measurer: &M, id: &str, rendered: Size) -> Option<f64> {
        self.states.get_mut(id)?.observe_rendered(measurer, rendered)
    }

    /// Forget elements that no longer exist.
    pub fn retain_ids<'a>(&mut self, live: impl IntoIterator<Item = &'a str>) {
        let live: std::collections::HashSet<&str> = live.into_iter().collect();
        self.states.retain(|id, _| live.contains(id.as_str()));
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FitState> {
        self.states.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
