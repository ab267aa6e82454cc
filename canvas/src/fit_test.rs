#![allow(clippy::float_cmp)]

use std::cell::Cell;

use super::*;
use crate::doc::FontWeight;
use crate::measure::{HeuristicMeasurer, HeuristicSurface};

// =============================================================
// Helpers
// =============================================================

fn font() -> FontSpec {
    FontSpec::new("sans-serif", FontWeight::Normal)
}

/// Heuristic measurer that counts surface acquisitions and releases and can
/// be told to fail every measurement.
#[derive(Default)]
struct Counting {
    acquired: Cell<usize>,
    released: Cell<usize>,
    fail: bool,
}

struct CountingSurface<'a> {
    owner: &'a Counting,
    inner: HeuristicSurface,
}

impl TextMeasurer for Counting {
    type Surface<'a> = CountingSurface<'a>;

    fn acquire(&self, font: &FontSpec) -> Result<CountingSurface<'_>, MeasureError> {
        self.acquired.set(self.acquired.get() + 1);
        Ok(CountingSurface { owner: self, inner: HeuristicMeasurer::default().acquire(font)? })
    }
}

impl MeasureSurface for CountingSurface<'_> {
    fn line_width(&mut self, text: &str, size_px: f64) -> Result<f64, MeasureError> {
        if self.owner.fail {
            return Err(MeasureError::Failed("boom".into()));
        }
        self.inner.line_width(text, size_px)
    }
}

impl Drop for CountingSurface<'_> {
    fn drop(&mut self) {
        self.owner.released.set(self.owner.released.get() + 1);
    }
}

// =============================================================
// Token helpers
// =============================================================

#[test]
fn normalize_trims_and_substitutes_nbsp() {
    assert_eq!(normalize_text("  Ann  "), "Ann");
    assert_eq!(normalize_text(" \n "), NBSP);
    assert_eq!(normalize_text(""), NBSP);
}

#[test]
fn longest_token_prefers_longer_word_over_shorter_line() {
    assert_eq!(longest_token("Ann Lee\nAlexander"), "Alexander");
}

#[test]
fn longest_token_includes_whole_lines() {
    assert_eq!(longest_token("a bb\nccc"), "a bb");
}

#[test]
fn longest_token_counts_chars() {
    assert_eq!(longest_token("ÄÄÄ\nabcd"), "abcd");
}

#[test]
fn longest_token_of_blank_is_nbsp() {
    assert_eq!(longest_token("   "), NBSP);
}

#[test]
fn content_box_subtracts_padding_and_buffers() {
    let b = content_box(Size::new(100.0, 40.0), 10.0);
    // 100 - 2*5 - 4, floor(40 - 2*3) - 2
    assert_eq!(b, Size::new(86.0, 32.0));
}

// =============================================================
// fit
// =============================================================

#[test]
fn long_word_shrinks_below_overflowing_size() {
    let m = HeuristicMeasurer::default();
    let container = Size::new(100.0, 40.0);
    // At 20px "Alexander" is 108px wide against 76px of content width.
    let size = fit(&m, "Alexander", container, &font());
    assert!(size < 20.0, "got {size}");
    assert!(size >= 6.0);

    let mut s = m.acquire(&font()).unwrap();
    let token_width = s.line_width("Alexander", size).unwrap();
    assert!(token_width <= content_box(container, size).width);
}

#[test]
fn fitted_size_is_maximal() {
    let m = HeuristicMeasurer::default();
    let container = Size::new(100.0, 40.0);
    let size = fit(&m, "Alexander", container, &font());
    let next = size + 1.0;
    let mut s = m.acquire(&font()).unwrap();
    let avail = content_box(container, next);
    let too_wide = s.line_width("Alexander", next).unwrap() > avail.width;
    let too_tall = block_height(1, next) > avail.height;
    assert!(too_wide || too_tall);
}

#[test]
fn fit_is_idempotent() {
    let m = HeuristicMeasurer::default();
    let c = Size::new(180.0, 60.0);
    let a = fit(&m, "Jane Q. Public", c, &font());
    let b = fit(&m, "Jane Q. Public", c, &font());
    assert_eq!(a, b);
}

#[test]
fn empty_text_still_gets_a_size() {
    let m = HeuristicMeasurer::default();
    let size = fit(&m, "", Size::new(100.0, 40.0), &font());
    assert!(size >= 6.0);
}

#[test]
fn short_text_in_huge_box_caps_at_max() {
    let m = HeuristicMeasurer::default();
    assert_eq!(fit(&m, "A", Size::new(1000.0, 1000.0), &font()), 72.0);
}

#[test]
fn size_never_exceeds_box_height() {
    let m = HeuristicMeasurer::default();
    let size = fit(&m, "A", Size::new(1000.0, 30.0), &font());
    assert!(size <= 30.0);
}

#[test]
fn nothing_fits_yields_minimum() {
    let m = HeuristicMeasurer::default();
    assert_eq!(fit(&m, "A", Size::new(500.0, 10.0), &font()), 6.0);
    assert_eq!(fit(&m, "A", Size::new(500.0, 3.0), &font()), 6.0);
}

#[test]
fn zero_area_box_yields_default() {
    let m = Counting::default();
    assert_eq!(fit(&m, "Ann", Size::new(0.0, 40.0), &font()), 12.0);
    assert_eq!(fit(&m, "Ann", Size::new(40.0, -1.0), &font()), 12.0);
    assert_eq!(m.acquired.get(), 0);
}

#[test]
fn more_lines_need_smaller_size() {
    let m = HeuristicMeasurer::default();
    let c = Size::new(200.0, 60.0);
    let one = fit(&m, "Ann", c, &font());
    let three = fit(&m, "Ann\nAnn\nAnn", c, &font());
    assert!(three < one);
}

#[test]
fn bold_fits_no_larger_than_normal() {
    let m = HeuristicMeasurer::default();
    let c = Size::new(150.0, 50.0);
    let normal = fit(&m, "Department", c, &font());
    let bold = fit(&m, "Department", c, &FontSpec::new("sans-serif", FontWeight::Bold));
    assert!(bold <= normal);
}

#[test]
fn surface_released_after_fit() {
    let m = Counting::default();
    let size = fit(&m, "Ann Lee", Size::new(120.0, 40.0), &font());
    assert!(size >= 6.0);
    assert_eq!(m.acquired.get(), 1);
    assert_eq!(m.released.get(), 1);
}

#[test]
fn measurement_failure_falls_back_and_releases() {
    let m = Counting { fail: true, ..Default::default() };
    assert_eq!(fit(&m, "Ann Lee", Size::new(120.0, 40.0), &font()), 6.0);
    assert_eq!(m.acquired.get(), 1);
    assert_eq!(m.released.get(), 1);
}

// =============================================================
// FitState
// =============================================================

#[test]
fn state_refits_only_on_change() {
    let m = Counting::default();
    let mut st = FitState::new();
    let pct = Size::new(40.0, 15.0);
    let c = Size::new(100.0, 40.0);

    let a = st.update(&m, "Alexander", &font(), pct, c);
    let b = st.update(&m, "Alexander", &font(), pct, c);
    assert_eq!(a, b);
    assert_eq!(m.acquired.get(), 1);

    st.update(&m, "Alexandra", &font(), pct, c);
    assert_eq!(m.acquired.get(), 2);
    st.update(&m, "Alexandra", &font(), Size::new(41.0, 15.0), c);
    assert_eq!(m.acquired.get(), 3);
    st.update(&m, "Alexandra", &font(), Size::new(41.0, 15.0), Size::new(101.0, 40.0));
    assert_eq!(m.acquired.get(), 4);
    st.update(&m, "Alexandra", &FontSpec::new("serif", FontWeight::Normal), Size::new(41.0, 15.0), Size::new(101.0, 40.0));
    assert_eq!(m.acquired.get(), 5);
}

#[test]
fn state_waits_for_layout() {
    let m = Counting::default();
    let mut st = FitState::new();
    assert_eq!(st.update(&m, "Ann", &font(), Size::new(10.0, 10.0), Size::new(0.0, 0.0)), 12.0);
    assert_eq!(m.acquired.get(), 0);
    st.update(&m, "Ann", &font(), Size::new(10.0, 10.0), Size::new(100.0, 40.0));
    assert_eq!(m.acquired.get(), 1);
}

#[test]
fn corrective_pass_runs_once() {
    let m = HeuristicMeasurer::default();
    let mut st = FitState::new();
    let first = st.update(&m, "Alexander", &font(), Size::new(40.0, 15.0), Size::new(100.0, 40.0));

    let corrected = st.observe_rendered(&m, Size::new(90.0, 40.0)).unwrap();
    assert!(corrected <= first);
    assert!(st.corrected());
    assert_eq!(st.font_size(), corrected);

    assert!(st.observe_rendered(&m, Size::new(50.0, 20.0)).is_none());
}

#[test]
fn corrective_pass_skipped_within_tolerance() {
    let m = HeuristicMeasurer::default();
    let mut st = FitState::new();
    st.update(&m, "Alexander", &font(), Size::new(40.0, 15.0), Size::new(100.0, 40.0));
    assert!(st.observe_rendered(&m, Size::new(98.5, 39.0)).is_none());
    assert!(!st.corrected());
}

#[test]
fn corrective_pass_rearms_after_change() {
    let m = HeuristicMeasurer::default();
    let mut st = FitState::new();
    let pct = Size::new(40.0, 15.0);
    st.update(&m, "Alexander", &font(), pct, Size::new(100.0, 40.0));
    assert!(st.observe_rendered(&m, Size::new(80.0, 40.0)).is_some());
    st.update(&m, "Alexandra", &font(), pct, Size::new(100.0, 40.0));
    assert!(!st.corrected());
    assert!(st.observe_rendered(&m, Size::new(80.0, 40.0)).is_some());
}

#[test]
fn observe_before_any_fit_is_ignored() {
    let m = HeuristicMeasurer::default();
    let mut st = FitState::new();
    assert!(st.observe_rendered(&m, Size::new(10.0, 10.0)).is_none());
}

// =============================================================
// FitCache
// =============================================================

#[test]
fn cache_keeps_one_state_per_element() {
    let m = Counting::default();
    let mut cache = FitCache::new();
    let pct = Size::new(40.0, 15.0);
    let c = Size::new(100.0, 40.0);
    cache.size_for(&m, "a", "Ann", &font(), pct, c);
    cache.size_for(&m, "b", "Bob", &font(), pct, c);
    cache.size_for(&m, "a", "Ann", &font(), pct, c);
    assert_eq!(cache.len(), 2);
    assert_eq!(m.acquired.get(), 2);
}

#[test]
fn cache_retain_drops_deleted_elements() {
    let m = HeuristicMeasurer::default();
    let mut cache = FitCache::new();
    let pct = Size::new(40.0, 15.0);
    let c = Size::new(100.0, 40.0);
    cache.size_for(&m, "a", "Ann", &font(), pct, c);
    cache.size_for(&m, "b", "Bob", &font(), pct, c);
    cache.retain_ids(["b"]);
    assert!(cache.get("a").is_none());
    assert!(cache.get("b").is_some());
    assert!(cache.observe_rendered(&m, "a", Size::new(1.0, 1.0)).is_none());
}
