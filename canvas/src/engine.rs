use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::config::CanvasConfig;
use crate::doc::{CardRecord, ElementId, ElementPatch, ElementType, Template, Watermark};
use crate::fit::FitCache;
use crate::geom::{Point, Rect, Size, clamp_drag, clamp_resize, pct_delta};
use crate::hit::{Hit, HitContext, hit_test};
use crate::input::{
    Button, Cursor, ElementDrag, ElementResize, FocusTarget, InputState, Key, Marquee, Modifiers, WatermarkDrag,
    WatermarkResize,
};
use crate::measure::{CanvasMeasurer, TextMeasurer};
use crate::paint::{self, ImageCache};
use crate::render::{Overlay, RenderMode, Scene, render};
use crate::session::{Session, Shortcut, shortcut_for};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// An element's geometry changed; the session already holds the result.
    ElementUpdated { id: ElementId, patch: ElementPatch },
    WatermarkChanged(Watermark),
    SelectionChanged(Vec<ElementId>),
    /// Override the root pointer cursor.
    SetCursor(Cursor),
    /// Drop the override set by the last `SetCursor`.
    RestoreCursor,
    RenderNeeded,
}

/// Core engine state: all logic that does not depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub session: Session,
    pub input: InputState,
    pub config: CanvasConfig,
    pub mode: RenderMode,
    pub watermark_edit: bool,
    /// Record bound in output mode.
    pub record: Option<CardRecord>,
    /// Card bounding box in screen pixels, as last reported by the host.
    pub card_rect: Rect,
    pub fits: FitCache,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        let size = config.surface.size_px();
        Self {
            session: Session::default(),
            input: InputState::default(),
            config,
            mode: RenderMode::Design,
            watermark_edit: false,
            record: None,
            card_rect: Rect::new(0.0, 0.0, size.width, size.height),
            fits: FitCache::new(),
        }
    }

    // --- Data inputs ---

    /// Apply a template, giving its elements fresh ids and clearing the
    /// selection. Any gesture in progress is abandoned.
    pub fn load_template(&mut self, template: &Template) -> Vec<Action> {
        let mut actions = self.cancel_gesture();
        self.session.set_template(template);
        actions.push(Action::SelectionChanged(Vec::new()));
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn set_record(&mut self, record: Option<CardRecord>) {
        self.record = record;
    }

    pub fn set_mode(&mut self, mode: RenderMode) -> Vec<Action> {
        let mut actions = self.cancel_gesture();
        self.mode = mode;
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Toggle watermark editing. While on, presses target only the watermark.
    pub fn set_watermark_edit(&mut self, on: bool) -> Vec<Action> {
        let mut actions = self.cancel_gesture();
        self.watermark_edit = on;
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Update the card's on-screen bounding box. Gestures already in progress
    /// keep the bounds they captured at press.
    pub fn set_card_rect(&mut self, rect: Rect) {
        self.card_rect = rect;
    }

    // --- Session commands ---

    pub fn add_element(&mut self, ty: ElementType) -> Vec<Action> {
        self.session.add(ty);
        self.selection_changed()
    }

    pub fn duplicate_selected(&mut self) -> Vec<Action> {
        if self.session.duplicate().is_empty() {
            return Vec::new();
        }
        self.selection_changed()
    }

    pub fn delete_selected(&mut self) -> Vec<Action> {
        if self.session.delete() == 0 {
            return Vec::new();
        }
        self.selection_changed()
    }

    /// Apply a property-panel edit to the single selected element.
    pub fn update_selected(&mut self, patch: &ElementPatch) -> Vec<Action> {
        let Some(id) = self.session.single_selected().map(|e| e.id.clone()) else {
            return Vec::new();
        };
        if !self.session.update_selected(patch) {
            return Vec::new();
        }
        self.element_updated(id, patch)
    }

    pub fn set_watermark(&mut self, watermark: Option<Watermark>) -> Vec<Action> {
        self.session.set_watermark(watermark);
        vec![Action::RenderNeeded]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let mut actions = self.cancel_gesture();
        if self.mode != RenderMode::Design {
            return actions;
        }

        let bounds = self.card_rect.size();
        let local = screen_pt.sub(self.card_rect.origin());
        let ctx = HitContext { card: bounds, selected: self.session.selected(), watermark_edit: self.watermark_edit };
        let Some(hit) = hit_test(local, self.session.template(), &ctx) else {
            return actions;
        };

        let next = match hit {
            Hit::ElementHandle { id, handle } => {
                let Some(el) = self.session.template().element(&id) else {
                    return actions;
                };
                InputState::ResizingElement(ElementResize {
                    id,
                    handle,
                    start_px: screen_pt,
                    start_rect: el.rect(),
                    bounds,
                })
            }
            Hit::Element(id) => {
                if modifiers.toggles_selection() {
                    self.session.click_select(&id, true);
                    actions.extend(self.selection_changed());
                    return actions;
                }
                self.session.click_select(&id, false);
                actions.push(Action::SelectionChanged(self.session.selected().to_vec()));
                let Some(el) = self.session.template().element(&id) else {
                    return actions;
                };
                InputState::DraggingElement(ElementDrag {
                    start_origin: el.rect().origin(),
                    id,
                    start_px: screen_pt,
                    bounds,
                })
            }
            Hit::WatermarkHandle(handle) => {
                let Some(wm) = &self.session.template().watermark else {
                    return actions;
                };
                InputState::ResizingWatermark(WatermarkResize {
                    handle,
                    start_px: screen_pt,
                    start_box: wm.resolve_box(),
                    bounds,
                })
            }
            Hit::Watermark => {
                let Some(wm) = &self.session.template().watermark else {
                    return actions;
                };
                InputState::DraggingWatermark(WatermarkDrag { start_px: screen_pt, start_box: wm.resolve_box(), bounds })
            }
            Hit::Background if self.watermark_edit => return actions,
            Hit::Background => {
                InputState::MarqueeSelecting(Marquee { start: screen_pt, current: screen_pt, card: self.card_rect })
            }
        };

        self.begin(next, &mut actions);
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        match self.input.clone() {
            InputState::Idle => Vec::new(),
            InputState::DraggingElement(drag) => {
                let Some(delta) = pct_delta(screen_pt.sub(drag.start_px), drag.bounds) else {
                    return Vec::new();
                };
                let Some(el) = self.session.template().element(&drag.id) else {
                    return Vec::new();
                };
                let origin = clamp_drag(drag.start_origin, el.rect().size(), delta);
                self.update_element(drag.id, ElementPatch::origin(origin.x, origin.y))
            }
            InputState::ResizingElement(resize) => {
                let Some(delta) = pct_delta(screen_pt.sub(resize.start_px), resize.bounds) else {
                    return Vec::new();
                };
                let rect = clamp_resize(resize.handle, resize.start_rect, delta);
                self.update_element(resize.id, ElementPatch::rect(rect))
            }
            InputState::DraggingWatermark(drag) => {
                let Some(delta) = pct_delta(screen_pt.sub(drag.start_px), drag.bounds) else {
                    return Vec::new();
                };
                let size = drag.start_box.size();
                let origin = clamp_drag(drag.start_box.origin(), size, delta);
                self.update_watermark(Rect::new(origin.x, origin.y, size.width, size.height))
            }
            InputState::ResizingWatermark(resize) => {
                let Some(delta) = pct_delta(screen_pt.sub(resize.start_px), resize.bounds) else {
                    return Vec::new();
                };
                self.update_watermark(clamp_resize(resize.handle, resize.start_box, delta))
            }
            InputState::MarqueeSelecting(mut marquee) => {
                marquee.current = screen_pt;
                self.input = InputState::MarqueeSelecting(marquee);
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let state = std::mem::take(&mut self.input);
        if state.is_idle() {
            return Vec::new();
        }
        tracing::debug!(gesture = state.name(), state = ?state, "gesture ended");

        let mut actions = Vec::new();
        if let InputState::MarqueeSelecting(mut marquee) = state {
            marquee.current = screen_pt;
            if let Some(rect) = marquee.rect_pct() {
                let hits: Vec<ElementId> = self
                    .session
                    .template()
                    .elements
                    .iter()
                    .filter(|el| el.rect().intersects(&rect))
                    .map(|el| el.id.clone())
                    .collect();
                self.session.select_many(hits);
                actions.push(Action::SelectionChanged(self.session.selected().to_vec()));
            }
        }
        actions.push(Action::RestoreCursor);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Abandon the active gesture without further updates. Geometry already
    /// emitted stays applied.
    pub fn cancel_gesture(&mut self) -> Vec<Action> {
        let state = std::mem::take(&mut self.input);
        if state.is_idle() {
            return Vec::new();
        }
        tracing::debug!(gesture = state.name(), state = ?state, "gesture cancelled");
        vec![Action::RestoreCursor, Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, focus: FocusTarget) -> Vec<Action> {
        if key.is_escape() {
            return self.cancel_gesture();
        }
        match shortcut_for(key, modifiers, focus, self.config.platform) {
            Some(Shortcut::Copy) => {
                self.session.run_shortcut(Shortcut::Copy);
                Vec::new()
            }
            Some(Shortcut::Paste) if self.session.run_shortcut(Shortcut::Paste) => self.selection_changed(),
            Some(Shortcut::Paste) | None => Vec::new(),
        }
    }

    /// Report the box element `id`'s text actually rendered into. Triggers
    /// at most one corrective refit per change.
    pub fn on_text_rendered<M: TextMeasurer>(&mut self, measurer: &M, id: &str, rendered: Size) -> Vec<Action> {
        match self.fits.observe_rendered(measurer, id, rendered) {
            Some(_) => vec![Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    // --- Render ---

    /// Build the display list for the current state.
    pub fn scene<M: TextMeasurer>(&mut self, measurer: &M) -> Scene {
        let opts = self.config.render_options(self.mode);
        let surface = opts.surface.size_px();
        let marquee = match &self.input {
            InputState::MarqueeSelecting(m) => m.rect_pct().map(|r| r.pct_to_px(surface)),
            _ => None,
        };
        let overlay = Overlay { selected: self.session.selected(), marquee, watermark_edit: self.watermark_edit };
        let record = match self.mode {
            RenderMode::Output => self.record.as_ref(),
            RenderMode::Design => None,
        };
        render(self.session.template(), record, &opts, &overlay, measurer, &mut self.fits)
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &[ElementId] {
        self.session.selected()
    }

    #[must_use]
    pub fn template(&self) -> &Template {
        self.session.template()
    }

    #[must_use]
    pub fn cursor(&self) -> Option<Cursor> {
        self.input.cursor()
    }

    // --- Internal helpers ---

    fn begin(&mut self, next: InputState, actions: &mut Vec<Action>) {
        tracing::debug!(gesture = next.name(), state = ?next, "gesture started");
        if let Some(cursor) = next.cursor() {
            actions.push(Action::SetCursor(cursor));
        }
        self.input = next;
        actions.push(Action::RenderNeeded);
    }

    fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> Vec<Action> {
        if !self.session.apply_patch(&id, &patch) {
            return Vec::new();
        }
        self.element_updated(id, &patch)
    }

    /// Report `patch` with its geometry read back from the stored element,
    /// so the host sees the clamped values the session holds.
    fn element_updated(&self, id: ElementId, patch: &ElementPatch) -> Vec<Action> {
        let Some(stored) = self.session.template().element(&id) else {
            return Vec::new();
        };
        let patch = patch.with_geometry_of(stored);
        vec![Action::ElementUpdated { id, patch }, Action::RenderNeeded]
    }

    fn update_watermark(&mut self, rect: Rect) -> Vec<Action> {
        let Some(wm) = &self.session.template().watermark else {
            return Vec::new();
        };
        let next = wm.with_box(rect);
        self.session.set_watermark(Some(next.clone()));
        vec![Action::WatermarkChanged(next), Action::RenderNeeded]
    }

    fn selection_changed(&self) -> Vec<Action> {
        vec![Action::SelectionChanged(self.session.selected().to_vec()), Action::RenderNeeded]
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    measurer: CanvasMeasurer,
    images: ImageCache,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, config: CanvasConfig) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let measurer = CanvasMeasurer::new(ctx.clone());
        Ok(Self { canvas, ctx, measurer, images: ImageCache::new(), core: EngineCore::new(config) })
    }

    /// Parse a template from JSON and apply it.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the JSON does not describe a template.
    pub fn load_template_json(&mut self, json: &str) -> Result<Vec<Action>, serde_json::Error> {
        let template: Template = serde_json::from_str(json)?;
        Ok(self.core.load_template(&template))
    }

    /// Parse a record from JSON and bind it for output rendering.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the JSON does not describe a record.
    pub fn load_record_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let record: CardRecord = serde_json::from_str(json)?;
        self.core.set_record(Some(record));
        Ok(())
    }

    /// Size the backing store for the card surface at `dpr`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_dpr(&mut self, dpr: f64) {
        let size = self.core.config.surface.size_px();
        self.canvas.set_width((size.width * dpr).round().max(1.0) as u32);
        self.canvas.set_height((size.height * dpr).round().max(1.0) as u32);
    }

    // --- Delegated input events ---

    pub fn set_card_rect(&mut self, rect: Rect) {
        self.core.set_card_rect(rect);
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, focus: FocusTarget) -> Vec<Action> {
        self.core.on_key_down(key, modifiers, focus)
    }

    /// Host lost focus or pointer capture mid-gesture.
    pub fn on_blur(&mut self) -> Vec<Action> {
        self.core.cancel_gesture()
    }

    pub fn on_text_rendered(&mut self, id: &str, rendered: Size) -> Vec<Action> {
        self.core.on_text_rendered(&self.measurer, id, rendered)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&mut self, dpr: f64) -> Result<(), JsValue> {
        let scene = self.core.scene(&self.measurer);
        paint::draw(&self.ctx, &scene, &self.images, dpr)
    }

    /// Drop decoded images, e.g. after the template's sources change.
    pub fn clear_images(&self) {
        self.images.clear();
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> &[ElementId] {
        self.core.selection()
    }

    #[must_use]
    pub fn template(&self) -> &Template {
        self.core.template()
    }
}
