#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{Element, WatermarkKind, WatermarkPosition};
use crate::geom::ResizeHandle;
use crate::measure::HeuristicMeasurer;
use crate::render::Node;

// =============================================================
// Helpers
// =============================================================

/// Card on screen at (100, 50), 200x100 px: 1% is 2px across, 1px down.
const CARD: Rect = Rect { x: 100.0, y: 50.0, width: 200.0, height: 100.0 };

fn el(id: &str, x: f64, y: f64, w: f64, h: f64) -> Element {
    Element { id: id.into(), x, y, width: w, height: h, ..Element::with_defaults(ElementType::Text) }
}

fn core_with(elements: Vec<Element>) -> EngineCore {
    let mut core = EngineCore::default();
    core.session = Session::new(Template { elements, ..Template::blank() });
    core.set_card_rect(CARD);
    core
}

/// A at (10,10) 20x20 and B at (50,10) 20x20.
fn two_elements() -> EngineCore {
    core_with(vec![el("a", 10.0, 10.0, 20.0, 20.0), el("b", 50.0, 10.0, 20.0, 20.0)])
}

fn watermark() -> Watermark {
    Watermark {
        kind: WatermarkKind::Text,
        value: "VOID".into(),
        image_file_name: None,
        opacity: 0.3,
        position: WatermarkPosition::Center,
        x: None,
        y: None,
        width: None,
        height: None,
        rotation: None,
        font_size: None,
    }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn down(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer_down(pt(x, y), Button::Primary, Modifiers::default())
}

fn mv(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer_move(pt(x, y), Modifiers::default())
}

fn up(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    core.on_pointer_up(pt(x, y), Button::Primary, Modifiers::default())
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

fn element<'a>(core: &'a EngineCore, id: &str) -> &'a Element {
    core.template().element(id).unwrap()
}

// =============================================================
// Click to select
// =============================================================

#[test]
fn press_on_element_selects_and_starts_drag() {
    let mut core = two_elements();
    let actions = down(&mut core, 130.0, 70.0);
    assert_eq!(
        actions,
        vec![
            Action::SelectionChanged(vec!["a".into()]),
            Action::SetCursor(Cursor::Grabbing),
            Action::RenderNeeded,
        ]
    );
    assert!(matches!(core.input, InputState::DraggingElement(ref d) if d.id == "a"));
}

#[test]
fn plain_click_replaces_selection() {
    let mut core = two_elements();
    core.session.select_many(["a", "b"]);
    down(&mut core, 220.0, 70.0);
    up(&mut core, 220.0, 70.0);
    assert_eq!(core.selection(), ["b"]);
}

#[test]
fn modifier_click_toggles_without_dragging() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    up(&mut core, 130.0, 70.0);

    let actions = core.on_pointer_down(pt(220.0, 70.0), Button::Primary, ctrl());
    assert_eq!(actions, vec![Action::SelectionChanged(vec!["a".into(), "b".into()]), Action::RenderNeeded]);
    assert!(core.input.is_idle());

    core.on_pointer_down(pt(130.0, 70.0), Button::Primary, ctrl());
    assert_eq!(core.selection(), ["b"]);
}

#[test]
fn secondary_button_is_ignored() {
    let mut core = two_elements();
    let actions = core.on_pointer_down(pt(130.0, 70.0), Button::Secondary, Modifiers::default());
    assert!(actions.is_empty());
    assert!(core.selection().is_empty());
}

#[test]
fn press_outside_card_does_nothing() {
    let mut core = two_elements();
    assert!(down(&mut core, 10.0, 10.0).is_empty());
    assert!(core.input.is_idle());
}

#[test]
fn output_mode_is_not_interactive() {
    let mut core = two_elements();
    core.set_mode(RenderMode::Output);
    assert!(down(&mut core, 130.0, 70.0).is_empty());
    assert!(core.selection().is_empty());
}

// =============================================================
// Drag
// =============================================================

#[test]
fn drag_converts_pixels_to_percent() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    let actions = mv(&mut core, 150.0, 80.0);
    assert_eq!(
        actions,
        vec![Action::ElementUpdated { id: "a".into(), patch: ElementPatch::origin(20.0, 20.0) }, Action::RenderNeeded]
    );
    let a = element(&core, "a");
    assert_eq!((a.x, a.y), (20.0, 20.0));
}

#[test]
fn drag_is_relative_to_press_not_last_move() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    mv(&mut core, 150.0, 80.0);
    mv(&mut core, 150.0, 80.0);
    let a = element(&core, "a");
    assert_eq!((a.x, a.y), (20.0, 20.0));
}

#[test]
fn drag_clamps_to_card() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    mv(&mut core, 5000.0, 5000.0);
    let a = element(&core, "a");
    assert_eq!((a.x, a.y), (80.0, 80.0));

    mv(&mut core, -5000.0, -5000.0);
    let a = element(&core, "a");
    assert_eq!((a.x, a.y), (0.0, 0.0));
}

#[test]
fn drag_with_unlaid_out_card_is_skipped() {
    let mut core = two_elements();
    core.input = InputState::DraggingElement(ElementDrag {
        id: "a".into(),
        start_px: pt(0.0, 0.0),
        start_origin: pt(10.0, 10.0),
        bounds: Size::new(0.0, 100.0),
    });
    assert!(mv(&mut core, 50.0, 50.0).is_empty());
    assert_eq!(element(&core, "a").x, 10.0);
}

#[test]
fn drag_keeps_bounds_captured_at_press() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    core.set_card_rect(Rect::new(100.0, 50.0, 400.0, 200.0));
    mv(&mut core, 150.0, 80.0);
    assert_eq!(element(&core, "a").x, 20.0);
}

#[test]
fn release_ends_drag_and_restores_cursor() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    let actions = up(&mut core, 150.0, 80.0);
    assert_eq!(actions, vec![Action::RestoreCursor, Action::RenderNeeded]);
    assert!(core.input.is_idle());
    assert_eq!(core.cursor(), None);
}

#[test]
fn move_and_release_while_idle_do_nothing() {
    let mut core = two_elements();
    assert!(mv(&mut core, 150.0, 80.0).is_empty());
    assert!(up(&mut core, 150.0, 80.0).is_empty());
}

// =============================================================
// Resize
// =============================================================

/// Screen point on the south-east handle of A (corner at card px 60,30).
const A_SE_HANDLE: (f64, f64) = (162.0, 82.0);

#[test]
fn press_on_handle_of_single_selection_starts_resize() {
    let mut core = two_elements();
    core.session.click_select("a", false);
    let actions = down(&mut core, A_SE_HANDLE.0, A_SE_HANDLE.1);
    assert_eq!(actions, vec![Action::SetCursor(Cursor::NwseResize), Action::RenderNeeded]);
    assert!(matches!(core.input, InputState::ResizingElement(ref r) if r.handle == ResizeHandle::Se));
}

#[test]
fn resize_grows_far_edges() {
    let mut core = two_elements();
    core.session.click_select("a", false);
    down(&mut core, A_SE_HANDLE.0, A_SE_HANDLE.1);
    let actions = mv(&mut core, A_SE_HANDLE.0 + 20.0, A_SE_HANDLE.1 + 10.0);
    assert_eq!(
        actions[0],
        Action::ElementUpdated { id: "a".into(), patch: ElementPatch::rect(Rect::new(10.0, 10.0, 30.0, 30.0)) }
    );
}

#[test]
fn resize_respects_minimum() {
    let mut core = two_elements();
    core.session.click_select("a", false);
    down(&mut core, A_SE_HANDLE.0, A_SE_HANDLE.1);
    mv(&mut core, -5000.0, -5000.0);
    assert_eq!(element(&core, "a").rect(), Rect::new(10.0, 10.0, 5.0, 5.0));
}

#[test]
fn resize_of_thin_strip_on_card_edge_reports_stored_box() {
    // 30% x 2% strip on the top edge: 60x2 px at (180, 50).
    let mut core = core_with(vec![el("s", 40.0, 0.0, 30.0, 2.0)]);
    core.session.click_select("s", false);
    // Below the sw handle, still inside the nw one.
    down(&mut core, 177.0, 57.0);
    assert!(matches!(core.input, InputState::ResizingElement(ref r) if r.handle == ResizeHandle::Nw));

    let actions = mv(&mut core, 178.0, 58.0);
    let stored = element(&core, "s").rect();
    assert_eq!(stored, Rect::new(40.5, 0.0, 29.5, 5.0));
    assert_eq!(actions[0], Action::ElementUpdated { id: "s".into(), patch: ElementPatch::rect(stored) });
}

#[test]
fn handles_need_a_single_selection() {
    let mut core = two_elements();
    core.session.select_many(["a", "b"]);
    down(&mut core, A_SE_HANDLE.0, A_SE_HANDLE.1);
    assert!(!matches!(core.input, InputState::ResizingElement(_)));
}

// =============================================================
// Marquee
// =============================================================

#[test]
fn marquee_selects_intersecting_elements_only() {
    let mut core = core_with(vec![el("a", 10.0, 10.0, 20.0, 20.0), el("b", 80.0, 80.0, 10.0, 10.0)]);
    let actions = down(&mut core, 110.0, 55.0);
    assert_eq!(actions, vec![Action::SetCursor(Cursor::Crosshair), Action::RenderNeeded]);

    mv(&mut core, 170.0, 95.0);
    let actions = up(&mut core, 170.0, 95.0);
    assert_eq!(
        actions,
        vec![Action::SelectionChanged(vec!["a".into()]), Action::RestoreCursor, Action::RenderNeeded]
    );
    assert_eq!(core.selection(), ["a"]);
}

#[test]
fn click_on_background_clears_selection() {
    let mut core = two_elements();
    core.session.click_select("a", false);
    down(&mut core, 110.0, 55.0);
    let actions = up(&mut core, 110.0, 55.0);
    assert_eq!(actions[0], Action::SelectionChanged(Vec::new()));
    assert!(core.selection().is_empty());
}

#[test]
fn marquee_is_drawn_last_while_active() {
    let mut core = two_elements();
    down(&mut core, 110.0, 55.0);
    mv(&mut core, 170.0, 95.0);
    let scene = core.scene(&HeuristicMeasurer::default());
    assert!(matches!(scene.nodes.last(), Some(Node::Marquee { .. })));

    up(&mut core, 170.0, 95.0);
    let scene = core.scene(&HeuristicMeasurer::default());
    assert!(!scene.nodes.iter().any(|n| matches!(n, Node::Marquee { .. })));
}

// =============================================================
// Watermark
// =============================================================

fn watermark_core() -> EngineCore {
    let mut core = two_elements();
    core.session.set_watermark(Some(watermark()));
    core.set_watermark_edit(true);
    core
}

#[test]
fn watermark_drag_pins_explicit_box() {
    let mut core = watermark_core();
    let actions = down(&mut core, 200.0, 100.0);
    assert_eq!(actions, vec![Action::SetCursor(Cursor::Grabbing), Action::RenderNeeded]);

    let actions = mv(&mut core, 220.0, 100.0);
    let expected = watermark().with_box(Rect::new(45.0, 35.0, 30.0, 30.0));
    assert_eq!(actions[0], Action::WatermarkChanged(expected));
    let wm = core.template().watermark.as_ref().unwrap();
    assert_eq!(wm.resolve_box(), Rect::new(45.0, 35.0, 30.0, 30.0));
}

#[test]
fn watermark_resize_respects_minimum() {
    let mut core = watermark_core();
    let actions = down(&mut core, 228.0, 112.0);
    assert_eq!(actions[0], Action::SetCursor(Cursor::NwseResize));
    mv(&mut core, -5000.0, -5000.0);
    let wm = core.template().watermark.as_ref().unwrap();
    assert_eq!(wm.resolve_box(), Rect::new(35.0, 35.0, 5.0, 5.0));
}

#[test]
fn watermark_edit_ignores_elements() {
    let mut core = watermark_core();
    assert!(down(&mut core, 130.0, 70.0).is_empty());
    assert!(core.input.is_idle());
    assert!(core.selection().is_empty());
}

#[test]
fn watermark_is_not_a_target_outside_edit_mode() {
    let mut core = two_elements();
    core.session.set_watermark(Some(watermark()));
    down(&mut core, 200.0, 100.0);
    assert!(matches!(core.input, InputState::MarqueeSelecting(_)));
}

// =============================================================
// Abnormal termination
// =============================================================

#[test]
fn new_press_ends_stale_gesture_first() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    let actions = down(&mut core, 220.0, 70.0);
    assert_eq!(actions[0], Action::RestoreCursor);
    assert!(actions.contains(&Action::SetCursor(Cursor::Grabbing)));
    assert!(matches!(core.input, InputState::DraggingElement(ref d) if d.id == "b"));
}

#[test]
fn escape_cancels_gesture_and_keeps_emitted_geometry() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    mv(&mut core, 150.0, 80.0);
    let actions = core.on_key_down(&Key("Escape".into()), Modifiers::default(), FocusTarget::Canvas);
    assert_eq!(actions, vec![Action::RestoreCursor, Action::RenderNeeded]);
    assert!(core.input.is_idle());
    assert_eq!(element(&core, "a").x, 20.0);
}

#[test]
fn cancel_while_idle_is_silent() {
    let mut core = two_elements();
    assert!(core.cancel_gesture().is_empty());
}

#[test]
fn mode_switch_cancels_gesture() {
    let mut core = two_elements();
    down(&mut core, 130.0, 70.0);
    let actions = core.set_watermark_edit(true);
    assert_eq!(actions, vec![Action::RestoreCursor, Action::RenderNeeded, Action::RenderNeeded]);
    assert!(core.input.is_idle());
}

// =============================================================
// Keyboard shortcuts
// =============================================================

#[test]
fn copy_then_paste_selects_clone() {
    let mut core = two_elements();
    core.session.click_select("a", false);
    assert!(core.on_key_down(&Key("c".into()), ctrl(), FocusTarget::Canvas).is_empty());

    let actions = core.on_key_down(&Key("v".into()), ctrl(), FocusTarget::Canvas);
    assert_eq!(core.template().elements.len(), 3);
    let clone = &core.template().elements[2];
    assert_eq!((clone.x, clone.y), (15.0, 15.0));
    assert_eq!(actions[0], Action::SelectionChanged(vec![clone.id.clone()]));
}

#[test]
fn shortcuts_ignored_in_text_input() {
    let mut core = two_elements();
    core.session.click_select("a", false);
    core.on_key_down(&Key("c".into()), ctrl(), FocusTarget::TextInput);
    let actions = core.on_key_down(&Key("v".into()), ctrl(), FocusTarget::Canvas);
    assert!(actions.is_empty());
    assert_eq!(core.template().elements.len(), 2);
}

#[test]
fn mac_uses_meta() {
    let mut core = two_elements();
    core.config.platform = crate::input::Platform::Mac;
    core.session.click_select("a", false);
    core.on_key_down(&Key("c".into()), ctrl(), FocusTarget::Canvas);
    assert!(core.session.clipboard().is_empty());
    core.on_key_down(&Key("c".into()), Modifiers { meta: true, ..Default::default() }, FocusTarget::Canvas);
    assert_eq!(core.session.clipboard().len(), 1);
}

// =============================================================
// Commands
// =============================================================

#[test]
fn load_template_reids_and_clears_selection() {
    let mut core = two_elements();
    core.session.click_select("a", false);
    let next = Template { elements: vec![el("x", 0.0, 0.0, 10.0, 10.0)], ..Template::blank() };
    let actions = core.load_template(&next);
    assert_eq!(actions, vec![Action::SelectionChanged(Vec::new()), Action::RenderNeeded]);
    assert_eq!(core.template().elements.len(), 1);
    assert_ne!(core.template().elements[0].id, "x");
}

#[test]
fn update_selected_emits_only_for_single_selection() {
    let mut core = two_elements();
    let patch = ElementPatch::origin(40.0, 40.0);
    assert!(core.update_selected(&patch).is_empty());

    core.session.click_select("b", false);
    let actions = core.update_selected(&patch);
    assert_eq!(actions[0], Action::ElementUpdated { id: "b".into(), patch });
}

#[test]
fn update_selected_reports_clamped_geometry() {
    let mut core = two_elements();
    core.session.click_select("a", false);
    let actions = core.update_selected(&ElementPatch::origin(-5.0, 140.0));
    assert_eq!(actions[0], Action::ElementUpdated { id: "a".into(), patch: ElementPatch::origin(0.0, 100.0) });
    assert_eq!(element(&core, "a").rect().origin(), Point::new(0.0, 100.0));
}

#[test]
fn add_duplicate_delete() {
    let mut core = two_elements();
    let actions = core.add_element(ElementType::Label);
    assert_eq!(core.template().elements.len(), 3);
    let added = core.selection().to_vec();
    assert_eq!(actions[0], Action::SelectionChanged(added.clone()));

    core.duplicate_selected();
    assert_eq!(core.template().elements.len(), 4);
    assert_ne!(core.selection(), added.as_slice());

    core.delete_selected();
    assert_eq!(core.template().elements.len(), 3);
    assert!(core.selection().is_empty());
    assert!(core.delete_selected().is_empty());
}

// =============================================================
// Fit correction
// =============================================================

#[test]
fn undersized_render_triggers_one_refit() {
    let mut core = two_elements();
    let m = HeuristicMeasurer::default();
    core.scene(&m);

    let actions = core.on_text_rendered(&m, "a", Size::new(10.0, 10.0));
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert!(core.on_text_rendered(&m, "a", Size::new(10.0, 10.0)).is_empty());
}

#[test]
fn render_report_for_unknown_element_is_ignored() {
    let mut core = two_elements();
    assert!(core.on_text_rendered(&HeuristicMeasurer::default(), "ghost", Size::new(10.0, 10.0)).is_empty());
}
