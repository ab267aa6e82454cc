#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// Platform / Modifiers
// =============================================================

#[test]
fn platform_parses_case_insensitively() {
    assert_eq!("mac".parse::<Platform>(), Ok(Platform::Mac));
    assert_eq!(" MacOS ".parse::<Platform>(), Ok(Platform::Mac));
    assert_eq!("other".parse::<Platform>(), Ok(Platform::Other));
    assert_eq!("linux".parse::<Platform>(), Ok(Platform::Other));
}

#[test]
fn platform_rejects_unknown() {
    let err = "amiga".parse::<Platform>().unwrap_err();
    assert_eq!(err, ParsePlatformError("amiga".into()));
    assert!(err.to_string().contains("amiga"));
}

#[test]
fn command_modifier_depends_on_platform() {
    let ctrl = Modifiers { ctrl: true, ..Default::default() };
    let meta = Modifiers { meta: true, ..Default::default() };
    assert!(ctrl.command(Platform::Other));
    assert!(!ctrl.command(Platform::Mac));
    assert!(meta.command(Platform::Mac));
    assert!(!meta.command(Platform::Other));
}

#[test]
fn either_ctrl_or_meta_toggles_selection() {
    assert!(Modifiers { ctrl: true, ..Default::default() }.toggles_selection());
    assert!(Modifiers { meta: true, ..Default::default() }.toggles_selection());
    assert!(!Modifiers { shift: true, alt: true, ..Default::default() }.toggles_selection());
}

// =============================================================
// Key
// =============================================================

#[test]
fn key_matches_single_char_exactly() {
    assert!(Key("c".into()).is_char('c'));
    assert!(!Key("C".into()).is_char('c'));
    assert!(!Key("cc".into()).is_char('c'));
    assert!(!Key(String::new()).is_char('c'));
}

#[test]
fn key_escape() {
    assert!(Key("Escape".into()).is_escape());
    assert!(!Key("Esc".into()).is_escape());
}

// =============================================================
// Cursor
// =============================================================

#[test]
fn diagonal_cursor_per_handle() {
    assert_eq!(Cursor::for_handle(ResizeHandle::Se), Cursor::NwseResize);
    assert_eq!(Cursor::for_handle(ResizeHandle::Nw), Cursor::NwseResize);
    assert_eq!(Cursor::for_handle(ResizeHandle::Sw), Cursor::NeswResize);
    assert_eq!(Cursor::for_handle(ResizeHandle::Ne), Cursor::NeswResize);
}

#[test]
fn cursor_css_keywords() {
    assert_eq!(Cursor::Grabbing.to_string(), "grabbing");
    assert_eq!(Cursor::Crosshair.as_css(), "crosshair");
    assert_eq!(serde_json::to_value(Cursor::NeswResize).unwrap(), "nesw-resize");
}

// =============================================================
// Marquee
// =============================================================

fn marquee(start: Point, current: Point) -> Marquee {
    Marquee { start, current, card: Rect::new(100.0, 50.0, 200.0, 100.0) }
}

#[test]
fn marquee_rect_is_card_relative_and_normalized() {
    let m = marquee(Point::new(180.0, 120.0), Point::new(120.0, 60.0));
    assert_eq!(m.rect_px(), Rect::new(20.0, 10.0, 60.0, 60.0));
}

#[test]
fn marquee_rect_in_percent() {
    let m = marquee(Point::new(120.0, 60.0), Point::new(180.0, 120.0));
    assert_eq!(m.rect_pct(), Some(Rect::new(10.0, 10.0, 30.0, 60.0)));
}

#[test]
fn marquee_click_is_a_point() {
    let m = marquee(Point::new(150.0, 100.0), Point::new(150.0, 100.0));
    assert_eq!(m.rect_pct(), Some(Rect::new(25.0, 50.0, 0.0, 0.0)));
}

#[test]
fn marquee_without_card_area_is_none() {
    let m = Marquee { start: Point::default(), current: Point::default(), card: Rect::new(0.0, 0.0, 0.0, 10.0) };
    assert_eq!(m.rect_pct(), None);
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_default_is_idle() {
    assert!(InputState::default().is_idle());
    assert_eq!(InputState::default().cursor(), None);
    assert_eq!(InputState::default().name(), "idle");
}

#[test]
fn gesture_cursors() {
    let bounds = Size::new(200.0, 100.0);
    let drag = InputState::DraggingElement(ElementDrag {
        id: "a".into(),
        start_px: Point::default(),
        start_origin: Point::default(),
        bounds,
    });
    assert_eq!(drag.cursor(), Some(Cursor::Grabbing));

    let resize = InputState::ResizingWatermark(WatermarkResize {
        handle: ResizeHandle::Ne,
        start_px: Point::default(),
        start_box: Rect::default(),
        bounds,
    });
    assert_eq!(resize.cursor(), Some(Cursor::NeswResize));
    assert_eq!(resize.name(), "resizing_watermark");

    let mq = InputState::MarqueeSelecting(marquee(Point::default(), Point::default()));
    assert_eq!(mq.cursor(), Some(Cursor::Crosshair));
    assert!(!mq.is_idle());
}
