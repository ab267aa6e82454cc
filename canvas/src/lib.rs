//! Card canvas core: layout, text fitting, rendering and direct manipulation
//! for printable ID-card templates.
//!
//! This crate is compiled to WebAssembly and runs in the browser, and also
//! builds natively for headless rendering. It owns the design surface of a
//! single card: resolving bound record fields, fitting text into element
//! boxes, producing a display list, and translating raw pointer and keyboard
//! events into template edits. The host JavaScript layer wires DOM events to
//! the engine and persists the resulting [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`session`] | Template ownership, selection and clipboard |
//! | [`doc`] | Template, element, watermark and record types |
//! | [`geom`] | Percent-space boxes, drag and resize clamping |
//! | [`fit`] | Largest font size that fits a box |
//! | [`measure`] | Scoped text measurement surfaces |
//! | [`render`] | Template + record to [`render::Scene`] display list |
//! | [`paint`] | Draws a scene onto a 2D canvas context |
//! | [`hit`] | Hit-testing elements, handles and the watermark |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`config`] | Environment-driven surface and platform settings |
//! | [`consts`] | Shared numeric constants (card size, fit limits, handle size) |

pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod fit;
pub mod geom;
pub mod hit;
pub mod input;
pub mod measure;
pub mod paint;
pub mod render;
pub mod session;
