//! Editing session: the template being designed, the current selection and
//! the clipboard.
//!
//! The session is the single writer of its template. Every operation replaces
//! whole elements (or the whole element list) rather than editing in place,
//! and leaves the selection referring only to elements that exist.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::consts::{PASTE_MAX_ORIGIN_PCT, PASTE_OFFSET_PCT};
use crate::doc::{Background, Element, ElementId, ElementPatch, ElementType, Template, Watermark};
use crate::input::{FocusTarget, Key, Modifiers, Platform};

/// A keyboard shortcut the session handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Copy,
    Paste,
}

/// Map a key press to a shortcut.
///
/// Nothing fires while focus is in a text input, so typing `c` or `v` with
/// the modifier there keeps its native meaning.
#[must_use]
pub fn shortcut_for(key: &Key, mods: Modifiers, focus: FocusTarget, platform: Platform) -> Option<Shortcut> {
    if focus == FocusTarget::TextInput || !mods.command(platform) {
        return None;
    }
    if key.is_char('c') {
        Some(Shortcut::Copy)
    } else if key.is_char('v') {
        Some(Shortcut::Paste)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    template: Template,
    /// Ordered, duplicate-free.
    selected: Vec<ElementId>,
    /// Snapshot taken by the last copy.
    clipboard: Vec<Element>,
}

impl Session {
    #[must_use]
    pub fn new(template: Template) -> Self {
        Self { template, selected: Vec::new(), clipboard: Vec::new() }
    }

    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    #[must_use]
    pub fn selected(&self) -> &[ElementId] {
        &self.selected
    }

    /// Selected elements, in template order.
    #[must_use]
    pub fn selected_elements(&self) -> Vec<&Element> {
        self.template.elements.iter().filter(|e| self.is_selected(&e.id)).collect()
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// The selected element when exactly one is selected.
    #[must_use]
    pub fn single_selected(&self) -> Option<&Element> {
        match self.selected.as_slice() {
            [only] => self.template.element(only),
            _ => None,
        }
    }

    #[must_use]
    pub fn clipboard(&self) -> &[Element] {
        &self.clipboard
    }

    // ── Template ───────────────────────────────────────────────

    /// Switch to `template`, giving its elements fresh ids and clearing the
    /// selection.
    pub fn set_template(&mut self, template: &Template) {
        self.template = template.reidentified();
        self.selected.clear();
        tracing::debug!(template = %self.template.id, elements = self.template.elements.len(), "template applied");
    }

    /// Replace the template as-is, keeping ids. The selection is pruned to
    /// elements that still exist.
    pub fn replace_template(&mut self, template: Template) {
        self.template = template;
        let template = &self.template;
        self.selected.retain(|id| template.element(id).is_some());
    }

    pub fn set_background(&mut self, background: Option<Background>) {
        self.template.background = background;
    }

    pub fn set_watermark(&mut self, watermark: Option<Watermark>) {
        self.template.watermark = watermark;
    }

    // ── Selection ──────────────────────────────────────────────

    /// Press on an element: replace the selection, or toggle the element's
    /// membership when `toggle` is set.
    pub fn click_select(&mut self, id: &str, toggle: bool) {
        if self.template.element(id).is_none() {
            return;
        }
        if !toggle {
            self.selected = vec![id.to_owned()];
        } else if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_owned());
        }
    }

    /// Replace the selection with `ids`, dropping unknown ids and duplicates.
    pub fn select_many<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<ElementId>,
    {
        self.selected.clear();
        for id in ids {
            let id = id.into();
            if self.template.element(&id).is_some() && !self.is_selected(&id) {
                self.selected.push(id);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    // ── Element operations ─────────────────────────────────────

    /// Append a new element of `ty` with default geometry and styling, and
    /// select only it.
    pub fn add(&mut self, ty: ElementType) -> ElementId {
        let el = Element::with_defaults(ty);
        let id = el.id.clone();
        self.template.elements.push(el);
        self.selected = vec![id.clone()];
        tracing::debug!(%id, ?ty, "element added");
        id
    }

    /// Snapshot the selected elements into the clipboard. Returns how many
    /// were copied; an empty selection leaves the clipboard untouched.
    pub fn copy(&mut self) -> usize {
        let copied: Vec<Element> = self.selected_elements().into_iter().cloned().collect();
        if copied.is_empty() {
            return 0;
        }
        self.clipboard = copied;
        self.clipboard.len()
    }

    /// Append offset clones of the clipboard and select them.
    pub fn paste(&mut self) -> Vec<ElementId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let clones: Vec<Element> = self
            .clipboard
            .iter()
            .map(|e| e.cloned_offset(PASTE_OFFSET_PCT, PASTE_MAX_ORIGIN_PCT))
            .collect();
        let ids: Vec<ElementId> = clones.iter().map(|e| e.id.clone()).collect();
        self.template.elements.extend(clones);
        self.selected.clone_from(&ids);
        tracing::debug!(count = ids.len(), "elements pasted");
        ids
    }

    /// Copy then paste the current selection.
    pub fn duplicate(&mut self) -> Vec<ElementId> {
        if self.copy() == 0 {
            return Vec::new();
        }
        self.paste()
    }

    /// Remove every selected element and clear the selection.
    pub fn delete(&mut self) -> usize {
        let before = self.template.elements.len();
        let selected = std::mem::take(&mut self.selected);
        self.template.elements.retain(|e| !selected.contains(&e.id));
        let removed = before - self.template.elements.len();
        tracing::debug!(removed, "elements deleted");
        removed
    }

    /// Apply `patch` to element `id`.
    pub fn apply_patch(&mut self, id: &str, patch: &ElementPatch) -> bool {
        self.template.apply_patch(id, patch)
    }

    /// Apply `patch` to the selected element. Ignored unless exactly one
    /// element is selected.
    pub fn update_selected(&mut self, patch: &ElementPatch) -> bool {
        let [only] = self.selected.as_slice() else {
            return false;
        };
        let id = only.clone();
        self.template.apply_patch(&id, patch)
    }

    /// Run `shortcut`. Returns whether anything changed.
    pub fn run_shortcut(&mut self, shortcut: Shortcut) -> bool {
        match shortcut {
            Shortcut::Copy => self.copy() > 0,
            Shortcut::Paste => !self.paste().is_empty(),
        }
    }
}
