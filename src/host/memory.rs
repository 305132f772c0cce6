//! Headless surface.
//!
//! Keeps the last state of every part plus a history of rendered texts, so a
//! typewriter can run to completion without a terminal and be inspected
//! afterwards.

use super::Surface;
use crate::types::{Opacity, Part};

/// Styling of one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartStyle {
    pub opacity: Opacity,
    pub color: Option<String>,
    pub classes: Vec<String>,
}

/// A [`Surface`] that records instead of drawing.
///
/// Opacity changes on the cursor count as transitions. Whoever drives the
/// surface collects them with [`MemorySurface::take_transition`] and forwards
/// each as [`super::HostEvent::TransitionEnd`].
///
/// The history keeps every render unless capped with
/// [`MemorySurface::with_history_limit`]. Cap it for long looping runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    text: String,
    history: Vec<String>,
    history_limit: Option<usize>,
    text_style: PartStyle,
    cursor_glyph: Option<String>,
    cursor_style: PartStyle,
    transitions: usize,
    released: bool,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the `limit` most recent renders.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Texts passed to `set_text`, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn style(&self, part: Part) -> &PartStyle {
        match part {
            Part::Text => &self.text_style,
            Part::Cursor => &self.cursor_style,
        }
    }

    pub fn cursor_glyph(&self) -> Option<&str> {
        self.cursor_glyph.as_deref()
    }

    pub fn has_cursor(&self) -> bool {
        self.cursor_glyph.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Complete one pending cursor transition, if any.
    pub fn take_transition(&mut self) -> bool {
        if self.transitions == 0 {
            return false;
        }
        self.transitions -= 1;
        true
    }

    pub fn pending_transitions(&self) -> usize {
        self.transitions
    }

    fn style_mut(&mut self, part: Part) -> Option<&mut PartStyle> {
        match part {
            Part::Text if !self.released => Some(&mut self.text_style),
            Part::Cursor if self.cursor_glyph.is_some() => Some(&mut self.cursor_style),
            _ => None,
        }
    }
}

impl Surface for MemorySurface {
    fn set_text(&mut self, text: &str) {
        if self.released {
            return;
        }
        self.text.clear();
        self.text.push_str(text);
        self.history.push(text.to_string());
        if let Some(limit) = self.history_limit {
            let excess = self.history.len().saturating_sub(limit);
            self.history.drain(..excess);
        }
    }

    fn attach_cursor(&mut self, glyph: &str) {
        self.cursor_glyph = Some(glyph.to_string());
        self.cursor_style = PartStyle::default();
    }

    fn detach_cursor(&mut self) {
        self.cursor_glyph = None;
        self.cursor_style = PartStyle::default();
        self.transitions = 0;
    }

    fn set_opacity(&mut self, part: Part, opacity: Opacity) {
        let Some(style) = self.style_mut(part) else {
            return;
        };
        if style.opacity == opacity {
            return;
        }
        style.opacity = opacity;
        if part == Part::Cursor {
            self.transitions += 1;
        }
    }

    fn set_color(&mut self, part: Part, color: &str) {
        if let Some(style) = self.style_mut(part) {
            style.color = Some(color.to_string());
        }
    }

    fn add_class(&mut self, part: Part, class: &str) {
        if let Some(style) = self.style_mut(part) {
            if !style.classes.iter().any(|c| c == class) {
                style.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, part: Part, class: &str) {
        if let Some(style) = self.style_mut(part) {
            style.classes.retain(|c| c != class);
        }
    }

    fn release(&mut self) {
        self.released = true;
        self.text.clear();
        self.text_style = PartStyle::default();
    }
}
