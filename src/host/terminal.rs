//! Terminal host - inline crossterm surface and a blocking driver
//!
//! [`TerminalSurface`] draws the text and cursor glyph in place, on the
//! lines below the shell cursor, without taking over the screen. Each redraw
//! moves back to the first line, erases downwards and paints again. Lines
//! longer than the terminal is wide count as the rows they wrap onto.
//!
//! Terminals cannot fade, so an opacity change is drawn at once and then
//! reported finished after [`DEFAULT_TRANSITION`]. [`run`] delivers that as
//! [`HostEvent::TransitionEnd`], keeping the cursor blink going.
//!
//! # Classes
//!
//! A class named after a text attribute (`bold`, `dim`, `italic`,
//! `underline`) applies that attribute. Other class names are kept but have
//! no effect on the drawing.

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use bitflags::bitflags;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::queue;

use super::{HostEvent, Surface, SystemScheduler};
use crate::error::Result;
use crate::text::string_width;
use crate::types::{Opacity, Part};
use crate::typewriter::Typewriter;

/// How long an opacity change counts as running.
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(100);

bitflags! {
    /// What changed since the last draw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dirty: u8 {
        const TEXT = 1 << 0;
        const CURSOR = 1 << 1;
        const STYLE = 1 << 2;
    }
}

/// Parse a colour: a crossterm colour name (`red`, `dark_grey`, `reset`) or
/// `#rrggbb`.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Color::Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        });
    }
    Color::try_from(value).ok()
}

#[derive(Debug, Clone, Default)]
struct Paint {
    opacity: Opacity,
    color: Option<Color>,
    classes: Vec<String>,
}

impl Paint {
    fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.classes.iter().filter_map(|class| match class.as_str() {
            "bold" => Some(Attribute::Bold),
            "dim" => Some(Attribute::Dim),
            "italic" => Some(Attribute::Italic),
            "underline" => Some(Attribute::Underlined),
            _ => None,
        })
    }
}

/// Write `content` in `paint`, or blank cells of the same width when
/// transparent.
fn paint_into<W: Write>(out: &mut W, paint: &Paint, content: &str) -> io::Result<()> {
    if !paint.opacity.is_visible() {
        let blank: String = content
            .split('\n')
            .map(|line| " ".repeat(string_width(line)))
            .collect::<Vec<_>>()
            .join("\n");
        return queue!(out, Print(blank));
    }

    if let Some(color) = paint.color {
        queue!(out, SetForegroundColor(color))?;
    }
    for attribute in paint.attributes() {
        queue!(out, SetAttribute(attribute))?;
    }
    queue!(out, Print(content), SetAttribute(Attribute::Reset), ResetColor)
}

/// Rows below the first that `content` takes at `columns` cells per row.
/// Without a width only explicit newlines count.
fn rows_below(content: &str, columns: Option<u16>) -> u16 {
    let rows: usize = match columns.filter(|&c| c > 0) {
        Some(columns) => content
            .split('\n')
            .map(|line| string_width(line).div_ceil(usize::from(columns)).max(1))
            .sum(),
        None => content.split('\n').count(),
    };
    u16::try_from(rows.saturating_sub(1)).unwrap_or(u16::MAX)
}

// =============================================================================
// TERMINAL SURFACE
// =============================================================================

/// A [`Surface`] drawing inline into a terminal.
///
/// Surface calls only record state; nothing reaches the writer until
/// [`TerminalSurface::flush`].
pub struct TerminalSurface<W: Write> {
    out: W,
    text: String,
    text_paint: Paint,
    cursor_glyph: Option<String>,
    cursor_paint: Paint,
    dirty: Dirty,
    /// Rows drawn below the first by the previous draw
    drawn_lines: u16,
    /// Terminal width, for counting wrapped rows
    columns: Option<u16>,
    /// Re-read the width from the terminal on every draw
    track_size: bool,
    transition: Duration,
    transition_deadline: Option<Instant>,
    released: bool,
}

impl TerminalSurface<io::Stdout> {
    /// Draw to stdout, following the terminal's width.
    pub fn stdout() -> Self {
        let mut surface = Self::new(io::stdout());
        surface.track_size = true;
        surface
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            text: String::new(),
            text_paint: Paint::default(),
            cursor_glyph: None,
            cursor_paint: Paint::default(),
            dirty: Dirty::all(),
            drawn_lines: 0,
            columns: None,
            track_size: false,
            transition: DEFAULT_TRANSITION,
            transition_deadline: None,
            released: false,
        }
    }

    pub fn with_transition(mut self, transition: Duration) -> Self {
        self.transition = transition;
        self
    }

    /// Fix the width used to count wrapped rows.
    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = Some(columns);
        self.track_size = false;
        self
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// When the running cursor transition finishes.
    pub fn transition_deadline(&self) -> Option<Instant> {
        self.transition_deadline
    }

    /// Whether a transition finished by `now`. Reports each one once.
    pub fn take_finished_transition(&mut self, now: Instant) -> bool {
        match self.transition_deadline {
            Some(at) if at <= now => {
                self.transition_deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Redraw if anything changed.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        self.dirty = Dirty::empty();

        if self.drawn_lines > 0 {
            queue!(self.out, MoveUp(self.drawn_lines))?;
        }
        queue!(self.out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;

        if self.released {
            self.drawn_lines = 0;
            return self.out.flush();
        }

        paint_into(&mut self.out, &self.text_paint, &self.text)?;
        let mut drawn = self.text.clone();
        if let Some(glyph) = &self.cursor_glyph {
            paint_into(&mut self.out, &self.cursor_paint, glyph)?;
            drawn.push_str(glyph);
        }

        if self.track_size {
            self.columns = terminal::size().ok().map(|(columns, _)| columns).or(self.columns);
        }
        self.drawn_lines = rows_below(&drawn, self.columns);
        self.out.flush()
    }

    /// Draw pending changes and leave the shell cursor on a fresh line.
    pub fn finish(&mut self) -> io::Result<()> {
        self.flush()?;
        if !self.released {
            queue!(self.out, Print("\n"))?;
        }
        self.drawn_lines = 0;
        self.out.flush()
    }

    fn paint_mut(&mut self, part: Part) -> Option<&mut Paint> {
        match part {
            Part::Text if !self.released => Some(&mut self.text_paint),
            Part::Cursor if self.cursor_glyph.is_some() => Some(&mut self.cursor_paint),
            _ => None,
        }
    }

    fn mark(&mut self, part: Part, flags: Dirty) {
        self.dirty |= flags;
        if part == Part::Cursor {
            self.dirty |= Dirty::CURSOR;
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn set_text(&mut self, text: &str) {
        if self.released || self.text == text {
            return;
        }
        self.text.clear();
        self.text.push_str(text);
        self.dirty |= Dirty::TEXT;
    }

    fn attach_cursor(&mut self, glyph: &str) {
        self.cursor_glyph = Some(glyph.to_string());
        self.cursor_paint = Paint::default();
        self.dirty |= Dirty::CURSOR;
    }

    fn detach_cursor(&mut self) {
        self.cursor_glyph = None;
        self.cursor_paint = Paint::default();
        self.transition_deadline = None;
        self.dirty |= Dirty::CURSOR;
    }

    fn set_opacity(&mut self, part: Part, opacity: Opacity) {
        let transition = self.transition;
        let Some(paint) = self.paint_mut(part) else {
            return;
        };
        if paint.opacity == opacity {
            return;
        }
        paint.opacity = opacity;
        if part == Part::Cursor {
            self.transition_deadline = Some(Instant::now() + transition);
        }
        self.mark(part, Dirty::STYLE);
    }

    fn set_color(&mut self, part: Part, color: &str) {
        let parsed = parse_color(color);
        if parsed.is_none() {
            tracing::debug!(part = part.name(), color, "unrecognised colour, using terminal default");
        }
        if let Some(paint) = self.paint_mut(part) {
            paint.color = parsed;
            self.mark(part, Dirty::STYLE);
        }
    }

    fn add_class(&mut self, part: Part, class: &str) {
        if let Some(paint) = self.paint_mut(part) {
            if !paint.classes.iter().any(|c| c == class) {
                paint.classes.push(class.to_string());
                self.mark(part, Dirty::STYLE);
            }
        }
    }

    fn remove_class(&mut self, part: Part, class: &str) {
        if let Some(paint) = self.paint_mut(part) {
            paint.classes.retain(|c| c != class);
            self.mark(part, Dirty::STYLE);
        }
    }

    fn release(&mut self) {
        self.released = true;
        self.text.clear();
        self.cursor_glyph = None;
        self.transition_deadline = None;
        self.dirty = Dirty::all();
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// A typewriter drawing into a terminal in real time.
pub type TerminalTypewriter<W> = Typewriter<SystemScheduler, TerminalSurface<W>>;

/// Dispatch events in real time until `until` returns true or nothing is
/// left to wait for.
///
/// Sleeps until the earliest scheduler deadline or cursor transition end,
/// delivers whatever is due, then redraws.
pub fn run<W: Write>(
    typewriter: &mut TerminalTypewriter<W>,
    mut until: impl FnMut(&TerminalTypewriter<W>) -> bool,
) -> Result<()> {
    loop {
        typewriter.surface_mut().flush()?;
        if until(typewriter) {
            return Ok(());
        }

        if typewriter.surface_mut().take_finished_transition(Instant::now()) {
            typewriter.handle(HostEvent::TransitionEnd)?;
            continue;
        }
        if let Some(event) = typewriter.scheduler_mut().pop_due() {
            typewriter.handle(event)?;
            continue;
        }

        let deadline = [
            typewriter.scheduler().next_deadline(),
            typewriter.surface().transition_deadline(),
        ]
        .into_iter()
        .flatten()
        .min();

        match deadline {
            Some(at) => thread::sleep(at.saturating_duration_since(Instant::now())),
            None => return Ok(()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> TerminalSurface<Vec<u8>> {
        TerminalSurface::new(Vec::new())
    }

    fn output(surface: &TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8_lossy(surface.writer()).into_owned()
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("reset"), Some(Color::Reset));
        assert_eq!(parse_color("#ff8000"), Some(Color::Rgb { r: 255, g: 128, b: 0 }));
        assert_eq!(parse_color("#ff80"), None);
        assert_eq!(parse_color("#gg0000"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_flush_draws_text_and_cursor() {
        let mut surface = setup();
        surface.set_text("hello");
        surface.attach_cursor("_");
        surface.flush().unwrap();

        let drawn = output(&surface);
        let text_at = drawn.find("hello").unwrap();
        let cursor_at = drawn.find('_').unwrap();
        assert!(text_at < cursor_at);
        assert!(surface.dirty().is_empty());
    }

    #[test]
    fn test_clean_surface_writes_nothing() {
        let mut surface = setup();
        surface.flush().unwrap();
        let len = surface.writer().len();

        surface.flush().unwrap();
        assert_eq!(surface.writer().len(), len);

        // same text again is not a change
        surface.set_text("");
        assert!(surface.dirty().is_empty());
    }

    #[test]
    fn test_hidden_cursor_is_blanked() {
        let mut surface = setup();
        surface.attach_cursor("|");
        surface.flush().unwrap();

        surface.set_opacity(Part::Cursor, Opacity::Transparent);
        assert!(surface.dirty().contains(Dirty::CURSOR | Dirty::STYLE));
        let before = surface.writer().len();
        surface.flush().unwrap();

        let redraw = String::from_utf8_lossy(&surface.writer()[before..]).into_owned();
        assert!(!redraw.contains('|'));
    }

    #[test]
    fn test_cursor_opacity_starts_a_transition() {
        let mut surface = setup().with_transition(Duration::from_millis(0));
        surface.set_opacity(Part::Cursor, Opacity::Transparent);
        assert!(surface.transition_deadline().is_none(), "no cursor attached");

        surface.attach_cursor("|");
        surface.set_opacity(Part::Cursor, Opacity::Transparent);
        let deadline = surface.transition_deadline().unwrap();

        assert!(surface.take_finished_transition(deadline));
        assert!(!surface.take_finished_transition(deadline));
    }

    #[test]
    fn test_multiline_redraw_moves_back_up() {
        let mut surface = setup();
        surface.set_text("one\ntwo");
        surface.flush().unwrap();
        let before = surface.writer().len();

        surface.set_text("one\ntwo!");
        surface.flush().unwrap();
        let redraw = String::from_utf8_lossy(&surface.writer()[before..]).into_owned();
        // CSI 1 A
        assert!(redraw.starts_with("\u{1b}[1A"));
    }

    #[test]
    fn test_wrapped_line_redraw_moves_back_up() {
        let mut surface = setup().with_columns(5);
        surface.set_text("abcdefgh");
        surface.flush().unwrap();
        let before = surface.writer().len();

        surface.set_text("abcdefghi");
        surface.flush().unwrap();
        let redraw = String::from_utf8_lossy(&surface.writer()[before..]).into_owned();
        assert!(redraw.starts_with("\u{1b}[1A"));
    }

    #[test]
    fn test_rows_below_counts_wraps_and_newlines() {
        assert_eq!(rows_below("", Some(5)), 0);
        assert_eq!(rows_below("abcde", Some(5)), 0);
        assert_eq!(rows_below("abcdef", Some(5)), 1);
        assert_eq!(rows_below("ab\n\nabcdefghijk", Some(5)), 4);
        // wide clusters take two cells
        assert_eq!(rows_below("日本語", Some(4)), 1);
        assert_eq!(rows_below("abcdefghij\nx", None), 1);
    }

    #[test]
    fn test_attribute_classes() {
        let paint = Paint {
            classes: vec!["type-span".into(), "bold".into()],
            ..Default::default()
        };
        assert_eq!(paint.attributes().collect::<Vec<_>>(), vec![Attribute::Bold]);
    }
}
