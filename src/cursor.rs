//! Cursor Blink - transition-driven oscillator
//!
//! The cursor flips between visible and hidden. Each flip changes the
//! surface's cursor opacity; when the surface reports that the fade finished,
//! the next flip is scheduled `blink_speed` ms later. The loop therefore
//! sustains itself and never runs ahead of the rendering.
//!
//! # States
//!
//! ```text
//!            start(): flip after 0 ms
//!  VISIBLE ───────────────────────────▶ HIDDEN
//!     ▲    flip after blink_speed ms       │
//!     └──────── on TransitionEnd ──────────┘
//! ```
//!
//! `destroy()` cancels the pending flip and stops listening, so no flip is
//! scheduled afterwards.

use crate::host::{Scheduler, Surface, TimerToken};
use crate::types::{Millis, Opacity, Part};

/// Current blink phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    Visible,
    Hidden,
}

impl CursorPhase {
    #[inline]
    pub const fn is_visible(self) -> bool {
        matches!(self, CursorPhase::Visible)
    }

    #[inline]
    const fn flipped(self) -> Self {
        match self {
            CursorPhase::Visible => CursorPhase::Hidden,
            CursorPhase::Hidden => CursorPhase::Visible,
        }
    }
}

/// Blink state of an attached cursor.
#[derive(Debug, Clone)]
pub struct CursorBlink {
    phase: CursorPhase,
    oscillating: bool,
    blink_speed: Millis,
    /// Timer for the next flip, if one is scheduled
    pending: Option<TimerToken>,
}

impl CursorBlink {
    /// A visible, idle cursor.
    pub fn new(blink_speed: Millis) -> Self {
        Self {
            phase: CursorPhase::Visible,
            oscillating: false,
            blink_speed,
            pending: None,
        }
    }

    pub fn phase(&self) -> CursorPhase {
        self.phase
    }

    pub fn is_oscillating(&self) -> bool {
        self.oscillating
    }

    /// Takes effect from the next scheduled flip.
    pub fn set_blink_speed(&mut self, blink_speed: Millis) {
        self.blink_speed = blink_speed;
    }

    /// Begin oscillating. The first flip is immediate.
    pub fn start(&mut self, scheduler: &mut impl Scheduler) {
        if self.oscillating {
            return;
        }
        self.oscillating = true;
        self.pending = Some(scheduler.set_timeout(0));
    }

    /// Handle a timer. Returns the new phase if `token` was the pending flip.
    pub fn on_timer(&mut self, token: TimerToken, surface: &mut impl Surface) -> Option<CursorPhase> {
        if self.pending != Some(token) {
            return None;
        }
        self.pending = None;
        self.phase = self.phase.flipped();
        surface.set_opacity(Part::Cursor, Opacity::from_visible(self.phase.is_visible()));
        tracing::trace!(phase = ?self.phase, "cursor flip");
        Some(self.phase)
    }

    /// The fade started by the last flip finished: schedule the next one.
    pub fn on_transition_end(&mut self, scheduler: &mut impl Scheduler) {
        if !self.oscillating || self.pending.is_some() {
            return;
        }
        self.pending = Some(scheduler.set_timeout(self.blink_speed));
    }

    /// Stop listening and cancel the pending flip. The phase is kept.
    pub fn destroy(&mut self, scheduler: &mut impl Scheduler) {
        self.oscillating = false;
        if let Some(token) = self.pending.take() {
            scheduler.clear_timeout(token);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostEvent, ManualScheduler, MemorySurface};

    fn setup() -> (CursorBlink, ManualScheduler, MemorySurface) {
        let mut surface = MemorySurface::new();
        surface.attach_cursor("|");
        (CursorBlink::new(400), ManualScheduler::new(), surface)
    }

    /// Deliver the next timer, then the transition it started.
    fn step(cursor: &mut CursorBlink, scheduler: &mut ManualScheduler, surface: &mut MemorySurface) -> Option<CursorPhase> {
        let Some(HostEvent::Timer(token)) = scheduler.advance_to_next() else {
            return None;
        };
        let phase = cursor.on_timer(token, surface);
        if surface.take_transition() {
            cursor.on_transition_end(scheduler);
        }
        phase
    }

    #[test]
    fn test_first_flip_is_immediate() {
        let (mut cursor, mut scheduler, mut surface) = setup();
        cursor.start(&mut scheduler);

        assert_eq!(step(&mut cursor, &mut scheduler, &mut surface), Some(CursorPhase::Hidden));
        assert_eq!(scheduler.now(), 0);
        assert_eq!(surface.style(Part::Cursor).opacity, Opacity::Transparent);
    }

    #[test]
    fn test_phases_alternate_on_blink_speed() {
        let (mut cursor, mut scheduler, mut surface) = setup();
        cursor.start(&mut scheduler);

        let mut phases = Vec::new();
        let mut times = Vec::new();
        for _ in 0..6 {
            phases.push(step(&mut cursor, &mut scheduler, &mut surface).unwrap());
            times.push(scheduler.now());
        }

        use CursorPhase::*;
        assert_eq!(phases, vec![Hidden, Visible, Hidden, Visible, Hidden, Visible]);
        assert_eq!(times, vec![0, 400, 800, 1200, 1600, 2000]);
    }

    #[test]
    fn test_no_flip_without_transition_end() {
        let (mut cursor, mut scheduler, mut surface) = setup();
        cursor.start(&mut scheduler);

        let Some(HostEvent::Timer(token)) = scheduler.advance_to_next() else {
            panic!("expected the first flip");
        };
        cursor.on_timer(token, &mut surface);

        // the surface never finished its fade
        assert_eq!(scheduler.advance_to_next(), None);
    }

    #[test]
    fn test_destroy_cancels_pending_flip() {
        let (mut cursor, mut scheduler, mut surface) = setup();
        cursor.start(&mut scheduler);
        step(&mut cursor, &mut scheduler, &mut surface);
        assert_eq!(scheduler.pending(), 1);

        cursor.destroy(&mut scheduler);
        assert_eq!(scheduler.pending(), 0);
        assert!(!cursor.is_oscillating());

        // a late transition end schedules nothing
        cursor.on_transition_end(&mut scheduler);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let (mut cursor, mut scheduler, mut surface) = setup();
        let stray = scheduler.set_timeout(5);
        cursor.start(&mut scheduler);
        assert_eq!(cursor.on_timer(stray, &mut surface), None);
        assert_eq!(cursor.phase(), CursorPhase::Visible);
    }

    #[test]
    fn test_start_twice_keeps_one_flip() {
        let (mut cursor, mut scheduler, _surface) = setup();
        cursor.start(&mut scheduler);
        cursor.start(&mut scheduler);
        assert_eq!(scheduler.pending(), 1);
    }
}
