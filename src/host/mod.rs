//! Host Module - what a typewriter needs from its environment
//!
//! The interpreter never sleeps, spawns or draws. It asks a [`Scheduler`] for
//! frame and delay registrations and draws through a [`Surface`]. When a
//! registration falls due the driver hands the matching [`HostEvent`] back to
//! [`crate::Typewriter::handle`].
//!
//! # Implementations
//!
//! - [`ManualScheduler`] - virtual clock, stepped explicitly (tests, replays)
//! - [`SystemScheduler`] - wall clock
//! - [`MemorySurface`] - headless surface that records what was drawn
//! - [`TerminalSurface`] - crossterm renderer plus the blocking [`run`] driver

mod memory;
mod schedule;
pub mod terminal;

pub use memory::MemorySurface;
pub use schedule::{EventQueue, ManualScheduler, SystemScheduler, DEFAULT_FRAME_INTERVAL};
pub use terminal::{run, TerminalSurface};

use crate::types::{Millis, Opacity, Part};

// =============================================================================
// TOKENS AND EVENTS
// =============================================================================

/// Handle to a pending frame registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// Handle to a pending delay registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// A host notification routed to a typewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// A frame registered with [`Scheduler::request_frame`] is due.
    Frame(FrameToken),
    /// A delay registered with [`Scheduler::set_timeout`] elapsed.
    Timer(TimerToken),
    /// The surface finished a style transition on the cursor.
    TransitionEnd,
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Frame and delay registrations.
///
/// Registrations are one-shot. Cancelling a token that already fired or was
/// never issued is a no-op.
pub trait Scheduler {
    /// Current time on the host clock.
    fn now(&self) -> Millis;

    /// Register for the next frame.
    fn request_frame(&mut self) -> FrameToken;

    fn cancel_frame(&mut self, token: FrameToken);

    /// Register for a notification `delay` ms from now.
    fn set_timeout(&mut self, delay: Millis) -> TimerToken;

    fn clear_timeout(&mut self, token: TimerToken);
}

// =============================================================================
// SURFACE
// =============================================================================

/// The visual container a typewriter draws into.
///
/// A surface starts with the text part present. The cursor part exists
/// between [`Surface::attach_cursor`] and [`Surface::detach_cursor`]; styling
/// calls aimed at a detached cursor are ignored.
///
/// Changing the cursor's opacity may run a visual transition. A surface that
/// does so must make sure [`HostEvent::TransitionEnd`] reaches the typewriter
/// once it finishes, since the cursor blink is driven by that signal.
pub trait Surface {
    /// Replace the visible text.
    fn set_text(&mut self, text: &str);

    fn attach_cursor(&mut self, glyph: &str);

    fn detach_cursor(&mut self);

    fn set_opacity(&mut self, part: Part, opacity: Opacity);

    fn set_color(&mut self, part: Part, color: &str);

    fn add_class(&mut self, part: Part, class: &str);

    fn remove_class(&mut self, part: Part, class: &str);

    /// Remove the text part. The surface is not drawn into afterwards.
    fn release(&mut self);
}
