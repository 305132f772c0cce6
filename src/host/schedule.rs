//! Frame and delay schedulers.
//!
//! Both schedulers share one [`EventQueue`] and differ only in where `now`
//! comes from.
//!
//! # Ordering
//!
//! - A frame is due on the next frame boundary strictly after the request
//! - A timer is due `delay` ms after the request
//! - At equal due times timers fire before frames, then registration order

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use super::{FrameToken, HostEvent, Scheduler, TimerToken};
use crate::types::Millis;

/// Roughly 60 frames per second.
pub const DEFAULT_FRAME_INTERVAL: Millis = 16;

const RANK_TIMER: u8 = 0;
const RANK_FRAME: u8 = 1;

// =============================================================================
// EVENT QUEUE
// =============================================================================

/// Pending registrations ordered by due time.
#[derive(Debug, Clone)]
pub struct EventQueue {
    frame_interval: Millis,
    next_id: u64,
    /// (due, rank, id)
    pending: BTreeSet<(Millis, u8, u64)>,
}

impl EventQueue {
    pub fn new(frame_interval: Millis) -> Self {
        Self {
            frame_interval: frame_interval.max(1),
            next_id: 1,
            pending: BTreeSet::new(),
        }
    }

    fn issue(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn request_frame(&mut self, now: Millis) -> FrameToken {
        let id = self.issue();
        let due = (now / self.frame_interval + 1) * self.frame_interval;
        self.pending.insert((due, RANK_FRAME, id));
        FrameToken(id)
    }

    pub fn set_timeout(&mut self, now: Millis, delay: Millis) -> TimerToken {
        let id = self.issue();
        self.pending.insert((now.saturating_add(delay), RANK_TIMER, id));
        TimerToken(id)
    }

    /// Drop a registration by id. Frame and timer ids never collide.
    pub fn cancel(&mut self, id: u64) {
        self.pending.retain(|&(_, _, pending)| pending != id);
    }

    /// Due time of the earliest registration.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.first().map(|&(due, _, _)| due)
    }

    /// Remove and return the earliest registration due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<HostEvent> {
        let &(due, rank, id) = self.pending.first()?;
        if due > now {
            return None;
        }
        self.pending.pop_first();
        Some(match rank {
            RANK_TIMER => HostEvent::Timer(TimerToken(id)),
            _ => HostEvent::Frame(FrameToken(id)),
        })
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// =============================================================================
// MANUAL SCHEDULER
// =============================================================================

/// Scheduler on a virtual clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now: Millis,
    queue: EventQueue,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Millis) -> Self {
        Self {
            now: 0,
            queue: EventQueue::new(frame_interval),
        }
    }

    /// Jump the clock to the earliest registration and return it.
    ///
    /// Returns `None` when nothing is pending.
    pub fn advance_to_next(&mut self) -> Option<HostEvent> {
        let due = self.queue.next_deadline()?;
        self.now = self.now.max(due);
        self.queue.pop_due(self.now)
    }

    /// Move the clock forward without delivering anything.
    pub fn advance_by(&mut self, ms: Millis) {
        self.now += ms;
    }

    /// Next registration already due at the current time.
    pub fn pop_due(&mut self) -> Option<HostEvent> {
        self.queue.pop_due(self.now)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Millis {
        self.now
    }

    fn request_frame(&mut self) -> FrameToken {
        self.queue.request_frame(self.now)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queue.cancel(token.0);
    }

    fn set_timeout(&mut self, delay: Millis) -> TimerToken {
        self.queue.set_timeout(self.now, delay)
    }

    fn clear_timeout(&mut self, token: TimerToken) {
        self.queue.cancel(token.0);
    }
}

// =============================================================================
// SYSTEM SCHEDULER
// =============================================================================

/// Scheduler on the monotonic wall clock.
#[derive(Debug, Clone)]
pub struct SystemScheduler {
    origin: Instant,
    queue: EventQueue,
}

impl Default for SystemScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemScheduler {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Millis) -> Self {
        Self {
            origin: Instant::now(),
            queue: EventQueue::new(frame_interval),
        }
    }

    /// Wall-clock instant of a host time.
    pub fn instant_at(&self, at: Millis) -> Instant {
        self.origin + Duration::from_millis(at)
    }

    /// Earliest registration as a wall-clock instant.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline().map(|due| self.instant_at(due))
    }

    pub fn pop_due(&mut self) -> Option<HostEvent> {
        let now = self.now();
        self.queue.pop_due(now)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for SystemScheduler {
    fn now(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }

    fn request_frame(&mut self) -> FrameToken {
        let now = self.now();
        self.queue.request_frame(now)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queue.cancel(token.0);
    }

    fn set_timeout(&mut self, delay: Millis) -> TimerToken {
        let now = self.now();
        self.queue.set_timeout(now, delay)
    }

    fn clear_timeout(&mut self, token: TimerToken) {
        self.queue.cancel(token.0);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_land_on_next_boundary() {
        let mut scheduler = ManualScheduler::with_frame_interval(10);
        scheduler.advance_by(3);
        let token = scheduler.request_frame();

        assert_eq!(scheduler.advance_to_next(), Some(HostEvent::Frame(token)));
        assert_eq!(scheduler.now(), 10);

        // requested exactly on a boundary: the following one
        let token = scheduler.request_frame();
        assert_eq!(scheduler.advance_to_next(), Some(HostEvent::Frame(token)));
        assert_eq!(scheduler.now(), 20);
    }

    #[test]
    fn test_timer_fires_after_delay() {
        let mut scheduler = ManualScheduler::new();
        let token = scheduler.set_timeout(500);
        assert_eq!(scheduler.pop_due(), None);
        assert_eq!(scheduler.advance_to_next(), Some(HostEvent::Timer(token)));
        assert_eq!(scheduler.now(), 500);
        assert_eq!(scheduler.advance_to_next(), None);
    }

    #[test]
    fn test_timers_before_frames_at_same_time() {
        let mut scheduler = ManualScheduler::with_frame_interval(10);
        let frame = scheduler.request_frame();
        let timer = scheduler.set_timeout(10);

        assert_eq!(scheduler.advance_to_next(), Some(HostEvent::Timer(timer)));
        assert_eq!(scheduler.advance_to_next(), Some(HostEvent::Frame(frame)));
    }

    #[test]
    fn test_equal_timers_fire_in_registration_order() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.set_timeout(0);
        let second = scheduler.set_timeout(0);
        assert_eq!(scheduler.advance_to_next(), Some(HostEvent::Timer(first)));
        assert_eq!(scheduler.advance_to_next(), Some(HostEvent::Timer(second)));
    }

    #[test]
    fn test_cancelled_registrations_never_fire() {
        let mut scheduler = ManualScheduler::new();
        let frame = scheduler.request_frame();
        let timer = scheduler.set_timeout(100);
        scheduler.cancel_frame(frame);
        scheduler.clear_timeout(timer);

        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.advance_to_next(), None);

        // cancelling twice is harmless
        scheduler.clear_timeout(timer);
    }

    #[test]
    fn test_advance_by_does_not_deliver() {
        let mut scheduler = ManualScheduler::new();
        let token = scheduler.set_timeout(50);
        scheduler.advance_by(100);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.pop_due(), Some(HostEvent::Timer(token)));
    }

    #[test]
    fn test_system_scheduler_zero_delay_is_due() {
        let mut scheduler = SystemScheduler::new();
        let token = scheduler.set_timeout(0);
        assert_eq!(scheduler.pop_due(), Some(HostEvent::Timer(token)));
        assert!(scheduler.next_deadline().is_none());
    }
}
