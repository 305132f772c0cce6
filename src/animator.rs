//! Per-character animator.
//!
//! An [`Animation`] types or deletes one grapheme cluster per commit. The
//! interpreter polls it on every host frame; a commit happens once the delay
//! drawn for the pending character has elapsed since the previous commit.
//!
//! # Speed
//!
//! - `Speed::Fixed(ms)`: every character waits `ms`
//! - `Speed::Natural`: every character draws its own wait from `[min, max)`
//!
//! Deleting always works on the current buffer, so a delete that asks for
//! more clusters than are visible stops when the buffer is empty.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Options, Speed};
use crate::text::{GraphemeBuffer, Segmenter};
use crate::types::Millis;

// =============================================================================
// PACE
// =============================================================================

/// Source of per-character delays.
#[derive(Debug, Clone)]
pub struct Pace {
    rng: StdRng,
}

impl Default for Pace {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Pace {
    /// Deterministic delays, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Delay for one character.
    pub fn delay(&mut self, speed: Speed, min: Millis, max: Millis) -> Millis {
        match speed {
            Speed::Fixed(ms) => ms,
            Speed::Natural if min < max => self.rng.gen_range(min..max),
            // rejected by Options::validate; never panic on it
            Speed::Natural => min,
        }
    }

    pub fn type_delay(&mut self, options: &Options) -> Millis {
        self.delay(options.type_speed, options.type_speed_min, options.type_speed_max)
    }

    pub fn delete_delay(&mut self, options: &Options) -> Millis {
        self.delay(options.delete_speed, options.delete_speed_min, options.delete_speed_max)
    }
}

// =============================================================================
// ANIMATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Job {
    Type(VecDeque<String>),
    Delete(usize),
}

/// What a tick did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Added,
    Deleted,
}

/// Outcome of one frame poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub edit: Option<Edit>,
    /// The animation has nothing left to do.
    pub done: bool,
}

/// A typing or deleting run in progress.
#[derive(Debug, Clone)]
pub struct Animation {
    job: Job,
    last_commit: Millis,
    delay: Millis,
}

impl Animation {
    /// Type `content` cluster by cluster, starting the clock at `now`.
    pub fn typing(
        content: &str,
        segmenter: &dyn Segmenter,
        now: Millis,
        pace: &mut Pace,
        options: &Options,
    ) -> Self {
        let clusters = segmenter.graphemes(content).into_iter().map(str::to_string).collect();
        Self {
            job: Job::Type(clusters),
            last_commit: now,
            delay: pace.type_delay(options),
        }
    }

    /// Delete up to `count` clusters from the end of the buffer.
    pub fn deleting(count: usize, now: Millis, pace: &mut Pace, options: &Options) -> Self {
        Self {
            job: Job::Delete(count),
            last_commit: now,
            delay: pace.delete_delay(options),
        }
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.job, Job::Type(_))
    }

    /// Clusters still to be typed or deleted. A delete reports what was asked
    /// for, which may exceed what is visible.
    pub fn remaining(&self) -> usize {
        match &self.job {
            Job::Type(clusters) => clusters.len(),
            Job::Delete(count) => *count,
        }
    }

    fn exhausted(&self, buffer: &GraphemeBuffer) -> bool {
        match &self.job {
            Job::Type(clusters) => clusters.is_empty(),
            Job::Delete(count) => *count == 0 || buffer.is_empty(),
        }
    }

    /// Poll at `now`, committing at most one cluster.
    pub fn tick(
        &mut self,
        now: Millis,
        buffer: &mut GraphemeBuffer,
        pace: &mut Pace,
        options: &Options,
    ) -> Tick {
        if self.exhausted(buffer) {
            return Tick { edit: None, done: true };
        }

        if now.saturating_sub(self.last_commit) < self.delay {
            return Tick { edit: None, done: false };
        }

        let edit = match &mut self.job {
            Job::Type(clusters) => {
                let cluster = clusters.pop_front();
                cluster.map(|c| {
                    buffer.push(&c);
                    Edit::Added
                })
            }
            Job::Delete(count) => buffer.pop().map(|_| {
                *count -= 1;
                Edit::Deleted
            }),
        };

        self.last_commit = now;
        self.delay = if self.is_typing() {
            pace.type_delay(options)
        } else {
            pace.delete_delay(options)
        };

        Tick {
            edit,
            done: self.exhausted(buffer),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
