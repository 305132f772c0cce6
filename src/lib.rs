//! # spark-typewriter
//!
//! Typewriter text animation for terminals.
//!
//! Text is typed and deleted one grapheme cluster at a time, with pauses
//! after punctuation and a cursor that blinks on its own. A script is built
//! with a fluent API and interpreted one command at a time.
//!
//! ## Architecture
//!
//! ```text
//! authoring API ─▶ tokenizer ─▶ command queue ─▶ interpreter ─▶ animator ─▶ GraphemeBuffer
//!                                                     │                           │
//!                                                     ▼                           ▼
//!                                               CursorBlink ──────────────▶ Surface
//! ```
//!
//! The interpreter never blocks. It registers frames and delays with a
//! [`Scheduler`] and is resumed by [`Typewriter::handle`] when the host
//! reports one as due. Observable state is also published through
//! spark-signals (`text_signal`, `cursor_visible_signal`).
//!
//! ## Modules
//!
//! - [`tokenizer`] - text to commands, with punctuation pauses
//! - [`text`] - grapheme segmentation, the visible buffer, display width
//! - [`animator`] - per-character typing and deleting
//! - [`cursor`] - cursor blink state machine
//! - [`typewriter`] - queue interpreter and authoring API
//! - [`host`] - scheduler and surface contracts, headless and terminal hosts
//! - [`config`] - options, defaults and TOML patches
//!
//! ## Example
//!
//! ```ignore
//! use spark_typewriter::{Options, Typewriter};
//!
//! let mut tw = Typewriter::headless(Options::default())?;
//! tw.type_text("Hi, there.").pause(500).clear();
//! tw.start()?;
//! tw.run_to_end(10_000)?;
//! assert_eq!(tw.text(), "");
//! ```

pub mod animator;
pub mod command;
pub mod config;
pub mod cursor;
pub mod error;
pub mod host;
pub mod text;
pub mod tokenizer;
pub mod typewriter;
pub mod types;

pub use types::*;

pub use animator::{Animation, Pace};
pub use command::{Callback, Command, Hook};
pub use config::{Options, OptionsPatch, Setting, Speed};
pub use cursor::{CursorBlink, CursorPhase};
pub use error::{ConfigError, Result, TypewriterError};
pub use host::{
    run, FrameToken, HostEvent, ManualScheduler, MemorySurface, Scheduler, Surface,
    SystemScheduler, TerminalSurface, TimerToken,
};
pub use text::{GraphemeBuffer, Segmenter, UnicodeSegmenter};
pub use tokenizer::{tokenize, RestType};
pub use typewriter::Typewriter;
