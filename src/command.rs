//! Queue commands.
//!
//! A typewriter's script is an ordered list of [`Command`]s. The authoring
//! API and the tokenizer append to it; the interpreter consumes it strictly in
//! order, one command at a time.

use std::fmt;
use std::rc::Rc;

use crate::config::Setting;
use crate::types::Millis;

// =============================================================================
// USER CODE
// =============================================================================

/// A queued user callback. Runs each time the interpreter reaches it, so a
/// looping queue runs it once per cycle.
pub struct Callback(Box<dyn FnMut() -> anyhow::Result<()>>);

impl Callback {
    pub fn new(f: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        Self(Box::new(f))
    }

    pub(crate) fn call(&mut self) -> anyhow::Result<()> {
        (self.0)()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// A per-event hook stored in the options (`onAddChar` and friends).
///
/// Hooks are shared, so cloning the options keeps the same hook. Two hooks
/// are equal only if they are the same allocation.
#[derive(Clone)]
pub struct Hook(Rc<dyn Fn() -> anyhow::Result<()>>);

impl Hook {
    pub fn new(f: impl Fn() -> anyhow::Result<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub(crate) fn call(&self) -> anyhow::Result<()> {
        (self.0)()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// =============================================================================
// COMMAND
// =============================================================================

/// One step of a typewriter script.
#[derive(Debug)]
pub enum Command {
    /// Type the content one grapheme cluster at a time.
    TypeText(String),
    /// Delete up to this many clusters from the end of the visible text.
    DeleteCount(usize),
    /// Delete every visible cluster, animated.
    DeleteAll,
    /// Blank the visible text at once, without animating.
    ClearText,
    /// Wait, with no other effect.
    Pause(Millis),
    /// Run user code, then continue at once.
    Callback(Callback),
    /// Attach (`true`) or detach (`false`) the cursor.
    ToggleCursor { show: bool },
    /// Merge one option into the live configuration.
    SetOption(Setting),
    /// Merge several options as one change, validated together.
    SetOptions(Vec<Setting>),
}

impl Command {
    /// Short name used in trace output.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::TypeText(_) => "type",
            Command::DeleteCount(_) => "delete",
            Command::DeleteAll => "delete-all",
            Command::ClearText => "clear-text",
            Command::Pause(_) => "pause",
            Command::Callback(_) => "callback",
            Command::ToggleCursor { .. } => "toggle-cursor",
            Command::SetOption(_) => "set-option",
            Command::SetOptions(_) => "set-options",
        }
    }
}

/// Callbacks never compare equal; everything else compares by value.
impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Command::TypeText(a), Command::TypeText(b)) => a == b,
            (Command::DeleteCount(a), Command::DeleteCount(b)) => a == b,
            (Command::DeleteAll, Command::DeleteAll) => true,
            (Command::ClearText, Command::ClearText) => true,
            (Command::Pause(a), Command::Pause(b)) => a == b,
            (Command::ToggleCursor { show: a }, Command::ToggleCursor { show: b }) => a == b,
            (Command::SetOption(a), Command::SetOption(b)) => a == b,
            (Command::SetOptions(a), Command::SetOptions(b)) => a == b,
            _ => false,
        }
    }
}
