//! Typewriter - the command queue interpreter
//!
//! Owns the script, the visible text and the live options, and walks the
//! script one command at a time. Commands that finish at once (callbacks,
//! option changes, cursor toggles, instant clears) are chained in a loop;
//! commands that take time (typing, deleting, pauses) register with the
//! scheduler and the walk resumes when [`Typewriter::handle`] receives the
//! matching event.
//!
//! # Pattern
//!
//! ```ignore
//! use spark_typewriter::{Typewriter, Options, ManualScheduler, MemorySurface};
//!
//! let mut tw = Typewriter::new(ManualScheduler::new(), MemorySurface::new(), Options::default())?;
//! tw.type_text("Hello, world.")
//!     .pause(1000)
//!     .remove(6)
//!     .type_text("there!");
//! tw.start()?;
//!
//! while tw.is_running() {
//!     tw.step()?;
//! }
//! ```
//!
//! # Guarantees
//!
//! - Command `i + 1` starts only after command `i` resolved
//! - At most one frame and one step timer are registered at any time, plus
//!   the cursor's own flip timer
//! - Events carrying a token that is no longer awaited are ignored

use spark_signals::{signal, Signal};
use tracing::{debug, trace, warn};

use crate::animator::{Animation, Edit, Pace};
use crate::command::{Callback, Command, Hook};
use crate::config::{Options, OptionsPatch, Setting};
use crate::cursor::{CursorBlink, CursorPhase};
use crate::error::{ConfigError, Result, TypewriterError};
use crate::host::{FrameToken, HostEvent, ManualScheduler, MemorySurface, Scheduler, Surface, TimerToken};
use crate::text::{wrap, GraphemeBuffer, Segmenter, UnicodeSegmenter};
use crate::tokenizer::tokenize;
use crate::types::{Millis, Part};

// =============================================================================
// ACTIVITY
// =============================================================================

/// What the interpreter is waiting on.
#[derive(Debug, Default)]
enum Activity {
    #[default]
    Idle,
    /// The clear that precedes the first command after a start.
    Clearing { animation: Animation, frame: FrameToken },
    /// A `TypeText` / `DeleteCount` / `DeleteAll` in progress.
    Animating { animation: Animation, frame: FrameToken },
    Pausing { timer: TimerToken },
}

/// Resolution of a command, as seen by the walk.
enum Flow {
    Resolved,
    Waiting,
}

/// Owned copy of the parts of a command needed to begin it.
enum Begin {
    Type(String),
    Delete(usize),
    DeleteAll,
    Clear,
    Pause(Millis),
    Call,
    Cursor(bool),
    Set(Vec<Setting>),
}

// =============================================================================
// TYPEWRITER
// =============================================================================

/// A typewriter bound to a scheduler and a surface.
pub struct Typewriter<S: Scheduler, R: Surface> {
    scheduler: S,
    surface: R,
    segmenter: Box<dyn Segmenter>,
    pace: Pace,
    options: Options,
    buffer: GraphemeBuffer,
    queue: Vec<Command>,
    index: usize,
    running: bool,
    destroyed: bool,
    activity: Activity,
    /// Present while the cursor is attached
    cursor: Option<CursorBlink>,
    text_signal: Signal<String>,
    cursor_visible: Signal<bool>,
}

impl<S: Scheduler, R: Surface> Typewriter<S, R> {
    /// Create a typewriter and style the text part.
    ///
    /// Fails if `options` holds a speed that cannot produce a delay.
    pub fn new(scheduler: S, mut surface: R, options: Options) -> Result<Self, ConfigError> {
        let options = options.validated()?;
        surface.add_class(Part::Text, &options.type_class);
        surface.set_color(Part::Text, &options.type_color);

        Ok(Self {
            scheduler,
            surface,
            segmenter: Box::new(UnicodeSegmenter),
            pace: Pace::default(),
            options,
            buffer: GraphemeBuffer::new(),
            queue: Vec::new(),
            index: 0,
            running: false,
            destroyed: false,
            activity: Activity::Idle,
            cursor: None,
            text_signal: signal(String::new()),
            cursor_visible: signal(false),
        })
    }

    /// Replace the grapheme segmenter.
    pub fn with_segmenter(mut self, segmenter: impl Segmenter + 'static) -> Self {
        self.segmenter = Box::new(segmenter);
        self
    }

    /// Replace the delay source, e.g. with [`Pace::seeded`].
    pub fn with_pace(mut self, pace: Pace) -> Self {
        self.pace = pace;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The visible text.
    pub fn text(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn buffer(&self) -> &GraphemeBuffer {
        &self.buffer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn queue(&self) -> &[Command] {
        &self.queue
    }

    /// Index of the command being interpreted, or next to be.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn has_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn cursor_phase(&self) -> Option<CursorPhase> {
        self.cursor.as_ref().map(CursorBlink::phase)
    }

    pub fn is_cursor_blinking(&self) -> bool {
        self.cursor.as_ref().is_some_and(CursorBlink::is_oscillating)
    }

    /// Signal holding the rendered text.
    pub fn text_signal(&self) -> Signal<String> {
        self.text_signal.clone()
    }

    /// Signal holding whether the cursor is attached and in its visible phase.
    pub fn cursor_visible_signal(&self) -> Signal<bool> {
        self.cursor_visible.clone()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    // =========================================================================
    // Authoring
    // =========================================================================

    /// Append a command.
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.queue.push(command);
        self
    }

    /// Type text with punctuation-aware pauses. A backslash starts a new
    /// screen.
    pub fn type_text(&mut self, text: &str) -> &mut Self {
        self.queue.extend(tokenize(text));
        self
    }

    /// Type each item in turn, holding `interval` ms after each (0 = no hold)
    /// and deleting what was typed before the next one.
    pub fn strings<I, T>(&mut self, interval: Millis, items: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut items = items.into_iter().peekable();
        while let Some(item) = items.next() {
            let commands = tokenize(item.as_ref());
            let typed = self.typed_on_last_screen(&commands);
            self.queue.extend(commands);

            if interval > 0 {
                self.queue.push(Command::Pause(interval));
            }
            if items.peek().is_some() {
                self.queue.push(Command::DeleteCount(typed));
            }
        }
        self
    }

    /// Clusters left on screen after running `commands` from a blank screen.
    fn typed_on_last_screen(&self, commands: &[Command]) -> usize {
        commands.iter().fold(0, |count, command| match command {
            Command::TypeText(content) => count + self.segmenter.count(content),
            Command::ClearText => 0,
            _ => count,
        })
    }

    /// Delete `count` clusters, animated.
    pub fn remove(&mut self, count: usize) -> &mut Self {
        self.push(Command::DeleteCount(count))
    }

    /// Delete everything visible, animated.
    pub fn clear(&mut self) -> &mut Self {
        self.push(Command::DeleteAll)
    }

    /// Blank the text at this point of the script, without animating.
    pub fn queue_clear_text(&mut self) -> &mut Self {
        self.push(Command::ClearText)
    }

    pub fn pause(&mut self, ms: Millis) -> &mut Self {
        self.push(Command::Pause(ms))
    }

    /// Run `f` when the script reaches this point.
    pub fn then(&mut self, f: impl FnMut() -> anyhow::Result<()> + 'static) -> &mut Self {
        self.push(Command::Callback(Callback::new(f)))
    }

    pub fn add_cursor(&mut self) -> &mut Self {
        self.push(Command::ToggleCursor { show: true })
    }

    pub fn remove_cursor(&mut self) -> &mut Self {
        self.push(Command::ToggleCursor { show: false })
    }

    pub fn set(&mut self, setting: Setting) -> &mut Self {
        self.push(Command::SetOption(setting))
    }

    /// Queue a `key = value` option change.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<&mut Self, ConfigError> {
        let setting = Setting::parse(key, value)?;
        Ok(self.set(setting))
    }

    /// Queue every change in `patch` as one step. The merged result is
    /// validated once, so a patch may move a speed range past its old bounds.
    pub fn change_options(&mut self, patch: OptionsPatch) -> &mut Self {
        let settings = patch.into_settings();
        if settings.is_empty() {
            return self;
        }
        self.push(Command::SetOptions(settings))
    }

    pub fn change_type_color(&mut self, color: &str) -> &mut Self {
        self.set(Setting::TypeColor(color.to_string()))
    }

    pub fn change_cursor_color(&mut self, color: &str) -> &mut Self {
        self.set(Setting::CursorColor(color.to_string()))
    }

    pub fn change_type_class(&mut self, class: &str) -> &mut Self {
        self.set(Setting::TypeClass(class.to_string()))
    }

    pub fn change_cursor_class(&mut self, class: &str) -> &mut Self {
        self.set(Setting::CursorClass(class.to_string()))
    }

    pub fn on_add_char(&mut self, hook: Hook) -> &mut Self {
        self.set(Setting::OnAddChar(Some(hook)))
    }

    pub fn on_delete_char(&mut self, hook: Hook) -> &mut Self {
        self.set(Setting::OnDeleteChar(Some(hook)))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start interpreting from the first command.
    ///
    /// A no-op while running or after [`Typewriter::destroy`]. Visible text is
    /// deleted first, animated; with nothing visible the first commands run
    /// before this returns, so an error from one of them is returned here.
    pub fn start(&mut self) -> Result<()> {
        if self.running || self.destroyed {
            return Ok(());
        }
        debug!(commands = self.queue.len(), "typewriter start");

        self.ensure_cursor();
        self.running = true;
        self.index = 0;

        if self.buffer.is_empty() {
            return self.advance();
        }
        self.begin_clearing();
        Ok(())
    }

    /// Cancel the step in progress and stop the cursor blink. The text stays.
    pub fn stop(&mut self) {
        if self.running {
            debug!(position = self.index, "typewriter stop");
        }
        self.running = false;
        self.cancel_activity();
        if let Some(blink) = &mut self.cursor {
            blink.destroy(&mut self.scheduler);
        }
    }

    /// Stop, remove the cursor and release the surface. Final.
    pub fn destroy(&mut self) {
        self.stop();
        self.detach_cursor();
        self.surface.release();
        self.destroyed = true;
    }

    /// Drop every command and blank the text at once.
    ///
    /// A step in progress is cancelled too and the run ends without firing
    /// `on_last_char`. The cursor keeps blinking.
    pub fn clear_queue(&mut self) -> &mut Self {
        self.cancel_activity();
        self.running = false;
        self.queue.clear();
        self.index = 0;
        self.clear_text()
    }

    /// Blank the text at once, outside the script.
    pub fn clear_text(&mut self) -> &mut Self {
        self.buffer.clear();
        self.render();
        self
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Route a host event.
    ///
    /// Errors come from callbacks, hooks and option merges reached while
    /// resuming the script; the typewriter is stopped when one is returned.
    pub fn handle(&mut self, event: HostEvent) -> Result<()> {
        match event {
            HostEvent::Frame(token) => self.on_frame(token),
            HostEvent::Timer(token) => {
                self.on_timer(token);
                if !self.running {
                    return Ok(());
                }
                self.advance()
            }
            HostEvent::TransitionEnd => {
                if let Some(blink) = &mut self.cursor {
                    blink.on_transition_end(&mut self.scheduler);
                }
                Ok(())
            }
        }
    }

    fn on_timer(&mut self, token: TimerToken) {
        if let Activity::Pausing { timer } = self.activity {
            if timer == token {
                self.activity = Activity::Idle;
                self.index += 1;
                return;
            }
        }

        if let Some(blink) = &mut self.cursor {
            if let Some(phase) = blink.on_timer(token, &mut self.surface) {
                self.cursor_visible.set(phase.is_visible());
            }
        }
    }

    fn on_frame(&mut self, token: FrameToken) -> Result<()> {
        let now = self.scheduler.now();
        let (tick, clearing) = match &mut self.activity {
            Activity::Clearing { animation, frame } if *frame == token => {
                (animation.tick(now, &mut self.buffer, &mut self.pace, &self.options), true)
            }
            Activity::Animating { animation, frame } if *frame == token => {
                (animation.tick(now, &mut self.buffer, &mut self.pace, &self.options), false)
            }
            _ => return Ok(()),
        };

        if let Some(edit) = tick.edit {
            self.render();
            let hook = match edit {
                Edit::Added => self.options.on_add_char.clone(),
                Edit::Deleted => self.options.on_delete_char.clone(),
            };
            self.fire(hook.as_ref())?;
        }

        if !tick.done {
            let next = self.scheduler.request_frame();
            if let Activity::Clearing { frame, .. } | Activity::Animating { frame, .. } = &mut self.activity {
                *frame = next;
            }
            return Ok(());
        }

        self.activity = Activity::Idle;
        if clearing {
            self.index = 0;
        } else {
            self.index += 1;
        }
        self.advance()
    }

    // =========================================================================
    // Interpretation
    // =========================================================================

    /// Resolve commands until one has to wait or the queue runs out.
    fn advance(&mut self) -> Result<()> {
        while self.running && matches!(self.activity, Activity::Idle) {
            if self.index >= self.queue.len() {
                return self.finish();
            }
            match self.begin(self.index) {
                Ok(Flow::Resolved) => self.index += 1,
                Ok(Flow::Waiting) => return Ok(()),
                Err(err) => return Err(self.fail(err)),
            }
        }
        Ok(())
    }

    fn begin(&mut self, index: usize) -> Result<Flow> {
        let step = match &self.queue[index] {
            Command::TypeText(content) => Begin::Type(content.clone()),
            Command::DeleteCount(count) => Begin::Delete(*count),
            Command::DeleteAll => Begin::DeleteAll,
            Command::ClearText => Begin::Clear,
            Command::Pause(ms) => Begin::Pause(*ms),
            Command::Callback(_) => Begin::Call,
            Command::ToggleCursor { show } => Begin::Cursor(*show),
            Command::SetOption(setting) => Begin::Set(vec![setting.clone()]),
            Command::SetOptions(settings) => Begin::Set(settings.clone()),
        };
        trace!(index, kind = self.queue[index].kind(), "command");

        let now = self.scheduler.now();
        match step {
            Begin::Type(content) if content.is_empty() => Ok(Flow::Resolved),
            Begin::Type(content) => {
                let content = self.wrapped(&content);
                let animation =
                    Animation::typing(&content, self.segmenter.as_ref(), now, &mut self.pace, &self.options);
                self.animate(animation);
                Ok(Flow::Waiting)
            }
            Begin::Delete(0) => Ok(Flow::Resolved),
            Begin::Delete(count) => {
                let animation = Animation::deleting(count, now, &mut self.pace, &self.options);
                self.animate(animation);
                Ok(Flow::Waiting)
            }
            Begin::DeleteAll => {
                let animation = Animation::deleting(self.buffer.len(), now, &mut self.pace, &self.options);
                self.animate(animation);
                Ok(Flow::Waiting)
            }
            Begin::Clear => {
                self.clear_text();
                Ok(Flow::Resolved)
            }
            Begin::Pause(ms) => {
                let timer = self.scheduler.set_timeout(ms);
                self.activity = Activity::Pausing { timer };
                Ok(Flow::Waiting)
            }
            Begin::Call => {
                if let Command::Callback(callback) = &mut self.queue[index] {
                    callback.call()?;
                }
                Ok(Flow::Resolved)
            }
            Begin::Cursor(true) => {
                self.attach_cursor();
                Ok(Flow::Resolved)
            }
            Begin::Cursor(false) => {
                self.detach_cursor();
                Ok(Flow::Resolved)
            }
            Begin::Set(settings) => {
                self.apply_settings(settings)?;
                Ok(Flow::Resolved)
            }
        }
    }

    /// End of the queue: loop or report completion.
    fn finish(&mut self) -> Result<()> {
        self.running = false;
        if self.options.looping {
            debug!("queue exhausted, looping");
            self.ensure_cursor();
            self.running = true;
            self.index = 0;
            self.begin_clearing();
            return Ok(());
        }

        debug!("queue exhausted");
        let hook = self.options.on_last_char.clone();
        self.fire(hook.as_ref())
    }

    /// Delete the visible text before the first command. Always waits for a
    /// frame, so a looping script yields to the host once per cycle.
    fn begin_clearing(&mut self) {
        let now = self.scheduler.now();
        let animation = Animation::deleting(self.buffer.len(), now, &mut self.pace, &self.options);
        let frame = self.scheduler.request_frame();
        self.activity = Activity::Clearing { animation, frame };
    }

    fn animate(&mut self, animation: Animation) {
        let frame = self.scheduler.request_frame();
        self.activity = Activity::Animating { animation, frame };
    }

    fn cancel_activity(&mut self) {
        match std::mem::take(&mut self.activity) {
            Activity::Idle => {}
            Activity::Clearing { frame, .. } | Activity::Animating { frame, .. } => {
                self.scheduler.cancel_frame(frame)
            }
            Activity::Pausing { timer } => self.scheduler.clear_timeout(timer),
        }
    }

    /// Apply the line-length limit to content about to be typed.
    fn wrapped(&self, content: &str) -> String {
        let limit = self.options.word_wrap_line_length_limit;
        if !self.options.prevent_word_wrap || limit == 0 {
            return content.to_string();
        }
        wrap::prewrap(wrap::trailing_line_width(self.buffer.as_str()), content, limit)
    }

    fn render(&mut self) {
        self.surface.set_text(self.buffer.as_str());
        self.text_signal.set(self.buffer.as_str().to_string());
    }

    fn fire(&mut self, hook: Option<&Hook>) -> Result<()> {
        match hook.map(Hook::call) {
            Some(Err(err)) => Err(self.fail(TypewriterError::Callback(err))),
            _ => Ok(()),
        }
    }

    fn fail(&mut self, err: TypewriterError) -> TypewriterError {
        warn!(position = self.index, error = %err, "typewriter halted");
        self.stop();
        err
    }

    // =========================================================================
    // Options
    // =========================================================================

    /// Merge settings into the live options, validate the result once and
    /// restyle what changed. On error nothing of the batch is kept.
    fn apply_settings(&mut self, settings: Vec<Setting>) -> Result<()> {
        let previous = self.options.clone();
        for setting in &settings {
            self.options.apply(setting);
        }
        if let Err(err) = self.options.validate() {
            self.options = previous;
            return Err(err.into());
        }

        for setting in settings {
            self.restyle(setting, &previous);
        }
        Ok(())
    }

    fn restyle(&mut self, setting: Setting, previous: &Options) {
        match setting {
            Setting::TypeColor(color) => self.surface.set_color(Part::Text, &color),
            Setting::CursorColor(color) => self.surface.set_color(Part::Cursor, &color),
            Setting::TypeClass(class) => {
                self.surface.remove_class(Part::Text, &previous.type_class);
                self.surface.add_class(Part::Text, &class);
            }
            Setting::CursorClass(class) => {
                self.surface.remove_class(Part::Cursor, &previous.cursor_class);
                self.surface.add_class(Part::Cursor, &class);
            }
            Setting::BlinkSpeed(ms) => {
                if let Some(blink) = &mut self.cursor {
                    blink.set_blink_speed(ms);
                }
            }
            Setting::AnimateCursor(animate) => {
                if let Some(blink) = &mut self.cursor {
                    if animate {
                        blink.start(&mut self.scheduler);
                    } else {
                        blink.destroy(&mut self.scheduler);
                    }
                }
            }
            _ => {}
        }
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    /// Attach the cursor if missing; restart its blink if it was stopped.
    fn ensure_cursor(&mut self) {
        if self.cursor.is_none() {
            self.attach_cursor();
            return;
        }
        if let (Some(blink), true) = (&mut self.cursor, self.options.animate_cursor) {
            blink.start(&mut self.scheduler);
        }
    }

    fn attach_cursor(&mut self) {
        if self.cursor.is_some() {
            return;
        }
        self.surface.attach_cursor(&self.options.cursor_char);
        self.surface.set_color(Part::Cursor, &self.options.cursor_color);
        self.surface.add_class(Part::Cursor, &self.options.cursor_class);

        let mut blink = CursorBlink::new(self.options.blink_speed);
        if self.options.animate_cursor {
            blink.start(&mut self.scheduler);
        }
        self.cursor = Some(blink);
        self.cursor_visible.set(true);
    }

    fn detach_cursor(&mut self) {
        if let Some(mut blink) = self.cursor.take() {
            blink.destroy(&mut self.scheduler);
            self.surface.detach_cursor();
            self.cursor_visible.set(false);
        }
    }
}

// =============================================================================
// HEADLESS DRIVING
// =============================================================================

impl Typewriter<ManualScheduler, MemorySurface> {
    /// A headless typewriter on a virtual clock.
    pub fn headless(options: Options) -> Result<Self, ConfigError> {
        Self::new(ManualScheduler::new(), MemorySurface::new(), options)
    }

    /// Deliver the next event: a finished cursor fade first, otherwise the
    /// earliest registration, moving the virtual clock to it.
    ///
    /// Returns `false` when nothing is pending.
    pub fn step(&mut self) -> Result<bool> {
        if self.surface.take_transition() {
            self.handle(HostEvent::TransitionEnd)?;
            return Ok(true);
        }
        match self.scheduler.advance_to_next() {
            Some(event) => {
                self.handle(event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Step until the script is no longer running, at most `limit` events.
    ///
    /// Returns the number of events delivered.
    pub fn run_to_end(&mut self, limit: usize) -> Result<usize> {
        let mut delivered = 0;
        while self.running && delivered < limit {
            if !self.step()? {
                break;
            }
            delivered += 1;
        }
        Ok(delivered)
    }
}

// =============================================================================
// TESTS
// =============================================================================
