//! Typewriter configuration.
//!
//! [`Options`] holds the defaults and the live values used by the
//! interpreter. Overrides come in three shapes:
//!
//! - a [`Setting`]: one typed change, queued with `SetOption`
//! - `key = value` strings, parsed with [`Setting::parse`]
//! - an [`OptionsPatch`], deserialized from TOML or built in code
//!
//! Every merge is followed by [`Options::validate`], so a speed that could
//! never produce a delay is rejected before the animator sees it.
//!
//! # Example
//!
//! ```ignore
//! use spark_typewriter::config::{Options, OptionsPatch};
//!
//! let patch = OptionsPatch::from_toml_str(r#"
//!     loop = true
//!     typeSpeed = "natural"
//!     typeSpeedMin = 30
//!     typeSpeedMax = 80
//! "#)?;
//! let options = Options::default().merged(patch)?;
//! ```

use serde::Deserialize;

use crate::command::Hook;
use crate::error::ConfigError;
use crate::types::Millis;

// =============================================================================
// SPEED
// =============================================================================

/// Delay between two committed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SpeedRepr")]
pub enum Speed {
    /// The same delay for every character.
    Fixed(Millis),
    /// A fresh delay drawn from `[min, max)` for every character.
    Natural,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpeedRepr {
    Fixed(Millis),
    Named(String),
}

impl TryFrom<SpeedRepr> for Speed {
    type Error = String;

    fn try_from(value: SpeedRepr) -> Result<Self, Self::Error> {
        match value {
            SpeedRepr::Fixed(ms) => Ok(Speed::Fixed(ms)),
            SpeedRepr::Named(name) => {
                Speed::from_name(&name).ok_or_else(|| format!("unknown speed {name:?}"))
            }
        }
    }
}

impl Speed {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "natural" | "random" | "variable" => Some(Speed::Natural),
            other => other.parse().ok().map(Speed::Fixed),
        }
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Live configuration of a typewriter.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Restart the queue when it runs out (default: false)
    pub looping: bool,
    /// Blink the cursor (default: true)
    pub animate_cursor: bool,
    /// Break lines before a word that would overflow (default: false)
    pub prevent_word_wrap: bool,
    /// Delay before each cursor flip, in ms (default: 400)
    pub blink_speed: Millis,
    pub type_speed: Speed,
    pub delete_speed: Speed,
    pub type_speed_min: Millis,
    pub type_speed_max: Millis,
    pub delete_speed_min: Millis,
    pub delete_speed_max: Millis,
    pub type_class: String,
    pub cursor_class: String,
    pub type_color: String,
    pub cursor_color: String,
    /// Line width used by `prevent_word_wrap`, in cells; 0 disables it
    pub word_wrap_line_length_limit: usize,
    /// Glyph drawn for the cursor (default: "|")
    pub cursor_char: String,
    pub on_add_char: Option<Hook>,
    pub on_delete_char: Option<Hook>,
    /// Fires when the queue is exhausted and `looping` is off
    pub on_last_char: Option<Hook>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            looping: false,
            animate_cursor: true,
            prevent_word_wrap: false,
            blink_speed: 400,
            type_speed: Speed::Fixed(90),
            delete_speed: Speed::Fixed(40),
            type_speed_min: 65,
            type_speed_max: 115,
            delete_speed_min: 40,
            delete_speed_max: 90,
            type_class: "type-span".to_string(),
            cursor_class: "cursor-span".to_string(),
            type_color: "black".to_string(),
            cursor_color: "black".to_string(),
            word_wrap_line_length_limit: 0,
            cursor_char: "|".to_string(),
            on_add_char: None,
            on_delete_char: None,
            on_last_char: None,
        }
    }
}

impl Options {
    /// Check that both speeds can produce a delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("typeSpeed", self.type_speed, self.type_speed_min, self.type_speed_max)?;
        check_range(
            "deleteSpeed",
            self.delete_speed,
            self.delete_speed_min,
            self.delete_speed_max,
        )
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Apply a patch over these options and validate the result.
    pub fn merged(mut self, patch: OptionsPatch) -> Result<Self, ConfigError> {
        for setting in patch.into_settings() {
            self.apply(&setting);
        }
        self.validated()
    }

    /// Store one setting. Does not validate; callers validate after merging.
    pub fn apply(&mut self, setting: &Setting) {
        match setting {
            Setting::Loop(v) => self.looping = *v,
            Setting::AnimateCursor(v) => self.animate_cursor = *v,
            Setting::PreventWordWrap(v) => self.prevent_word_wrap = *v,
            Setting::BlinkSpeed(v) => self.blink_speed = *v,
            Setting::TypeSpeed(v) => self.type_speed = *v,
            Setting::DeleteSpeed(v) => self.delete_speed = *v,
            Setting::TypeSpeedMin(v) => self.type_speed_min = *v,
            Setting::TypeSpeedMax(v) => self.type_speed_max = *v,
            Setting::DeleteSpeedMin(v) => self.delete_speed_min = *v,
            Setting::DeleteSpeedMax(v) => self.delete_speed_max = *v,
            Setting::TypeClass(v) => self.type_class = v.clone(),
            Setting::CursorClass(v) => self.cursor_class = v.clone(),
            Setting::TypeColor(v) => self.type_color = v.clone(),
            Setting::CursorColor(v) => self.cursor_color = v.clone(),
            Setting::WordWrapLineLengthLimit(v) => self.word_wrap_line_length_limit = *v,
            Setting::CursorChar(v) => self.cursor_char = v.clone(),
            Setting::OnAddChar(v) => self.on_add_char = v.clone(),
            Setting::OnDeleteChar(v) => self.on_delete_char = v.clone(),
            Setting::OnLastChar(v) => self.on_last_char = v.clone(),
        }
    }
}

fn check_range(key: &'static str, speed: Speed, min: Millis, max: Millis) -> Result<(), ConfigError> {
    match speed {
        Speed::Natural if min >= max => Err(ConfigError::EmptySpeedRange { key, min, max }),
        _ => Ok(()),
    }
}

// =============================================================================
// SETTING
// =============================================================================

/// One option change.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Loop(bool),
    AnimateCursor(bool),
    PreventWordWrap(bool),
    BlinkSpeed(Millis),
    TypeSpeed(Speed),
    DeleteSpeed(Speed),
    TypeSpeedMin(Millis),
    TypeSpeedMax(Millis),
    DeleteSpeedMin(Millis),
    DeleteSpeedMax(Millis),
    TypeClass(String),
    CursorClass(String),
    TypeColor(String),
    CursorColor(String),
    WordWrapLineLengthLimit(usize),
    CursorChar(String),
    OnAddChar(Option<Hook>),
    OnDeleteChar(Option<Hook>),
    OnLastChar(Option<Hook>),
}

impl Setting {
    /// The camelCase option key this setting changes.
    pub fn key(&self) -> &'static str {
        match self {
            Setting::Loop(_) => "loop",
            Setting::AnimateCursor(_) => "animateCursor",
            Setting::PreventWordWrap(_) => "preventWordWrap",
            Setting::BlinkSpeed(_) => "blinkSpeed",
            Setting::TypeSpeed(_) => "typeSpeed",
            Setting::DeleteSpeed(_) => "deleteSpeed",
            Setting::TypeSpeedMin(_) => "typeSpeedMin",
            Setting::TypeSpeedMax(_) => "typeSpeedMax",
            Setting::DeleteSpeedMin(_) => "deleteSpeedMin",
            Setting::DeleteSpeedMax(_) => "deleteSpeedMax",
            Setting::TypeClass(_) => "typeClass",
            Setting::CursorClass(_) => "cursorClass",
            Setting::TypeColor(_) => "typeColor",
            Setting::CursorColor(_) => "cursorColor",
            Setting::WordWrapLineLengthLimit(_) => "wordWrapLineLengthLimit",
            Setting::CursorChar(_) => "cursorChar",
            Setting::OnAddChar(_) => "onAddChar",
            Setting::OnDeleteChar(_) => "onDeleteChar",
            Setting::OnLastChar(_) => "onLastChar",
        }
    }

    /// Parse a `key = value` pair.
    ///
    /// Hooks cannot be expressed as strings and are rejected as invalid
    /// values; set them with the typed variants.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let flag = || parse_flag(value).ok_or_else(invalid);
        let millis = || value.trim().parse::<Millis>().map_err(|_| invalid());
        let speed = || Speed::from_name(value).ok_or_else(invalid);

        Ok(match key {
            "loop" => Setting::Loop(flag()?),
            "animateCursor" => Setting::AnimateCursor(flag()?),
            "preventWordWrap" => Setting::PreventWordWrap(flag()?),
            "blinkSpeed" => Setting::BlinkSpeed(millis()?),
            "typeSpeed" => Setting::TypeSpeed(speed()?),
            "deleteSpeed" => Setting::DeleteSpeed(speed()?),
            "typeSpeedMin" => Setting::TypeSpeedMin(millis()?),
            "typeSpeedMax" => Setting::TypeSpeedMax(millis()?),
            "deleteSpeedMin" => Setting::DeleteSpeedMin(millis()?),
            "deleteSpeedMax" => Setting::DeleteSpeedMax(millis()?),
            "typeClass" => Setting::TypeClass(value.to_string()),
            "cursorClass" => Setting::CursorClass(value.to_string()),
            "typeColor" => Setting::TypeColor(value.to_string()),
            "cursorColor" => Setting::CursorColor(value.to_string()),
            "wordWrapLineLengthLimit" => Setting::WordWrapLineLengthLimit(
                value.trim().parse().map_err(|_| invalid())?,
            ),
            "cursorChar" => Setting::CursorChar(value.to_string()),
            "onAddChar" | "onDeleteChar" | "onLastChar" => return Err(invalid()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// OPTIONS PATCH
// =============================================================================

/// A partial set of overrides, in the camelCase shape of the option keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptionsPatch {
    #[serde(rename = "loop")]
    pub looping: Option<bool>,
    pub animate_cursor: Option<bool>,
    pub prevent_word_wrap: Option<bool>,
    pub blink_speed: Option<Millis>,
    pub type_speed: Option<Speed>,
    pub delete_speed: Option<Speed>,
    pub type_speed_min: Option<Millis>,
    pub type_speed_max: Option<Millis>,
    pub delete_speed_min: Option<Millis>,
    pub delete_speed_max: Option<Millis>,
    pub type_class: Option<String>,
    pub cursor_class: Option<String>,
    pub type_color: Option<String>,
    pub cursor_color: Option<String>,
    pub word_wrap_line_length_limit: Option<usize>,
    pub cursor_char: Option<String>,
}

impl OptionsPatch {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// The settings this patch changes, in declaration order.
    pub fn into_settings(self) -> Vec<Setting> {
        let mut out = Vec::new();
        let mut push = |setting: Option<Setting>| out.extend(setting);

        push(self.looping.map(Setting::Loop));
        push(self.animate_cursor.map(Setting::AnimateCursor));
        push(self.prevent_word_wrap.map(Setting::PreventWordWrap));
        push(self.blink_speed.map(Setting::BlinkSpeed));
        push(self.type_speed.map(Setting::TypeSpeed));
        push(self.delete_speed.map(Setting::DeleteSpeed));
        push(self.type_speed_min.map(Setting::TypeSpeedMin));
        push(self.type_speed_max.map(Setting::TypeSpeedMax));
        push(self.delete_speed_min.map(Setting::DeleteSpeedMin));
        push(self.delete_speed_max.map(Setting::DeleteSpeedMax));
        push(self.type_class.map(Setting::TypeClass));
        push(self.cursor_class.map(Setting::CursorClass));
        push(self.type_color.map(Setting::TypeColor));
        push(self.cursor_color.map(Setting::CursorColor));
        push(self.word_wrap_line_length_limit.map(Setting::WordWrapLineLengthLimit));
        push(self.cursor_char.map(Setting::CursorChar));
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = Options::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.type_speed, Speed::Fixed(90));
        assert_eq!(options.delete_speed, Speed::Fixed(40));
        assert_eq!(options.blink_speed, 400);
        assert_eq!(options.cursor_char, "|");
    }

    #[test]
    fn test_natural_speed_needs_nonempty_range() {
        let mut options = Options {
            type_speed: Speed::Natural,
            ..Default::default()
        };
        assert!(options.validate().is_ok());

        options.type_speed_min = 100;
        options.type_speed_max = 100;
        assert_eq!(
            options.validate(),
            Err(ConfigError::EmptySpeedRange { key: "typeSpeed", min: 100, max: 100 })
        );
    }

    #[test]
    fn test_fixed_speed_ignores_range() {
        let options = Options {
            delete_speed_min: 90,
            delete_speed_max: 10,
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!(Setting::parse("loop", "true").unwrap(), Setting::Loop(true));
        assert_eq!(Setting::parse("typeSpeed", "random").unwrap(), Setting::TypeSpeed(Speed::Natural));
        assert_eq!(Setting::parse("deleteSpeed", " 25 ").unwrap(), Setting::DeleteSpeed(Speed::Fixed(25)));
        assert_eq!(Setting::parse("typeColor", "#ff8800").unwrap(), Setting::TypeColor("#ff8800".into()));
        assert_eq!(
            Setting::parse("wordWrapLineLengthLimit", "40").unwrap(),
            Setting::WordWrapLineLengthLimit(40)
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(Setting::parse("fontSize", "12"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(Setting::parse("blinkSpeed", "fast"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(Setting::parse("loop", "maybe"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(Setting::parse("onAddChar", "noop"), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_setting_keys_round_trip_through_parse() {
        for (key, value) in [("blinkSpeed", "250"), ("cursorClass", "caret"), ("preventWordWrap", "on")] {
            assert_eq!(Setting::parse(key, value).unwrap().key(), key);
        }
    }

    #[test]
    fn test_patch_from_toml() {
        let patch = OptionsPatch::from_toml_str(
            r#"
            loop = true
            typeSpeed = "natural"
            typeSpeedMin = 30
            typeSpeedMax = 80
            deleteSpeed = 15
            cursorColor = "cyan"
            "#,
        )
        .unwrap();

        let options = Options::default().merged(patch).unwrap();
        assert!(options.looping);
        assert_eq!(options.type_speed, Speed::Natural);
        assert_eq!((options.type_speed_min, options.type_speed_max), (30, 80));
        assert_eq!(options.delete_speed, Speed::Fixed(15));
        assert_eq!(options.cursor_color, "cyan");
        assert_eq!(options.type_color, "black");
    }

    #[test]
    fn test_patch_rejects_unknown_keys() {
        let err = OptionsPatch::from_toml_str("speed = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_merge_fails_fast_on_empty_range() {
        let patch = OptionsPatch {
            delete_speed: Some(Speed::Natural),
            delete_speed_min: Some(50),
            delete_speed_max: Some(20),
            ..Default::default()
        };
        let err = Options::default().merged(patch).unwrap_err();
        assert_eq!(err, ConfigError::EmptySpeedRange { key: "deleteSpeed", min: 50, max: 20 });
    }
}
