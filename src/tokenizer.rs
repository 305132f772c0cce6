//! Text Tokenizer - raw strings to paced commands
//!
//! Turns a block of prose into the typing script a person would produce:
//! clauses are typed in one go and followed by a pause whose length depends
//! on the punctuation that closed them.
//!
//! # Rules
//!
//! - A backslash splits the input into screens. Every screen after the first
//!   starts with an instant clear and a short pause; every screen but the last
//!   ends with a pause to read.
//! - Inside a screen, words accumulate until one ends in punctuation, checked
//!   in this order: `,` then `—` then `...`/`…` then `.`/`!`/`?`.
//! - A punctuated word flushes the accumulated text as one `TypeText`, then a
//!   pause. The accumulator restarts with a single space.
//! - Whatever is left at the end of a screen is typed trimmed.

use crate::command::Command;
use crate::types::Millis;

// =============================================================================
// REST DURATIONS
// =============================================================================

/// Pauses inserted by the tokenizer, in ms.
pub struct RestType;

impl RestType {
    pub const COMMA: Millis = 500;
    pub const EMDASH: Millis = 1000;
    pub const ELLIPSIS: Millis = 2000;
    pub const SENTENCE: Millis = 2500;
    pub const PAUSE_TO_READ: Millis = 3500;
    pub const CLEAR: Millis = 500;
}

/// Screen separator.
pub const LINE_BREAK: char = '\\';

const EMDASH: char = '\u{2014}';
const ELLIPSIS: char = '\u{2026}';

// =============================================================================
// TOKENIZE
// =============================================================================

/// Pause owed after a word, if its trailing punctuation closes a clause.
fn rest_after(word: &str) -> Option<Millis> {
    if word.ends_with(',') {
        Some(RestType::COMMA)
    } else if word.ends_with(EMDASH) {
        Some(RestType::EMDASH)
    } else if word.ends_with("...") || word.ends_with(ELLIPSIS) {
        Some(RestType::ELLIPSIS)
    } else if word.ends_with(['.', '!', '?']) {
        Some(RestType::SENTENCE)
    } else {
        None
    }
}

/// Tokenize one screen of text into `out`.
fn tokenize_segment(segment: &str, out: &mut Vec<Command>) {
    let mut buffer = String::new();

    for word in segment.split_whitespace() {
        match rest_after(word) {
            Some(rest) => {
                buffer.push_str(word);
                out.push(Command::TypeText(std::mem::replace(&mut buffer, " ".to_string())));
                out.push(Command::Pause(rest));
            }
            None => {
                buffer.push_str(word);
                buffer.push(' ');
            }
        }
    }

    let rest = buffer.trim();
    if !rest.is_empty() {
        out.push(Command::TypeText(rest.to_string()));
    }
}

/// Convert raw text into an ordered list of typing commands.
///
/// # Example
///
/// ```
/// use spark_typewriter::command::Command;
/// use spark_typewriter::tokenizer::tokenize;
///
/// assert_eq!(
///     tokenize("Hello, world."),
///     vec![
///         Command::TypeText("Hello,".into()),
///         Command::Pause(500),
///         Command::TypeText(" world.".into()),
///         Command::Pause(2500),
///     ]
/// );
/// ```
pub fn tokenize(text: &str) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut segments = text.split(LINE_BREAK).peekable();
    let mut first = true;

    while let Some(segment) = segments.next() {
        if !first {
            commands.push(Command::ClearText);
            commands.push(Command::Pause(RestType::CLEAR));
        }
        first = false;

        tokenize_segment(segment, &mut commands);

        if segments.peek().is_some() {
            commands.push(Command::Pause(RestType::PAUSE_TO_READ));
        }
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> Command {
        Command::TypeText(s.to_string())
    }

    #[test]
    fn test_comma_then_sentence() {
        assert_eq!(
            tokenize("Hello, world."),
            vec![typed("Hello,"), Command::Pause(500), typed(" world."), Command::Pause(2500)]
        );
    }

    #[test]
    fn test_plain_text_is_one_command() {
        assert_eq!(tokenize("  the quick brown fox  "), vec![typed("the quick brown fox")]);
        assert_eq!(tokenize("word"), vec![typed("word")]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn test_words_accumulate_until_punctuation() {
        assert_eq!(
            tokenize("one two three! four"),
            vec![typed("one two three!"), Command::Pause(2500), typed("four")]
        );
    }

    #[test]
    fn test_punctuation_priority() {
        assert_eq!(rest_after("wait,"), Some(RestType::COMMA));
        assert_eq!(rest_after("so\u{2014}"), Some(RestType::EMDASH));
        assert_eq!(rest_after("wait..."), Some(RestType::ELLIPSIS));
        assert_eq!(rest_after("wait\u{2026}"), Some(RestType::ELLIPSIS));
        assert_eq!(rest_after("done."), Some(RestType::SENTENCE));
        assert_eq!(rest_after("what?"), Some(RestType::SENTENCE));
        assert_eq!(rest_after("wow!"), Some(RestType::SENTENCE));
        assert_eq!(rest_after("plain"), None);
        // only the last character decides; ",." is a sentence end
        assert_eq!(rest_after("odd,."), Some(RestType::SENTENCE));
        assert_eq!(rest_after("odd.,"), Some(RestType::COMMA));
    }

    #[test]
    fn test_ellipsis_is_one_word() {
        assert_eq!(
            tokenize("wait... what"),
            vec![typed("wait..."), Command::Pause(2000), typed("what")]
        );
    }

    #[test]
    fn test_line_break_clears_between_screens() {
        assert_eq!(
            tokenize("A\\B"),
            vec![
                typed("A"),
                Command::Pause(RestType::PAUSE_TO_READ),
                Command::ClearText,
                Command::Pause(RestType::CLEAR),
                typed("B"),
            ]
        );
    }

    #[test]
    fn test_empty_middle_screen_keeps_pauses() {
        assert_eq!(
            tokenize("A\\\\B"),
            vec![
                typed("A"),
                Command::Pause(RestType::PAUSE_TO_READ),
                Command::ClearText,
                Command::Pause(RestType::CLEAR),
                Command::Pause(RestType::PAUSE_TO_READ),
                Command::ClearText,
                Command::Pause(RestType::CLEAR),
                typed("B"),
            ]
        );
    }

    #[test]
    fn test_no_trailing_pause_after_last_screen() {
        let commands = tokenize("First screen.\\Second screen.");
        assert_eq!(commands.last(), Some(&Command::Pause(RestType::SENTENCE)));
        assert_eq!(
            commands.iter().filter(|c| **c == Command::Pause(RestType::PAUSE_TO_READ)).count(),
            1
        );
    }
}
