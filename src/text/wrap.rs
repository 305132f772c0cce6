//! Width measurement and pre-wrapping.
//!
//! A typewriter reveals a word one cluster at a time. Left to the surface's
//! own wrapping, a long word starts at the end of a line and then jumps to the
//! next one halfway through. [`prewrap`] decides the break before typing
//! starts: the space in front of a word that will not fit becomes a newline.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

/// Display width of a grapheme cluster in terminal cells.
///
/// - Single codepoint: its East Asian width
/// - ZWJ sequences, VS16 presentation, skin tones, keycaps, flags: 2
/// - Base + combining marks: width of the base
pub fn grapheme_width(grapheme: &str) -> usize {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return 0;
    };

    if grapheme.len() == first.len_utf8() {
        return first.width().unwrap_or(0);
    }

    if (0x1F1E6..=0x1F1FF).contains(&(first as u32)) {
        return 2;
    }

    for c in chars {
        match c as u32 {
            0x200D | 0xFE0F | 0x20E3 | 0x1F3FB..=0x1F3FF => return 2,
            _ => {}
        }
    }

    first.width().unwrap_or(0)
}

/// Display width of a string in terminal cells.
pub fn string_width(s: &str) -> usize {
    if s.is_ascii() {
        return s.bytes().filter(|&b| b >= 0x20 && b != 0x7F).count();
    }
    s.graphemes(true).map(grapheme_width).sum()
}

/// Width of the last line of `text`.
pub fn trailing_line_width(text: &str) -> usize {
    string_width(text.rsplit('\n').next().unwrap_or(""))
}

/// Rewrite `content` so that no word crosses `limit` cells.
///
/// `line_width` is how much of the current line is already occupied. A run
/// of spaces followed by a word that would overflow is replaced by a single
/// newline. Words wider than the whole line are left to overflow, and a
/// `limit` of 0 returns the content unchanged.
pub fn prewrap(line_width: usize, content: &str, limit: usize) -> String {
    if limit == 0 {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len());
    let mut width = line_width;
    let mut rest = content;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('\n') {
            out.push('\n');
            width = 0;
            rest = after;
            continue;
        }

        let spaces = rest.len() - rest.trim_start_matches(' ').len();
        let word_end = rest[spaces..].find([' ', '\n']).map_or(rest.len(), |i| i + spaces);
        let word = &rest[spaces..word_end];
        let word_width = string_width(word);

        if spaces > 0 && !word.is_empty() && width > 0 && width + spaces + word_width > limit {
            out.push('\n');
            width = 0;
        } else {
            out.push_str(&rest[..spaces]);
            width += spaces;
        }

        out.push_str(word);
        width += word_width;
        rest = &rest[word_end..];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(string_width("hello"), 5);
        assert_eq!(string_width("日本"), 4);
        assert_eq!(string_width("e\u{301}"), 1);
        assert_eq!(grapheme_width("🇺🇸"), 2);
        assert_eq!(grapheme_width("👍🏽"), 2);
        assert_eq!(grapheme_width(""), 0);
    }

    #[test]
    fn test_trailing_line_width() {
        assert_eq!(trailing_line_width("abc\nde"), 2);
        assert_eq!(trailing_line_width("abc\n"), 0);
        assert_eq!(trailing_line_width("abcd"), 4);
    }

    #[test]
    fn test_prewrap_breaks_before_overflowing_word() {
        assert_eq!(prewrap(0, "the quick brown fox", 10), "the quick\nbrown fox");
    }

    #[test]
    fn test_prewrap_accounts_for_existing_line() {
        // "Hello," already on the line, 6 cells wide
        assert_eq!(prewrap(6, " world.", 10), "\nworld.");
        assert_eq!(prewrap(2, " world.", 10), " world.");
    }

    #[test]
    fn test_prewrap_keeps_cluster_count() {
        let content = " a long sentence that wraps";
        let wrapped = prewrap(0, content, 8);
        assert_eq!(wrapped.graphemes(true).count(), content.graphemes(true).count());
    }

    #[test]
    fn test_prewrap_leaves_oversized_words() {
        assert_eq!(prewrap(0, "supercalifragilistic", 5), "supercalifragilistic");
        assert_eq!(prewrap(0, "a supercalifragilistic", 5), "a\nsupercalifragilistic");
    }

    #[test]
    fn test_prewrap_disabled_with_zero_limit() {
        assert_eq!(prewrap(100, " anything goes", 0), " anything goes");
    }

    #[test]
    fn test_prewrap_resets_on_newline() {
        assert_eq!(prewrap(0, "aaaa\nbb cc", 5), "aaaa\nbb cc");
    }
}
