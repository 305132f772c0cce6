//! Grapheme cluster segmentation.
//!
//! The animator never touches raw `char`s: typing and deleting step one
//! user-perceived character at a time, so `é` written as `e` + combining
//! acute, or a ZWJ family emoji, appears and disappears as one unit.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into grapheme clusters.
pub trait Segmenter {
    fn graphemes<'a>(&self, text: &'a str) -> Vec<&'a str>;

    fn count(&self, text: &str) -> usize {
        self.graphemes(text).len()
    }
}

/// Extended grapheme clusters as defined by UAX #29.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSegmenter;

impl Segmenter for UnicodeSegmenter {
    fn graphemes<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.graphemes(true).collect()
    }

    fn count(&self, text: &str) -> usize {
        text.graphemes(true).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_splits_per_char() {
        assert_eq!(UnicodeSegmenter.graphemes("abc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_combining_mark_stays_with_base() {
        let text = "e\u{301}x";
        assert_eq!(UnicodeSegmenter.graphemes(text), vec!["e\u{301}", "x"]);
        assert_eq!(UnicodeSegmenter.count(text), 2);
    }

    #[test]
    fn test_emoji_sequences_are_single_clusters() {
        let family = "👨\u{200D}👩\u{200D}👧";
        let flag = "🇺🇸";
        let thumbs = "👍🏽";
        for cluster in [family, flag, thumbs] {
            assert_eq!(UnicodeSegmenter.count(cluster), 1, "{cluster:?}");
        }
    }

    #[test]
    fn test_crlf_is_one_cluster() {
        assert_eq!(UnicodeSegmenter.graphemes("a\r\nb"), vec!["a", "\r\n", "b"]);
    }
}
