//! Text Module - grapheme-correct text handling
//!
//! - **Segment** - `Segmenter` contract and the Unicode implementation
//! - **Buffer** - the visible text as a sequence of grapheme clusters
//! - **Wrap** - display-width measurement and pre-wrapping for typing

mod buffer;
mod segment;
pub mod wrap;

pub use buffer::GraphemeBuffer;
pub use segment::{Segmenter, UnicodeSegmenter};
pub use wrap::{grapheme_width, string_width};
