//! Core types for spark-typewriter.
//!
//! Small value types shared by the interpreter, the cursor and the host
//! contracts. Time is measured in whole milliseconds on the host's clock.

// =============================================================================
// Time
// =============================================================================

/// Milliseconds on the host clock.
///
/// Host clocks start at an arbitrary origin; only differences matter.
pub type Millis = u64;

// =============================================================================
// Surface parts
// =============================================================================

/// The two visual elements a typewriter draws into its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    /// The span holding the typed text.
    Text,
    /// The span holding the cursor glyph.
    Cursor,
}

impl Part {
    pub const fn name(self) -> &'static str {
        match self {
            Part::Text => "text",
            Part::Cursor => "cursor",
        }
    }
}

// =============================================================================
// Opacity
// =============================================================================

/// Opacity of a surface part. The cursor only ever uses the two extremes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Opacity {
    #[default]
    Opaque,
    Transparent,
}

impl Opacity {
    /// Opacity for a visibility flag.
    #[inline]
    pub const fn from_visible(visible: bool) -> Self {
        if visible { Opacity::Opaque } else { Opacity::Transparent }
    }

    #[inline]
    pub const fn is_visible(self) -> bool {
        matches!(self, Opacity::Opaque)
    }
}
