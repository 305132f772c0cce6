//! The visible text.
//!
//! [`GraphemeBuffer`] is the source of truth for what a typewriter renders.
//! It only grows or shrinks at the end, one whole cluster at a time, so its
//! serialized form can never hold half a grapheme.

/// Visible text stored as a string plus the byte offset where each cluster
/// ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphemeBuffer {
    text: String,
    ends: Vec<usize>,
}

impl GraphemeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one cluster.
    pub fn push(&mut self, cluster: &str) {
        if cluster.is_empty() {
            return;
        }
        self.text.push_str(cluster);
        self.ends.push(self.text.len());
    }

    /// Remove the last cluster. Returns `None` once the buffer is empty.
    pub fn pop(&mut self) -> Option<String> {
        self.ends.pop()?;
        let start = self.ends.last().copied().unwrap_or(0);
        Some(self.text.split_off(start))
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.ends.clear();
    }

    /// Number of clusters.
    #[inline]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The clusters, in order.
    pub fn clusters(&self) -> impl Iterator<Item = &str> + '_ {
        let mut start = 0;
        self.ends.iter().map(move |&end| {
            let cluster = &self.text[start..end];
            start = end;
            cluster
        })
    }
}
