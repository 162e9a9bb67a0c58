//! # Field Paths
//!
//! Locates a violation inside a loaded value. Nested loads report paths
//! relative to themselves; each enclosing composite prepends its own
//! segment on the way out.

use std::fmt;

/// One step into a composite value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// An object property or map key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

/// A path from the root of a loaded value to one of its parts.
///
/// Displays as dotted keys with bracketed indexes: `items[2].name`.
/// The root path displays as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// The empty path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A single-key path.
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![Segment::Key(key.into())])
    }

    /// A single-index path.
    pub fn index(index: usize) -> Self {
        Self(vec![Segment::Index(index)])
    }

    /// Returns true for the empty path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments from outermost to innermost.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// A new path with `key` appended.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.into()));
        Self(segments)
    }

    /// A new path with `index` appended.
    pub fn element(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    /// Insert `segment` as the new outermost step.
    pub fn prepend(&mut self, segment: Segment) {
        self.0.insert(0, segment);
    }

    /// Whether any step of this path is the given index.
    pub fn contains_index(&self, index: usize) -> bool {
        self.0.iter().any(|s| *s == Segment::Index(index))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(k) if i == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}
