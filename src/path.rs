//! Paths locating a diagnostic inside a nested value.
//!
//! This module provides [`CheckPath`] and [`PathSegment`]. A context keeps one
//! `CheckPath` as a stack while it descends into records, lists and maps, and
//! snapshots it next to every check it logs.

use std::fmt::{self, Display};

/// A segment of a check path.
///
/// Paths are built from segments that represent either a property access or a
/// list position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A property or map key (e.g., `user`, `email`)
    Field(String),
    /// A list, set or map entry position (e.g., `[0]`)
    Index(usize),
}

impl PathSegment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

/// A path to a value in a nested structure.
///
/// Fields are joined with `.`, indices render as `[i]`:
///
/// ```rust
/// use kryo::{CheckPath, PathSegment};
///
/// let mut path = CheckPath::root();
/// path.push(PathSegment::field("users"));
/// path.push(PathSegment::index(0));
/// path.push(PathSegment::field("email"));
///
/// assert_eq!(path.to_string(), "users[0].email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CheckPath {
    segments: Vec<PathSegment>,
}

impl CheckPath {
    /// Creates an empty path representing the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Appends a segment in place.
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Removes the last segment, returning it.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Returns true if this is the root path (no segments).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in this path.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Returns the last segment, or None if this is root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl FromIterator<PathSegment> for CheckPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl Display for CheckPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_is_empty() {
        let path = CheckPath::root();
        assert!(path.is_root());
        assert!(path.is_empty());
        assert_eq!(path.len(), 0);
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn test_nested_fields() {
        let path: CheckPath = vec![
            PathSegment::field("outer"),
            PathSegment::field("inner"),
            PathSegment::field("field"),
        ]
        .into_iter()
        .collect();
        assert_eq!(path.to_string(), "outer.inner.field");
    }

    #[test]
    fn test_push_pop() {
        let mut path = CheckPath::root();
        path.push("items".into());
        path.push(3usize.into());
        assert_eq!(path.to_string(), "items[3]");
        assert_eq!(path.pop(), Some(PathSegment::Index(3)));
        assert_eq!(path.to_string(), "items");
        assert_eq!(path.last(), Some(&PathSegment::field("items")));
    }

    #[test]
    fn test_leading_index() {
        let mut path = CheckPath::root();
        path.push(PathSegment::index(0));
        path.push(PathSegment::field("name"));
        assert_eq!(path.to_string(), "[0].name");
    }
}
