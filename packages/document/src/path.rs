//! Dot-separated paths into a document tree.

use std::fmt;

/// A path into a [`Value`](crate::Value) tree.
///
/// Components are separated by `.` and address a map key or, when the
/// container at that level is a sequence, an index. Components are not
/// validated: locale codes like `zh-TW`, numeric indices and arbitrary keys
/// are all legal.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub components: Vec<String>,
}

impl Path {
    /// Parse a dot-separated path string.
    ///
    /// Empty components are dropped, so `"a..b"`, `".a.b"` and `"a.b."` all
    /// normalize to `a.b`. The empty string is the root path.
    ///
    /// ```rust
    /// use dynattr_document::Path;
    ///
    /// let path = Path::parse("title.nl");
    /// assert_eq!(path.len(), 2);
    /// assert_eq!(Path::parse("title..nl."), path);
    /// assert!(Path::parse("").is_empty());
    /// ```
    pub fn parse(s: &str) -> Self {
        Path {
            components: s
                .split('.')
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string())
                .collect(),
        }
    }

    /// The root path.
    pub fn root() -> Self {
        Path::default()
    }

    /// Check if this path is empty (root path).
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Get the number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Iterate over components.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// Append a single raw component without splitting it on `.`.
    #[must_use]
    pub fn child(&self, component: impl Into<String>) -> Path {
        let mut components = self.components.clone();
        components.push(component.into());
        Path { components }
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        Path { components }
    }

    /// Split into the parent path and the final component.
    ///
    /// Returns `None` for the root path.
    pub fn parent_and_last(&self) -> Option<(Path, &str)> {
        let (last, parent) = self.components.split_last()?;
        Some((
            Path {
                components: parent.to_vec(),
            },
            last.as_str(),
        ))
    }

    /// The first component, if any.
    pub fn first(&self) -> Option<&str> {
        self.components.first().map(String::as_str)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("."))
    }
}

impl std::ops::Index<usize> for Path {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.components[i]
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Path::parse(&s)
    }
}

impl From<&String> for Path {
    fn from(s: &String) -> Self {
        Path::parse(s)
    }
}

impl From<&Path> for Path {
    fn from(p: &Path) -> Self {
        p.clone()
    }
}
