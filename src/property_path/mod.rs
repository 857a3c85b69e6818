//! Property Path Model
//!
//! A property path names the way from a root object (or root entity) to a value:
//! `["books", "title"]` reaches the title of every book of an author. Besides its
//! segments a path carries:
//!
//! - an **access depth**, deciding whether a terminal relationship is dereferenced
//!   (`Unpack`) or referenced as-is (`Direct`, e.g. for collection size checks)
//! - a **salt**, which keeps structurally identical paths apart. Two paths with the
//!   same segments and the same salt share one join (and one fan-out in memory); a
//!   different salt forces an independent instance of the same relationship.
//!
//! Paths are immutable. Relocation under a parent relationship goes through
//! [`PropertyPath::with_prefix`], which returns a new path.

pub mod errors;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use errors::PathError;

/// How far the last segment of a path is followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDepth {
    /// Stop at the last relationship itself, do not join its target.
    Direct,
    /// Join / descend into the target of the last segment.
    #[default]
    Unpack,
    /// Descend as deep as structurally possible (nested collections are flattened).
    UnpackRecursive,
}

impl AccessDepth {
    /// Numeric form used in string keys (`Direct = 0`, `Unpack = 1`, `UnpackRecursive = -1`).
    pub fn as_i8(self) -> i8 {
        match self {
            AccessDepth::Direct => 0,
            AccessDepth::Unpack => 1,
            AccessDepth::UnpackRecursive => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PropertyPathDef", into = "PropertyPathDef")]
pub struct PropertyPath {
    segments: Vec<String>,
    access_depth: AccessDepth,
    salt: String,
}

impl PropertyPath {
    /// Build a path from its segments.
    ///
    /// Fails with [`PathError::Empty`] for zero segments, [`PathError::EmptyPart`] for an
    /// empty segment and [`PathError::InvalidSalt`] if the salt cannot be used inside a
    /// relational identifier.
    pub fn new<I, S>(
        salt: impl Into<String>,
        access_depth: AccessDepth,
        segments: I,
    ) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let salt = salt.into();
        validate_salt(&salt)?;

        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        validate_segments(&segments, 0)?;

        Ok(PropertyPath {
            segments,
            access_depth,
            salt,
        })
    }

    /// Unsalted `Unpack` path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("", AccessDepth::default(), segments)
    }

    /// Unsalted `Unpack` path from its dotted form (`"books.title"`).
    pub fn parse(dotted: &str) -> Result<Self, PathError> {
        Self::from_segments(dotted.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: an empty path cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn access_depth(&self) -> AccessDepth {
        self.access_depth
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Return a copy of this path with `prefix` prepended to its segments.
    ///
    /// Used when the conditions of a relationship are merged into the conditions of
    /// its parent: `["title"]` prefixed with `["books"]` becomes `["books", "title"]`.
    pub fn with_prefix<S: AsRef<str>>(&self, prefix: &[S]) -> Result<Self, PathError> {
        let prefix: Vec<String> = prefix.iter().map(|s| s.as_ref().to_string()).collect();
        validate_segments(&prefix, 0)?;

        let mut segments = prefix;
        segments.extend(self.segments.iter().cloned());

        Ok(PropertyPath {
            segments,
            access_depth: self.access_depth,
            salt: self.salt.clone(),
        })
    }

    pub fn with_salt(&self, salt: impl Into<String>) -> Result<Self, PathError> {
        let salt = salt.into();
        validate_salt(&salt)?;
        Ok(PropertyPath {
            segments: self.segments.clone(),
            access_depth: self.access_depth,
            salt,
        })
    }

    pub fn with_access_depth(&self, access_depth: AccessDepth) -> Self {
        PropertyPath {
            segments: self.segments.clone(),
            access_depth,
            salt: self.salt.clone(),
        }
    }

    /// Dotted form of the segments, e.g. `books.title`.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Identity of the first `len` segments under this path's salt.
    ///
    /// Two paths produce the same key for a prefix exactly when they would share the
    /// relational join for that prefix.
    pub fn prefix_key(&self, len: usize) -> PrefixKey {
        PrefixKey {
            salt: self.salt.clone(),
            segments: self.segments[..len].to_vec(),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

/// (salt, leading segments) pair identifying one join / one fan-out point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrefixKey {
    pub salt: String,
    pub segments: Vec<String>,
}

fn validate_segments(segments: &[String], offset: usize) -> Result<(), PathError> {
    if segments.is_empty() {
        return Err(PathError::Empty);
    }
    if let Some(index) = segments.iter().position(|s| s.is_empty()) {
        return Err(PathError::EmptyPart {
            index: index + offset,
        });
    }
    Ok(())
}

fn validate_salt(salt: &str) -> Result<(), PathError> {
    if salt.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(PathError::InvalidSalt {
            salt: salt.to_string(),
        })
    }
}

/// Serialized form: either a bare dotted string or a full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PropertyPathDef {
    Dotted(String),
    Full {
        path: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        salt: String,
        #[serde(default)]
        access_depth: AccessDepth,
    },
}

impl TryFrom<PropertyPathDef> for PropertyPath {
    type Error = PathError;

    fn try_from(value: PropertyPathDef) -> Result<Self, Self::Error> {
        match value {
            PropertyPathDef::Dotted(path) => PropertyPath::parse(&path),
            PropertyPathDef::Full {
                path,
                salt,
                access_depth,
            } => PropertyPath::new(salt, access_depth, path.split('.')),
        }
    }
}

impl From<PropertyPath> for PropertyPathDef {
    fn from(value: PropertyPath) -> Self {
        PropertyPathDef::Full {
            path: value.dotted(),
            salt: value.salt,
            access_depth: value.access_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_segments_rejected() {
        let result = PropertyPath::from_segments(Vec::<String>::new());
        assert_eq!(result, Err(PathError::Empty));
    }

    #[test]
    fn test_empty_segment_rejected() {
        let result = PropertyPath::parse("books..title");
        assert_eq!(result, Err(PathError::EmptyPart { index: 1 }));

        let result = PropertyPath::parse("");
        assert_eq!(result, Err(PathError::EmptyPart { index: 0 }));
    }

    #[test]
    fn test_invalid_salt_rejected() {
        let result = PropertyPath::new("a-b", AccessDepth::Unpack, ["name"]);
        assert!(matches!(result, Err(PathError::InvalidSalt { .. })));
    }

    #[test]
    fn test_with_prefix_prepends_segments() {
        let path = PropertyPath::new("x1", AccessDepth::Direct, ["title"]).unwrap();
        let prefixed = path.with_prefix(&["author", "books"]).unwrap();

        assert_eq!(prefixed.dotted(), "author.books.title");
        assert_eq!(prefixed.salt(), "x1");
        assert_eq!(prefixed.access_depth(), AccessDepth::Direct);
        // original untouched
        assert_eq!(path.dotted(), "title");
    }

    #[test]
    fn test_with_prefix_rejects_empty_prefix_segment() {
        let path = PropertyPath::parse("title").unwrap();
        assert_eq!(
            path.with_prefix(&["books", ""]),
            Err(PathError::EmptyPart { index: 1 })
        );
    }

    #[test]
    fn test_prefix_key_depends_on_salt() {
        let a = PropertyPath::parse("books.title").unwrap();
        let b = a.with_salt("second").unwrap();

        assert_eq!(a.prefix_key(1), a.clone().prefix_key(1));
        assert_ne!(a.prefix_key(1), b.prefix_key(1));
    }

    #[test]
    fn test_deserialize_dotted_and_full_forms() {
        let dotted: PropertyPath = serde_yaml::from_str("birth.year").unwrap();
        assert_eq!(dotted.segments(), ["birth", "year"]);

        let full: PropertyPath =
            serde_yaml::from_str("{ path: books, salt: s2, access_depth: direct }").unwrap();
        assert_eq!(full.salt(), "s2");
        assert_eq!(full.access_depth(), AccessDepth::Direct);

        let invalid: Result<PropertyPath, _> = serde_yaml::from_str("\"a..b\"");
        assert!(invalid.is_err());
    }
}
