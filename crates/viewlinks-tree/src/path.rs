//! Typed addresses into a configuration tree
//!
//! Provides [`Path`] for addressing a link or a (nested) field definition.
//!
//! The canonical string form is `links[<name>]` followed by zero or more
//! `.fields[<name>]` segments. Inside a name, `]`, `[`, `.` and `\` are
//! escaped with a backslash.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Key of the map holding nested field definitions
pub const FIELDS_KEY: &str = "fields";

const LINKS_TOKEN: &str = "links";

/// Container keyword preceding a bracketed name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Container {
    /// Top-level link map
    Links,
    /// Nested `fields` map of a definition
    Fields,
}

impl Container {
    /// Keyword as written in the path grammar
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Links => LINKS_TOKEN,
            Self::Fields => FIELDS_KEY,
        }
    }
}

impl Display for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a [`Path`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// `links[<name>]`
    Link(String),
    /// `fields[<name>]`
    Field(String),
}

impl Segment {
    /// Container this segment selects from
    #[inline]
    #[must_use]
    pub fn container(&self) -> Container {
        match self {
            Self::Link(_) => Container::Links,
            Self::Field(_) => Container::Fields,
        }
    }

    /// Raw key (unescaped)
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Link(key) | Self::Field(key) => key,
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.container(), escape_key(self.key()))
    }
}

/// Address of a link or field definition
///
/// Always non-empty: the first segment is a [`Segment::Link`], every further
/// segment is a [`Segment::Field`]. Only constructible through validated
/// constructors or [`FromStr`].
///
/// # Examples
/// - `links[products]`
/// - `links[products].fields[name].fields[en]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    /// Path addressing a link
    ///
    /// # Errors
    /// Returns error if `name` is empty
    #[inline]
    pub fn link(name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PathError::EmptyKey { offset: 0 });
        }
        Ok(Self(vec![Segment::Link(name)]))
    }

    /// Path addressing a nested field of this definition
    ///
    /// # Errors
    /// Returns error if `name` is empty
    #[inline]
    pub fn child(&self, name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PathError::EmptyKey {
                offset: self.to_string().len(),
            });
        }
        let mut segments = self.0.clone();
        segments.push(Segment::Field(name));
        Ok(Self(segments))
    }

    /// Build from a link name and a chain of field names
    ///
    /// # Errors
    /// Returns error if any name is empty
    pub fn from_names<I, S>(link: impl Into<String>, fields: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fields
            .into_iter()
            .try_fold(Self::link(link)?, |path, field| path.child(field))
    }

    /// All segments, root first
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments (a link path has depth 1)
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Name of the link this path lives under
    #[inline]
    #[must_use]
    pub fn link_name(&self) -> &str {
        self.0[0].key()
    }

    /// Key of the addressed definition
    #[inline]
    #[must_use]
    pub fn last_key(&self) -> &str {
        self.0[self.0.len() - 1].key()
    }

    /// Check if this path addresses a link
    #[inline]
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.0.len() == 1
    }

    /// Enclosing definition (none for a link path)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_link() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Path made of the first `len` segments
    ///
    /// `len` is clamped to `1..=depth`.
    #[must_use]
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.clamp(1, self.0.len());
        Self(self.0[..len].to_vec())
    }

    /// Every ancestor path from the link down to this path (inclusive)
    pub fn ancestors_inclusive(&self) -> impl Iterator<Item = Path> + '_ {
        (1..=self.0.len()).map(|len| self.truncated(len))
    }

    /// Raw segment keys, root first
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(Segment::key)
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Escape a raw key for the canonical string form
#[must_use]
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if matches!(ch, '\\' | '[' | ']' | '.') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s).parse()
    }
}

/// Parse a path string
///
/// # Errors
/// Returns error on malformed grammar
#[inline]
pub fn parse(s: &str) -> Result<Path, PathError> {
    s.parse()
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    len: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.len, |(i, _)| *i)
    }

    fn parse(mut self) -> Result<Path, PathError> {
        if self.len == 0 {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        loop {
            let offset = self.offset();
            let container = self.container()?;
            let expected = if segments.is_empty() {
                Container::Links
            } else {
                Container::Fields
            };
            if container != expected {
                return Err(PathError::UnexpectedContainer {
                    expected: expected.as_str(),
                    found: container.as_str(),
                    offset,
                });
            }

            let key = self.key()?;
            segments.push(match container {
                Container::Links => Segment::Link(key),
                Container::Fields => Segment::Field(key),
            });

            match self.chars.next() {
                None => break,
                Some((_, '.')) => continue,
                Some((offset, ch)) => return Err(PathError::UnexpectedCharacter { ch, offset }),
            }
        }

        Ok(Path(segments))
    }

    fn container(&mut self) -> Result<Container, PathError> {
        let start = self.offset();
        let mut word = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch == '[' {
                break;
            }
            if !ch.is_ascii_alphabetic() {
                let offset = self.offset();
                return Err(PathError::UnexpectedCharacter { ch, offset });
            }
            word.push(ch);
            self.chars.next();
        }

        if self.chars.peek().is_none() && !word.is_empty() {
            return Err(PathError::UnbalancedBracket { offset: self.len });
        }

        match word.as_str() {
            "" => Err(PathError::MissingContainer { offset: start }),
            LINKS_TOKEN => Ok(Container::Links),
            FIELDS_KEY => Ok(Container::Fields),
            _ => Err(PathError::UnknownContainer {
                word,
                offset: start,
            }),
        }
    }

    fn key(&mut self) -> Result<String, PathError> {
        // consume '['
        let open = self.offset();
        self.chars.next();

        let mut key = String::new();
        loop {
            match self.chars.next() {
                None => return Err(PathError::UnbalancedBracket { offset: open }),
                Some((_, ']')) => break,
                Some((offset, '\\')) => match self.chars.next() {
                    Some((_, escaped)) => key.push(escaped),
                    None => return Err(PathError::DanglingEscape { offset }),
                },
                Some((offset, '[')) => return Err(PathError::UnbalancedBracket { offset }),
                Some((offset, '.')) => {
                    return Err(PathError::UnexpectedCharacter { ch: '.', offset })
                }
                Some((_, ch)) => key.push(ch),
            }
        }

        if key.is_empty() {
            return Err(PathError::EmptyKey { offset: open });
        }
        Ok(key)
    }
}

impl serde::Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to paths: malformed grammar or traversal through a leaf
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty path string
    #[error("path is empty")]
    Empty,

    /// `[` without a container keyword in front of it
    #[error("missing container keyword at offset {offset}")]
    MissingContainer { offset: usize },

    /// Keyword other than `links`/`fields`
    #[error("unknown container '{word}' at offset {offset}")]
    UnknownContainer { word: String, offset: usize },

    /// Keyword in the wrong position
    #[error("expected '{expected}' but found '{found}' at offset {offset}")]
    UnexpectedContainer {
        expected: &'static str,
        found: &'static str,
        offset: usize,
    },

    /// Missing or stray bracket
    #[error("unbalanced bracket at offset {offset}")]
    UnbalancedBracket { offset: usize },

    /// `[]`
    #[error("empty key at offset {offset}")]
    EmptyKey { offset: usize },

    /// Character not allowed at this position
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    /// Backslash at end of input
    #[error("dangling escape at offset {offset}")]
    DanglingEscape { offset: usize },

    /// Traversal hit a non-map node before the last segment
    #[error("cannot traverse {found} at '{path}': expected a map")]
    NotAContainer { path: String, found: &'static str },

    /// Property edits may not target the nested-fields key
    #[error("'{0}' is reserved for nested field definitions")]
    ReservedKey(String),
}

impl PathError {
    /// Create traversal error
    pub fn not_a_container(path: impl Into<String>, found: &'static str) -> Self {
        Self::NotAContainer {
            path: path.into(),
            found,
        }
    }
}
