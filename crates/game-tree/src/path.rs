//! Compact positional addresses into the move tree.
//!
//! A path is the concatenation of the 2-character move identifiers met on the
//! way down from the root. The empty path is the root itself.

use std::fmt;

use crate::move_id::MoveId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(String);

impl Path {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse a path from its string form. Fails if the length is odd or any
    /// pair is not a valid identifier.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() % 2 != 0 {
            return None;
        }
        s.as_bytes()
            .chunks(2)
            .all(|pair| MoveId::from_bytes(pair).is_some())
            .then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of plies below the root.
    pub fn depth(&self) -> usize {
        self.0.len() / 2
    }

    pub fn head(&self) -> Option<MoveId> {
        self.0.get(..2).and_then(|s| MoveId::from_bytes(s.as_bytes()))
    }

    pub fn tail(&self) -> Path {
        Self(self.0.get(2..).unwrap_or_default().to_string())
    }

    /// The parent path. The root is its own parent.
    pub fn init(&self) -> Path {
        let end = self.0.len().saturating_sub(2);
        Self(self.0[..end].to_string())
    }

    pub fn last(&self) -> Option<MoveId> {
        let start = self.0.len().checked_sub(2)?;
        MoveId::from_bytes(self.0[start..].as_bytes())
    }

    pub fn append(&self, id: MoveId) -> Path {
        let mut s = String::with_capacity(self.0.len() + 2);
        s.push_str(&self.0);
        s.push_str(id.as_str());
        Self(s)
    }

    /// Prefix test: true when `other` is an ancestor of (or equal to) `self`.
    pub fn contains(&self, other: &Path) -> bool {
        self.0.starts_with(&other.0)
    }

    pub fn is_child_of(&self, parent: &Path) -> bool {
        !self.is_root() && self.init() == *parent
    }

    pub fn ids(&self) -> impl Iterator<Item = MoveId> + '_ {
        self.0
            .as_bytes()
            .chunks(2)
            .filter_map(MoveId::from_bytes)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
