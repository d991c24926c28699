//! Revision history model.
//!
//! # Responsibility
//! - Define the immutable `Revision` snapshot.
//! - Own the append-only ordered history of one note (`RevisionStore`).
//!
//! # Invariants
//! - Indices are 1-based, contiguous and strictly increasing.
//! - A stored revision is never mutated or removed.
//! - Revisions never reference each other; the store is a plain arena.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// 1-based position of a revision inside one note history.
pub type RevisionIndex = u32;

/// Revision store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionError {
    /// Requested index is outside `[1, count]`.
    NotFound {
        index: RevisionIndex,
        count: usize,
    },
    /// Store holds no revision. Unreachable for notes built through
    /// `Note::new`/`Note::from_parts`.
    EmptyStore,
    /// Persisted rows do not form the sequence `1..=n`.
    NonContiguous {
        expected: RevisionIndex,
        found: RevisionIndex,
    },
    /// History already holds `RevisionIndex::MAX` revisions.
    IndexOverflow,
}

impl Display for RevisionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { index, count } => {
                write!(f, "revision {index} not found (note has {count} revisions)")
            }
            Self::EmptyStore => write!(f, "revision store is empty"),
            Self::NonContiguous { expected, found } => write!(
                f,
                "revision sequence is not contiguous: expected index {expected}, found {found}"
            ),
            Self::IndexOverflow => write!(f, "revision index overflow"),
        }
    }
}

impl Error for RevisionError {}

/// Immutable full-content snapshot of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    index: RevisionIndex,
    content: String,
    /// Unix epoch milliseconds.
    created_at: i64,
}

impl Revision {
    /// Builds a revision from already-assigned parts.
    ///
    /// Only storage read paths should call this; new history entries are
    /// created by `RevisionStore::append`.
    pub fn from_parts(index: RevisionIndex, content: impl Into<String>, created_at: i64) -> Self {
        Self {
            index,
            content: content.into(),
            created_at,
        }
    }

    pub fn index(&self) -> RevisionIndex {
        self.index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Content length in characters.
    pub fn length(&self) -> usize {
        self.content.chars().count()
    }
}

/// Append-only, position-indexed revision history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionStore {
    revisions: Vec<Revision>,
}

impl RevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `content` as revision 1.
    pub fn with_initial(content: impl Into<String>, created_at: i64) -> Self {
        Self {
            revisions: vec![Revision {
                index: 1,
                content: content.into(),
                created_at,
            }],
        }
    }

    /// Rebuilds a store from persisted revisions.
    ///
    /// # Errors
    /// - `EmptyStore` when `revisions` is empty.
    /// - `NonContiguous` when indices (after sorting) are not `1..=n`.
    pub fn from_revisions(mut revisions: Vec<Revision>) -> Result<Self, RevisionError> {
        if revisions.is_empty() {
            return Err(RevisionError::EmptyStore);
        }

        revisions.sort_by_key(Revision::index);
        for (position, revision) in revisions.iter().enumerate() {
            let expected = next_index(position)?;
            if revision.index != expected {
                return Err(RevisionError::NonContiguous {
                    expected,
                    found: revision.index,
                });
            }
        }

        Ok(Self { revisions })
    }

    /// Appends a snapshot and returns it with its assigned index.
    ///
    /// # Errors
    /// - `IndexOverflow` when the next index does not fit `RevisionIndex`.
    pub fn append(
        &mut self,
        content: impl Into<String>,
        created_at: i64,
    ) -> Result<&Revision, RevisionError> {
        let index = next_index(self.revisions.len())?;
        self.revisions.push(Revision {
            index,
            content: content.into(),
            created_at,
        });
        Ok(&self.revisions[self.revisions.len() - 1])
    }

    /// Gets one revision by its 1-based index.
    pub fn get(&self, index: RevisionIndex) -> Result<&Revision, RevisionError> {
        let not_found = RevisionError::NotFound {
            index,
            count: self.revisions.len(),
        };
        if index == 0 {
            return Err(not_found);
        }
        let position = usize::try_from(index - 1).map_err(|_| not_found.clone())?;
        self.revisions.get(position).ok_or(not_found)
    }

    pub fn latest(&self) -> Result<&Revision, RevisionError> {
        self.revisions.last().ok_or(RevisionError::EmptyStore)
    }

    pub fn count(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Iterates revisions in creation order (index ascending).
    pub fn iter(&self) -> impl Iterator<Item = &Revision> {
        self.revisions.iter()
    }
}

/// Index of the revision stored after `position` existing ones.
fn next_index(position: usize) -> Result<RevisionIndex, RevisionError> {
    position
        .checked_add(1)
        .and_then(|next| RevisionIndex::try_from(next).ok())
        .ok_or(RevisionError::IndexOverflow)
}
