//! Response bodies for the notes boundary.
//!
//! Field names follow the camelCase JSON shape of the public notes API.

use revnote_core::{Note, NoteId, Revision, RevisionIndex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadataDto {
    pub id: NoteId,
    pub alias: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub current_revision: RevisionIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDto {
    pub content: String,
    pub metadata: NoteMetadataDto,
}

impl NoteDto {
    /// Builds the note body; `None` when the note has no revision.
    pub fn from_note(note: &Note) -> Option<Self> {
        let content = note.content().ok()?.to_string();
        let metadata = note.metadata();
        Some(Self {
            content,
            metadata: NoteMetadataDto {
                id: metadata.id,
                alias: metadata.alias.clone(),
                created_at: metadata.created_at,
                updated_at: metadata.updated_at,
                current_revision: metadata.current_revision,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionDto {
    pub id: RevisionIndex,
    pub content: String,
    pub length: usize,
    pub created_at: i64,
}

impl From<&Revision> for RevisionDto {
    fn from(revision: &Revision) -> Self {
        Self {
            id: revision.index(),
            content: revision.content().to_string(),
            length: revision.length(),
            created_at: revision.created_at(),
        }
    }
}

/// Listing entry; content is fetched per revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMetadataDto {
    pub id: RevisionIndex,
    pub length: usize,
    pub created_at: i64,
}

impl From<&Revision> for RevisionMetadataDto {
    fn from(revision: &Revision) -> Self {
        Self {
            id: revision.index(),
            length: revision.length(),
            created_at: revision.created_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionListDto {
    pub revisions: Vec<RevisionMetadataDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}
