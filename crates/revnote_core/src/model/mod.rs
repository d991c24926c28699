//! Note domain model.
//!
//! # Responsibility
//! - Define the note aggregate and its append-only revision history.
//! - Keep identity, metadata and history rules independent of storage.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`; aliases are optional.
//! - Revision history is append-only for the life of its note.

pub mod note;
pub mod revision;
