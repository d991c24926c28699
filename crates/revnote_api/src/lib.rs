//! Use-case boundary for the notes routes.
//!
//! # Responsibility
//! - Translate route-level calls (raw text bodies, path keys) into
//!   `NoteService` operations.
//! - Keep wire encoding and status mapping out of the core crate.

pub mod api;
pub mod dto;

pub use api::{status_for, ApiResponse, NotesApi, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
pub use dto::{ErrorDto, NoteDto, NoteMetadataDto, RevisionDto, RevisionListDto, RevisionMetadataDto};
