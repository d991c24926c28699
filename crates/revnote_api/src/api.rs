//! Use-case API mirroring the public notes routes.
//!
//! # Responsibility
//! - Expose one call per notes route over a `NoteService`.
//! - Map service errors to stable status codes and JSON error bodies.
//!
//! # Invariants
//! - Calls never panic; every outcome is an `ApiResponse`.
//! - Success codes: `201` for creates, `200` otherwise.
//! - `NotFound -> 404`, alias conflict -> `409`, bad input -> `400`,
//!   oversized document -> `413`, anything else -> `500`.

use crate::dto::{ErrorDto, NoteDto, RevisionDto, RevisionListDto, RevisionMetadataDto};
use log::{error, warn};
use revnote_core::{
    ConflictKey, Note, NoteRegistry, NoteService, NoteServiceError, RegistryError, RevisionIndex,
};
use serde::Serialize;

pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Status, content type and body of one boundary call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: CONTENT_TYPE_JSON,
                body,
            },
            Err(err) => {
                error!("event=api_serialize module=api status=error error={err}");
                Self::error(500, "response serialization failed")
            }
        }
    }

    fn text(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT,
            body,
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        let body = ErrorDto {
            status_code: status,
            error: reason_phrase(status).to_string(),
            message: message.into(),
        };
        let body = serde_json::to_string(&body).unwrap_or_default();
        Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type == CONTENT_TYPE_JSON
    }
}

/// Route-shaped facade over a note service.
pub struct NotesApi<R: NoteRegistry> {
    service: NoteService<R>,
}

impl<R: NoteRegistry> NotesApi<R> {
    pub fn new(service: NoteService<R>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &NoteService<R> {
        &self.service
    }

    /// `POST /notes`
    pub fn create_note(&self, body: &str) -> ApiResponse {
        self.created(self.service.create_note(body, None))
    }

    /// `POST /notes/{note}`
    pub fn create_note_with_alias(&self, note: &str, body: &str) -> ApiResponse {
        self.created(self.service.create_note(body, Some(note)))
    }

    /// `GET /notes/{note}`
    pub fn get_note(&self, note: &str) -> ApiResponse {
        match self.service.get_note_by_id_or_alias(note) {
            Ok(Some(found)) => note_response(200, &found),
            Ok(None) => ApiResponse::error(404, format!("note not found: {note}")),
            Err(err) => error_response("get_note", &err),
        }
    }

    /// `PUT /notes/{note}`
    pub fn update_note(&self, note: &str, body: &str) -> ApiResponse {
        match self.service.update_note(note, body) {
            Ok(updated) => note_response(200, &updated),
            Err(err) => error_response("update_note", &err),
        }
    }

    /// `DELETE /notes/{note}`
    pub fn delete_note(&self, note: &str) -> ApiResponse {
        match self.service.delete_note(note) {
            Ok(()) => ApiResponse::text(200, String::new()),
            Err(err) => error_response("delete_note", &err),
        }
    }

    /// `GET /notes/{note}/revisions`
    pub fn get_revisions(&self, note: &str) -> ApiResponse {
        match self.service.get_revisions(note) {
            Ok(revisions) => ApiResponse::json(
                200,
                &RevisionListDto {
                    revisions: revisions.iter().map(RevisionMetadataDto::from).collect(),
                },
            ),
            Err(err) => error_response("get_revisions", &err),
        }
    }

    /// `GET /notes/{note}/revisions/{revision_id}`
    ///
    /// `revision_id` must be ASCII digits. Ids past the index range cannot
    /// name a stored revision and answer `404`.
    pub fn get_revision(&self, note: &str, revision_id: &str) -> ApiResponse {
        if revision_id.is_empty() || !revision_id.bytes().all(|b| b.is_ascii_digit()) {
            return ApiResponse::error(400, format!("invalid revision id `{revision_id}`"));
        }
        let Ok(index) = revision_id.parse::<RevisionIndex>() else {
            return match self.service.get_note_by_id_or_alias(note) {
                Ok(Some(_)) => ApiResponse::error(
                    404,
                    format!("revision {revision_id} of note `{note}` not found"),
                ),
                Ok(None) => ApiResponse::error(404, format!("note not found: {note}")),
                Err(err) => error_response("get_revision", &err),
            };
        };
        match self.service.get_revision(note, index) {
            Ok(revision) => ApiResponse::json(200, &RevisionDto::from(&revision)),
            Err(err) => error_response("get_revision", &err),
        }
    }

    /// `GET /notes/{note}/content`
    pub fn get_content(&self, note: &str) -> ApiResponse {
        match self.service.get_content(note) {
            Ok(content) => ApiResponse::text(200, content),
            Err(err) => error_response("get_content", &err),
        }
    }

    fn created(&self, result: Result<Note, NoteServiceError>) -> ApiResponse {
        match result {
            Ok(note) => note_response(201, &note),
            Err(err) => error_response("create_note", &err),
        }
    }
}

fn note_response(status: u16, note: &Note) -> ApiResponse {
    match NoteDto::from_note(note) {
        Some(dto) => ApiResponse::json(status, &dto),
        None => {
            error!(
                "event=api_note module=api status=error note_id={} error=note_without_revisions",
                note.id()
            );
            ApiResponse::error(500, "note has no revisions")
        }
    }
}

/// Status code for a service failure.
pub fn status_for(err: &NoteServiceError) -> u16 {
    match err {
        NoteServiceError::NoteNotFound(_) | NoteServiceError::RevisionNotFound { .. } => 404,
        NoteServiceError::AliasConflict(_)
        | NoteServiceError::Registry(RegistryError::Conflict(ConflictKey::Id(_))) => 409,
        NoteServiceError::InvalidAlias(_) | NoteServiceError::ForbiddenAlias(_) => 400,
        NoteServiceError::DocumentTooLong { .. } => 413,
        NoteServiceError::Registry(_) | NoteServiceError::InconsistentState(_) => 500,
    }
}

fn error_response(operation: &'static str, err: &NoteServiceError) -> ApiResponse {
    let status = status_for(err);
    if status >= 500 {
        error!("event=api_call module=api status=error operation={operation} code={status} error={err}");
        return ApiResponse::error(status, "internal error");
    }
    warn!("event=api_call module=api status=rejected operation={operation} code={status} error={err}");
    ApiResponse::error(status, err.to_string())
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        404 => "Not Found",
        409 => "Conflict",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::{reason_phrase, status_for, ApiResponse, CONTENT_TYPE_JSON};
    use revnote_core::{AliasValidationError, NoteServiceError};

    #[test]
    fn status_mapping_covers_error_kinds() {
        assert_eq!(status_for(&NoteServiceError::NoteNotFound("x".into())), 404);
        assert_eq!(
            status_for(&NoteServiceError::RevisionNotFound {
                key: "x".into(),
                index: 3
            }),
            404
        );
        assert_eq!(status_for(&NoteServiceError::AliasConflict("x".into())), 409);
        assert_eq!(
            status_for(&NoteServiceError::InvalidAlias(AliasValidationError::Empty)),
            400
        );
        assert_eq!(status_for(&NoteServiceError::ForbiddenAlias("x".into())), 400);
        assert_eq!(
            status_for(&NoteServiceError::DocumentTooLong { length: 2, max: 1 }),
            413
        );
        assert_eq!(
            status_for(&NoteServiceError::InconsistentState("broken")),
            500
        );
    }

    #[test]
    fn error_body_is_json_envelope() {
        let response = ApiResponse::error(404, "note not found: x");
        assert_eq!(response.content_type, CONTENT_TYPE_JSON);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["error"], reason_phrase(404));
        assert_eq!(body["message"], "note not found: x");
    }
}
