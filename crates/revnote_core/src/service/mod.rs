//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate registry calls into note use-case APIs.
//! - Keep boundary layers (API, CLI) decoupled from storage details.

pub mod note_service;
