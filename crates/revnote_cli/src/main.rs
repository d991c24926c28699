//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive the notes boundary from a shell for quick local checks.
//! - Pick storage and logging from `REVNOTE_*` environment variables.
//!
//! Without `REVNOTE_DB_PATH` every invocation starts from an empty
//! in-memory registry, so only `create` and `ping` are useful there.

use clap::{Parser, Subcommand};
use revnote_api::{ApiResponse, NotesApi};
use revnote_core::{init_logging_from, open_registry, CoreConfig, NoteRegistry, NoteService};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "revnote_cli", version, about = "Revisioned notes smoke CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core liveness and version
    Ping,
    /// Create a note, optionally under an alias
    Create {
        content: String,
        alias: Option<String>,
    },
    /// Show a note by id or alias
    Get { note: String },
    /// Append a new revision
    Update { note: String, content: String },
    /// Delete a note and its history
    Delete { note: String },
    /// List revision metadata
    Revisions { note: String },
    /// Show one revision by its 1-based id
    Revision { note: String, revision_id: String },
    /// Print the latest content as plain text
    Content { note: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(2)
        }
    }
}

fn run(command: Command) -> Result<ExitCode, String> {
    let response = match command {
        Command::Ping => {
            println!("revnote_core ping={}", revnote_core::ping());
            println!("revnote_core version={}", revnote_core::core_version());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Create {
            content,
            alias: None,
        } => open_api()?.create_note(&content),
        Command::Create {
            content,
            alias: Some(alias),
        } => open_api()?.create_note_with_alias(&alias, &content),
        Command::Get { note } => open_api()?.get_note(&note),
        Command::Update { note, content } => open_api()?.update_note(&note, &content),
        Command::Delete { note } => open_api()?.delete_note(&note),
        Command::Revisions { note } => open_api()?.get_revisions(&note),
        Command::Revision { note, revision_id } => {
            open_api()?.get_revision(&note, &revision_id)
        }
        Command::Content { note } => open_api()?.get_content(&note),
    };

    print_response(&response);
    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn open_api() -> Result<NotesApi<Box<dyn NoteRegistry>>, String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from(&config.logging).map_err(|err| err.to_string())?;
    let registry = open_registry(&config.storage).map_err(|err| err.to_string())?;
    Ok(NotesApi::new(NoteService::with_config(registry, config.service)))
}

fn print_response(response: &ApiResponse) {
    println!("{} {}", response.status, response.content_type);
    if !response.body.is_empty() {
        println!("{}", response.body);
    }
}
