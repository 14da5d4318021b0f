//! Engine error classification
//!
//! Maps SQLite result codes and messages onto the handful of conditions the
//! demo knows how to recover from.

use std::os::raw::c_int;

use rusqlite::{ffi, ErrorCode};

use crate::config::TYPE_CONSTRAINT_SUFFIX;

/// Extended code for a value a STRICT column refuses to store
const SQLITE_CONSTRAINT_DATATYPE: c_int = 3091;

/// Recognized failure conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SchemaAlreadyExists,
    DuplicateKey,
    TypeMismatch,
    ArityMismatch,
    Other,
}

impl ErrorKind {
    /// Classic SQL state for the condition, if it has one
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ErrorKind::SchemaAlreadyExists => Some("X0Y32"),
            ErrorKind::DuplicateKey => Some("23505"),
            ErrorKind::TypeMismatch => Some("42821"),
            ErrorKind::ArityMismatch => Some("42802"),
            ErrorKind::Other => None,
        }
    }

    /// Whether a failed insert with this condition is skipped rather than raised
    pub fn skips_insert(&self) -> bool {
        matches!(
            self,
            ErrorKind::DuplicateKey | ErrorKind::TypeMismatch | ErrorKind::ArityMismatch
        )
    }
}

/// Classify an engine error
pub fn classify(err: &rusqlite::Error) -> ErrorKind {
    let rusqlite::Error::SqliteFailure(failure, message) = err else {
        return ErrorKind::Other;
    };
    let message = message.as_deref().unwrap_or_default();

    match failure.code {
        ErrorCode::ConstraintViolation => match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                ErrorKind::DuplicateKey
            }
            SQLITE_CONSTRAINT_DATATYPE => ErrorKind::TypeMismatch,
            ffi::SQLITE_CONSTRAINT_CHECK if is_type_constraint(message) => ErrorKind::TypeMismatch,
            _ => ErrorKind::Other,
        },
        ErrorCode::TypeMismatch => ErrorKind::TypeMismatch,
        // Plain SQLITE_ERROR: only the message tells these apart.
        ErrorCode::Unknown if message.ends_with("already exists") => {
            ErrorKind::SchemaAlreadyExists
        }
        ErrorCode::Unknown if is_arity_message(message) => ErrorKind::ArityMismatch,
        _ => ErrorKind::Other,
    }
}

/// A failed CHECK named `<table>_<column>_type`
fn is_type_constraint(message: &str) -> bool {
    message
        .strip_prefix("CHECK constraint failed: ")
        .is_some_and(|name| name.ends_with(TYPE_CONSTRAINT_SUFFIX))
}

fn is_arity_message(message: &str) -> bool {
    message.contains("values were supplied")
        || (message.contains(" values for ") && message.ends_with(" columns"))
        || message.contains("same number of terms")
}

/// The engine's own wording for an error, without rusqlite's decoration
pub fn engine_message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.clone(),
        other => other.to_string(),
    }
}
