//! Schema creation
//!
//! Creating a table that is already there is reported, not raised, so setup
//! can be re-run against an existing database.

use rusqlite::Connection;
use tracing::{debug, warn};

use super::connection::DbResult;
use super::state::{classify, engine_message, ErrorKind};
use crate::config::{ANIMAL_SCHEMA, SPECIES_SCHEMA};

/// Result of a `CREATE TABLE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    Created,
    /// The table was already present; carries the engine's message
    AlreadyExists(String),
}

/// Run one `CREATE TABLE` statement
pub fn create_table(conn: &Connection, statement: &str) -> DbResult<TableOutcome> {
    match conn.execute(statement, []) {
        Ok(_) => {
            debug!(statement, "table created");
            Ok(TableOutcome::Created)
        }
        Err(e) if classify(&e) == ErrorKind::SchemaAlreadyExists => {
            let message = engine_message(&e);
            warn!(code = ErrorKind::SchemaAlreadyExists.code(), %message, "table kept");
            Ok(TableOutcome::AlreadyExists(message))
        }
        Err(e) => Err(e.into()),
    }
}

/// Create the `species` and `animal` tables, in that order
pub fn init_schema(conn: &Connection) -> DbResult<Vec<TableOutcome>> {
    [&SPECIES_SCHEMA, &ANIMAL_SCHEMA]
        .into_iter()
        .map(|table| create_table(conn, &table.create_statement()))
        .collect()
}
