//! Database module
//!
//! Embedded SQLite sessions, schema setup and row operations.

pub mod connection;
pub mod rows;
pub mod schema;
pub mod state;

pub use connection::{ConnectionError, ConnectionString, Database, DbError, DbResult};
pub use rows::{count_rows, insert_row, insert_with, last_row, InsertOutcome};
pub use schema::{create_table, init_schema, TableOutcome};
pub use state::{classify, ErrorKind};
