//! The demo run
//!
//! Setup (schema, sample rows, counts) goes through one shared session and any
//! failure there is logged and swallowed. The last-row reads each open their
//! own read-only session and any failure there ends the run.

use std::error::Error;
use std::io::Write;

use serde::Serialize;
use tracing::{error, info};

use crate::config::{Config, ANIMAL_TABLE, SPECIES_TABLE};
use crate::db::{
    count_rows, init_schema, insert_row, last_row, Database, DbError, DbResult, TableOutcome,
};
use crate::models::sample_insert_statements;

/// What a run observed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// `None` when setup failed before the count
    pub species_count: Option<i64>,
    pub animal_count: Option<i64>,
    pub skipped_rows: usize,
    pub species_last_row: String,
    pub animal_last_row: String,
}

/// Run the whole demo, writing the report to `out`
pub fn run<W: Write>(config: &Config, out: &mut W) -> DbResult<RunSummary> {
    info!(engine = rusqlite::version(), url = %config.connection_string(), "starting run");

    let mut summary = RunSummary::default();
    if let Err(e) = setup(config, out, &mut summary) {
        error!(error = %diagnostic(&e), "setup failed, continuing to read phase");
        report_setup_failure(&e, &mut std::io::stderr())?;
    }

    let url = config.read_connection_string();
    for (table, slot) in [
        (SPECIES_TABLE, &mut summary.species_last_row),
        (ANIMAL_TABLE, &mut summary.animal_last_row),
    ] {
        *slot = last_row(&url, table)?;
        writeln!(out, "The last row in the '{}' table is: {{{}}}", table, slot)?;
    }

    Database::shutdown(&config.shutdown_connection_string())?;
    info!(summary = %serde_json::to_string(&summary)?, "run finished");
    Ok(summary)
}

fn setup<W: Write>(config: &Config, out: &mut W, summary: &mut RunSummary) -> DbResult<()> {
    let db = Database::open(&config.connection_string())?;

    db.with_conn(|conn| {
        for outcome in init_schema(conn)? {
            if let TableOutcome::AlreadyExists(message) = outcome {
                writeln!(out, "{}", message)?;
            }
        }

        for statement in sample_insert_statements()? {
            if let Some(line) = insert_row(conn, &statement)?.report(&statement) {
                summary.skipped_rows += 1;
                writeln!(out, "{}", line)?;
            }
        }

        for (table, slot) in [
            (SPECIES_TABLE, &mut summary.species_count),
            (ANIMAL_TABLE, &mut summary.animal_count),
        ] {
            let count = count_rows(conn, table)?;
            *slot = Some(count);
            writeln!(out, "There are {} rows in the '{}' table", count, table)?;
        }
        Ok(())
    })?;

    db.close()
}

/// Print a failed setup to the console, whatever the log filter says
fn report_setup_failure<W: Write>(err: &DbError, err_out: &mut W) -> DbResult<()> {
    writeln!(err_out, "Setup failed: {}", diagnostic(err))?;
    Ok(())
}

/// An error and its chain of causes, one per line
fn diagnostic(err: &dyn Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str("\n  caused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
