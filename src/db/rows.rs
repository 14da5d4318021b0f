//! Row insertion, counting and last-row rendering

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, Params};
use tracing::{debug, warn};

use super::connection::{ConnectionString, Database, DbResult};
use super::state::{classify, engine_message, ErrorKind};
use crate::config::{count_rows_query, select_all_query, table_def, ColumnType, TableDef};

/// Result of an insert that did not hit an unexpected failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A recognized condition kept the row out of the table
    Skipped { kind: ErrorKind, message: String },
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }

    /// Report line for a skipped statement, `None` when the row went in
    pub fn report(&self, statement: &str) -> Option<String> {
        match self {
            InsertOutcome::Inserted => None,
            InsertOutcome::Skipped {
                kind: ErrorKind::DuplicateKey,
                ..
            } => Some(format!(
                "The query '{}' was not executed because of duplicate key value.",
                statement
            )),
            InsertOutcome::Skipped { message, .. } => Some(format!(
                "The query '{}' was not executed. {}",
                statement, message
            )),
        }
    }
}

/// Execute a literal `INSERT` statement whose values are already interpolated
///
/// Duplicate keys, wrong value types and wrong value counts are skipped; any
/// other failure is returned.
pub fn insert_row(conn: &Connection, statement: &str) -> DbResult<InsertOutcome> {
    insert_with(conn, statement, [])
}

/// Execute an `INSERT` with bound parameters, classifying failures like [`insert_row`]
pub fn insert_with<P: Params>(conn: &Connection, sql: &str, params: P) -> DbResult<InsertOutcome> {
    debug!(sql, "insert");
    match conn.execute(sql, params) {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(e) => {
            let kind = classify(&e);
            if !kind.skips_insert() {
                return Err(e.into());
            }
            let message = engine_message(&e);
            warn!(code = kind.code(), %message, sql, "row skipped");
            Ok(InsertOutcome::Skipped { kind, message })
        }
    }
}

/// Number of rows in a table
pub fn count_rows(conn: &Connection, table: &str) -> DbResult<i64> {
    count_rows_sql(conn, &count_rows_query(table))
}

/// Read the `count` column of the first row of a query, 0 when there is none
pub fn count_rows_sql(conn: &Connection, query: &str) -> DbResult<i64> {
    let count = conn
        .query_row(query, [], |row| row.get::<_, i64>("count"))
        .optional()?;
    Ok(count.unwrap_or(0))
}

/// Render the last row of a table through its own read-only session
///
/// "Last" follows the engine's default scan order. The fixed tables keep a
/// rowid apart from their key, so that order is insertion order; for any
/// other table it is whatever the engine chooses.
pub fn last_row(url: &ConnectionString, table: &str) -> DbResult<String> {
    let db = Database::open_read_only(url)?;
    let rendered =
        db.with_conn(|conn| last_row_of(conn, &select_all_query(table), table_def(table)))?;
    db.close()?;
    Ok(rendered)
}

/// Walk a query to its final row and render it as `col='value', ...`
///
/// Columns found in `table` are rendered per their declared type (decimals
/// keep their scale). Returns an empty string when the query yields no rows.
pub fn last_row_of(conn: &Connection, query: &str, table: Option<&TableDef>) -> DbResult<String> {
    let mut stmt = conn.prepare(query)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let types: Vec<Option<ColumnType>> = columns
        .iter()
        .map(|column| table.and_then(|t| t.column_type(column)))
        .collect();

    let mut last: Option<Vec<String>> = None;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let values = types
            .iter()
            .enumerate()
            .map(|(i, ty)| row.get_ref(i).map(|value| render_value(value, *ty)))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        last = Some(values);
    }

    Ok(last
        .map(|values| {
            columns
                .iter()
                .zip(values)
                .map(|(column, value)| format!("{}='{}'", column, value))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default())
}

fn render_value(value: ValueRef<'_>, ty: Option<ColumnType>) -> String {
    match (value, ty) {
        (ValueRef::Integer(i), Some(ColumnType::Decimal { scale, .. })) => {
            format!("{:.*}", scale as usize, i as f64)
        }
        (ValueRef::Real(f), Some(ColumnType::Decimal { scale, .. })) => {
            format!("{:.*}", scale as usize, f)
        }
        (value, _) => render_plain(value),
    }
}

fn render_plain(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "null".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => b.iter().map(|byte| format!("{:02x}", byte)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SPECIES_SCHEMA;
    use crate::db::schema::init_schema;
    use crate::db::DbError;

    fn zoo() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = zoo();
        assert_eq!(count_rows(&conn, "species").unwrap(), 0);

        let outcome =
            insert_row(&conn, "INSERT INTO species VALUES (1, 'African Elephant', 7.500000)")
                .unwrap();
        assert!(outcome.is_inserted());
        assert_eq!(outcome.report("ignored"), None);
        insert_row(&conn, "INSERT INTO species VALUES (2, 'Zebra', 1.200000)").unwrap();

        assert_eq!(count_rows(&conn, "species").unwrap(), 2);
    }

    #[test]
    fn test_duplicate_key_is_skipped() {
        let conn = zoo();
        let statement = "INSERT INTO species VALUES (1, 'African Elephant', 7.500000)";
        insert_row(&conn, statement).unwrap();

        let outcome = insert_row(&conn, statement).unwrap();
        assert!(matches!(
            outcome,
            InsertOutcome::Skipped {
                kind: ErrorKind::DuplicateKey,
                ..
            }
        ));
        assert_eq!(
            outcome.report(statement).unwrap(),
            format!(
                "The query '{}' was not executed because of duplicate key value.",
                statement
            )
        );
        assert_eq!(count_rows(&conn, "species").unwrap(), 1);
    }

    #[test]
    fn test_wrong_type_is_skipped() {
        let conn = zoo();
        let statement = "INSERT INTO animal VALUES (1, 'one', 'Elsa', '2001-05-06 02:15:00')";

        let outcome = insert_row(&conn, statement).unwrap();
        let InsertOutcome::Skipped { kind, message } = &outcome else {
            panic!("expected a skip, got {:?}", outcome);
        };
        assert_eq!(*kind, ErrorKind::TypeMismatch);
        assert_eq!(
            outcome.report(statement).unwrap(),
            format!("The query '{}' was not executed. {}", statement, message)
        );
        assert_eq!(count_rows(&conn, "animal").unwrap(), 0);
    }

    #[test]
    fn test_wrong_value_count_is_skipped() {
        let conn = zoo();
        for statement in [
            "INSERT INTO species VALUES (1, 'Zebra')",
            "INSERT INTO species VALUES (1, 'Zebra', 1.2, 'extra')",
        ] {
            let outcome = insert_row(&conn, statement).unwrap();
            assert!(matches!(
                outcome,
                InsertOutcome::Skipped {
                    kind: ErrorKind::ArityMismatch,
                    ..
                }
            ));
        }
        assert_eq!(count_rows(&conn, "species").unwrap(), 0);
    }

    #[test]
    fn test_unexpected_failure_is_raised() {
        let conn = zoo();
        let result = insert_row(&conn, "INSERT INTO giraffe VALUES (1)");
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }

    #[test]
    fn test_bound_insert() {
        let conn = zoo();
        let sql = "INSERT INTO species (id, NAME, num_acres) VALUES (?1, ?2, ?3)";
        assert!(insert_with(&conn, sql, rusqlite::params![1, "Zebra", 1.2])
            .unwrap()
            .is_inserted());

        // Quotes are data here, not syntax.
        assert!(insert_with(&conn, sql, rusqlite::params![2, "Pere David's Deer", 3.0])
            .unwrap()
            .is_inserted());
        assert!(!insert_with(&conn, sql, rusqlite::params![2, "Okapi", 3.0])
            .unwrap()
            .is_inserted());
    }

    #[test]
    fn test_count_without_rows_is_zero() {
        let conn = zoo();
        assert_eq!(count_rows_sql(&conn, "SELECT 1 AS count WHERE 0").unwrap(), 0);
    }

    #[test]
    fn test_last_row_of() {
        let conn = zoo();
        let species = Some(&SPECIES_SCHEMA);
        assert_eq!(last_row_of(&conn, "SELECT * FROM species", species).unwrap(), "");

        insert_row(&conn, "INSERT INTO species VALUES (1, 'African Elephant', 7.500000)").unwrap();
        insert_row(&conn, "INSERT INTO species VALUES (2, 'Zebra', 1.200000)").unwrap();
        assert_eq!(
            last_row_of(&conn, "SELECT * FROM species", species).unwrap(),
            "id='2', NAME='Zebra', num_acres='1.20'"
        );
        assert_eq!(
            last_row_of(&conn, "SELECT * FROM species", None).unwrap(),
            "id='2', NAME='Zebra', num_acres='1.2'"
        );
    }

    #[test]
    fn test_last_row_follows_insertion_order() {
        let conn = zoo();
        insert_row(&conn, "INSERT INTO species VALUES (5, 'Okapi', 1.000000)").unwrap();
        insert_row(&conn, "INSERT INTO species VALUES (3, 'Zebra', 1.200000)").unwrap();
        assert_eq!(
            last_row_of(&conn, "SELECT * FROM species", Some(&SPECIES_SCHEMA)).unwrap(),
            "id='3', NAME='Zebra', num_acres='1.20'"
        );
    }

    #[test]
    fn test_out_of_scale_acres_are_skipped() {
        let conn = zoo();
        for statement in [
            "INSERT INTO species VALUES (3, 'Okapi', 3.141590)",
            "INSERT INTO species VALUES (4, 'Okapi', 123456.789000)",
        ] {
            let outcome = insert_row(&conn, statement).unwrap();
            assert!(matches!(
                outcome,
                InsertOutcome::Skipped {
                    kind: ErrorKind::TypeMismatch,
                    ..
                }
            ));
        }
        assert_eq!(count_rows(&conn, "species").unwrap(), 0);
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(ValueRef::Null, None), "null");
        assert_eq!(render_value(ValueRef::Integer(-4), None), "-4");
        assert_eq!(render_value(ValueRef::Real(7.5), None), "7.5");
        assert_eq!(render_value(ValueRef::Text(b"Zoe"), None), "Zoe");
        assert_eq!(render_value(ValueRef::Blob(&[0x0a, 0xff]), None), "0aff");

        let acres = Some(ColumnType::Decimal { precision: 5, scale: 2 });
        assert_eq!(render_value(ValueRef::Real(1.0), acres), "1.00");
        assert_eq!(render_value(ValueRef::Integer(7), acres), "7.00");
        assert_eq!(render_value(ValueRef::Null, acres), "null");
    }

    #[test]
    fn test_last_row_uses_read_only_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zoo");

        let db = Database::open(&ConnectionString::create(&path)).unwrap();
        db.with_conn(|conn| {
            init_schema(conn)?;
            insert_row(conn, "INSERT INTO animal VALUES (5, 2, 'Zoe', '2005-11-12 03:44:00')")?;
            Ok(())
        })
        .unwrap();
        db.close().unwrap();

        let url = ConnectionString::open(&path);
        assert_eq!(
            last_row(&url, "animal").unwrap(),
            "id='5', species_id='2', name='Zoe', date_born='2005-11-12 03:44:00'"
        );
        assert_eq!(last_row(&url, "species").unwrap(), "");
        assert!(last_row(&url, "giraffe").is_err());
    }
}
