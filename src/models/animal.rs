//! Animal model

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::config::TIMESTAMP_FORMAT;
use crate::db::{insert_with, DbResult, InsertOutcome};

const DATE_BORN_COLUMN: usize = 3;

/// A row of the `animal` table
///
/// `species_id` points at a species by convention only; nothing enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub id: i64,
    pub species_id: i64,
    pub name: String,
    pub date_born: NaiveDateTime,
}

impl Animal {
    pub fn new(id: i64, species_id: i64, name: impl Into<String>, date_born: NaiveDateTime) -> Self {
        Self {
            id,
            species_id,
            name: name.into(),
            date_born,
        }
    }

    /// Build an animal from a `YYYY-MM-DD HH:MM:SS` birth timestamp
    pub fn parse(
        id: i64,
        species_id: i64,
        name: impl Into<String>,
        date_born: &str,
    ) -> Result<Self, chrono::ParseError> {
        let date_born = NaiveDateTime::parse_from_str(date_born, TIMESTAMP_FORMAT)?;
        Ok(Self::new(id, species_id, name, date_born))
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw: String = row.get(DATE_BORN_COLUMN)?;
        let date_born = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(DATE_BORN_COLUMN, Type::Text, Box::new(e))
        })?;
        Ok(Self {
            id: row.get(0)?,
            species_id: row.get(1)?,
            name: row.get(2)?,
            date_born,
        })
    }

    fn date_born_text(&self) -> String {
        self.date_born.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Literal `INSERT` with the values spliced into the SQL text
    pub fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO animal VALUES ({}, {}, '{}', '{}')",
            self.id,
            self.species_id,
            self.name,
            self.date_born_text()
        )
    }

    pub fn insert(&self, conn: &Connection) -> DbResult<InsertOutcome> {
        insert_with(
            conn,
            "INSERT INTO animal (id, species_id, name, date_born) VALUES (?1, ?2, ?3, ?4)",
            params![self.id, self.species_id, self.name, self.date_born_text()],
        )
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let animal = conn
            .query_row(
                "SELECT id, species_id, name, date_born FROM animal WHERE id = ?1",
                [id],
                Self::from_row,
            )
            .optional()?;
        Ok(animal)
    }

    /// All animals ordered by id
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT id, species_id, name, date_born FROM animal ORDER BY id")?;
        let animals = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(animals)
    }
}
