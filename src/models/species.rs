//! Species model
//!
//! A species and the acreage set aside for it.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{insert_with, DbResult, InsertOutcome};

/// A row of the `species` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: i64,
    pub name: String,
    pub num_acres: f64,
}

impl Species {
    pub fn new(id: i64, name: impl Into<String>, num_acres: f64) -> Self {
        Self {
            id,
            name: name.into(),
            num_acres,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("NAME")?,
            num_acres: row.get("num_acres")?,
        })
    }

    /// Literal `INSERT` with the values spliced into the SQL text
    ///
    /// The name is not escaped; use [`Species::insert`] for arbitrary input.
    pub fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO species VALUES ({}, '{}', {:.6})",
            self.id, self.name, self.num_acres
        )
    }

    /// Insert with bound parameters; acreage is kept to two decimal places
    pub fn insert(&self, conn: &Connection) -> DbResult<InsertOutcome> {
        insert_with(
            conn,
            "INSERT INTO species (id, NAME, num_acres) VALUES (?1, ?2, ?3)",
            params![self.id, self.name, round_acres(self.num_acres)],
        )
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let species = conn
            .query_row(
                "SELECT id, NAME, num_acres FROM species WHERE id = ?1",
                [id],
                Self::from_row,
            )
            .optional()?;
        Ok(species)
    }

    /// All species ordered by id
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, NAME, num_acres FROM species ORDER BY id")?;
        let species = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(species)
    }
}

fn round_acres(acres: f64) -> f64 {
    (acres * 100.0).round() / 100.0
}
