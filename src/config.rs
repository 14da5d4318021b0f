//! Fixed run configuration
//!
//! Table names, statement templates and the database location used by the demo.

use std::path::{Path, PathBuf};

use crate::db::ConnectionString;

/// Default embedded database location, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "TestDB";

pub const SPECIES_TABLE: &str = "species";
pub const ANIMAL_TABLE: &str = "animal";

/// Text layout of timestamp columns, shared by chrono and SQLite's `strftime`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Suffix of the CHECK constraints that enforce a column's declared type
pub const TYPE_CONSTRAINT_SUFFIX: &str = "_type";

/// Declared SQL type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Varchar(u32),
    Decimal { precision: u32, scale: u32 },
    Timestamp,
}

impl ColumnType {
    /// CHECK expression admitting NULL or a value of this type, as stored
    ///
    /// Columns are declared `ANY` in a STRICT table so SQLite keeps values
    /// exactly as supplied and the check sees them before any coercion.
    pub fn check_expression(&self, column: &str) -> String {
        let test = match *self {
            ColumnType::Integer => format!("typeof({c}) = 'integer'", c = column),
            ColumnType::Varchar(len) => format!(
                "typeof({c}) = 'text' AND length({c}) <= {len}",
                c = column,
                len = len
            ),
            ColumnType::Decimal { precision, scale } => format!(
                "typeof({c}) IN ('integer', 'real') AND abs({c}) < {limit} AND round({c}, {scale}) = {c}",
                c = column,
                limit = 10u64.pow(precision.saturating_sub(scale)),
                scale = scale
            ),
            ColumnType::Timestamp => format!(
                "typeof({c}) = 'text' AND {c} IS strftime('{fmt}', {c})",
                c = column,
                fmt = TIMESTAMP_FORMAT
            ),
        };
        format!("{} IS NULL OR ({})", column, test)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// A fixed table: its columns and which one is the primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [Column],
}

impl TableDef {
    /// `CREATE TABLE` for this table
    ///
    /// The key is not an `INTEGER PRIMARY KEY`, so rows keep a separate rowid
    /// and an unordered scan returns them in insertion order.
    pub fn create_statement(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let key = if column.name == self.primary_key {
                    " PRIMARY KEY NOT NULL"
                } else {
                    ""
                };
                format!(
                    "{name} ANY{key} CONSTRAINT {table}_{constraint}{suffix} CHECK ({check})",
                    name = column.name,
                    key = key,
                    table = self.name,
                    constraint = column.name.to_ascii_lowercase(),
                    suffix = TYPE_CONSTRAINT_SUFFIX,
                    check = column.ty.check_expression(column.name)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({}) STRICT", self.name, columns)
    }

    /// Declared type of a column, matched case-insensitively like SQL identifiers
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
            .map(|column| column.ty)
    }
}

pub static SPECIES_SCHEMA: TableDef = TableDef {
    name: SPECIES_TABLE,
    primary_key: "id",
    columns: &[
        Column { name: "id", ty: ColumnType::Integer },
        Column { name: "NAME", ty: ColumnType::Varchar(255) },
        Column { name: "num_acres", ty: ColumnType::Decimal { precision: 5, scale: 2 } },
    ],
};

pub static ANIMAL_SCHEMA: TableDef = TableDef {
    name: ANIMAL_TABLE,
    primary_key: "id",
    columns: &[
        Column { name: "id", ty: ColumnType::Integer },
        Column { name: "species_id", ty: ColumnType::Integer },
        Column { name: "name", ty: ColumnType::Varchar(255) },
        Column { name: "date_born", ty: ColumnType::Timestamp },
    ],
};

/// Schema of one of the fixed tables
pub fn table_def(table: &str) -> Option<&'static TableDef> {
    [&SPECIES_SCHEMA, &ANIMAL_SCHEMA]
        .into_iter()
        .find(|def| def.name.eq_ignore_ascii_case(table))
}

/// `SELECT *` over a table
pub fn select_all_query(table: &str) -> String {
    format!("SELECT * FROM {}", table)
}

/// Row count query; the scalar is exposed under the `count` alias
pub fn count_rows_query(table: &str) -> String {
    format!("SELECT count(*) AS count FROM {}", table)
}

/// Where the demo keeps its database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_path: PathBuf,
}

impl Config {
    pub fn new<P: AsRef<Path>>(database_path: P) -> Self {
        Self {
            database_path: database_path.as_ref().to_path_buf(),
        }
    }

    /// Create-or-open string for the shared setup connection
    pub fn connection_string(&self) -> ConnectionString {
        ConnectionString::create(&self.database_path)
    }

    /// Open-existing string used by the last-row reader
    pub fn read_connection_string(&self) -> ConnectionString {
        ConnectionString::open(&self.database_path)
    }

    pub fn shutdown_connection_string(&self) -> ConnectionString {
        ConnectionString::shutdown_database(&self.database_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_PATH)
    }
}
