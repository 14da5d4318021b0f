//! Database connection management
//!
//! Connection strings, session setup and shutdown for the embedded SQLite file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, OpenFlags};
use thiserror::Error;
use tracing::{debug, info};

/// Scheme prefix of every connection string
pub const SCHEME: &str = "sqlite";

const CREATE_ATTR: &str = "create";
const SHUTDOWN_ATTR: &str = "shutdown";

/// Errors raised while opening, checking or shutting down a database
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid connection string: {0}")]
    InvalidUrl(String),

    #[error("Database '{0}' not found")]
    NotFound(String),

    #[error("Database '{0}' is held by another session")]
    Locked(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Database error types
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

/// `<scheme>:<path>[;create=true][;shutdown=true]`
///
/// An empty path is only meaningful for an engine-wide shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    path: Option<PathBuf>,
    create: bool,
    shutdown: bool,
}

impl ConnectionString {
    /// Create the database if it is absent, otherwise open it
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            create: true,
            shutdown: false,
        }
    }

    /// Open an existing database
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            create: false,
            shutdown: false,
        }
    }

    pub fn shutdown_database<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            create: false,
            shutdown: true,
        }
    }

    pub fn shutdown_engine() -> Self {
        Self {
            path: None,
            create: false,
            shutdown: true,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn creates(&self) -> bool {
        self.create
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    fn session_path(&self) -> Result<&Path, ConnectionError> {
        if self.shutdown {
            return Err(ConnectionError::InvalidUrl(format!(
                "'{}' requests a shutdown, not a session",
                self
            )));
        }
        self.path()
            .ok_or_else(|| ConnectionError::InvalidUrl(format!("'{}' names no database", self)))
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", SCHEME)?;
        if let Some(path) = &self.path {
            write!(f, "{}", path.display())?;
        }
        if self.create {
            write!(f, ";{}=true", CREATE_ATTR)?;
        }
        if self.shutdown {
            write!(f, ";{}=true", SHUTDOWN_ATTR)?;
        }
        Ok(())
    }
}

impl FromStr for ConnectionString {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(SCHEME)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(|| {
                ConnectionError::InvalidUrl(format!("'{}' does not start with '{}:'", s, SCHEME))
            })?;

        let mut parts = rest.split(';');
        let path = parts.next().unwrap_or_default().trim();

        let mut create = false;
        let mut shutdown = false;
        for attr in parts.filter(|a| !a.trim().is_empty()) {
            let (key, value) = attr.split_once('=').ok_or_else(|| {
                ConnectionError::InvalidUrl(format!("attribute '{}' has no value", attr))
            })?;
            let key = key.trim();
            let value = match value.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                other => {
                    return Err(ConnectionError::InvalidUrl(format!(
                        "attribute '{}' expects true or false, got '{}'",
                        key, other
                    )))
                }
            };
            match key {
                CREATE_ATTR => create = value,
                SHUTDOWN_ATTR => shutdown = value,
                _ => {
                    return Err(ConnectionError::InvalidUrl(format!(
                        "unknown attribute '{}'",
                        key
                    )))
                }
            }
        }

        if create && shutdown {
            return Err(ConnectionError::InvalidUrl(format!(
                "'{}' cannot both create and shut down",
                s
            )));
        }
        if path.is_empty() && !shutdown {
            return Err(ConnectionError::InvalidUrl(format!("'{}' names no database", s)));
        }

        Ok(Self {
            path: (!path.is_empty()).then(|| PathBuf::from(path)),
            create,
            shutdown,
        })
    }
}

/// A single embedded database session
///
/// A read/write session holds the file exclusively from the moment it is
/// opened until it is closed, so any second session on the same file, read-only
/// or not, fails with [`ConnectionError::Locked`].
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open a read/write session, creating the file when the string asks for it
    pub fn open(url: &ConnectionString) -> Result<Self, ConnectionError> {
        let path = url.session_path()?;
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if url.creates() {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = connect(path, flags)?;
        conn.execute_batch(
            "PRAGMA locking_mode = EXCLUSIVE;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;",
        )
        .map_err(|e| open_error(path, e))?;
        read_schema(&conn, path)?;
        // In exclusive locking mode the write lock outlives the transaction.
        conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")
            .map_err(|e| open_error(path, e))?;

        debug!(url = %url, "opened read/write session");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open a read-only session on an existing database
    pub fn open_read_only(url: &ConnectionString) -> Result<Self, ConnectionError> {
        let path = url.session_path()?;
        let conn = connect(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        read_schema(&conn, path)?;

        debug!(url = %url, "opened read-only session");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a closure with the session's connection
    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        f(&self.conn)
    }

    /// Close the session, surfacing any error the engine reports on close
    pub fn close(self) -> DbResult<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| DbError::Sqlite(e))?;
        debug!(path = %path.display(), "closed session");
        Ok(())
    }

    /// Shut down one database, or accept an engine-wide shutdown
    ///
    /// SQLite runs inside each connection, so there is no process-wide engine to
    /// stop; the engine form only logs. The database form runs `PRAGMA optimize`
    /// on a fresh session and closes it, which fails while another session
    /// still holds the file.
    pub fn shutdown(url: &ConnectionString) -> Result<(), ConnectionError> {
        if !url.is_shutdown() {
            return Err(ConnectionError::InvalidUrl(format!(
                "'{}' lacks {}=true",
                url, SHUTDOWN_ATTR
            )));
        }

        let Some(path) = url.path() else {
            debug!("engine shutdown requested, nothing to stop");
            return Ok(());
        };

        let conn = connect(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        read_schema(&conn, path)?;
        conn.execute_batch("PRAGMA optimize;")
            .map_err(|e| open_error(path, e))?;
        conn.close().map_err(|(_, e)| open_error(path, e))?;

        info!(path = %path.display(), "database shut down");
        Ok(())
    }
}

fn connect(path: &Path, flags: OpenFlags) -> Result<Connection, ConnectionError> {
    let conn = Connection::open_with_flags(path, flags).map_err(|e| open_error(path, e))?;
    // Fail fast on a held file instead of waiting out rusqlite's default timeout.
    conn.busy_timeout(Duration::ZERO)?;
    Ok(conn)
}

/// Touch the schema so a missing or held file is reported at open time
fn read_schema(conn: &Connection, path: &Path) -> Result<(), ConnectionError> {
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|_| ())
    .map_err(|e| open_error(path, e))
}

fn open_error(path: &Path, err: rusqlite::Error) -> ConnectionError {
    match err.sqlite_error_code() {
        Some(ErrorCode::CannotOpen) => ConnectionError::NotFound(path.display().to_string()),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            ConnectionError::Locked(path.display().to_string())
        }
        _ => ConnectionError::Sqlite(err),
    }
}
