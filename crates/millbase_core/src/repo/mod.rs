//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contract the lifecycle engine runs against.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Identity is assigned exactly once, by `insert`; no other code path
//!   ever generates ids.
//! - Unique-constraint and foreign-key failures surface as typed errors,
//!   never as a generic SQL error, so races caught only by the store still
//!   produce the same error kind as the application pre-checks.

use crate::db::DbError;
use crate::model::entity::StatusEntity;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod catalog_repo;
pub mod coil_repo;
pub mod inventory_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record type served by a repository.
pub type RecordOf<R> = <R as EntityRepository>::Record;
/// Identity type of a repository's record.
pub type IdOf<R> = <RecordOf<R> as StatusEntity>::Id;
/// Draft type of a repository's record.
pub type DraftOf<R> = <RecordOf<R> as StatusEntity>::Draft;

/// Store-level failure taxonomy shared by every repository.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error ("could not ask the store").
    Db(DbError),
    /// No record with the given id exists.
    NotFound { kind: &'static str, id: String },
    /// The identifying name collides inside its uniqueness scope.
    DuplicateName { kind: &'static str, name: String },
    /// A mandatory reference points at a missing row.
    ForeignKeyViolation { kind: &'static str },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::DuplicateName { kind, name } => {
                write!(f, "{kind} name already exists in scope: `{name}`")
            }
            Self::ForeignKeyViolation { kind } => {
                write!(f, "{kind} references a missing row")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "repository requires column `{column}` in table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store contract for one record type.
///
/// This is the whole surface the generic lifecycle engine needs; scoped
/// queries live on per-aggregate extension traits.
pub trait EntityRepository {
    type Record: StatusEntity;

    /// Label used in log events and error kinds. Repositories serving
    /// several scopes with one record type override this.
    fn kind_label(&self) -> &'static str {
        <Self::Record as StatusEntity>::KIND
    }

    /// Persists a new record. The store assigns the identity and returns
    /// the stored form, timestamps included.
    fn insert(&self, draft: &DraftOf<Self>) -> RepoResult<Self::Record>;

    /// Overwrites the stored record with `record`'s fields, keyed by its
    /// id, and returns the post-write form. Fails with `NotFound` when the
    /// id does not exist.
    fn save(&self, record: &Self::Record) -> RepoResult<Self::Record>;

    fn find_by_id(&self, id: IdOf<Self>) -> RepoResult<Option<Self::Record>>;

    /// Every stored record, active or not.
    fn find_all(&self) -> RepoResult<Vec<Self::Record>>;

    /// Records with the active flag set.
    fn find_active(&self) -> RepoResult<Vec<Self::Record>>;

    /// One page in the deterministic listing order.
    fn find_page(&self, limit: u32, offset: u32) -> RepoResult<Vec<Self::Record>>;

    /// Case-insensitive substring match on the identifying name.
    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Self::Record>>;

    fn exists_by_id(&self, id: IdOf<Self>) -> RepoResult<bool>;

    /// Hard delete. Only the cascade path calls this; user-facing deletion
    /// is deactivation.
    fn delete(&self, id: IdOf<Self>) -> RepoResult<()>;
}

/// Maps a SQLite failure from a write into the typed taxonomy.
///
/// Unique and primary-key violations become `DuplicateName` so a race
/// caught only by the store constraint is indistinguishable, for callers,
/// from one caught by the application pre-check.
pub(crate) fn map_write_err(err: rusqlite::Error, kind: &'static str, name: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(code, _) = &err {
        match code.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return RepoError::DuplicateName {
                    kind,
                    name: name.to_string(),
                };
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return RepoError::ForeignKeyViolation { kind };
            }
            _ => {}
        }
    }
    RepoError::Db(DbError::Sqlite(err))
}

pub(crate) fn not_found(kind: &'static str, id: Uuid) -> RepoError {
    RepoError::NotFound {
        kind,
        id: id.to_string(),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn flag_to_int(value: bool) -> i64 {
    i64::from(value)
}

/// Guards a repository constructor against unmigrated or foreign schemas.
pub(crate) fn ensure_schema_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = crate::db::migrations::latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
