//! Reference-catalog repository: one implementation, five tables.
//!
//! # Responsibility
//! - Serve every flat reference catalog (product types, product classes,
//!   mills, grades, suppliers) with a single SQLite repository
//!   parameterized by [`CatalogKind`].
//!
//! # Invariants
//! - Each kind is its own uniqueness scope: the same name may exist in two
//!   different catalogs, never twice within one.

use crate::model::product::{CatalogDraft, CatalogEntry, CatalogEntryId, CatalogKind};
use crate::repo::{
    ensure_schema_ready, flag_to_int, map_write_err, not_found, parse_flag, parse_uuid,
    EntityRepository, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Repository interface for catalog entries, beyond the generic contract.
pub trait CatalogRepository: EntityRepository<Record = CatalogEntry> {
    /// The catalog kind this repository instance serves.
    fn kind(&self) -> CatalogKind;
    /// Case-insensitive name existence check within the kind.
    fn exists_by_name(&self, name: &str) -> RepoResult<bool>;
}

/// SQLite-backed catalog repository for one [`CatalogKind`].
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
    kind: CatalogKind,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates the repository for `kind` from a migrated connection.
    pub fn try_new(conn: &'conn Connection, kind: CatalogKind) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            kind.table(),
            &["entry_uuid", "name", "is_active", "created_at", "updated_at"],
        )?;
        Ok(Self { conn, kind })
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT entry_uuid, name, is_active, created_at, updated_at FROM {}",
            self.kind.table()
        )
    }

    fn collect(&self, sql: &str, bind: impl rusqlite::Params) -> RepoResult<Vec<CatalogEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_entry_row(row, self.kind)?);
        }
        Ok(items)
    }
}

impl EntityRepository for SqliteCatalogRepository<'_> {
    type Record = CatalogEntry;

    fn kind_label(&self) -> &'static str {
        self.kind.label()
    }

    fn insert(&self, draft: &CatalogDraft) -> RepoResult<CatalogEntry> {
        let uuid = Uuid::new_v4();
        let name = draft.name.trim();

        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (entry_uuid, name, is_active) VALUES (?1, ?2, ?3);",
                    self.kind.table()
                ),
                params![
                    uuid.to_string(),
                    name,
                    flag_to_int(draft.active.unwrap_or(true)),
                ],
            )
            .map_err(|err| map_write_err(err, self.kind.label(), name))?;

        self.find_by_id(uuid)?
            .ok_or_else(|| not_found(self.kind.label(), uuid))
    }

    fn save(&self, record: &CatalogEntry) -> RepoResult<CatalogEntry> {
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE {}
                     SET name = ?2,
                         is_active = ?3,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE entry_uuid = ?1;",
                    self.kind.table()
                ),
                params![
                    record.uuid.to_string(),
                    record.name.as_str(),
                    flag_to_int(record.active),
                ],
            )
            .map_err(|err| map_write_err(err, self.kind.label(), &record.name))?;

        if changed == 0 {
            return Err(not_found(self.kind.label(), record.uuid));
        }

        self.find_by_id(record.uuid)?
            .ok_or_else(|| not_found(self.kind.label(), record.uuid))
    }

    fn find_by_id(&self, id: CatalogEntryId) -> RepoResult<Option<CatalogEntry>> {
        let sql = format!("{} WHERE entry_uuid = ?1;", self.select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row, self.kind)?));
        }
        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<CatalogEntry>> {
        let sql = format!(
            "{} ORDER BY updated_at DESC, entry_uuid ASC;",
            self.select_sql()
        );
        self.collect(&sql, params![])
    }

    fn find_active(&self) -> RepoResult<Vec<CatalogEntry>> {
        let sql = format!(
            "{} WHERE is_active = 1 ORDER BY updated_at DESC, entry_uuid ASC;",
            self.select_sql()
        );
        self.collect(&sql, params![])
    }

    fn find_page(&self, limit: u32, offset: u32) -> RepoResult<Vec<CatalogEntry>> {
        let sql = format!(
            "{} ORDER BY updated_at DESC, entry_uuid ASC LIMIT ?1 OFFSET ?2;",
            self.select_sql()
        );
        self.collect(&sql, params![i64::from(limit), i64::from(offset)])
    }

    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<CatalogEntry>> {
        let sql = format!(
            "{} WHERE name LIKE '%' || ?1 || '%' ORDER BY updated_at DESC, entry_uuid ASC;",
            self.select_sql()
        );
        self.collect(&sql, params![fragment.trim()])
    }

    fn exists_by_id(&self, id: CatalogEntryId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE entry_uuid = ?1);",
                self.kind.table()
            ),
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete(&self, id: CatalogEntryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE entry_uuid = ?1;", self.kind.table()),
                [id.to_string()],
            )
            .map_err(|err| map_write_err(err, self.kind.label(), ""))?;
        if changed == 0 {
            return Err(not_found(self.kind.label(), id));
        }
        Ok(())
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn kind(&self) -> CatalogKind {
        self.kind
    }

    fn exists_by_name(&self, name: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE name = ?1);",
                self.kind.table()
            ),
            [name.trim()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_entry_row(row: &Row<'_>, kind: CatalogKind) -> RepoResult<CatalogEntry> {
    let uuid_text: String = row.get("entry_uuid")?;
    let uuid_column = format!("{}.entry_uuid", kind.table());
    let flag_column = format!("{}.is_active", kind.table());
    Ok(CatalogEntry {
        uuid: parse_uuid(&uuid_text, &uuid_column)?,
        name: row.get("name")?,
        active: parse_flag(row.get("is_active")?, &flag_column)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
