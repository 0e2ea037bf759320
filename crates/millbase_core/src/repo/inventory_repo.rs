//! Locality/area repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide persistence APIs for the locality/area hierarchy.
//! - Keep SQL details and the cascade-delete transaction inside the
//!   repository boundary.
//!
//! # Invariants
//! - `(locality_uuid, name)` uniqueness is enforced by the store's NOCASE
//!   unique index; repository pre-checks only shortcut the common case.
//! - Locality deletion removes every owned area in the same transaction;
//!   an orphaned area row is never observable.

use crate::model::locality::{Area, AreaDraft, AreaId, Locality, LocalityDraft, LocalityId};
use crate::repo::{
    ensure_schema_ready, flag_to_int, map_write_err, not_found, parse_flag, parse_uuid,
    EntityRepository, RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const LOCALITY_SELECT_SQL: &str = "SELECT
    locality_uuid,
    name,
    is_active,
    created_at,
    updated_at
FROM localities";

const AREA_SELECT_SQL: &str = "SELECT
    area_uuid,
    locality_uuid,
    name,
    is_active,
    created_at,
    updated_at
FROM areas";

/// Repository interface for localities, beyond the generic store contract.
pub trait LocalityRepository: EntityRepository<Record = Locality> {
    /// Case-insensitive global name existence check.
    fn exists_by_name(&self, name: &str) -> RepoResult<bool>;
    /// Loads one locality together with its areas.
    fn find_with_areas(&self, id: LocalityId) -> RepoResult<Option<Locality>>;
    /// Hard-deletes one locality and every area it owns, atomically.
    fn delete_with_areas(&self, id: LocalityId) -> RepoResult<()>;
}

/// Repository interface for areas, beyond the generic store contract.
pub trait AreaRepository: EntityRepository<Record = Area> {
    /// Case-insensitive name existence check scoped to one locality.
    fn exists_by_name_in_locality(
        &self,
        name: &str,
        locality_uuid: LocalityId,
    ) -> RepoResult<bool>;
    /// Lists areas owned by one locality.
    fn find_by_locality(&self, locality_uuid: LocalityId) -> RepoResult<Vec<Area>>;
    /// Counts areas owned by one locality.
    fn count_by_locality(&self, locality_uuid: LocalityId) -> RepoResult<u64>;
}

/// SQLite-backed locality repository.
pub struct SqliteLocalityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocalityRepository<'conn> {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            "localities",
            &["locality_uuid", "name", "is_active", "created_at", "updated_at"],
        )?;
        Ok(Self { conn })
    }
}

impl EntityRepository for SqliteLocalityRepository<'_> {
    type Record = Locality;

    fn insert(&self, draft: &LocalityDraft) -> RepoResult<Locality> {
        let uuid = Uuid::new_v4();
        let name = draft.name.trim();
        let active = draft.active.unwrap_or(true);

        // Seed areas persist with their locality or not at all.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO localities (locality_uuid, name, is_active)
             VALUES (?1, ?2, ?3);",
            params![uuid.to_string(), name, flag_to_int(active)],
        )
        .map_err(|err| map_write_err(err, "locality", name))?;

        for seed in &draft.areas {
            let seed_name = seed.name.trim();
            tx.execute(
                "INSERT INTO areas (area_uuid, locality_uuid, name, is_active)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    Uuid::new_v4().to_string(),
                    uuid.to_string(),
                    seed_name,
                    flag_to_int(seed.active.unwrap_or(true)),
                ],
            )
            .map_err(|err| map_write_err(err, "area", seed_name))?;
        }
        tx.commit()?;

        self.find_with_areas(uuid)?
            .ok_or_else(|| not_found("locality", uuid))
    }

    fn save(&self, record: &Locality) -> RepoResult<Locality> {
        let changed = self
            .conn
            .execute(
                "UPDATE localities
                 SET name = ?2,
                     is_active = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE locality_uuid = ?1;",
                params![
                    record.uuid.to_string(),
                    record.name.as_str(),
                    flag_to_int(record.active),
                ],
            )
            .map_err(|err| map_write_err(err, "locality", &record.name))?;

        if changed == 0 {
            return Err(not_found("locality", record.uuid));
        }

        self.find_by_id(record.uuid)?
            .ok_or_else(|| not_found("locality", record.uuid))
    }

    fn find_by_id(&self, id: LocalityId) -> RepoResult<Option<Locality>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOCALITY_SELECT_SQL} WHERE locality_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_locality_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<Locality>> {
        collect_localities(
            self.conn,
            &format!("{LOCALITY_SELECT_SQL} ORDER BY updated_at DESC, locality_uuid ASC;"),
            params![],
        )
    }

    fn find_active(&self) -> RepoResult<Vec<Locality>> {
        collect_localities(
            self.conn,
            &format!(
                "{LOCALITY_SELECT_SQL}
                 WHERE is_active = 1
                 ORDER BY updated_at DESC, locality_uuid ASC;"
            ),
            params![],
        )
    }

    fn find_page(&self, limit: u32, offset: u32) -> RepoResult<Vec<Locality>> {
        collect_localities(
            self.conn,
            &format!(
                "{LOCALITY_SELECT_SQL}
                 ORDER BY updated_at DESC, locality_uuid ASC
                 LIMIT ?1 OFFSET ?2;"
            ),
            params![i64::from(limit), i64::from(offset)],
        )
    }

    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Locality>> {
        collect_localities(
            self.conn,
            &format!(
                "{LOCALITY_SELECT_SQL}
                 WHERE name LIKE '%' || ?1 || '%'
                 ORDER BY updated_at DESC, locality_uuid ASC;"
            ),
            params![fragment.trim()],
        )
    }

    fn exists_by_id(&self, id: LocalityId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM localities WHERE locality_uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete(&self, id: LocalityId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM localities WHERE locality_uuid = ?1;",
                [id.to_string()],
            )
            .map_err(|err| map_write_err(err, "locality", ""))?;
        if changed == 0 {
            return Err(not_found("locality", id));
        }
        Ok(())
    }
}

impl LocalityRepository for SqliteLocalityRepository<'_> {
    fn exists_by_name(&self, name: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM localities WHERE name = ?1);",
            [name.trim()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_with_areas(&self, id: LocalityId) -> RepoResult<Option<Locality>> {
        let Some(mut locality) = self.find_by_id(id)? else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(&format!(
            "{AREA_SELECT_SQL}
             WHERE locality_uuid = ?1
             ORDER BY name ASC, area_uuid ASC;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        while let Some(row) = rows.next()? {
            locality.attach_area(parse_area_row(row)?);
        }

        Ok(Some(locality))
    }

    fn delete_with_areas(&self, id: LocalityId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM localities WHERE locality_uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(not_found("locality", id));
        }

        // Children first so the foreign key never sees an orphan window.
        tx.execute(
            "DELETE FROM areas WHERE locality_uuid = ?1;",
            [id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM localities WHERE locality_uuid = ?1;",
            [id.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }
}

/// SQLite-backed area repository.
pub struct SqliteAreaRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAreaRepository<'conn> {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            "areas",
            &[
                "area_uuid",
                "locality_uuid",
                "name",
                "is_active",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl EntityRepository for SqliteAreaRepository<'_> {
    type Record = Area;

    fn insert(&self, draft: &AreaDraft) -> RepoResult<Area> {
        let uuid = Uuid::new_v4();
        let name = draft.name.trim();

        self.conn
            .execute(
                "INSERT INTO areas (area_uuid, locality_uuid, name, is_active)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    uuid.to_string(),
                    draft.locality_uuid.to_string(),
                    name,
                    flag_to_int(draft.active.unwrap_or(true)),
                ],
            )
            .map_err(|err| map_write_err(err, "area", name))?;

        self.find_by_id(uuid)?.ok_or_else(|| not_found("area", uuid))
    }

    fn save(&self, record: &Area) -> RepoResult<Area> {
        // locality_uuid is deliberately absent from the SET list: the
        // parent reference is immutable through saves.
        let changed = self
            .conn
            .execute(
                "UPDATE areas
                 SET name = ?2,
                     is_active = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE area_uuid = ?1;",
                params![
                    record.uuid.to_string(),
                    record.name.as_str(),
                    flag_to_int(record.active),
                ],
            )
            .map_err(|err| map_write_err(err, "area", &record.name))?;

        if changed == 0 {
            return Err(not_found("area", record.uuid));
        }

        self.find_by_id(record.uuid)?
            .ok_or_else(|| not_found("area", record.uuid))
    }

    fn find_by_id(&self, id: AreaId) -> RepoResult<Option<Area>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AREA_SELECT_SQL} WHERE area_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_area_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<Area>> {
        collect_areas(
            self.conn,
            &format!("{AREA_SELECT_SQL} ORDER BY updated_at DESC, area_uuid ASC;"),
            params![],
        )
    }

    fn find_active(&self) -> RepoResult<Vec<Area>> {
        collect_areas(
            self.conn,
            &format!(
                "{AREA_SELECT_SQL}
                 WHERE is_active = 1
                 ORDER BY updated_at DESC, area_uuid ASC;"
            ),
            params![],
        )
    }

    fn find_page(&self, limit: u32, offset: u32) -> RepoResult<Vec<Area>> {
        collect_areas(
            self.conn,
            &format!(
                "{AREA_SELECT_SQL}
                 ORDER BY updated_at DESC, area_uuid ASC
                 LIMIT ?1 OFFSET ?2;"
            ),
            params![i64::from(limit), i64::from(offset)],
        )
    }

    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Area>> {
        collect_areas(
            self.conn,
            &format!(
                "{AREA_SELECT_SQL}
                 WHERE name LIKE '%' || ?1 || '%'
                 ORDER BY updated_at DESC, area_uuid ASC;"
            ),
            params![fragment.trim()],
        )
    }

    fn exists_by_id(&self, id: AreaId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM areas WHERE area_uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete(&self, id: AreaId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM areas WHERE area_uuid = ?1;", [id.to_string()])
            .map_err(|err| map_write_err(err, "area", ""))?;
        if changed == 0 {
            return Err(not_found("area", id));
        }
        Ok(())
    }
}

impl AreaRepository for SqliteAreaRepository<'_> {
    fn exists_by_name_in_locality(
        &self,
        name: &str,
        locality_uuid: LocalityId,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM areas
                WHERE locality_uuid = ?1
                  AND name = ?2
            );",
            params![locality_uuid.to_string(), name.trim()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_by_locality(&self, locality_uuid: LocalityId) -> RepoResult<Vec<Area>> {
        collect_areas(
            self.conn,
            &format!(
                "{AREA_SELECT_SQL}
                 WHERE locality_uuid = ?1
                 ORDER BY name ASC, area_uuid ASC;"
            ),
            params![locality_uuid.to_string()],
        )
    }

    fn count_by_locality(&self, locality_uuid: LocalityId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM areas WHERE locality_uuid = ?1;",
            [locality_uuid.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn collect_localities(
    conn: &Connection,
    sql: &str,
    bind: impl rusqlite::Params,
) -> RepoResult<Vec<Locality>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(bind)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_locality_row(row)?);
    }
    Ok(items)
}

fn collect_areas(
    conn: &Connection,
    sql: &str,
    bind: impl rusqlite::Params,
) -> RepoResult<Vec<Area>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(bind)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_area_row(row)?);
    }
    Ok(items)
}

fn parse_locality_row(row: &Row<'_>) -> RepoResult<Locality> {
    let uuid_text: String = row.get("locality_uuid")?;
    Ok(Locality {
        uuid: parse_uuid(&uuid_text, "localities.locality_uuid")?,
        name: row.get("name")?,
        active: parse_flag(row.get("is_active")?, "localities.is_active")?,
        areas: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_area_row(row: &Row<'_>) -> RepoResult<Area> {
    let uuid_text: String = row.get("area_uuid")?;
    let locality_text: String = row.get("locality_uuid")?;
    Ok(Area {
        uuid: parse_uuid(&uuid_text, "areas.area_uuid")?,
        locality_uuid: parse_uuid(&locality_text, "areas.locality_uuid")?,
        name: row.get("name")?,
        active: parse_flag(row.get("is_active")?, "areas.is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

