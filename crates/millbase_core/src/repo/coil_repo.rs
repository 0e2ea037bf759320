//! Coil repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist coil records and their five catalog references.
//! - Answer the reference-existence checks the coil service validates
//!   with; the foreign keys remain the store backstop.
//!
//! # Invariants
//! - `supplier_code` is globally unique, case-insensitive.
//! - Reference columns always point at existing catalog rows.

use crate::model::product::{CatalogEntryId, CatalogKind, Coil, CoilDraft, CoilId};
use crate::repo::{
    ensure_schema_ready, flag_to_int, map_write_err, not_found, parse_flag, parse_uuid,
    EntityRepository, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const COIL_SELECT_SQL: &str = "SELECT
    coil_uuid,
    supplier_code,
    width_mm,
    grammage_gsm,
    caliper,
    weight_kg,
    product_type_uuid,
    product_class_uuid,
    mill_uuid,
    grade_uuid,
    supplier_uuid,
    is_active,
    created_at,
    updated_at
FROM coils";

/// Repository interface for coils, beyond the generic store contract.
pub trait CoilRepository: EntityRepository<Record = Coil> {
    /// Case-insensitive supplier-code existence check.
    fn exists_by_supplier_code(&self, code: &str) -> RepoResult<bool>;
    /// Whether `id` names an existing entry of catalog `kind`.
    fn catalog_ref_exists(&self, kind: CatalogKind, id: CatalogEntryId) -> RepoResult<bool>;
}

/// SQLite-backed coil repository.
pub struct SqliteCoilRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCoilRepository<'conn> {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            "coils",
            &[
                "coil_uuid",
                "supplier_code",
                "width_mm",
                "grammage_gsm",
                "caliper",
                "weight_kg",
                "product_type_uuid",
                "product_class_uuid",
                "mill_uuid",
                "grade_uuid",
                "supplier_uuid",
                "is_active",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }

    fn collect(&self, sql: &str, bind: impl rusqlite::Params) -> RepoResult<Vec<Coil>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_coil_row(row)?);
        }
        Ok(items)
    }
}

impl EntityRepository for SqliteCoilRepository<'_> {
    type Record = Coil;

    fn insert(&self, draft: &CoilDraft) -> RepoResult<Coil> {
        let uuid = Uuid::new_v4();
        let code = draft.supplier_code.trim();

        self.conn
            .execute(
                "INSERT INTO coils (
                    coil_uuid,
                    supplier_code,
                    width_mm,
                    grammage_gsm,
                    caliper,
                    weight_kg,
                    product_type_uuid,
                    product_class_uuid,
                    mill_uuid,
                    grade_uuid,
                    supplier_uuid,
                    is_active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
                params![
                    uuid.to_string(),
                    code,
                    draft.width_mm,
                    draft.grammage_gsm,
                    draft.caliper.as_deref().map(str::trim),
                    draft.weight_kg,
                    draft.product_type_uuid.to_string(),
                    draft.product_class_uuid.to_string(),
                    draft.mill_uuid.to_string(),
                    draft.grade_uuid.to_string(),
                    draft.supplier_uuid.to_string(),
                    flag_to_int(draft.active.unwrap_or(true)),
                ],
            )
            .map_err(|err| map_write_err(err, "coil", code))?;

        self.find_by_id(uuid)?.ok_or_else(|| not_found("coil", uuid))
    }

    fn save(&self, record: &Coil) -> RepoResult<Coil> {
        let changed = self
            .conn
            .execute(
                "UPDATE coils
                 SET supplier_code = ?2,
                     width_mm = ?3,
                     grammage_gsm = ?4,
                     caliper = ?5,
                     weight_kg = ?6,
                     product_type_uuid = ?7,
                     product_class_uuid = ?8,
                     mill_uuid = ?9,
                     grade_uuid = ?10,
                     supplier_uuid = ?11,
                     is_active = ?12,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE coil_uuid = ?1;",
                params![
                    record.uuid.to_string(),
                    record.supplier_code.as_str(),
                    record.width_mm,
                    record.grammage_gsm,
                    record.caliper.as_deref(),
                    record.weight_kg,
                    record.product_type_uuid.to_string(),
                    record.product_class_uuid.to_string(),
                    record.mill_uuid.to_string(),
                    record.grade_uuid.to_string(),
                    record.supplier_uuid.to_string(),
                    flag_to_int(record.active),
                ],
            )
            .map_err(|err| map_write_err(err, "coil", &record.supplier_code))?;

        if changed == 0 {
            return Err(not_found("coil", record.uuid));
        }

        self.find_by_id(record.uuid)?
            .ok_or_else(|| not_found("coil", record.uuid))
    }

    fn find_by_id(&self, id: CoilId) -> RepoResult<Option<Coil>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COIL_SELECT_SQL} WHERE coil_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_coil_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<Coil>> {
        self.collect(
            &format!("{COIL_SELECT_SQL} ORDER BY updated_at DESC, coil_uuid ASC;"),
            params![],
        )
    }

    fn find_active(&self) -> RepoResult<Vec<Coil>> {
        self.collect(
            &format!(
                "{COIL_SELECT_SQL}
                 WHERE is_active = 1
                 ORDER BY updated_at DESC, coil_uuid ASC;"
            ),
            params![],
        )
    }

    fn find_page(&self, limit: u32, offset: u32) -> RepoResult<Vec<Coil>> {
        self.collect(
            &format!(
                "{COIL_SELECT_SQL}
                 ORDER BY updated_at DESC, coil_uuid ASC
                 LIMIT ?1 OFFSET ?2;"
            ),
            params![i64::from(limit), i64::from(offset)],
        )
    }

    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Coil>> {
        self.collect(
            &format!(
                "{COIL_SELECT_SQL}
                 WHERE supplier_code LIKE '%' || ?1 || '%'
                 ORDER BY updated_at DESC, coil_uuid ASC;"
            ),
            params![fragment.trim()],
        )
    }

    fn exists_by_id(&self, id: CoilId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM coils WHERE coil_uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete(&self, id: CoilId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM coils WHERE coil_uuid = ?1;", [id.to_string()])
            .map_err(|err| map_write_err(err, "coil", ""))?;
        if changed == 0 {
            return Err(not_found("coil", id));
        }
        Ok(())
    }
}

impl CoilRepository for SqliteCoilRepository<'_> {
    fn exists_by_supplier_code(&self, code: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM coils WHERE supplier_code = ?1);",
            [code.trim()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn catalog_ref_exists(&self, kind: CatalogKind, id: CatalogEntryId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE entry_uuid = ?1);",
                kind.table()
            ),
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_coil_row(row: &Row<'_>) -> RepoResult<Coil> {
    let uuid_text: String = row.get("coil_uuid")?;
    let product_type_text: String = row.get("product_type_uuid")?;
    let product_class_text: String = row.get("product_class_uuid")?;
    let mill_text: String = row.get("mill_uuid")?;
    let grade_text: String = row.get("grade_uuid")?;
    let supplier_text: String = row.get("supplier_uuid")?;
    Ok(Coil {
        uuid: parse_uuid(&uuid_text, "coils.coil_uuid")?,
        supplier_code: row.get("supplier_code")?,
        width_mm: row.get("width_mm")?,
        grammage_gsm: row.get("grammage_gsm")?,
        caliper: row.get("caliper")?,
        weight_kg: row.get("weight_kg")?,
        product_type_uuid: parse_uuid(&product_type_text, "coils.product_type_uuid")?,
        product_class_uuid: parse_uuid(&product_class_text, "coils.product_class_uuid")?,
        mill_uuid: parse_uuid(&mill_text, "coils.mill_uuid")?,
        grade_uuid: parse_uuid(&grade_text, "coils.grade_uuid")?,
        supplier_uuid: parse_uuid(&supplier_text, "coils.supplier_uuid")?,
        active: parse_flag(row.get("is_active")?, "coils.is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
