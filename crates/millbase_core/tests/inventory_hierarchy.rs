use millbase_core::db::open_db_in_memory;
use millbase_core::{
    AreaDraft, AreaSeed, EntityRepository, InventoryError, InventoryService, LocalityDraft,
    RepoError, SqliteAreaRepository, SqliteLocalityRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn inventory(
    conn: &Connection,
) -> InventoryService<SqliteLocalityRepository<'_>, SqliteAreaRepository<'_>> {
    InventoryService::new(
        SqliteLocalityRepository::try_new(conn).unwrap(),
        SqliteAreaRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn area_names_are_unique_per_locality_not_globally() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let guadalajara = service
        .create_locality(&LocalityDraft::new("Guadalajara"))
        .unwrap();

    let almacen = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();
    assert_eq!(almacen.locality_uuid(), cdmx.uuid);

    // Different case, same locality: rejected.
    let err = service
        .create_area(&AreaDraft::new(cdmx.uuid, "almacen"))
        .unwrap_err();
    assert!(matches!(
        err,
        InventoryError::DuplicateAreaName { name, locality_uuid }
            if name == "almacen" && locality_uuid == cdmx.uuid
    ));

    // Same name under another locality: allowed.
    let twin = service
        .create_area(&AreaDraft::new(guadalajara.uuid, "Almacen"))
        .unwrap();
    assert_eq!(twin.locality_uuid(), guadalajara.uuid);
}

#[test]
fn create_area_requires_existing_locality() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let missing = Uuid::new_v4();
    let err = service
        .create_area(&AreaDraft::new(missing, "Almacen"))
        .unwrap_err();
    assert!(matches!(err, InventoryError::LocalityNotFound(id) if id == missing));
}

#[test]
fn update_area_never_reparents() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let guadalajara = service
        .create_locality(&LocalityDraft::new("Guadalajara"))
        .unwrap();
    let area = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();

    // The payload names another locality; the parent must not change.
    let updated = service
        .update_area(area.uuid, &AreaDraft::new(guadalajara.uuid, "Patio"))
        .unwrap();
    assert_eq!(updated.locality_uuid(), cdmx.uuid);
    assert_eq!(updated.name, "Patio");
}

#[test]
fn update_area_rechecks_scoped_uniqueness_only_on_name_change() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let almacen = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();
    service
        .create_area(&AreaDraft::new(cdmx.uuid, "Patio"))
        .unwrap();

    // Same name, different case: no collision with itself.
    let recased = service
        .update_area(almacen.uuid, &AreaDraft::new(cdmx.uuid, "ALMACEN"))
        .unwrap();
    assert_eq!(recased.name, "ALMACEN");

    // Renaming onto a sibling collides.
    let err = service
        .update_area(almacen.uuid, &AreaDraft::new(cdmx.uuid, "patio"))
        .unwrap_err();
    assert!(matches!(err, InventoryError::DuplicateAreaName { .. }));
}

#[test]
fn update_area_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let missing = Uuid::new_v4();
    let err = service
        .update_area(missing, &AreaDraft::new(cdmx.uuid, "Patio"))
        .unwrap_err();
    assert!(matches!(err, InventoryError::AreaNotFound(id) if id == missing));
}

#[test]
fn delete_locality_cascades_to_every_area() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let almacen = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();
    let patio = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Patio"))
        .unwrap();

    service.delete_locality(cdmx.uuid).unwrap();

    assert!(matches!(
        service.get_locality(cdmx.uuid).unwrap_err(),
        InventoryError::LocalityNotFound(_)
    ));
    assert!(matches!(
        service.get_area(almacen.uuid).unwrap_err(),
        InventoryError::AreaNotFound(_)
    ));
    assert!(matches!(
        service.get_area(patio.uuid).unwrap_err(),
        InventoryError::AreaNotFound(_)
    ));
}

#[test]
fn delete_locality_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let missing = Uuid::new_v4();
    let err = service.delete_locality(missing).unwrap_err();
    assert!(matches!(err, InventoryError::LocalityNotFound(id) if id == missing));
}

#[test]
fn deactivating_a_locality_leaves_area_status_untouched() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let almacen = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();
    let patio = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Patio"))
        .unwrap();
    service.deactivate_area(patio.uuid).unwrap();

    service.deactivate_locality(cdmx.uuid).unwrap();

    assert!(service.get_area(almacen.uuid).unwrap().active);
    assert!(!service.get_area(patio.uuid).unwrap().active);
}

#[test]
fn soft_delete_keeps_locality_and_areas_retrievable() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let almacen = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();

    service.soft_delete_locality(cdmx.uuid).unwrap();

    let loaded = service.get_locality(cdmx.uuid).unwrap();
    assert!(!loaded.active);
    assert!(service.get_area(almacen.uuid).unwrap().active);
}

#[test]
fn area_deactivate_activate_roundtrip_preserves_attributes() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let area = service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();

    let deactivated = service.deactivate_area(area.uuid).unwrap();
    assert!(!deactivated.active);

    let restored = service.activate_area(area.uuid).unwrap();
    assert!(restored.active);
    assert_eq!(restored.uuid, area.uuid);
    assert_eq!(restored.name, area.name);
    assert_eq!(restored.locality_uuid(), area.locality_uuid());
    assert_eq!(restored.created_at, area.created_at);
}

#[test]
fn locality_names_are_globally_unique_any_case() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let err = service
        .create_locality(&LocalityDraft::new("cdmx"))
        .unwrap_err();
    assert!(matches!(err, InventoryError::DuplicateLocalityName(name) if name == "cdmx"));
}

#[test]
fn create_locality_with_seed_areas_is_atomic() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let created = service
        .create_locality(&LocalityDraft::with_areas(
            "CDMX",
            vec![AreaSeed::new("Almacen"), AreaSeed::new("Patio")],
        ))
        .unwrap();
    assert_eq!(created.areas().len(), 2);
    for area in created.areas() {
        assert_eq!(area.locality_uuid(), created.uuid);
    }

    // Duplicate seed names abort the whole creation.
    let err = service
        .create_locality(&LocalityDraft::with_areas(
            "Monterrey",
            vec![AreaSeed::new("Almacen"), AreaSeed::new("almacen")],
        ))
        .unwrap_err();
    assert!(matches!(err, InventoryError::DuplicateSeedArea(name) if name == "almacen"));

    let names: Vec<String> = service
        .list_localities()
        .unwrap()
        .into_iter()
        .map(|locality| locality.name)
        .collect();
    assert_eq!(names, vec!["CDMX".to_string()]);
}

#[test]
fn locality_with_areas_keeps_both_sides_consistent() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();
    service
        .create_area(&AreaDraft::new(cdmx.uuid, "Patio"))
        .unwrap();

    let loaded = service.get_locality_with_areas(cdmx.uuid).unwrap();
    assert_eq!(loaded.areas().len(), 2);
    for area in loaded.areas() {
        assert_eq!(area.locality_uuid(), loaded.uuid);
    }

    let listed = service.list_areas_of(cdmx.uuid).unwrap();
    assert_eq!(listed.len(), loaded.areas().len());
    assert_eq!(service.count_areas_of(cdmx.uuid).unwrap(), 2);
}

#[test]
fn listing_areas_of_missing_locality_fails() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.list_areas_of(missing).unwrap_err(),
        InventoryError::LocalityNotFound(id) if id == missing
    ));
    assert!(matches!(
        service.count_areas_of(missing).unwrap_err(),
        InventoryError::LocalityNotFound(id) if id == missing
    ));
}

#[test]
fn update_locality_rechecks_global_uniqueness_on_rename() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    service
        .create_locality(&LocalityDraft::new("Guadalajara"))
        .unwrap();

    // Re-casing the own name is not a collision.
    let recased = service
        .update_locality(cdmx.uuid, &LocalityDraft::new("Cdmx"))
        .unwrap();
    assert_eq!(recased.name, "Cdmx");

    let err = service
        .update_locality(cdmx.uuid, &LocalityDraft::new("guadalajara"))
        .unwrap_err();
    assert!(matches!(err, InventoryError::DuplicateLocalityName(_)));
}

#[test]
fn listing_delegations_reach_the_engine() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    let monterrey = service
        .create_locality(&LocalityDraft::new("Monterrey"))
        .unwrap();
    service.deactivate_locality(monterrey.uuid).unwrap();
    service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();

    let active = service.list_active_localities().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].uuid, cdmx.uuid);

    let hits = service.search_localities("monte").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, monterrey.uuid);

    assert_eq!(service.list_localities_page(Some(1), 0).unwrap().len(), 1);
    assert_eq!(service.list_areas().unwrap().len(), 1);
    assert_eq!(service.list_active_areas().unwrap().len(), 1);
    assert_eq!(service.search_areas("alma").unwrap().len(), 1);
    assert_eq!(service.list_areas_page(None, 0).unwrap().len(), 1);
}

#[test]
fn direct_hard_delete_of_an_owning_locality_hits_the_foreign_key() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();

    // Bypassing the cascade operation must not be able to orphan areas.
    let repo = SqliteLocalityRepository::try_new(&conn).unwrap();
    let err = repo.delete(cdmx.uuid).unwrap_err();
    assert!(matches!(
        err,
        RepoError::ForeignKeyViolation { kind: "locality" }
    ));
    assert_eq!(service.count_areas_of(cdmx.uuid).unwrap(), 1);
}

#[test]
fn store_constraint_backs_the_scoped_pre_check() {
    let conn = open_db_in_memory().unwrap();
    let service = inventory(&conn);

    let cdmx = service
        .create_locality(&LocalityDraft::new("CDMX"))
        .unwrap();
    service
        .create_area(&AreaDraft::new(cdmx.uuid, "Almacen"))
        .unwrap();

    // A racing writer that skipped the application pre-check still hits
    // the unique index, any case variation.
    let result = conn.execute(
        "INSERT INTO areas (area_uuid, locality_uuid, name) VALUES (?1, ?2, 'ALMACEN');",
        rusqlite::params![Uuid::new_v4().to_string(), cdmx.uuid.to_string()],
    );
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    ));
}
