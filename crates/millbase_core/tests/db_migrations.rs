use millbase_core::db::migrations::latest_version;
use millbase_core::db::{open_db, open_db_in_memory, DbError};
use millbase_core::{RepoError, SqliteLocalityRepository};
use rusqlite::Connection;

const EXPECTED_TABLES: [&str; 8] = [
    "localities",
    "areas",
    "product_types",
    "product_classes",
    "mills",
    "grades",
    "suppliers",
    "coils",
];

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut names = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        names.push(row.get::<_, String>(0).unwrap());
    }
    names
}

#[test]
fn migrations_create_all_catalog_tables() {
    let conn = open_db_in_memory().unwrap();

    let names = table_names(&conn);
    for table in EXPECTED_TABLES {
        assert!(names.iter().any(|name| name == table), "missing {table}");
    }

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn migrations_enable_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn reopening_a_migrated_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("millbase.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO localities (locality_uuid, name) VALUES ('00000000-0000-4000-8000-000000000001', 'CDMX');",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM localities;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn newer_schema_versions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("millbase.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion {
            db_version: 999,
            ..
        }
    ));
}

#[test]
fn repositories_reject_uninitialized_connections() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteLocalityRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repositories_reject_connections_missing_required_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteLocalityRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("localities"))
    ));
}

#[test]
fn repositories_reject_connections_missing_required_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE localities (
            locality_uuid TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteLocalityRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "localities",
            column: "is_active"
        })
    ));
}

#[test]
fn area_unique_index_is_scoped_and_case_insensitive() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO localities (locality_uuid, name) VALUES
            ('00000000-0000-4000-8000-000000000001', 'CDMX'),
            ('00000000-0000-4000-8000-000000000002', 'Guadalajara');
         INSERT INTO areas (area_uuid, locality_uuid, name) VALUES
            ('00000000-0000-4000-8000-00000000000a', '00000000-0000-4000-8000-000000000001', 'Almacen');",
    )
    .unwrap();

    // Same name under the other locality: fine.
    conn.execute(
        "INSERT INTO areas (area_uuid, locality_uuid, name) VALUES
            ('00000000-0000-4000-8000-00000000000b', '00000000-0000-4000-8000-000000000002', 'Almacen');",
        [],
    )
    .unwrap();

    // Case variation under the same locality: constraint violation.
    let err = conn
        .execute(
            "INSERT INTO areas (area_uuid, locality_uuid, name) VALUES
                ('00000000-0000-4000-8000-00000000000c', '00000000-0000-4000-8000-000000000001', 'ALMACEN');",
            [],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    ));
}

#[test]
fn areas_cannot_reference_missing_localities() {
    let conn = open_db_in_memory().unwrap();

    let err = conn
        .execute(
            "INSERT INTO areas (area_uuid, locality_uuid, name) VALUES
                ('00000000-0000-4000-8000-00000000000a', '00000000-0000-4000-8000-0000000000ff', 'Almacen');",
            [],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    ));
}
