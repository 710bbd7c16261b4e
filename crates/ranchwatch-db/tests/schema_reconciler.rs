use std::collections::BTreeSet;

use ranchwatch_db::{
    ColumnDefault, ColumnDescriptor, ColumnOutcome, SchemaReconciler, Store, introspect_columns,
};
use rusqlite::Connection;

/// A `user` table as it looked before login support, with a few members.
fn legacy_user_table(conn: &Connection) {
    conn.execute_batch(
        r#"CREATE TABLE "user" (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL, phone VARCHAR(20));
           INSERT INTO "user" (name, phone) VALUES ('Ada', '555-0100');
           INSERT INTO "user" (name, phone) VALUES ('Bo', NULL);
           INSERT INTO "user" (name, phone) VALUES ('Cy', '555-0199');"#,
    )
    .unwrap();
}

fn column_set(conn: &Connection, relation: &str) -> BTreeSet<String> {
    introspect_columns(conn, relation)
        .unwrap()
        .into_iter()
        .collect()
}

fn rows(conn: &Connection) -> Vec<Vec<Option<String>>> {
    let columns = introspect_columns(conn, "user").unwrap();
    let sql = format!(
        r#"SELECT {} FROM "user" ORDER BY id"#,
        columns
            .iter()
            .map(|c| format!("CAST(\"{c}\" AS TEXT)"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let mut stmt = conn.prepare(&sql).unwrap();
    stmt.query_map([], |row| {
        (0..columns.len())
            .map(|i| row.get::<_, Option<String>>(i))
            .collect::<rusqlite::Result<Vec<_>>>()
    })
    .unwrap()
    .collect::<rusqlite::Result<Vec<_>>>()
    .unwrap()
}

fn login_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("email", "VARCHAR(120)"),
        ColumnDescriptor::new("is_admin", "BOOLEAN").default_value(ColumnDefault::Bool(false)),
    ]
}

#[test]
fn legacy_user_table_gains_login_columns() {
    let mut conn = Connection::open_in_memory().unwrap();
    legacy_user_table(&conn);

    let report = SchemaReconciler::new(&mut conn)
        .reconcile("user", &login_columns())
        .unwrap();

    assert_eq!(report.relation, "user");
    assert_eq!(report.columns.len(), 2);
    assert_eq!(report.columns[0].column, "email");
    assert_eq!(report.columns[0].outcome, ColumnOutcome::Added);
    assert_eq!(report.columns[1].column, "is_admin");
    assert_eq!(report.columns[1].outcome, ColumnOutcome::Added);

    assert_eq!(
        introspect_columns(&conn, "user").unwrap(),
        vec!["id", "name", "phone", "email", "is_admin"]
    );

    let not_admin: i64 = conn
        .query_row(
            r#"SELECT COUNT(*) FROM "user" WHERE is_admin = 0"#,
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(not_admin, 3);
}

#[test]
fn second_run_reports_everything_present_and_leaves_rows_alone() {
    let mut conn = Connection::open_in_memory().unwrap();
    legacy_user_table(&conn);

    SchemaReconciler::new(&mut conn)
        .reconcile("user", &login_columns())
        .unwrap();
    let before = rows(&conn);

    let report = SchemaReconciler::new(&mut conn)
        .reconcile("user", &login_columns())
        .unwrap();

    assert!(
        report
            .columns
            .iter()
            .all(|c| c.outcome == ColumnOutcome::AlreadyPresent)
    );
    assert_eq!(rows(&conn), before);
}

#[test]
fn backfill_only_touches_unset_values() {
    let mut conn = Connection::open_in_memory().unwrap();
    legacy_user_table(&conn);
    SchemaReconciler::new(&mut conn)
        .reconcile("user", &[ColumnDescriptor::new("role", "TEXT")])
        .unwrap();
    conn.execute(r#"UPDATE "user" SET role = 'foreman' WHERE name = 'Ada'"#, [])
        .unwrap();

    // A later release declares a default for a column that already exists:
    // nothing is rewritten.
    let report = SchemaReconciler::new(&mut conn)
        .reconcile(
            "user",
            &[ColumnDescriptor::new("role", "TEXT")
                .default_value(ColumnDefault::Text("hand".into()))],
        )
        .unwrap();
    assert_eq!(report.outcome("role"), Some(&ColumnOutcome::AlreadyPresent));

    let roles: Vec<Option<String>> = conn
        .prepare(r#"SELECT role FROM "user" ORDER BY id"#)
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<_>>()
        .unwrap();
    assert_eq!(roles, vec![Some("foreman".to_string()), None, None]);
}

#[test]
fn new_column_default_reaches_every_existing_row() {
    let mut conn = Connection::open_in_memory().unwrap();
    legacy_user_table(&conn);

    SchemaReconciler::new(&mut conn)
        .reconcile(
            "user",
            &[ColumnDescriptor::new("radius_miles", "FLOAT")
                .default_value(ColumnDefault::Real(5.0))
                .not_null()],
        )
        .unwrap();

    let radii: Vec<f64> = conn
        .prepare(r#"SELECT radius_miles FROM "user""#)
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<_>>()
        .unwrap();
    assert_eq!(radii, vec![5.0, 5.0, 5.0]);
}

#[test]
fn a_failing_column_does_not_block_its_neighbours() {
    let mut conn = Connection::open_in_memory().unwrap();
    legacy_user_table(&conn);

    let report = SchemaReconciler::new(&mut conn)
        .reconcile(
            "user",
            &[
                ColumnDescriptor::new("email", "VARCHAR(120)"),
                // SQLite cannot add a UNIQUE column to an existing table.
                ColumnDescriptor::new("badge", "TEXT UNIQUE"),
                ColumnDescriptor::new("last_login", "DATETIME"),
            ],
        )
        .unwrap();

    assert_eq!(report.columns[0].outcome, ColumnOutcome::Added);
    assert!(report.columns[1].outcome.is_failed());
    assert_eq!(report.columns[2].outcome, ColumnOutcome::Added);
    assert_eq!(report.failed_count(), 1);
    assert!(!report.is_clean());

    let columns = column_set(&conn, "user");
    assert!(columns.contains("email"));
    assert!(columns.contains("last_login"));
    assert!(!columns.contains("badge"));
}

#[test]
fn reconciler_never_removes_columns_or_rows() {
    let mut conn = Connection::open_in_memory().unwrap();
    legacy_user_table(&conn);

    // Expecting fewer columns than exist is not a reason to drop any.
    let report = SchemaReconciler::new(&mut conn)
        .reconcile("user", &[ColumnDescriptor::new("name", "VARCHAR(100)")])
        .unwrap();
    assert_eq!(report.outcome("name"), Some(&ColumnOutcome::AlreadyPresent));

    assert_eq!(
        column_set(&conn, "user"),
        BTreeSet::from(["id", "name", "phone"].map(String::from))
    );
    let count: i64 = conn
        .query_row(r#"SELECT COUNT(*) FROM "user""#, [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

#[test]
fn split_runs_converge_on_the_same_columns() {
    let c1 = ColumnDescriptor::new("email", "VARCHAR(120)");
    let c2 = ColumnDescriptor::new("is_admin", "BOOLEAN").default_value(ColumnDefault::Bool(false));
    let c3 = ColumnDescriptor::new("last_login", "DATETIME");

    let mut split = Connection::open_in_memory().unwrap();
    legacy_user_table(&split);
    SchemaReconciler::new(&mut split)
        .reconcile("user", &[c1.clone(), c2.clone()])
        .unwrap();
    let report = SchemaReconciler::new(&mut split)
        .reconcile("user", &[c2.clone(), c3.clone()])
        .unwrap();
    assert_eq!(report.outcome("is_admin"), Some(&ColumnOutcome::AlreadyPresent));
    assert_eq!(report.outcome("last_login"), Some(&ColumnOutcome::Added));

    let mut single = Connection::open_in_memory().unwrap();
    legacy_user_table(&single);
    SchemaReconciler::new(&mut single)
        .reconcile("user", &[c1, c2, c3])
        .unwrap();

    assert_eq!(column_set(&split, "user"), column_set(&single, "user"));
}

#[test]
fn store_upgrades_a_legacy_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fire_alerts.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"CREATE TABLE ranch (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL,
                   latitude FLOAT NOT NULL, longitude FLOAT NOT NULL, radius_miles FLOAT);
               INSERT INTO ranch (name, latitude, longitude) VALUES ('Home Ranch', 31.9, -110.0);
               CREATE TABLE "user" (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL,
                   phone VARCHAR(20), ranch_id INTEGER);
               INSERT INTO "user" (name, phone, ranch_id) VALUES ('Ada', '555-0100', 1);"#,
        )
        .unwrap();
    }

    let store = Store::open_existing(&path).unwrap();
    let user_report = store
        .schema_reports()
        .iter()
        .find(|r| r.relation == "user")
        .unwrap();
    assert!(user_report.is_clean());
    assert_eq!(user_report.added_count(), 6);

    // Existing ranches are kept and no samples are added on top.
    let ranches = store.list_ranches().unwrap();
    assert_eq!(ranches.len(), 1);
    assert_eq!(ranches[0].name, "Home Ranch");

    let users = store.list_users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Ada");
    assert!(users[0].email.is_none());
    drop(store);

    // Reopening is a no-op.
    let store = Store::open(&path).unwrap();
    for report in store.schema_reports() {
        assert!(
            report
                .columns
                .iter()
                .all(|c| c.outcome == ColumnOutcome::AlreadyPresent),
            "{report:?}"
        );
    }
}

#[test]
fn created_at_backfill_uses_sqlite_datetime_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fire_alerts.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"CREATE TABLE "user" (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL,
                   phone VARCHAR(20), ranch_id INTEGER);
               INSERT INTO "user" (name) VALUES ('Ada');"#,
        )
        .unwrap();
    }

    drop(Store::open(&path).unwrap());

    let conn = Connection::open(&path).unwrap();
    let created_at: String = conn
        .query_row(r#"SELECT created_at FROM "user""#, [], |row| row.get(0))
        .unwrap();
    assert!(
        chrono::NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S").is_ok(),
        "{created_at}"
    );
}
