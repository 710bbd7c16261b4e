use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use ranchwatch_common::{Error, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::{info, warn};

use crate::reconciler::{ReconciliationReport, SchemaReconciler, introspect_columns};
use crate::schema::{BASE_TABLES, DEFAULT_RANCHES, data_model};

/// Application database. Opening it brings the schema up to date before any
/// other query can run.
pub struct Store {
    conn: Mutex<Connection>,
    reports: Vec<ReconciliationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RanchRecord {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A registered user as shown by the migrate command.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Store {
    /// Open (creating if needed) the database at `db_path` and reconcile it.
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening database at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;
        Self::initialize(conn)
    }

    /// Like [`Store::open`], but refuses to create a new database file.
    pub fn open_existing(db_path: &Path) -> Result<Self> {
        if !db_path.is_file() {
            return Err(Error::NotFound(format!(
                "database file {}",
                db_path.display()
            )));
        }
        Self::open(db_path)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;
        Self::initialize(conn)
    }

    fn initialize(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        ensure_base_schema(&conn)?;
        let reports = SchemaReconciler::new(&mut conn).reconcile_all(&data_model())?;
        for report in &reports {
            if report.is_clean() {
                info!(
                    "schema {} reconciled: {} column(s) added",
                    report.relation,
                    report.added_count()
                );
            } else {
                warn!(
                    "schema {} reconciled with {} failed column(s)",
                    report.relation,
                    report.failed_count()
                );
            }
        }
        seed_default_ranches(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            reports,
        })
    }

    /// Reports from the reconciliation run performed when the store opened.
    pub fn schema_reports(&self) -> &[ReconciliationReport] {
        &self.reports
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("store lock poisoned".into()))
    }

    /// Cheap liveness query.
    pub fn ping(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| Error::Database(format!("ping failed: {e}")))?;
        Ok(())
    }

    pub fn column_names(&self, relation: &str) -> Result<Vec<String>> {
        let conn = self.connection()?;
        introspect_columns(&conn, relation)
    }

    pub fn list_ranches(&self) -> Result<Vec<RanchRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT id, name, latitude, longitude FROM ranch ORDER BY id")
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RanchRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    latitude: row.get(2)?,
                    longitude: row.get(3)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to query ranches: {e}")))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(format!("failed to read ranch row: {e}")))
    }

    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(r#"SELECT id, name, phone, email FROM "user" ORDER BY id"#)
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(UserSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    email: row.get(3)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to query users: {e}")))?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row.map_err(|e| Error::Database(format!("failed to read user row: {e}")))?);
        }
        Ok(users)
    }
}

/// Create every base table that does not exist yet.
pub fn ensure_base_schema(conn: &Connection) -> Result<()> {
    for table in BASE_TABLES {
        conn.execute_batch(table.sql)
            .map_err(|e| Error::Database(format!("failed to create table {}: {e}", table.name)))?;
    }
    Ok(())
}

/// Insert the sample ranches when the `ranch` table is empty. Returns the
/// number of rows inserted.
pub fn seed_default_ranches(conn: &Connection) -> Result<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM ranch", [], |row| row.get(0))
        .map_err(|e| Error::Database(format!("failed to count ranches: {e}")))?;
    if count > 0 {
        return Ok(0);
    }

    for (name, latitude, longitude, radius) in DEFAULT_RANCHES {
        conn.execute(
            "INSERT INTO ranch (name, latitude, longitude, radius_miles) VALUES (?1, ?2, ?3, ?4)",
            params![name, latitude, longitude, radius],
        )
        .map_err(|e| Error::Database(format!("failed to seed ranch {name}: {e}")))?;
    }
    info!("created {} sample ranches", DEFAULT_RANCHES.len());
    Ok(DEFAULT_RANCHES.len())
}
