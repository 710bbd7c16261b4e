//! The application data model.
//!
//! Base tables are created in their first-deployment shape. Every column added
//! since then is declared in [`data_model`] and brought in by the reconciler,
//! so fresh and upgraded databases converge on the same schema.

use crate::migrations::{ColumnDefault, ColumnDescriptor, RelationSpec};

/// Highest `since` version used in [`data_model`].
pub const SCHEMA_VERSION: u32 = 3;

/// A table created if absent before reconciliation runs.
pub struct BaseTable {
    pub name: &'static str,
    pub sql: &'static str,
}

pub const BASE_TABLES: &[BaseTable] = &[
    BaseTable {
        name: "ranch",
        sql: "CREATE TABLE IF NOT EXISTS ranch (
            id INTEGER PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            latitude FLOAT NOT NULL,
            longitude FLOAT NOT NULL,
            radius_miles FLOAT DEFAULT 5.0
        )",
    },
    BaseTable {
        name: "user",
        sql: r#"CREATE TABLE IF NOT EXISTS "user" (
            id INTEGER PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            phone VARCHAR(20),
            ranch_id INTEGER REFERENCES ranch(id)
        )"#,
    },
    BaseTable {
        name: "fire_alert",
        sql: r#"CREATE TABLE IF NOT EXISTS fire_alert (
            id INTEGER PRIMARY KEY,
            title VARCHAR(200) NOT NULL,
            message TEXT NOT NULL,
            ranch_id INTEGER NOT NULL REFERENCES ranch(id),
            severity VARCHAR(20) DEFAULT 'medium',
            status VARCHAR(20) DEFAULT 'active',
            latitude FLOAT,
            longitude FLOAT,
            created_by INTEGER NOT NULL REFERENCES "user"(id),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )"#,
    },
    BaseTable {
        name: "livestock_request",
        sql: r#"CREATE TABLE IF NOT EXISTS livestock_request (
            id INTEGER PRIMARY KEY,
            fire_alert_id INTEGER NOT NULL REFERENCES fire_alert(id),
            requester_id INTEGER NOT NULL REFERENCES "user"(id),
            animal_type VARCHAR(50) NOT NULL,
            animal_count INTEGER NOT NULL,
            pickup_location VARCHAR(200) NOT NULL,
            contact_info VARCHAR(200) NOT NULL,
            status VARCHAR(20) DEFAULT 'open',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )"#,
    },
];

/// Columns each relation must carry for the current release.
pub fn data_model() -> Vec<RelationSpec> {
    vec![
        RelationSpec::new(
            "user",
            vec![
                ColumnDescriptor::new("fcm_token", "VARCHAR(500)").since(2),
                ColumnDescriptor::new("email", "VARCHAR(120)").since(3),
                ColumnDescriptor::new("password_hash", "VARCHAR(128)").since(3),
                ColumnDescriptor::new("last_login", "DATETIME").since(3),
                ColumnDescriptor::new("is_admin", "BOOLEAN")
                    .default_value(ColumnDefault::Bool(false))
                    .not_null()
                    .since(3),
                ColumnDescriptor::new("created_at", "DATETIME")
                    .default_value(ColumnDefault::CurrentTimestamp)
                    .not_null()
                    .since(3),
            ],
        ),
        RelationSpec::new(
            "fire_alert",
            vec![
                ColumnDescriptor::new("updated_at", "DATETIME")
                    .default_value(ColumnDefault::CurrentTimestamp)
                    .since(2),
            ],
        ),
        RelationSpec::new(
            "livestock_request",
            vec![ColumnDescriptor::new("notes", "TEXT").since(2)],
        ),
    ]
}

/// Sample ranches inserted into an empty `ranch` table:
/// (name, latitude, longitude, radius in miles).
pub const DEFAULT_RANCHES: &[(&str, f64, f64, f64)] = &[
    ("Dragoon Mountain Ranch", 34.0522, -118.2437, 10.0),
    ("Mountain View Ranch", 34.1522, -118.3437, 8.0),
    ("Desert Springs Ranch", 33.9522, -118.1437, 12.0),
];
