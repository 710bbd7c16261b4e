use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use ranchwatch_config::AppConfig;
use ranchwatch_db::{ReconciliationReport, Store, UserSummary};
use tracing::warn;

/// Reconcile the configured database file and print the outcome. Unlike
/// `start`, this never creates a database.
pub fn run(config: &AppConfig) -> Result<()> {
    let db_path = config.database_path();
    println!("Migrating {}", db_path.display());

    let store = Store::open_existing(&db_path).with_context(|| {
        format!(
            "cannot migrate {}; run `ranchwatch start` once to create it",
            db_path.display()
        )
    })?;

    print!("{}", format_reports(store.schema_reports()));

    let columns = store.column_names("user")?;
    println!("user columns: {}", columns.join(", "));

    match store.list_users() {
        Ok(users) => print!("{}", format_users(&users)),
        Err(e) => warn!("could not list users: {e}"),
    }

    let failed: usize = store
        .schema_reports()
        .iter()
        .map(ReconciliationReport::failed_count)
        .sum();
    if failed > 0 {
        bail!("{failed} column(s) could not be added");
    }
    println!("Migration completed.");
    Ok(())
}

fn format_reports(reports: &[ReconciliationReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "{}:", report.relation);
        for column in &report.columns {
            let _ = writeln!(out, "  {:<16} {}", column.column, column.outcome);
        }
    }
    out
}

fn format_users(users: &[UserSummary]) -> String {
    if users.is_empty() {
        return "No existing users\n".to_string();
    }
    let mut out = format!("Existing users ({}):\n", users.len());
    for user in users {
        let _ = writeln!(
            out,
            "  - ID: {}, Name: {}, Phone: {}, Email: {}",
            user.id,
            user.name,
            user.phone.as_deref().unwrap_or("None"),
            user.email.as_deref().unwrap_or("None"),
        );
    }
    out
}
