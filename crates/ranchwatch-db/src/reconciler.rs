use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use ranchwatch_common::{Error, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::{info, warn};

use crate::migrations::{
    ColumnDescriptor, MigrationStep, RelationSpec, SQLITE_DATETIME_FORMAT, StepError, plan_column,
};

/// Result of bringing one column up to date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ColumnOutcome {
    AlreadyPresent,
    Added,
    Failed { reason: String },
}

impl ColumnOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for ColumnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPresent => f.write_str("already-present"),
            Self::Added => f.write_str("added"),
            Self::Failed { reason } => write!(f, "failed({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnReport {
    pub column: String,
    #[serde(flatten)]
    pub outcome: ColumnOutcome,
}

/// Per-column outcomes of one reconciliation run, in the order the columns
/// were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub relation: String,
    pub columns: Vec<ColumnReport>,
}

impl ReconciliationReport {
    pub fn outcome(&self, column: &str) -> Option<&ColumnOutcome> {
        self.columns
            .iter()
            .find(|c| c.column.eq_ignore_ascii_case(column))
            .map(|c| &c.outcome)
    }

    pub fn added_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.outcome == ColumnOutcome::Added)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.columns.iter().filter(|c| c.outcome.is_failed()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Adds missing columns to existing relations at startup.
///
/// Holds the connection exclusively for the whole run. Each column is handled
/// in its own transaction: a failure rolls back that column only and the run
/// moves on to the next one.
pub struct SchemaReconciler<'c> {
    conn: &'c mut Connection,
    now: String,
}

impl<'c> SchemaReconciler<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        Self {
            conn,
            now: Utc::now().format(SQLITE_DATETIME_FORMAT).to_string(),
        }
    }

    /// Ensure every column in `expected` exists on `relation`.
    ///
    /// Fails only when the relation cannot be inspected, in which case nothing
    /// has been applied. Per-column failures are reported, not returned.
    pub fn reconcile(
        &mut self,
        relation: &str,
        expected: &[ColumnDescriptor],
    ) -> Result<ReconciliationReport> {
        let mut present: HashSet<String> = introspect_columns(self.conn, relation)?
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();

        let mut columns = Vec::with_capacity(expected.len());
        for column in expected {
            let key = column.name.to_ascii_lowercase();
            let outcome = if present.contains(&key) {
                info!("schema {relation}.{}: already present", column.name);
                ColumnOutcome::AlreadyPresent
            } else {
                let steps = plan_column(relation, column, &self.now);
                match self.apply_steps(&steps) {
                    Ok(()) => {
                        info!(
                            "schema {relation}.{}: added {} (v{})",
                            column.name, column.sql_type, column.since
                        );
                        present.insert(key);
                        ColumnOutcome::Added
                    }
                    Err(e) => {
                        warn!("schema {relation}.{}: failed: {e}", column.name);
                        ColumnOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            };
            columns.push(ColumnReport {
                column: column.name.clone(),
                outcome,
            });
        }

        Ok(ReconciliationReport {
            relation: relation.to_string(),
            columns,
        })
    }

    /// Reconcile every relation of a data model, in order. Stops at the first
    /// relation that cannot be inspected.
    pub fn reconcile_all(&mut self, specs: &[RelationSpec]) -> Result<Vec<ReconciliationReport>> {
        specs
            .iter()
            .map(|spec| self.reconcile(&spec.relation, &spec.columns))
            .collect()
    }

    fn apply_steps(&mut self, steps: &[MigrationStep]) -> std::result::Result<(), StepError> {
        let tx = self.conn.transaction().map_err(StepError::Transaction)?;
        for step in steps {
            step.apply(&tx)?;
        }
        tx.commit().map_err(StepError::Transaction)
    }
}

/// Column names currently present on `relation`, in table order.
pub fn introspect_columns(conn: &Connection, relation: &str) -> Result<Vec<String>> {
    let exists: bool = conn
        .query_row(
            "SELECT count(*) > 0 FROM sqlite_master
             WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            params![relation],
            |row| row.get(0),
        )
        .map_err(|e| Error::introspection(relation, e))?;
    if !exists {
        return Err(Error::introspection(relation, "relation does not exist"));
    }

    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(|e| Error::introspection(relation, e))?;
    let names = stmt
        .query_map(params![relation], |row| row.get::<_, String>(0))
        .map_err(|e| Error::introspection(relation, e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::introspection(relation, e))?;
    Ok(names)
}
