//! Declarative column migrations.
//!
//! A [`ColumnDescriptor`] says what a column should look like. When the column
//! is missing from a relation, [`plan_column`] turns it into an ordered list of
//! [`MigrationStep`]s that the reconciler applies inside one transaction.

use rusqlite::Connection;
use rusqlite::types::Value;
use serde::Serialize;
use thiserror::Error;

/// Format used for timestamp backfills; matches SQLite's `datetime('now')`.
pub const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value written into rows that predate a newly added column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColumnDefault {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    /// Time of the reconciliation run. SQLite refuses non-constant defaults
    /// on `ADD COLUMN`, so this only drives the backfill.
    CurrentTimestamp,
}

impl ColumnDefault {
    /// Constant SQL literal usable in a `DEFAULT` clause.
    fn sql_literal(&self) -> Option<String> {
        match self {
            Self::Null | Self::CurrentTimestamp => None,
            Self::Integer(v) => Some(v.to_string()),
            Self::Real(v) => Some(format!("{v:?}")),
            Self::Text(v) => Some(format!("'{}'", v.replace('\'', "''"))),
            Self::Bool(v) => Some(if *v { "1" } else { "0" }.to_string()),
        }
    }

    fn backfill_value(&self, now: &str) -> Option<Value> {
        match self {
            Self::Null => None,
            Self::Integer(v) => Some(Value::Integer(*v)),
            Self::Real(v) => Some(Value::Real(*v)),
            Self::Text(v) => Some(Value::Text(v.clone())),
            Self::Bool(v) => Some(Value::Integer(i64::from(*v))),
            Self::CurrentTimestamp => Some(Value::Text(now.to_string())),
        }
    }
}

/// Expected shape of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: ColumnDefault,
    /// Schema version that introduced the column.
    pub since: u32,
}

impl ColumnDescriptor {
    /// A nullable column with no default.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            default: ColumnDefault::Null,
            since: 1,
        }
    }

    pub fn default_value(mut self, default: ColumnDefault) -> Self {
        self.default = default;
        self
    }

    /// Every row must carry a value once the column has been added.
    /// The column is still added as nullable; the requirement is checked
    /// after the backfill.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn since(mut self, version: u32) -> Self {
        self.since = version;
        self
    }

    /// Column definition for `ALTER TABLE ... ADD COLUMN`.
    pub fn add_column_definition(&self) -> String {
        let mut def = format!("{} {}", quote_ident(&self.name), self.sql_type);
        if let Some(literal) = self.default.sql_literal() {
            def.push_str(" DEFAULT ");
            def.push_str(&literal);
        }
        def
    }
}

/// Expected columns for one relation.
#[derive(Debug, Clone)]
pub struct RelationSpec {
    pub relation: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl RelationSpec {
    pub fn new(relation: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            relation: relation.into(),
            columns,
        }
    }
}

/// Why a single column could not be brought up to date.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("add column failed: {0}")]
    AddColumn(rusqlite::Error),

    #[error("backfill failed: {0}")]
    Backfill(rusqlite::Error),

    #[error("{0} row(s) left without a value in a non-nullable column")]
    NullsRemain(i64),

    #[error("transaction failed: {0}")]
    Transaction(rusqlite::Error),
}

/// One unit of schema work.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStep {
    AddColumn {
        relation: String,
        column: ColumnDescriptor,
    },
    /// Set `column` to `value` on every row where it is NULL.
    Backfill {
        relation: String,
        column: String,
        value: Value,
    },
    /// Fail the step if any row still has NULL in `column`.
    VerifyNotNull { relation: String, column: String },
}

impl MigrationStep {
    pub fn sql(&self) -> String {
        match self {
            Self::AddColumn { relation, column } => format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_ident(relation),
                column.add_column_definition()
            ),
            Self::Backfill {
                relation, column, ..
            } => {
                let col = quote_ident(column);
                format!(
                    "UPDATE {} SET {col} = ?1 WHERE {col} IS NULL",
                    quote_ident(relation)
                )
            }
            Self::VerifyNotNull { relation, column } => format!(
                "SELECT COUNT(*) FROM {} WHERE {} IS NULL",
                quote_ident(relation),
                quote_ident(column)
            ),
        }
    }

    pub fn apply(&self, conn: &Connection) -> Result<(), StepError> {
        let sql = self.sql();
        match self {
            Self::AddColumn { .. } => {
                conn.execute_batch(&sql).map_err(StepError::AddColumn)?;
            }
            Self::Backfill { value, .. } => {
                conn.execute(&sql, [value]).map_err(StepError::Backfill)?;
            }
            Self::VerifyNotNull { .. } => {
                let nulls: i64 = conn
                    .query_row(&sql, [], |row| row.get(0))
                    .map_err(StepError::Backfill)?;
                if nulls > 0 {
                    return Err(StepError::NullsRemain(nulls));
                }
            }
        }
        Ok(())
    }
}

/// Steps that add `column` to `relation` and backfill existing rows.
/// `now` is the run timestamp used by [`ColumnDefault::CurrentTimestamp`].
pub fn plan_column(relation: &str, column: &ColumnDescriptor, now: &str) -> Vec<MigrationStep> {
    let mut steps = vec![MigrationStep::AddColumn {
        relation: relation.to_string(),
        column: column.clone(),
    }];
    if let Some(value) = column.default.backfill_value(now) {
        steps.push(MigrationStep::Backfill {
            relation: relation.to_string(),
            column: column.name.clone(),
            value,
        });
    }
    if !column.nullable {
        steps.push(MigrationStep::VerifyNotNull {
            relation: relation.to_string(),
            column: column.name.clone(),
        });
    }
    steps
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
