pub mod migrations;
pub mod reconciler;
pub mod schema;
pub mod store;

pub use migrations::{ColumnDefault, ColumnDescriptor, MigrationStep, RelationSpec, StepError};
pub use reconciler::{
    ColumnOutcome, ColumnReport, ReconciliationReport, SchemaReconciler, introspect_columns,
};
pub use store::{RanchRecord, Store, UserSummary};
