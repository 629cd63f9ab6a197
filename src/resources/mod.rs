pub mod registry;
pub mod schema;

pub use registry::{by_table, exposed, resource};
pub use schema::{ColumnDef, ColumnType, DefaultValue, Relation, RelationKind, ResourceSchema, SYSTEM_COLUMNS};
