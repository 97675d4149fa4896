//! Table-level CRUD access to an embedded SQLite database.
//!
//! # Intention
//!
//! - Read, write, update, delete and clear rows of a named table through
//!   validated requests, with every caller value bound as a parameter.
//! - Offer the same operations through loosely typed JSON descriptors
//!   ([`DescriptorExt`]).
//!
//! # Architectural Boundaries
//!
//! - One connection per [`TableAccessor`]; no pooling, no retries.
//! - Only the batch insert and the snapshot-then-delete run in a transaction.
//!
//! ```no_run
//! use serde_json::json;
//! use sqlite_table::{AccessorConfig, DescriptorExt, TableAccessor};
//!
//! # async fn demo() -> sqlite_table::Result<()> {
//! let db = TableAccessor::open(AccessorConfig::new("app", "./data")).await?;
//! db.write_table(&json!({"name": "users", "data": [{"id": "1", "name": "Ann"}]})).await?;
//! let rows = db
//!     .read_row_by_value(&json!({"name": "users", "where": {"key": "id", "value": "1"}}))
//!     .await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod ops;
pub mod query;
pub mod request;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use config::AccessorConfig;
pub use descriptor::DescriptorExt;
pub use error::{Result, TableError};
pub use request::{
    Clear, Column, CrudOperation, CrudOutcome, DeleteWhere, Filter, Insert, Page, ReadAll, ReadWhere,
    TableName, UpdateWhere,
};
pub use schema::{ColumnConstraint, ColumnDefinition, DataType, Schema, TableDefinition};
pub use sqlite::{TableAccessor, TableStore};
pub use value::{Row, Value};
