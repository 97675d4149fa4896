//! Optional table definitions applied when a database is opened.

use crate::error::Result;
use crate::query::quote_ident;
use rusqlite::Connection;
use serde::Deserialize;

/// Schema definition for the SQLite database
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    fn create_statement(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDefinition::to_sql).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.name),
            columns.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// `None` declares the column without a type (no affinity).
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            constraints: Vec::new(),
        }
    }

    pub fn typed(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn constraint(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = quote_ident(&self.name);
        if let Some(data_type) = self.data_type {
            sql.push(' ');
            sql.push_str(data_type.as_sql());
        }
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.as_sql());
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Text,
    Real,
    Blob,
}

impl DataType {
    fn as_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
            DataType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
    Unique,
}

impl ColumnConstraint {
    fn as_sql(self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::NotNull => "NOT NULL",
            ColumnConstraint::Unique => "UNIQUE",
        }
    }
}

/// Create every table of `schema` that does not exist yet.
pub fn initialize_schema(conn: &Connection, schema: &Schema) -> Result<()> {
    for table in &schema.tables {
        let sql = table.create_statement();
        tracing::debug!(table = %table.name, "ensuring table");
        conn.execute(&sql, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableDefinition {
        TableDefinition::new("users")
            .column(
                ColumnDefinition::new("id")
                    .typed(DataType::Text)
                    .constraint(ColumnConstraint::PrimaryKey),
            )
            .column(ColumnDefinition::new("name"))
    }

    #[test]
    fn renders_create_statement() {
        assert_eq!(
            users().create_statement(),
            "CREATE TABLE IF NOT EXISTS \"users\" (\"id\" TEXT PRIMARY KEY, \"name\")"
        );
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = Schema::new().add_table(users());
        initialize_schema(&conn, &schema).unwrap();
        initialize_schema(&conn, &schema).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn deserializes_from_json() {
        let schema: Schema = serde_json::from_value(serde_json::json!({
            "tables": [{
                "name": "users",
                "columns": [
                    {"name": "id", "data_type": "text", "constraints": ["primary_key"]},
                    {"name": "name"}
                ]
            }]
        }))
        .unwrap();
        assert_eq!(schema, Schema::new().add_table(users()));
    }
}
