//! Typed CRUD requests.
//!
//! Every request is validated when it is built, so a request value that
//! exists can always be handed to the engine.

use crate::error::{Result, TableError};
use crate::value::{Row, Value};

/// Non-empty table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TableError::validation("table", "table name must be a non-empty string"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column(String);

impl Column {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TableError::validation("column", "column name must be a non-empty string"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Equality conditions joined with `AND`. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub(crate) conditions: Vec<(Column, Value)>,
}

impl Filter {
    /// Match rows where `column` equals `value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Ok(Self {
            conditions: vec![(Column::new(column)?, value.into())],
        })
    }

    /// Add another equality condition.
    pub fn and(mut self, column: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        self.conditions.push((Column::new(column)?, value.into()));
        Ok(self)
    }

    pub fn conditions(&self) -> &[(Column, Value)] {
        &self.conditions
    }
}

/// LIMIT/OFFSET window. An offset is only meaningful together with a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: Option<i64>,
}

impl Page {
    pub fn limit(limit: i64) -> Self {
        Self { limit, offset: None }
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        // OFFSET 0 is the same as no offset.
        self.offset = (offset != 0).then_some(offset);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadAll {
    pub(crate) table: TableName,
    pub(crate) page: Option<Page>,
}

impl ReadAll {
    pub fn new(table: TableName) -> Self {
        Self { table, page: None }
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadWhere {
    pub(crate) table: TableName,
    pub(crate) filter: Filter,
    pub(crate) page: Option<Page>,
}

impl ReadWhere {
    pub fn new(table: TableName, filter: Filter) -> Self {
        Self {
            table,
            filter,
            page: None,
        }
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

/// Rows to insert, one statement per row, all inside one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub(crate) table: TableName,
    pub(crate) rows: Vec<Vec<(Column, Value)>>,
}

impl Insert {
    pub fn new(table: TableName) -> Self {
        Self {
            table,
            rows: Vec::new(),
        }
    }

    /// Append a row given as `(column, value)` pairs.
    pub fn with_row<I, K, V>(mut self, row: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let row = row
            .into_iter()
            .map(|(k, v)| Ok((Column::new(k)?, v.into())))
            .collect::<Result<Vec<_>>>()?;
        self.rows.push(row);
        Ok(self)
    }

    /// Append a row from a result-style map.
    pub fn with_map(self, row: Row) -> Result<Self> {
        self.with_row(row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateWhere {
    pub(crate) table: TableName,
    pub(crate) filter: Filter,
    pub(crate) set: Vec<(Column, Value)>,
}

impl UpdateWhere {
    /// Build an update; at least one column must be assigned.
    pub fn new<I, K, V>(table: TableName, filter: Filter, set: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let set = set
            .into_iter()
            .map(|(k, v)| Ok((Column::new(k)?, v.into())))
            .collect::<Result<Vec<_>>>()?;
        if set.is_empty() {
            return Err(TableError::validation("update_where", "no columns to set"));
        }
        Ok(Self { table, filter, set })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteWhere {
    pub(crate) table: TableName,
    pub(crate) filter: Filter,
}

impl DeleteWhere {
    pub fn new(table: TableName, filter: Filter) -> Self {
        Self { table, filter }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clear {
    pub(crate) table: TableName,
}

impl Clear {
    pub fn new(table: TableName) -> Self {
        Self { table }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrudOperation {
    ReadAll(ReadAll),
    ReadWhere(ReadWhere),
    Insert(Insert),
    UpdateWhere(UpdateWhere),
    DeleteWhere(DeleteWhere),
    Clear(Clear),
}

impl CrudOperation {
    pub fn table(&self) -> &TableName {
        match self {
            CrudOperation::ReadAll(op) => &op.table,
            CrudOperation::ReadWhere(op) => &op.table,
            CrudOperation::Insert(op) => &op.table,
            CrudOperation::UpdateWhere(op) => &op.table,
            CrudOperation::DeleteWhere(op) => &op.table,
            CrudOperation::Clear(op) => &op.table,
        }
    }
}

/// What a [`CrudOperation`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudOutcome {
    /// Selected rows, or the pre-deletion snapshot for deletes.
    Rows(Vec<Row>),
    /// Number of rows written.
    Affected(usize),
}
