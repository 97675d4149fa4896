//! Loosely typed descriptor API.
//!
//! Callers describe an operation with a JSON object such as
//! `{"name": "users", "where": {"id": "1"}, "limit": 10}`. Each descriptor is
//! checked and turned into a typed request before anything touches the
//! database; the first failed check ends the call with
//! [`TableError::Validation`].
//!
//! Filters come in two shapes:
//! - by object: `"where": {"column": value, ...}`; only the first entry (in
//!   insertion order) is used.
//! - by value: `"where": {"key": "column", "value": value}`.

use crate::error::{Result, TableError};
use crate::request::{Clear, DeleteWhere, Filter, Insert, Page, ReadAll, ReadWhere, TableName, UpdateWhere};
use crate::sqlite::TableStore;
use crate::value::{Row, Value};
use async_trait::async_trait;
use serde_json::{Map, Value as Json};

/// Descriptor-driven operations, available on every [`TableStore`].
#[async_trait]
pub trait DescriptorExt: TableStore {
    /// All rows, honoring `limit`/`offset`.
    async fn read_full_table(&self, descriptor: &Json) -> Result<Vec<Row>> {
        self.read_all(parse::read_full_table(descriptor)?).await
    }

    /// Rows matching the first entry of `where`, honoring `limit`/`offset`.
    async fn read_row_by_object(&self, descriptor: &Json) -> Result<Vec<Row>> {
        self.read_where(parse::read_row_by_object(descriptor)?).await
    }

    /// Rows where `where.key` equals `where.value`.
    async fn read_row_by_value(&self, descriptor: &Json) -> Result<Vec<Row>> {
        self.read_where(parse::read_row_by_value(descriptor)?).await
    }

    /// Insert one row per object in `data`. Returns the number inserted.
    async fn write_table(&self, descriptor: &Json) -> Result<usize> {
        self.insert(parse::write_table(descriptor)?).await
    }

    /// Set every column of the `data` object on rows matched by `where`.
    async fn update_table_by_object(&self, descriptor: &Json) -> Result<usize> {
        self.update_where(parse::update_table_by_object(descriptor)?).await
    }

    /// Set each `{key, value}` of `data` on rows matched by `where.key/value`.
    async fn update_table_by_value(&self, descriptor: &Json) -> Result<usize> {
        self.update_where(parse::update_table_by_value(descriptor)?).await
    }

    /// Delete rows matched by the first entry of `where`; returns them.
    async fn delete_row_by_object(&self, descriptor: &Json) -> Result<Vec<Row>> {
        self.delete_where(parse::delete_row_by_object(descriptor)?).await
    }

    /// Delete rows matched by `where.key/value`; returns them.
    async fn delete_row_by_value(&self, descriptor: &Json) -> Result<Vec<Row>> {
        self.delete_where(parse::delete_row_by_value(descriptor)?).await
    }

    async fn clear_full_table(&self, descriptor: &Json) -> Result<usize> {
        self.clear(parse::clear_full_table(descriptor)?).await
    }
}

impl<T: TableStore> DescriptorExt for T {}

/// Descriptor to request conversion.
pub mod parse {
    use super::*;

    pub fn read_full_table(descriptor: &Json) -> Result<ReadAll> {
        const OP: &str = "read_full_table";
        let obj = object(OP, descriptor)?;
        let mut req = ReadAll::new(table_name(OP, obj)?);
        if let Some(page) = page(OP, obj)? {
            req = req.with_page(page);
        }
        Ok(req)
    }

    pub fn read_row_by_object(descriptor: &Json) -> Result<ReadWhere> {
        const OP: &str = "read_row_by_object";
        let obj = object(OP, descriptor)?;
        let mut req = ReadWhere::new(table_name(OP, obj)?, first_entry_filter(OP, obj)?);
        if let Some(page) = page(OP, obj)? {
            req = req.with_page(page);
        }
        Ok(req)
    }

    pub fn read_row_by_value(descriptor: &Json) -> Result<ReadWhere> {
        const OP: &str = "read_row_by_value";
        let obj = object(OP, descriptor)?;
        Ok(ReadWhere::new(table_name(OP, obj)?, key_value_filter(OP, obj)?))
    }

    pub fn write_table(descriptor: &Json) -> Result<Insert> {
        const OP: &str = "write_table";
        let obj = object(OP, descriptor)?;
        let mut req = Insert::new(table_name(OP, obj)?);
        let data = obj
            .get("data")
            .and_then(Json::as_array)
            .ok_or_else(|| TableError::validation(OP, "`data` must be an array"))?;
        for item in data {
            // Anything that is not an object is not a row.
            let Some(row) = item.as_object() else {
                continue;
            };
            req = req
                .with_row(row.iter().map(|(k, v)| (k.clone(), Value::from_json(v))))
                .map_err(|e| relabel(OP, e))?;
        }
        Ok(req)
    }

    pub fn update_table_by_object(descriptor: &Json) -> Result<UpdateWhere> {
        const OP: &str = "update_table_by_object";
        let obj = object(OP, descriptor)?;
        let table = table_name(OP, obj)?;
        let filter = first_entry_filter(OP, obj)?;
        let data = obj
            .get("data")
            .and_then(Json::as_object)
            .ok_or_else(|| TableError::validation(OP, "`data` must be an object"))?;
        UpdateWhere::new(
            table,
            filter,
            data.iter().map(|(k, v)| (k.clone(), Value::from_json(v))),
        )
        .map_err(|e| relabel(OP, e))
    }

    pub fn update_table_by_value(descriptor: &Json) -> Result<UpdateWhere> {
        const OP: &str = "update_table_by_value";
        let obj = object(OP, descriptor)?;
        let table = table_name(OP, obj)?;
        let filter = key_value_filter(OP, obj)?;
        let data = obj
            .get("data")
            .and_then(Json::as_array)
            .ok_or_else(|| TableError::validation(OP, "`data` must be an array"))?;
        let set: Vec<(String, Value)> = data
            .iter()
            .filter_map(Json::as_object)
            .filter_map(|entry| {
                let key = entry.get("key")?.as_str().filter(|k| !k.is_empty())?;
                let value = entry.get("value")?;
                Some((key.to_string(), Value::from_json(value)))
            })
            .collect();
        if set.is_empty() {
            return Err(TableError::validation(OP, "`data` has no valid {key, value} entries"));
        }
        UpdateWhere::new(table, filter, set).map_err(|e| relabel(OP, e))
    }

    pub fn delete_row_by_object(descriptor: &Json) -> Result<DeleteWhere> {
        const OP: &str = "delete_row_by_object";
        let obj = object(OP, descriptor)?;
        Ok(DeleteWhere::new(table_name(OP, obj)?, first_entry_filter(OP, obj)?))
    }

    pub fn delete_row_by_value(descriptor: &Json) -> Result<DeleteWhere> {
        const OP: &str = "delete_row_by_value";
        let obj = object(OP, descriptor)?;
        Ok(DeleteWhere::new(table_name(OP, obj)?, key_value_filter(OP, obj)?))
    }

    pub fn clear_full_table(descriptor: &Json) -> Result<Clear> {
        const OP: &str = "clear_full_table";
        let obj = object(OP, descriptor)?;
        Ok(Clear::new(table_name(OP, obj)?))
    }

    fn object<'a>(op: &'static str, descriptor: &'a Json) -> Result<&'a Map<String, Json>> {
        descriptor
            .as_object()
            .ok_or_else(|| TableError::validation(op, "descriptor must be an object"))
    }

    fn table_name(op: &'static str, obj: &Map<String, Json>) -> Result<TableName> {
        let name = obj
            .get("name")
            .and_then(Json::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TableError::validation(op, "`name` must be a non-empty string"))?;
        TableName::new(name).map_err(|e| relabel(op, e))
    }

    /// `limit` is used only when it is a number; `offset` only alongside it.
    fn page(op: &'static str, obj: &Map<String, Json>) -> Result<Option<Page>> {
        let Some(Json::Number(limit)) = obj.get("limit") else {
            return Ok(None);
        };
        let limit = limit
            .as_i64()
            .ok_or_else(|| TableError::validation(op, "`limit` must be an integer"))?;
        let mut page = Page::limit(limit);
        if let Some(Json::Number(offset)) = obj.get("offset") {
            let offset = offset
                .as_i64()
                .ok_or_else(|| TableError::validation(op, "`offset` must be an integer"))?;
            page = page.with_offset(offset);
        }
        Ok(Some(page))
    }

    fn where_object<'a>(op: &'static str, obj: &'a Map<String, Json>) -> Result<&'a Map<String, Json>> {
        obj.get("where")
            .and_then(Json::as_object)
            .ok_or_else(|| TableError::validation(op, "`where` must be an object"))
    }

    fn first_entry_filter(op: &'static str, obj: &Map<String, Json>) -> Result<Filter> {
        let clause = where_object(op, obj)?;
        let (column, value) = clause
            .iter()
            .next()
            .ok_or_else(|| TableError::validation(op, "`where` must have at least one entry"))?;
        if clause.len() > 1 {
            tracing::debug!(operation = op, column = %column, ignored = clause.len() - 1, "filtering on first where entry only");
        }
        Filter::eq(column.clone(), Value::from_json(value)).map_err(|e| relabel(op, e))
    }

    fn key_value_filter(op: &'static str, obj: &Map<String, Json>) -> Result<Filter> {
        let clause = where_object(op, obj)?;
        let key = clause
            .get("key")
            .and_then(Json::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TableError::validation(op, "`where.key` must be a non-empty string"))?;
        let value = match clause.get("value") {
            None | Some(Json::Null) => None,
            Some(Json::String(s)) if s.is_empty() => None,
            Some(value) => Some(value),
        }
        .ok_or_else(|| TableError::validation(op, "`where.value` must be present and non-empty"))?;
        Filter::eq(key, Value::from_json(value)).map_err(|e| relabel(op, e))
    }

    /// Report a nested validation failure under the calling operation.
    fn relabel(op: &'static str, err: TableError) -> TableError {
        match err {
            TableError::Validation { reason, .. } => TableError::Validation { operation: op, reason },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::error::TableError;
    use crate::request::Page;
    use crate::value::Value;
    use serde_json::json;

    fn reason(err: TableError) -> (&'static str, String) {
        match err {
            TableError::Validation { operation, reason } => (operation, reason),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_name_fails_every_operation() {
        let bad = [json!({}), json!({"name": ""}), json!({"name": 3}), json!("users"), json!(null)];
        for descriptor in &bad {
            assert!(parse::read_full_table(descriptor).unwrap_err().is_validation());
            assert!(parse::read_row_by_object(descriptor).is_err());
            assert!(parse::read_row_by_value(descriptor).is_err());
            assert!(parse::write_table(descriptor).is_err());
            assert!(parse::update_table_by_object(descriptor).is_err());
            assert!(parse::update_table_by_value(descriptor).is_err());
            assert!(parse::delete_row_by_object(descriptor).is_err());
            assert!(parse::delete_row_by_value(descriptor).is_err());
            assert!(parse::clear_full_table(descriptor).is_err());
        }
    }

    #[test]
    fn limit_and_offset() {
        let req = parse::read_full_table(&json!({"name": "t", "limit": 5, "offset": 10})).unwrap();
        assert_eq!(req.page, Some(Page { limit: 5, offset: Some(10) }));

        // Offset without a limit is ignored, as is a non-numeric limit.
        let req = parse::read_full_table(&json!({"name": "t", "offset": 10})).unwrap();
        assert_eq!(req.page, None);
        let req = parse::read_full_table(&json!({"name": "t", "limit": "5"})).unwrap();
        assert_eq!(req.page, None);

        let (op, _) = reason(parse::read_full_table(&json!({"name": "t", "limit": 2.5})).unwrap_err());
        assert_eq!(op, "read_full_table");
    }

    #[test]
    fn by_object_uses_first_entry() {
        let req = parse::read_row_by_object(&json!({
            "name": "users",
            "where": {"name": "Ann", "id": "1"},
            "limit": 1
        }))
        .unwrap();
        let conditions = req.filter.conditions();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].0.as_str(), "name");
        assert_eq!(conditions[0].1, Value::from("Ann"));
        assert!(req.page.is_some());

        let (op, reason) = reason(parse::read_row_by_object(&json!({"name": "users", "where": {}})).unwrap_err());
        assert_eq!(op, "read_row_by_object");
        assert!(reason.contains("at least one entry"));
    }

    #[test]
    fn by_value_requires_key_and_value() {
        let req = parse::read_row_by_value(&json!({
            "name": "users",
            "where": {"key": "id", "value": "1"},
            "limit": 3
        }))
        .unwrap();
        assert_eq!(req.filter.conditions()[0].0.as_str(), "id");
        assert_eq!(req.page, None);

        for clause in [
            json!({"key": "id"}),
            json!({"key": "", "value": "1"}),
            json!({"key": "id", "value": ""}),
            json!({"key": "id", "value": null}),
            json!(["id", "1"]),
        ] {
            let err = parse::delete_row_by_value(&json!({"name": "users", "where": clause})).unwrap_err();
            assert_eq!(reason(err).0, "delete_row_by_value");
        }

        // Zero is a legitimate value to filter on.
        assert!(parse::read_row_by_value(&json!({"name": "t", "where": {"key": "n", "value": 0}})).is_ok());
    }

    #[test]
    fn write_skips_non_objects() {
        let req = parse::write_table(&json!({
            "name": "users",
            "data": [{"id": "1", "name": "Ann"}, "junk", 7, null, {"id": "2"}]
        }))
        .unwrap();
        assert_eq!(req.len(), 2);

        let req = parse::write_table(&json!({"name": "users", "data": []})).unwrap();
        assert!(req.is_empty());

        let (op, _) = reason(parse::write_table(&json!({"name": "users", "data": {"id": "1"}})).unwrap_err());
        assert_eq!(op, "write_table");
    }

    #[test]
    fn update_by_object_needs_columns() {
        assert!(parse::update_table_by_object(&json!({
            "name": "users", "where": {"id": "1"}, "data": {"name": "Anna"}
        }))
        .is_ok());

        let (op, _) = reason(
            parse::update_table_by_object(&json!({"name": "users", "where": {"id": "1"}, "data": {}})).unwrap_err(),
        );
        assert_eq!(op, "update_table_by_object");
    }

    #[test]
    fn update_by_value_keeps_only_valid_entries() {
        let req = parse::update_table_by_value(&json!({
            "name": "users",
            "where": {"key": "id", "value": "1"},
            "data": [{"key": "name", "value": "Anna"}, {"key": ""}, {"value": "x"}, "junk"]
        }))
        .unwrap();
        assert_eq!(req.set.len(), 1);
        assert_eq!(req.set[0].0.as_str(), "name");

        let (_, reason) = reason(
            parse::update_table_by_value(&json!({
                "name": "users",
                "where": {"key": "id", "value": "1"},
                "data": [{"key": ""}]
            }))
            .unwrap_err(),
        );
        assert!(reason.contains("no valid"));
    }
}
