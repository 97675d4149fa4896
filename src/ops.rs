//! Blocking operations against an explicitly passed connection.

use crate::error::Result;
use crate::query::{self, SqlQuery};
use crate::request::{Clear, CrudOperation, CrudOutcome, DeleteWhere, Insert, ReadAll, ReadWhere, UpdateWhere};
use crate::value::{Row, Value};
use rusqlite::{params_from_iter, Connection};

/// Run a query and collect every row as a column-name keyed map.
pub fn query_rows(conn: &Connection, query: &SqlQuery) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(&query.statement)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(params_from_iter(query.params.iter()), |row| {
            let mut map = Row::with_capacity(names.len());
            for (idx, name) in names.iter().enumerate() {
                map.insert(name.clone(), row.get::<_, Value>(idx)?);
            }
            Ok(map)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Run a statement and return the number of rows it changed.
pub fn execute(conn: &Connection, query: &SqlQuery) -> Result<usize> {
    Ok(conn.execute(&query.statement, params_from_iter(query.params.iter()))?)
}

pub fn read_all(conn: &Connection, req: &ReadAll) -> Result<Vec<Row>> {
    query_rows(conn, &query::select_all(req))
}

pub fn read_where(conn: &Connection, req: &ReadWhere) -> Result<Vec<Row>> {
    query_rows(conn, &query::select_where(req))
}

/// Insert every row in order. The batch commits as a whole or not at all.
pub fn insert(conn: &mut Connection, req: &Insert) -> Result<usize> {
    if req.rows.is_empty() {
        return Ok(0);
    }
    let tx = conn.transaction()?;
    let mut inserted = 0;
    for row in &req.rows {
        inserted += execute(&tx, &query::insert_row(&req.table, row))?;
    }
    tx.commit()?;
    Ok(inserted)
}

pub fn update_where(conn: &Connection, req: &UpdateWhere) -> Result<usize> {
    execute(conn, &query::update_where(req))
}

/// Delete matching rows and return them as they were before deletion.
pub fn delete_where(conn: &mut Connection, req: &DeleteWhere) -> Result<Vec<Row>> {
    let tx = conn.transaction()?;
    let snapshot = query_rows(&tx, &query::select_for_delete(req))?;
    let deleted = execute(&tx, &query::delete_where(req))?;
    tx.commit()?;
    tracing::debug!(table = %req.table, deleted, "rows deleted");
    Ok(snapshot)
}

pub fn clear(conn: &Connection, req: &Clear) -> Result<usize> {
    execute(conn, &query::clear(req))
}

/// Dispatch any [`CrudOperation`].
pub fn run_operation(conn: &mut Connection, op: &CrudOperation) -> Result<CrudOutcome> {
    Ok(match op {
        CrudOperation::ReadAll(req) => CrudOutcome::Rows(read_all(conn, req)?),
        CrudOperation::ReadWhere(req) => CrudOutcome::Rows(read_where(conn, req)?),
        CrudOperation::Insert(req) => CrudOutcome::Affected(insert(conn, req)?),
        CrudOperation::UpdateWhere(req) => CrudOutcome::Affected(update_where(conn, req)?),
        CrudOperation::DeleteWhere(req) => CrudOutcome::Rows(delete_where(conn, req)?),
        CrudOperation::Clear(req) => CrudOutcome::Affected(clear(conn, req)?),
    })
}
