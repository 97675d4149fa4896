//! SQL text construction.
//!
//! Identifiers are always quoted and every value is a `?N` placeholder bound
//! at execution time; caller data never becomes part of the statement text.

use crate::request::{Clear, Column, DeleteWhere, Filter, Page, ReadAll, ReadWhere, TableName, UpdateWhere};
use crate::value::Value;

/// SQL statement with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            params: Vec::new(),
        }
    }

    /// Append `value` as the next placeholder and return its marker.
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }

    fn push_where(&mut self, filter: &Filter) {
        let mut clauses = Vec::with_capacity(filter.conditions.len());
        for (column, value) in &filter.conditions {
            let marker = self.bind(value.clone());
            clauses.push(format!("{} = {}", quote_ident(column.as_str()), marker));
        }
        self.statement.push_str(" WHERE ");
        self.statement.push_str(&clauses.join(" AND "));
    }

    fn push_page(&mut self, page: Option<Page>) {
        let Some(page) = page else {
            return;
        };
        let limit = self.bind(Value::Integer(page.limit));
        self.statement.push_str(&format!(" LIMIT {limit}"));
        if let Some(offset) = page.offset {
            let offset = self.bind(Value::Integer(offset));
            self.statement.push_str(&format!(" OFFSET {offset}"));
        }
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn select_all(req: &ReadAll) -> SqlQuery {
    let mut query = SqlQuery::new(&format!("SELECT * FROM {}", quote_ident(req.table.as_str())));
    query.push_page(req.page);
    query
}

pub fn select_where(req: &ReadWhere) -> SqlQuery {
    select_filtered(&req.table, &req.filter, req.page)
}

fn select_filtered(table: &TableName, filter: &Filter, page: Option<Page>) -> SqlQuery {
    let mut query = SqlQuery::new(&format!("SELECT * FROM {}", quote_ident(table.as_str())));
    query.push_where(filter);
    query.push_page(page);
    query
}

pub fn insert_row(table: &TableName, row: &[(Column, Value)]) -> SqlQuery {
    if row.is_empty() {
        return SqlQuery::new(&format!(
            "INSERT INTO {} DEFAULT VALUES",
            quote_ident(table.as_str())
        ));
    }
    let mut query = SqlQuery::new("");
    let columns: Vec<String> = row.iter().map(|(c, _)| quote_ident(c.as_str())).collect();
    let markers: Vec<String> = row.iter().map(|(_, v)| query.bind(v.clone())).collect();
    query.statement = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table.as_str()),
        columns.join(", "),
        markers.join(", ")
    );
    query
}

pub fn update_where(req: &UpdateWhere) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let assignments: Vec<String> = req
        .set
        .iter()
        .map(|(column, value)| format!("{} = {}", quote_ident(column.as_str()), query.bind(value.clone())))
        .collect();
    query.statement = format!(
        "UPDATE {} SET {}",
        quote_ident(req.table.as_str()),
        assignments.join(", ")
    );
    query.push_where(&req.filter);
    query
}

/// The snapshot read taken before a delete.
pub fn select_for_delete(req: &DeleteWhere) -> SqlQuery {
    select_filtered(&req.table, &req.filter, None)
}

pub fn delete_where(req: &DeleteWhere) -> SqlQuery {
    let mut query = SqlQuery::new(&format!("DELETE FROM {}", quote_ident(req.table.as_str())));
    query.push_where(&req.filter);
    query
}

pub fn clear(req: &Clear) -> SqlQuery {
    SqlQuery::new(&format!("DELETE FROM {}", quote_ident(req.table.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableName {
        TableName::new("users").unwrap()
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn select_with_page() {
        let q = select_all(&ReadAll::new(users()).with_page(Page::limit(10).with_offset(20)));
        assert_eq!(q.statement, "SELECT * FROM \"users\" LIMIT ?1 OFFSET ?2");
        assert_eq!(q.params, vec![Value::Integer(10), Value::Integer(20)]);

        let q = select_all(&ReadAll::new(users()));
        assert_eq!(q.statement, "SELECT * FROM \"users\"");
        assert!(q.params.is_empty());
    }

    #[test]
    fn filters_are_bound_not_inlined() {
        let filter = Filter::eq("name", "x' OR '1'='1").unwrap().and("id", 3).unwrap();
        let q = select_where(&ReadWhere::new(users(), filter).with_page(Page::limit(1)));
        assert_eq!(
            q.statement,
            "SELECT * FROM \"users\" WHERE \"name\" = ?1 AND \"id\" = ?2 LIMIT ?3"
        );
        assert_eq!(q.params[0], Value::from("x' OR '1'='1"));
        assert!(!q.statement.contains("OR"));
    }

    #[test]
    fn insert_and_update_statements() {
        let row = vec![
            (Column::new("id").unwrap(), Value::from("1")),
            (Column::new("name").unwrap(), Value::from("Ann")),
        ];
        let q = insert_row(&users(), &row);
        assert_eq!(q.statement, "INSERT INTO \"users\" (\"id\", \"name\") VALUES (?1, ?2)");
        assert_eq!(
            insert_row(&users(), &[]).statement,
            "INSERT INTO \"users\" DEFAULT VALUES"
        );

        let update = UpdateWhere::new(users(), Filter::eq("id", "1").unwrap(), [("name", "Anna")]).unwrap();
        let q = update_where(&update);
        assert_eq!(q.statement, "UPDATE \"users\" SET \"name\" = ?1 WHERE \"id\" = ?2");
        assert_eq!(q.params, vec![Value::from("Anna"), Value::from("1")]);
    }

    #[test]
    fn delete_statements() {
        let req = DeleteWhere::new(users(), Filter::eq("id", "1").unwrap());
        assert_eq!(select_for_delete(&req).statement, "SELECT * FROM \"users\" WHERE \"id\" = ?1");
        assert_eq!(delete_where(&req).statement, "DELETE FROM \"users\" WHERE \"id\" = ?1");
        assert_eq!(clear(&Clear::new(users())).statement, "DELETE FROM \"users\"");
    }
}
