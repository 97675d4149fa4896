use crate::config::{ensure_database_dir, AccessorConfig};
use crate::error::{Result, TableError};
use crate::ops;
use crate::request::{Clear, CrudOperation, CrudOutcome, DeleteWhere, Insert, ReadAll, ReadWhere, UpdateWhere};
use crate::schema::initialize_schema;
use crate::value::Row;
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Asynchronous CRUD operations over named tables.
///
/// Each call settles exactly once, when its statement (or transaction, for
/// batches) has completed or failed. Nothing is retried.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Every row of a table, optionally paged.
    async fn read_all(&self, req: ReadAll) -> Result<Vec<Row>>;

    /// Rows matching a filter.
    async fn read_where(&self, req: ReadWhere) -> Result<Vec<Row>>;

    /// Insert a batch of rows in one transaction, returning the inserted count.
    async fn insert(&self, req: Insert) -> Result<usize>;

    /// Update matching rows, returning the changed count.
    async fn update_where(&self, req: UpdateWhere) -> Result<usize>;

    /// Delete matching rows, returning them as they were before deletion.
    async fn delete_where(&self, req: DeleteWhere) -> Result<Vec<Row>>;

    /// Delete every row, keeping the table.
    async fn clear(&self, req: Clear) -> Result<usize>;

    /// Perform a CRUD operation (type-safe API)
    async fn execute(&self, op: CrudOperation) -> Result<CrudOutcome>;
}

/// Handle to one open database.
///
/// Clones share the same connection. rusqlite connections are not `Sync`, so
/// the connection sits behind a mutex and every statement runs on the
/// blocking pool.
#[derive(Clone)]
pub struct TableAccessor {
    connection: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl std::fmt::Debug for TableAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableAccessor")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl TableAccessor {
    /// Open (creating if needed) `<path>/<stem>.db` and apply the schema.
    #[tracing::instrument(skip(config), fields(name = %config.name))]
    pub async fn open(config: AccessorConfig) -> Result<Self> {
        config.validate()?;
        let db_path = config.db_file();
        let path = db_path.clone();
        let connection = tokio::task::spawn_blocking(move || -> Result<Connection> {
            ensure_database_dir(&config.path)?;
            let conn = Connection::open(&path)?;
            if let Some(timeout) = config.busy_timeout() {
                conn.busy_timeout(timeout)?;
            }
            initialize_schema(&conn, &config.schema)?;
            Ok(conn)
        })
        .await??;
        tracing::info!(path = %db_path.display(), "database opened");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            db_path: Some(db_path),
        })
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self> {
        let connection = tokio::task::spawn_blocking(Connection::open_in_memory).await??;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            db_path: None,
        })
    }

    /// File backing this accessor; `None` for in-memory databases.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run `f` with exclusive access to the underlying connection.
    pub async fn with_connection<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            // A panicking closure leaves no open transaction behind: a dropped
            // `Transaction` rolls back, so the connection stays usable.
            let mut conn = connection.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut *conn)
        })
        .await?
    }

    /// Close the connection if this is the last handle to it.
    pub async fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.connection) {
            Ok(mutex) => {
                let conn = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);
                tokio::task::spawn_blocking(move || conn.close().map_err(|(_, err)| TableError::Engine(err)))
                    .await??;
                tracing::debug!("database closed");
            }
            Err(_) => {
                tracing::debug!("other handles still open, connection kept alive");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for TableAccessor {
    async fn read_all(&self, req: ReadAll) -> Result<Vec<Row>> {
        let table = req.table.clone();
        let rows = self.with_connection(move |conn| ops::read_all(conn, &req)).await?;
        tracing::debug!(%table, rows = rows.len(), "read table");
        Ok(rows)
    }

    async fn read_where(&self, req: ReadWhere) -> Result<Vec<Row>> {
        let table = req.table.clone();
        let rows = self.with_connection(move |conn| ops::read_where(conn, &req)).await?;
        tracing::debug!(%table, rows = rows.len(), "read filtered rows");
        Ok(rows)
    }

    async fn insert(&self, req: Insert) -> Result<usize> {
        let table = req.table.clone();
        let inserted = self.with_connection(move |conn| ops::insert(conn, &req)).await?;
        tracing::debug!(%table, inserted, "rows inserted");
        Ok(inserted)
    }

    async fn update_where(&self, req: UpdateWhere) -> Result<usize> {
        let table = req.table.clone();
        let affected = self.with_connection(move |conn| ops::update_where(conn, &req)).await?;
        tracing::debug!(%table, affected, "rows updated");
        Ok(affected)
    }

    async fn delete_where(&self, req: DeleteWhere) -> Result<Vec<Row>> {
        self.with_connection(move |conn| ops::delete_where(conn, &req)).await
    }

    async fn clear(&self, req: Clear) -> Result<usize> {
        let table = req.table.clone();
        let affected = self.with_connection(move |conn| ops::clear(conn, &req)).await?;
        tracing::info!(%table, affected, "table cleared");
        Ok(affected)
    }

    async fn execute(&self, op: CrudOperation) -> Result<CrudOutcome> {
        self.with_connection(move |conn| ops::run_operation(conn, &op)).await
    }
}
