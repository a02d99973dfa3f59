//! `PostgreSQL` task store.

use super::{
    migrations,
    models::{NewTaskRow, TaskChangeset, TaskRow},
    schema::tasks,
    transaction::{self, ActiveBackend},
};
use crate::task::{
    adapters::MigrationSource,
    domain::{PersistedTaskData, Task, TaskId},
    ports::{SchemaChange, StoreError, StoreResult, TaskStore},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::{Clock, DefaultClock};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `PostgreSQL` connection pool type used by the task store.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `PostgreSQL`-backed task store.
///
/// The store holds a single pooled connection between [`TaskStore::open`]
/// and [`TaskStore::close`]. Every data operation runs on a blocking worker
/// thread inside its own transaction. Cancelling a call while a statement
/// is running asks the server to abort that statement, so the call returns
/// without waiting for it.
pub struct PostgresTaskStore<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    connected: RwLock<Option<Connected>>,
    clock: Arc<C>,
}

#[derive(Clone)]
struct Connected {
    pool: TaskPgPool,
    parameters: Arc<str>,
}

impl PostgresTaskStore<DefaultClock> {
    /// Creates an unopened store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for PostgresTaskStore<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> PostgresTaskStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an unopened store that reads timestamps from `clock`.
    #[must_use]
    pub const fn with_clock(clock: Arc<C>) -> Self {
        Self {
            connected: RwLock::new(None),
            clock,
        }
    }

    fn connected(&self) -> StoreResult<Connected> {
        self.connected
            .read()
            .map_err(|err| StoreError::backend(std::io::Error::other(err.to_string())))?
            .clone()
            .ok_or(StoreError::NotOpen)
    }

    fn replace_connected(&self, next: Option<Connected>) -> StoreResult<Option<Connected>> {
        let mut guard = self
            .connected
            .write()
            .map_err(|err| StoreError::backend(std::io::Error::other(err.to_string())))?;
        Ok(std::mem::replace(&mut *guard, next))
    }

    async fn run_in_transaction<F, T>(&self, cancel: &CancellationToken, work: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let Connected { pool, parameters } = self.connected()?;
        let backend = Arc::new(ActiveBackend::default());
        let worker_backend = Arc::clone(&backend);
        let token = cancel.clone();
        let mut job = tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::connection)?;
            transaction::run(&mut connection, &token, &worker_backend, work)
        });

        let joined = tokio::select! {
            joined = &mut job => joined,
            () = cancel.cancelled() => {
                interrupt(backend, parameters).await;
                job.await
            }
        };
        joined.map_err(StoreError::backend)?
    }
}

/// Aborts the statement a cancelled call is waiting on. The worker observes
/// the cancellation itself, so a failed interrupt only delays the return.
async fn interrupt(backend: Arc<ActiveBackend>, parameters: Arc<str>) {
    let outcome = tokio::task::spawn_blocking(move || backend.interrupt(&parameters))
        .await
        .map_err(StoreError::backend)
        .and_then(|interrupted| interrupted);
    if let Err(err) = outcome {
        tracing::warn!(error = %err, "failed to interrupt cancelled task statement");
    }
}

#[async_trait]
impl<C> TaskStore for PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn open(&self, parameters: &str) -> StoreResult<()> {
        let manager = ConnectionManager::<PgConnection>::new(parameters);
        let pool = tokio::task::spawn_blocking(move || {
            Pool::builder()
                .max_size(1)
                .connection_timeout(CONNECT_TIMEOUT)
                .build(manager)
        })
        .await
        .map_err(StoreError::connection)?
        .map_err(StoreError::connection)?;

        self.replace_connected(Some(Connected {
            pool,
            parameters: Arc::from(parameters),
        }))?;
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.replace_connected(None)?
            .map(drop)
            .ok_or(StoreError::NotOpen)
    }

    async fn prepare(&self, change: SchemaChange, source: &str) -> StoreResult<()> {
        let resolved = MigrationSource::resolve(source)?;
        let Connected { pool, .. } = self.connected()?;
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::connection)?;
            migrations::apply(&mut connection, change, &resolved)
        })
        .await
        .map_err(StoreError::backend)?
    }

    async fn insert(&self, cancel: &CancellationToken, task: &mut Task) -> StoreResult<()> {
        if !task.id().is_unassigned() {
            return Err(StoreError::IllAdvisedInsert);
        }
        task.sanitize();
        task.validate()?;

        let created_at = self.clock.utc();
        let row = NewTaskRow {
            name: task.name().to_owned(),
            details: task.details().map(ToOwned::to_owned),
            resolved_at: task.resolved_at(),
            created_at,
            updated_at: None,
        };
        let id = self
            .run_in_transaction(cancel, move |connection| {
                diesel::insert_into(tasks::table)
                    .values(&row)
                    .returning(tasks::id)
                    .get_result::<i64>(connection)
                    .map_err(StoreError::backend)
            })
            .await?;

        task.mark_inserted(task_id(id)?, created_at);
        Ok(())
    }

    async fn update(&self, cancel: &CancellationToken, task: &mut Task) -> StoreResult<()> {
        task.sanitize();
        task.validate()?;

        let id = task.id();
        let key = row_key(id)?;
        let updated_at = self.clock.utc();
        let changes = TaskChangeset {
            name: task.name().to_owned(),
            details: task.details().map(ToOwned::to_owned),
            resolved_at: task.resolved_at(),
            updated_at: Some(updated_at),
        };
        self.run_in_transaction(cancel, move |connection| {
            diesel::update(tasks::table.find(key))
                .set(&changes)
                .returning(tasks::id)
                .get_result::<i64>(connection)
                .optional()
                .map_err(StoreError::backend)?
                .map(drop)
                .ok_or(StoreError::NotFound(id))
        })
        .await?;

        task.mark_updated(updated_at);
        Ok(())
    }

    async fn read(&self, cancel: &CancellationToken, id: TaskId) -> StoreResult<Task> {
        let key = row_key(id)?;
        self.run_in_transaction(cancel, move |connection| {
            tasks::table
                .find(key)
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(StoreError::backend)?
                .ok_or(StoreError::NotFound(id))
                .and_then(row_to_task)
        })
        .await
    }

    async fn delete(&self, cancel: &CancellationToken, id: TaskId) -> StoreResult<Task> {
        let key = row_key(id)?;
        self.run_in_transaction(cancel, move |connection| {
            diesel::delete(tasks::table.find(key))
                .returning(TaskRow::as_returning())
                .get_result::<TaskRow>(connection)
                .optional()
                .map_err(StoreError::backend)?
                .ok_or(StoreError::NotFound(id))
                .and_then(row_to_task)
        })
        .await
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<Task>> {
        let page_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let page_offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.run_in_transaction(cancel, move |connection| {
            let rows = tasks::table
                .order(tasks::id.asc())
                .limit(page_limit)
                .offset(page_offset)
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(StoreError::backend)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

/// Identifiers beyond the `BIGINT` range cannot exist in the table.
fn row_key(id: TaskId) -> StoreResult<i64> {
    i64::try_from(id.value()).map_err(|_| StoreError::NotFound(id))
}

fn task_id(key: i64) -> StoreResult<TaskId> {
    u64::try_from(key)
        .map(TaskId::new)
        .map_err(StoreError::backend)
}

fn row_to_task(row: TaskRow) -> StoreResult<Task> {
    let TaskRow {
        id,
        name,
        details,
        resolved_at,
        created_at,
        updated_at,
    } = row;

    Ok(Task::from_persisted(PersistedTaskData {
        id: task_id(id)?,
        name,
        details,
        resolved_at,
        created_at: Some(created_at),
        updated_at,
    }))
}
