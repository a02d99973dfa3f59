//! In-memory task store for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

use crate::task::{
    adapters::MigrationSource,
    domain::{PersistedTaskData, Task, TaskId},
    ports::{SchemaChange, StoreError, StoreResult, TaskStore},
};

/// Thread-safe in-memory task store.
///
/// Mirrors the `PostgreSQL` store contract: identifiers come from a sequence
/// starting at 1, reads share the table while mutations hold it exclusively
/// and either change it completely or not at all, and the table only exists
/// while at least one migration from the schema source is applied.
#[derive(Debug)]
pub struct InMemoryTaskStore<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    state: Arc<RwLock<InMemoryTaskState>>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    open: bool,
    applied: Vec<String>,
    table: Option<TaskTable>,
}

#[derive(Debug, Default)]
struct TaskTable {
    last_id: u64,
    rows: BTreeMap<TaskId, Task>,
}

impl TaskTable {
    const fn next_id(&mut self) -> TaskId {
        self.last_id += 1;
        TaskId::new(self.last_id)
    }
}

impl<C> Clone for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl InMemoryTaskStore<DefaultClock> {
    /// Creates an unopened store with no schema applied.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskStore<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an unopened store that reads timestamps from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            clock,
        }
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| StoreError::backend(std::io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| StoreError::backend(std::io::Error::other(err.to_string())))
    }

    /// Runs `work` against the table under the shared lock.
    fn read_table<T>(
        &self,
        cancel: &CancellationToken,
        work: impl FnOnce(&TaskTable) -> StoreResult<T>,
    ) -> StoreResult<T> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let state = self.read_state()?;
        work(usable_table(&state, cancel)?)
    }

    /// Runs `work` against the table under the exclusive lock.
    ///
    /// `work` must return its error before changing the table; nothing else
    /// can observe the table until it returns, so a mutation that succeeds is
    /// committed as a whole.
    fn write_table<T>(
        &self,
        cancel: &CancellationToken,
        work: impl FnOnce(&mut TaskTable) -> StoreResult<T>,
    ) -> StoreResult<T> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let mut state = self.write_state()?;
        usable_table(&state, cancel)?;
        let table = state.table.as_mut().ok_or_else(missing_table)?;
        work(table)
    }
}

/// Checks the store is open with a schema applied, and that the caller did
/// not cancel while waiting for the lock.
fn usable_table<'state>(
    state: &'state InMemoryTaskState,
    cancel: &CancellationToken,
) -> StoreResult<&'state TaskTable> {
    if !state.open {
        return Err(StoreError::NotOpen);
    }
    let table = state.table.as_ref().ok_or_else(missing_table)?;
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    Ok(table)
}

fn missing_table() -> StoreError {
    StoreError::backend(std::io::Error::other(
        "relation \"tasks\" does not exist; apply the schema first",
    ))
}

fn updated_row(existing: &Task, changes: &Task, updated_at: DateTime<Utc>) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: existing.id(),
        name: changes.name().to_owned(),
        details: changes.details().map(ToOwned::to_owned),
        resolved_at: changes.resolved_at(),
        created_at: existing.created_at(),
        updated_at: Some(updated_at),
    })
}

fn page_bound(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl<C> TaskStore for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn open(&self, _parameters: &str) -> StoreResult<()> {
        self.write_state()?.open = true;
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        let mut state = self.write_state()?;
        if !state.open {
            return Err(StoreError::NotOpen);
        }
        state.open = false;
        Ok(())
    }

    async fn prepare(&self, change: SchemaChange, source: &str) -> StoreResult<()> {
        let resolved = MigrationSource::resolve(source)?;
        let mut state = self.write_state()?;
        if !state.open {
            return Err(StoreError::NotOpen);
        }

        match change {
            SchemaChange::Up => {
                for migration in resolved.migrations() {
                    if !state.applied.contains(migration) {
                        state.applied.push(migration.clone());
                    }
                }
            }
            SchemaChange::Down => {
                state.applied.pop();
            }
            SchemaChange::Drop => state.applied.clear(),
        }

        if state.applied.is_empty() {
            state.table = None;
        } else if state.table.is_none() {
            state.table = Some(TaskTable::default());
        }
        Ok(())
    }

    async fn insert(&self, cancel: &CancellationToken, task: &mut Task) -> StoreResult<()> {
        if !task.id().is_unassigned() {
            return Err(StoreError::IllAdvisedInsert);
        }
        task.sanitize();
        task.validate()?;

        let created_at = self.clock.utc();
        let mut row = task.clone();
        let id = self.write_table(cancel, move |table| {
            let id = table.next_id();
            row.mark_inserted(id, created_at);
            table.rows.insert(id, row);
            Ok(id)
        })?;

        task.mark_inserted(id, created_at);
        Ok(())
    }

    async fn update(&self, cancel: &CancellationToken, task: &mut Task) -> StoreResult<()> {
        task.sanitize();
        task.validate()?;

        let updated_at = self.clock.utc();
        let id = task.id();
        let changes = task.clone();
        self.write_table(cancel, move |table| {
            let existing = table.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            *existing = updated_row(existing, &changes, updated_at);
            Ok(())
        })?;

        task.mark_updated(updated_at);
        Ok(())
    }

    async fn read(&self, cancel: &CancellationToken, id: TaskId) -> StoreResult<Task> {
        self.read_table(cancel, |table| {
            table.rows.get(&id).cloned().ok_or(StoreError::NotFound(id))
        })
    }

    async fn delete(&self, cancel: &CancellationToken, id: TaskId) -> StoreResult<Task> {
        self.write_table(cancel, |table| {
            table.rows.remove(&id).ok_or(StoreError::NotFound(id))
        })
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<Task>> {
        self.read_table(cancel, |table| {
            Ok(table
                .rows
                .values()
                .skip(page_bound(offset))
                .take(page_bound(limit))
                .cloned()
                .collect())
        })
    }
}
