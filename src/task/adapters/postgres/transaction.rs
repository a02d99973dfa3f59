//! Explicit transaction control that never discards a rollback failure.

use crate::task::ports::{BackendError, StoreError, StoreResult};
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Server process running the open transaction of one store call.
///
/// The pid is attached after `BEGIN` and detached once the work returns, so
/// [`ActiveBackend::interrupt`] can only reach statements issued by that work.
#[derive(Debug, Default)]
pub(super) struct ActiveBackend(Mutex<Option<i32>>);

impl ActiveBackend {
    fn slot(&self) -> MutexGuard<'_, Option<i32>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(&self, pid: i32) {
        *self.slot() = Some(pid);
    }

    fn detach(&self) {
        *self.slot() = None;
    }

    /// Cancels the statement running on the attached backend through a
    /// separate connection. Returns `false` when no transaction is attached.
    ///
    /// The slot stays locked until the request is delivered, which keeps the
    /// worker from committing or reusing the connection in the meantime.
    pub(super) fn interrupt(&self, parameters: &str) -> StoreResult<bool> {
        let active = self.slot();
        let Some(pid) = *active else {
            return Ok(false);
        };
        let mut side = PgConnection::establish(parameters).map_err(StoreError::connection)?;
        diesel::sql_query("SELECT pg_cancel_backend($1)")
            .bind::<Integer, _>(pid)
            .execute(&mut side)
            .map_err(StoreError::backend)?;
        Ok(true)
    }
}

/// Runs `work` inside a transaction on `connection`.
///
/// Cancellation observed before `BEGIN` yields [`StoreError::Cancelled`].
/// Cancellation observed once the transaction is open, including a
/// statement aborted by [`ActiveBackend::interrupt`], rolls back and yields
/// a [`StoreError::Transaction`] wrapping it. Any other failure is returned
/// as-is when the rollback succeeds and wrapped together with the rollback
/// error when it does not.
pub(super) fn run<T>(
    connection: &mut PgConnection,
    cancel: &CancellationToken,
    backend: &ActiveBackend,
    work: impl FnOnce(&mut PgConnection) -> StoreResult<T>,
) -> StoreResult<T> {
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    AnsiTransactionManager::begin_transaction(connection).map_err(StoreError::backend)?;

    let outcome = backend_pid(connection).and_then(|pid| {
        backend.attach(pid);
        // An interrupt that found no pid happened after cancellation.
        let result = if cancel.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            work(connection)
        };
        backend.detach();
        result
    });
    let settled = if cancel.is_cancelled() {
        Err(StoreError::Cancelled)
    } else {
        outcome
    };

    match settled {
        Ok(value) => {
            AnsiTransactionManager::commit_transaction(connection)
                .map_err(StoreError::backend)?;
            Ok(value)
        }
        Err(original) => Err(roll_back(connection, original)),
    }
}

fn backend_pid(connection: &mut PgConnection) -> StoreResult<i32> {
    diesel::select(diesel::dsl::sql::<Integer>("pg_backend_pid()"))
        .get_result(connection)
        .map_err(StoreError::backend)
}

fn roll_back(connection: &mut PgConnection, original: StoreError) -> StoreError {
    let rollback = AnsiTransactionManager::rollback_transaction(connection)
        .err()
        .map(|err| Arc::new(err) as BackendError);

    if rollback.is_some() || original.is_cancelled() {
        StoreError::aborted(original, rollback)
    } else {
        original
    }
}
