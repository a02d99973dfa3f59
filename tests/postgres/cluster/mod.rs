//! Embedded `PostgreSQL` cluster shared by the integration tests.
//!
//! The cluster starts once per test binary, in process when running
//! unprivileged and through the `PG_EMBEDDED_WORKER` helper when running as
//! root. Failing to start it panics, so a broken environment is never
//! mistaken for a passing run.

mod fs_utils;

use self::fs_utils::{sync_password_from_file, sync_port_from_pid};
use crate::test_helpers::ScopedEnv;
use diesel::prelude::*;
use pg_embedded_setup_unpriv::worker_process_test_api::{
    WorkerOperation, WorkerRequest, WorkerRequestArgs, run as run_worker,
};
use pg_embedded_setup_unpriv::{ExecutionPrivileges, TestBootstrapSettings, bootstrap_for_tests};
use postgresql_embedded::{PostgreSQL, Status};
use std::net::TcpListener;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Error type for cluster startup.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Database the integration tests migrate and exercise.
pub const TEST_DATABASE: &str = "task_service_test";

static SHARED_CLUSTER: OnceLock<ManagedCluster> = OnceLock::new();

/// A running embedded cluster with the test database created.
pub struct ManagedCluster {
    bootstrap: TestBootstrapSettings,
    _in_process: Option<InProcessCluster>,
}

/// Handles that keep an in-process cluster alive.
struct InProcessCluster {
    _runtime: Runtime,
    _postgres: PostgreSQL,
}

impl ManagedCluster {
    fn start() -> Result<Self, BoxError> {
        let port_overrides: Vec<(&str, Option<String>)> = free_port_override()?
            .into_iter()
            .map(|port| ("PG_PORT", Some(port)))
            .collect();
        let port_env = ScopedEnv::apply(port_overrides.as_slice());
        let mut bootstrap = bootstrap_for_tests().map_err(|err| Box::new(err) as BoxError)?;
        drop(port_env);
        sync_password_from_file(&mut bootstrap.settings)?;

        let in_process = match bootstrap.privileges {
            ExecutionPrivileges::Root => {
                start_via_worker(&mut bootstrap)?;
                None
            }
            ExecutionPrivileges::Unprivileged => Some(start_in_process(&mut bootstrap)?),
        };
        let cluster = Self {
            bootstrap,
            _in_process: in_process,
        };
        cluster.ensure_database(TEST_DATABASE)?;
        Ok(cluster)
    }

    /// Connection URL for `database` on this cluster.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        self.bootstrap.settings.url(database)
    }

    fn ensure_database(&self, database: &str) -> Result<(), BoxError> {
        #[derive(diesel::QueryableByName)]
        struct ExistsRow {
            #[diesel(sql_type = diesel::sql_types::Bool)]
            exists: bool,
        }

        let mut admin = PgConnection::establish(&self.database_url("postgres"))
            .map_err(|err| Box::new(err) as BoxError)?;
        let row = diesel::sql_query(
            "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS exists",
        )
        .bind::<diesel::sql_types::Text, _>(database)
        .get_result::<ExistsRow>(&mut admin)
        .map_err(|err| Box::new(err) as BoxError)?;
        if row.exists {
            return Ok(());
        }
        diesel::sql_query(format!("CREATE DATABASE {}", quote_identifier(database)))
            .execute(&mut admin)
            .map_err(|err| Box::new(err) as BoxError)?;
        Ok(())
    }
}

fn start_in_process(bootstrap: &mut TestBootstrapSettings) -> Result<InProcessCluster, BoxError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| Box::new(err) as BoxError)?;
    let cluster_vars = bootstrap.environment.to_env();
    let cluster_env = ScopedEnv::apply(cluster_vars.as_slice());
    let mut postgres = PostgreSQL::new(bootstrap.settings.clone());
    runtime.block_on(async {
        postgres
            .setup()
            .await
            .map_err(|err| Box::new(err) as BoxError)?;
        if !matches!(postgres.status(), Status::Started) {
            postgres
                .start()
                .await
                .map_err(|err| Box::new(err) as BoxError)?;
        }
        Ok::<(), BoxError>(())
    })?;
    drop(cluster_env);

    bootstrap.settings = postgres.settings().clone();
    sync_port_from_pid(&mut bootstrap.settings)?;
    Ok(InProcessCluster {
        _runtime: runtime,
        _postgres: postgres,
    })
}

fn start_via_worker(bootstrap: &mut TestBootstrapSettings) -> Result<(), BoxError> {
    run_worker_operation(bootstrap, WorkerOperation::Setup, bootstrap.setup_timeout)?;
    run_worker_operation(bootstrap, WorkerOperation::Start, bootstrap.start_timeout)?;
    sync_port_from_pid(&mut bootstrap.settings)
}

fn run_worker_operation(
    bootstrap: &TestBootstrapSettings,
    operation: WorkerOperation,
    timeout: Duration,
) -> Result<(), BoxError> {
    let worker = bootstrap.worker_binary.as_ref().ok_or_else(|| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "embedded PostgreSQL cannot run as root without PG_EMBEDDED_WORKER; \
             set it or point DATABASE_CONNECTION_PARAMETERS at a running server",
        )) as BoxError
    })?;
    let env_vars = bootstrap.environment.to_env();
    let args = WorkerRequestArgs {
        worker: worker.as_path(),
        settings: &bootstrap.settings,
        env_vars: &env_vars,
        operation,
        timeout,
    };
    run_worker(&WorkerRequest::new(args)).map_err(|err| Box::new(err) as BoxError)
}

/// Returns the cluster for this test binary, starting it on first use.
///
/// # Panics
///
/// Panics when the cluster cannot be started.
pub fn shared_cluster() -> &'static ManagedCluster {
    SHARED_CLUSTER.get_or_init(|| match ManagedCluster::start() {
        Ok(cluster) => cluster,
        Err(err) => panic!("failed to start embedded PostgreSQL: {err}"),
    })
}

/// Picks an unused port unless `PG_PORT` already names one.
fn free_port_override() -> Result<Option<String>, BoxError> {
    if std::env::var_os("PG_PORT").is_some() {
        return Ok(None);
    }
    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(|err| Box::new(err) as BoxError)?;
    let port = listener
        .local_addr()
        .map_err(|err| Box::new(err) as BoxError)?
        .port();
    Ok(Some(port.to_string()))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
