//! Schema lifecycle backed by `diesel_migrations`.

use crate::task::adapters::MigrationSource;
use crate::task::ports::{BackendError, SchemaChange, StoreError, StoreResult};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel_migrations::{FileBasedMigrations, MigrationHarness};
use std::sync::Arc;

/// Drops every table in the connection's current schema, the migration
/// bookkeeping table included. Owned sequences go with their tables.
const DROP_ALL_TABLES: &str = r"
DO $$
DECLARE
    target record;
BEGIN
    FOR target IN
        SELECT tablename FROM pg_tables WHERE schemaname = current_schema()
    LOOP
        EXECUTE 'DROP TABLE IF EXISTS ' || quote_ident(target.tablename) || ' CASCADE';
    END LOOP;
END
$$;
";

/// Applies `change` using the migrations under `source`.
pub(super) fn apply(
    connection: &mut PgConnection,
    change: SchemaChange,
    source: &MigrationSource,
) -> StoreResult<()> {
    let fail = |err: BackendError| StoreError::schema(change, err);

    match change {
        SchemaChange::Up => {
            let migrations = load(source)?;
            connection
                .run_pending_migrations(migrations)
                .map(drop)
                .map_err(|err| fail(Arc::from(err)))
        }
        SchemaChange::Down => {
            let applied = connection
                .applied_migrations()
                .map_err(|err| fail(Arc::from(err)))?;
            if applied.is_empty() {
                return Ok(());
            }
            let migrations = load(source)?;
            connection
                .revert_last_migration(migrations)
                .map(drop)
                .map_err(|err| fail(Arc::from(err)))
        }
        SchemaChange::Drop => connection
            .batch_execute(DROP_ALL_TABLES)
            .map_err(|err| fail(Arc::new(err) as BackendError)),
    }
}

fn load(source: &MigrationSource) -> StoreResult<FileBasedMigrations> {
    FileBasedMigrations::from_path(source.root())
        .map_err(|_| StoreError::InvalidSchemaSource(source.root().to_string()))
}
