//! Resolution of schema source locations into migration directories.

use crate::task::ports::{StoreError, StoreResult};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

const URI_SCHEME: &str = "file://";
const UP_SCRIPT: &str = "up.sql";

/// A directory of ordered migrations, one `<version>_<name>` subdirectory
/// per change, each holding `up.sql` and `down.sql`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSource {
    root: Utf8PathBuf,
    migrations: Vec<String>,
}

impl MigrationSource {
    /// Resolves a path or `file://` URI into a migration directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSchemaSource`] when the location is
    /// empty, is not a readable directory, or cannot be listed.
    pub fn resolve(location: &str) -> StoreResult<Self> {
        let path = location.strip_prefix(URI_SCHEME).unwrap_or(location);
        if path.is_empty() {
            return Err(invalid(location));
        }
        let root = Utf8PathBuf::from(path);
        let dir =
            Dir::open_ambient_dir(&root, ambient_authority()).map_err(|_| invalid(location))?;
        let mut migrations = list_migrations(&dir).map_err(|_| invalid(location))?;
        migrations.sort();
        Ok(Self { root, migrations })
    }

    /// Returns the migration directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the migration names in application order.
    #[must_use]
    pub fn migrations(&self) -> &[String] {
        &self.migrations
    }
}

fn list_migrations(dir: &Dir) -> std::io::Result<Vec<String>> {
    let mut migrations = Vec::new();
    for listed in dir.entries()? {
        let entry = listed?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.open_dir()?.exists(UP_SCRIPT) {
            migrations.push(entry.file_name()?);
        }
    }
    Ok(migrations)
}

fn invalid(location: &str) -> StoreError {
    StoreError::InvalidSchemaSource(location.to_owned())
}
