//! Reads the settings an embedded cluster writes to disk.

use super::BoxError;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use postgresql_embedded::Settings;
use std::path::Path;

fn utf8(path: &Path) -> Result<&Utf8Path, BoxError> {
    Utf8Path::from_path(path).ok_or_else(|| {
        Box::new(std::io::Error::other(format!(
            "cluster path {} is not valid UTF-8",
            path.display()
        ))) as BoxError
    })
}

fn read_optional(dir: &Utf8Path, file_name: &str) -> Result<Option<String>, BoxError> {
    let handle =
        Dir::open_ambient_dir(dir, ambient_authority()).map_err(|err| Box::new(err) as BoxError)?;
    match handle.read_to_string(file_name) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Box::new(err) as BoxError),
    }
}

/// Adopts the superuser password the bootstrap wrote, when it wrote one.
pub(super) fn sync_password_from_file(settings: &mut Settings) -> Result<(), BoxError> {
    let password_path = utf8(&settings.password_file)?;
    let Some(file_name) = password_path.file_name() else {
        return Ok(());
    };
    let parent = password_path.parent().unwrap_or_else(|| Utf8Path::new("."));
    if let Some(contents) = read_optional(parent, file_name)? {
        let password = contents.trim_end();
        if !password.is_empty() {
            password.clone_into(&mut settings.password);
        }
    }
    Ok(())
}

/// Adopts the port the running postmaster reports on line four of its pid
/// file.
pub(super) fn sync_port_from_pid(settings: &mut Settings) -> Result<(), BoxError> {
    let data_dir = utf8(&settings.data_dir)?;
    let Some(contents) = read_optional(data_dir, "postmaster.pid")? else {
        return Ok(());
    };
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}
