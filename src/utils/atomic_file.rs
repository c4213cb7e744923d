use std::fs::Permissions;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::errors::{AppError, AppResult};

/// Mode given to newly created output files (temp files start out as 0600)
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Replace `path` with `contents` atomically.
///
/// The bytes go to a temp file in the destination directory which is then
/// renamed over `path`, so readers never see a partial file. An existing file
/// keeps its permissions; a new one is created world-readable.
pub fn replace_file(path: &Path, contents: &[u8]) -> AppResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let fail = |e: std::io::Error| AppError::output(path, e.to_string());

    std::fs::create_dir_all(dir).map_err(fail)?;
    let mut temp = NamedTempFile::new_in(dir).map_err(fail)?;
    temp.write_all(contents)
        .and_then(|_| temp.flush())
        .map_err(fail)?;
    if let Some(permissions) = target_permissions(path) {
        temp.as_file().set_permissions(permissions).map_err(fail)?;
    }
    temp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

fn target_permissions(path: &Path) -> Option<Permissions> {
    match std::fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_replace_file_creates_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/guide.xml");

        replace_file(&path, b"first").unwrap();
        replace_file(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        // No temp files left beside the target
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guide.xml");
        replace_file(&path, b"<tv/>").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_file_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guide.xml");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, Permissions::from_mode(0o640)).unwrap();

        replace_file(&path, b"new").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
