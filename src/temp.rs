//! Temporary file management module
//!
//! Files are written to a uniquely named sibling first and only moved over
//! their target once completely written. The guard removes the sibling again
//! if it never made it to its final place.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Guard for a temporary file that is deleted on drop unless persisted
#[derive(Debug)]
pub(crate) struct TempGuard {
    path: PathBuf,
    persisted: bool,
}

impl TempGuard {
    /// Get the path to the temporary file
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the temporary file over `target`, replacing it
    ///
    /// On failure the temporary file is removed when the guard drops.
    pub(crate) fn persist(mut self, target: &Path) -> io::Result<()> {
        fs::rename(&self.path, target)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if !self.persisted {
            // Silently ignore errors during cleanup
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Creates an empty hidden temporary file inside `dir`
///
/// The name is built from the prefix, a ULID and the extension, so
/// concurrent writers never share a file. Placing it next to the final
/// target keeps the later rename on one filesystem.
pub(crate) fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> io::Result<TempGuard> {
    let ulid = ulid::Ulid::new();
    let path = dir.join(format!(".{prefix}_{ulid}.{extension}"));

    File::options().write(true).create_new(true).open(&path)?;

    Ok(TempGuard {
        path,
        persisted: false,
    })
}

/// Writes `content` to `target` through a temporary sibling file
///
/// Readers of `target` see either the previous or the complete new content.
pub(crate) fn write_atomically(target: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = target
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("tmp");

    let temp = create_temp_file(dir, prefix, "tmp")?;

    let mut file = File::options().write(true).truncate(true).open(temp.path())?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);

    temp.persist(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_temp_file() {
        let dir = TempDir::new().unwrap();
        let temp = create_temp_file(dir.path(), "test", "txt").unwrap();
        let path = temp.path().to_path_buf();

        assert!(path.is_file());

        let filename = path.file_name().unwrap().to_str().unwrap();
        assert!(filename.starts_with(".test_"));
        assert!(filename.ends_with(".txt"));
        assert_eq!(path.parent(), Some(dir.path()));

        drop(temp);
        assert!(!path.exists());
    }

    #[test]
    fn test_multiple_temp_files_unique() {
        let dir = TempDir::new().unwrap();
        let temp1 = create_temp_file(dir.path(), "test", "txt").unwrap();
        let temp2 = create_temp_file(dir.path(), "test", "txt").unwrap();

        assert_ne!(temp1.path(), temp2.path());
        assert!(temp1.path().exists());
        assert!(temp2.path().exists());
    }

    #[test]
    fn test_persisted_file_survives_drop() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("index.xml");

        let temp = create_temp_file(dir.path(), "index", "tmp").unwrap();
        fs::write(temp.path(), "content").unwrap();
        let temp_path = temp.path().to_path_buf();
        temp.persist(&target).unwrap();

        assert!(!temp_path.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "content");
    }

    #[test]
    fn test_failed_persist_cleans_up() {
        let dir = TempDir::new().unwrap();
        let temp = create_temp_file(dir.path(), "index", "tmp").unwrap();
        let temp_path = temp.path().to_path_buf();

        let result = temp.persist(&dir.path().join("missing").join("index.xml"));

        assert!(result.is_err());
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_write_atomically_replaces_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("index.xml");
        fs::write(&target, "old").unwrap();

        write_atomically(&target, b"new").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
