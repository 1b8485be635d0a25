use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during file operations
#[derive(Debug, Error)]
pub enum FileOperationError {
    #[error("Failed to move {from} to {to}: {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Failed to remove directory {path}: {source}")]
    CleanupFailed { path: PathBuf, source: io::Error },
}

/// Represents a planned rename of an episode file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    /// The video file that gets moved
    pub source: PathBuf,
    /// Destination file path including the cleaned file name
    pub destination: PathBuf,
    /// Download directory that is removed once the video file moved out of it
    pub cleanup: Option<PathBuf>,
}

impl PlannedRename {
    /// Plans moving `source` into `dest_dir` under `file_name`
    ///
    /// When `download_dir` is given it gets removed recursively after the move.
    pub fn new(source: &Path, dest_dir: &Path, file_name: &str, download_dir: Option<&Path>) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: dest_dir.join(file_name),
            cleanup: download_dir.map(Path::to_path_buf),
        }
    }
}

/// Executes a planned rename
///
/// The cleanup directory is only touched after the move succeeded, so a
/// failed move leaves everything in place.
pub fn execute_rename(operation: &PlannedRename) -> Result<(), FileOperationError> {
    fs::rename(&operation.source, &operation.destination).map_err(|e| {
        FileOperationError::MoveFailed {
            from: operation.source.clone(),
            to: operation.destination.clone(),
            source: e,
        }
    })?;

    if let Some(dir) = &operation.cleanup {
        fs::remove_dir_all(dir).map_err(|e| FileOperationError::CleanupFailed {
            path: dir.clone(),
            source: e,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plan_rename() {
        let op = PlannedRename::new(
            Path::new("/downloads/Show.S01E01/episode.mkv"),
            Path::new("/downloads"),
            "S01E01 - Pilot.mkv",
            Some(Path::new("/downloads/Show.S01E01")),
        );

        assert_eq!(op.destination, PathBuf::from("/downloads/S01E01 - Pilot.mkv"));
        assert_eq!(op.cleanup, Some(PathBuf::from("/downloads/Show.S01E01")));
    }

    #[test]
    fn test_execute_rename_with_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let download = temp_dir.path().join("Show.S01E01");
        fs::create_dir(&download).unwrap();
        fs::write(download.join("episode.mkv"), "video").unwrap();

        let op = PlannedRename::new(
            &download.join("episode.mkv"),
            temp_dir.path(),
            "S01E01 - Pilot.mkv",
            Some(&download),
        );
        execute_rename(&op).unwrap();

        assert!(temp_dir.path().join("S01E01 - Pilot.mkv").is_file());
        assert!(!download.exists());
    }

    #[test]
    fn test_failed_move_skips_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let download = temp_dir.path().join("Show.S01E01");
        fs::create_dir(&download).unwrap();

        let op = PlannedRename::new(
            &download.join("missing.mkv"),
            temp_dir.path(),
            "S01E01 - Pilot.mkv",
            Some(&download),
        );

        let err = execute_rename(&op).unwrap_err();
        assert!(matches!(err, FileOperationError::MoveFailed { .. }));
        assert!(download.is_dir());
    }
}
