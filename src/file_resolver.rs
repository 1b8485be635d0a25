//! File resolver module for locating episode files
//!
//! This module scans episode directories for the actual video file and
//! collects the directory entries that look like unprocessed episodes.

use crate::patterns::{is_canonical_name, is_interesting};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions (without the dot) that are treated as video files
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mpg", "mpeg", "avi", "mkv", "wmv", "mp4", "mov", "flv", "3gp", "ts",
];

/// Errors that can occur during file resolution
#[derive(Debug, Error)]
pub enum FileResolverError {
    /// Path is not a directory
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Failed to read directory
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read directory entry
    #[error("Failed to read directory entry: {0}")]
    ReadEntryFailed(#[from] io::Error),
}

/// Represents a detected video file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    /// Path to the video file
    pub path: PathBuf,
    /// Size of the file in bytes
    pub size: u64,
}

/// Returns true if the path ends in one of the known video extensions
pub fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Finds the biggest video file anywhere below the given directory
///
/// Sample clips and extras are usually shipped next to the episode, so the
/// largest file is taken as the episode itself. On equal sizes the entry
/// that sorts first by path wins.
///
/// # Returns
///
/// The biggest video file, `None` if the directory tree holds no video file,
/// or an error if a directory cannot be read.
pub(crate) fn find_biggest_video_file(
    dir_path: &Path,
) -> Result<Option<VideoFile>, FileResolverError> {
    let mut biggest = None;
    scan_directory_recursive(dir_path, &mut biggest)?;
    Ok(biggest)
}

/// Recursively scans a directory and keeps track of the biggest video file
fn scan_directory_recursive(
    dir_path: &Path,
    biggest: &mut Option<VideoFile>,
) -> Result<(), FileResolverError> {
    if !dir_path.is_dir() {
        return Err(FileResolverError::NotADirectory(dir_path.to_path_buf()));
    }

    for path in sorted_entries(dir_path)? {
        if path.is_dir() {
            scan_directory_recursive(&path, biggest)?;
        } else if path.is_file() && has_video_extension(&path) {
            let size = fs::metadata(&path)?.len();
            let is_bigger = biggest.as_ref().is_none_or(|current| size > current.size);

            if is_bigger {
                *biggest = Some(VideoFile { path, size });
            }
        }
    }

    Ok(())
}

/// Lists the entries of a directory sorted by path
fn sorted_entries(dir_path: &Path) -> Result<Vec<PathBuf>, FileResolverError> {
    let mut paths = Vec::new();

    for entry in fs::read_dir(dir_path).map_err(|e| FileResolverError::ReadDirectoryFailed {
        path: dir_path.to_path_buf(),
        source: e,
    })? {
        paths.push(entry?.path());
    }

    paths.sort();
    Ok(paths)
}

/// Collects the entries of a directory that look like unprocessed episodes
///
/// Only direct children are considered. Entries that carry season/episode
/// information but are already in the renamed `S01E01 - Name.ext` form are
/// skipped.
pub fn scan_for_episodes(dir_path: &Path) -> Result<Vec<PathBuf>, FileResolverError> {
    if !dir_path.is_dir() {
        return Err(FileResolverError::NotADirectory(dir_path.to_path_buf()));
    }

    let candidates = sorted_entries(dir_path)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| is_interesting(name) && !is_canonical_name(name))
        })
        .collect();

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    #[test]
    fn test_scan_nonexistent_directory() {
        let result = find_biggest_video_file(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_file_instead_of_directory() {
        let temp_dir = TempDir::new().unwrap();
        let temp_file = temp_dir.path().join("test_file.txt");
        File::create(&temp_file).unwrap();

        assert!(find_biggest_video_file(&temp_file).is_err());
        assert!(scan_for_episodes(&temp_file).is_err());
    }

    #[test]
    fn test_video_extensions() {
        assert!(has_video_extension(Path::new("episode.mkv")));
        assert!(has_video_extension(Path::new("/some/dir/episode.AVI")));
        assert!(has_video_extension(Path::new("clip.3gp")));
        assert!(!has_video_extension(Path::new("episode.nfo")));
        assert!(!has_video_extension(Path::new("episode")));
        assert!(!has_video_extension(Path::new(".mkv")));
    }

    #[test]
    fn test_biggest_video_file_wins() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();

        fs::write(temp_dir.path().join("sample.mkv"), "short").unwrap();
        fs::write(temp_dir.path().join("subtitles.sub"), "x".repeat(100)).unwrap();
        fs::write(nested.join("episode.avi"), "a much longer content").unwrap();

        let biggest = find_biggest_video_file(temp_dir.path()).unwrap().unwrap();
        assert_eq!(biggest.path, nested.join("episode.avi"));
        assert_eq!(biggest.size, 21);
    }

    #[test]
    fn test_no_video_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("episode.nfo"), "abc").unwrap();

        assert_eq!(find_biggest_video_file(temp_dir.path()).unwrap(), None);
    }

    #[test]
    fn test_scan_for_episodes_skips_renamed_and_uninteresting() {
        let temp_dir = TempDir::new().unwrap();
        for name in [
            "Chuck.S01E01.Pilot.mkv",
            "S01E02 - Chuck vs the Helicopter.mkv",
            ".DS_Store",
            "notes.txt",
        ] {
            File::create(temp_dir.path().join(name)).unwrap();
        }
        fs::create_dir(temp_dir.path().join("chuck.512.hdtv-lol")).unwrap();

        let found = scan_for_episodes(temp_dir.path()).unwrap();
        assert_eq!(
            found,
            vec![
                temp_dir.path().join("Chuck.S01E01.Pilot.mkv"),
                temp_dir.path().join("chuck.512.hdtv-lol"),
            ]
        );
    }
}
