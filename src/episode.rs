//! Episode records built from downloaded files and directories
//!
//! An [`Episode`] is created for every interesting directory entry, cleaned
//! up, matched against the series index and finally renamed into the
//! canonical `S01E01 - Name.ext` form.

use crate::file_operations::{FileOperationError, PlannedRename, execute_rename};
use crate::file_resolver::{FileResolverError, find_biggest_video_file, has_video_extension};
use crate::patterns::{clean_fragment, extract};
use crate::trash_words;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Language code assigned to episodes whose name mentions "German"
pub const GERMAN_LANGUAGE: &str = "de";

/// Errors that can occur while building or renaming an episode
#[derive(Debug, Error)]
pub enum EpisodeError {
    /// The supplied path does not exist
    #[error("Supplied episode does not exist: {0}")]
    NotFound(PathBuf),

    /// The name of the supplied path carries no season/episode information
    #[error("Supplied episode has no series information: {0}")]
    NoSeriesInfo(PathBuf),

    /// Neither the path itself nor anything below it is a video file
    #[error("No video file available: {0}")]
    NoVideoFile(PathBuf),

    /// The episode has no name or its video file vanished
    #[error("Episode couldn't be renamed as it has some problems: {0}")]
    NotRenamable(PathBuf),

    /// Error while searching the episode directory
    #[error("File resolution error: {0}")]
    FileResolver(#[from] FileResolverError),

    /// Error while moving the episode file
    #[error("File operation error: {0}")]
    FileOperation(#[from] FileOperationError),
}

/// A single downloaded episode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Episode {
    /// The season number
    pub season: u32,
    /// The episode number within the season
    pub episode: u32,
    /// The cleaned episode title
    pub name: String,
    /// The series name, raw from the file name until resolved by the index
    pub series: String,
    /// Extension of the video file including the leading dot
    pub extension: String,
    /// The actual video file
    pub episode_file: PathBuf,
    /// The path the episode was built from, a file or a download directory
    pub path: PathBuf,
    /// Language code, empty while unknown
    pub language: String,
}

impl Episode {
    /// Builds an episode from a downloaded file or directory
    ///
    /// For directories the biggest video file below it is used as episode
    /// file. Season, episode, series and name are always taken from the name
    /// of the supplied path itself.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing paths, `NoSeriesInfo` when the name
    /// does not match any episode pattern and `NoVideoFile` when no video
    /// file can be found.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EpisodeError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(EpisodeError::NotFound(path.to_path_buf()));
        }

        let info = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(extract)
            .ok_or_else(|| EpisodeError::NoSeriesInfo(path.to_path_buf()))?;

        let episode_file = if path.is_dir() {
            find_biggest_video_file(path)?
                .ok_or_else(|| EpisodeError::NoVideoFile(path.to_path_buf()))?
                .path
        } else {
            path.to_path_buf()
        };

        if !has_video_extension(&episode_file) {
            return Err(EpisodeError::NoVideoFile(path.to_path_buf()));
        }

        let extension = episode_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let mut name = info.episode_name.as_str();
        if path.is_file() {
            name = name.strip_suffix(extension.as_str()).unwrap_or(name);
        }

        let mut episode = Self {
            season: info.season,
            episode: info.episode,
            name: clean_fragment(name),
            series: clean_fragment(&info.series),
            extension,
            episode_file,
            path: path.to_path_buf(),
            language: String::new(),
        };
        episode.extract_language();

        debug!(
            path = %path.display(),
            series = %episode.series,
            season = episode.season,
            episode = episode.episode,
            "built episode"
        );

        Ok(episode)
    }

    /// The canonical file name: `S01E02 - Name.ext`
    pub fn cleaned_file_name(&self) -> String {
        format!(
            "S{:02}E{:02} - {}{}",
            self.season, self.episode, self.name, self.extension
        )
    }

    pub fn has_valid_episode_name(&self) -> bool {
        !self.name.is_empty()
    }

    /// Names the episode after its number, for files that carry no title
    pub fn set_default_episode_name(&mut self) {
        self.name = format!("Episode {:02}", self.episode);
    }

    pub fn remove_trash_words(&mut self) {
        self.name = trash_words::remove_trash_words(&self.name);
    }

    pub fn can_be_renamed(&self) -> bool {
        self.has_valid_episode_name() && self.episode_file.is_file()
    }

    /// Returns true if the episode was downloaded as a directory
    pub fn is_directory(&self) -> bool {
        self.path.is_dir()
    }

    /// Plans the move of the episode file to `dest_dir`
    pub fn plan_rename(&self, dest_dir: &Path) -> PlannedRename {
        let download_dir = self.is_directory().then_some(self.path.as_path());
        PlannedRename::new(
            &self.episode_file,
            dest_dir,
            &self.cleaned_file_name(),
            download_dir,
        )
    }

    /// Moves the episode file to `dest_dir` under its cleaned file name
    ///
    /// Episodes downloaded as directory have that directory removed after
    /// the file was moved out of it.
    ///
    /// # Returns
    ///
    /// The new path of the episode file
    pub fn rename(&self, dest_dir: &Path) -> Result<PathBuf, EpisodeError> {
        if !self.can_be_renamed() {
            return Err(EpisodeError::NotRenamable(self.path.clone()));
        }

        let operation = self.plan_rename(dest_dir);
        execute_rename(&operation)?;

        info!(
            from = %operation.source.display(),
            to = %operation.destination.display(),
            "renamed episode"
        );

        Ok(operation.destination)
    }

    fn extract_language(&mut self) {
        if self.name.to_lowercase().contains("german") {
            self.language = GERMAN_LANGUAGE.to_string();
        }
    }
}
