//! series - Rename downloaded TV episodes and keep track of watched ones
//!
//! This library turns the messy names of downloaded episodes into the
//! canonical `S01E01 - Name.ext` form and records every episode in a
//! per-series, per-language index of watched episodes.

mod config;
mod episode;
mod file_operations;
mod file_resolver;
mod hooks;
mod index;
mod name_extractor;
mod patterns;
mod temp;
mod trash_words;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

// Re-export error types
pub use config::ConfigError;
pub use episode::EpisodeError;
pub use file_operations::FileOperationError;
pub use file_resolver::FileResolverError;
pub use hooks::HookError;
pub use index::{ErrorKind, IndexError, PersistenceError};
pub use name_extractor::ExtractorError;

pub use config::{CONFIG_DIR_NAME, Config};
pub use episode::{Episode, GERMAN_LANGUAGE};
pub use file_operations::{PlannedRename, execute_rename};
pub use file_resolver::{VIDEO_EXTENSIONS, scan_for_episodes};
pub use hooks::{Hooks, run_hook};
pub use index::{DEFAULT_LANGUAGE, EpisodeEntry, EpisodeSet, Series, SeriesIndex};
pub use name_extractor::{FilesystemExtractor, ScriptExtractor, SeriesNameExtractor};
pub use patterns::{
    EpisodeMatch, clean_fragment, extract, is_canonical_name, is_interesting, parse_episode_code,
};
pub use trash_words::{TRASH_WORDS, remove_trash_words};

/// Progress event emitted while processing a download directory
///
/// These events allow library users to report progress without the library
/// printing anything itself.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Processing of a directory started
    Started { directory: PathBuf },

    /// Entries that look like episodes were found
    EntriesFound { count: usize },

    /// An entry was turned into an episode
    EpisodeBuilt {
        index: usize,
        total: usize,
        path: PathBuf,
        file_name: String,
    },

    /// An entry was skipped because no episode could be built from it
    EntrySkipped { path: PathBuf, reason: String },

    /// An episode cannot be renamed in its current state
    NotRenamable { path: PathBuf },

    /// An episode was added to the series index
    AddedToIndex {
        series: String,
        language: String,
        file_name: String,
    },

    /// The series index did not accept an episode
    IndexRejected { path: PathBuf, reason: String },

    /// An episode file was moved to its new name
    EpisodeRenamed {
        series: String,
        file_name: String,
        destination: PathBuf,
        size: Option<u64>,
    },

    /// Processing finished
    Complete { renameable: usize },
}

/// Options for [`process_directory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Add every renameable episode to the index; rejected episodes are skipped
    pub add_to_index: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self { add_to_index: true }
    }
}

/// Top-level error type for series operations
#[derive(Debug, Error)]
pub enum SeriesError {
    /// Error while scanning directories
    #[error("File resolution error: {0}")]
    FileResolver(#[from] FileResolverError),

    /// Error while building or renaming an episode
    #[error("Episode error: {0}")]
    Episode(#[from] EpisodeError),

    /// Error of an index operation
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Error while loading or writing the index
    #[error("Index persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Error while loading the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Processes all unrenamed episodes in a download directory
///
/// Every interesting entry of `directory` is turned into an episode, its
/// name is cleaned of release tags and, if requested, the episode is added
/// to the series index. Entries that fail any of these steps are reported
/// through the callback and skipped.
///
/// # Returns
///
/// The episodes ready to be renamed, in directory order
///
/// # Examples
///
/// ```no_run
/// use series::{ProcessOptions, ProgressEvent, SeriesIndex, process_directory};
/// use std::path::Path;
///
/// let mut index = SeriesIndex::load("/home/user/.series/index.xml").unwrap();
/// let episodes = process_directory(
///     Path::new("/home/user/Downloads"),
///     &mut index,
///     ProcessOptions::default(),
///     |event| {
///         if let ProgressEvent::IndexRejected { path, reason } = event {
///             println!("{}: {}", path.display(), reason);
///         }
///     },
/// )
/// .unwrap();
/// ```
pub fn process_directory<F>(
    directory: &Path,
    index: &mut SeriesIndex,
    options: ProcessOptions,
    mut progress_callback: F,
) -> Result<Vec<Episode>, SeriesError>
where
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::Started {
        directory: directory.to_path_buf(),
    });

    let entries = scan_for_episodes(directory)?;
    progress_callback(ProgressEvent::EntriesFound {
        count: entries.len(),
    });

    let mut renameable = Vec::new();

    for (position, path) in entries.iter().enumerate() {
        let mut episode = match Episode::from_path(path) {
            Ok(episode) => episode,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping entry");
                progress_callback(ProgressEvent::EntrySkipped {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        episode.remove_trash_words();
        if !episode.has_valid_episode_name() {
            episode.set_default_episode_name();
        }

        progress_callback(ProgressEvent::EpisodeBuilt {
            index: position,
            total: entries.len(),
            path: path.clone(),
            file_name: episode.cleaned_file_name(),
        });

        if !episode.can_be_renamed() {
            progress_callback(ProgressEvent::NotRenamable { path: path.clone() });
            continue;
        }

        if options.add_to_index {
            if let Err(e) = index.add_episode(&mut episode) {
                warn!(path = %path.display(), error = %e, "episode not added to index");
                progress_callback(ProgressEvent::IndexRejected {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }

            progress_callback(ProgressEvent::AddedToIndex {
                series: episode.series.clone(),
                language: episode.language.clone(),
                file_name: episode.cleaned_file_name(),
            });
        }

        renameable.push(episode);
    }

    progress_callback(ProgressEvent::Complete {
        renameable: renameable.len(),
    });

    Ok(renameable)
}

/// Moves episodes to `dest_dir` under their cleaned file names
///
/// The first failing rename aborts; episodes renamed before stay renamed.
///
/// # Returns
///
/// The new paths of the episode files
pub fn rename_episodes<F>(
    episodes: &[Episode],
    dest_dir: &Path,
    mut progress_callback: F,
) -> Result<Vec<PathBuf>, SeriesError>
where
    F: FnMut(ProgressEvent),
{
    let mut destinations = Vec::with_capacity(episodes.len());

    for episode in episodes {
        let size = fs::metadata(&episode.episode_file).ok().map(|m| m.len());
        let destination = episode.rename(dest_dir)?;
        debug!(destination = %destination.display(), "episode renamed");

        progress_callback(ProgressEvent::EpisodeRenamed {
            series: episode.series.clone(),
            file_name: episode.cleaned_file_name(),
            destination: destination.clone(),
            size,
        });

        destinations.push(destination);
    }

    Ok(destinations)
}
