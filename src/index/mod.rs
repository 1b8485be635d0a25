//! The series index
//!
//! The index records which series are watched, in which languages, and which
//! episodes of them were already seen. It is consulted before renaming an
//! episode and updated afterwards.

mod codec;
mod series;

pub use codec::PersistenceError;
pub use series::{DEFAULT_LANGUAGE, EpisodeEntry, EpisodeSet, Series};

use crate::episode::Episode;
use crate::name_extractor::SeriesNameExtractor;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Coarse classification of index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidState,
}

/// Errors of index queries and mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// No series or alias matched the given name
    #[error("Series does not exist in index: {0}")]
    SeriesNotFound(String),

    /// A series or alias with the given name already exists
    #[error("Series does already exist in index: {0}")]
    SeriesAlreadyExists(String),

    /// The alias is already taken by a series or another alias
    #[error("Alias does already exist in index: {0}")]
    AliasAlreadyExists(String),

    /// The series has no episode set in the requested language
    #[error("Series {series} is not watched in language '{language}'")]
    LanguageNotWatched { series: String, language: String },

    /// The episode already has an explicit entry
    #[error("Episode S{season:02}E{episode:02} of {series} [{language}] is already in the index")]
    EpisodeAlreadyExists {
        series: String,
        language: String,
        season: u32,
        episode: u32,
    },
}

impl IndexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IndexError::SeriesNotFound(_) => ErrorKind::NotFound,
            IndexError::SeriesAlreadyExists(_)
            | IndexError::AliasAlreadyExists(_)
            | IndexError::EpisodeAlreadyExists { .. } => ErrorKind::AlreadyExists,
            IndexError::LanguageNotWatched { .. } => ErrorKind::InvalidState,
        }
    }
}

/// Maps every series name and alias to the position of its series
///
/// Duplicate names resolve to the later series.
fn name_lookup(series: &[Series]) -> HashMap<String, usize> {
    let mut names = HashMap::new();
    for (position, entry) in series.iter().enumerate() {
        for name in entry.all_names() {
            names.insert(name.to_string(), position);
        }
    }
    names
}

/// The collection of watched series
///
/// Name extractors registered with [`SeriesIndex::add_extractor`] are asked
/// for candidate names when an episode is added.
#[derive(Default)]
pub struct SeriesIndex {
    series: Vec<Series>,
    names: HashMap<String, usize>,
    extractors: Vec<Box<dyn SeriesNameExtractor>>,
}

impl fmt::Debug for SeriesIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesIndex")
            .field("series", &self.series)
            .field("extractors", &self.extractors.len())
            .finish()
    }
}

impl SeriesIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_series(series: Vec<Series>) -> Self {
        let names = name_lookup(&series);
        Self {
            series,
            names,
            extractors: Vec::new(),
        }
    }

    /// Loads an index from an XML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let index = codec::load(path)?;
        debug!(path = %path.display(), series = index.len(), "loaded series index");
        Ok(index)
    }

    /// Writes the index to an XML file, replacing it atomically
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        codec::save(self, path)?;
        debug!(path = %path.display(), series = self.len(), "wrote series index");
        Ok(())
    }

    /// Registers an extractor; extractors are asked in registration order
    pub fn add_extractor(&mut self, extractor: impl SeriesNameExtractor + 'static) {
        self.extractors.push(Box::new(extractor));
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Looks up a series by its exact name or alias
    pub fn get(&self, name: &str) -> Option<&Series> {
        self.names.get(name).map(|&position| &self.series[position])
    }

    /// Resolves a possibly mangled series name to a series position
    ///
    /// The exact name is tried first, then a case-insensitive match against
    /// all names and aliases. If neither matches, the leading word is
    /// dropped and the remainder tried again, so release prefixes like
    /// "tvp" do not prevent a match.
    fn resolve(&self, candidate: &str) -> Option<usize> {
        if let Some(&position) = self.names.get(candidate) {
            return Some(position);
        }

        let mut remaining = candidate.trim();
        while !remaining.is_empty() {
            let wanted = remaining.to_lowercase();
            let found = self
                .series
                .iter()
                .position(|series| series.all_names().any(|name| name.to_lowercase() == wanted));
            if found.is_some() {
                return found;
            }

            remaining = remaining.split_once(' ').map_or("", |(_, rest)| rest.trim_start());
        }

        None
    }

    /// Returns the canonical name of the series matching `candidate`
    ///
    /// # Examples
    ///
    /// ```
    /// use series::SeriesIndex;
    ///
    /// let mut index = SeriesIndex::new();
    /// index.add_series("The Big Bang Theory", "en", 1, 0).unwrap();
    ///
    /// assert_eq!(
    ///     index.series_name_in_index("tvp the big bang theory"),
    ///     Some("The Big Bang Theory")
    /// );
    /// assert_eq!(index.series_name_in_index("Chuck"), None);
    /// ```
    pub fn series_name_in_index(&self, candidate: &str) -> Option<&str> {
        self.resolve(candidate)
            .map(|position| self.series[position].name())
    }

    /// Returns true if the episode counts as watched in the given language
    ///
    /// An episode is watched if it has an explicit entry or lies before the
    /// all-before barrier of the episode set.
    pub fn is_episode_in_index(&self, series: &str, language: &str, season: u32, episode: u32) -> bool {
        self.resolve(series)
            .and_then(|position| self.series[position].episode_set(language))
            .is_some_and(|set| set.is_watched(season, episode))
    }

    /// Starts watching a series
    ///
    /// The new series gets a single episode set in `language` whose only
    /// entry marks everything before `season`/`episode` as watched.
    pub fn add_series(
        &mut self,
        name: &str,
        language: &str,
        season: u32,
        episode: u32,
    ) -> Result<(), IndexError> {
        if self.names.contains_key(name) {
            return Err(IndexError::SeriesAlreadyExists(name.to_string()));
        }

        let episode_set = EpisodeSet::new(language, vec![EpisodeEntry::all_before(season, episode)]);
        self.series
            .push(Series::new(name, Vec::new(), vec![episode_set]));
        self.names = name_lookup(&self.series);

        info!(series = name, language, "added series to index");
        Ok(())
    }

    /// Stops watching a series, identified by its canonical name
    pub fn remove_series(&mut self, name: &str) -> Result<(), IndexError> {
        let position = self
            .series
            .iter()
            .position(|series| series.name() == name)
            .ok_or_else(|| IndexError::SeriesNotFound(name.to_string()))?;

        self.series.remove(position);
        self.names = name_lookup(&self.series);

        info!(series = name, "removed series from index");
        Ok(())
    }

    /// Adds an alternative name to a series
    pub fn alias_series(&mut self, name: &str, alias: &str) -> Result<(), IndexError> {
        let &position = self
            .names
            .get(name)
            .ok_or_else(|| IndexError::SeriesNotFound(name.to_string()))?;

        if self.names.contains_key(alias) {
            return Err(IndexError::AliasAlreadyExists(alias.to_string()));
        }

        self.series[position].add_alias(alias);
        self.names = name_lookup(&self.series);

        info!(series = self.series[position].name(), alias, "added alias");
        Ok(())
    }

    /// The languages a series is watched in
    pub fn series_languages(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|series| series.languages().into_iter().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Fills in the language of an episode from the index
    ///
    /// A series watched in one language gets that language. Otherwise the
    /// languages in which the episode is still unwatched are candidates. If
    /// there is exactly one, it is taken. If there are several, the one
    /// whose previous episode is already watched wins, provided it is
    /// unique. In every other case the language stays untouched.
    pub fn guess_episode_language(&self, episode: &mut Episode, series: &str) {
        let Some(position) = self.resolve(series) else {
            return;
        };
        let series = &self.series[position];
        let languages = series.languages();

        if let [language] = languages.as_slice() {
            episode.language = language.to_string();
            return;
        }

        let watched = |language: &str, number: u32| {
            series
                .episode_set(language)
                .is_some_and(|set| set.is_watched(episode.season, number))
        };

        let unwatched: Vec<&str> = languages
            .iter()
            .copied()
            .filter(|language| !watched(*language, episode.episode))
            .collect();

        let guessed = match unwatched.as_slice() {
            [] => None,
            [language] => Some(*language),
            candidates => {
                let previous = if episode.episode > 1 {
                    episode.episode - 1
                } else {
                    episode.episode
                };
                let continued: Vec<&str> = candidates
                    .iter()
                    .copied()
                    .filter(|language| watched(*language, previous))
                    .collect();
                match continued.as_slice() {
                    [language] => Some(*language),
                    _ => None,
                }
            }
        };

        if let Some(language) = guessed {
            debug!(series = series.name(), language, "guessed episode language");
            episode.language = language.to_string();
        }
    }

    /// Resolves the series of an episode through the registered extractors
    ///
    /// Extractor failures are logged and skipped. Without any extractor
    /// match, the series name of the episode itself is tried.
    fn resolve_episode_series(&self, episode: &Episode) -> Option<usize> {
        for extractor in &self.extractors {
            match extractor.names(episode) {
                Ok(candidates) => {
                    if let Some(position) = candidates.iter().find_map(|name| self.resolve(name)) {
                        return Some(position);
                    }
                }
                Err(e) => warn!(error = %e, "series name extractor failed"),
            }
        }

        self.resolve(&episode.series)
    }

    /// Adds an episode to the index
    ///
    /// The series name of the episode is replaced by the canonical name from
    /// the index and a missing language is guessed.
    pub fn add_episode(&mut self, episode: &mut Episode) -> Result<(), IndexError> {
        let position = self
            .resolve_episode_series(episode)
            .ok_or_else(|| IndexError::SeriesNotFound(episode.series.clone()))?;

        let name = self.series[position].name().to_string();
        episode.series = name.clone();

        if episode.language.is_empty() {
            self.guess_episode_language(episode, &name);
        }

        let file_name = episode.cleaned_file_name();
        self.add_episode_manually(
            &name,
            &episode.language,
            episode.season,
            episode.episode,
            &file_name,
        )
    }

    /// Adds an episode entry without any name resolution or guessing
    ///
    /// `series` must be a series name or alias. Only an explicit entry of the
    /// same episode counts as duplicate; episodes covered by the all-before
    /// barrier can still be added.
    pub fn add_episode_manually(
        &mut self,
        series: &str,
        language: &str,
        season: u32,
        episode: u32,
        file_name: &str,
    ) -> Result<(), IndexError> {
        let &position = self
            .names
            .get(series)
            .ok_or_else(|| IndexError::SeriesNotFound(series.to_string()))?;

        let entry = &mut self.series[position];
        let name = entry.name().to_string();

        let set = entry
            .episode_set_mut(language)
            .ok_or_else(|| IndexError::LanguageNotWatched {
                series: name.clone(),
                language: language.to_string(),
            })?;

        if set.contains(season, episode) {
            return Err(IndexError::EpisodeAlreadyExists {
                series: name,
                language: language.to_string(),
                season,
                episode,
            });
        }

        set.push(EpisodeEntry::new(file_name));

        info!(series = %name, language, season, episode, "added episode to index");
        Ok(())
    }
}
