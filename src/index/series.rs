//! Series and their per-language episode sets
//!
//! The entry lists are the source of truth. The lookup maps next to them
//! are rebuilt from those lists after every structural change and are never
//! written to disk.

use crate::patterns::extract;
use std::collections::HashMap;

/// Language assumed for episode sets that do not name one
pub const DEFAULT_LANGUAGE: &str = "de";

/// A watched episode as stored in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeEntry {
    /// Canonical file name of the episode, e.g. `S01E01 - Pilot.avi`
    pub name: String,
    /// Marks every episode before this one as watched
    pub all_before: bool,
}

impl EpisodeEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            all_before: false,
        }
    }

    /// An entry that covers all episodes before `season`/`episode`
    pub fn all_before(season: u32, episode: u32) -> Self {
        Self {
            name: format!("S{season:02}E{episode:02} - Pre-First.mov"),
            all_before: true,
        }
    }
}

/// Derived lookup of an episode set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EpisodeLookup {
    /// (season, episode) -> file name
    files: HashMap<(u32, u32), String>,
    /// Position of the all-before entry, the last flagged entry wins
    barrier: Option<(u32, u32)>,
}

impl EpisodeLookup {
    fn build(entries: &[EpisodeEntry]) -> Self {
        let mut lookup = Self::default();

        for entry in entries {
            // Entries whose name carries no episode information are kept
            // in the list but cannot be looked up
            let Some(info) = extract(&entry.name) else {
                continue;
            };

            let key = (info.season, info.episode);
            lookup.files.insert(key, entry.name.clone());

            if entry.all_before {
                lookup.barrier = Some(key);
            }
        }

        lookup
    }
}

/// Sort key of an episode within a series
fn ordinal(season: u32, episode: u32) -> u64 {
    u64::from(season) * 100 + u64::from(episode)
}

/// The watched episodes of a series in one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeSet {
    language: String,
    entries: Vec<EpisodeEntry>,
    lookup: EpisodeLookup,
}

impl EpisodeSet {
    /// Creates an episode set; an empty language stands for [`DEFAULT_LANGUAGE`]
    pub fn new(language: impl Into<String>, entries: Vec<EpisodeEntry>) -> Self {
        let lookup = EpisodeLookup::build(&entries);
        Self {
            language: language.into(),
            entries,
            lookup,
        }
    }

    /// The effective language of this set
    pub fn language(&self) -> &str {
        if self.language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            &self.language
        }
    }

    /// The language exactly as stored, possibly empty
    pub fn stored_language(&self) -> &str {
        &self.language
    }

    pub fn entries(&self) -> &[EpisodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The stored file name of an episode, if it has an explicit entry
    pub fn file_name(&self, season: u32, episode: u32) -> Option<&str> {
        self.lookup.files.get(&(season, episode)).map(String::as_str)
    }

    /// Returns true if the episode has an explicit entry
    pub fn contains(&self, season: u32, episode: u32) -> bool {
        self.lookup.files.contains_key(&(season, episode))
    }

    /// The episode carrying the all-before flag
    pub fn barrier(&self) -> Option<(u32, u32)> {
        self.lookup.barrier
    }

    /// Returns true if the episode lies strictly before the all-before barrier
    pub fn barrier_covers(&self, season: u32, episode: u32) -> bool {
        self.lookup
            .barrier
            .is_some_and(|(s, e)| ordinal(season, episode) < ordinal(s, e))
    }

    /// Returns true if the episode counts as watched in this language
    pub fn is_watched(&self, season: u32, episode: u32) -> bool {
        self.contains(season, episode) || self.barrier_covers(season, episode)
    }

    pub(crate) fn push(&mut self, entry: EpisodeEntry) {
        self.entries.push(entry);
        self.lookup = EpisodeLookup::build(&self.entries);
    }
}

/// Maps each effective language to the position of its episode set
///
/// Should a language appear twice, the later set wins.
fn language_lookup(episode_sets: &[EpisodeSet]) -> HashMap<String, usize> {
    episode_sets
        .iter()
        .enumerate()
        .map(|(position, set)| (set.language().to_string(), position))
        .collect()
}

/// A watched series with its aliases and per-language episode sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    name: String,
    aliases: Vec<String>,
    episode_sets: Vec<EpisodeSet>,
    languages: HashMap<String, usize>,
}

impl Series {
    pub fn new(
        name: impl Into<String>,
        aliases: Vec<String>,
        episode_sets: Vec<EpisodeSet>,
    ) -> Self {
        let languages = language_lookup(&episode_sets);
        Self {
            name: name.into(),
            aliases,
            episode_sets,
            languages,
        }
    }

    /// The canonical name of the series
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn episode_sets(&self) -> &[EpisodeSet] {
        &self.episode_sets
    }

    /// The canonical name followed by all aliases
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// The languages this series is watched in, in stored order
    pub fn languages(&self) -> Vec<&str> {
        self.episode_sets
            .iter()
            .enumerate()
            .filter(|(position, set)| self.languages.get(set.language()) == Some(position))
            .map(|(_, set)| set.language())
            .collect()
    }

    pub fn episode_set(&self, language: &str) -> Option<&EpisodeSet> {
        self.languages
            .get(language)
            .map(|&position| &self.episode_sets[position])
    }

    pub(crate) fn episode_set_mut(&mut self, language: &str) -> Option<&mut EpisodeSet> {
        let position = *self.languages.get(language)?;
        self.episode_sets.get_mut(position)
    }

    pub(crate) fn add_alias(&mut self, alias: impl Into<String>) {
        self.aliases.push(alias.into());
    }
}
