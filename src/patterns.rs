//! Filename pattern matching
//!
//! This module extracts season, episode, series and episode name fragments
//! from the names of downloaded episode files and directories.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Episode patterns in priority order
///
/// The anchored `SxxEyy` form must be tried before the loose numeric form,
/// which would otherwise swallow names like "Show.S01E02".
static EPISODE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // S01E01
        Regex::new(r"(?i)^(?P<series>.*)S(?P<season>[0-9]+)E(?P<episode>[0-9]+)(?P<name>.*)$")
            .unwrap(),
        // 101; 1212
        Regex::new(r"(?i)^(?P<series>.*[^0-9])(?P<season>[0-9]+)(?P<episode>[0-9]{2})(?P<name>.*)$")
            .unwrap(),
        // 1x1; 12x12
        Regex::new(r"(?i)^(?P<series>.*)(?P<season>[0-9]+)x(?P<episode>[0-9]+)(?P<name>.*)$")
            .unwrap(),
    ]
});

/// Names that already carry the canonical `S01E01 - Name.ext` form
static CANONICAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^S[0-9]+E[0-9]+.-.\w+.*\.\w+$").unwrap());

static EPISODE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^S(?P<season>[0-9]+)E(?P<episode>[0-9]+)$").unwrap());

static MULTIPLE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// The raw fragments recovered from a file or directory name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMatch {
    /// Everything in front of the season/episode marker, uncleaned
    pub series: String,
    /// The season number
    pub season: u32,
    /// The episode number within the season
    pub episode: u32,
    /// Everything behind the season/episode marker, uncleaned and
    /// including a possible file extension
    pub episode_name: String,
}

impl EpisodeMatch {
    fn from_captures(captures: &Captures<'_>) -> Option<Self> {
        Some(Self {
            series: captures["series"].to_string(),
            season: captures["season"].parse().ok()?,
            episode: captures["episode"].parse().ok()?,
            episode_name: captures["name"].to_string(),
        })
    }
}

/// Extracts episode information from a file or directory name
///
/// The patterns are tried in order and the first one that matches wins.
/// A digit run too large to be a season or episode number does not count
/// as a match.
///
/// # Examples
///
/// ```
/// let info = series::extract("Show.S01E02.Name.mkv").unwrap();
/// assert_eq!((info.season, info.episode), (1, 2));
/// assert_eq!(info.series, "Show.");
/// ```
pub fn extract(filename: &str) -> Option<EpisodeMatch> {
    EPISODE_PATTERNS.iter().find_map(|pattern| {
        let captures = pattern.captures(filename)?;
        EpisodeMatch::from_captures(&captures)
    })
}

/// Returns true if the name carries any usable season/episode information
pub fn is_interesting(filename: &str) -> bool {
    extract(filename).is_some()
}

/// Returns true for names that are already in the renamed form
pub fn is_canonical_name(filename: &str) -> bool {
    CANONICAL_NAME.is_match(filename)
}

/// Parses a bare episode code like `S01E05` into `(season, episode)`
pub fn parse_episode_code(code: &str) -> Option<(u32, u32)> {
    let captures = EPISODE_CODE.captures(code)?;
    Some((
        captures["season"].parse().ok()?,
        captures["episode"].parse().ok()?,
    ))
}

/// Turns a raw name fragment into readable words
///
/// Dots and dashes become spaces, whitespace runs collapse into one space
/// and both ends are trimmed.
pub fn clean_fragment(fragment: &str) -> String {
    let spaced = fragment.replace(['-', '.'], " ");
    MULTIPLE_WHITESPACE
        .replace_all(&spaced, " ")
        .trim()
        .to_string()
}
