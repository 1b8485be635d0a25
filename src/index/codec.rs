//! XML persistence of the series index
//!
//! The document layout:
//!
//! ```xml
//! <seriesindex>
//!   <series name="Community">
//!     <episodes lang="en">
//!       <episode name="S03E00 - Pre-First.mov" all_before="true"/>
//!       <episode name="S03E01 - Biology 101.mkv"/>
//!     </episodes>
//!     <alias to="Comm"/>
//!   </series>
//! </seriesindex>
//! ```

use super::SeriesIndex;
use super::series::{EpisodeEntry, EpisodeSet, Series};
use crate::temp::write_atomically;
use quick_xml::se::Serializer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Errors that can occur while loading or saving the index
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The index file could not be read
    #[error("Failed to read series index {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// The index file is not a valid index document
    #[error("Failed to parse series index {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: quick_xml::DeError,
    },

    /// The index could not be turned into XML
    #[error("Failed to serialize series index: {0}")]
    SerializeFailed(#[from] quick_xml::SeError),

    /// The index file could not be written
    #[error("Failed to write series index {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "seriesindex")]
struct IndexDocument {
    #[serde(rename = "series", default)]
    series: Vec<SeriesElement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SeriesElement {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "episodes", default)]
    episode_sets: Vec<EpisodesElement>,
    #[serde(rename = "alias", default)]
    aliases: Vec<AliasElement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EpisodesElement {
    #[serde(rename = "@lang", default, skip_serializing_if = "String::is_empty")]
    language: String,
    #[serde(rename = "episode", default)]
    episodes: Vec<EpisodeElement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EpisodeElement {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@all_before", default, skip_serializing_if = "is_false")]
    all_before: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct AliasElement {
    #[serde(rename = "@to")]
    to: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<SeriesElement> for Series {
    fn from(element: SeriesElement) -> Self {
        let episode_sets = element
            .episode_sets
            .into_iter()
            .map(|set| {
                let entries = set
                    .episodes
                    .into_iter()
                    .map(|episode| EpisodeEntry {
                        name: episode.name,
                        all_before: episode.all_before,
                    })
                    .collect();
                EpisodeSet::new(set.language, entries)
            })
            .collect();
        let aliases = element.aliases.into_iter().map(|alias| alias.to).collect();

        Series::new(element.name, aliases, episode_sets)
    }
}

impl From<&Series> for SeriesElement {
    fn from(series: &Series) -> Self {
        Self {
            name: series.name().to_string(),
            episode_sets: series
                .episode_sets()
                .iter()
                .map(|set| EpisodesElement {
                    language: set.stored_language().to_string(),
                    episodes: set
                        .entries()
                        .iter()
                        .map(|entry| EpisodeElement {
                            name: entry.name.clone(),
                            all_before: entry.all_before,
                        })
                        .collect(),
                })
                .collect(),
            aliases: series
                .aliases()
                .iter()
                .map(|alias| AliasElement { to: alias.clone() })
                .collect(),
        }
    }
}

/// Parses an index document
pub(crate) fn from_xml(content: &str) -> Result<Vec<Series>, quick_xml::DeError> {
    let document: IndexDocument = quick_xml::de::from_str(content)?;
    Ok(document.series.into_iter().map(Series::from).collect())
}

/// Renders the series as an indented index document
pub(crate) fn to_xml(series: &[Series]) -> Result<String, quick_xml::SeError> {
    let document = IndexDocument {
        series: series.iter().map(SeriesElement::from).collect(),
    };

    let mut output = String::from(XML_DECLARATION);
    let mut serializer = Serializer::new(&mut output);
    serializer.indent(' ', 2);
    document.serialize(serializer)?;
    output.push('\n');

    Ok(output)
}

pub(crate) fn load(path: &Path) -> Result<SeriesIndex, PersistenceError> {
    let content = fs::read_to_string(path).map_err(|e| PersistenceError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let series = from_xml(&content).map_err(|e| PersistenceError::ParseFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(SeriesIndex::from_series(series))
}

pub(crate) fn save(index: &SeriesIndex, path: &Path) -> Result<(), PersistenceError> {
    let content = to_xml(index.series())?;

    write_atomically(path, content.as_bytes()).map_err(|e| PersistenceError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<seriesindex>
  <series name="Community">
    <episodes lang="en">
      <episode name="S03E00 - Pre-First.mov" all_before="true"></episode>
      <episode name="S03E01 - Biology 101.mkv"></episode>
    </episodes>
    <alias to="Comm"></alias>
    <episodes>
      <episode name="S01E01 - Pilot.avi"/>
    </episodes>
    <alias to="Unity"/>
  </series>
  <series name="Empty"/>
</seriesindex>
"#;

    #[test]
    fn test_parse_document() {
        let series = from_xml(DOCUMENT).unwrap();
        assert_eq!(series.len(), 2);

        let community = &series[0];
        assert_eq!(community.name(), "Community");
        assert_eq!(community.aliases(), ["Comm", "Unity"]);
        assert_eq!(community.languages(), vec!["en", "de"]);

        let en = community.episode_set("en").unwrap();
        assert_eq!(en.len(), 2);
        assert!(en.entries()[0].all_before);
        assert!(!en.entries()[1].all_before);
        assert_eq!(en.barrier(), Some((3, 0)));

        let de = community.episode_set("de").unwrap();
        assert_eq!(de.stored_language(), "");
        assert!(de.contains(1, 1));

        assert_eq!(series[1].name(), "Empty");
        assert!(series[1].episode_sets().is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert!(from_xml("<seriesindex></seriesindex>").unwrap().is_empty());
        assert!(from_xml("<seriesindex/>").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_document() {
        assert!(from_xml("<seriesindex><series></seriesindex>").is_err());
    }

    #[test]
    fn test_render_document() {
        let series = vec![Series::new(
            "Chuck",
            vec!["Chuckie".to_string()],
            vec![
                EpisodeSet::new("", vec![EpisodeEntry::all_before(1, 0)]),
                EpisodeSet::new("en", vec![EpisodeEntry::new("S01E01 - Pilot.mkv")]),
            ],
        )];

        let xml = to_xml(&series).unwrap();

        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains(r#"<series name="Chuck">"#));
        assert!(xml.contains(r#"<episode name="S01E00 - Pre-First.mov" all_before="true"/>"#));
        assert!(xml.contains(r#"<episode name="S01E01 - Pilot.mkv"/>"#));
        assert!(xml.contains(r#"<episodes lang="en">"#));
        assert!(xml.contains(r#"<alias to="Chuckie"/>"#));
        assert!(!xml.contains("all_before=\"false\""));
        assert!(!xml.contains("lang=\"\""));

        assert_eq!(from_xml(&xml).unwrap(), series);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, PersistenceError::ReadFailed { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.xml");
        fs::write(&path, r#"<seriesindex><series name="Chuck">"#).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::ParseFailed { .. }));
    }
}
