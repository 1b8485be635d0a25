//! Series name extraction
//!
//! Release names often carry abbreviated or prefixed series names
//! ("tvp-egagement", "RoEG8p"). Extractors produce candidate names for an
//! episode, which the series index then tries one by one until a candidate
//! resolves to a known series.

use crate::episode::Episode;
use crate::hooks::SHELL;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while asking an extractor for names
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The extractor script could not be started
    #[error("Failed to spawn name extractor {script}: {source}")]
    SpawnFailed {
        script: String,
        source: std::io::Error,
    },

    /// The extractor script exited unsuccessfully
    #[error("Name extractor {script} failed with exit code {code:?}: {stderr}")]
    ScriptFailed {
        script: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The extractor script wrote something that is not UTF-8
    #[error("Invalid UTF-8 in output of name extractor {script}")]
    InvalidOutput { script: String },
}

/// Trait for strategies that generate possible series names for an episode
///
/// Extractors are consulted in the order they were registered with the
/// index, and the candidates of one extractor in the order returned.
pub trait SeriesNameExtractor {
    /// Returns candidate series names for the episode, best guess first
    fn names(&self, episode: &Episode) -> Result<Vec<String>, ExtractorError>;
}

/// Derives series names from the path of the episode
///
/// Besides the series parsed from the episode itself, every path element
/// between a download directory and the video file inside it is parsed as
/// an episode of its own. Elements without episode information are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemExtractor;

impl SeriesNameExtractor for FilesystemExtractor {
    fn names(&self, episode: &Episode) -> Result<Vec<String>, ExtractorError> {
        let mut names = vec![episode.series.clone()];

        if !episode.is_directory() {
            return Ok(names);
        }

        let Ok(sub_path) = episode.episode_file.strip_prefix(&episode.path) else {
            return Ok(names);
        };

        let mut current = episode.path.clone();
        for component in sub_path.components() {
            current.push(component);

            match Episode::from_path(&current) {
                Ok(sub_episode) => names.push(sub_episode.series),
                Err(e) => debug!(path = %current.display(), error = %e, "no series name in path element"),
            }
        }

        Ok(names)
    }
}

/// Asks an external program for series names
///
/// The configured command line runs through `/bin/sh`, so it may carry its
/// own arguments (`ruby /path/names.rb`). The absolute path of the video file
/// and `{season}_{episode}` are appended as two more arguments. The program
/// prints one candidate per line.
#[derive(Debug, Clone)]
pub struct ScriptExtractor {
    script: String,
}

impl ScriptExtractor {
    /// Creates an extractor running the given command line
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// The command line this extractor runs
    pub fn script(&self) -> &str {
        &self.script
    }
}

impl SeriesNameExtractor for ScriptExtractor {
    fn names(&self, episode: &Episode) -> Result<Vec<String>, ExtractorError> {
        let media_path = std::path::absolute(&episode.episode_file)
            .unwrap_or_else(|_| episode.episode_file.clone());

        let output = Command::new(SHELL)
            .arg("-c")
            .arg(format!("{} \"$1\" \"$2\"", self.script))
            // $0 of the inline script
            .arg("sh")
            .arg(&media_path)
            .arg(format!("{}_{}", episode.season, episode.episode))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ExtractorError::SpawnFailed {
                script: self.script.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ExtractorError::ScriptFailed {
                script: self.script.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| ExtractorError::InvalidOutput {
            script: self.script.clone(),
        })?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_names_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir
            .path()
            .join("RoEG8p.713")
            .join("Rules.of.Engagement.S07E13.100th.GERMAN.DL.DUBBED");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("tvp-egagement-s07e13-1080p.mkv"), "abcksfvfddvhfjv").unwrap();
        fs::write(nested.join("tvp-egagement-s07e13-1080p.nfo"), "abc").unwrap();

        let episode = Episode::from_path(temp_dir.path().join("RoEG8p.713")).unwrap();
        let names = FilesystemExtractor.names(&episode).unwrap();

        assert_eq!(
            names,
            vec!["RoEG8p", "Rules of Engagement", "tvp egagement"]
        );
    }

    #[test]
    fn test_names_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Criminal.Minds.S01E01.Testtest.mkv");
        fs::write(&path, "").unwrap();

        let episode = Episode::from_path(&path).unwrap();
        let names = FilesystemExtractor.names(&episode).unwrap();

        assert_eq!(names, vec!["Criminal Minds"]);
    }

    #[test]
    fn test_names_skip_uninteresting_path_elements() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("HMM8p.909").join("extras");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            nested.join("How.I.Met.Your.Mother.S09E09.Platonish.1080p.WEB-DL.DD5.mkv"),
            "abcksfvfddvhfjvdhfvjdhfv",
        )
        .unwrap();

        let episode = Episode::from_path(temp_dir.path().join("HMM8p.909")).unwrap();
        let names = FilesystemExtractor.names(&episode).unwrap();

        assert_eq!(names, vec!["HMM8p", "How I Met Your Mother"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_script_extractor_output() {
        let episode = Episode {
            season: 1,
            episode: 9,
            episode_file: PathBuf::from("/downloads/episode.mkv"),
            ..Default::default()
        };

        let names = ScriptExtractor::new("/bin/echo").names(&episode).unwrap();
        assert_eq!(names, vec!["/downloads/episode.mkv 1_9"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_script_extractor_failures() {
        let episode = Episode::default();

        let err = ScriptExtractor::new("/bin/false").names(&episode).unwrap_err();
        assert!(matches!(err, ExtractorError::ScriptFailed { code: Some(1), .. }));

        // the shell reports a missing program as 127
        let err = ScriptExtractor::new("/nonexistent/extractor")
            .names(&episode)
            .unwrap_err();
        assert!(matches!(err, ExtractorError::ScriptFailed { code: Some(127), .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_script_extractor_with_arguments() {
        let episode = Episode {
            season: 7,
            episode: 13,
            episode_file: PathBuf::from("/downloads/My Show/episode.mkv"),
            ..Default::default()
        };

        let names = ScriptExtractor::new("printf '%s|%s|%s\\n' Prefix")
            .names(&episode)
            .unwrap();
        assert_eq!(names, vec!["Prefix|/downloads/My Show/episode.mkv|7_13"]);
    }
}
