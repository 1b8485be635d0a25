//! User supplied shell hooks
//!
//! Hooks are shell command lines from the configuration. They run through
//! `/bin/sh -c` with inherited output, and a failing hook never stops the
//! processing of episodes.

use crate::config::Config;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{info, warn};

pub(crate) const SHELL: &str = "/bin/sh";

/// Errors that can occur while running a hook
#[derive(Debug, Error)]
pub enum HookError {
    /// The shell could not be started
    #[error("Failed to run hook '{command}': {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    /// The hook exited unsuccessfully
    #[error("Hook '{command}' ended with {status}")]
    Failed { command: String, status: ExitStatus },
}

/// Runs a command line through the shell, passing `args` as `$1`, `$2`, ...
pub fn run_hook(command: &str, args: &[&str]) -> Result<(), HookError> {
    let status = Command::new(SHELL)
        .arg("-c")
        .arg(command)
        // $0 of the inline script
        .arg("sh")
        .args(args)
        .stdin(Stdio::null())
        .status()
        .map_err(|e| HookError::SpawnFailed {
            command: command.to_string(),
            source: e,
        })?;

    if !status.success() {
        return Err(HookError::Failed {
            command: command.to_string(),
            status,
        });
    }

    Ok(())
}

/// The hooks configured for a rename run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hooks {
    pre_processing: String,
    post_processing: String,
    episode: String,
}

impl Hooks {
    pub fn new(
        pre_processing: impl Into<String>,
        post_processing: impl Into<String>,
        episode: impl Into<String>,
    ) -> Self {
        Self {
            pre_processing: pre_processing.into(),
            post_processing: post_processing.into(),
            episode: episode.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.pre_processing_hook.as_str(),
            config.post_processing_hook.as_str(),
            config.episode_hook.as_str(),
        )
    }

    /// Runs the hook configured to run before episodes are processed
    pub fn pre_processing(&self) -> bool {
        Self::call("pre-processing", &self.pre_processing, &[])
    }

    /// Runs the hook configured to run after all episodes were renamed
    pub fn post_processing(&self) -> bool {
        Self::call("post-processing", &self.post_processing, &[])
    }

    /// Runs the episode hook with the new file name and the series name
    pub fn episode(&self, file_name: &str, series: &str) -> bool {
        if self.episode.is_empty() {
            return false;
        }
        let command = format!("{} \"$1\" \"$2\"", self.episode);
        Self::call("episode", &command, &[file_name, series])
    }

    /// Returns true if a configured hook ran successfully
    fn call(kind: &str, command: &str, args: &[&str]) -> bool {
        if command.is_empty() {
            return false;
        }

        info!(hook = kind, "calling hook");
        match run_hook(command, args) {
            Ok(()) => true,
            Err(e) => {
                warn!(hook = kind, error = %e, "hook failed");
                false
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_hook() {
        assert!(run_hook("true", &[]).is_ok());
        assert!(matches!(
            run_hook("exit 3", &[]).unwrap_err(),
            HookError::Failed { .. }
        ));
    }

    #[test]
    fn test_empty_hooks_are_skipped() {
        let hooks = Hooks::default();
        assert!(!hooks.pre_processing());
        assert!(!hooks.post_processing());
        assert!(!hooks.episode("S01E01 - Pilot.mkv", "Chuck"));
    }

    #[test]
    fn test_failing_hook_is_reported() {
        let hooks = Hooks::new("false", "true", "");
        assert!(!hooks.pre_processing());
        assert!(hooks.post_processing());
    }

    #[test]
    fn test_episode_hook_arguments() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.txt");

        let hooks = Hooks::new(
            "",
            "",
            format!("printf '%s|%s' > '{}'", out.display()),
        );
        assert!(hooks.episode("S01E01 - Pilot with spaces.mkv", "Chuck"));

        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "S01E01 - Pilot with spaces.mkv|Chuck"
        );
    }

    #[test]
    fn test_hooks_from_config() {
        let config = Config {
            pre_processing_hook: "echo pre".to_string(),
            episode_hook: "/usr/local/bin/notify".to_string(),
            ..Default::default()
        };

        assert_eq!(
            Hooks::from_config(&config),
            Hooks::new("echo pre", "", "/usr/local/bin/notify")
        );
    }
}
