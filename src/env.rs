//! Reads inputs from and writes outputs to the GitHub Actions runner environment.

#![cfg(feature = "env")]

use crate::{config::Inputs, static_lazy_lock, workflow::client::DEFAULT_API_URL};

use std::{
    env,
    ffi::OsString,
    fs::OpenOptions,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use uuid::Uuid;

static_lazy_lock! {
    /// The GitHub REST API base URL, overridden by `GITHUB_API_URL` on GitHub Enterprise Server.
    pub API_URL: String = env::var("GITHUB_API_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
}

static_lazy_lock! {
    /// Whether the runner has debug logging enabled.
    pub RUNNER_DEBUG: bool = env::var("RUNNER_DEBUG").is_ok_and(|value| value == "1");
}

/// Inputs passed to an action as `INPUT_<NAME>` environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvInputs;

impl Inputs for EnvInputs {
    fn raw(&self, name: &str) -> Option<String> {
        env::var(input_env_key(name)).ok()
    }
}

/// Returns the environment variable the runner stores an input in.
pub fn input_env_key(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Publishes a step output to the file named by `GITHUB_OUTPUT`.
///
/// Returns `false` without writing anything if `GITHUB_OUTPUT` is unset or empty.
///
/// # Errors
///
/// Returns an error if the output file cannot be written.
pub fn set_output(name: &str, value: &str) -> anyhow::Result<bool> {
    match output_file(env::var_os("GITHUB_OUTPUT")) {
        Some(path) => {
            write_output(&path, name, value)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn output_file(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|path| !path.is_empty()).map(PathBuf::from)
}

/// Appends an output to a runner output file using a heredoc delimiter, so values may span lines.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn write_output(path: &Path, name: &str, value: &str) -> anyhow::Result<()> {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open output file {}", path.display()))?;

    write!(file, "{name}<<{delimiter}\n{value}\n{delimiter}\n")
        .with_context(|| format!("failed to write output {name} to {}", path.display()))
}

/// Formats a workflow command that annotates the run with an error.
pub fn error_command(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{escaped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    #[test]
    fn input_keys_follow_runner_convention() {
        assert_eq!(input_env_key("workflow-inputs"), "INPUT_WORKFLOW-INPUTS");
        assert_eq!(input_env_key("event type"), "INPUT_EVENT_TYPE");
    }

    #[test]
    fn output_is_appended_with_delimiter() {
        let path = env::temp_dir().join(format!("return-dispatch-output-{}", Uuid::new_v4()));

        write_output(&path, "run-id", "42").unwrap();
        write_output(&path, "run-url", "https://github.com/42").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        drop(fs::remove_file(&path));

        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("run-id<<ghadelimiter_"));
        assert_eq!(lines[1], "42");
        assert_eq!(lines[2], lines[0].trim_start_matches("run-id<<"));
        assert!(lines[3].starts_with("run-url<<ghadelimiter_"));
        assert_eq!(lines[4], "https://github.com/42");
    }

    #[test]
    fn empty_output_file_is_ignored() {
        assert_eq!(output_file(None), None);
        assert_eq!(output_file(Some(OsString::new())), None);
        assert_eq!(
            output_file(Some(OsString::from("/tmp/github_output"))),
            Some(PathBuf::from("/tmp/github_output"))
        );
    }

    #[test]
    fn error_command_escapes_newlines() {
        assert_eq!(
            error_command("failed: 100%\nretry"),
            "::error::failed: 100%25%0Aretry"
        );
    }
}
