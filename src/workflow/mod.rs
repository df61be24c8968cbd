//! Data models of GitHub Actions workflows and the calls that dispatch and find them.

use std::fmt::Display;

use serde::{Deserialize, Deserializer};

pub mod client;
pub mod dispatch;
pub mod refs;
pub mod resolve;
pub mod runs;

/// Represents a GitHub Actions workflow run from GitHub REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    /// The run id.
    pub id: u64,
    /// The run name. Empty if GitHub reports none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// The run's page on GitHub.
    pub html_url: String,
}

impl Display for WorkflowRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} at {})", self.name, self.id, self.html_url)
    }
}

/// Represents workflow runs from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowRuns {
    /// The number of runs matching the query across all pages.
    pub total_count: u64,
    /// The runs on this page.
    pub workflow_runs: Vec<WorkflowRun>,
}

/// Represents a workflow from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Workflow {
    /// The workflow id.
    pub id: u64,
    /// The workflow name.
    pub name: String,
    /// The workflow file path, like `.github/workflows/build.yml`.
    pub path: String,
}

/// Represents workflows from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Workflows {
    /// The number of workflows across all pages.
    pub total_count: u64,
    /// The workflows on this page.
    pub workflows: Vec<Workflow>,
}

/// Represents a repository from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Repository {
    /// The branch `repository_dispatch` workflows run from.
    pub default_branch: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
