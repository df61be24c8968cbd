//! Finds the run a dispatch created by looking for the distinct marker in run names.
//!
//! GitHub does not return the run from a dispatch call, so recent runs are listed and scanned
//! until one carries the marker. Runs show up asynchronously, so an empty or non-matching
//! listing means "not yet" and is retried.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use tracing::debug;

use crate::{
    Error, Result,
    config::DispatchMethod,
    context::Context,
    marker::DistinctMarker,
    workflow::{Repository, WorkflowRun, WorkflowRuns, refs::branch_name_from_ref},
};

/// How far before the dispatch a run may appear to have been created, for clock skew between runner and GitHub.
pub const CLOCK_DRIFT_TOLERANCE_SECS: i64 = 5;

const BRANCH_PAGE_SIZE: u8 = 5;
const UNFILTERED_PAGE_SIZE: u8 = 10;

/// Which runs to list when looking for a dispatched run.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFilter<'a> {
    /// Runs of one workflow, on the branch of `git_ref` unless it is a tag.
    Workflow {
        /// The dispatched workflow.
        workflow_id: u64,
        /// The branch or tag it was dispatched on.
        git_ref: &'a str,
    },
    /// `repository_dispatch` runs on the default branch.
    Repository,
}

/// Returns the first run whose name contains the marker.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if no candidate carries the marker, including when there are no candidates.
pub fn find_dispatched_run<I>(candidates: I, marker: &DistinctMarker) -> Result<WorkflowRun>
where
    I: IntoIterator<Item = WorkflowRun>,
{
    candidates
        .into_iter()
        .find(|run| run.name.contains(marker.as_str()))
        .ok_or_else(|| Error::not_found(format!("unable to find a run named with {marker}")))
}

/// Fetches the repository's default branch.
///
/// # Errors
///
/// Returns [`Error::Http`] if the repository cannot be fetched.
pub async fn default_branch(cx: &Context) -> Result<String> {
    let repository: Repository = cx
        .client
        .get_json("get repository", &cx.repo_path(""), &[])
        .await?;
    debug!(
        "default branch of {}/{} is {}",
        cx.config.owner, cx.config.repo, repository.default_branch
    );
    Ok(repository.default_branch)
}

/// Lists the runs that may have been created by a dispatch started at `since`.
///
/// # Errors
///
/// Returns [`Error::Http`] if a listing fails.
pub async fn fetch_candidate_runs(
    cx: &Context,
    filter: &RunFilter<'_>,
    since: DateTime<Utc>,
) -> Result<Vec<WorkflowRun>> {
    let created = created_after(since);

    let (path, branch, query, per_page) = match *filter {
        RunFilter::Workflow {
            workflow_id,
            git_ref,
        } => {
            let path = cx.repo_path(&format!("/actions/workflows/{workflow_id}/runs"));
            match branch_name_from_ref(git_ref) {
                Some(branch) => (
                    path,
                    Some(branch.to_owned()),
                    vec![("created", created), ("branch", branch.to_owned())],
                    BRANCH_PAGE_SIZE,
                ),
                None => (path, None, vec![("created", created)], UNFILTERED_PAGE_SIZE),
            }
        }
        RunFilter::Repository => {
            // repository_dispatch can only be triggered from the default branch
            let branch = default_branch(cx).await?;
            (
                cx.repo_path("/actions/runs"),
                Some(branch.clone()),
                vec![
                    ("created", created),
                    ("branch", branch),
                    ("event", DispatchMethod::RepositoryDispatch.as_str().to_owned()),
                ],
                BRANCH_PAGE_SIZE,
            )
        }
    };

    let runs = cx
        .client
        .paginate::<WorkflowRuns>("list workflow runs", &path, &query, per_page)
        .await?;
    debug!(
        "fetched runs of {}/{} on branch {}: {:?}",
        cx.config.owner,
        cx.config.repo,
        branch.as_deref().unwrap_or("(any)"),
        runs.iter().map(|run| run.id).collect::<Vec<_>>()
    );

    Ok(runs)
}

/// Polls candidate runs until one carries the marker or the configured attempts run out.
///
/// # Errors
///
/// Returns [`Error::RetryExhausted`] if no run carried the marker in time, or the first non-retryable error.
pub async fn discover_run(
    cx: &Context,
    filter: &RunFilter<'_>,
    marker: &DistinctMarker,
    since: DateTime<Utc>,
) -> Result<WorkflowRun> {
    cx.config
        .backoff
        .execute("discover run", move || async move {
            let candidates = fetch_candidate_runs(cx, filter, since).await?;
            find_dispatched_run(candidates, marker)
        })
        .await
}

fn created_after(since: DateTime<Utc>) -> String {
    let floor = since - TimeDelta::seconds(CLOCK_DRIFT_TOLERANCE_SECS);
    format!(">{}", floor.to_rfc3339_opts(SecondsFormat::Millis, true))
}
