use chrono::Utc;
use tracing::info;

use crate::{
    Result,
    config::{Dispatch, WorkflowRef},
    context::Context,
    marker::DistinctMarker,
    workflow::{
        WorkflowRun,
        dispatch::{dispatch_repository_event, dispatch_workflow},
        resolve::resolve_workflow_id,
        runs::{RunFilter, discover_run},
    },
};

/// Output name of the discovered run id.
pub const RUN_ID_OUTPUT: &str = "run-id";
/// Output name of the discovered run URL.
pub const RUN_URL_OUTPUT: &str = "run-url";

/// How an invocation ended.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The workflow was dispatched and discovery was disabled.
    Dispatched,
    /// The workflow was dispatched and its run was found.
    Discovered(WorkflowRun),
}

impl Outcome {
    /// Returns the named outputs to publish. Empty unless a run was discovered.
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Dispatched => Vec::new(),
            Self::Discovered(run) => vec![
                (RUN_ID_OUTPUT, run.id.to_string()),
                (RUN_URL_OUTPUT, run.html_url.clone()),
            ],
        }
    }
}

/// Dispatches the configured workflow exactly once and, if enabled, discovers the run it created.
///
/// A filename workflow is first resolved to its id under the configured backoff. Once the dispatch went out it is never
/// repeated or undone, even if discovery fails afterwards.
///
/// See: [`dispatch_workflow`], [`dispatch_repository_event`], [`discover_run`]
///
/// # Errors
///
/// Returns the first error of any step unchanged.
pub async fn return_dispatch(cx: &Context, marker: &DistinctMarker) -> Result<Outcome> {
    let backoff = &cx.config.backoff;
    info!(
        "backoff: starting delay {}ms, max attempts {}, time multiple {}",
        backoff.starting_delay.as_millis(),
        backoff.max_attempts,
        backoff.time_multiple
    );

    let marker_to_send = cx.config.discover.then_some(marker);

    let (filter, started_at) = match &cx.config.dispatch {
        Dispatch::Workflow { git_ref, workflow } => {
            let workflow_id = match workflow {
                WorkflowRef::Id(id) => *id,
                WorkflowRef::Filename(filename) => {
                    info!("fetching workflow id for {filename}…");
                    let id = backoff
                        .execute("resolve workflow id", || resolve_workflow_id(cx, filename))
                        .await?;
                    info!("fetched workflow id {id} for {filename}");
                    id
                }
            };

            let started_at = Utc::now();
            dispatch_workflow(cx, workflow_id, git_ref, marker_to_send).await?;
            (
                RunFilter::Workflow {
                    workflow_id,
                    git_ref: git_ref.as_str(),
                },
                started_at,
            )
        }
        Dispatch::Repository { event_type } => {
            let started_at = Utc::now();
            dispatch_repository_event(cx, event_type, marker_to_send).await?;
            (RunFilter::Repository, started_at)
        }
    };

    if !cx.config.discover {
        info!("workflow dispatched, skipping run discovery");
        return Ok(Outcome::Dispatched);
    }

    info!("discovering run with distinct id {marker}…");
    let run = discover_run(cx, &filter, marker, started_at).await?;
    info!("identified run {run}");

    Ok(Outcome::Discovered(run))
}
