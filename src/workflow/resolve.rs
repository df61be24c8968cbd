//! Resolves a workflow file name to its numeric id.

use tracing::debug;

use crate::{
    Error, Result,
    context::Context,
    workflow::{Workflow, Workflows},
};

/// Finds the id of the first workflow whose path contains `filename`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if no workflow path contains `filename`.
pub fn find_workflow_id(workflows: &[Workflow], filename: &str) -> Result<u64> {
    workflows
        .iter()
        .find(|workflow| workflow.path.contains(filename))
        .map(|workflow| workflow.id)
        .ok_or_else(|| Error::not_found(format!("unable to find the id of workflow {filename}")))
}

/// Lists the repository's workflows and resolves `filename` to a workflow id.
///
/// This is read-only and safe to retry.
///
/// # Errors
///
/// Returns [`Error::Http`] if listing the workflows fails, or [`Error::NotFound`] if no workflow matches.
pub async fn resolve_workflow_id(cx: &Context, filename: &str) -> Result<u64> {
    let workflows = cx
        .client
        .paginate::<Workflows>("list workflows", &cx.repo_path("/actions/workflows"), &[], 100)
        .await?;
    debug!(
        "fetched workflows of {}/{}: [{}]",
        cx.config.owner,
        cx.config.repo,
        workflows
            .iter()
            .map(|workflow| workflow.path.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    find_workflow_id(&workflows, filename)
}
