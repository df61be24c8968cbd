//! Dispatches a workflow through `workflow_dispatch` or `repository_dispatch`.
//!
//! Both calls have side effects on GitHub and are sent exactly once. They are never wrapped in
//! [`crate::framework::BackoffPolicy`].

use serde_json::{Map, Value, json};
use tracing::info;

use crate::{Error, Result, config::DispatchMethod, context::Context, marker::DistinctMarker};

/// The payload key the distinct marker is sent under.
pub const DISTINCT_ID_KEY: &str = "distinct_id";

/// Statuses accepted from a workflow dispatch. GitHub has answered with both.
pub const WORKFLOW_DISPATCH_ACCEPTED: &[u16] = &[200, 204];

/// Statuses accepted from a repository dispatch.
pub const REPOSITORY_DISPATCH_ACCEPTED: &[u16] = &[204];

/// Copies `inputs` and adds the marker under [`DISTINCT_ID_KEY`] if one is given.
pub fn payload_with_marker(
    inputs: &Map<String, Value>,
    marker: Option<&DistinctMarker>,
) -> Map<String, Value> {
    let mut payload = inputs.clone();
    if let Some(marker) = marker {
        payload.insert(DISTINCT_ID_KEY.to_owned(), Value::from(marker.as_str()));
    }
    payload
}

/// Dispatches a workflow on `git_ref` with the configured inputs.
///
/// # Errors
///
/// Returns [`Error::Dispatch`] if the status is not in [`WORKFLOW_DISPATCH_ACCEPTED`], or [`Error::Request`] if the request
/// cannot be sent.
pub async fn dispatch_workflow(
    cx: &Context,
    workflow_id: u64,
    git_ref: &str,
    marker: Option<&DistinctMarker>,
) -> Result<()> {
    let inputs = payload_with_marker(&cx.config.inputs, marker);
    let body = json!({ "ref": git_ref, "inputs": inputs });

    send(
        cx,
        DispatchMethod::WorkflowDispatch,
        &cx.repo_path(&format!("/actions/workflows/{workflow_id}/dispatches")),
        &body,
        WORKFLOW_DISPATCH_ACCEPTED,
    )
    .await?;

    let inputs = Value::Object(inputs);
    info!(
        "dispatched workflow {workflow_id} on {git_ref} in {}/{} using workflow_dispatch, inputs: {inputs}",
        cx.config.owner, cx.config.repo
    );
    Ok(())
}

/// Sends a repository dispatch event of `event_type` with the configured inputs as client payload.
///
/// # Errors
///
/// Returns [`Error::Dispatch`] if the status is not in [`REPOSITORY_DISPATCH_ACCEPTED`], or [`Error::Request`] if the
/// request cannot be sent.
pub async fn dispatch_repository_event(
    cx: &Context,
    event_type: &str,
    marker: Option<&DistinctMarker>,
) -> Result<()> {
    let client_payload = payload_with_marker(&cx.config.inputs, marker);
    let body = json!({ "event_type": event_type, "client_payload": client_payload });

    send(
        cx,
        DispatchMethod::RepositoryDispatch,
        &cx.repo_path("/dispatches"),
        &body,
        REPOSITORY_DISPATCH_ACCEPTED,
    )
    .await?;

    let client_payload = Value::Object(client_payload);
    info!(
        "dispatched event {event_type} to {}/{} using repository_dispatch, client payload: {client_payload}",
        cx.config.owner, cx.config.repo
    );
    Ok(())
}

async fn send(
    cx: &Context,
    method: DispatchMethod,
    path: &str,
    body: &Value,
    accepted: &'static [u16],
) -> Result<()> {
    let response = cx.client.post(path).json(body).send().await?;
    let status = response.status().as_u16();

    if accepted.contains(&status) {
        Ok(())
    } else {
        Err(Error::Dispatch {
            method,
            status,
            expected: accepted,
        })
    }
}
