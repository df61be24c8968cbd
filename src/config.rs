//! Parses and cross-validates raw named inputs into a single immutable [`Config`].
//!
//! Validation happens before any network call. The dispatch-method-specific inputs live
//! inside [`Dispatch`], so a resolved [`Config`] always carries exactly one of the two groups.

use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt::{self, Display},
    hash::Hash,
    str::FromStr,
    time::Duration,
};

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    Error, Result,
    framework::{
        BackoffPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_STARTING_DELAY_MS, DEFAULT_TIME_MULTIPLE,
    },
};

/// Names of the recognised inputs.
pub mod input {
    /// Selects `workflow_dispatch` or `repository_dispatch`.
    pub const DISPATCH_METHOD: &str = "dispatch-method";
    /// Owner of the target repository.
    pub const OWNER: &str = "owner";
    /// Name of the target repository.
    pub const REPO: &str = "repo";
    /// GitHub API token.
    pub const TOKEN: &str = "token";
    /// Branch or tag to run the workflow on.
    pub const REF: &str = "ref";
    /// Workflow file name or numeric id.
    pub const WORKFLOW: &str = "workflow";
    /// Event type of a repository dispatch.
    pub const EVENT_TYPE: &str = "event-type";
    /// JSON object passed to the dispatched workflow.
    pub const WORKFLOW_INPUTS: &str = "workflow-inputs";
    /// Whether to discover the dispatched run.
    pub const DISCOVER: &str = "discover";
    /// Delay before the first retry, in milliseconds.
    pub const STARTING_DELAY_MS: &str = "starting-delay-ms";
    /// Maximum number of attempts of read-only requests.
    pub const MAX_ATTEMPTS: &str = "max-attempts";
    /// Growth factor of the delay between attempts.
    pub const TIME_MULTIPLE: &str = "time-multiple";
}

/// A source of raw named inputs.
pub trait Inputs {
    /// Returns the raw value of an input, or [`None`] if it was not supplied.
    fn raw(&self, name: &str) -> Option<String>;

    /// Returns the trimmed value of an input. A missing input reads as empty.
    fn input(&self, name: &str) -> String {
        self.raw(name)
            .map(|value| value.trim().to_owned())
            .unwrap_or_default()
    }
}

impl<K, V> Inputs for HashMap<K, V>
where
    K: Borrow<str> + Eq + Hash,
    V: AsRef<str>,
{
    fn raw(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| value.as_ref().to_owned())
    }
}

/// The mechanism used to trigger a remote workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMethod {
    /// Direct, branch- or tag-scoped dispatch of one workflow.
    WorkflowDispatch,
    /// Event-based dispatch, always run from the default branch.
    RepositoryDispatch,
}

impl DispatchMethod {
    /// Every supported method.
    pub const ALL: [Self; 2] = [Self::RepositoryDispatch, Self::WorkflowDispatch];

    /// Returns the name GitHub uses for this method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WorkflowDispatch => "workflow_dispatch",
            Self::RepositoryDispatch => "repository_dispatch",
        }
    }
}

impl Display for DispatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<_> = Self::ALL.iter().map(|method| method.as_str()).collect();
                Error::config(
                    input::DISPATCH_METHOD,
                    format!(
                        "allowed values are [{}], got '{s}'",
                        allowed.join(", ")
                    ),
                )
            })
    }
}

/// A workflow, identified by its numeric id or by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowRef {
    /// The numeric workflow id.
    Id(u64),
    /// The workflow file name, resolved to an id before dispatching.
    Filename(String),
}

impl WorkflowRef {
    /// Treats the value as an id only if it consists solely of decimal digits.
    ///
    /// A file name that merely starts with digits, like `1-release.yaml`, stays a file name.
    pub fn parse(value: &str) -> Self {
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = value.parse() {
                return Self::Id(id);
            }
        }
        Self::Filename(value.to_owned())
    }
}

impl Display for WorkflowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Filename(filename) => f.write_str(filename),
        }
    }
}

/// The dispatch-method-specific part of a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Dispatch one workflow on a branch or tag.
    Workflow {
        /// The branch or tag, like `main` or `refs/heads/main`.
        git_ref: String,
        /// The workflow to dispatch.
        workflow: WorkflowRef,
    },
    /// Send a repository dispatch event.
    Repository {
        /// The event type the remote workflow listens for.
        event_type: String,
    },
}

impl Dispatch {
    /// Returns the method this dispatch uses.
    pub const fn method(&self) -> DispatchMethod {
        match self {
            Self::Workflow { .. } => DispatchMethod::WorkflowDispatch,
            Self::Repository { .. } => DispatchMethod::RepositoryDispatch,
        }
    }
}

/// A validated configuration, built once per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// What to dispatch and how.
    pub dispatch: Dispatch,
    /// Owner of the target repository.
    pub owner: String,
    /// Name of the target repository.
    pub repo: String,
    /// GitHub API token.
    pub token: String,
    /// Inputs (or client payload) passed to the dispatched workflow.
    pub inputs: Map<String, Value>,
    /// Whether to discover the dispatched run.
    pub discover: bool,
    /// Retry tuning for read-only requests.
    pub backoff: BackoffPolicy,
}

impl Config {
    /// Resolves and validates a configuration from raw inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] naming the offending input, [`Error::PayloadParse`] if `workflow-inputs` is not a
    /// JSON object, or [`Error::TypeValidation`] if a `workflow_dispatch` input is not a string.
    pub fn resolve<I>(inputs: &I) -> Result<Self>
    where
        I: Inputs + ?Sized,
    {
        let method: DispatchMethod = required(inputs, input::DISPATCH_METHOD)?.parse()?;
        let owner = required(inputs, input::OWNER)?;
        let repo = required(inputs, input::REPO)?;
        let token = required(inputs, input::TOKEN)?;

        let git_ref = inputs.input(input::REF);
        let event_type = inputs.input(input::EVENT_TYPE);
        let workflow = inputs.input(input::WORKFLOW);

        let dispatch = match method {
            DispatchMethod::WorkflowDispatch => {
                if git_ref.is_empty() {
                    return Err(Error::config(
                        input::REF,
                        "a branch or tag is required for workflow_dispatch, like 'main' or 'refs/heads/main'",
                    ));
                }
                if !event_type.is_empty() {
                    return Err(Error::config(
                        input::EVENT_TYPE,
                        "not supported for workflow_dispatch",
                    ));
                }
                if workflow.is_empty() {
                    return Err(Error::config(
                        input::WORKFLOW,
                        "a workflow file name or id is required for workflow_dispatch",
                    ));
                }
                Dispatch::Workflow {
                    git_ref,
                    workflow: WorkflowRef::parse(&workflow),
                }
            }
            DispatchMethod::RepositoryDispatch => {
                if !git_ref.is_empty() {
                    return Err(Error::config(
                        input::REF,
                        "repository_dispatch always runs from the default branch, use workflow_dispatch for other branches",
                    ));
                }
                if event_type.is_empty() {
                    return Err(Error::config(
                        input::EVENT_TYPE,
                        "an event type is required for repository_dispatch",
                    ));
                }
                if !workflow.is_empty() {
                    return Err(Error::config(
                        input::WORKFLOW,
                        "not supported for repository_dispatch",
                    ));
                }
                Dispatch::Repository { event_type }
            }
        };

        Ok(Self {
            inputs: parse_workflow_inputs(&inputs.input(input::WORKFLOW_INPUTS), method)?,
            discover: parse_bool(input::DISCOVER, &inputs.input(input::DISCOVER))?,
            backoff: parse_backoff(inputs),
            dispatch,
            owner,
            repo,
            token,
        })
    }

    /// Returns the dispatch method in use.
    pub const fn method(&self) -> DispatchMethod {
        self.dispatch.method()
    }
}

fn required<I>(inputs: &I, name: &'static str) -> Result<String>
where
    I: Inputs + ?Sized,
{
    let value = inputs.input(name);
    if value.is_empty() {
        Err(Error::config(name, "input required and not supplied"))
    } else {
        Ok(value)
    }
}

/// Parses the `workflow-inputs` input. An empty value yields an empty map.
///
/// # Errors
///
/// Returns [`Error::PayloadParse`] if the value is not a JSON object, or [`Error::TypeValidation`] if a
/// `workflow_dispatch` value is not a string.
pub fn parse_workflow_inputs(raw: &str, method: DispatchMethod) -> Result<Map<String, Value>> {
    if raw.is_empty() {
        return Ok(Map::new());
    }

    let inputs = match serde_json::from_str(raw) {
        Ok(Value::Object(inputs)) => inputs,
        Ok(other) => {
            return Err(Error::PayloadParse {
                message: format!("expected a JSON object, got {}", json_type(&other)),
            });
        }
        Err(err) => {
            return Err(Error::PayloadParse {
                message: err.to_string(),
            });
        }
    };

    if method == DispatchMethod::WorkflowDispatch {
        if let Some((key, value)) = inputs.iter().find(|(_, value)| !value.is_string()) {
            return Err(Error::TypeValidation {
                key: key.clone(),
                actual: json_type(value),
                expected: "string",
            });
        }
    }

    Ok(inputs)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses a YAML 1.2 core-schema boolean, treating an empty value as `false`.
fn parse_bool(name: &'static str, raw: &str) -> Result<bool> {
    match raw {
        "" | "false" | "False" | "FALSE" => Ok(false),
        "true" | "True" | "TRUE" => Ok(true),
        _ => Err(Error::config(
            name,
            format!("expected one of true, True, TRUE, false, False, FALSE, got '{raw}'"),
        )),
    }
}

fn parse_backoff<I>(inputs: &I) -> BackoffPolicy
where
    I: Inputs + ?Sized,
{
    let starting_delay_ms = positive_or_default(
        input::STARTING_DELAY_MS,
        &inputs.input(input::STARTING_DELAY_MS),
        DEFAULT_STARTING_DELAY_MS as f64,
    );
    let max_attempts = positive_or_default(
        input::MAX_ATTEMPTS,
        &inputs.input(input::MAX_ATTEMPTS),
        DEFAULT_MAX_ATTEMPTS,
    );
    let time_multiple = positive_or_default(
        input::TIME_MULTIPLE,
        &inputs.input(input::TIME_MULTIPLE),
        DEFAULT_TIME_MULTIPLE,
    );

    BackoffPolicy {
        starting_delay: Duration::try_from_secs_f64(starting_delay_ms / 1000.0)
            .unwrap_or(Duration::from_millis(DEFAULT_STARTING_DELAY_MS)),
        max_attempts,
        time_multiple,
    }
}

/// Parses a positive number, falling back to `default` on anything else.
///
/// Backoff tuning only affects retry cadence, so a bad value is tolerated instead of rejected.
fn positive_or_default<T>(name: &str, raw: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Display + Copy,
{
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            if !raw.is_empty() {
                debug!("input '{name}' is not a positive number ('{raw}'), using {default}");
            }
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn workflow_dispatch() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (input::DISPATCH_METHOD, "workflow_dispatch"),
            (input::OWNER, "owner"),
            (input::REPO, "repository"),
            (input::TOKEN, "token"),
            (input::REF, "feature_branch"),
            (input::WORKFLOW, "workflow.yml"),
            (input::WORKFLOW_INPUTS, r#"{"hello":"world"}"#),
            (input::DISCOVER, "false"),
            (input::STARTING_DELAY_MS, "100"),
            (input::MAX_ATTEMPTS, "5"),
            (input::TIME_MULTIPLE, "2"),
        ])
    }

    fn repository_dispatch() -> HashMap<&'static str, &'static str> {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::DISPATCH_METHOD, "repository_dispatch");
        inputs.insert(input::EVENT_TYPE, "deploy");
        inputs.remove(input::REF);
        inputs.remove(input::WORKFLOW);
        inputs
    }

    fn invalid_field(inputs: &HashMap<&'static str, &'static str>) -> &'static str {
        match Config::resolve(inputs) {
            Err(Error::ConfigValidation { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn resolves_workflow_dispatch() {
        let config = Config::resolve(&workflow_dispatch()).unwrap();

        assert_eq!(
            config.dispatch,
            Dispatch::Workflow {
                git_ref: "feature_branch".into(),
                workflow: WorkflowRef::Filename("workflow.yml".into()),
            }
        );
        assert_eq!(config.method(), DispatchMethod::WorkflowDispatch);
        assert_eq!(config.owner, "owner");
        assert_eq!(config.repo, "repository");
        assert_eq!(config.token, "token");
        assert_eq!(Value::Object(config.inputs), json!({ "hello": "world" }));
        assert!(!config.discover);
        assert_eq!(
            config.backoff,
            BackoffPolicy {
                starting_delay: Duration::from_millis(100),
                max_attempts: 5,
                time_multiple: 2.0,
            }
        );
    }

    #[test]
    fn resolves_repository_dispatch() {
        let config = Config::resolve(&repository_dispatch()).unwrap();

        assert_eq!(
            config.dispatch,
            Dispatch::Repository {
                event_type: "deploy".into()
            }
        );
        assert_eq!(config.method(), DispatchMethod::RepositoryDispatch);
    }

    #[test]
    fn rejects_unsupported_dispatch_method() {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::DISPATCH_METHOD, "unsupported_dispatch_method");
        assert_eq!(invalid_field(&inputs), input::DISPATCH_METHOD);
    }

    #[test]
    fn requires_target_and_credentials() {
        for name in [input::OWNER, input::REPO, input::TOKEN] {
            let mut inputs = workflow_dispatch();
            inputs.insert(name, "  ");
            assert_eq!(invalid_field(&inputs), name);
        }
    }

    #[test]
    fn workflow_dispatch_requires_ref() {
        let mut inputs = workflow_dispatch();
        inputs.remove(input::REF);
        assert_eq!(invalid_field(&inputs), input::REF);
    }

    #[test]
    fn workflow_dispatch_forbids_event_type() {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::EVENT_TYPE, "deploy");
        assert_eq!(invalid_field(&inputs), input::EVENT_TYPE);
    }

    #[test]
    fn workflow_dispatch_requires_workflow() {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::WORKFLOW, "");
        assert_eq!(invalid_field(&inputs), input::WORKFLOW);
    }

    #[test]
    fn repository_dispatch_forbids_ref() {
        let mut inputs = repository_dispatch();
        inputs.insert(input::REF, "feature_branch");
        assert_eq!(invalid_field(&inputs), input::REF);
    }

    #[test]
    fn repository_dispatch_requires_event_type() {
        let mut inputs = repository_dispatch();
        inputs.insert(input::EVENT_TYPE, "");
        assert_eq!(invalid_field(&inputs), input::EVENT_TYPE);
    }

    #[test]
    fn repository_dispatch_forbids_workflow() {
        let mut inputs = repository_dispatch();
        inputs.insert(input::WORKFLOW, "workflow.yml");
        assert_eq!(invalid_field(&inputs), input::WORKFLOW);
    }

    #[test]
    fn numeric_workflow_is_an_id() {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::WORKFLOW, "123456");
        let config = Config::resolve(&inputs).unwrap();

        assert!(matches!(
            config.dispatch,
            Dispatch::Workflow {
                workflow: WorkflowRef::Id(123456),
                ..
            }
        ));
    }

    #[test]
    fn workflow_starting_with_digits_stays_a_filename() {
        assert_eq!(
            WorkflowRef::parse("1-release.yaml"),
            WorkflowRef::Filename("1-release.yaml".into())
        );
        assert_eq!(
            WorkflowRef::parse("123abc"),
            WorkflowRef::Filename("123abc".into())
        );
        assert_eq!(
            WorkflowRef::parse("99999999999999999999999"),
            WorkflowRef::Filename("99999999999999999999999".into())
        );
    }

    #[test]
    fn empty_workflow_inputs_yield_empty_map() {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::WORKFLOW_INPUTS, "");
        assert!(Config::resolve(&inputs).unwrap().inputs.is_empty());
    }

    #[test]
    fn malformed_workflow_inputs_fail_to_parse() {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::WORKFLOW_INPUTS, "{");
        assert!(matches!(
            Config::resolve(&inputs),
            Err(Error::PayloadParse { .. })
        ));

        inputs.insert(input::WORKFLOW_INPUTS, "[1, 2]");
        assert!(matches!(
            Config::resolve(&inputs),
            Err(Error::PayloadParse { .. })
        ));
    }

    #[test]
    fn workflow_dispatch_rejects_non_string_inputs() {
        for (raw, actual) in [(r#"{"hello":false}"#, "boolean"), (r#"{"hello":0}"#, "number")] {
            let mut inputs = workflow_dispatch();
            inputs.insert(input::WORKFLOW_INPUTS, raw);

            match Config::resolve(&inputs) {
                Err(Error::TypeValidation {
                    key,
                    actual: got,
                    expected,
                }) => {
                    assert_eq!(key, "hello");
                    assert_eq!(got, actual);
                    assert_eq!(expected, "string");
                }
                other => panic!("expected a type validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn repository_dispatch_accepts_any_json_values() {
        let mut inputs = repository_dispatch();
        inputs.insert(
            input::WORKFLOW_INPUTS,
            r#"{"hello":false,"count":0,"nested":{"a":[1]}}"#,
        );
        let config = Config::resolve(&inputs).unwrap();

        assert_eq!(
            Value::Object(config.inputs),
            json!({ "hello": false, "count": 0, "nested": { "a": [1] } })
        );
    }

    #[test]
    fn discover_accepts_core_schema_booleans() {
        for (raw, expected) in [("true", true), ("True", true), ("TRUE", true), ("FALSE", false)] {
            let mut inputs = workflow_dispatch();
            inputs.insert(input::DISCOVER, raw);
            assert_eq!(Config::resolve(&inputs).unwrap().discover, expected);
        }

        let mut inputs = workflow_dispatch();
        inputs.insert(input::DISCOVER, "yes");
        assert_eq!(invalid_field(&inputs), input::DISCOVER);
    }

    #[test]
    fn non_numeric_backoff_inputs_fall_back_to_defaults() {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::STARTING_DELAY_MS, "non-numeric-input");
        inputs.insert(input::MAX_ATTEMPTS, "non-numeric-input");
        inputs.insert(input::TIME_MULTIPLE, "non-numeric-input");

        assert_eq!(Config::resolve(&inputs).unwrap().backoff, BackoffPolicy::default());
    }

    #[test]
    fn each_backoff_input_falls_back_independently() {
        let mut inputs = workflow_dispatch();
        inputs.insert(input::MAX_ATTEMPTS, "0");
        let backoff = Config::resolve(&inputs).unwrap().backoff;

        assert_eq!(backoff.starting_delay, Duration::from_millis(100));
        assert_eq!(backoff.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(backoff.time_multiple, 2.0);
    }
}
