//! The context shared by every step of an invocation.

use crate::{Result, config::Config, workflow::client::GitHubClient};

/// A validated [`Config`] and the [`GitHubClient`] authenticated with its token.
///
/// Built once per invocation and only ever borrowed afterwards.
#[derive(Debug)]
pub struct Context {
    /// The validated configuration.
    pub config: Config,
    /// The authenticated API client.
    pub client: GitHubClient,
}

impl Context {
    /// Creates a context talking to the API at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built from the configured token.
    pub fn new(config: Config, api_url: &str) -> Result<Self> {
        let client = GitHubClient::new(&config.token, api_url)?;
        Ok(Self { config, client })
    }

    /// Returns the API path of the configured repository, followed by `suffix`.
    pub fn repo_path(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{suffix}", self.config.owner, self.config.repo)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use serde_json::Map;

    use crate::{
        config::{Config, Dispatch},
        framework::BackoffPolicy,
    };

    /// A configuration for `owner/repository` with fast retries.
    pub(crate) fn config(dispatch: Dispatch) -> Config {
        Config {
            dispatch,
            owner: "owner".into(),
            repo: "repository".into(),
            token: "token".into(),
            inputs: Map::new(),
            discover: true,
            backoff: BackoffPolicy {
                starting_delay: Duration::from_millis(1),
                max_attempts: 3,
                time_multiple: 1.0,
            },
        }
    }
}
