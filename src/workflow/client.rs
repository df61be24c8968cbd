//! An authenticated client for GitHub REST API.

use reqwest::{
    RequestBuilder, StatusCode,
    header::{self, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    Error, Result,
    config::input,
    workflow::{WorkflowRuns, Workflows},
};

/// The public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("return-dispatch/", env!("CARGO_PKG_VERSION"));

/// A page of a paginated listing.
pub trait Page: DeserializeOwned {
    /// The listed item.
    type Item;

    /// Returns the number of items across all pages.
    fn total_count(&self) -> u64;

    /// Returns the items on this page.
    fn into_items(self) -> Vec<Self::Item>;
}

impl Page for Workflows {
    type Item = super::Workflow;

    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn into_items(self) -> Vec<Self::Item> {
        self.workflows
    }
}

impl Page for WorkflowRuns {
    type Item = super::WorkflowRun;

    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn into_items(self) -> Vec<Self::Item> {
        self.workflow_runs
    }
}

/// Builds requests for GitHub REST API with the token and API version set once.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Creates a client authenticating with `token` against the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the token cannot be sent as a header, or [`Error::Request`] if the HTTP client
    /// cannot be built.
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::config(input::TOKEN, "contains characters not allowed in a header"))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        headers.insert(header::AUTHORIZATION, authorization);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Returns the absolute URL of an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Builds a `GET` request for an API path.
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    /// Builds a `POST` request for an API path.
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Fetches and parses a JSON resource, requiring a `200 OK` response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on any other status, or [`Error::Request`] if the request fails or the body does not parse.
    pub async fn get_json<T>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!("{operation}: fetching {}…", self.url(path));

        let response = self.get(path).query(query).send().await?;
        match response.status() {
            StatusCode::OK => Ok(response.json::<T>().await?),
            status => Err(Error::Http {
                operation,
                status: status.as_u16(),
            }),
        }
    }

    /// Fetches every page of a listing, `per_page` items at a time.
    ///
    /// Stops once `total_count` items are collected or a page comes back empty.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`Self::get_json`].
    pub async fn paginate<P>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
        per_page: u8,
    ) -> Result<Vec<P::Item>>
    where
        P: Page,
    {
        let mut items = Vec::new();

        for page in 1_u32.. {
            let mut page_query = query.to_vec();
            page_query.push(("per_page", per_page.to_string()));
            page_query.push(("page", page.to_string()));

            let body: P = self.get_json(operation, path, &page_query).await?;
            let total_count = body.total_count();
            let batch = body.into_items();
            let fetched = batch.len();
            items.extend(batch);

            debug!(
                "{operation}: fetched page {page} ({fetched} items, {} / {total_count})",
                items.len()
            );
            if fetched == 0 || items.len() as u64 >= total_count {
                break;
            }
        }

        Ok(items)
    }
}
