//! GitHub REST API client
//!
//! Minimal client shared by the GitHub-backed sources.

use crate::Result;
use chrono::{DateTime, Utc};
use ohno::{AppError, app_err};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

/// Public GitHub API endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const LOG_TARGET: &str = "    github";

/// Outcome of a GitHub API call.
#[derive(Debug)]
pub enum ApiResult<T> {
    /// The request succeeded and the body was decoded.
    Success(T),

    /// The repository is gone, moved, or blocked, so asking again will not help.
    Gone(StatusCode),

    /// The request failed; a later attempt may succeed.
    Failed(AppError),
}

/// Authenticated GitHub API client.
///
/// Redirects are not followed: GitHub answers a renamed repository with `301`,
/// which is reported as [`ApiResult::Gone`] so the repository is skipped under its
/// old name.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    /// Create a client with an optional authentication token and API base URL.
    pub fn new(token: Option<&str>, base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent("collect-signals")
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with the given query parameters and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        let url = format!("{}{path}", self.base_url);
        log::trace!(target: LOG_TARGET, "GET {url}");

        let resp = match self.client.get(&url).query(query).send().await {
            Ok(r) => r,
            Err(e) => return ApiResult::Failed(app_err!("request to '{url}' failed: {e}")),
        };

        let status = resp.status();
        if status.is_success() {
            return match resp.json::<T>().await {
                Ok(body) => ApiResult::Success(body),
                Err(e) => ApiResult::Failed(app_err!("could not decode response from '{url}': {e}")),
            };
        }

        match status.as_u16() {
            301 | 404 | 410 | 451 => ApiResult::Gone(status),
            403 | 429 => {
                let reset = rate_limit_reset(resp.headers()).map_or_else(String::new, |at| format!(", resets at {at}"));
                ApiResult::Failed(app_err!("rate limited by GitHub ({status}){reset}"))
            }
            _ => ApiResult::Failed(app_err!("request to '{url}' failed with status {status}")),
        }
    }
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    DateTime::from_timestamp(reset_timestamp, 0)
}
