pub mod types;

pub use types::{PrState, PullRequest, Repository, Visibility};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::GitHubConfig;

/// Page size requested for every listing call. Only the first page is read.
pub const PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Account name must not be empty")]
    InvalidAccount,

    #[error("Invalid GitHub API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("Failed to parse GitHub API response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GitHubError {
    /// Short tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            GitHubError::InvalidAccount | GitHubError::InvalidBaseUrl(_) => "config",
            GitHubError::Transport(_) => "transport",
            GitHubError::Status { .. } => "status",
            GitHubError::Parse(_) => "parse",
        }
    }
}

/// Read side of the hosting API that the aggregator depends on.
///
/// The `try_*` calls keep the error kind. The plain calls follow the
/// reporting policy: errors are logged and collapse to an empty list.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn try_list_repositories(
        &self,
        account: &str,
        visibility: Visibility,
    ) -> Result<Vec<Repository>, GitHubError>;

    async fn try_list_pull_requests(
        &self,
        account: &str,
        repository: &str,
        state: PrState,
    ) -> Result<Vec<PullRequest>, GitHubError>;

    #[cfg_attr(not(test), allow(dead_code))]
    async fn list_repositories(&self, account: &str, visibility: Visibility) -> Vec<Repository> {
        match self.try_list_repositories(account, visibility).await {
            Ok(repositories) => repositories,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "repository listing failed");
                Vec::new()
            }
        }
    }

    async fn list_pull_requests(
        &self,
        account: &str,
        repository: &str,
        state: PrState,
    ) -> Vec<PullRequest> {
        match self.try_list_pull_requests(account, repository, state).await {
            Ok(pull_requests) => pull_requests,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, repo = %repository, "pull request listing failed");
                Vec::new()
            }
        }
    }
}

/// REST client for the GitHub v3 API.
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    /// API URL for `segments` under the base URL. Each segment is
    /// percent-encoded, so a `/` or `?` inside a name stays inside it.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let invalid = || GitHubError::InvalidBaseUrl(self.api_base.clone());
        let mut url = Url::parse(&self.api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GitHubError> {
        let mut request = self
            .client
            .get(url.clone())
            .query(query)
            .header("User-Agent", "pr-notify")
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!(url = %url, "requesting page from GitHub API");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GitHubError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let items: Vec<T> = serde_json::from_str(&body)?;
        debug!(items = items.len(), "received page");
        if items.len() >= PER_PAGE {
            warn!(url = %url, per_page = PER_PAGE, "page is full, further results are not fetched");
        }
        Ok(items)
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    /// Fetch the first page of repositories visible to the token.
    ///
    /// Uses `GET /user/repos`, which is the only listing that includes
    /// private repositories; `account` is checked but does not narrow the call.
    #[instrument(skip_all, fields(account = %account, visibility = %visibility))]
    async fn try_list_repositories(
        &self,
        account: &str,
        visibility: Visibility,
    ) -> Result<Vec<Repository>, GitHubError> {
        if account.is_empty() {
            return Err(GitHubError::InvalidAccount);
        }
        let url = self.endpoint(&["user", "repos"])?;
        let query = [
            ("type", visibility.to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];
        self.get_page(url, &query).await
    }

    /// Fetch the first page of pull requests for one repository.
    #[instrument(skip_all, fields(account = %account, repo = %repository, state = %state))]
    async fn try_list_pull_requests(
        &self,
        account: &str,
        repository: &str,
        state: PrState,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        if account.is_empty() {
            return Err(GitHubError::InvalidAccount);
        }
        let url = self.endpoint(&["repos", account, repository, "pulls"])?;
        let query = [
            ("state", state.to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
        ];
        self.get_page(url, &query).await
    }
}
