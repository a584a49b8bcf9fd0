use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Repository `type` filter accepted by `GET /user/repos`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    All,
    #[default]
    Private,
    Public,
    Owner,
    Member,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::All => write!(f, "all"),
            Visibility::Private => write!(f, "private"),
            Visibility::Public => write!(f, "public"),
            Visibility::Owner => write!(f, "owner"),
            Visibility::Member => write!(f, "member"),
        }
    }
}

/// Pull request `state` filter accepted by `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    #[default]
    Open,
    Closed,
    All,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Closed => write!(f, "closed"),
            PrState::All => write!(f, "all"),
        }
    }
}

/// A repository as returned by the repository listing endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Repository {
    /// Name, unique within the owning account
    pub name: String,
    pub private: bool,
    pub html_url: String,
    pub description: Option<String>,
}

/// Where a pull request sits in its lifecycle. GitHub reports merged pull
/// requests as `closed` with `merged_at` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Open,
    Closed,
    Merged,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Label {
    pub name: String,
}

/// A pull request as returned by the pull request listing endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(dead_code)]
pub struct PullRequest {
    /// PR number, unique within its repository
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    /// Raw state string ("open" or "closed")
    pub state: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullRequest {
    pub fn author(&self) -> &str {
        &self.user.login
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.merged_at.is_some() {
            Lifecycle::Merged
        } else if self.state == "closed" {
            Lifecycle::Closed
        } else {
            Lifecycle::Open
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pull_json() -> serde_json::Value {
        json!({
            "number": 7,
            "title": "Fix bug",
            "body": "",
            "state": "open",
            "user": { "login": "alice" },
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "html_url": "https://x/a/pull/7",
            "draft": false,
            "labels": [{ "name": "bug", "color": "d73a4a" }],
            "head": { "ref": "fix" }
        })
    }

    #[test]
    fn test_pull_request_deserialize_ignores_extra_fields() {
        let pr: PullRequest = serde_json::from_value(pull_json()).unwrap();
        assert_eq!(pr.number, 7);
        assert_eq!(pr.author(), "alice");
        assert_eq!(pr.labels, vec![Label { name: "bug".to_string() }]);
        assert!(!pr.draft);
        assert_eq!(pr.mergeable, None);
        assert_eq!(pr.lifecycle(), Lifecycle::Open);
    }

    #[test]
    fn test_lifecycle_merged_is_closed_with_merged_at() {
        let mut value = pull_json();
        value["state"] = json!("closed");
        let closed: PullRequest = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(closed.lifecycle(), Lifecycle::Closed);

        value["merged_at"] = json!("2024-01-03T00:00:00Z");
        let merged: PullRequest = serde_json::from_value(value).unwrap();
        assert_eq!(merged.lifecycle(), Lifecycle::Merged);
    }

    #[test]
    fn test_repository_null_description() {
        let repo: Repository = serde_json::from_value(json!({
            "name": "repo-a",
            "private": true,
            "html_url": "https://x/a",
            "description": null
        }))
        .unwrap();
        assert_eq!(repo.name, "repo-a");
        assert!(repo.private);
        assert!(repo.description.is_none());
    }

    #[test]
    fn test_filter_display_matches_wire_values() {
        assert_eq!(Visibility::Private.to_string(), "private");
        assert_eq!(Visibility::Member.to_string(), "member");
        assert_eq!(PrState::Open.to_string(), "open");
        assert_eq!(PrState::All.to_string(), "all");
    }
}
