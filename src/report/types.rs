use chrono::NaiveDate;

use crate::github::types::{Lifecycle, PrState, PullRequest, Repository};
use crate::github::GitHubError;

/// One repository together with its matching pull requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryPulls {
    pub repository: Repository,
    pub pull_requests: Vec<PullRequest>,
}

/// Why the repository listing produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFailure {
    /// Error kind tag, see `GitHubError::kind`
    pub kind: &'static str,
    pub message: String,
}

impl From<&GitHubError> for ListingFailure {
    fn from(e: &GitHubError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Cross-repository view built by one aggregation run.
///
/// Entries keep the order in which repositories were listed, and every entry
/// holds at least one pull request. A failed repository listing leaves the
/// result empty and is recorded in `listing_failure`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    /// State filter the pull requests were fetched with
    pub state: PrState,
    entries: Vec<RepositoryPulls>,
    listing_failure: Option<ListingFailure>,
}

impl AggregationResult {
    pub fn new(state: PrState) -> Self {
        Self {
            state,
            entries: Vec::new(),
            listing_failure: None,
        }
    }

    /// Empty result for a run whose repository listing failed.
    pub fn failed(state: PrState, error: &GitHubError) -> Self {
        Self {
            state,
            entries: Vec::new(),
            listing_failure: Some(error.into()),
        }
    }

    pub fn listing_failure(&self) -> Option<&ListingFailure> {
        self.listing_failure.as_ref()
    }

    /// Add a repository's pull requests. Returns false, leaving the result
    /// untouched, when the list is empty.
    pub fn insert(&mut self, repository: Repository, pull_requests: Vec<PullRequest>) -> bool {
        if pull_requests.is_empty() {
            return false;
        }
        self.entries.push(RepositoryPulls {
            repository,
            pull_requests,
        });
        true
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&RepositoryPulls> {
        self.entries.iter().find(|e| e.repository.name == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.repository.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryPulls> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pull requests across all repositories.
    pub fn total_pull_requests(&self) -> usize {
        self.entries.iter().map(|e| e.pull_requests.len()).sum()
    }
}

/// Counts reported by the daily summary notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub date: NaiveDate,
    pub total_prs: usize,
    /// Created on `date` (UTC)
    pub new_prs: usize,
    pub merged_prs: usize,
    /// Closed without being merged
    pub closed_prs: usize,
}

impl Summary {
    pub fn from_result(result: &AggregationResult, date: NaiveDate) -> Self {
        let mut summary = Summary {
            date,
            total_prs: 0,
            new_prs: 0,
            merged_prs: 0,
            closed_prs: 0,
        };
        for pr in result.iter().flat_map(|e| e.pull_requests.iter()) {
            summary.total_prs += 1;
            if pr.created_at.date_naive() == date {
                summary.new_prs += 1;
            }
            match pr.lifecycle() {
                Lifecycle::Merged => summary.merged_prs += 1,
                Lifecycle::Closed => summary.closed_prs += 1,
                Lifecycle::Open => {}
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::tests::{test_pull_request, test_repository};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_insert_rejects_empty_list() {
        let mut result = AggregationResult::new(PrState::Open);
        assert!(!result.insert(test_repository("empty", None), vec![]));
        assert!(result.is_empty());
        assert!(result.get("empty").is_none());
    }

    #[test]
    fn test_insert_keeps_order_and_counts() {
        let mut result = AggregationResult::new(PrState::Open);
        assert!(result.insert(
            test_repository("b", None),
            vec![test_pull_request("b", 1, "one"), test_pull_request("b", 2, "two")],
        ));
        assert!(result.insert(test_repository("a", None), vec![test_pull_request("a", 3, "three")]));
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.total_pull_requests(), 3);
        assert_eq!(result.get("a").unwrap().pull_requests[0].number, 3);
    }

    #[test]
    fn test_summary_counts_lifecycle_and_new() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let fresh = test_pull_request("r", 1, "fresh");
        let mut old = test_pull_request("r", 2, "old");
        old.created_at = Utc.with_ymd_and_hms(2023, 12, 30, 8, 0, 0).unwrap();
        let mut merged = test_pull_request("r", 3, "merged");
        merged.state = "closed".to_string();
        merged.merged_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap());
        let mut closed = test_pull_request("r", 4, "closed");
        closed.state = "closed".to_string();

        let mut result = AggregationResult::new(PrState::All);
        result.insert(test_repository("r", None), vec![fresh, old, merged, closed]);

        let summary = Summary::from_result(&result, today);
        assert_eq!(
            summary,
            Summary {
                date: today,
                total_prs: 4,
                new_prs: 3,
                merged_prs: 1,
                closed_prs: 1,
            }
        );
    }

    #[test]
    fn test_failed_result_is_empty_and_keeps_kind() {
        let err = GitHubError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            url: "https://api.github.com/user/repos".to_string(),
        };
        let result = AggregationResult::failed(PrState::Open, &err);
        assert!(result.is_empty());
        let failure = result.listing_failure().unwrap();
        assert_eq!(failure.kind, "status");
        assert!(failure.message.contains("401"));
        assert!(AggregationResult::new(PrState::Open).listing_failure().is_none());
    }

    #[test]
    fn test_summary_of_empty_result() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let summary = Summary::from_result(&AggregationResult::new(PrState::Open), today);
        assert_eq!(summary.total_prs, 0);
        assert_eq!(summary.new_prs, 0);
    }
}
