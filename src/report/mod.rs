pub mod types;

pub use types::{AggregationResult, Summary};

use chrono::SecondsFormat;
use colored::Colorize;
use tracing::{debug, info, instrument, warn};

use crate::github::{PrState, PullRequestSource, Visibility};

/// Placeholder rendered for repositories without a description.
pub const NO_DESCRIPTION: &str = "No description";

const SEPARATOR_WIDTH: usize = 50;

/// Collect every matching pull request across the account's repositories.
///
/// Repositories are visited one at a time in the order the source lists them.
/// Repositories without matching pull requests are left out. When the listing
/// is empty no pull request calls are made; when it failed, the empty result
/// carries the failure so the caller can tell it apart from an idle account.
#[instrument(skip_all, fields(account = %account, state = %state, visibility = %visibility))]
pub async fn aggregate(
    source: &dyn PullRequestSource,
    account: &str,
    state: PrState,
    visibility: Visibility,
) -> AggregationResult {
    info!("searching repositories");
    let repositories = match source.try_list_repositories(account, visibility).await {
        Ok(repositories) => repositories,
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "repository listing failed");
            return AggregationResult::failed(state, &e);
        }
    };

    let mut result = AggregationResult::new(state);
    if repositories.is_empty() {
        info!("no repositories found");
        return result;
    }
    info!(repositories = repositories.len(), "found repositories");

    for repository in repositories {
        let pull_requests = source
            .list_pull_requests(account, &repository.name, state)
            .await;
        let name = repository.name.clone();
        let private = repository.private;
        let count = pull_requests.len();
        if result.insert(repository, pull_requests) {
            debug!(repo = %name, private, pull_requests = count, "pull requests found");
        } else {
            debug!(repo = %name, private, "no pull requests");
        }
    }

    info!(
        repositories = result.len(),
        pull_requests = result.total_pull_requests(),
        "aggregation complete"
    );
    result
}

/// Render an aggregation as a plain-text chat message.
///
/// Returns an empty string when there is nothing to report. Output depends on
/// the input alone.
pub fn format_message(result: &AggregationResult) -> String {
    if result.is_empty() {
        return String::new();
    }

    let separator = "=".repeat(SEPARATOR_WIDTH);
    let mut msg = match result.state {
        PrState::All => "*All pull requests:*\n".to_string(),
        state => format!("*All {state} pull requests:*\n"),
    };

    for entry in result.iter() {
        let repo = &entry.repository;
        msg.push_str(&format!("📁 Repository: {}\n", repo.name));
        msg.push_str(&format!("   URL: {}\n", repo.html_url));
        msg.push_str(&format!(
            "   Description: {}\n",
            repo.description.as_deref().unwrap_or(NO_DESCRIPTION)
        ));
        msg.push_str(&format!("   PR count: {}\n", entry.pull_requests.len()));
        msg.push_str(&format!("{separator}\n"));

        for pr in &entry.pull_requests {
            let created = pr.created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
            msg.push_str(&format!("  #{} - {}\n", pr.number, pr.title));
            msg.push_str(&format!("    Author: {}\n", pr.author()));
            msg.push_str(&format!("    Body: {}\n", pr.body.as_deref().unwrap_or("")));
            msg.push_str(&format!("    Created: {created}\n"));
            msg.push_str(&format!("    URL: {}\n", pr.html_url));
            msg.push_str(&format!("{separator}\n"));
        }
    }

    msg
}

/// Print a message to the terminal with light highlighting, for `--dry-run`.
pub fn print_preview(message: &str) {
    if message.is_empty() {
        println!("{}", "Nothing to report.".dimmed());
        return;
    }
    for line in message.lines() {
        if line.starts_with('*') {
            println!("{}", line.bold());
        } else if line.starts_with("📁") {
            println!("{}", line.cyan().bold());
        } else if line.starts_with("  #") {
            println!("{}", line.green());
        } else if line.chars().all(|c| c == '=') {
            println!("{}", line.dimmed());
        } else {
            println!("{line}");
        }
    }
}
