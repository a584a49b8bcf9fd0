mod config;
mod github;
mod report;
mod slack;

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use github::{GitHubClient, PrState, Visibility};
use report::AggregationResult;
use slack::{Color, SlackNotifier};

/// PR Notify collects pull requests across every repository of a GitHub
/// account and posts the list to a Slack channel.
#[derive(Parser, Debug)]
#[command(name = "pr-notify", version, about)]
struct Cli {
    /// Account whose repositories are scanned (defaults to the config value)
    #[arg(long)]
    owner: Option<String>,

    /// Pull request state to report
    #[arg(long, value_enum)]
    state: Option<PrState>,

    /// Repository type filter
    #[arg(long, value_enum)]
    visibility: Option<Visibility>,

    /// Config file path (defaults to ./.pr-notify.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Slack channel to post to (defaults to the config value)
    #[arg(long)]
    channel: Option<String>,

    /// Send the report as an attachment instead of plain text
    #[arg(long)]
    rich: bool,

    /// Also send a daily summary of the collected pull requests
    #[arg(long)]
    summary: bool,

    /// Also announce pull requests opened, merged or closed today
    #[arg(long)]
    announce: bool,

    /// Print the message instead of posting it
    #[arg(long)]
    dry_run: bool,
}

/// Delivery settings resolved from the CLI and config.
struct RunOptions {
    channel: String,
    alerts_channel: String,
    username: String,
    icon_emoji: String,
    report_color: Color,
    rich: bool,
    summary: bool,
    announce: bool,
}

/// Deliver everything one run produced and return how many posts succeeded.
///
/// A failed repository listing raises an alert instead of a report. An empty
/// report is not sent; the daily summary goes out regardless when requested.
async fn run(
    notifier: &SlackNotifier,
    result: &AggregationResult,
    options: &RunOptions,
    today: chrono::NaiveDate,
) -> usize {
    let mut delivered = 0;

    if let Some(failure) = result.listing_failure() {
        warn!(kind = failure.kind, "repository listing failed, sending alert");
        let notice = slack::error_notice(&format!(
            "Repository listing failed ({}): {}",
            failure.kind, failure.message
        ));
        if notifier.send_notice(&notice, &options.alerts_channel).await {
            delivered += 1;
        }
    }

    let message = report::format_message(result);
    if message.is_empty() {
        info!("no pull requests found in any repository, nothing to send");
    } else {
        let sent = if options.rich {
            let notice = slack::report_notice(result, &message, &options.report_color);
            notifier.send_notice(&notice, &options.channel).await
        } else {
            notifier
                .notify(&message, &options.channel, &options.username, &options.icon_emoji)
                .await
        };
        if sent {
            delivered += 1;
        } else {
            warn!("pull request report was not delivered");
        }

        if options.announce {
            for notice in slack::activity_notices(result, today) {
                if notifier.send_notice(&notice, &options.channel).await {
                    delivered += 1;
                }
            }
        }
    }

    if options.summary {
        let summary = report::Summary::from_result(result, today);
        if notifier
            .send_notice(&slack::daily_summary_notice(&summary), &options.channel)
            .await
        {
            delivered += 1;
        }
    }

    delivered
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load(cli.config.as_deref())?;

    let owner = cli.owner.clone().unwrap_or_else(|| config.owner().to_string());
    let state = cli.state.unwrap_or(config.report.state);
    let visibility = cli.visibility.unwrap_or(config.report.visibility);
    let channel = cli.channel.clone().unwrap_or_else(|| config.slack.channel.clone());

    let _main_span = info_span!("pr_notify", owner = %owner, state = %state, visibility = %visibility).entered();

    let github = GitHubClient::new(&config.github);
    let notifier = SlackNotifier::new(config.slack.webhook_url.clone());
    let result = report::aggregate(&github, &owner, state, visibility).await;
    let today = chrono::Utc::now().date_naive();

    if cli.dry_run {
        report::print_preview(&report::format_message(&result));
        return Ok(());
    }

    let options = RunOptions {
        channel,
        alerts_channel: config.slack.alerts_channel.clone(),
        username: config.slack.username.clone(),
        icon_emoji: config.slack.icon_emoji.clone(),
        report_color: config.slack.report_color.clone(),
        rich: cli.rich,
        summary: cli.summary,
        announce: cli.announce,
    };
    let delivered = run(&notifier, &result, &options, today).await;
    info!(delivered, "notifications sent");

    let repositories: Vec<&str> = result.keys().collect();
    info!(?repositories, pull_requests = result.total_pull_requests(), "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitHubConfig;
    use crate::github::tests::{test_pull_request, test_repository};
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> RunOptions {
        RunOptions {
            channel: "#general".to_string(),
            alerts_channel: "#alerts".to_string(),
            username: "Bot".to_string(),
            icon_emoji: ":robot_face:".to_string(),
            report_color: Color::Good,
            rich: false,
            summary: false,
            announce: false,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn notifier_for(server: &MockServer) -> SlackNotifier {
        SlackNotifier::new(Some(format!("{}/hook", server.uri())))
    }

    #[tokio::test]
    async fn test_empty_result_posts_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = AggregationResult::new(PrState::Open);
        let delivered = run(&notifier_for(&server), &result, &options(), today()).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_report_posted_once_as_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({ "channel": "#general", "username": "Bot" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut result = AggregationResult::new(PrState::Open);
        result.insert(
            test_repository("repo-a", None),
            vec![test_pull_request("repo-a", 7, "Fix bug")],
        );
        let delivered = run(&notifier_for(&server), &result, &options(), today()).await;
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_rich_announce_and_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let mut result = AggregationResult::new(PrState::Open);
        result.insert(
            test_repository("repo-a", None),
            vec![test_pull_request("repo-a", 7, "Fix bug")],
        );
        let opts = RunOptions {
            rich: true,
            summary: true,
            announce: true,
            ..options()
        };
        // report, one "new pull request" notice, daily summary
        let delivered = run(&notifier_for(&server), &result, &opts, today()).await;
        assert_eq!(delivered, 3);
    }

    #[tokio::test]
    async fn test_unauthorized_listing_sends_one_alert() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "channel": "#alerts",
                "attachments": [{ "title": "🚨 Error Alert", "color": "danger" }]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let github = GitHubClient::new(&GitHubConfig {
            token: Some("expired".to_string()),
            api_base: server.uri(),
            owner: None,
        });
        let result = report::aggregate(&github, "alice", PrState::Open, Visibility::Private).await;
        assert!(result.is_empty());

        let delivered = run(&notifier_for(&server), &result, &options(), today()).await;
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_idle_account_sends_no_alert() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let github = GitHubClient::new(&GitHubConfig {
            token: Some("valid".to_string()),
            api_base: server.uri(),
            owner: None,
        });
        let result = report::aggregate(&github, "alice", PrState::Open, Visibility::Private).await;
        assert!(result.listing_failure().is_none());
        assert_eq!(run(&notifier_for(&server), &result, &options(), today()).await, 0);
    }
}
