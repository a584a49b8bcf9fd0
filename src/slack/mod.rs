pub mod types;

pub use types::{Color, Notice};

use chrono::Utc;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::github::types::{Lifecycle, PullRequest};
use crate::report::{AggregationResult, Summary};
use types::{Attachment, PlainMessage, RichMessage};

const RICH_USERNAME: &str = "GitHub Bot";
const RICH_ICON_EMOJI: &str = ":octocat:";
const RICH_FOOTER: &str = "GitHub Notification";

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("SLACK_WEBHOOK_URL needs to be set")]
    MissingWebhook,

    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Webhook returned {status}")]
    Status { status: StatusCode },
}

impl SlackError {
    /// Short tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SlackError::MissingWebhook => "config",
            SlackError::Transport(_) => "transport",
            SlackError::Status { .. } => "status",
        }
    }
}

/// Delivers messages to a Slack incoming webhook. One attempt per call.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.filter(|url| !url.is_empty()),
        }
    }

    /// Post a plain text message. Returns whether the webhook accepted it.
    #[instrument(skip_all, fields(channel = %channel, bytes = message.len()))]
    pub async fn notify(
        &self,
        message: &str,
        channel: &str,
        username: &str,
        icon_emoji: &str,
    ) -> bool {
        let payload = PlainMessage {
            text: message,
            channel,
            username,
            icon_emoji,
        };
        self.deliver(&payload, "message").await
    }

    /// Post a single-attachment message as the GitHub bot.
    #[instrument(skip_all, fields(channel = %channel, title = %title))]
    pub async fn notify_rich(&self, title: &str, text: &str, color: &Color, channel: &str) -> bool {
        let payload = RichMessage {
            channel,
            username: RICH_USERNAME,
            icon_emoji: RICH_ICON_EMOJI,
            attachments: vec![Attachment {
                title,
                text,
                color,
                footer: RICH_FOOTER,
                ts: Utc::now().timestamp(),
            }],
        };
        self.deliver(&payload, "rich message").await
    }

    pub async fn send_notice(&self, notice: &Notice, channel: &str) -> bool {
        self.notify_rich(&notice.title, &notice.text, &notice.color, channel)
            .await
    }

    /// POST `payload` to the webhook, keeping the error kind.
    pub async fn try_post<T: Serialize + ?Sized>(&self, payload: &T) -> Result<StatusCode, SlackError> {
        let url = self.webhook_url.as_deref().ok_or(SlackError::MissingWebhook)?;
        debug!("posting to webhook");
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status { status });
        }
        Ok(status)
    }

    async fn deliver<T: Serialize + ?Sized>(&self, payload: &T, what: &str) -> bool {
        match self.try_post(payload).await {
            Ok(status) => {
                info!(status = status.as_u16(), "{what} sent");
                true
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "{what} sending failed");
                false
            }
        }
    }
}

/// Rich rendering of the full report.
pub fn report_notice(result: &AggregationResult, message: &str, color: &Color) -> Notice {
    Notice {
        title: format!(
            "📋 {} pull requests in {} repositories",
            result.total_pull_requests(),
            result.len()
        ),
        text: message.to_string(),
        color: color.clone(),
    }
}

/// Alert for a failure that stopped the report from being built.
pub fn error_notice(message: &str) -> Notice {
    Notice {
        title: "🚨 Error Alert".to_string(),
        text: format!("*Error:* {message}"),
        color: Color::Danger,
    }
}

/// Announcement for a newly opened pull request.
pub fn pr_opened_notice(repo: &str, pr: &PullRequest) -> Notice {
    Notice {
        title: format!("🔔 New Pull Request: #{}", pr.number),
        text: format!(
            "*Repository:* {}\n*Title:* {}\n*Author:* {}\n*URL:* {}",
            repo,
            pr.title,
            pr.author(),
            pr.html_url
        ),
        color: Color::Good,
    }
}

/// Announcement for a pull request status change such as "merged" or "closed".
pub fn pr_status_notice(repo: &str, pr: &PullRequest, status: &str) -> Notice {
    let (emoji, color) = match status {
        "merged" => ("✅", Color::Good),
        "closed" => ("❌", Color::Danger),
        "opened" => ("🔔", Color::Good),
        "reopened" => ("🔄", Color::Warning),
        _ => ("📝", Color::Good),
    };
    let status_title = title_case(status);
    Notice {
        title: format!("{emoji} PR {status_title}: #{}", pr.number),
        text: format!(
            "*Repository:* {}\n*Title:* {}\n*Status:* {}\n*URL:* {}",
            repo, pr.title, status_title, pr.html_url
        ),
        color,
    }
}

pub fn daily_summary_notice(summary: &Summary) -> Notice {
    Notice {
        title: "📊 Daily Summary".to_string(),
        text: format!(
            "*Date:* {}\n*Total PRs:* {}\n*New PRs:* {}\n*Merged PRs:* {}\n*Closed PRs:* {}",
            summary.date.format("%Y-%m-%d"),
            summary.total_prs,
            summary.new_prs,
            summary.merged_prs,
            summary.closed_prs
        ),
        color: Color::Good,
    }
}

/// Per-pull-request announcements for activity on `today`: pull requests
/// created that day are announced as new, merged or closed ones updated that
/// day get a status notice.
pub fn activity_notices(result: &AggregationResult, today: chrono::NaiveDate) -> Vec<Notice> {
    let mut notices = Vec::new();
    for entry in result.iter() {
        let repo = entry.repository.name.as_str();
        for pr in &entry.pull_requests {
            match pr.lifecycle() {
                Lifecycle::Open if pr.created_at.date_naive() == today => {
                    notices.push(pr_opened_notice(repo, pr));
                }
                Lifecycle::Merged if pr.updated_at.date_naive() == today => {
                    notices.push(pr_status_notice(repo, pr, "merged"));
                }
                Lifecycle::Closed if pr.updated_at.date_naive() == today => {
                    notices.push(pr_status_notice(repo, pr, "closed"));
                }
                _ => {}
            }
        }
    }
    notices
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
