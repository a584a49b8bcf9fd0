use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::github::types::{PrState, Visibility};
use crate::slack::Color;

/// Config file looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".pr-notify.toml";

/// Account scanned when neither the CLI nor the config file names one.
pub const DEFAULT_OWNER: &str = "samdasoo2l";

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-notify.toml.
///
/// All fields are optional. The tool works with zero config as long as the
/// token and webhook come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub-specific settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Slack webhook settings
    #[serde(default)]
    pub slack: SlackConfig,

    /// Which pull requests end up in the report
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to PR_GITHUB_TOKEN / GITHUB_TOKEN.
    pub token: Option<String>,
    /// REST API root, overridable for GitHub Enterprise.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Account whose repositories are scanned.
    pub owner: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            owner: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    /// Incoming webhook URL. If None, falls back to SLACK_WEBHOOK_URL.
    pub webhook_url: Option<String>,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_icon_emoji")]
    pub icon_emoji: String,
    /// Channel that receives error alerts
    #[serde(default = "default_alerts_channel")]
    pub alerts_channel: String,
    /// Attachment colour of the `--rich` report: good, warning, danger or `#rrggbb`
    #[serde(default)]
    pub report_color: Color,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            channel: default_channel(),
            username: default_username(),
            icon_emoji: default_icon_emoji(),
            alerts_channel: default_alerts_channel(),
            report_color: Color::Good,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub state: PrState,
    #[serde(default)]
    pub visibility: Visibility,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_channel() -> String {
    "#general".to_string()
}

fn default_username() -> String {
    "Bot".to_string()
}

fn default_icon_emoji() -> String {
    ":robot_face:".to_string()
}

fn default_alerts_channel() -> String {
    "#alerts".to_string()
}

impl Config {
    /// Load configuration from `path`, or from .pr-notify.toml in the current
    /// directory when no path is given. A missing default file yields the
    /// default config; an explicitly named file must exist.
    ///
    /// Environment values (including a `.env` file) fill in the token and
    /// webhook URL when the file leaves them unset.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match dotenvy::dotenv() {
            Ok(env_path) => debug!(path = %env_path.display(), "loaded .env file"),
            Err(_) => debug!(".env file not found, relying on process environment"),
        }

        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill unset secrets from an environment lookup. File values win.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.github.token.is_none() {
            self.github.token = lookup("PR_GITHUB_TOKEN").or_else(|| lookup("GITHUB_TOKEN"));
        }
        if self.slack.webhook_url.is_none() {
            self.slack.webhook_url = lookup("SLACK_WEBHOOK_URL");
        }
    }

    /// Account to scan: config value, else the built-in default.
    pub fn owner(&self) -> &str {
        self.github
            .owner
            .as_deref()
            .filter(|owner| !owner.is_empty())
            .unwrap_or(DEFAULT_OWNER)
    }
}
