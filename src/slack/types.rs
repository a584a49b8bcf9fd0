use serde::{Deserialize, Serialize, Serializer};

/// Attachment sidebar colour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Color {
    #[default]
    Good,
    Warning,
    Danger,
    /// Any `#rrggbb` value
    Hex(String),
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Good => write!(f, "good"),
            Color::Warning => write!(f, "warning"),
            Color::Danger => write!(f, "danger"),
            Color::Hex(hex) => write!(f, "{hex}"),
        }
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        match value {
            "good" => Color::Good,
            "warning" => Color::Warning,
            "danger" => Color::Danger,
            hex => Color::Hex(hex.to_string()),
        }
    }
}

impl From<String> for Color {
    fn from(value: String) -> Self {
        Color::from(value.as_str())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Plain text webhook payload.
#[derive(Debug, Clone, Serialize)]
pub struct PlainMessage<'a> {
    pub text: &'a str,
    pub channel: &'a str,
    pub username: &'a str,
    pub icon_emoji: &'a str,
}

/// Webhook payload carrying attachments.
#[derive(Debug, Clone, Serialize)]
pub struct RichMessage<'a> {
    pub channel: &'a str,
    pub username: &'a str,
    pub icon_emoji: &'a str,
    pub attachments: Vec<Attachment<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub color: &'a Color,
    pub footer: &'a str,
    /// Unix seconds
    pub ts: i64,
}

/// Title, body and colour of a rich notification, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub text: String,
    pub color: Color,
}
