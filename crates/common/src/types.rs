use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Update time of the most recently delivered notification.
pub type Watermark = DateTime<Utc>;

/// Why GitHub generated a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    ApprovalRequested,
    Assign,
    Author,
    CiActivity,
    Comment,
    Invitation,
    Manual,
    MemberFeatureRequested,
    Mention,
    ReviewRequested,
    SecurityAdvisoryCredit,
    SecurityAlert,
    StateChange,
    Subscribed,
    TeamMention,
}

impl Reason {
    pub const ALL: [Reason; 15] = [
        Reason::ApprovalRequested,
        Reason::Assign,
        Reason::Author,
        Reason::CiActivity,
        Reason::Comment,
        Reason::Invitation,
        Reason::Manual,
        Reason::MemberFeatureRequested,
        Reason::Mention,
        Reason::ReviewRequested,
        Reason::SecurityAdvisoryCredit,
        Reason::SecurityAlert,
        Reason::StateChange,
        Reason::Subscribed,
        Reason::TeamMention,
    ];

    /// Look up a reason by its wire code. Returns `None` for codes GitHub
    /// may add in the future.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::ApprovalRequested => "approval_requested",
            Reason::Assign => "assign",
            Reason::Author => "author",
            Reason::CiActivity => "ci_activity",
            Reason::Comment => "comment",
            Reason::Invitation => "invitation",
            Reason::Manual => "manual",
            Reason::MemberFeatureRequested => "member_feature_requested",
            Reason::Mention => "mention",
            Reason::ReviewRequested => "review_requested",
            Reason::SecurityAdvisoryCredit => "security_advisory_credit",
            Reason::SecurityAlert => "security_alert",
            Reason::StateChange => "state_change",
            Reason::Subscribed => "subscribed",
            Reason::TeamMention => "team_mention",
        }
    }
}

/// Repository a notification belongs to. Only the fields we read are typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

/// The thing a notification is about (issue, pull request, release, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub title: String,
    /// Concatenated type tag, e.g. `PullRequest`
    #[serde(rename = "type")]
    pub kind: String,
    /// API URL of the subject, null for some subject types
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub latest_comment_url: Option<String>,
}

/// A notification thread as returned by `GET /notifications`.
///
/// The typed fields are a read-only view; `raw` keeps the complete record so
/// it can be forwarded unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub id: String,
    pub reason: String,
    /// Kept as the raw ISO-8601 string; parsed by the delivery pipeline.
    pub updated_at: String,
    pub repository: Repository,
    pub subject: Subject,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl Notification {
    /// Decode a notification record, keeping the original JSON alongside.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut notification: Notification = serde_json::from_value(value.clone())?;
        notification.raw = value;
        Ok(notification)
    }

    /// Parsed reason code, `None` if GitHub sent one we do not know.
    pub fn reason_code(&self) -> Option<Reason> {
        Reason::from_code(&self.reason)
    }
}

/// Document POSTed to the webhook for a single notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub id: String,
    pub reason: String,
    pub updated_at: String,
    /// Repository full name, e.g. `octo-org/octo-repo`
    pub repository: String,
    pub subject: Subject,
    /// Web-facing URL of the subject, when one could be resolved
    pub url: Option<String>,
    /// Markdown summary for humans
    pub summary: String,
    pub raw: serde_json::Value,
}

/// Result of a webhook call that reached the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub success: bool,
}
