//! Rendering of notifications into human-readable delivery payloads.

use octoping_common::config::{DEFAULT_GITHUB_API_URL, DEFAULT_GITHUB_WEB_URL};
use octoping_common::types::{DeliveryPayload, Notification, Reason};

/// Sentence used for reason codes we have no description for.
pub const FALLBACK_REASON: &str = "You have a notification.";

/// Human sentence for a known reason code.
pub fn reason_description(reason: Reason) -> &'static str {
    match reason {
        Reason::ApprovalRequested => "You were requested to review and approve a deployment.",
        Reason::Assign => "You were assigned to the issue.",
        Reason::Author => "You created the thread.",
        Reason::CiActivity => "A GitHub Actions workflow run that you triggered was completed.",
        Reason::Comment => "You commented on the thread.",
        Reason::Invitation => "You accepted an invitation to contribute to the repository.",
        Reason::Manual => "You subscribed to the thread (via an issue or pull request).",
        Reason::MemberFeatureRequested => {
            "Organization members have requested to enable a feature such as Copilot."
        }
        Reason::Mention => "You were specifically @mentioned in the content.",
        Reason::ReviewRequested => {
            "You, or a team you're a member of, were requested to review a pull request."
        }
        Reason::SecurityAdvisoryCredit => {
            "You were credited for contributing to a security advisory."
        }
        Reason::SecurityAlert => "GitHub discovered a security vulnerability in your repository.",
        Reason::StateChange => {
            "You changed the thread state (for example, closing an issue or merging a pull request)."
        }
        Reason::Subscribed => "You're watching the repository.",
        Reason::TeamMention => "You were on a team that was mentioned.",
    }
}

/// Sentence for a raw reason code, falling back for unknown codes.
pub fn describe_reason(code: &str) -> &'static str {
    Reason::from_code(code)
        .map(reason_description)
        .unwrap_or(FALLBACK_REASON)
}

/// Split a concatenated type tag into words: `PullRequest` -> `Pull Request`.
pub fn type_label(kind: &str) -> String {
    let mut label = String::with_capacity(kind.len() + 4);
    for (i, ch) in kind.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            label.push(' ');
        }
        label.push(ch);
    }
    label
}

/// Turns notifications into delivery payloads.
#[derive(Debug, Clone)]
pub struct Renderer {
    /// e.g. `https://api.github.com/repos/`
    api_repos_prefix: String,
    /// e.g. `https://github.com/`
    web_prefix: String,
}

impl Renderer {
    pub fn new(api_url: &str, web_url: &str) -> Self {
        Self {
            api_repos_prefix: format!("{}/repos/", api_url.trim_end_matches('/')),
            web_prefix: format!("{}/", web_url.trim_end_matches('/')),
        }
    }

    /// Web-facing URL for a notification, if any.
    ///
    /// Prefers `html_url`, then the subject's API URL. API repository URLs
    /// are rewritten onto the web host, keeping the rest of the path.
    pub fn resolve_url(&self, notification: &Notification) -> Option<String> {
        let url = notification
            .html_url
            .as_deref()
            .or(notification.subject.url.as_deref())?;

        Some(self.rewrite_api_url(url))
    }

    pub fn rewrite_api_url(&self, url: &str) -> String {
        match url.strip_prefix(&self.api_repos_prefix) {
            Some(rest) => format!("{}{}", self.web_prefix, rest),
            None => url.to_string(),
        }
    }

    /// Markdown summary: type label, repository, title, reason sentence and
    /// a link when a URL is known.
    pub fn summary(&self, notification: &Notification, url: Option<&str>) -> String {
        let mut summary = format!(
            "**{}** in {}: {}\n{}",
            type_label(&notification.subject.kind),
            notification.repository.full_name,
            notification.subject.title,
            describe_reason(&notification.reason),
        );

        if let Some(url) = url {
            summary.push_str(&format!("\n[View on GitHub]({})", url));
        }

        summary
    }

    /// Build the webhook document for one notification.
    pub fn payload(&self, notification: &Notification) -> DeliveryPayload {
        let url = self.resolve_url(notification);
        let summary = self.summary(notification, url.as_deref());

        DeliveryPayload {
            id: notification.id.clone(),
            reason: notification.reason.clone(),
            updated_at: notification.updated_at.clone(),
            repository: notification.repository.full_name.clone(),
            subject: notification.subject.clone(),
            url,
            summary,
            raw: notification.raw.clone(),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_GITHUB_API_URL, DEFAULT_GITHUB_WEB_URL)
    }
}
