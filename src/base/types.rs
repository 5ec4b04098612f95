//! Common types shared across the relay.

use serde::{Deserialize, Serialize};

/// Crate-wide error type.
pub type Err = anyhow::Error;
/// Crate-wide result type.
pub type Res<T> = Result<T, Err>;
/// Result carrying no value.
pub type Void = Res<()>;

/// Header GitHub uses to label the kind of a webhook delivery.
pub const GITHUB_EVENT_HEADER: &str = "X-GitHub-Event";

/// Query parameter that addresses a delivery to a Slack workspace.
pub const WORKSPACE_PARAM: &str = "workspace";

/// The webhook event kinds this relay distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// GitHub's webhook handshake.
    Ping,
    /// Pull request lifecycle events.
    PullRequest,
    /// Pull request review lifecycle events.
    PullRequestReview,
    /// Anything else; carried for logging.
    Other(String),
}

impl EventKind {
    /// Classify the value of the event header.
    pub fn parse(value: &str) -> Self {
        match value {
            "ping" => Self::Ping,
            "pull_request" => Self::PullRequest,
            "pull_request_review" => Self::PullRequestReview,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The payload `action` values this relay distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    /// A reviewer was asked for a code review.
    ReviewRequested,
    /// A review was submitted.
    Submitted,
    /// Any other action; carried for logging.
    Other(String),
    /// The payload has no `action` field.
    None,
}

impl EventAction {
    /// Classify the payload's `action` field, which may be absent.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("review_requested") => Self::ReviewRequested,
            Some("submitted") => Self::Submitted,
            Some(other) => Self::Other(other.to_string()),
            None => Self::None,
        }
    }
}

/// A pull request participant: a GitHub login and, when an identity link
/// exists, the Slack user id it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// The GitHub login.
    pub github: String,
    /// The linked Slack user id, if any.
    pub slack: Option<String>,
}

/// A direct message destined for the delivery client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Slack user id to deliver to.
    pub recipient: String,
    /// Plain message text.
    pub text: String,
}

/// Terminal outcome of dispatching one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// The `ping` handshake; nothing to deliver.
    Acknowledged,
    /// A recognized-but-unsupported event or action; reported, not an error.
    Informational(String),
    /// The notifications that were delivered (possibly none).
    Notified(Vec<Notification>),
}

impl std::fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Acknowledged => write!(f, "I'm ready!"),
            Self::Informational(text) => write!(f, "{text}"),
            Self::Notified(notifications) => write!(f, "delivered {} notification(s)", notifications.len()),
        }
    }
}

/// Request failures that abort processing, plus the defensive invariant check.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The `workspace` query parameter was absent.
    #[error("no workspace provided")]
    MissingWorkspace,
    /// The GitHub event header was absent.
    #[error("no github event header provided")]
    MissingEventType,
    /// Both participants were unresolved past the point where that case is
    /// already handled. Must not happen.
    #[error("both participants unresolved past the resolution check")]
    ImpossibleState,
}
