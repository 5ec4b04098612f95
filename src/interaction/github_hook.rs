//! GitHub webhook dispatch.
//!
//! One delivery flows through here: addressing (the `workspace` query
//! parameter), classification (event header plus payload action), identity
//! resolution, composition, and delivery, in that order. The credential
//! lookup and both identity resolutions are independent reads and run
//! concurrently; composition only happens after all of them settle.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::{
    base::types::{DispatchResult, EventAction, EventKind, GITHUB_EVENT_HEADER, HookError, Notification, Res, Void, WORKSPACE_PARAM},
    interaction::{identity, notify},
    runtime::Runtime,
    service::chat::ChatClient,
};

// Payload views.

/// A user reference as it appears in GitHub payloads.
#[derive(Debug, Deserialize)]
struct UserRef {
    login: String,
}

/// The pull request fields this relay reads.
#[derive(Debug, Deserialize)]
struct PullRequestRef {
    user: UserRef,
    html_url: String,
}

/// Payload of a `pull_request` / `review_requested` delivery.
#[derive(Debug, Deserialize)]
struct ReviewRequestedPayload {
    pull_request: PullRequestRef,
    requested_reviewer: UserRef,
}

/// The review fields this relay reads.
#[derive(Debug, Deserialize)]
struct ReviewRef {
    state: String,
    html_url: String,
    user: UserRef,
}

/// Payload of a `pull_request_review` / `submitted` delivery.
#[derive(Debug, Deserialize)]
struct ReviewSubmittedPayload {
    pull_request: PullRequestRef,
    review: ReviewRef,
}

// Axum handler.

/// `POST /github`: receive one webhook delivery and answer with the
/// dispatch outcome.
#[instrument(skip_all)]
pub async fn github_hook(State(runtime): State<Runtime>, Query(params): Query<HashMap<String, String>>, headers: HeaderMap, body: Bytes) -> Response {
    let result = handle_github_hook(&runtime, &headers, &params, &body).await;

    match result {
        Ok(outcome) => {
            info!("Dispatch outcome: {}", outcome);
            (StatusCode::OK, outcome.to_string()).into_response()
        }
        Err(err) => {
            error!("Error while handling: {}", err);

            let status = match err.downcast_ref::<HookError>() {
                Some(HookError::MissingWorkspace | HookError::MissingEventType) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };

            (status, err.to_string()).into_response()
        }
    }
}

/// Process one delivery: extract the workspace, classify the event, and
/// dispatch. Public so tests can drive deliveries without a listener.
pub async fn handle_github_hook(runtime: &Runtime, headers: &HeaderMap, params: &HashMap<String, String>, body: &[u8]) -> Res<DispatchResult> {
    // The workspace must be known before any event logic runs.
    let workspace = extract_workspace(params)?;

    // `HeaderMap` lookups are case-insensitive, which GitHub relies on.
    let kind = headers
        .get(GITHUB_EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(EventKind::parse)
        .ok_or(HookError::MissingEventType)?;

    let payload = normalize_payload(headers, body)?;
    let action = EventAction::parse(payload.get("action").and_then(Value::as_str));

    dispatch(runtime, &workspace, kind, action, payload).await
}

/// Read the required `workspace` query parameter.
pub fn extract_workspace(params: &HashMap<String, String>) -> Res<String> {
    params
        .get(WORKSPACE_PARAM)
        .filter(|workspace| !workspace.is_empty())
        .cloned()
        .ok_or_else(|| HookError::MissingWorkspace.into())
}

/// Normalize the delivery body to JSON.
///
/// GitHub posts either `application/json` directly or a form-encoded body
/// whose `payload` field holds the JSON document. An empty body is treated
/// as an empty payload rather than a parse error.
pub fn normalize_payload(headers: &HeaderMap, body: &[u8]) -> Res<Value> {
    if body.is_empty() {
        return Ok(Value::Null);
    }

    let form_encoded = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/x-www-form-urlencoded"));

    if form_encoded {
        let form: HashMap<String, String> = serde_urlencoded::from_bytes(body)?;
        let payload = form.get("payload").ok_or_else(|| anyhow::anyhow!("Form-encoded delivery without a payload field."))?;

        Ok(serde_json::from_str(payload)?)
    } else {
        Ok(serde_json::from_slice(body)?)
    }
}

// Dispatch.

/// The `(event, action)` transition table.
#[instrument(skip(runtime, payload))]
pub async fn dispatch(runtime: &Runtime, workspace: &str, kind: EventKind, action: EventAction, payload: Value) -> Res<DispatchResult> {
    match (kind, action) {
        (EventKind::Ping, _) => Ok(DispatchResult::Acknowledged),
        (EventKind::PullRequest, EventAction::ReviewRequested) => {
            let payload: ReviewRequestedPayload = serde_json::from_value(payload)?;
            on_review_requested(runtime, workspace, payload).await
        }
        (EventKind::PullRequest, _) => Ok(DispatchResult::Informational("unresolved action".to_string())),
        (EventKind::PullRequestReview, EventAction::Submitted) => {
            let payload: ReviewSubmittedPayload = serde_json::from_value(payload)?;
            on_review_submitted(runtime, workspace, payload).await
        }
        (EventKind::PullRequestReview, _) => Ok(DispatchResult::Informational("unresolved action".to_string())),
        (EventKind::Other(other), _) => {
            info!("No handler for event type {}", other);
            Ok(DispatchResult::Informational("no handler for this event type".to_string()))
        }
    }
}

/// `pull_request` / `review_requested`: tell both sides a review was asked
/// for, to the extent their identities are linked.
async fn on_review_requested(runtime: &Runtime, workspace: &str, payload: ReviewRequestedPayload) -> Res<DispatchResult> {
    let requester_name = payload.pull_request.user.login;
    let reviewer_name = payload.requested_reviewer.login;
    let pull_request_url = payload.pull_request.html_url;

    // The credential and both resolutions are independent reads; join them.
    let (workspace_record, requester, reviewer) = tokio::try_join!(
        runtime.db.load_workspace(workspace),
        identity::resolve(&runtime.db, workspace, &requester_name),
        identity::resolve(&runtime.db, workspace, &reviewer_name),
    )?;

    let notifications = notify::review_requested(&requester, &reviewer, &pull_request_url);

    if notifications.is_empty() {
        warn!("Could not find linked users for {} or {}", requester.github, reviewer.github);
        return Ok(DispatchResult::Notified(notifications));
    }

    deliver(&runtime.chat, &workspace_record.bot_token, &notifications).await?;

    Ok(DispatchResult::Notified(notifications))
}

/// `pull_request_review` / `submitted`: tell the author their pull request
/// was reviewed or approved.
async fn on_review_submitted(runtime: &Runtime, workspace: &str, payload: ReviewSubmittedPayload) -> Res<DispatchResult> {
    let requester_name = payload.pull_request.user.login;
    let review = payload.review;

    if review.user.login == requester_name {
        // Self review; nothing to relay.
        info!("Ignoring self review from {}", requester_name);
        return Ok(DispatchResult::Notified(vec![]));
    }

    let (workspace_record, requester, reviewer) = tokio::try_join!(
        runtime.db.load_workspace(workspace),
        identity::resolve(&runtime.db, workspace, &requester_name),
        identity::resolve(&runtime.db, workspace, &review.user.login),
    )?;

    if requester.slack.is_none() && reviewer.slack.is_none() {
        warn!("Could not find linked users for {} or {}", requester.github, reviewer.github);
        return Ok(DispatchResult::Notified(vec![]));
    }

    let notifications = notify::review_submitted(&requester, &reviewer, &review.state, &review.html_url)?;

    deliver(&runtime.chat, &workspace_record.bot_token, &notifications).await?;

    Ok(DispatchResult::Notified(notifications))
}

/// Send every notification concurrently; the delivery as a whole succeeds
/// only once all sends settle.
async fn deliver(chat: &ChatClient, bot_token: &str, notifications: &[Notification]) -> Void {
    let sends = notifications.iter().map(|notification| chat.send_as_bot(bot_token, &notification.recipient, &notification.text));

    futures::future::try_join_all(sends).await?;

    Ok(())
}

// Tests.
