#![cfg(test)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use mockall::mock;
use review_relay::{
    base::{
        config::{Config, ConfigInner},
        types::{DispatchResult, HookError, Res, Void},
    },
    interaction::github_hook::handle_github_hook,
    runtime::Runtime,
    service::{
        chat::{ChatClient, GenericChatClient},
        db::{DbClient, GenericDbClient, Link, Workspace},
    },
};

// Mocks.

// Mock chat client for testing.

mock! {
    pub Chat {}

    #[async_trait]
    impl GenericChatClient for Chat {
        async fn send_as_bot(&self, bot_token: &str, recipient: &str, text: &str) -> Void;
    }
}

// Mock database client, for tests that must prove the store is never touched.

mock! {
    pub Db {}

    #[async_trait]
    impl GenericDbClient for Db {
        async fn load_workspace(&self, workspace: &str) -> Res<Workspace>;
        async fn load_links(&self, workspace: &str, github_name: &str) -> Res<Vec<Link>>;
        async fn save_workspace(&self, workspace: &Workspace) -> Void;
        async fn save_link(&self, workspace: &str, link: &Link) -> Void;
    }
}

// Helpers.

const WORKSPACE: &str = "T1000";
const BOT_TOKEN: &str = "xoxb-test";
const PULL_REQUEST_URL: &str = "https://github.com/acme/repo/pull/7";
const REVIEW_URL: &str = "https://github.com/acme/repo/pull/7#pullrequestreview-1";

fn test_config() -> Config {
    Config {
        inner: Arc::new(ConfigInner {
            bind_address: "127.0.0.1:0".to_string(),
            db_endpoint: "memory".to_string(),
            ..Default::default()
        }),
    }
}

/// A runtime over the in-memory store, seeded with the test workspace.
async fn setup_runtime(chat: MockChat) -> Runtime {
    let db = DbClient::surreal_memory().await.expect("Failed to create DB client");

    db.save_workspace(&Workspace {
        id: WORKSPACE.to_string(),
        bot_token: BOT_TOKEN.to_string(),
    })
    .await
    .expect("Failed to save workspace");

    Runtime {
        config: test_config(),
        db,
        chat: ChatClient::new(Arc::new(chat)),
    }
}

/// A runtime whose store panics on any access.
fn setup_untouchable_runtime() -> Runtime {
    Runtime {
        config: test_config(),
        db: DbClient::new(Arc::new(MockDb::new())),
        chat: ChatClient::new(Arc::new(MockChat::new())),
    }
}

async fn link(db: &DbClient, github: &str, slack: &str) {
    db.save_link(
        WORKSPACE,
        &Link {
            github: github.to_string(),
            slack: slack.to_string(),
        },
    )
    .await
    .expect("Failed to save link");
}

fn hook_headers(event: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("X-GitHub-Event", HeaderValue::from_str(event).unwrap());
    headers
}

fn workspace_params() -> HashMap<String, String> {
    HashMap::from([("workspace".to_string(), WORKSPACE.to_string())])
}

fn review_requested_body(requester: &str, reviewer: &str) -> Vec<u8> {
    serde_json::json!({
        "action": "review_requested",
        "pull_request": { "user": { "login": requester }, "html_url": PULL_REQUEST_URL },
        "requested_reviewer": { "login": reviewer },
    })
    .to_string()
    .into_bytes()
}

fn review_submitted_body(requester: &str, reviewer: &str, state: &str) -> Vec<u8> {
    serde_json::json!({
        "action": "submitted",
        "pull_request": { "user": { "login": requester }, "html_url": PULL_REQUEST_URL },
        "review": { "state": state, "html_url": REVIEW_URL, "user": { "login": reviewer } },
    })
    .to_string()
    .into_bytes()
}

fn recipients(result: &DispatchResult) -> Vec<&str> {
    match result {
        DispatchResult::Notified(notifications) => notifications.iter().map(|n| n.recipient.as_str()).collect(),
        other => panic!("Expected notifications, got {other:?}"),
    }
}

// Tests.

#[tokio::test]
async fn ping_is_acknowledged_without_notifying_anyone() {
    let runtime = setup_runtime(MockChat::new()).await;

    let result = handle_github_hook(&runtime, &hook_headers("ping"), &workspace_params(), br#"{"zen":"Design for failure."}"#)
        .await
        .unwrap();

    assert_eq!(result, DispatchResult::Acknowledged);
}

#[tokio::test]
async fn a_missing_workspace_aborts_before_any_collaborator_is_touched() {
    // Both mocks panic on any call, so reaching either fails the test.
    let runtime = setup_untouchable_runtime();

    let err = handle_github_hook(&runtime, &hook_headers("pull_request"), &HashMap::new(), &review_requested_body("alice", "bob"))
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<HookError>(), Some(HookError::MissingWorkspace)));
}

#[tokio::test]
async fn a_missing_event_header_is_fatal() {
    let runtime = setup_untouchable_runtime();

    let err = handle_github_hook(&runtime, &HeaderMap::new(), &workspace_params(), &review_requested_body("alice", "bob"))
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<HookError>(), Some(HookError::MissingEventType)));
}

#[tokio::test]
async fn the_event_header_lookup_is_case_insensitive() {
    let runtime = setup_runtime(MockChat::new()).await;

    let mut headers = HeaderMap::new();
    headers.insert("x-github-event", HeaderValue::from_static("ping"));

    let result = handle_github_hook(&runtime, &headers, &workspace_params(), b"{}").await.unwrap();

    assert_eq!(result, DispatchResult::Acknowledged);
}

#[tokio::test]
async fn unhandled_event_types_are_informational() {
    let runtime = setup_runtime(MockChat::new()).await;

    let result = handle_github_hook(&runtime, &hook_headers("issues"), &workspace_params(), br#"{"action":"opened"}"#)
        .await
        .unwrap();

    assert_eq!(result, DispatchResult::Informational("no handler for this event type".to_string()));
}

#[tokio::test]
async fn unresolved_pull_request_actions_are_informational() {
    let runtime = setup_runtime(MockChat::new()).await;

    let result = handle_github_hook(&runtime, &hook_headers("pull_request"), &workspace_params(), br#"{"action":"closed"}"#)
        .await
        .unwrap();

    assert_eq!(result, DispatchResult::Informational("unresolved action".to_string()));
}

#[tokio::test]
async fn review_requests_notify_both_linked_users() {
    let mut chat = MockChat::new();
    chat.expect_send_as_bot()
        .withf(|token, recipient, text| {
            token == BOT_TOKEN && recipient == "U1" && text.contains("alice") && text.contains("bob") && text.contains(PULL_REQUEST_URL)
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    chat.expect_send_as_bot()
        .withf(|token, recipient, text| {
            token == BOT_TOKEN && recipient == "U2" && text.contains("alice") && text.contains("bob") && text.contains(PULL_REQUEST_URL)
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let runtime = setup_runtime(chat).await;
    link(&runtime.db, "alice", "U1").await;
    link(&runtime.db, "bob", "U2").await;

    let result = handle_github_hook(&runtime, &hook_headers("pull_request"), &workspace_params(), &review_requested_body("alice", "bob"))
        .await
        .unwrap();

    assert_eq!(recipients(&result), vec!["U1", "U2"]);
}

#[tokio::test]
async fn review_requests_flag_an_unlinked_requester_to_the_reviewer() {
    let mut chat = MockChat::new();
    chat.expect_send_as_bot()
        .withf(|token, recipient, text| token == BOT_TOKEN && recipient == "U2" && text.contains("alice has not been linked yet"))
        .times(1)
        .returning(|_, _, _| Ok(()));

    let runtime = setup_runtime(chat).await;
    link(&runtime.db, "bob", "U2").await;

    let result = handle_github_hook(&runtime, &hook_headers("pull_request"), &workspace_params(), &review_requested_body("alice", "bob"))
        .await
        .unwrap();

    assert_eq!(recipients(&result), vec!["U2"]);
}

#[tokio::test]
async fn review_requests_flag_an_unlinked_reviewer_to_the_requester() {
    let mut chat = MockChat::new();
    chat.expect_send_as_bot()
        .withf(|token, recipient, text| token == BOT_TOKEN && recipient == "U1" && text.contains("bob has not been linked yet"))
        .times(1)
        .returning(|_, _, _| Ok(()));

    let runtime = setup_runtime(chat).await;
    link(&runtime.db, "alice", "U1").await;

    let result = handle_github_hook(&runtime, &hook_headers("pull_request"), &workspace_params(), &review_requested_body("alice", "bob"))
        .await
        .unwrap();

    assert_eq!(recipients(&result), vec!["U1"]);
}

#[tokio::test]
async fn review_requests_with_nobody_linked_succeed_quietly() {
    // No expectations: any send panics.
    let runtime = setup_runtime(MockChat::new()).await;

    let result = handle_github_hook(&runtime, &hook_headers("pull_request"), &workspace_params(), &review_requested_body("alice", "bob"))
        .await
        .unwrap();

    assert_eq!(result, DispatchResult::Notified(vec![]));
}

#[tokio::test]
async fn approvals_notify_the_author_with_the_review_url() {
    let mut chat = MockChat::new();
    chat.expect_send_as_bot()
        .withf(|token, recipient, text| token == BOT_TOKEN && recipient == "U1" && text.contains("approved") && text.contains(REVIEW_URL))
        .times(1)
        .returning(|_, _, _| Ok(()));

    let runtime = setup_runtime(chat).await;
    link(&runtime.db, "alice", "U1").await;

    let result = handle_github_hook(
        &runtime,
        &hook_headers("pull_request_review"),
        &workspace_params(),
        &review_submitted_body("alice", "bob", "approved"),
    )
    .await
    .unwrap();

    assert_eq!(recipients(&result), vec!["U1"]);
}

#[tokio::test]
async fn non_approval_reviews_note_the_unlinked_reviewer() {
    let mut chat = MockChat::new();
    chat.expect_send_as_bot()
        .withf(|token, recipient, text| {
            token == BOT_TOKEN && recipient == "U1" && text.contains("reviewed by bob") && text.contains("bob has not been linked yet")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let runtime = setup_runtime(chat).await;
    link(&runtime.db, "alice", "U1").await;

    let result = handle_github_hook(
        &runtime,
        &hook_headers("pull_request_review"),
        &workspace_params(),
        &review_submitted_body("alice", "bob", "changes_requested"),
    )
    .await
    .unwrap();

    assert_eq!(recipients(&result), vec!["U1"]);
}

#[tokio::test]
async fn self_reviews_are_skipped_before_any_lookup() {
    // The store mock has no expectations, so the skip must happen before
    // resolution even starts.
    let runtime = setup_untouchable_runtime();

    let result = handle_github_hook(
        &runtime,
        &hook_headers("pull_request_review"),
        &workspace_params(),
        &review_submitted_body("alice", "alice", "approved"),
    )
    .await
    .unwrap();

    assert_eq!(result, DispatchResult::Notified(vec![]));
}

#[tokio::test]
async fn reviews_with_nobody_linked_succeed_quietly() {
    let runtime = setup_runtime(MockChat::new()).await;

    let result = handle_github_hook(
        &runtime,
        &hook_headers("pull_request_review"),
        &workspace_params(),
        &review_submitted_body("alice", "bob", "approved"),
    )
    .await
    .unwrap();

    assert_eq!(result, DispatchResult::Notified(vec![]));
}

#[tokio::test]
async fn reviews_for_an_author_without_a_link_are_reserved_no_ops() {
    // Only the reviewer is linked; nothing is sent yet in that case.
    let runtime = setup_runtime(MockChat::new()).await;
    link(&runtime.db, "bob", "U2").await;

    let result = handle_github_hook(
        &runtime,
        &hook_headers("pull_request_review"),
        &workspace_params(),
        &review_submitted_body("alice", "bob", "approved"),
    )
    .await
    .unwrap();

    assert_eq!(result, DispatchResult::Notified(vec![]));
}

#[tokio::test]
async fn a_failed_delivery_fails_the_request() {
    let mut chat = MockChat::new();
    chat.expect_send_as_bot().returning(|_, _, _| Err(anyhow::anyhow!("slack is down")));

    let runtime = setup_runtime(chat).await;
    link(&runtime.db, "alice", "U1").await;

    let result = handle_github_hook(
        &runtime,
        &hook_headers("pull_request_review"),
        &workspace_params(),
        &review_submitted_body("alice", "bob", "approved"),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn unresolved_review_actions_are_informational() {
    let runtime = setup_runtime(MockChat::new()).await;

    let result = handle_github_hook(&runtime, &hook_headers("pull_request_review"), &workspace_params(), br#"{"action":"dismissed"}"#)
        .await
        .unwrap();

    assert_eq!(result, DispatchResult::Informational("unresolved action".to_string()));
}
