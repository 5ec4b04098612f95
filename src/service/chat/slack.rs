//! Slack delivery for review-relay.
//!
//! This module provides the outbound half of the relay: posting direct
//! messages to Slack users with the bot credential of the workspace a
//! delivery was addressed to.

use crate::base::types::{Res, Void};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::instrument;

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub fn slack() -> Res<Self> {
        let client = SlackChatClient::new()?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// Slack client implementation.
///
/// Holds no token of its own: sessions are opened per call with the bot
/// token of the workspace being served.
#[derive(Clone)]
struct SlackChatClient {
    client: Arc<FullClient>,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    fn new() -> Res<Self> {
        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        Ok(Self { client })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    #[instrument(skip(self, bot_token, text))]
    async fn send_as_bot(&self, bot_token: &str, recipient: &str, text: &str) -> Void {
        let token = SlackApiToken::new(SlackApiTokenValue(bot_token.to_string()));

        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(recipient.to_string()), message).with_link_names(true);

        let session = self.client.open_session(&token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }
}

// Tests.
