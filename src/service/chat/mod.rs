pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Void;

// Traits.

/// Generic "chat" trait that delivery clients must implement.
///
/// This trait defines the core functionality for delivering notifications
/// to chat platforms like Slack. Implementing this trait allows different
/// chat services to be used with review-relay.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Send a direct message to a user on behalf of a workspace's bot.
    ///
    /// The bot credential comes from the workspace record, so a single
    /// client serves every workspace. The call resolves once the platform
    /// has accepted (or rejected) the message.
    async fn send_as_bot(&self, bot_token: &str, recipient: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
