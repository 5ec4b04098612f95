//! Event handling for review-relay.
//!
//! This module provides functionality for handling GitHub webhook deliveries:
//! - Classifying deliveries and dispatching them (`github_hook`)
//! - Resolving GitHub logins to Slack user ids (`identity`)
//! - Composing the direct messages to deliver (`notify`)

pub mod github_hook;
pub mod identity;
pub mod notify;
