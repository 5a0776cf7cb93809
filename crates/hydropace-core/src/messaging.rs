//! Message delivery boundary.
//!
//! The core never retries sends: delivery is fire-and-forget and
//! failures belong to the collaborator behind this trait.

use crate::error::DeliveryError;

/// Extra delivery options alongside the message text.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Label for an acknowledgment affordance (the "Done" button in a
    /// chat client). `None` for plain informational messages.
    pub ack_prompt: Option<String>,
}

impl SendOptions {
    pub fn with_ack(prompt: impl Into<String>) -> Self {
        Self {
            ack_prompt: Some(prompt.into()),
        }
    }
}

/// Chat-platform delivery collaborator.
pub trait MessagingClient: Send + Sync {
    /// Deliver `text` to the user. At-most-once from the core's point of
    /// view: the caller persists its state before invoking this.
    fn send(&self, user_id: i64, text: &str, options: &SendOptions) -> Result<(), DeliveryError>;
}

/// Stdout delivery, used by the CLI poller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMessenger;

impl MessagingClient for ConsoleMessenger {
    fn send(&self, user_id: i64, text: &str, options: &SendOptions) -> Result<(), DeliveryError> {
        match &options.ack_prompt {
            Some(prompt) => println!("[user {user_id}] {text} ({prompt})"),
            None => println!("[user {user_id}] {text}"),
        }
        Ok(())
    }
}
