//! Mail transport contract.
//!
//! Rendering and delivery belong to the transport. The pipeline only hands
//! it the enriched [`QueueItem`] and says whether it may actually send.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{NotifyError, QueueItem};

/// Parameters passed through to the transport's template layer.
#[derive(Debug, Clone, Copy)]
pub struct MailParams<'a> {
    /// The enriched item being delivered.
    pub queue_item: &'a QueueItem,
}

/// One transport invocation.
#[derive(Debug, Clone, Copy)]
pub struct MailRequest<'a> {
    /// Module that owns the mail template.
    pub module: &'a str,
    /// Template key within the module.
    pub key: &'a str,
    /// Recipient field; empty because recipients travel in the substitutions.
    pub to: &'a str,
    /// Language to render in.
    pub langcode: &'a str,
    /// Template parameters.
    pub params: MailParams<'a>,
    /// Sender override, `None` for the site default.
    pub from: Option<&'a str>,
    /// When false the transport may build the message but must not deliver it.
    pub send: bool,
}

/// Outcome reported by a transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailResult {
    /// Whether the message was accepted for delivery.
    pub result: bool,
    /// Transport-specific details.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MailResult {
    /// Successful outcome without details.
    pub fn accepted() -> Self {
        Self {
            result: true,
            extra: Map::new(),
        }
    }

    /// Failed (or suppressed) outcome without details.
    pub fn rejected() -> Self {
        Self::default()
    }
}

/// Outbound mail collaborator shared by every named queue.
pub trait MailTransport: Send + Sync {
    /// Build and, when `request.send` is true, deliver a message.
    ///
    /// # Errors
    ///
    /// Any error is treated by the pipeline exactly like `result: false`.
    fn send(&self, request: &MailRequest<'_>) -> Result<MailResult, NotifyError>;
}
