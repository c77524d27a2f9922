//! Recording transport for development/testing and dry runs.

use parking_lot::Mutex;

use crate::core::{MailRequest, MailResult, MailTransport, NotifyError, Substitutions};
use crate::util::clock::now_ms;
use crate::util::serde::ItemId;

/// Snapshot of one transport invocation.
#[derive(Debug, Clone)]
pub struct SentMail {
    /// Module the message belongs to.
    pub module: String,
    /// Template key.
    pub key: String,
    /// Render language.
    pub langcode: String,
    /// Item that was handed over.
    pub item_id: ItemId,
    /// Queue the item came from.
    pub queue: String,
    /// Whether delivery was requested.
    pub send: bool,
    /// Substitutions at the time of the call.
    pub substitutions: Substitutions,
    /// Recipient emails, in order.
    pub recipients: Vec<String>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Transport that stores every request instead of delivering it.
///
/// Reports `result = send` unless built with [`RecordingTransport::rejecting`].
pub struct RecordingTransport {
    accept: bool,
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingTransport {
    /// Transport that accepts every deliverable message.
    pub fn new() -> Self {
        Self {
            accept: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Transport that records but reports every message as not delivered.
    pub fn rejecting() -> Self {
        Self {
            accept: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All recorded invocations, oldest first.
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }

    /// Invocations that asked for delivery.
    pub fn delivered(&self) -> Vec<SentMail> {
        self.sent.lock().iter().filter(|m| m.send).cloned().collect()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MailTransport for RecordingTransport {
    fn send(&self, request: &MailRequest<'_>) -> Result<MailResult, NotifyError> {
        let item = request.params.queue_item;
        self.sent.lock().push(SentMail {
            module: request.module.to_owned(),
            key: request.key.to_owned(),
            langcode: request.langcode.to_owned(),
            item_id: item.item_id(),
            queue: item.queue().to_owned(),
            send: request.send,
            substitutions: item.substitutions().clone(),
            recipients: item.recipients().iter().map(|r| r.email().to_owned()).collect(),
            created_at_ms: now_ms(),
        });
        if self.accept && request.send {
            Ok(MailResult::accepted())
        } else {
            Ok(MailResult::rejected())
        }
    }
}
