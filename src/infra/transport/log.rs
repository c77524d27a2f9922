//! Transport that only logs what it would deliver.

use serde_json::Value;

use crate::core::{MailRequest, MailResult, MailTransport, NotifyError};

/// Logs each message through `tracing` and reports it as delivered when
/// delivery was requested. Useful as a staging default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn send(&self, request: &MailRequest<'_>) -> Result<MailResult, NotifyError> {
        let item = request.params.queue_item;
        if !request.send {
            tracing::info!(
                module = request.module,
                key = request.key,
                item_id = item.item_id(),
                "message built but not sent"
            );
            return Ok(MailResult::rejected());
        }
        tracing::info!(
            module = request.module,
            key = request.key,
            langcode = request.langcode,
            item_id = item.item_id(),
            subject = %item.substitutions().subject,
            recipients = item.recipients().len(),
            "message delivered to log"
        );
        let mut outcome = MailResult::accepted();
        outcome
            .extra
            .insert("recipients".into(), Value::from(item.recipients().len()));
        Ok(outcome)
    }
}
