//! Per-item enrichment and dispatch.
//!
//! A [`QueueItem`] wraps one claimed [`RawItem`] and walks it through
//! `Created -> ReferencesResolved -> TokensPopulated ->
//! SubscriberTokensPopulated -> Sent | Blocked`. Stage failures never escape:
//! they clear the readiness flag, and the transport is still invoked with
//! `send = false` so it can build (but not deliver) the message.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::pipeline::{
    BuildContext, CommonTokensEvent, EventBus, ReferencesEvent, SubscriberTokensEvent,
    Substitutions,
};
use crate::core::{ItemData, LanguageResolver, MailParams, MailRequest, MailTransport, RawItem, Subscriber};
use crate::util::serde::ItemId;

/// Where an item is in its processing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Wrapped, references not dispatched yet.
    Created,
    /// References stage ran.
    ReferencesResolved,
    /// Common tokens populated.
    TokensPopulated,
    /// Every recipient's tokens populated.
    SubscriberTokensPopulated,
    /// Transport accepted the message.
    Sent,
    /// A stage failed or the transport declined.
    Blocked,
}

/// One claimed notification job plus everything handlers contributed.
#[derive(Debug)]
pub struct QueueItem {
    raw: RawItem,
    context: BuildContext,
    ready_to_send: bool,
    state: PipelineState,
}

impl QueueItem {
    /// Wrap a claimed item and run the references stage.
    ///
    /// References failures are logged; they cannot block sending.
    pub fn new(raw: RawItem, subject: &str, mail_module: &str, bus: &EventBus) -> Self {
        let context = BuildContext::new(mail_module, raw.queue.clone(), subject);
        let mut item = Self {
            raw,
            context,
            ready_to_send: true,
            state: PipelineState::Created,
        };
        item.resolve_references(bus);
        item
    }

    fn resolve_references(&mut self, bus: &EventBus) {
        let mut event = ReferencesEvent::new(&self.raw, &mut self.context);
        if let Err(err) = bus.dispatch_references(&mut event) {
            tracing::warn!(
                item_id = self.raw.item_id,
                queue = %self.raw.queue,
                "reference resolution failed: {err}"
            );
        }
        self.state = PipelineState::ReferencesResolved;
    }

    fn populate_tokens(&mut self, bus: &EventBus) {
        let mut event = CommonTokensEvent::new(&self.raw, &mut self.context);
        match bus.dispatch_common_tokens(&mut event) {
            Ok(()) => self.state = PipelineState::TokensPopulated,
            Err(err) => {
                tracing::warn!(
                    item_id = self.raw.item_id,
                    queue = %self.raw.queue,
                    "common token population failed: {err}"
                );
                self.block();
            }
        }
    }

    fn populate_subscriber_tokens(&mut self, bus: &EventBus) {
        let total = self.raw.data.recipients.len();
        for (index, recipient) in self.raw.data.recipients.iter().enumerate() {
            let mut event =
                SubscriberTokensEvent::new(&self.raw, &mut self.context, recipient, index);
            if let Err(err) = bus.dispatch_subscriber_tokens(&mut event) {
                tracing::warn!(
                    item_id = self.raw.item_id,
                    queue = %self.raw.queue,
                    recipient = %recipient.email(),
                    position = index + 1,
                    total,
                    "subscriber token population failed: {err}"
                );
                self.ready_to_send = false;
                self.state = PipelineState::Blocked;
                return;
            }
        }
        self.state = PipelineState::SubscriberTokensPopulated;
    }

    fn block(&mut self) {
        self.ready_to_send = false;
        self.state = PipelineState::Blocked;
    }

    /// Run the token stages and hand the item to the transport.
    ///
    /// Returns `true` only when the item was ready and the transport accepted
    /// it. A transport that answers `result: true` for a suppressed send does
    /// not make a blocked item count as delivered. Never fails.
    pub fn process(
        &mut self,
        bus: &EventBus,
        transport: &dyn MailTransport,
        locale: &dyn LanguageResolver,
    ) -> bool {
        if self.ready_to_send {
            self.populate_tokens(bus);
        }
        if self.ready_to_send {
            self.populate_subscriber_tokens(bus);
        }

        let langcode = locale.current_langcode();
        let request = MailRequest {
            module: &self.context.mail_module,
            key: &self.context.mail_key,
            to: "",
            langcode: &langcode,
            params: MailParams { queue_item: self },
            from: None,
            send: self.ready_to_send,
        };
        let delivered = match transport.send(&request) {
            Ok(outcome) => outcome.result,
            Err(err) => {
                tracing::warn!(
                    item_id = self.raw.item_id,
                    queue = %self.raw.queue,
                    "mail transport failed: {err}"
                );
                false
            }
        };

        let sent = delivered && self.ready_to_send;
        if sent {
            self.state = PipelineState::Sent;
        } else {
            self.block();
        }
        sent
    }

    /// Store-assigned identifier.
    pub const fn item_id(&self) -> ItemId {
        self.raw.item_id
    }

    /// Queue the item was claimed from.
    pub fn queue(&self) -> &str {
        &self.raw.queue
    }

    /// Claimed item as stored.
    pub const fn raw(&self) -> &RawItem {
        &self.raw
    }

    /// Producer payload.
    pub const fn data(&self) -> &ItemData {
        &self.raw.data
    }

    /// Recipients in processing order.
    pub fn recipients(&self) -> &[Subscriber] {
        &self.raw.data.recipients
    }

    /// Everything handlers contributed so far.
    pub const fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Template substitutions.
    pub const fn substitutions(&self) -> &Substitutions {
        &self.context.substitutions
    }

    /// Resolved references.
    pub const fn references(&self) -> &Map<String, Value> {
        &self.context.references
    }

    /// Content blocks.
    pub const fn content(&self) -> &Map<String, Value> {
        &self.context.content
    }

    /// Template key handed to the transport.
    pub fn mail_key(&self) -> &str {
        &self.context.mail_key
    }

    /// Module handed to the transport.
    pub fn mail_module(&self) -> &str {
        &self.context.mail_module
    }

    /// Whether the transport will be told to deliver.
    pub const fn ready_to_send(&self) -> bool {
        self.ready_to_send
    }

    /// Current pipeline state.
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// Give back the stored item.
    pub fn into_raw(self) -> RawItem {
        self.raw
    }
}

impl From<QueueItem> for ItemData {
    fn from(item: QueueItem) -> Self {
        item.raw.data
    }
}

impl From<QueueItem> for RawItem {
    fn from(item: QueueItem) -> Self {
        item.raw
    }
}
