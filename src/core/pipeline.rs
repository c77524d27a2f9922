//! Token-population pipeline: build context, stage events and the handler bus.
//!
//! Handlers are registered once, in order, through [`EventBusBuilder`]; the
//! resulting [`EventBus`] is read-only and shared by every named queue. Each
//! stage runs its handlers in registration order and stops at the first
//! error, which fails that stage only.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{RawItem, StageError, Subscriber};

/// Values substituted into the mail template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Substitutions {
    /// Tokens shared by every recipient.
    pub common: Map<String, Value>,
    /// Per-recipient tokens keyed by recipient email. Recipients sharing an
    /// address share one map, matching the single message that address gets.
    pub subscribers: BTreeMap<String, Map<String, Value>>,
    /// Transport template to render with, if any.
    pub template_id: Option<String>,
    /// Message subject.
    pub subject: String,
}

/// Mutable state handlers contribute to while an item is enriched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildContext {
    /// Template substitutions.
    pub substitutions: Substitutions,
    /// Entities and values resolved for later stages.
    pub references: Map<String, Value>,
    /// Free-form content blocks for the template.
    pub content: Map<String, Value>,
    /// Template key handed to the transport.
    pub mail_key: String,
    /// Module handed to the transport.
    pub mail_module: String,
}

impl BuildContext {
    /// Fresh context with the queue's defaults.
    pub fn new(
        mail_module: impl Into<String>,
        mail_key: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            substitutions: Substitutions {
                subject: subject.into(),
                ..Substitutions::default()
            },
            mail_key: mail_key.into(),
            mail_module: mail_module.into(),
            ..Self::default()
        }
    }

    /// Token map for one recipient, created on first access.
    ///
    /// Keyed by email: a later recipient with the same address sees and
    /// overwrites the tokens of an earlier one.
    pub fn subscriber_tokens_mut(&mut self, recipient: &Subscriber) -> &mut Map<String, Value> {
        self.substitutions
            .subscribers
            .entry(recipient.email().to_owned())
            .or_default()
    }
}

/// Dispatched once, when a claimed item is wrapped.
pub struct ReferencesEvent<'a> {
    item: &'a RawItem,
    context: &'a mut BuildContext,
}

impl<'a> ReferencesEvent<'a> {
    pub(crate) fn new(item: &'a RawItem, context: &'a mut BuildContext) -> Self {
        Self { item, context }
    }

    /// The item being enriched.
    pub const fn item(&self) -> &RawItem {
        self.item
    }

    /// Whole build context.
    pub fn context(&mut self) -> &mut BuildContext {
        &mut *self.context
    }

    /// Shortcut to the references map.
    pub fn references_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.context.references
    }
}

/// Dispatched once per processing pass to fill shared tokens.
pub struct CommonTokensEvent<'a> {
    item: &'a RawItem,
    context: &'a mut BuildContext,
}

impl<'a> CommonTokensEvent<'a> {
    pub(crate) fn new(item: &'a RawItem, context: &'a mut BuildContext) -> Self {
        Self { item, context }
    }

    /// The item being enriched.
    pub const fn item(&self) -> &RawItem {
        self.item
    }

    /// References resolved when the item was wrapped.
    pub fn references(&self) -> &Map<String, Value> {
        &self.context.references
    }

    /// Whole build context.
    pub fn context(&mut self) -> &mut BuildContext {
        &mut *self.context
    }

    /// Shortcut to the substitutions.
    pub fn substitutions_mut(&mut self) -> &mut Substitutions {
        &mut self.context.substitutions
    }
}

/// Dispatched once per recipient, in list order.
pub struct SubscriberTokensEvent<'a> {
    item: &'a RawItem,
    context: &'a mut BuildContext,
    recipient: &'a Subscriber,
    index: usize,
}

impl<'a> SubscriberTokensEvent<'a> {
    pub(crate) fn new(
        item: &'a RawItem,
        context: &'a mut BuildContext,
        recipient: &'a Subscriber,
        index: usize,
    ) -> Self {
        Self {
            item,
            context,
            recipient,
            index,
        }
    }

    /// The item being enriched.
    pub const fn item(&self) -> &RawItem {
        self.item
    }

    /// Recipient this dispatch is for.
    pub const fn recipient(&self) -> &Subscriber {
        self.recipient
    }

    /// Position of the recipient in the item's list.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// References resolved when the item was wrapped.
    pub fn references(&self) -> &Map<String, Value> {
        &self.context.references
    }

    /// Whole build context.
    pub fn context(&mut self) -> &mut BuildContext {
        &mut *self.context
    }

    /// Token map for this recipient.
    pub fn tokens_mut(&mut self) -> &mut Map<String, Value> {
        self.context.subscriber_tokens_mut(self.recipient)
    }
}

/// Handler for the references stage. Failures are logged and ignored.
pub trait ReferenceHandler: Send + Sync {
    /// Populate references for later stages.
    fn resolve_references(&self, event: &mut ReferencesEvent<'_>) -> Result<(), StageError>;
}

/// Handler for the common tokens stage.
pub trait CommonTokenHandler: Send + Sync {
    /// Populate shared tokens and the subject.
    fn populate_tokens(&self, event: &mut CommonTokensEvent<'_>) -> Result<(), StageError>;
}

/// Handler for the per-recipient tokens stage.
pub trait SubscriberTokenHandler: Send + Sync {
    /// Populate tokens for one recipient.
    fn populate_subscriber_tokens(
        &self,
        event: &mut SubscriberTokensEvent<'_>,
    ) -> Result<(), StageError>;
}

/// Adapter letting plain closures act as stage handlers.
struct FnHandler<F>(F);

impl<F> ReferenceHandler for FnHandler<F>
where
    F: Fn(&mut ReferencesEvent<'_>) -> Result<(), StageError> + Send + Sync,
{
    fn resolve_references(&self, event: &mut ReferencesEvent<'_>) -> Result<(), StageError> {
        (self.0)(event)
    }
}

impl<F> CommonTokenHandler for FnHandler<F>
where
    F: Fn(&mut CommonTokensEvent<'_>) -> Result<(), StageError> + Send + Sync,
{
    fn populate_tokens(&self, event: &mut CommonTokensEvent<'_>) -> Result<(), StageError> {
        (self.0)(event)
    }
}

impl<F> SubscriberTokenHandler for FnHandler<F>
where
    F: Fn(&mut SubscriberTokensEvent<'_>) -> Result<(), StageError> + Send + Sync,
{
    fn populate_subscriber_tokens(
        &self,
        event: &mut SubscriberTokensEvent<'_>,
    ) -> Result<(), StageError> {
        (self.0)(event)
    }
}

/// Ordered, immutable set of stage handlers.
#[derive(Default)]
pub struct EventBus {
    references: Vec<Box<dyn ReferenceHandler>>,
    common: Vec<Box<dyn CommonTokenHandler>>,
    subscriber: Vec<Box<dyn SubscriberTokenHandler>>,
}

impl EventBus {
    /// Start registering handlers.
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// Bus without handlers; every stage trivially succeeds.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn dispatch_references(
        &self,
        event: &mut ReferencesEvent<'_>,
    ) -> Result<(), StageError> {
        self.references
            .iter()
            .try_for_each(|handler| handler.resolve_references(event))
    }

    pub(crate) fn dispatch_common_tokens(
        &self,
        event: &mut CommonTokensEvent<'_>,
    ) -> Result<(), StageError> {
        self.common
            .iter()
            .try_for_each(|handler| handler.populate_tokens(event))
    }

    pub(crate) fn dispatch_subscriber_tokens(
        &self,
        event: &mut SubscriberTokensEvent<'_>,
    ) -> Result<(), StageError> {
        self.subscriber
            .iter()
            .try_for_each(|handler| handler.populate_subscriber_tokens(event))
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("references", &self.references.len())
            .field("common", &self.common.len())
            .field("subscriber", &self.subscriber.len())
            .finish()
    }
}

/// Collects handlers at startup, in the order they should run.
#[derive(Default)]
pub struct EventBusBuilder {
    bus: EventBus,
}

impl EventBusBuilder {
    /// Append a references-stage handler.
    #[must_use]
    pub fn on_references(mut self, handler: impl ReferenceHandler + 'static) -> Self {
        self.bus.references.push(Box::new(handler));
        self
    }

    /// Append a references-stage closure.
    #[must_use]
    pub fn on_references_fn<F>(self, handler: F) -> Self
    where
        F: Fn(&mut ReferencesEvent<'_>) -> Result<(), StageError> + Send + Sync + 'static,
    {
        self.on_references(FnHandler(handler))
    }

    /// Append a common-tokens handler.
    #[must_use]
    pub fn on_common_tokens(mut self, handler: impl CommonTokenHandler + 'static) -> Self {
        self.bus.common.push(Box::new(handler));
        self
    }

    /// Append a common-tokens closure.
    #[must_use]
    pub fn on_common_tokens_fn<F>(self, handler: F) -> Self
    where
        F: Fn(&mut CommonTokensEvent<'_>) -> Result<(), StageError> + Send + Sync + 'static,
    {
        self.on_common_tokens(FnHandler(handler))
    }

    /// Append a per-recipient handler.
    #[must_use]
    pub fn on_subscriber_tokens(mut self, handler: impl SubscriberTokenHandler + 'static) -> Self {
        self.bus.subscriber.push(Box::new(handler));
        self
    }

    /// Append a per-recipient closure.
    #[must_use]
    pub fn on_subscriber_tokens_fn<F>(self, handler: F) -> Self
    where
        F: Fn(&mut SubscriberTokensEvent<'_>) -> Result<(), StageError> + Send + Sync + 'static,
    {
        self.on_subscriber_tokens(FnHandler(handler))
    }

    /// Freeze the registration.
    pub fn build(self) -> EventBus {
        self.bus
    }
}
