//! Core notification abstractions: subscribers, the enrichment pipeline,
//! named queues and their registry.

pub mod audit;
pub mod error;
pub mod locale;
pub mod named_queue;
pub mod pipeline;
pub mod process_result;
pub mod queue_item;
pub mod registry;
pub mod store;
pub mod subscriber;
pub mod transport;

pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, NotifyError, StageError};
pub use locale::{FixedLocale, LanguageResolver};
pub use named_queue::{
    NamedQueue, QueueServices, SharedAuditSink, DEFAULT_LEASE, DEFAULT_MAIL_MODULE,
};
pub use pipeline::{
    BuildContext, CommonTokenHandler, CommonTokensEvent, EventBus, EventBusBuilder,
    ReferenceHandler, ReferencesEvent, SubscriberTokenHandler, SubscriberTokensEvent,
    Substitutions,
};
pub use process_result::{Counter, ProcessResult};
pub use queue_item::{PipelineState, QueueItem};
pub use registry::QueueRegistry;
pub use store::{ItemData, QueueStore, RawItem};
pub use subscriber::{
    EntityRepository, Subscriber, SubscriptionRecord, TargetEntity, INVALID_DATE,
    LONG_DATE_FORMAT,
};
pub use transport::{MailParams, MailRequest, MailResult, MailTransport};
