//! Named queue: one notification channel bound to the store and the shared
//! collaborators, with the time-budgeted drain loop.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::{
    build_audit_event, AuditSink, EventBus, ItemData, LanguageResolver, MailTransport,
    NotifyError, ProcessResult, QueueItem, QueueStore, RawItem,
};
use crate::util::serde::ItemId;

/// Lease taken on each claimed item unless configured otherwise.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(30);

/// Module name handed to the transport unless configured otherwise.
pub const DEFAULT_MAIL_MODULE: &str = "subscription_notify";

/// Audit sink shared between a queue and whoever reads the trail.
pub type SharedAuditSink = Arc<Mutex<dyn AuditSink>>;

/// Stateless collaborators shared by every named queue.
#[derive(Clone)]
pub struct QueueServices {
    /// Durable item storage.
    pub store: Arc<dyn QueueStore>,
    /// Stage handlers.
    pub bus: Arc<EventBus>,
    /// Outbound mail.
    pub transport: Arc<dyn MailTransport>,
    /// Language resolution.
    pub locale: Arc<dyn LanguageResolver>,
}

impl QueueServices {
    /// Bundle the collaborators.
    pub fn new(
        store: Arc<dyn QueueStore>,
        bus: Arc<EventBus>,
        transport: Arc<dyn MailTransport>,
        locale: Arc<dyn LanguageResolver>,
    ) -> Self {
        Self {
            store,
            bus,
            transport,
            locale,
        }
    }
}

impl std::fmt::Debug for QueueServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueServices")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

/// A notification channel.
pub struct NamedQueue {
    name: String,
    default_subject: String,
    mail_module: String,
    lease: Duration,
    services: QueueServices,
    audit: Option<SharedAuditSink>,
}

impl std::fmt::Debug for NamedQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedQueue")
            .field("name", &self.name)
            .field("default_subject", &self.default_subject)
            .field("mail_module", &self.mail_module)
            .field("lease", &self.lease)
            .finish_non_exhaustive()
    }
}

impl NamedQueue {
    /// Queue `name` with the subject used when handlers set none.
    pub fn new(
        name: impl Into<String>,
        default_subject: impl Into<String>,
        services: QueueServices,
    ) -> Self {
        Self {
            name: name.into(),
            default_subject: default_subject.into(),
            mail_module: DEFAULT_MAIL_MODULE.to_owned(),
            lease: DEFAULT_LEASE,
            services,
            audit: None,
        }
    }

    /// Override the lease taken by [`NamedQueue::process`].
    #[must_use]
    pub const fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Override the module handed to the transport.
    #[must_use]
    pub fn with_mail_module(mut self, mail_module: impl Into<String>) -> Self {
        self.mail_module = mail_module.into();
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: SharedAuditSink) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subject used until a handler replaces it.
    pub fn default_subject(&self) -> &str {
        &self.default_subject
    }

    /// Module handed to the transport.
    pub fn mail_module(&self) -> &str {
        &self.mail_module
    }

    /// Lease taken per item during a drain.
    pub const fn lease(&self) -> Duration {
        self.lease
    }

    /// Persist a notification job. Accepts a raw payload or a wrapped item.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn create_item(&self, data: impl Into<ItemData>) -> Result<ItemId, NotifyError> {
        let data = data.into();
        let item_id = self.services.store.create_item(&self.name, &data)?;
        tracing::debug!(
            queue = %self.name,
            item_id,
            recipients = data.recipients.len(),
            "notification queued"
        );
        Ok(item_id)
    }

    /// Claim the next item and wrap it, running the references stage.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn claim_item(&self, lease: Duration) -> Result<Option<QueueItem>, NotifyError> {
        Ok(self
            .claim_raw(lease)?
            .map(|raw| self.wrap(raw)))
    }

    /// Items currently stored for this queue, leased or not.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn number_of_items(&self) -> Result<usize, NotifyError> {
        self.services.store.number_of_items(&self.name)
    }

    /// Drain the queue until it is empty or `time_limit` has elapsed.
    ///
    /// `None` (or a zero duration) means no budget. The budget is checked
    /// between items only; an item in flight always finishes. Failed items
    /// stay leased until the loop ends and are then released together, so a
    /// bad item is retried by the next run rather than this one. If a run
    /// outlives the lease and the store hands a failed item back, it is
    /// skipped; once only such items come back the run ends.
    pub fn process(&self, time_limit: Option<Duration>) -> ProcessResult {
        let deadline = time_limit
            .filter(|limit| !limit.is_zero())
            .map(|limit| Instant::now() + limit);
        let mut result = ProcessResult::new();
        let mut held: Vec<RawItem> = Vec::new();
        let mut held_ids: HashSet<ItemId> = HashSet::new();
        let mut reclaimed_in_a_row = 0;

        loop {
            let raw = match self.claim_raw(self.lease) {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(queue = %self.name, "claim failed, ending run: {err}");
                    result.add_fail();
                    result.add_exception(err.to_string());
                    break;
                }
            };
            let item_id = raw.item_id;

            // A held item whose lease ran out during a long run. The claim
            // re-leased it; it is released with the others after the loop.
            if held_ids.contains(&item_id) {
                reclaimed_in_a_row += 1;
                tracing::debug!(queue = %self.name, item_id, "skipping item failed earlier this run");
                if reclaimed_in_a_row >= held_ids.len()
                    || deadline.is_some_and(|deadline| Instant::now() >= deadline)
                {
                    break;
                }
                continue;
            }
            reclaimed_in_a_row = 0;

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut item = self.wrap(raw.clone());
                self.process_item(&mut item)
            }));

            match outcome {
                Ok(true) => {
                    result.add_success();
                    self.audit(item_id, "sent", None);
                    if let Err(err) = self.services.store.delete_item(&raw) {
                        tracing::error!(
                            queue = %self.name,
                            item_id,
                            "delivered item could not be deleted: {err}"
                        );
                        result.add_exception(err.to_string());
                    }
                }
                Ok(false) => {
                    result.add_fail();
                    self.audit(item_id, "failed", None);
                    held_ids.insert(item_id);
                    held.push(raw);
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(
                        queue = %self.name,
                        item_id,
                        "item processing panicked: {message}"
                    );
                    result.add_fail();
                    result.add_exception(format!("item {item_id}: {message}"));
                    self.audit(item_id, "failed", Some(message));
                    held_ids.insert(item_id);
                    held.push(raw);
                }
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::debug!(queue = %self.name, "time budget exhausted");
                break;
            }
        }

        for raw in held {
            match self.services.store.release_item(&raw) {
                Ok(true) => self.audit(raw.item_id, "released", None),
                Ok(false) => tracing::warn!(
                    queue = %self.name,
                    item_id = raw.item_id,
                    "failed item vanished before release"
                ),
                Err(err) => {
                    tracing::error!(
                        queue = %self.name,
                        item_id = raw.item_id,
                        "failed item could not be released: {err}"
                    );
                    result.add_exception(err.to_string());
                }
            }
        }

        tracing::info!(
            queue = %self.name,
            success = result.success(),
            fail = result.fail(),
            skipped = result.skipped(),
            "queue run finished"
        );
        result
    }

    fn claim_raw(&self, lease: Duration) -> Result<Option<RawItem>, NotifyError> {
        let raw = self.services.store.claim_item(&self.name, lease)?;
        if let Some(raw) = &raw {
            self.audit(raw.item_id, "claim", None);
        }
        Ok(raw)
    }

    fn wrap(&self, raw: RawItem) -> QueueItem {
        QueueItem::new(
            raw,
            &self.default_subject,
            &self.mail_module,
            &self.services.bus,
        )
    }

    fn process_item(&self, item: &mut QueueItem) -> bool {
        item.process(
            &self.services.bus,
            self.services.transport.as_ref(),
            self.services.locale.as_ref(),
        )
    }

    fn audit(&self, item_id: ItemId, action: &str, detail: Option<String>) {
        if let Some(sink) = &self.audit {
            sink.lock()
                .record(build_audit_event(item_id, self.name.clone(), action, detail));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
