//! # Subscription Notify
//!
//! Durable, lease-based notification queues for subscription email.
//!
//! Producers record "something happened" as a queue item carrying the
//! subscribers to notify. Workers later drain each named queue: every claimed
//! item is enriched by a three-stage handler pipeline and handed to a mail
//! transport, then deleted on success or released for a later run on failure.
//! Delivery is at-least-once; the store's atomic claim is the only
//! coordination between workers.
//!
//! ## Key Pieces
//!
//! - **Subscriber**: immutable snapshot of one confirmed, active subscription
//! - **Event bus**: ordered handlers for references, common tokens and
//!   per-recipient tokens, registered once at startup
//! - **Queue item**: runs the stages, gates readiness, calls the transport
//! - **Named queue**: binds a channel to the store and collaborators, drains
//!   within an optional wall-clock budget
//! - **Registry**: explicit name -> queue map; unknown names are an error
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use subscription_notify::core::{EventBus, FixedLocale, ItemData, QueueRegistry, QueueServices};
//! use subscription_notify::infra::{InMemoryStore, LogTransport};
//!
//! let bus = EventBus::builder()
//!     .on_common_tokens_fn(|event| {
//!         event.substitutions_mut().common.insert("title".into(), "Weekly Digest".into());
//!         Ok(())
//!     })
//!     .build();
//! let services = QueueServices::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(bus),
//!     Arc::new(LogTransport),
//!     Arc::new(FixedLocale::default()),
//! );
//! let mut registry = QueueRegistry::new(services);
//! registry.register("digest", "Automated Notification");
//!
//! let digest = registry.get("digest")?;
//! digest.create_item(ItemData::new(recipients))?;
//! let result = digest.process(Some(Duration::from_secs(60)));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core notification abstractions: subscribers, pipeline, queues, registry.
pub mod core;
/// Configuration models for channels and store backends.
pub mod config;
/// Builders to construct registries from configuration.
pub mod builders;
/// Infrastructure adapters for stores, transports and entity lookup.
pub mod infra;
/// Producer- and operator-facing API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
