//! Producer- and operator-facing API surface.

pub mod api;

pub use api::{
    drain_all, enqueue_notification, enqueue_subscriptions, health, list_queues, Health,
    NotificationRequest, QueueSnapshot,
};
