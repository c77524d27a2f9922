//! Registry of explicitly wired named queues.
//!
//! There is no implicit creation: a typo in a channel name fails with
//! [`NotifyError::QueueNotRegistered`] instead of producing a queue with
//! default collaborators and subject.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{NamedQueue, NotifyError, QueueServices};

/// Named queues keyed by channel name, plus the collaborators new queues get.
#[derive(Debug)]
pub struct QueueRegistry {
    services: QueueServices,
    queues: HashMap<String, Arc<NamedQueue>>,
}

impl QueueRegistry {
    /// Empty registry bound to the shared collaborators.
    pub fn new(services: QueueServices) -> Self {
        Self {
            services,
            queues: HashMap::new(),
        }
    }

    /// Build a queue bound to this registry's collaborators, without
    /// registering it.
    pub fn queue_factory(&self, name: &str, default_subject: &str) -> NamedQueue {
        NamedQueue::new(name, default_subject, self.services.clone())
    }

    /// Register a queue under its own name, replacing any previous one.
    pub fn add_queue(&mut self, queue: impl Into<Arc<NamedQueue>>) -> Arc<NamedQueue> {
        let queue = queue.into();
        let name = queue.name().to_owned();
        if self
            .queues
            .insert(name.clone(), Arc::clone(&queue))
            .is_some()
        {
            tracing::warn!(queue = %name, "replaced previously registered queue");
        } else {
            tracing::debug!(queue = %name, "queue registered");
        }
        queue
    }

    /// Shorthand for `add_queue(queue_factory(name, subject))`.
    pub fn register(&mut self, name: &str, default_subject: &str) -> Arc<NamedQueue> {
        let queue = self.queue_factory(name, default_subject);
        self.add_queue(queue)
    }

    /// Look up a registered queue.
    ///
    /// # Errors
    ///
    /// [`NotifyError::QueueNotRegistered`] when `name` was never added.
    pub fn get(&self, name: &str) -> Result<Arc<NamedQueue>, NotifyError> {
        self.queues
            .get(name)
            .cloned()
            .ok_or_else(|| NotifyError::QueueNotRegistered(name.to_owned()))
    }

    /// Registered names, sorted.
    pub fn queues(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.queues.contains_key(name)
    }

    /// Number of registered queues.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Collaborators handed to queues built by this registry.
    pub const fn services(&self) -> &QueueServices {
        &self.services
    }
}
