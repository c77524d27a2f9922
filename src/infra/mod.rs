//! Infrastructure adapters for queue stores, mail transports and entity lookup.

pub mod entities;
pub mod store;
pub mod transport;

pub use entities::InMemoryEntities;
pub use store::{FileStore, InMemoryStore};
pub use transport::{LogTransport, RecordingTransport};
