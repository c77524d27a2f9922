//! Queue store backends.

pub mod file;
pub mod memory;

pub use file::{is_file_safe_queue_name, FileStore};
pub use memory::InMemoryStore;
