//! Mail transport adapters.

pub mod log;
pub mod memory;

pub use self::log::LogTransport;
pub use self::memory::{RecordingTransport, SentMail};
