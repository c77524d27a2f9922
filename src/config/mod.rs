//! Configuration models for channels, store backends and defaults.

pub mod notifier;

pub use notifier::{ChannelConfig, NotifierConfig, StoreBackendConfig, CONFIG_PATH_ENV};
