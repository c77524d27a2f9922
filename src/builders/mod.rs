//! Builders to construct stores and queue registries from configuration.

pub mod registry_builder;

pub use registry_builder::{build_registry, build_store};
