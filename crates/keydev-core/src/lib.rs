//! Core types, configuration, and error handling for the keydev pipeline.
//!
//! This crate provides the shared foundation used by all other keydev crates:
//! - [`KeydevError`] — unified error type using `thiserror`
//! - [`KeydevConfig`] — configuration loaded from `keydev.toml`
//! - Shared types: [`ChangeSet`], [`CodeChange`], [`ChangeType`],
//!   [`DeveloperScore`]

mod config;
mod error;
mod types;

pub use config::{
    DecayKind, GraphConfig, KeydevConfig, MalformedPolicy, MetricsConfig, WindowConfig,
};
pub use error::KeydevError;
pub use types::{ChangeSet, ChangeType, CodeChange, DeveloperScore};

/// A convenience `Result` type for keydev operations.
pub type Result<T> = std::result::Result<T, KeydevError>;
