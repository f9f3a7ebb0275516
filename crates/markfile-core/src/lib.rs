//! Core types for markfile.
//!
//! This crate provides the error taxonomy, path normalization helpers,
//! engine configuration and the read-only metadata reporter shared by the
//! markfile operations engine and its front ends.

mod config;
mod error;
pub mod metadata;
mod path;

pub use config::{ConflictPolicy, OpsConfig, OpsConfigBuilder};
pub use error::{ErrorCategory, OpsError, Result};
pub use metadata::{EntryKind, MetadataReport, Timestamps};
pub use path::{basename, has_trailing_separator, is_within, normalize_path, rebase};
