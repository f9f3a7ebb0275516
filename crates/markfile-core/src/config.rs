//! Engine configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// How destination conflicts are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Prompt for every conflict.
    #[default]
    Ask,
    /// Replace the existing destination without asking.
    Overwrite,
    /// Leave the existing destination alone without asking.
    Skip,
}

/// Configuration for the operations engine.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OpsConfig {
    /// How to handle destination conflicts.
    #[builder(default)]
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Default answer of the "Continue?" prompt after a failed delete.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub delete_continue_default: bool,

    /// Default answer of the "Continue?" prompt after a failed copy or move.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub batch_continue_default: bool,

    /// Default answer of the "Continue?" prompt after a failed batch rename.
    #[builder(default = "false")]
    #[serde(default)]
    pub rename_continue_default: bool,

    /// Lines starting with this marker are ignored in edited lists.
    #[builder(default = "default_comment_marker()")]
    #[serde(default = "default_comment_marker")]
    pub comment_marker: String,

    /// Give copied directories the permission bits of their source.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub preserve_permissions: bool,
}

fn default_true() -> bool {
    true
}

fn default_comment_marker() -> String {
    "#".to_string()
}

/// A marker must be visible and must not swallow absolute paths.
fn validate_comment_marker(marker: &str) -> Result<(), String> {
    let marker = marker.trim_start();
    if marker.trim_end().is_empty() {
        return Err("Comment marker cannot be empty".to_string());
    }
    if marker.starts_with(std::path::is_separator) {
        return Err(format!(
            "Comment marker cannot start with a path separator: {marker:?}"
        ));
    }
    Ok(())
}

impl OpsConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.comment_marker {
            Some(ref marker) => validate_comment_marker(marker),
            None => Ok(()),
        }
    }
}

impl OpsConfig {
    /// Create a new config builder.
    pub fn builder() -> OpsConfigBuilder {
        OpsConfigBuilder::default()
    }

    /// Check a config that did not come through the builder (e.g. serde).
    pub fn validate(&self) -> Result<(), String> {
        validate_comment_marker(&self.comment_marker)
    }

    /// Check whether an edited line is a comment.
    pub fn is_comment(&self, line: &str) -> bool {
        line.starts_with(self.comment_marker.as_str())
    }
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Ask,
            delete_continue_default: true,
            batch_continue_default: true,
            rename_continue_default: false,
            comment_marker: default_comment_marker(),
            preserve_permissions: true,
        }
    }
}
