//! User settings file.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Context, Result};
use serde::Deserialize;

use markfile_core::OpsConfig;

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Engine configuration, the `[ops]` table.
    #[serde(default)]
    pub ops: OpsConfig,

    /// Command used by `edit`; falls back to `$VISUAL`, `$EDITOR`, `vi`.
    #[serde(default)]
    pub editor: Option<String>,
}

impl Settings {
    /// Default location of the settings file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("markfile").join("config.toml"))
    }

    /// Load settings from `explicit`, or from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    fn parse(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.ops.validate().map_err(|e| eyre!(e))?;
        Ok(settings)
    }

    /// The editor command line to launch.
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|cmd| !cmd.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string())
    }
}
