use crate::models::Preferences;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Manager for loading and saving the preferences file.
///
/// Preferences live in a single YAML file (`Preferences.yaml`) inside the
/// application's data directory. A missing file is not an error - defaults
/// are returned and the file is created on the first save.
#[derive(Debug, Clone)]
pub struct PrefsManager {
    config_dir: Utf8PathBuf,
    prefs_path: Utf8PathBuf,
}

impl PrefsManager {
    /// Create a new PrefsManager rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            prefs_path: config_dir.join("Preferences.yaml"),
            config_dir,
        })
    }

    /// Load the preferences file.
    ///
    /// # Returns
    /// The loaded Preferences, or defaults if the file doesn't exist
    pub fn load_preferences(&self) -> Result<Preferences> {
        if !self.prefs_path.exists() {
            tracing::warn!(
                "Preferences file not found at {}, using defaults",
                self.prefs_path
            );
            return Ok(Preferences::default());
        }

        let file_contents = fs::read_to_string(&self.prefs_path)
            .with_context(|| format!("Failed to read preferences: {}", self.prefs_path))?;

        let prefs: Preferences = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse preferences: {}", self.prefs_path))?;

        tracing::info!("Loaded preferences from {}", self.prefs_path);
        Ok(prefs)
    }

    /// Save the preferences file.
    pub fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(prefs).context("Failed to serialize preferences to YAML")?;

        fs::write(&self.prefs_path, yaml_string)
            .with_context(|| format!("Failed to write preferences: {}", self.prefs_path))?;

        tracing::info!("Saved preferences to {}", self.prefs_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
