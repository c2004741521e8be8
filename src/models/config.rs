use serde::{Deserialize, Serialize};

/// User preferences persisted to `Preferences.yaml`.
///
/// The dark-mode flag is deliberately the only persisted value; scan results
/// and generated payloads never touch disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    #[serde(rename = "Dark Mode", default)]
    pub dark_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { dark_mode: false }
    }
}
