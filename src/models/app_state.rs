use crate::services::scanner::ScanPhase;

/// Which of the two main sections is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Generate,
    Scan,
}

/// Single source of truth for UI-facing application state.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by
/// [`crate::state::StateManager`]. Never access it directly - go through
/// [`StateManager`](crate::state::StateManager) methods:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with
///   automatic change events
///
/// The scan phase stored here is a mirror of the
/// [`ScanController`](crate::services::scanner::ScanController)'s own session
/// state, maintained by the UI controller from scan events; the controller's
/// session object remains the authority.
#[derive(Clone, Debug)]
pub struct AppState {
    // Preferences
    pub dark_mode: bool,

    // Navigation
    pub section: Section,

    // Live scan mirror
    pub scan_phase: ScanPhase,

    // Results
    pub last_payload: Option<String>,
    pub last_generated: Option<String>,

    // One-line status shown under the active section
    pub status_message: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dark_mode: false,
            section: Section::Generate,
            scan_phase: ScanPhase::Idle,
            last_payload: None,
            last_generated: None,
            status_message: String::new(),
        }
    }
}

impl AppState {
    /// True while a live session is anywhere between start and full stop.
    pub fn is_scanning(&self) -> bool {
        self.scan_phase != ScanPhase::Idle
    }

    /// Clear scan results ahead of a new session or upload.
    pub fn reset_scan_result(&mut self) {
        self.last_payload = None;
    }
}
