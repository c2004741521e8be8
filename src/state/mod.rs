// State management module
//
// Provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::models::{AppState, Section};
use crate::services::scanner::ScanPhase;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// Emitted to notify interested parties (primarily the GUI) about state
/// changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Dark mode was toggled
    ThemeChanged { dark_mode: bool },

    /// The visible section changed
    SectionChanged { section: Section },

    /// The live scan session moved to a new phase
    ScanPhaseChanged { phase: ScanPhase },

    /// A payload was decoded (live session or uploaded image)
    PayloadDecoded { payload: String },

    /// A symbol was generated for the given payload string
    GenerationCompleted { content: String },

    /// The one-line status message changed
    StatusChanged { message: String },
}

/// Thread-safe state manager with event emission
///
/// The central state management component:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading without holding state across calls
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It captures the old state,
    /// applies the update function, diffs old against new, and emits one
    /// event per detected change.
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver notified of all future state changes. Multiple
    /// subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Diff two states and generate the events to emit
    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.dark_mode != new.dark_mode {
            changes.push(StateChange::ThemeChanged {
                dark_mode: new.dark_mode,
            });
        }

        if old.section != new.section {
            changes.push(StateChange::SectionChanged {
                section: new.section,
            });
        }

        if old.scan_phase != new.scan_phase {
            changes.push(StateChange::ScanPhaseChanged {
                phase: new.scan_phase,
            });
        }

        if old.last_payload != new.last_payload {
            if let Some(ref payload) = new.last_payload {
                changes.push(StateChange::PayloadDecoded {
                    payload: payload.clone(),
                });
            }
        }

        if old.last_generated != new.last_generated {
            if let Some(ref content) = new.last_generated {
                changes.push(StateChange::GenerationCompleted {
                    content: content.clone(),
                });
            }
        }

        if old.status_message != new.status_message {
            changes.push(StateChange::StatusChanged {
                message: new.status_message.clone(),
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Toggle or set dark mode
    pub fn set_dark_mode(&self, dark_mode: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.dark_mode = dark_mode;
        })
    }

    /// Switch the visible section
    pub fn set_section(&self, section: Section) -> Vec<StateChange> {
        self.update(|state| {
            state.section = section;
        })
    }

    /// Mirror the scan session phase
    pub fn set_scan_phase(&self, phase: ScanPhase) -> Vec<StateChange> {
        self.update(|state| {
            state.scan_phase = phase;
        })
    }

    /// Record a decoded payload
    pub fn set_decoded_payload(&self, payload: String) -> Vec<StateChange> {
        self.update(|state| {
            state.last_payload = Some(payload.clone());
        })
    }

    /// Record a generated payload string
    pub fn set_generated(&self, content: String) -> Vec<StateChange> {
        self.update(|state| {
            state.last_generated = Some(content.clone());
        })
    }

    /// Update the status line
    pub fn set_status(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| {
            state.status_message = message.clone();
        })
    }

    /// Clear scan results ahead of a new session or upload
    pub fn reset_scan_result(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.reset_scan_result();
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(!state.dark_mode);
        assert!(!state.is_scanning());
        assert!(state.last_payload.is_none());
    }

    #[test]
    fn test_update_with_change_detection() {
        let manager = StateManager::new();

        let changes = manager.update(|state| {
            state.dark_mode = true;
            state.section = Section::Scan;
        });

        assert_eq!(changes.len(), 2);
        assert!(matches!(
            changes[0],
            StateChange::ThemeChanged { dark_mode: true }
        ));
        assert!(matches!(
            changes[1],
            StateChange::SectionChanged {
                section: Section::Scan
            }
        ));
    }

    #[test]
    fn test_no_events_when_nothing_changed() {
        let manager = StateManager::new();
        let changes = manager.update(|state| {
            state.dark_mode = false;
        });
        assert!(changes.is_empty());
    }

    #[test]
    fn test_scan_phase_change() {
        let manager = StateManager::new();

        let changes = manager.set_scan_phase(ScanPhase::Scanning);
        assert_eq!(changes.len(), 1);
        assert!(matches!(
            changes[0],
            StateChange::ScanPhaseChanged {
                phase: ScanPhase::Scanning
            }
        ));
        assert!(manager.read(|s| s.is_scanning()));
    }

    #[test]
    fn test_decoded_payload_emits_event() {
        let manager = StateManager::new();

        let changes = manager.set_decoded_payload("https://example.com".to_string());
        assert!(changes
            .iter()
            .any(|c| matches!(c, StateChange::PayloadDecoded { .. })));

        let state = manager.snapshot();
        assert_eq!(state.last_payload.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_reset_scan_result_emits_no_decode_event() {
        let manager = StateManager::new();
        manager.set_decoded_payload("x".to_string());

        let changes = manager.reset_scan_result();
        // Clearing a payload must not look like a fresh decode.
        assert!(!changes
            .iter()
            .any(|c| matches!(c, StateChange::PayloadDecoded { .. })));
        assert!(manager.read(|s| s.last_payload.is_none()));
    }

    #[test]
    fn test_status_change() {
        let manager = StateManager::new();
        let changes = manager.set_status("Camera started");
        assert!(matches!(changes[0], StateChange::StatusChanged { .. }));
        assert_eq!(manager.read(|s| s.status_message.clone()), "Camera started");
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.set_dark_mode(true);

        let event = rx.try_recv();
        assert!(event.is_ok());
        assert!(matches!(
            event.unwrap(),
            StateChange::ThemeChanged { dark_mode: true }
        ));
    }

    #[test]
    fn test_multiple_subscribers() {
        let manager = StateManager::new();
        let mut rx1 = manager.subscribe();
        let mut rx2 = manager.subscribe();

        manager.set_section(Section::Scan);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_read_with_closure() {
        let manager = StateManager::new();
        manager.set_generated("tel:+15550100".to_string());

        let generated = manager.read(|state| state.last_generated.clone());
        assert_eq!(generated.as_deref(), Some("tel:+15550100"));
    }

    #[test]
    fn test_clone_state_manager() {
        let manager1 = StateManager::new();
        let manager2 = manager1.clone();

        manager1.set_dark_mode(true);

        let state = manager2.snapshot();
        assert!(state.dark_mode);
    }
}
