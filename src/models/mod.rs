//! Data models for the QRDesk application.
//!
//! - [`AppState`]: the central state container for UI-facing runtime state
//! - [`Section`]: which of the two main sections is visible
//! - [`Preferences`]: the persisted user preference (the dark-mode flag)
//!
//! Config structs derive `Serialize`/`Deserialize` for YAML persistence;
//! `AppState` is wrapped in `Arc<RwLock<>>` by
//! [`StateManager`](crate::state::StateManager) and mutated only through its
//! `update()` method.

pub mod app_state;
pub mod config;

pub use app_state::{AppState, Section};
pub use config::Preferences;
