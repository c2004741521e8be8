// UI module - GUI logic and event loop bridge
//
// This module contains:
// - UiBridge: Coordinates between the tokio async runtime and the Slint
//   event loop
// - GuiController: Main controller that wires up the UI with state
//   management and the scan/generation services

pub mod bridge;
pub mod controller;

pub use bridge::UiBridge;
pub use controller::GuiController;
