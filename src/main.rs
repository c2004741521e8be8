//! QRDesk - Desktop QR code generator and camera scanner
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend for QRDesk. It
//! initializes:
//! - Logging infrastructure (rotating file logs + console output)
//! - Tokio async runtime (camera acquisition and the sample loop run here)
//! - State management ([`StateManager`])
//! - Preference loading ([`PrefsManager`] - the persisted dark-mode flag)
//! - The scan controller over the nokhwa camera and rqrr decoder seams
//! - GUI controller ([`GuiController`] - bridges the Slint UI with the rest)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop (blocking, synchronous)
//! - **Tokio workers**: Camera acquisition and the frame sampling loop
//! - **Subscription threads**: Background std::threads pumping state and
//!   scan events into UI updates

use anyhow::Result;
use qrdesk::services::{CameraConstraints, NokhwaProvider, RqrrDecoder, ScanController};
use qrdesk::ui::GuiController;
use qrdesk::{APP_NAME, Metrics, PrefsManager, StateManager, VERSION};
use std::sync::Arc;
use std::time::Duration;

/// Interval between live sample ticks (~10 fps, matching the scan cadence
/// the decoder comfortably keeps up with).
const SAMPLE_TICK: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    // Setup logging with both file and console output. The guard must stay
    // alive for the lifetime of the process.
    let _guard = qrdesk::logging::setup_logging("logs", "qrdesk", false, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Tokio runtime for camera acquisition and the sampling loop
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("qrdesk-worker")
        .build()?;

    tracing::info!("Tokio runtime initialized");

    let state_manager = Arc::new(StateManager::new());
    let metrics = Arc::new(Metrics::new());

    // Load the persisted preference (the dark-mode flag) into state
    let prefs_manager = Arc::new(PrefsManager::new("QRDesk Data")?);
    let prefs = prefs_manager.load_preferences()?;
    state_manager.set_dark_mode(prefs.dark_mode);
    tracing::info!("Preferences loaded: dark_mode={}", prefs.dark_mode);

    // Scan controller over the production camera and decoder seams
    let scanner = ScanController::new(
        Arc::new(NokhwaProvider::new()),
        Arc::new(RqrrDecoder::new()),
        CameraConstraints::default(),
        SAMPLE_TICK,
        Arc::clone(&metrics),
    );

    let gui_controller = GuiController::new(
        Arc::clone(&state_manager),
        Arc::clone(&prefs_manager),
        scanner.clone(),
        Arc::clone(&metrics),
        runtime.handle().clone(),
    )?;

    tracing::info!("GUI controller initialized, launching window");

    // Run the GUI (blocks until the window is closed). The tokio runtime
    // stays alive in the background to service the scan loop.
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    // Cancel a live scan session left running when the window closed
    if state_manager.read(|s| s.is_scanning()) {
        tracing::warn!("Window closed during a scan session - cancelling...");
        scanner.stop();
        std::thread::sleep(Duration::from_millis(250));
    }

    runtime.shutdown_timeout(Duration::from_secs(5));

    metrics.log_summary();
    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
