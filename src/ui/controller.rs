// GUI Controller - Bridges the Slint UI with the scan and generation logic
//
// Coordinates between:
// - Slint UI (MainWindow)
// - StateManager (application state)
// - ScanController / GeneratorService (business logic)
// - UiBridge (async/GUI coordination)

use crate::config::PrefsManager;
use crate::metrics::Metrics;
use crate::models::{Preferences, Section};
use crate::services::generator::{GenerateError, GeneratorService, QrPayload, RenderOptions, WifiSecurity};
use crate::services::scanner::{ScanController, ScanError, ScanEvent, ScanPhase};
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::UiBridge;
use anyhow::{Context, Result};
use std::fs;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

// Include the generated Slint code
slint::include_modules!();

/// GUI controller wiring the Slint window to application state and logic.
///
/// - Sets up Slint callbacks (generate, save, start/stop scan, upload,
///   theme toggle, navigation)
/// - Subscribes to [`StateChange`] and [`ScanEvent`] streams and pushes the
///   resulting UI updates through the [`UiBridge`]
/// - Owns the file dialogs (`rfd`) for image upload and PNG export
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Event loop bridge for coordinating between tokio and Slint
    _bridge: UiBridge<MainWindow>,
}

impl GuiController {
    /// Create a new GUI controller.
    pub fn new(
        state_manager: Arc<StateManager>,
        prefs_manager: Arc<PrefsManager>,
        scanner: ScanController,
        metrics: Arc<Metrics>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        let bridge = UiBridge::new(&ui, tokio_handle);
        let generator = Arc::new(GeneratorService::new());

        // PNG bytes of the most recently generated symbol, kept for Save.
        let last_png: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));

        Self::sync_ui_with_state(&ui, &state_manager);

        Self::setup_callbacks(
            &ui,
            &bridge,
            &state_manager,
            &prefs_manager,
            &scanner,
            &generator,
            &metrics,
            &last_png,
        );
        Self::setup_state_subscription(&bridge, &state_manager, &metrics);
        Self::setup_scan_subscription(&bridge, &state_manager, &scanner);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
        })
    }

    /// Run the GUI (blocks until the window is closed).
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Initialize the UI from the current state. Called once at startup.
    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        let state = state_manager.snapshot();

        ui.set_dark_mode(state.dark_mode);
        ui.set_active_section(match state.section {
            Section::Generate => 0,
            Section::Scan => 1,
        });
        ui.set_is_scanning(state.is_scanning());
        ui.set_decoded_text(state.last_payload.clone().unwrap_or_default().into());
        ui.set_has_result(state.last_payload.is_some());
        ui.set_status_message(state.status_message.clone().into());

        Self::apply_payload_kind(ui, 0);

        tracing::debug!("UI synchronized with initial state");
    }

    /// Adjust form labels and field visibility for the selected payload kind.
    fn apply_payload_kind(ui: &MainWindow, kind: i32) {
        let (label_a, label_b, label_c, show_b, show_c, show_wifi) = match kind {
            1 => ("URL", "", "", false, false, false),
            2 => ("Phone number", "", "", false, false, false),
            3 => ("Phone number", "Message", "", true, false, false),
            4 => ("Email address", "Subject", "Body", true, true, false),
            5 => ("Network name (SSID)", "Password", "", true, false, true),
            _ => ("Text to encode", "", "", false, false, false),
        };

        ui.set_label_a(label_a.into());
        ui.set_label_b(label_b.into());
        ui.set_label_c(label_c.into());
        ui.set_show_field_b(show_b);
        ui.set_show_field_c(show_c);
        ui.set_show_wifi_options(show_wifi);
    }

    /// Build the structured payload from the current form fields.
    fn build_payload(ui: &MainWindow) -> QrPayload {
        let field_a = ui.get_field_a().to_string();
        let field_b = ui.get_field_b().to_string();
        let field_c = ui.get_field_c().to_string();

        match ui.get_payload_kind() {
            1 => QrPayload::Url(field_a),
            2 => QrPayload::Phone(field_a),
            3 => QrPayload::Sms {
                number: field_a,
                message: field_b,
            },
            4 => QrPayload::Email {
                address: field_a,
                subject: field_b,
                body: field_c,
            },
            5 => QrPayload::Wifi {
                ssid: field_a,
                password: field_b,
                security: match ui.get_wifi_security() {
                    1 => WifiSecurity::Wep,
                    2 => WifiSecurity::None,
                    _ => WifiSecurity::Wpa,
                },
                hidden: ui.get_wifi_hidden(),
            },
            _ => QrPayload::Text(field_a),
        }
    }

    /// Set up Slint UI callbacks.
    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &UiBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        prefs_manager: &Arc<PrefsManager>,
        scanner: &ScanController,
        generator: &Arc<GeneratorService>,
        metrics: &Arc<Metrics>,
        last_png: &Arc<Mutex<Option<Vec<u8>>>>,
    ) {
        let state = Arc::clone(state_manager);
        let scanner_for_nav = scanner.clone();

        // Section navigation - leaving the scan section stops the camera
        ui.on_section_changed(move |section| {
            tracing::debug!("Section changed to {}", section);
            if section != 1 {
                scanner_for_nav.stop();
            }
            state.set_section(if section == 1 {
                Section::Scan
            } else {
                Section::Generate
            });
        });

        let state = Arc::clone(state_manager);
        let prefs = Arc::clone(prefs_manager);

        // Dark mode toggle - the one persisted preference
        ui.on_dark_mode_toggled(move |dark_mode| {
            tracing::debug!("Dark mode toggled: {}", dark_mode);
            state.set_dark_mode(dark_mode);

            if let Err(e) = prefs.save_preferences(&Preferences { dark_mode }) {
                tracing::error!("Failed to save preferences: {:#}", e);
            }
        });

        let ui_weak = ui.as_weak();

        // Payload kind selector
        ui.on_payload_kind_changed(move |kind| {
            if let Some(ui) = ui_weak.upgrade() {
                Self::apply_payload_kind(&ui, kind);
            }
        });

        let state = Arc::clone(state_manager);
        let generator_for_generate = Arc::clone(generator);
        let metrics_for_generate = Arc::clone(metrics);
        let last_png_for_generate = Arc::clone(last_png);
        let ui_weak = ui.as_weak();

        // Generate button
        ui.on_generate_clicked(move || {
            let Some(ui) = ui_weak.upgrade() else { return };

            let payload = Self::build_payload(&ui);
            let options = RenderOptions::default();

            match generator_for_generate.render(&payload, &options) {
                Ok(image) => {
                    let png = generator_for_generate.render_png(&payload, &options).ok();
                    *last_png_for_generate.lock().unwrap() = png;

                    ui.set_qr_image(dynamic_to_slint_image(&image));
                    ui.set_has_qr(true);
                    ui.set_gen_status("".into());

                    metrics_for_generate.record_code_generated();
                    // payload_string succeeded inside render
                    let content = generator_for_generate
                        .payload_string(&payload)
                        .unwrap_or_default();
                    state.set_generated(content);
                    state.set_status("QR code generated.");
                }
                Err(GenerateError::EmptyInput) => {
                    ui.set_has_qr(false);
                    ui.set_gen_status("Please enter something to encode.".into());
                }
                Err(e) => {
                    tracing::error!("Generation failed: {}", e);
                    ui.set_has_qr(false);
                    ui.set_gen_status(format!("Error generating QR code: {e}").into());
                }
            }
        });

        let state = Arc::clone(state_manager);
        let last_png_for_save = Arc::clone(last_png);

        // Save PNG button
        ui.on_save_clicked(move || {
            let Some(png) = last_png_for_save.lock().unwrap().clone() else {
                state.set_status("Generate a QR code first.");
                return;
            };

            let picked = rfd::FileDialog::new()
                .set_title("Save QR Code")
                .add_filter("PNG image", &["png"])
                .set_file_name("qrcode.png")
                .save_file();

            if let Some(path) = picked {
                match fs::write(&path, &png) {
                    Ok(()) => {
                        tracing::info!("Saved QR code to {}", path.display());
                        state.set_status("QR code saved.");
                    }
                    Err(e) => {
                        tracing::error!("Failed to save QR code: {}", e);
                        state.set_status(format!("Failed to save: {e}"));
                    }
                }
            }
        });

        let state = Arc::clone(state_manager);
        let bridge_for_start = bridge.clone();
        let scanner_for_start = scanner.clone();

        // Start live scan
        ui.on_start_scan_clicked(move || {
            tracing::info!("Start scan clicked");
            state.reset_scan_result();
            state.set_scan_phase(ScanPhase::Starting);
            state.set_status("Requesting camera...");

            let scanner = scanner_for_start.clone();
            let state = Arc::clone(&state);
            bridge_for_start.spawn_async(move || async move {
                match scanner.start().await {
                    Ok(()) => {}
                    Err(ScanError::AlreadyActive) => {
                        state.set_status("Scanner is already running.");
                    }
                    Err(e) => {
                        // The Failed event updates phase and status; keep a
                        // log trail here.
                        tracing::warn!("Scan start failed: {}", e);
                    }
                }
            });
        });

        let scanner_for_stop = scanner.clone();

        // Stop live scan
        ui.on_stop_scan_clicked(move || {
            tracing::info!("Stop scan clicked");
            scanner_for_stop.stop();
        });

        let state = Arc::clone(state_manager);
        let bridge_for_upload = bridge.clone();
        let scanner_for_upload = scanner.clone();

        // Decode an uploaded image file
        ui.on_upload_image_clicked(move || {
            tracing::debug!("Upload image clicked");

            // A running live session would race the result box; stop it.
            scanner_for_upload.stop();

            let picked = rfd::FileDialog::new()
                .set_title("Select QR Code Image")
                .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp"])
                .pick_file();

            let Some(path) = picked else { return };

            state.reset_scan_result();
            state.set_status("Decoding image...");

            let scanner = scanner_for_upload.clone();
            let state = Arc::clone(&state);
            bridge_for_upload.spawn_async(move || async move {
                let outcome = tokio::task::spawn_blocking(move || {
                    match fs::read(&path) {
                        Ok(bytes) => scanner.decode_static_image(&bytes),
                        Err(e) => {
                            tracing::error!("Failed to read image file: {}", e);
                            Err(ScanError::NoCodeFound)
                        }
                    }
                })
                .await;

                match outcome {
                    Ok(Ok(payload)) => {
                        state.set_decoded_payload(payload);
                        state.set_status("QR code from image decoded.");
                    }
                    Ok(Err(ScanError::NoCodeFound)) => {
                        state.set_status("No QR code detected in the image.");
                    }
                    Ok(Err(e)) => {
                        state.set_status(format!("Decoding failed: {e}"));
                    }
                    Err(e) => {
                        tracing::error!("Image decode task failed: {}", e);
                        state.set_status("Decoding failed.");
                    }
                }
            });
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Subscribe to state changes and update the UI accordingly.
    ///
    /// Spawns a background thread that listens for state change events and
    /// updates the Slint UI via the bridge.
    fn setup_state_subscription(
        bridge: &UiBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        metrics: &Arc<Metrics>,
    ) {
        let bridge = bridge.clone();
        let metrics = Arc::clone(metrics);
        let mut rx = state_manager.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("State subscription thread started");

            loop {
                let change = match rx.blocking_recv() {
                    Ok(change) => change,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("State subscription lagged, skipped {} events", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                tracing::trace!("State change received: {:?}", change);
                metrics.record_ui_update();

                match change {
                    StateChange::ThemeChanged { dark_mode } => {
                        bridge.update_ui(move |ui| ui.set_dark_mode(dark_mode));
                    }
                    StateChange::SectionChanged { section } => {
                        let index = match section {
                            Section::Generate => 0,
                            Section::Scan => 1,
                        };
                        bridge.update_ui(move |ui| ui.set_active_section(index));
                    }
                    StateChange::ScanPhaseChanged { phase } => {
                        let scanning = phase != ScanPhase::Idle;
                        let status = match phase {
                            ScanPhase::Starting => "Requesting camera...",
                            ScanPhase::Scanning => "Scanning... Align QR code in view.",
                            ScanPhase::Stopping => "Stopping camera...",
                            ScanPhase::Idle => "Start scanning with the button above.",
                        };
                        bridge.update_ui(move |ui| {
                            ui.set_is_scanning(scanning);
                            ui.set_scan_status(status.into());
                            if !scanning {
                                ui.set_has_preview(false);
                            }
                        });
                    }
                    StateChange::PayloadDecoded { payload } => {
                        bridge.update_ui(move |ui| {
                            ui.set_decoded_text(payload.into());
                            ui.set_has_result(true);
                        });
                    }
                    StateChange::GenerationCompleted { .. } => {
                        // The generate callback already updated the image on
                        // the UI thread; nothing else to mirror.
                    }
                    StateChange::StatusChanged { message } => {
                        bridge.update_ui(move |ui| ui.set_status_message(message.into()));
                    }
                }
            }

            tracing::debug!("State subscription thread terminated");
        });
    }

    /// Subscribe to scan events, mirroring them into application state and
    /// pushing preview frames straight to the UI.
    fn setup_scan_subscription(
        bridge: &UiBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        scanner: &ScanController,
    ) {
        let bridge = bridge.clone();
        let state = Arc::clone(state_manager);
        let mut rx = scanner.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("Scan subscription thread started");

            loop {
                let event = match rx.blocking_recv() {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Scan subscription lagged, skipped {} events", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                match event {
                    ScanEvent::Started => {
                        state.set_scan_phase(ScanPhase::Scanning);
                        state.set_status("Camera started.");
                    }
                    ScanEvent::Preview { rgb, width, height } => {
                        let buffer = slint::SharedPixelBuffer::<slint::Rgb8Pixel>::clone_from_slice(
                            &rgb, width, height,
                        );
                        bridge.update_ui(move |ui| {
                            ui.set_preview_image(slint::Image::from_rgb8(buffer));
                            ui.set_has_preview(true);
                        });
                    }
                    ScanEvent::Decoded { payload } => {
                        state.set_scan_phase(ScanPhase::Idle);
                        state.set_decoded_payload(payload);
                        state.set_status("QR code decoded.");
                    }
                    ScanEvent::Stopped => {
                        state.set_scan_phase(ScanPhase::Idle);
                        state.set_status("Camera stopped.");
                    }
                    ScanEvent::Failed { error } => {
                        state.set_scan_phase(ScanPhase::Idle);
                        state.set_status(format!(
                            "Camera error: {error}. Check permissions and retry."
                        ));
                    }
                }
            }

            tracing::debug!("Scan subscription thread terminated");
        });
    }
}

/// Convert a rendered symbol into a Slint image.
fn dynamic_to_slint_image(image: &image::DynamicImage) -> slint::Image {
    let rgb = image.to_rgb8();
    let buffer = slint::SharedPixelBuffer::<slint::Rgb8Pixel>::clone_from_slice(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
    );
    slint::Image::from_rgb8(buffer)
}
