// Performance metrics module
//
// Lightweight counters for monitoring scan and generation activity

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Global performance metrics
///
/// Uses atomic operations for thread-safe tracking without locks. Counters
/// accumulate over the application lifetime and are logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Live scan sessions started
    pub scan_sessions: AtomicUsize,

    /// Frames sampled across all sessions
    pub frames_sampled: AtomicU64,

    /// Symbols decoded from the live camera path
    pub live_decodes: AtomicUsize,

    /// Symbols decoded from uploaded images
    pub static_decodes: AtomicUsize,

    /// Camera acquisition or capture failures
    pub camera_failures: AtomicUsize,

    /// Symbols generated
    pub codes_generated: AtomicUsize,

    /// UI updates pushed through the bridge
    pub ui_updates: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            scan_sessions: AtomicUsize::new(0),
            frames_sampled: AtomicU64::new(0),
            live_decodes: AtomicUsize::new(0),
            static_decodes: AtomicUsize::new(0),
            camera_failures: AtomicUsize::new(0),
            codes_generated: AtomicUsize::new(0),
            ui_updates: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record the start of a live scan session
    pub fn record_session_started(&self) {
        self.scan_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one sampled frame
    pub fn record_frame_sampled(&self) {
        self.frames_sampled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decode from the live camera path
    pub fn record_live_decode(&self) {
        self.live_decodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decode from an uploaded image
    pub fn record_static_decode(&self) {
        self.static_decodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a camera failure
    pub fn record_camera_failure(&self) {
        self.camera_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a generated symbol
    pub fn record_code_generated(&self) {
        self.codes_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a UI update
    pub fn record_ui_update(&self) {
        self.ui_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average frames sampled per live decode
    pub fn avg_frames_per_decode(&self) -> f64 {
        let frames = self.frames_sampled.load(Ordering::Relaxed);
        let decodes = self.live_decodes.load(Ordering::Relaxed);
        if decodes > 0 {
            frames as f64 / decodes as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Performance Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Scan sessions: {} ({} camera failures)",
            self.scan_sessions.load(Ordering::Relaxed),
            self.camera_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Decodes: {} live, {} from images ({} frames sampled, avg {:.1} per live decode)",
            self.live_decodes.load(Ordering::Relaxed),
            self.static_decodes.load(Ordering::Relaxed),
            self.frames_sampled.load(Ordering::Relaxed),
            self.avg_frames_per_decode()
        );
        tracing::info!(
            "Generated: {} symbols, UI updates: {}",
            self.codes_generated.load(Ordering::Relaxed),
            self.ui_updates.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
