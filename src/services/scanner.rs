//! The live scan session: camera acquisition, the frame sampling loop, and
//! the one-shot static image path.
//!
//! A session walks `Idle → Starting → Scanning → Idle`, leaving through
//! either a successful decode or a `stop()` request (`Stopping → Idle`).
//! Every session carries a generation number and a monotonically-set
//! cancellation flag; both are checked under the session lock before any
//! transition, so a `stop()` always beats a racing sample completion and a
//! camera grant that arrives after cancellation is released unused.
//!
//! Sampling is polled, one tick at a time: the loop pulls a frame, attempts
//! a decode, and either finishes or sleeps one tick interval. A frame with
//! no decodable symbol is normal steady state, never an error.

use crate::metrics::Metrics;
use crate::services::camera::{CameraConstraints, CameraError, CameraProvider, FrameSource};
use crate::services::decoder::{FrameBuffer, FrameDecoder, downsample_rgb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Preview dimensions for the live scan display.
pub const PREVIEW_WIDTH: u32 = 320;
pub const PREVIEW_HEIGHT: u32 = 240;

/// Consecutive capture failures tolerated before the session is torn down
/// with a camera failure.
const MAX_CONSECUTIVE_CAPTURE_ERRORS: u32 = 10;

/// Lifecycle of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    Starting,
    Scanning,
    Stopping,
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Starting => "starting",
            ScanPhase::Scanning => "scanning",
            ScanPhase::Stopping => "stopping",
        };
        write!(f, "{name}")
    }
}

/// Errors surfaced by the scan component.
#[derive(Error, Debug)]
pub enum ScanError {
    /// `start()` was called while a session was active.
    #[error("a scan session is already active")]
    AlreadyActive,

    /// Camera permission denied, no device present, or the device died.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// Static image path: the image holds no decodable symbol.
    #[error("no QR code found in the image")]
    NoCodeFound,

    /// Static image path: the bytes are not a decodable image.
    #[error("unreadable image: {0}")]
    UnreadableImage(#[from] image::ImageError),
}

/// Events emitted over the controller's broadcast channel.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// The camera stream is open and sampling has begun.
    Started,
    /// A downsampled RGB preview of the most recent sampled frame.
    Preview {
        rgb: Vec<u8>,
        width: u32,
        height: u32,
    },
    /// A symbol decoded. Emitted exactly once per session; the session is
    /// already back in `Idle` when this arrives.
    Decoded { payload: String },
    /// The session ended without a decode (cancelled).
    Stopped,
    /// The session failed. The session is back in `Idle`.
    Failed { error: CameraError },
}

struct SessionState {
    phase: ScanPhase,
    generation: u64,
    cancel: Arc<AtomicBool>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: ScanPhase::Idle,
            generation: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Controller for live camera scanning and one-shot image decoding.
///
/// All mutable session state (phase, generation, cancellation flag) lives in
/// fields of this instance; there are no module-level handles. The controller
/// is cheaply cloneable and every clone shares the same session.
pub struct ScanController {
    camera: Arc<dyn CameraProvider>,
    decoder: Arc<dyn FrameDecoder>,
    constraints: CameraConstraints,
    tick: Duration,
    session: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<ScanEvent>,
    metrics: Arc<Metrics>,
}

impl ScanController {
    /// Create a controller over the given capture and decode seams.
    ///
    /// `tick` is the interval between sample attempts; the original sampled
    /// at roughly 10 fps, so 100 ms is the production default.
    pub fn new(
        camera: Arc<dyn CameraProvider>,
        decoder: Arc<dyn FrameDecoder>,
        constraints: CameraConstraints,
        tick: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (events, _) = broadcast::channel(100);
        Self {
            camera,
            decoder,
            constraints,
            tick,
            session: Arc::new(Mutex::new(SessionState::default())),
            events,
            metrics,
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// Current session phase.
    pub fn phase(&self) -> ScanPhase {
        self.session.lock().unwrap().phase
    }

    /// Begin a live scan session. Valid only from `Idle`.
    ///
    /// Awaits camera acquisition (the only suspension point; it may sit on a
    /// user permission prompt) and then hands off to the sample loop. If
    /// `stop()` arrives while acquisition is pending, the granted stream is
    /// released unused and the session returns to `Idle` without ever
    /// reaching `Scanning`.
    pub async fn start(&self) -> Result<(), ScanError> {
        let (generation, cancel) = {
            let mut session = self.session.lock().unwrap();
            if session.phase != ScanPhase::Idle {
                return Err(ScanError::AlreadyActive);
            }
            session.generation += 1;
            session.cancel = Arc::new(AtomicBool::new(false));
            session.phase = ScanPhase::Starting;
            (session.generation, Arc::clone(&session.cancel))
        };

        tracing::info!("Scan session {} starting", generation);
        self.metrics.record_session_started();

        let camera = Arc::clone(&self.camera);
        let constraints = self.constraints.clone();
        let acquired = tokio::task::spawn_blocking(move || camera.acquire(&constraints))
            .await
            .unwrap_or_else(|e| {
                Err(CameraError::Unavailable(format!(
                    "acquisition task failed: {e}"
                )))
            });

        let stream = match acquired {
            Ok(stream) => stream,
            Err(error) => {
                {
                    let mut session = self.session.lock().unwrap();
                    if session.generation == generation {
                        session.phase = ScanPhase::Idle;
                    }
                }
                tracing::warn!("Camera acquisition failed: {}", error);
                self.metrics.record_camera_failure();
                let _ = self.events.send(ScanEvent::Failed {
                    error: error.clone(),
                });
                return Err(ScanError::Camera(error));
            }
        };

        // A stop() may have landed while the grant was pending. Close the
        // stream immediately rather than transitioning into Scanning.
        {
            let mut session = self.session.lock().unwrap();
            if session.generation != generation || cancel.load(Ordering::Acquire) {
                drop(stream);
                if session.generation == generation {
                    session.phase = ScanPhase::Idle;
                }
                drop(session);
                tracing::info!("Scan session {} cancelled before first sample", generation);
                let _ = self.events.send(ScanEvent::Stopped);
                return Ok(());
            }
            session.phase = ScanPhase::Scanning;
        }

        let _ = self.events.send(ScanEvent::Started);

        let sample_loop = SampleLoop {
            stream,
            generation,
            cancel,
            session: Arc::clone(&self.session),
            decoder: Arc::clone(&self.decoder),
            events: self.events.clone(),
            tick: self.tick,
            metrics: Arc::clone(&self.metrics),
        };
        tokio::task::spawn_blocking(move || sample_loop.run());

        Ok(())
    }

    /// Cancel the active session. A no-op on an `Idle` session; safe to call
    /// repeatedly. Once requested, no subsequent tick may emit a payload or
    /// reschedule.
    pub fn stop(&self) {
        let mut session = self.session.lock().unwrap();
        match session.phase {
            ScanPhase::Idle => {}
            ScanPhase::Starting | ScanPhase::Scanning | ScanPhase::Stopping => {
                session.cancel.store(true, Ordering::Release);
                if session.phase != ScanPhase::Stopping {
                    tracing::info!("Scan session {} stop requested", session.generation);
                    session.phase = ScanPhase::Stopping;
                }
            }
        }
    }

    /// One-shot decode of an uploaded image, outside the session state
    /// machine. Rasterizes at the image's native resolution and runs the
    /// same decode seam once. Never touches the camera.
    pub fn decode_static_image(&self, bytes: &[u8]) -> Result<String, ScanError> {
        let img = image::load_from_memory(bytes)?;
        let gray = img.to_luma8();

        match self
            .decoder
            .decode(gray.as_raw(), gray.width(), gray.height())
        {
            Some(payload) => {
                tracing::info!("Static image decoded ({} byte payload)", payload.len());
                self.metrics.record_static_decode();
                Ok(payload)
            }
            None => Err(ScanError::NoCodeFound),
        }
    }
}

impl Clone for ScanController {
    fn clone(&self) -> Self {
        Self {
            camera: Arc::clone(&self.camera),
            decoder: Arc::clone(&self.decoder),
            constraints: self.constraints.clone(),
            tick: self.tick,
            session: Arc::clone(&self.session),
            events: self.events.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// State moved onto the dedicated sampling thread. One instance exists per
/// scanning session; it exclusively owns the stream handle and frame buffer.
struct SampleLoop {
    stream: Box<dyn FrameSource>,
    generation: u64,
    cancel: Arc<AtomicBool>,
    session: Arc<Mutex<SessionState>>,
    decoder: Arc<dyn FrameDecoder>,
    events: broadcast::Sender<ScanEvent>,
    tick: Duration,
    metrics: Arc<Metrics>,
}

impl SampleLoop {
    fn run(mut self) {
        let mut buffer = FrameBuffer::new();
        let mut consecutive_errors = 0u32;

        loop {
            if self.cancel.load(Ordering::Acquire) {
                self.finish_cancelled();
                return;
            }

            match self.stream.try_frame() {
                Ok(Some(frame)) => {
                    consecutive_errors = 0;
                    self.metrics.record_frame_sampled();
                    buffer.fill(&frame);

                    if let Some(payload) =
                        self.decoder
                            .decode(buffer.luma(), buffer.width(), buffer.height())
                    {
                        // Exactly-once: re-check cancellation under the lock
                        // so a racing stop() drops this result as stale.
                        let mut session = self.session.lock().unwrap();
                        if self.cancel.load(Ordering::Acquire)
                            || session.generation != self.generation
                        {
                            drop(session);
                            self.finish_cancelled();
                            return;
                        }
                        session.phase = ScanPhase::Idle;
                        drop(session);

                        tracing::info!("Scan session {} decoded a symbol", self.generation);
                        self.metrics.record_live_decode();
                        let _ = self.events.send(ScanEvent::Decoded { payload });
                        // Stream handle dropped here; nothing further is
                        // scheduled.
                        return;
                    }

                    let _ = self.events.send(ScanEvent::Preview {
                        rgb: downsample_rgb(
                            &frame.rgb,
                            frame.width,
                            frame.height,
                            PREVIEW_WIDTH,
                            PREVIEW_HEIGHT,
                        ),
                        width: PREVIEW_WIDTH,
                        height: PREVIEW_HEIGHT,
                    });
                }
                Ok(None) => {
                    // No full frame buffered yet; reschedule without decoding.
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        "Frame capture error ({} consecutive): {}",
                        consecutive_errors,
                        e
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_CAPTURE_ERRORS {
                        self.finish_failed(CameraError::Capture(e.to_string()));
                        return;
                    }
                }
            }

            std::thread::sleep(self.tick);
        }
    }

    fn finish_cancelled(self) {
        drop(self.stream);
        {
            let mut session = self.session.lock().unwrap();
            if session.generation == self.generation {
                session.phase = ScanPhase::Idle;
            }
        }
        tracing::info!("Scan session {} stopped", self.generation);
        let _ = self.events.send(ScanEvent::Stopped);
    }

    fn finish_failed(self, error: CameraError) {
        drop(self.stream);
        {
            let mut session = self.session.lock().unwrap();
            if session.generation == self.generation {
                session.phase = ScanPhase::Idle;
            }
        }
        tracing::warn!("Scan session {} failed: {}", self.generation, error);
        self.metrics.record_camera_failure();
        let _ = self.events.send(ScanEvent::Failed { error });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoCamera;

    impl CameraProvider for NoCamera {
        fn acquire(
            &self,
            _constraints: &CameraConstraints,
        ) -> Result<Box<dyn FrameSource>, CameraError> {
            Err(CameraError::Unavailable("no device".to_string()))
        }
    }

    struct NeverDecodes;

    impl FrameDecoder for NeverDecodes {
        fn decode(&self, _luma: &[u8], _width: u32, _height: u32) -> Option<String> {
            None
        }
    }

    fn controller(camera: Arc<dyn CameraProvider>) -> ScanController {
        ScanController::new(
            camera,
            Arc::new(NeverDecodes),
            CameraConstraints::default(),
            Duration::from_millis(5),
            Arc::new(Metrics::new()),
        )
    }

    #[tokio::test]
    async fn test_start_with_unavailable_camera_returns_to_idle() {
        let controller = controller(Arc::new(NoCamera));
        let mut events = controller.subscribe();

        let result = controller.start().await;
        assert!(matches!(result, Err(ScanError::Camera(_))));
        assert_eq!(controller.phase(), ScanPhase::Idle);

        let event = events.try_recv().expect("expected a failure event");
        assert!(matches!(event, ScanEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn test_start_can_be_retried_after_failure() {
        let controller = controller(Arc::new(NoCamera));
        assert!(controller.start().await.is_err());
        assert!(controller.start().await.is_err());
        assert_eq!(controller.phase(), ScanPhase::Idle);
    }

    #[tokio::test]
    async fn test_stop_on_idle_is_noop() {
        let controller = controller(Arc::new(NoCamera));
        controller.stop();
        controller.stop();
        assert_eq!(controller.phase(), ScanPhase::Idle);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ScanPhase::Idle.to_string(), "idle");
        assert_eq!(ScanPhase::Scanning.to_string(), "scanning");
    }
}
