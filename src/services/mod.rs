//! Services module - framework-agnostic QR scanning and generation logic.
//!
//! Everything here is independent of the UI layer:
//!
//! - [`ScanController`]: the live scan session. Owns the camera stream and
//!   the sampling loop, emits [`ScanEvent`]s, and exposes the one-shot
//!   [`ScanController::decode_static_image`] path for uploaded images.
//! - [`camera`]: the capture seams ([`CameraProvider`], [`FrameSource`]) and
//!   the nokhwa-backed production implementation.
//! - [`decoder`]: the decode seam ([`FrameDecoder`]) backed by rqrr, plus the
//!   [`FrameBuffer`] luma raster the sampling loop reuses between ticks.
//! - [`GeneratorService`]: structured form input → payload string → rendered
//!   symbol, backed by the qrcode crate.
//!
//! # Design Philosophy
//!
//! - **Seam-based**: camera and decoder are traits; tests substitute
//!   scripted implementations
//! - **Framework-agnostic**: no Slint, no GUI code, only business logic
//! - **Single owner**: the stream handle and frame buffer belong to one
//!   sampling loop at a time

pub mod camera;
pub mod decoder;
pub mod generator;
pub mod scanner;

pub use camera::{
    CameraConstraints, CameraError, CameraProvider, Facing, Frame, FrameSource, NokhwaProvider,
};
pub use decoder::{FrameBuffer, FrameDecoder, RqrrDecoder};
pub use generator::{GenerateError, GeneratorService, QrPayload, RenderOptions, WifiSecurity};
pub use scanner::{ScanController, ScanError, ScanEvent, ScanPhase};
