//! Camera acquisition seam and the nokhwa-backed implementation.
//!
//! The scan loop never talks to a device API directly. It goes through two
//! traits: [`CameraProvider`] hands out a live capture stream, and
//! [`FrameSource`] yields RGB frames from it. Tests substitute scripted
//! implementations; production uses [`NokhwaProvider`].

use thiserror::Error;

/// Preferred device orientation for a scan session.
///
/// Desktop capture backends expose no facing metadata, so the preference is
/// honored best-effort by matching device names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Rear/environment-facing camera (preferred for scanning).
    #[default]
    Rear,
    /// Front/user-facing camera.
    Front,
}

/// Constraints passed to [`CameraProvider::acquire`].
#[derive(Debug, Clone, Default)]
pub struct CameraConstraints {
    pub facing: Facing,
}

/// Errors from the capture layer.
#[derive(Error, Debug, Clone)]
pub enum CameraError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("frame capture failed: {0}")]
    Capture(String),
}

/// One tightly-packed RGB8 video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Live capture stream. Dropping the value stops the underlying device
/// stream; the scan loop owns exactly one of these while scanning.
pub trait FrameSource: Send {
    /// Pull the next frame. `Ok(None)` means the device has not buffered a
    /// full frame yet and the caller should reschedule without decoding.
    fn try_frame(&mut self) -> Result<Option<Frame>, CameraError>;
}

/// Hands out capture streams. `acquire` may block on a user permission
/// prompt; callers run it on a blocking thread.
pub trait CameraProvider: Send + Sync {
    fn acquire(&self, constraints: &CameraConstraints) -> Result<Box<dyn FrameSource>, CameraError>;
}

/// Pick a device index from enumerated device names, honoring the facing
/// preference by name matching. Falls back to the first device.
pub(crate) fn pick_device(names: &[String], facing: Facing) -> Option<usize> {
    if names.is_empty() {
        return None;
    }

    let keywords: &[&str] = match facing {
        Facing::Rear => &["back", "rear", "environment"],
        Facing::Front => &["front", "user", "integrated"],
    };

    for (idx, name) in names.iter().enumerate() {
        let lower = name.to_lowercase();
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(idx);
        }
    }

    Some(0)
}

/// Production camera provider backed by nokhwa.
#[derive(Default)]
pub struct NokhwaProvider;

impl NokhwaProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CameraProvider for NokhwaProvider {
    fn acquire(&self, constraints: &CameraConstraints) -> Result<Box<dyn FrameSource>, CameraError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{
            ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat,
            RequestedFormatType, Resolution,
        };
        use nokhwa::{Camera, query};

        let devices = query(ApiBackend::Auto)
            .map_err(|e| CameraError::Unavailable(format!("device enumeration failed: {e}")))?;
        let names: Vec<String> = devices.iter().map(|d| d.human_name()).collect();

        let index = pick_device(&names, constraints.facing)
            .ok_or_else(|| CameraError::Unavailable("no capture device found".to_string()))?;

        tracing::info!("Selected camera {} of {:?}", index, names);

        // Devices disagree about native formats; walk a preference cascade
        // instead of failing on the first mismatch.
        let formats_to_try = [
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
                Resolution::new(1280, 720),
                FrameFormat::MJPEG,
                30,
            ))),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
                Resolution::new(1280, 720),
                FrameFormat::YUYV,
                30,
            ))),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
                Resolution::new(640, 480),
                FrameFormat::MJPEG,
                30,
            ))),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
        ];

        let mut camera = None;
        let mut last_error = String::new();

        for requested in &formats_to_try {
            match Camera::new(CameraIndex::Index(index as u32), *requested) {
                Ok(cam) => {
                    camera = Some(cam);
                    break;
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::debug!("Camera format rejected: {}", e);
                }
            }
        }

        let mut camera = camera.ok_or_else(|| {
            CameraError::Unavailable(format!(
                "failed to open camera (check permissions): {last_error}"
            ))
        })?;

        camera
            .open_stream()
            .map_err(|e| CameraError::Unavailable(format!("failed to start stream: {e}")))?;

        tracing::info!(
            "Camera stream opened: {} at {:?}",
            camera.info().human_name(),
            camera.resolution()
        );

        Ok(Box::new(NokhwaSource { camera }))
    }
}

struct NokhwaSource {
    camera: nokhwa::Camera,
}

impl FrameSource for NokhwaSource {
    fn try_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        use nokhwa::pixel_format::RgbFormat;

        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::Capture(e.to_string()))?;

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Capture(e.to_string()))?;

        let width = decoded.width();
        let height = decoded.height();

        Ok(Some(Frame {
            rgb: decoded.into_raw(),
            width,
            height,
        }))
    }
}

impl Drop for NokhwaSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::debug!("Error stopping camera stream: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_device_prefers_rear_by_name() {
        let names = vec![
            "Front Camera".to_string(),
            "Back Camera".to_string(),
            "USB Webcam".to_string(),
        ];
        assert_eq!(pick_device(&names, Facing::Rear), Some(1));
    }

    #[test]
    fn test_pick_device_prefers_front_by_name() {
        let names = vec!["Rear Camera".to_string(), "Front Camera".to_string()];
        assert_eq!(pick_device(&names, Facing::Front), Some(1));
    }

    #[test]
    fn test_pick_device_falls_back_to_first() {
        let names = vec!["Webcam C920".to_string(), "Capture Card".to_string()];
        assert_eq!(pick_device(&names, Facing::Rear), Some(0));
    }

    #[test]
    fn test_pick_device_empty() {
        assert_eq!(pick_device(&[], Facing::Rear), None);
    }

    #[test]
    fn test_default_constraints_prefer_rear() {
        let constraints = CameraConstraints::default();
        assert_eq!(constraints.facing, Facing::Rear);
    }
}
