//! Frame decoding seam and the rqrr-backed implementation.
//!
//! Decoding operates on 8-bit luma rasters. [`FrameBuffer`] converts the
//! camera's RGB frames and is resized whenever the incoming dimensions
//! change; [`RqrrDecoder`] runs the actual symbol detection.

use crate::services::camera::Frame;

/// Decode one luma raster. Returns the payload of the first symbol that
/// decodes, or `None` when the frame holds no decodable symbol.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, luma: &[u8], width: u32, height: u32) -> Option<String>;
}

/// rqrr-backed decoder.
#[derive(Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for RqrrDecoder {
    fn decode(&self, luma: &[u8], width: u32, height: u32) -> Option<String> {
        if luma.len() < (width as usize) * (height as usize) {
            return None;
        }

        let w = width as usize;
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(w, height as usize, |x, y| luma[y * w + x]);

        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_, content)) => return Some(content),
                Err(e) => {
                    tracing::debug!("Grid detected but failed to decode: {:?}", e);
                }
            }
        }

        None
    }
}

/// Mutable luma raster the sample loop copies each frame into.
///
/// The buffer is reallocated only when the frame dimensions change, which on
/// a live stream happens at most once (on the first frame).
#[derive(Debug, Default)]
pub struct FrameBuffer {
    luma: Vec<u8>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `frame` into the buffer, converting RGB to luma with integer
    /// BT.601 weights. Resizes the buffer if the dimensions changed.
    pub fn fill(&mut self, frame: &Frame) {
        let pixels = (frame.width as usize) * (frame.height as usize);

        if frame.width != self.width || frame.height != self.height {
            self.width = frame.width;
            self.height = frame.height;
            self.luma.resize(pixels, 0);
        }

        for (dst, chunk) in self.luma.iter_mut().zip(frame.rgb.chunks_exact(3)) {
            let gray =
                (chunk[0] as u32 * 299 + chunk[1] as u32 * 587 + chunk[2] as u32 * 114) / 1000;
            *dst = gray as u8;
        }
    }

    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Downsample a tightly-packed RGB raster with nearest-neighbor sampling.
/// Used for the live preview shown while scanning.
pub fn downsample_rgb(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Vec<u8> {
    let (sw, sh) = (src_width as usize, src_height as usize);
    let (dw, dh) = (dst_width as usize, dst_height as usize);
    let mut dst = Vec::with_capacity(dw * dh * 3);

    let x_ratio = sw as f32 / dw as f32;
    let y_ratio = sh as f32 / dh as f32;

    for dst_y in 0..dh {
        for dst_x in 0..dw {
            let src_x = (dst_x as f32 * x_ratio) as usize;
            let src_y = (dst_y as f32 * y_ratio) as usize;
            let idx = (src_y * sw + src_x) * 3;

            if idx + 2 < src.len() {
                dst.extend_from_slice(&src[idx..idx + 3]);
            } else {
                dst.extend_from_slice(&[0, 0, 0]);
            }
        }
    }

    dst
}
