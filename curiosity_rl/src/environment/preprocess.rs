//! Frame preprocessing and the rolling observation stack.
//!
//! Raw emulator frames are converted to single-channel luma, resized with
//! bilinear interpolation (pixel centres aligned the same way common image
//! libraries do it) and scaled into `[0, 1]`.

use super::{EnvError, RgbFrame};

/// ITU-R BT.601 luma weights.
const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// A preprocessed single-channel frame, row-major `[height, width]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub height: usize,
    pub width: usize,
    pub pixels: Vec<f32>,
}

impl Frame {
    /// Frame with every pixel set to `value`.
    pub fn filled(height: usize, width: usize, value: f32) -> Self {
        Self {
            height,
            width,
            pixels: vec![value; height * width],
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.pixels[row * self.width + col]
    }
}

/// Converts raw RGB frames into normalized grayscale frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePreprocessor {
    height: usize,
    width: usize,
}

impl Default for FramePreprocessor {
    fn default() -> Self {
        Self::new(84, 84)
    }
}

impl FramePreprocessor {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Grayscale, resize and normalize one frame.
    pub fn process(&self, raw: &RgbFrame) -> Result<Frame, EnvError> {
        raw.check()?;
        if self.height == 0 || self.width == 0 {
            return Err(EnvError::MalformedFrame {
                reason: format!("target size {}x{}", self.width, self.height),
            });
        }

        let gray: Vec<f32> = raw
            .data
            .chunks_exact(3)
            .map(|px| LUMA[0] * px[0] as f32 + LUMA[1] * px[1] as f32 + LUMA[2] * px[2] as f32)
            .collect();

        let pixels = resize_bilinear(&gray, raw.height, raw.width, self.height, self.width)
            .into_iter()
            .map(|v| (v * (1.0 / 255.0)).clamp(0.0, 1.0))
            .collect();

        Ok(Frame {
            height: self.height,
            width: self.width,
            pixels,
        })
    }
}

fn resize_bilinear(
    src: &[f32],
    src_h: usize,
    src_w: usize,
    dst_h: usize,
    dst_w: usize,
) -> Vec<f32> {
    if src_h == dst_h && src_w == dst_w {
        return src.to_vec();
    }

    let scale_y = src_h as f32 / dst_h as f32;
    let scale_x = src_w as f32 / dst_w as f32;

    // Source coordinate and blend weight for each destination index
    let axis = |dst: usize, scale: f32, len: usize| -> (usize, usize, f32) {
        let pos = ((dst as f32 + 0.5) * scale - 0.5).max(0.0);
        let lo = (pos.floor() as usize).min(len - 1);
        let hi = (lo + 1).min(len - 1);
        (lo, hi, pos - lo as f32)
    };

    let cols: Vec<_> = (0..dst_w).map(|x| axis(x, scale_x, src_w)).collect();
    let mut out = Vec::with_capacity(dst_h * dst_w);
    for y in 0..dst_h {
        let (y0, y1, wy) = axis(y, scale_y, src_h);
        let row0 = &src[y0 * src_w..(y0 + 1) * src_w];
        let row1 = &src[y1 * src_w..(y1 + 1) * src_w];
        for &(x0, x1, wx) in &cols {
            let top = row0[x0] + (row0[x1] - row0[x0]) * wx;
            let bottom = row1[x0] + (row1[x1] - row1[x0]) * wx;
            out.push(top + (bottom - top) * wy);
        }
    }
    out
}

/// Fixed-depth stack of the most recent frames, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationHistory {
    depth: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl ObservationHistory {
    /// History holding `depth` copies of `frame`.
    pub fn filled(frame: &Frame, depth: usize) -> Self {
        let mut data = Vec::with_capacity(depth * frame.pixels.len());
        for _ in 0..depth {
            data.extend_from_slice(&frame.pixels);
        }
        Self {
            depth,
            height: frame.height,
            width: frame.width,
            data,
        }
    }

    /// Drop the oldest frame and append `frame` as the newest.
    pub fn push(&mut self, frame: &Frame) -> Result<(), EnvError> {
        if frame.height != self.height || frame.width != self.width {
            return Err(EnvError::MalformedFrame {
                reason: format!(
                    "history holds {}x{} frames, got {}x{}",
                    self.width, self.height, frame.width, frame.height
                ),
            });
        }
        let plane = self.plane_len();
        if self.depth == 0 {
            return Ok(());
        }
        self.data.copy_within(plane.., 0);
        let start = (self.depth - 1) * plane;
        self.data[start..].copy_from_slice(&frame.pixels);
        Ok(())
    }

    /// Replace the whole stack with copies of `frame`.
    pub fn reset(&mut self, frame: &Frame) {
        *self = Self::filled(frame, self.depth);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn frame_shape(&self) -> [usize; 2] {
        [self.height, self.width]
    }

    /// Frame `i` of the stack, 0 being the oldest.
    pub fn frame(&self, i: usize) -> &[f32] {
        let plane = self.plane_len();
        &self.data[i * plane..(i + 1) * plane]
    }

    /// `[depth, height, width]` row-major buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    fn plane_len(&self) -> usize {
        self.height * self.width
    }
}
