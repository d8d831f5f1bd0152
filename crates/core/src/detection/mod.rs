//! Per-frame marker presence heuristic.
//!
//! The frame is split into a fixed 8x8 grid, each cell is reduced to its mean
//! brightness, and a marker is reported as present when the spread between the
//! darkest and brightest cell exceeds the configured contrast threshold. This
//! is a coarse stand-in for fiducial recognition: it runs in a single pass over
//! the pixels and allocates nothing beyond the grid itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DetectorConfig, FretCoachError, MarkerRegistry, Result};

/// Number of cells along each axis of the brightness grid.
pub const GRID_SIZE: usize = 8;

/// Minimum channel count a frame must carry (red, green, blue).
const MIN_CHANNELS: usize = 3;

/// One camera frame as interleaved 8-bit channels in row-major order.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameSample {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub pixels: Vec<u8>,
}

impl FrameSample {
    pub fn new(width: usize, height: usize, channels: usize, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// Builds an RGBA frame where every pixel has the same grey level.
    /// Dimensions too large to address get an empty buffer, which detection
    /// rejects.
    pub fn uniform(width: usize, height: usize, level: u8) -> Self {
        let len = width
            .checked_mul(height)
            .and_then(|area| area.checked_mul(4))
            .unwrap_or(0);
        let mut pixels = vec![level; len];
        for alpha in pixels.iter_mut().skip(3).step_by(4) {
            *alpha = u8::MAX;
        }
        Self::new(width, height, 4, pixels)
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FretCoachError::invalid_frame(format!(
                "frame has zero area ({}x{})",
                self.width, self.height
            )));
        }
        if self.width < GRID_SIZE || self.height < GRID_SIZE {
            return Err(FretCoachError::invalid_frame(format!(
                "frame {}x{} is smaller than the {GRID_SIZE}x{GRID_SIZE} grid",
                self.width, self.height
            )));
        }
        if self.channels < MIN_CHANNELS {
            return Err(FretCoachError::invalid_frame(format!(
                "expected at least {MIN_CHANNELS} channels, got {}",
                self.channels
            )));
        }
        let expected = self
            .width
            .checked_mul(self.height)
            .and_then(|area| area.checked_mul(self.channels))
            .ok_or_else(|| FretCoachError::invalid_frame("frame dimensions overflow"))?;
        if self.pixels.len() < expected {
            return Err(FretCoachError::invalid_frame(format!(
                "pixel buffer holds {} bytes, expected {expected}",
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for FrameSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSample")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}

/// Pull interface over a camera stream. Frames are handed out one at a time
/// and dropped by the caller once detection has run.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<FrameSample>;
}

impl<I> FrameSource for I
where
    I: Iterator<Item = FrameSample>,
{
    fn next_frame(&mut self) -> Option<FrameSample> {
        self.next()
    }
}

/// Mean brightness of each grid cell on a 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessGrid {
    cells: [[f32; GRID_SIZE]; GRID_SIZE],
}

impl BrightnessGrid {
    /// Brightness of the cell at (`row`, `column`).
    pub fn cell(&self, row: usize, column: usize) -> Option<f32> {
        self.cells.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn min(&self) -> f32 {
        self.values().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.values().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn contrast(&self) -> f32 {
        self.max() - self.min()
    }

    fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.cells.iter().flat_map(|row| row.iter().copied())
    }
}

/// Contrast-based marker detector.
#[derive(Debug, Clone)]
pub struct MarkerDetector {
    contrast_threshold: f32,
    markers: MarkerRegistry,
}

impl MarkerDetector {
    pub fn new(config: DetectorConfig, markers: MarkerRegistry) -> Self {
        Self {
            contrast_threshold: config.contrast_threshold,
            markers,
        }
    }

    pub fn contrast_threshold(&self) -> f32 {
        self.contrast_threshold
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    /// Decides whether `marker_id` is visible in `frame`.
    ///
    /// Fails with [`FretCoachError::InvalidFrame`] for empty or truncated
    /// buffers and [`FretCoachError::UnknownMarker`] for ids missing from the
    /// registry.
    pub fn detect(&self, frame: &FrameSample, marker_id: &str) -> Result<bool> {
        self.markers.require(marker_id)?;
        let grid = self.brightness_grid(frame)?;
        let (min, max) = (grid.min(), grid.max());
        let contrast = max - min;

        tracing::debug!(
            marker = marker_id,
            contrast,
            min,
            max,
            threshold = self.contrast_threshold,
            "marker contrast"
        );

        Ok(contrast > self.contrast_threshold)
    }

    /// Like [`MarkerDetector::detect`] but resolves every failure to "not
    /// visible".
    pub fn is_marker_visible(&self, frame: &FrameSample, marker_id: &str) -> bool {
        match self.detect(frame, marker_id) {
            Ok(visible) => visible,
            Err(err) => {
                tracing::warn!(marker = marker_id, error = %err, "detection failed");
                false
            }
        }
    }

    /// Reduces the frame to its 8x8 brightness grid. Pixels past the last
    /// whole cell on either axis are ignored.
    pub fn brightness_grid(&self, frame: &FrameSample) -> Result<BrightnessGrid> {
        frame.validate()?;

        let cell_width = frame.width / GRID_SIZE;
        let cell_height = frame.height / GRID_SIZE;
        let row_stride = frame.width * frame.channels;
        let mut sums = [[0u64; GRID_SIZE]; GRID_SIZE];

        for y in 0..cell_height * GRID_SIZE {
            let grid_row = &mut sums[y / cell_height];
            let row = &frame.pixels[y * row_stride..(y + 1) * row_stride];
            for (x, pixel) in row
                .chunks_exact(frame.channels)
                .take(cell_width * GRID_SIZE)
                .enumerate()
            {
                grid_row[x / cell_width] += rgb_sum(pixel);
            }
        }

        // Every pixel contributes the sum of three channels.
        let divisor = (cell_width * cell_height * MIN_CHANNELS) as f64;
        let mut cells = [[0.0f32; GRID_SIZE]; GRID_SIZE];
        for (out_row, sum_row) in cells.iter_mut().zip(sums.iter()) {
            for (out, sum) in out_row.iter_mut().zip(sum_row.iter()) {
                *out = (*sum as f64 / divisor) as f32;
            }
        }

        Ok(BrightnessGrid { cells })
    }
}

impl Default for MarkerDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default(), MarkerRegistry::builtin())
    }
}

fn rgb_sum(pixel: &[u8]) -> u64 {
    pixel[..MIN_CHANNELS].iter().map(|&c| u64::from(c)).sum()
}
