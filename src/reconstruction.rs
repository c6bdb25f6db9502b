use crate::enums::{Axis, WindowEdges};
use crate::slice::{Slice, blue};
use crate::volume::Volume;

use image::{ImageBuffer, RgbaImage};
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

const WHITE: [u8; 4] = [u8::MAX, u8::MAX, u8::MAX, u8::MAX];
const BLACK: [u8; 4] = [0, 0, 0, u8::MAX];
const UNSCANNED: [u8; 4] = [0, 0, 0, 0];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconstructionError {
    #[error("Cannot reconstruct a volume from an empty slice stack")]
    EmptyStack,

    #[error("Slices must be at least 1x1, got {width}x{height}")]
    EmptySlice { width: usize, height: usize },

    #[error("Slice {index} is {found:?} (width, height) but the stack is {expected:?}")]
    InconsistentDimensions {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Index {index} is out of range for axis {axis} (extent {bound})")]
    IndexOutOfRange {
        axis: Axis,
        index: usize,
        bound: usize,
    },

    #[error("Window bounds must satisfy low < high, got low={low} high={high}")]
    InvalidWindow { low: i32, high: i32 },

    #[error("Image buffer does not match its dimensions")]
    BufferSize,
}

pub type ReconstructionResult<T> = std::result::Result<T, ReconstructionError>;

/// Builds volumes from slice stacks and cuts axis-aligned cross-sections
/// back out of them.
pub struct ReconstructionEngine;

impl ReconstructionEngine {
    /// Stack `slices` into a volume, one depth layer per slice, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if `slices` is empty, the first slice has no pixels
    /// or any slice differs in size from the first.
    pub fn build(slices: &[Slice]) -> ReconstructionResult<Volume> {
        let first = slices.first().ok_or(ReconstructionError::EmptyStack)?;
        let expected = (first.width(), first.height());
        Self::validate_dimensions(slices, expected)?;

        let (width, height) = expected;
        let depth = slices.len();
        let mut data = Array3::<i32>::zeros((depth, width, height));
        for (z, slice) in slices.iter().enumerate() {
            data.slice_mut(s![z, .., ..]).assign(&slice.pixels().t());
        }

        info!(depth, width, height, "Reconstructed volume");
        Ok(Volume::new(data))
    }

    fn validate_dimensions(slices: &[Slice], expected: (usize, usize)) -> ReconstructionResult<()> {
        let (width, height) = expected;
        if width == 0 || height == 0 {
            return Err(ReconstructionError::EmptySlice { width, height });
        }
        match slices
            .iter()
            .enumerate()
            .find(|(_, slice)| (slice.width(), slice.height()) != expected)
        {
            Some((index, slice)) => Err(ReconstructionError::InconsistentDimensions {
                index,
                expected,
                found: (slice.width(), slice.height()),
            }),
            None => Ok(()),
        }
    }

    /// Extract the cross-section at `index` along `axis` as a
    /// `(height, width)` plane of packed samples.
    ///
    /// The sagittal (`X`) and coronal (`Y`) sections run the depth
    /// dimension back to front: the last slice lands in output column (or
    /// row) zero.
    pub fn extract_slice(
        volume: &Volume,
        axis: Axis,
        index: usize,
    ) -> ReconstructionResult<Array2<i32>> {
        if !volume.is_valid_index(index, axis) {
            return Err(ReconstructionError::IndexOutOfRange {
                axis,
                index,
                bound: volume.extent(axis),
            });
        }

        let data = volume.data();
        let plane = match axis {
            // (width, height) -> (height, width)
            Axis::Z => data.slice(s![index, .., ..]).reversed_axes(),
            // (depth reversed, height) -> (height, depth reversed)
            Axis::X => data.slice(s![..;-1, index, ..]).reversed_axes(),
            // (depth reversed, width)
            Axis::Y => data.slice(s![..;-1, .., index]),
        };
        Ok(plane.as_standard_layout().into_owned())
    }

    /// Like [`extract_slice`](Self::extract_slice), addressed by an axis
    /// label. An unrecognized label yields `Ok(None)`.
    pub fn extract_slice_labeled(
        volume: &Volume,
        label: char,
        index: usize,
    ) -> ReconstructionResult<Option<Array2<i32>>> {
        Axis::from_label(label)
            .map(|axis| Self::extract_slice(volume, axis, index))
            .transpose()
    }

    /// Extract a cross-section and remap its blue-channel intensity into
    /// full-range grey between `low` and `high`.
    ///
    /// Intensities above `high` become white, below `low` black. With
    /// [`WindowEdges::Legacy`] the last row and column are left fully
    /// transparent.
    ///
    /// # Errors
    ///
    /// Returns an error if `high <= low` or `index` is out of range.
    pub fn window_slice(
        volume: &Volume,
        axis: Axis,
        index: usize,
        low: i32,
        high: i32,
        edges: WindowEdges,
    ) -> ReconstructionResult<RgbaImage> {
        if high <= low {
            return Err(ReconstructionError::InvalidWindow { low, high });
        }
        let plane = Self::extract_slice(volume, axis, index)?;
        let (height, width) = plane.dim();
        let (scan_height, scan_width) = match edges {
            WindowEdges::Legacy => (height.saturating_sub(1), width.saturating_sub(1)),
            WindowEdges::Full => (height, width),
        };
        debug!(%axis, index, low, high, ?edges, "Windowing slice");

        let pixel_data: Vec<u8> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                let plane = &plane;
                (0..width).flat_map(move |x| {
                    if y < scan_height && x < scan_width {
                        Self::window_pixel(blue(plane[[y, x]]), low, high)
                    } else {
                        UNSCANNED
                    }
                })
            })
            .collect();

        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
            .ok_or(ReconstructionError::BufferSize)
    }

    /// Like [`window_slice`](Self::window_slice), addressed by an axis
    /// label. An unrecognized label yields `Ok(None)`.
    pub fn window_slice_labeled(
        volume: &Volume,
        label: char,
        index: usize,
        low: i32,
        high: i32,
        edges: WindowEdges,
    ) -> ReconstructionResult<Option<RgbaImage>> {
        Axis::from_label(label)
            .map(|axis| Self::window_slice(volume, axis, index, low, high, edges))
            .transpose()
    }

    #[inline]
    fn window_pixel(intensity: u8, low: i32, high: i32) -> [u8; 4] {
        let intensity = i32::from(intensity);
        if intensity > high {
            WHITE
        } else if intensity < low {
            BLACK
        } else {
            let grey = Self::window_level(intensity, low, high);
            [grey, grey, grey, u8::MAX]
        }
    }

    /// Linear rescale of `low..=high` onto `0..=255`. Caller guarantees
    /// `low <= intensity <= high` and `low < high`.
    #[inline]
    fn window_level(intensity: i32, low: i32, high: i32) -> u8 {
        let (intensity, low, high) = (f64::from(intensity), f64::from(low), f64::from(high));
        let scaled = 255.0 * (intensity - low) / (high - low);
        scaled.round().clamp(0.0, 255.0) as u8
    }
}
