use crate::enums::Axis;

use ndarray::Array3;

/// Dense sample grid reconstructed from a stack of slices.
///
/// Samples are laid out `[z][x][y]`: depth first, then column, then row.
/// A volume is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<i32>,
}

impl Volume {
    pub(crate) fn new(data: Array3<i32>) -> Self {
        Self { data }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        let (depth, width, height) = self.data.dim();
        (depth, height, width)
    }

    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().2
    }

    /// Get a reference to the underlying `[z][x][y]` data
    pub fn data(&self) -> &Array3<i32> {
        &self.data
    }

    /// Bounds-checked sample access.
    pub fn sample(&self, z: usize, x: usize, y: usize) -> Option<i32> {
        self.data.get((z, x, y)).copied()
    }

    /// Number of valid indices along `axis`.
    pub fn extent(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.width(),
            Axis::Y => self.height(),
            Axis::Z => self.depth(),
        }
    }

    pub(crate) fn is_valid_index(&self, index: usize, axis: Axis) -> bool {
        index < self.extent(axis)
    }
}
