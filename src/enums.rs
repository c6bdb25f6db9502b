use serde::{Deserialize, Serialize};
use std::fmt;

/// The three orthogonal directions a cross-section can be taken along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Sagittal: output width is the slice count, height the slice height
    X,
    /// Coronal: output width is the slice width, height the slice count
    Y,
    /// Native slice plane
    Z,
}

impl Axis {
    /// Parse a single-character axis label (`x`, `y` or `z`, either case).
    ///
    /// Anything else yields `None`, which the labeled extraction functions
    /// report as "no result" rather than an error.
    pub fn from_label(label: char) -> Option<Self> {
        match label.to_ascii_lowercase() {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// View mode slots. The discriminant is the slot index in a cursor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Single = 0,
    Quad = 1,
    Windowed = 2,
    Reconstruction = 3,
    Sagittal = 4,
    Coronal = 5,
}

impl ViewMode {
    pub const COUNT: usize = 6;

    pub const ALL: [ViewMode; Self::COUNT] = [
        ViewMode::Single,
        ViewMode::Quad,
        ViewMode::Windowed,
        ViewMode::Reconstruction,
        ViewMode::Sagittal,
        ViewMode::Coronal,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// How the windowing scan treats the final pixel row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowEdges {
    /// Leave the last row and column transparent, matching the viewer's
    /// historical output
    #[default]
    Legacy,
    /// Window every pixel
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Numeric by the name before its first `.` when both parse as numbers, else lexicographic
    #[default]
    Name,
    None,
}
