//! Position cursors, one kind per view mode.
//!
//! A cursor only stores where it is. Bounds and pixels come from the
//! [`Study`] passed into each call, so a cursor restored from disk or from
//! the undo history can be pointed at whichever study is open.

use crate::enums::{Axis, ViewMode};
use crate::reconstruction::{ReconstructionEngine, ReconstructionError, ReconstructionResult};
use crate::slice::plane_to_image;
use crate::study::Study;

use image::RgbaImage;
use serde::{Deserialize, Deserializer, Serialize};

/// Images visible at a cursor position. Entries past the end of the stack
/// are `None`.
pub type Frames = Vec<Option<RgbaImage>>;

/// Slices shown together by a [`QuadGroupCursor`].
pub const QUAD_GROUP: usize = 4;

/// Shared navigation capability of every cursor kind.
///
/// `advance` and `retreat` move by exactly one stride and return `true`, or
/// return `false` and stay put when the move would leave the valid range.
pub trait StudyCursor {
    fn advance(&mut self, study: &Study) -> bool;

    fn retreat(&mut self) -> bool;

    fn materialize(&self, study: &Study) -> ReconstructionResult<Frames>;

    fn position(&self) -> usize;
}

fn step_forward(position: &mut usize, stride: usize, extent: usize) -> bool {
    match position.checked_add(stride) {
        Some(next) if next < extent => {
            *position = next;
            true
        }
        _ => false,
    }
}

fn step_back(position: &mut usize, stride: usize) -> bool {
    if *position < stride {
        return false;
    }
    *position -= stride;
    true
}

fn raw_slice(study: &Study, index: usize) -> Option<RgbaImage> {
    study.slices().get(index).and_then(|slice| slice.to_image())
}

fn section(study: &Study, axis: Axis, index: usize) -> ReconstructionResult<Frames> {
    let plane = ReconstructionEngine::extract_slice(study.volume(), axis, index)?;
    let image = plane_to_image(&plane).ok_or(ReconstructionError::BufferSize)?;
    Ok(vec![Some(image)])
}

/// Steps through the raw slices one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SingleCursor {
    position: usize,
}

impl SingleCursor {
    pub fn new(position: usize) -> Self {
        Self { position }
    }
}

impl StudyCursor for SingleCursor {
    fn advance(&mut self, study: &Study) -> bool {
        step_forward(&mut self.position, 1, study.slices().len())
    }

    fn retreat(&mut self) -> bool {
        step_back(&mut self.position, 1)
    }

    fn materialize(&self, study: &Study) -> ReconstructionResult<Frames> {
        let slices = study.slices();
        let slice = slices
            .get(self.position)
            .ok_or(ReconstructionError::IndexOutOfRange {
                axis: Axis::Z,
                index: self.position,
                bound: slices.len(),
            })?;
        let image = slice.to_image().ok_or(ReconstructionError::BufferSize)?;
        Ok(vec![Some(image)])
    }

    fn position(&self) -> usize {
        self.position
    }
}

fn snap_to_group(position: usize) -> usize {
    position / QUAD_GROUP * QUAD_GROUP
}

fn deserialize_group_start<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    usize::deserialize(deserializer).map(snap_to_group)
}

/// Shows four consecutive slices at once. The position is always a
/// multiple of four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuadGroupCursor {
    #[serde(deserialize_with = "deserialize_group_start")]
    position: usize,
}

impl QuadGroupCursor {
    /// Start at the group containing `position`.
    pub fn new(position: usize) -> Self {
        Self {
            position: snap_to_group(position),
        }
    }
}

impl StudyCursor for QuadGroupCursor {
    fn advance(&mut self, study: &Study) -> bool {
        step_forward(&mut self.position, QUAD_GROUP, study.slices().len())
    }

    fn retreat(&mut self) -> bool {
        step_back(&mut self.position, QUAD_GROUP)
    }

    fn materialize(&self, study: &Study) -> ReconstructionResult<Frames> {
        Ok((0..QUAD_GROUP)
            .map(|offset| {
                self.position
                    .checked_add(offset)
                    .and_then(|index| raw_slice(study, index))
            })
            .collect())
    }

    fn position(&self) -> usize {
        self.position
    }
}

/// Walks sagittal sections across the slice width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SagittalCursor {
    position: usize,
}

impl SagittalCursor {
    pub fn new(position: usize) -> Self {
        Self { position }
    }
}

impl StudyCursor for SagittalCursor {
    fn advance(&mut self, study: &Study) -> bool {
        step_forward(&mut self.position, 1, study.volume().width())
    }

    fn retreat(&mut self) -> bool {
        step_back(&mut self.position, 1)
    }

    fn materialize(&self, study: &Study) -> ReconstructionResult<Frames> {
        section(study, Axis::X, self.position)
    }

    fn position(&self) -> usize {
        self.position
    }
}

/// Walks coronal sections down the slice height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoronalCursor {
    position: usize,
}

impl CoronalCursor {
    pub fn new(position: usize) -> Self {
        Self { position }
    }
}

impl StudyCursor for CoronalCursor {
    fn advance(&mut self, study: &Study) -> bool {
        step_forward(&mut self.position, 1, study.volume().height())
    }

    fn retreat(&mut self) -> bool {
        step_back(&mut self.position, 1)
    }

    fn materialize(&self, study: &Study) -> ReconstructionResult<Frames> {
        section(study, Axis::Y, self.position)
    }

    fn position(&self) -> usize {
        self.position
    }
}

/// Steps through native slices with a fixed intensity window applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowedCursor {
    position: usize,
    low: i32,
    high: i32,
}

impl WindowedCursor {
    pub const DEFAULT_LOW: i32 = 0;
    pub const DEFAULT_HIGH: i32 = 255;

    /// # Errors
    ///
    /// Returns [`ReconstructionError::InvalidWindow`] unless `low < high`.
    pub fn new(position: usize, low: i32, high: i32) -> ReconstructionResult<Self> {
        if high <= low {
            return Err(ReconstructionError::InvalidWindow { low, high });
        }
        Ok(Self {
            position,
            low,
            high,
        })
    }

    pub fn low(&self) -> i32 {
        self.low
    }

    pub fn high(&self) -> i32 {
        self.high
    }
}

impl Default for WindowedCursor {
    fn default() -> Self {
        Self {
            position: 0,
            low: Self::DEFAULT_LOW,
            high: Self::DEFAULT_HIGH,
        }
    }
}

impl StudyCursor for WindowedCursor {
    fn advance(&mut self, study: &Study) -> bool {
        step_forward(&mut self.position, 1, study.slices().len())
    }

    fn retreat(&mut self) -> bool {
        step_back(&mut self.position, 1)
    }

    fn materialize(&self, study: &Study) -> ReconstructionResult<Frames> {
        let image = ReconstructionEngine::window_slice(
            study.volume(),
            Axis::Z,
            self.position,
            self.low,
            self.high,
            study.window_edges(),
        )?;
        Ok(vec![Some(image)])
    }

    fn position(&self) -> usize {
        self.position
    }
}

/// Any cursor kind. This is the value stored in cursor sets, snapshots and
/// persisted study records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cursor {
    Single(SingleCursor),
    Quad(QuadGroupCursor),
    Sagittal(SagittalCursor),
    Coronal(CoronalCursor),
    Windowed(WindowedCursor),
}

impl Cursor {
    fn inner(&self) -> &dyn StudyCursor {
        match self {
            Cursor::Single(cursor) => cursor,
            Cursor::Quad(cursor) => cursor,
            Cursor::Sagittal(cursor) => cursor,
            Cursor::Coronal(cursor) => cursor,
            Cursor::Windowed(cursor) => cursor,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn StudyCursor {
        match self {
            Cursor::Single(cursor) => cursor,
            Cursor::Quad(cursor) => cursor,
            Cursor::Sagittal(cursor) => cursor,
            Cursor::Coronal(cursor) => cursor,
            Cursor::Windowed(cursor) => cursor,
        }
    }
}

impl StudyCursor for Cursor {
    fn advance(&mut self, study: &Study) -> bool {
        self.inner_mut().advance(study)
    }

    fn retreat(&mut self) -> bool {
        self.inner_mut().retreat()
    }

    fn materialize(&self, study: &Study) -> ReconstructionResult<Frames> {
        self.inner().materialize(study)
    }

    fn position(&self) -> usize {
        self.inner().position()
    }
}

impl From<SingleCursor> for Cursor {
    fn from(cursor: SingleCursor) -> Self {
        Cursor::Single(cursor)
    }
}

impl From<QuadGroupCursor> for Cursor {
    fn from(cursor: QuadGroupCursor) -> Self {
        Cursor::Quad(cursor)
    }
}

impl From<SagittalCursor> for Cursor {
    fn from(cursor: SagittalCursor) -> Self {
        Cursor::Sagittal(cursor)
    }
}

impl From<CoronalCursor> for Cursor {
    fn from(cursor: CoronalCursor) -> Self {
        Cursor::Coronal(cursor)
    }
}

impl From<WindowedCursor> for Cursor {
    fn from(cursor: WindowedCursor) -> Self {
        Cursor::Windowed(cursor)
    }
}

/// One cursor per [`ViewMode`] slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSet {
    slots: [Cursor; ViewMode::COUNT],
}

impl CursorSet {
    pub fn new(slots: [Cursor; ViewMode::COUNT]) -> Self {
        Self { slots }
    }

    pub fn get(&self, mode: ViewMode) -> &Cursor {
        &self.slots[mode.index()]
    }

    pub fn get_mut(&mut self, mode: ViewMode) -> &mut Cursor {
        &mut self.slots[mode.index()]
    }

    /// Swap in a fresh cursor for `mode`, returning the old one.
    pub fn replace(&mut self, mode: ViewMode, cursor: Cursor) -> Cursor {
        std::mem::replace(self.get_mut(mode), cursor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ViewMode, &Cursor)> {
        ViewMode::ALL.into_iter().zip(self.slots.iter())
    }
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::new([
            SingleCursor::default().into(),
            QuadGroupCursor::default().into(),
            WindowedCursor::default().into(),
            SingleCursor::default().into(),
            SagittalCursor::default().into(),
            CoronalCursor::default().into(),
        ])
    }
}
