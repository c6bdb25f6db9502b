//! # Study-volume library
//!
//! This crate reconstructs a volume from an ordered stack of 2D image
//! slices and navigates it in several view modes
//!
//! A study is a directory of slice images (JPEG, raw scanner `.acr` files
//! or DICOM). The slices are stacked into a dense [`Volume`] which can be
//! cut along its three native axes:
//!  - Native (the slices themselves)
//!  - Sagittal
//!  - Coronal
//!
//!  Each view mode owns a cursor that steps through the study in its own
//!  stride: one slice, a group of four slices, one sagittal or coronal
//!  section, or one intensity-windowed slice. The whole cursor set plus the
//!  active mode can be checkpointed and undone, and saved next to the
//!  study as a versioned JSON record so a session resumes where it left
//!  off.
//!
//!  Sagittal and coronal sections are shown back to front: the last slice
//!  of the stack is the first output column (or row).
//!
//! # Examples
//!
//! ## Opening a study and stepping through sagittal sections
//!
//! ```no_run
//! # use study_volume::{Study, SortBy, ViewMode};
//! let study = Study::open("studies/head", SortBy::Name)
//!     .expect("should have loaded slices from directory");
//! let mut navigator = study
//!     .restore_navigation()
//!     .expect("should have read the saved record");
//! navigator.set_mode(ViewMode::Sagittal);
//! navigator.next(&study);
//! let frames = navigator
//!     .render(&study)
//!     .expect("should have rendered the sagittal section");
//! if let Some(image) = &frames[0] {
//!     image.save("sagittal.png").expect("should have saved image");
//! }
//! study
//!     .save_record(&navigator.record())
//!     .expect("should have saved the record");
//! ```
//!
//! ## Windowing a native slice
//!
//! ```
//! # use study_volume::{Axis, ReconstructionEngine, Slice, WindowEdges};
//! # use study_volume::slice::pack_grey;
//! let slices: Vec<Slice> = (0..4)
//!     .map(|z| Slice::filled(z.to_string(), 4, 4, pack_grey(50 * z as u8)))
//!     .collect();
//! let volume = ReconstructionEngine::build(&slices).unwrap();
//! let image =
//!     ReconstructionEngine::window_slice(&volume, Axis::Z, 2, 50, 150, WindowEdges::Full)
//!         .unwrap();
//! assert_eq!(image.get_pixel(0, 0).0, [128, 128, 128, 255]);
//! ```

pub mod config;
pub mod cursor;
pub mod enums;
pub mod memento;
pub mod navigator;
pub mod overlay;
pub mod persistence;
pub mod reconstruction;
pub mod slice;
pub mod slice_loader;
pub mod study;
pub mod volume;

pub use cursor::{
    CoronalCursor, Cursor, CursorSet, Frames, QuadGroupCursor, SagittalCursor, SingleCursor,
    StudyCursor, WindowedCursor,
};
pub use enums::{Axis, SortBy, ViewMode, WindowEdges};
pub use memento::{NavigationError, NavigationHistory, NavigationMemento};
pub use navigator::Navigator;
pub use reconstruction::{ReconstructionEngine, ReconstructionError};
pub use slice::Slice;
pub use study::{Study, StudyError};
pub use volume::Volume;
