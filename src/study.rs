use crate::cursor::CursorSet;
use crate::enums::{SortBy, ViewMode, WindowEdges};
use crate::navigator::Navigator;
use crate::persistence::{PersistenceError, RECORD_EXTENSION, StudyRecord};
use crate::reconstruction::{ReconstructionEngine, ReconstructionError};
use crate::slice::Slice;
use crate::slice_loader::{SliceLoader, SliceLoaderError};
use crate::volume::Volume;

use image::{DynamicImage, ImageFormat};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Loader(#[from] SliceLoaderError),

    #[error(transparent)]
    Reconstruction(#[from] ReconstructionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Study {0} was built in memory and has no directory")]
    NotOnDisk(String),

    #[error("Path {0} does not name a study directory")]
    Unnamed(PathBuf),

    #[error("Two slices would both be copied to {0}")]
    DuplicateSlice(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Background open failed: {0}")]
    Background(#[from] tokio::task::JoinError),
}

pub type StudyResult<T> = std::result::Result<T, StudyError>;

/// An open study: its ordered slices and the volume built from them.
///
/// This is the read-only context every cursor operation receives.
#[derive(Debug, Clone)]
pub struct Study {
    name: String,
    path: Option<PathBuf>,
    slices: Vec<Slice>,
    volume: Volume,
    window_edges: WindowEdges,
}

impl Study {
    /// Open the study stored in directory `path`.
    ///
    /// # Errors
    ///
    /// Returns error if no slice decodes or the slices differ in size
    pub fn open(path: impl AsRef<Path>, sort_by: SortBy) -> StudyResult<Self> {
        let path = path.as_ref();
        let name = directory_name(path)?;
        let slices = SliceLoader::load_from_directory(path, sort_by)?;
        let mut study = Self::from_slices(name, slices)?;
        study.path = Some(path.to_path_buf());
        info!(study = %study.name, path = %path.display(), "Opened study");
        Ok(study)
    }

    /// [`open`](Self::open) on the blocking pool. The study is only handed
    /// back once its volume is fully built.
    pub async fn open_async(path: PathBuf, sort_by: SortBy) -> StudyResult<Self> {
        tokio::task::spawn_blocking(move || Self::open(path, sort_by)).await?
    }

    /// Build an in-memory study with no backing directory.
    pub fn from_slices(name: impl Into<String>, slices: Vec<Slice>) -> StudyResult<Self> {
        let volume = ReconstructionEngine::build(&slices)?;
        Ok(Self {
            name: name.into(),
            path: None,
            slices,
            volume,
            window_edges: WindowEdges::default(),
        })
    }

    pub fn with_window_edges(mut self, window_edges: WindowEdges) -> Self {
        self.window_edges = window_edges;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn window_edges(&self) -> WindowEdges {
        self.window_edges
    }

    /// `<dir>/<name>.sdy`, if the study lives on disk.
    pub fn record_path(&self) -> Option<PathBuf> {
        self.path
            .as_ref()
            .map(|dir| dir.join(format!("{}.{RECORD_EXTENSION}", self.name)))
    }

    fn require_record_path(&self) -> StudyResult<PathBuf> {
        self.record_path()
            .ok_or_else(|| StudyError::NotOnDisk(self.name.clone()))
    }

    /// The saved navigation record, or `None` if the study was never saved.
    pub fn load_record(&self) -> StudyResult<Option<StudyRecord>> {
        match self.record_path() {
            Some(path) if path.exists() => Ok(Some(StudyRecord::read(&path)?)),
            _ => Ok(None),
        }
    }

    pub fn save_record(&self, record: &StudyRecord) -> StudyResult<()> {
        let path = self.require_record_path()?;
        record.write(&path)?;
        info!(study = %self.name, path = %path.display(), "Saved study");
        Ok(())
    }

    /// Navigator resumed from the saved record, or a fresh one.
    pub fn restore_navigation(&self) -> StudyResult<Navigator> {
        Ok(self
            .load_record()?
            .map(Navigator::from_record)
            .unwrap_or_default())
    }

    /// True when a saved record exists and equals `cursors` and `mode`.
    /// Unreadable records count as different.
    pub fn matches_saved(&self, cursors: &CursorSet, mode: ViewMode) -> bool {
        self.load_record()
            .ok()
            .flatten()
            .is_some_and(|record| record.matches(cursors, mode))
    }

    /// Copy the study into `dest` as JPEG slices and save `record` there.
    ///
    /// If `dest` already exists the copy goes into `dest/<dest>_copy`
    /// instead. Returns the newly opened copy.
    pub fn save_as(&self, dest: impl AsRef<Path>, record: &StudyRecord) -> StudyResult<Study> {
        let dest = dest.as_ref();
        let dest = if dest.exists() {
            dest.join(format!("{}_copy", directory_name(dest)?))
        } else {
            dest.to_path_buf()
        };

        let mut file_names = HashSet::with_capacity(self.slices.len());
        let targets = self
            .slices
            .iter()
            .map(|slice| {
                let file_name = copy_file_name(slice.name());
                if file_names.insert(file_name.clone()) {
                    Ok((slice, file_name))
                } else {
                    Err(StudyError::DuplicateSlice(file_name))
                }
            })
            .collect::<StudyResult<Vec<_>>>()?;

        fs::create_dir_all(&dest)?;
        for (slice, file_name) in targets {
            let image = slice.to_image().ok_or(ReconstructionError::BufferSize)?;
            DynamicImage::ImageRgba8(image)
                .to_rgb8()
                .save_with_format(dest.join(file_name), ImageFormat::Jpeg)?;
        }

        let copy = Study::open(&dest, SortBy::Name)?.with_window_edges(self.window_edges);
        copy.save_record(record)?;
        Ok(copy)
    }
}

/// Last component of `path` once `.` and `..` are resolved.
fn directory_name(path: &Path) -> StudyResult<String> {
    fs::canonicalize(path)?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| StudyError::Unnamed(path.to_path_buf()))
}

/// Copies keep the slice name and gain a `.JPEG` extension unless they
/// already carry one.
fn copy_file_name(slice_name: &str) -> String {
    if Path::new(slice_name).extension().is_some_and(|ext| ext == "JPEG") {
        slice_name.to_string()
    } else {
        format!("{slice_name}.JPEG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SingleCursor;
    use crate::slice::pack_grey;

    fn slices() -> Vec<Slice> {
        (0..3)
            .map(|z| Slice::filled((z + 1).to_string(), 4, 4, pack_grey(z as u8 * 100)))
            .collect()
    }

    fn saved_study(dir: &Path) -> Study {
        let source = Study::from_slices("source", slices()).expect("should build");
        source
            .save_as(dir.join("head"), &Navigator::default().record())
            .expect("should save copy")
    }

    #[test]
    fn test_from_slices_builds_volume() {
        let study = Study::from_slices("mem", slices()).expect("should build");
        assert_eq!(study.volume().dim(), (3, 4, 4));
        assert_eq!(study.slices().len(), 3);
        assert!(study.path().is_none());
        assert!(study.record_path().is_none());
        assert_eq!(study.window_edges(), WindowEdges::Legacy);
    }

    #[test]
    fn test_from_slices_rejects_empty_stack() {
        assert!(matches!(
            Study::from_slices("mem", Vec::new()),
            Err(StudyError::Reconstruction(ReconstructionError::EmptyStack))
        ));
    }

    #[test]
    fn test_in_memory_study_cannot_save() {
        let study = Study::from_slices("mem", slices()).expect("should build");
        assert!(matches!(
            study.save_record(&Navigator::default().record()),
            Err(StudyError::NotOnDisk(_))
        ));
        assert!(study.load_record().expect("no record").is_none());
    }

    #[test]
    fn test_save_as_writes_and_reopens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let copy = saved_study(dir.path());

        assert_eq!(copy.name(), "head");
        assert_eq!(copy.slices().len(), 3);
        let names: Vec<&str> = copy.slices().iter().map(Slice::name).collect();
        assert_eq!(names, ["1.JPEG", "2.JPEG", "3.JPEG"]);
        assert_eq!(copy.record_path(), Some(dir.path().join("head").join("head.sdy")));
        assert!(copy.load_record().expect("readable").is_some());
    }

    #[test]
    fn test_save_as_into_existing_directory_nests_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let existing = dir.path().join("head");
        fs::create_dir_all(&existing).expect("mkdir");

        let source = Study::from_slices("source", slices()).expect("should build");
        let copy = source
            .save_as(&existing, &Navigator::default().record())
            .expect("should save copy");
        assert_eq!(copy.path(), Some(existing.join("head_copy").as_path()));
    }

    #[test]
    fn test_save_as_keeps_slices_sharing_a_stem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stack: Vec<Slice> = ["1.jpg", "1.jpeg", "1.acr"]
            .iter()
            .map(|name| Slice::filled(*name, 4, 4, pack_grey(40)))
            .collect();
        let source = Study::from_slices("source", stack).expect("should build");
        let record = Navigator::default().record();

        let copy = source.save_as(dir.path().join("head"), &record).expect("should save copy");
        let names: Vec<&str> = copy.slices().iter().map(Slice::name).collect();
        assert_eq!(names, ["1.acr.JPEG", "1.jpeg.JPEG", "1.jpg.JPEG"]);

        let again = copy.save_as(dir.path().join("again"), &record).expect("should save copy");
        let again_names: Vec<&str> = again.slices().iter().map(Slice::name).collect();
        assert_eq!(again_names, names);
    }

    #[test]
    fn test_save_as_rejects_duplicate_slice_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stack = vec![
            Slice::filled("a", 4, 4, pack_grey(10)),
            Slice::filled("a", 4, 4, pack_grey(20)),
        ];
        let source = Study::from_slices("source", stack).expect("should build");

        let dest = dir.path().join("head");
        assert!(matches!(
            source.save_as(&dest, &Navigator::default().record()),
            Err(StudyError::DuplicateSlice(name)) if name == "a.JPEG"
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_open_resolves_relative_components_in_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        saved_study(dir.path());
        let nested = dir.path().join("head").join("nested");
        fs::create_dir_all(&nested).expect("mkdir");

        let study = Study::open(nested.join(".."), SortBy::Name).expect("should open");
        assert_eq!(study.name(), "head");
        assert_eq!(study.record_path(), Some(nested.join("..").join("head.sdy")));

        let record = Navigator::default().record();
        let copy = study.save_as(nested.join(".."), &record).expect("should save copy");
        assert_eq!(copy.name(), "head_copy");
    }

    #[test]
    fn test_open_rejects_path_without_name() {
        assert!(matches!(
            Study::open("/", SortBy::Name),
            Err(StudyError::Unnamed(_))
        ));
    }

    #[test]
    fn test_matches_saved_compares_cursors_and_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let study = saved_study(dir.path());
        let mut navigator = study.restore_navigation().expect("should restore");

        assert!(study.matches_saved(navigator.cursors(), navigator.mode()));

        navigator.replace_cursor(ViewMode::Single, SingleCursor::new(2));
        assert!(!study.matches_saved(navigator.cursors(), navigator.mode()));

        study.save_record(&navigator.record()).expect("save");
        assert!(study.matches_saved(navigator.cursors(), navigator.mode()));
        assert!(!study.matches_saved(navigator.cursors(), ViewMode::Quad));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_open_async_builds_volume() {
        let dir = tempfile::tempdir().expect("tempdir");
        saved_study(dir.path());

        let study = Study::open_async(dir.path().join("head"), SortBy::Name)
            .await
            .expect("should open");
        assert_eq!(study.volume().dim(), (3, 4, 4));
    }
}
