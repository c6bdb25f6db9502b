use crate::{
    enums::SortBy,
    slice::{Slice, pack_grey, pack_rgb},
};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use ndarray::{Array2, s};
use rayon::prelude::*;
use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, warn};

/// Bytes preceding the pixel block of a scanner `.acr` file.
const ACR_HEADER_LEN: usize = 0x2000;
/// `.acr` slices are always square with this side length.
const ACR_SIDE: usize = 256;
const ACR_MAX_INTENSITY: u16 = 0x0FFF;

#[derive(Debug, Error)]
pub enum SliceLoaderError {
    #[error("No valid images found")]
    NoValidImages,

    #[error("Unsupported slice format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("ACR file {path} is shorter than its 256x256 pixel block")]
    TruncatedAcr { path: PathBuf },

    #[error("DICOM file {path} has no decodable pixel data")]
    UndecodableDicom { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SliceFormat {
    Jpeg,
    Acr,
    Dicom,
}

impl SliceFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpeg" | "jpg" => Some(SliceFormat::Jpeg),
            "acr" => Some(SliceFormat::Acr),
            "dcm" => Some(SliceFormat::Dicom),
            _ => None,
        }
    }
}

/// Decodes the image files of a study directory into slices.
pub struct SliceLoader;

impl SliceLoader {
    /// Load every `.jpeg`/`.jpg`, `.acr` and `.dcm` file in a directory
    ///
    /// Files that fail to decode are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the directory can't be read or no file decodes
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Vec<Slice>, SliceLoaderError> {
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| SliceFormat::from_path(path).is_some())
            .collect();

        if paths.is_empty() {
            return Err(SliceLoaderError::NoValidImages);
        }

        Self::load_from_file_paths(&paths, sort_by)
    }

    /// Load slices from file paths, decoding in parallel
    pub fn load_from_file_paths(
        paths: &[PathBuf],
        sort_by: SortBy,
    ) -> Result<Vec<Slice>, SliceLoaderError> {
        let mut slices: Vec<Slice> = paths
            .par_iter()
            .filter_map(|path| match Self::load_file(path) {
                Ok(slice) => Some(slice),
                Err(err) => {
                    warn!(path = %path.display(), %err, "Skipping unreadable slice");
                    None
                }
            })
            .collect();

        if slices.is_empty() {
            return Err(SliceLoaderError::NoValidImages);
        }

        Self::sort_slices(&mut slices, sort_by);
        info!(count = slices.len(), skipped = paths.len() - slices.len(), "Loaded slices");
        Ok(slices)
    }

    /// Decode a single file. The slice is named after the full file name,
    /// so `1.jpg` and `1.acr` stay distinct.
    pub fn load_file(path: &Path) -> Result<Slice, SliceLoaderError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pixels = match SliceFormat::from_path(path) {
            Some(SliceFormat::Jpeg) => Self::read_jpeg(path)?,
            Some(SliceFormat::Acr) => Self::read_acr(path)?,
            Some(SliceFormat::Dicom) => Self::read_dicom(path)?,
            None => {
                return Err(SliceLoaderError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        Ok(Slice::new(name, pixels))
    }

    fn read_jpeg(path: &Path) -> Result<Array2<i32>, SliceLoaderError> {
        let image = image::open(path)?.to_rgb8();
        let (width, height) = image.dimensions();
        Ok(Array2::from_shape_fn(
            (height as usize, width as usize),
            |(y, x)| {
                let [r, g, b] = image.get_pixel(x as u32, y as u32).0;
                pack_rgb(r, g, b)
            },
        ))
    }

    fn read_acr(path: &Path) -> Result<Array2<i32>, SliceLoaderError> {
        let bytes = fs::read(path)?;
        Self::decode_acr(&bytes).ok_or_else(|| SliceLoaderError::TruncatedAcr {
            path: path.to_path_buf(),
        })
    }

    /// Decode the raw scanner format: a fixed header, then 256x256 two-byte
    /// samples holding a 12-bit intensity as `hi << 4 | lo >> 4`.
    pub(crate) fn decode_acr(bytes: &[u8]) -> Option<Array2<i32>> {
        let pixels = bytes.get(ACR_HEADER_LEN..ACR_HEADER_LEN + ACR_SIDE * ACR_SIDE * 2)?;
        Some(Array2::from_shape_fn((ACR_SIDE, ACR_SIDE), |(y, x)| {
            let offset = (y * ACR_SIDE + x) * 2;
            let high = u16::from(pixels[offset]);
            let low = u16::from(pixels[offset + 1]);
            pack_grey(Self::normalize_12bit(high << 4 | low >> 4))
        }))
    }

    fn read_dicom(path: &Path) -> Result<Array2<i32>, SliceLoaderError> {
        let dicom_object = open_file(path)?;
        let image = Self::decode_image(&dicom_object).ok_or_else(|| {
            SliceLoaderError::UndecodableDicom {
                path: path.to_path_buf(),
            }
        })?;
        Ok(image.mapv(|value| pack_grey(Self::normalize_to_u8(value))))
    }

    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<u16>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
        pixel_data
            .to_ndarray_with_options::<u16>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    #[inline]
    fn normalize_to_u8(value: u16) -> u8 {
        ((value as f32 / 65535.0) * 255.0).clamp(0.0, 255.0) as u8
    }

    #[inline]
    fn normalize_12bit(value: u16) -> u8 {
        let value = value.min(ACR_MAX_INTENSITY);
        (u32::from(value) * 255 / u32::from(ACR_MAX_INTENSITY)) as u8
    }

    fn sort_slices(slices: &mut [Slice], sort_by: SortBy) {
        if matches!(sort_by, SortBy::Name) {
            slices.sort_by(|a, b| Self::compare_names(a.name(), b.name()));
        }
    }

    /// Numeric names first, in numeric order ("2.jpg" before "10.jpg"),
    /// then the rest lexicographically. Only the part before the first `.`
    /// is read as the number; equal numbers fall back to the full name.
    fn compare_names(a: &str, b: &str) -> Ordering {
        match (Self::name_number(a), Self::name_number(b)) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }

    fn name_number(name: &str) -> Option<u64> {
        name.split('.').next()?.parse().ok()
    }
}
