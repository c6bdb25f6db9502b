use image::{ImageBuffer, Rgba, RgbaImage};
use ndarray::{Array2, Axis};
use rayon::prelude::*;

/// Alpha bits set on every packed sample produced by the loaders.
pub const OPAQUE: u32 = 0xFF00_0000;

/// Pack an RGB triple into a `0xAARRGGBB` sample with full alpha.
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> i32 {
    (OPAQUE | (r as u32) << 16 | (g as u32) << 8 | b as u32) as i32
}

#[inline]
pub fn pack_grey(value: u8) -> i32 {
    pack_rgb(value, value, value)
}

/// Blue channel of a packed sample, where greyscale intensity lives.
#[inline]
pub fn blue(sample: i32) -> u8 {
    (sample & 0xFF) as u8
}

#[inline]
fn unpack_opaque(sample: i32) -> Rgba<u8> {
    let [_, r, g, b] = (sample as u32).to_be_bytes();
    Rgba([r, g, b, u8::MAX])
}

/// One decoded input image contributing a single depth layer.
///
/// Samples are stored row-major as `(height, width)`; use [`Slice::pixel`]
/// for `(x, y)` access.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    name: String,
    pixels: Array2<i32>,
}

impl Slice {
    pub fn new(name: impl Into<String>, pixels: Array2<i32>) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    /// A slice with every sample set to `value`.
    pub fn filled(name: impl Into<String>, width: usize, height: usize, value: i32) -> Self {
        Self::new(name, Array2::from_elem((height, width), value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<i32> {
        self.pixels.get((y, x)).copied()
    }

    pub fn pixels(&self) -> &Array2<i32> {
        &self.pixels
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        plane_to_image(&self.pixels)
    }
}

/// Convert a `(height, width)` plane of packed samples into an opaque RGBA
/// image. Returns `None` only if the buffer cannot be sized.
pub fn plane_to_image(plane: &Array2<i32>) -> Option<RgbaImage> {
    let (height, width) = plane.dim();
    let pixel_data: Vec<u8> = plane
        .axis_iter(Axis(0))
        .into_par_iter()
        .flat_map_iter(|row| {
            row.iter()
                .flat_map(|&sample| unpack_opaque(sample).0)
                .collect::<Vec<u8>>()
        })
        .collect();
    ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_roundtrips_channels() {
        let sample = pack_rgb(10, 20, 30);
        assert!(sample < 0);
        assert_eq!(blue(sample), 30);
        assert_eq!(unpack_opaque(sample), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_pixel_is_x_then_y() {
        let mut pixels = Array2::zeros((2, 3));
        pixels[[1, 2]] = 7;
        let slice = Slice::new("a", pixels);

        assert_eq!(slice.width(), 3);
        assert_eq!(slice.height(), 2);
        assert_eq!(slice.pixel(2, 1), Some(7));
        assert_eq!(slice.pixel(3, 0), None);
    }

    #[test]
    fn test_plane_to_image_is_opaque() {
        let slice = Slice::filled("a", 2, 3, 5);
        let image = slice.to_image().expect("should build image");

        assert_eq!(image.dimensions(), (2, 3));
        assert_eq!(image.get_pixel(1, 2), &Rgba([0, 0, 5, 255]));
    }
}
