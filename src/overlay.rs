use image::{Rgba, RgbaImage};

/// Guide lines marking where the sagittal and coronal sections cut a
/// native slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crosshair {
    sagittal: usize,
    coronal: usize,
}

impl Crosshair {
    pub const SAGITTAL_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
    pub const CORONAL_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

    pub fn new(sagittal: usize, coronal: usize) -> Self {
        Self { sagittal, coronal }
    }

    /// Paint a vertical line at column `sagittal`, then a horizontal line at
    /// row `coronal`. A line that falls outside the image is skipped.
    pub fn draw(&self, image: &mut RgbaImage) {
        let (width, height) = image.dimensions();

        if let Ok(x) = u32::try_from(self.sagittal)
            && x < width
        {
            for y in 0..height {
                image.put_pixel(x, y, Self::SAGITTAL_COLOR);
            }
        }

        if let Ok(y) = u32::try_from(self.coronal)
            && y < height
        {
            for x in 0..width {
                image.put_pixel(x, y, Self::CORONAL_COLOR);
            }
        }
    }
}
