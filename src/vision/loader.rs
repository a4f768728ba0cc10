use crate::error::LoadError;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// An image normalised to the extractor's input geometry
///
/// Always 3-channel RGB8 and exactly `size` x `size`. Pixel normalisation
/// (mean/std) is left to the extractor since it depends on the model.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub path: PathBuf,
    pub pixels: RgbImage,
}

impl PreparedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Lossless in-memory encoding for backends that take encoded bytes
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }

    /// Per-channel mean in `[0, 1]`
    pub fn mean_rgb(&self) -> [f32; 3] {
        let mut sums = [0f64; 3];
        for pixel in self.pixels.pixels() {
            for (sum, value) in sums.iter_mut().zip(pixel.0.iter()) {
                *sum += *value as f64;
            }
        }
        let count = (self.pixels.width() as f64 * self.pixels.height() as f64).max(1.0);
        sums.map(|s| (s / count / 255.0) as f32)
    }
}

/// Open, decode and resize an image
///
/// The format is guessed from the file content, falling back to the
/// extension. Resizing ignores aspect ratio and uses Catmull-Rom, which is
/// deterministic for a given input.
pub fn load_image(path: &Path, target_size: u32) -> Result<PreparedImage, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?;

    let decoded = reader.decode().map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgb = decoded.to_rgb8();
    let pixels = image::imageops::resize(&rgb, target_size, target_size, FilterType::CatmullRom);

    Ok(PreparedImage {
        path: path.to_path_buf(),
        pixels,
    })
}
