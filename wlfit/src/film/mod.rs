//! Scanned film: an 8-bit grayscale raster with a physical resolution.

use common::buffer2::Buffer2;
use image::DynamicImage;

use crate::geometry::pixel_size_from_dpi;


#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FilmError {
    #[error("Film image has no pixels")]
    Empty,
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("Channel count must be at least 1")]
    InvalidChannels,
    #[error("Scan resolution must be positive and finite, got {0} dpi")]
    InvalidResolution(f64),
}

/// Grayscale film scan. Raw values: dark (high optical density) is low.
#[derive(Debug, Clone, PartialEq)]
pub struct FilmImage {
    pixels: Buffer2<u8>,
    dpi: f64,
}

impl FilmImage {
    pub fn new(pixels: Buffer2<u8>, dpi: f64) -> Result<Self, FilmError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(FilmError::Empty);
        }
        if !(dpi.is_finite() && dpi > 0.0) {
            return Err(FilmError::InvalidResolution(dpi));
        }
        Ok(Self { pixels, dpi })
    }

    /// Builds a film from an interleaved buffer, keeping the first channel.
    ///
    /// `data` holds `width * height * channels` bytes, row-major.
    pub fn from_interleaved(
        width: usize,
        height: usize,
        channels: usize,
        data: &[u8],
        dpi: f64,
    ) -> Result<Self, FilmError> {
        if channels == 0 {
            return Err(FilmError::InvalidChannels);
        }
        if width == 0 || height == 0 {
            return Err(FilmError::Empty);
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(FilmError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        let gray = data.iter().step_by(channels).copied().collect();
        Self::new(Buffer2::new(width, height, gray), dpi)
    }

    /// Converts any decoded image to 8-bit luma.
    pub fn from_dynamic_image(image: &DynamicImage, dpi: f64) -> Result<Self, FilmError> {
        let luma = image.to_luma8();
        let (width, height) = (luma.width() as usize, luma.height() as usize);
        Self::new(Buffer2::new(width, height, luma.into_raw()), dpi)
    }

    /// Mirrors the scan, for films placed face down on the scanner.
    pub fn flipped(mut self, horizontal: bool, vertical: bool) -> Self {
        if horizontal {
            self.pixels.flip_horizontal();
        }
        if vertical {
            self.pixels.flip_vertical();
        }
        self
    }

    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Nominal pixel size in mm, the starting value for a fit.
    pub fn pixel_size(&self) -> f64 {
        pixel_size_from_dpi(self.dpi)
    }

    pub fn pixels(&self) -> &Buffer2<u8> {
        &self.pixels
    }
}
