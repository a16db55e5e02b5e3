//! Film window around the ball: cropped, inverted, intensity-normalized.

use common::buffer2::Buffer2;
use glam::DVec2;

use super::FusionError;
use super::config::FusionConfig;
use crate::film::FilmImage;

/// Pixel rectangle `[x, x + width) x [y, y + height)` inside the film.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl WindowRect {
    /// Square of half-size `half` centered on `center`, pushed back inside an
    /// `image_width x image_height` image.
    ///
    /// A window overlapping the right or bottom edge is shifted so it ends one
    /// pixel short of the edge; one overlapping the left or top edge is cut.
    /// Width and height are always at least 1.
    pub fn around(center: DVec2, half: f64, image_width: usize, image_height: usize) -> Self {
        let (x, width) = clamp_span(center.x - half, 2.0 * half, image_width);
        let (y, height) = clamp_span(center.y - half, 2.0 * half, image_height);
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

fn clamp_span(start: f64, len: f64, size: usize) -> (usize, usize) {
    let size = size as i64;
    let mut start = start as i64;
    let mut len = len as i64;
    if start + len >= size {
        start -= start + len - size + 1;
    }
    if start < 0 {
        len = (len + start).max(1);
        start = 0;
    }
    len = len.clamp(1, size - start);
    (start as usize, len as usize)
}

/// Working copy of the film near the ball, fixed for one fusion run.
///
/// Holds inverted intensities (`255 - raw`, exposure is bright) and the same
/// pixels mapped through a linear LUT to `0..levels`.
#[derive(Debug, Clone)]
pub struct FilmWindow {
    rect: WindowRect,
    inverted: Buffer2<u8>,
    normalized: Buffer2<u16>,
    lut: Vec<u16>,
    levels: usize,
}

impl FilmWindow {
    /// Crops the window around `center` (film pixels) and builds the LUT.
    ///
    /// Fails with [`FusionError::BlankWindow`] when no pixel in the window is
    /// exposed at all.
    pub fn prepare(
        film: &FilmImage,
        center: DVec2,
        config: &FusionConfig,
    ) -> Result<Self, FusionError> {
        let half = film.dpi() * config.search_radius * config.window_scale / 25.4;
        let rect = WindowRect::around(center, half, film.width(), film.height());

        let inverted = film
            .pixels()
            .crop(rect.x, rect.y, rect.width, rect.height)
            .map(|&raw| 255 - raw);

        let max_inverted = inverted.iter().copied().max().unwrap_or(0);
        if max_inverted == 0 {
            return Err(FusionError::BlankWindow);
        }

        let top = config.levels as u32 - 1;
        let lut: Vec<u16> = (0..256u32)
            .map(|i| (i * top / max_inverted as u32).min(top) as u16)
            .collect();
        let normalized = inverted.map(|&v| lut[v as usize]);

        tracing::debug!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            max_inverted,
            "Film window prepared"
        );

        Ok(Self {
            rect,
            inverted,
            normalized,
            lut,
            levels: config.levels,
        })
    }

    pub fn rect(&self) -> WindowRect {
        self.rect
    }

    /// Film pixel coordinate of the window's top-left pixel.
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.rect.x as f64, self.rect.y as f64)
    }

    /// Converts a film pixel position to window coordinates.
    pub fn to_local(&self, film_position: DVec2) -> DVec2 {
        film_position - self.origin()
    }

    pub fn width(&self) -> usize {
        self.rect.width
    }

    pub fn height(&self) -> usize {
        self.rect.height
    }

    pub fn inverted(&self) -> &Buffer2<u8> {
        &self.inverted
    }

    /// LUT-mapped intensities in `0..levels`.
    pub fn normalized(&self) -> &Buffer2<u16> {
        &self.normalized
    }

    pub fn lut(&self) -> &[u16] {
        &self.lut
    }

    pub fn levels(&self) -> usize {
        self.levels
    }
}
