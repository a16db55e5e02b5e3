//! Synthetic Winston-Lutz film generator.
//!
//! Renders the same silhouette the registration scores against, through the
//! inverse of its film projection, so a fit on the result should recover
//! the generating geometry.

use common::buffer2::Buffer2;
use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::film::FilmImage;
use crate::geometry::{BeamGeometry, FilmOrientation, pixel_size_from_dpi};
use crate::registration::{OPEN_FIELD, PhantomConfig, SyntheticPhantom};

/// Inverted intensity of unexposed film.
pub const BACKGROUND: f64 = 40.0;
/// Inverted intensity added by the open field.
pub const FIELD_GAIN: f64 = 0.6;
/// Sub-samples per pixel axis.
const SUPERSAMPLE: usize = 3;

/// Configuration for synthetic film generation.
#[derive(Debug, Clone)]
pub struct SyntheticFilmConfig {
    pub width: usize,
    pub height: usize,
    pub dpi: f64,
    /// Geometry the film is rendered with.
    pub truth: BeamGeometry,
    pub phantom: PhantomConfig,
    /// Uniform noise amplitude in raw gray levels.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticFilmConfig {
    fn default() -> Self {
        let dpi = 150.0;
        Self {
            width: 240,
            height: 240,
            dpi,
            truth: BeamGeometry {
                ball_center: DVec2::new(121.3, 118.7),
                film_orientation: FilmOrientation::Up,
                film_correction_angle: 0.0,
                collimator_center: DVec2::new(0.4, -0.3),
                mlc_center: DVec2::new(-0.35, 0.25),
                pixel_size: pixel_size_from_dpi(dpi),
                ..BeamGeometry::default()
            },
            phantom: PhantomConfig::default(),
            noise: 4.0,
            seed: 12345,
        }
    }
}

/// Renders a film scan: raw values are `255 - inverted`, where the inverted
/// (exposure) image is `BACKGROUND + FIELD_GAIN * silhouette` plus noise.
pub fn render_film(config: &SyntheticFilmConfig) -> FilmImage {
    let truth = &config.truth;
    let phantom = SyntheticPhantom::new(&config.phantom, truth);
    let (sin, cos) = truth.rotation_angle().sin_cos();
    let ps = truth.pixel_size;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let pixels = Buffer2::from_fn(config.width, config.height, |px, py| {
        let mut acc = 0.0;
        for sy in 0..SUPERSAMPLE {
            for sx in 0..SUPERSAMPLE {
                let ox = (sx as f64 + 0.5) / SUPERSAMPLE as f64 - 0.5;
                let oy = (sy as f64 + 0.5) / SUPERSAMPLE as f64 - 0.5;
                let dx = (px as f64 + ox - truth.ball_center.x) * ps;
                let dy = (py as f64 + oy - truth.ball_center.y) * ps;
                let p = DVec2::new(cos * dx + sin * dy, sin * dx - cos * dy);
                acc += phantom.intensity(p);
            }
        }
        let silhouette = acc / (SUPERSAMPLE * SUPERSAMPLE) as f64;
        let noise = if config.noise > 0.0 {
            rng.random_range(-config.noise..=config.noise)
        } else {
            0.0
        };
        let inverted = BACKGROUND + FIELD_GAIN * silhouette.min(OPEN_FIELD) + noise;
        (255.0 - inverted).round().clamp(0.0, 255.0) as u8
    });

    match FilmImage::new(pixels, config.dpi) {
        Ok(film) => film,
        Err(e) => panic!("synthetic film is invalid: {e}"),
    }
}

/// Uniform film of raw value `raw`.
pub fn flat_film(width: usize, height: usize, raw: u8, dpi: f64) -> FilmImage {
    match FilmImage::new(Buffer2::new_filled(width, height, raw), dpi) {
        Ok(film) => film,
        Err(e) => panic!("flat film is invalid: {e}"),
    }
}
