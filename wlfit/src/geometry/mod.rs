//! Beam geometry model: the parameter record a fit refines.
//!
//! Lengths are millimetres in the beam frame, the ball center is in film
//! pixel coordinates and angles are degrees.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};


/// Number of geometry fields the optimizer varies.
pub const FIT_PARAMETER_COUNT: usize = 6;

/// Pixel size in mm for a scan resolution in dots per inch.
///
/// The 1.08 factor is the film magnification at the isocenter plane.
pub fn pixel_size_from_dpi(dpi: f64) -> f64 {
    25.4 / dpi * 1.08
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Expected {expected} fit parameters, got {actual}")]
    FitParameterCount { expected: usize, actual: usize },
}

/// Quadrant orientation of the gantry head relative to the scanned image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilmOrientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl FilmOrientation {
    pub fn degrees(self) -> f64 {
        match self {
            FilmOrientation::Up => 0.0,
            FilmOrientation::Right => 90.0,
            FilmOrientation::Down => 180.0,
            FilmOrientation::Left => 270.0,
        }
    }
}

/// Geometry of one Winston-Lutz exposure.
///
/// Only the six fields packed by [`fit_parameters`](Self::fit_parameters)
/// change during a fit; the angles, orientation and ball center stay fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamGeometry {
    pub gantry_angle: f64,
    pub collimator_angle: f64,
    pub table_angle: f64,
    /// Fiducial ball center in film pixels.
    pub ball_center: DVec2,
    pub film_orientation: FilmOrientation,
    /// Fine rotation on top of the orientation quadrant, degrees.
    pub film_correction_angle: f64,
    /// Conical collimator field center relative to the ball, mm.
    pub collimator_center: DVec2,
    /// MLC field center relative to the ball, mm.
    pub mlc_center: DVec2,
    /// Film pixel size, mm per pixel.
    pub pixel_size: f64,
}

impl Default for BeamGeometry {
    fn default() -> Self {
        Self {
            gantry_angle: 0.0,
            collimator_angle: 0.0,
            table_angle: 0.0,
            ball_center: DVec2::ZERO,
            film_orientation: FilmOrientation::Up,
            film_correction_angle: 0.0,
            collimator_center: DVec2::ZERO,
            mlc_center: DVec2::ZERO,
            pixel_size: pixel_size_from_dpi(150.0),
        }
    }
}

impl BeamGeometry {
    /// Initial guess for a film scanned at `dpi` with the ball near `ball_center`.
    pub fn new(ball_center: DVec2, film_orientation: FilmOrientation, dpi: f64) -> Self {
        Self {
            ball_center,
            film_orientation,
            pixel_size: pixel_size_from_dpi(dpi),
            ..Self::default()
        }
    }

    /// `[CC.x, CC.y, Mlc.x, Mlc.y, PS, FCA]`.
    pub fn fit_parameters(&self) -> [f64; FIT_PARAMETER_COUNT] {
        [
            self.collimator_center.x,
            self.collimator_center.y,
            self.mlc_center.x,
            self.mlc_center.y,
            self.pixel_size,
            self.film_correction_angle,
        ]
    }

    /// Inverse of [`fit_parameters`](Self::fit_parameters).
    pub fn set_fit_parameters(&mut self, params: &[f64]) -> Result<(), GeometryError> {
        let &[ccx, ccy, mx, my, ps, fca] = params else {
            return Err(GeometryError::FitParameterCount {
                expected: FIT_PARAMETER_COUNT,
                actual: params.len(),
            });
        };
        self.collimator_center = DVec2::new(ccx, ccy);
        self.mlc_center = DVec2::new(mx, my);
        self.pixel_size = ps;
        self.film_correction_angle = fca;
        Ok(())
    }

    pub fn with_fit_parameters(mut self, params: &[f64]) -> Result<Self, GeometryError> {
        self.set_fit_parameters(params)?;
        Ok(self)
    }

    /// Total image rotation `FA + FCA` in radians.
    pub fn rotation_angle(&self) -> f64 {
        (self.film_orientation.degrees() + self.film_correction_angle).to_radians()
    }

    /// Maps a point given relative to the MLC center into the beam frame.
    pub fn mlc_to_beam(&self, p: DVec2) -> DVec2 {
        self.rotate(self.mlc_center + p)
    }

    /// Maps a point given relative to the collimator center into the beam frame.
    pub fn collimator_to_beam(&self, p: DVec2) -> DVec2 {
        self.rotate(self.collimator_center + p)
    }

    fn rotate(&self, p: DVec2) -> DVec2 {
        let (s, c) = self.rotation_angle().sin_cos();
        DVec2::new(p.x * c + p.y * s, -p.x * s + p.y * c)
    }
}

impl fmt::Display for BeamGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "G={:.1} C={:.1} T={:.1} O=({:.2}, {:.2})px CC=({:.3}, {:.3})mm MLC=({:.3}, {:.3})mm PS={:.5}mm FA={} FCA={:.3}",
            self.gantry_angle,
            self.collimator_angle,
            self.table_angle,
            self.ball_center.x,
            self.ball_center.y,
            self.collimator_center.x,
            self.collimator_center.y,
            self.mlc_center.x,
            self.mlc_center.y,
            self.pixel_size,
            self.film_orientation.degrees(),
            self.film_correction_angle,
        )
    }
}
