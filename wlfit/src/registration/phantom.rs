//! Idealized silhouette of the Winston-Lutz setup.

use glam::DVec2;

use super::config::PhantomConfig;
use crate::geometry::BeamGeometry;

/// Open-field intensity of the synthetic image.
pub const OPEN_FIELD: f64 = 255.0;

/// Classifies beam-frame points (mm, ball at the origin) into synthetic
/// intensities: 0 where the beam is blocked, [`OPEN_FIELD`] in the open
/// field, attenuated behind the ball.
///
/// The field is the intersection of the collimator disk around `CC` and an
/// MLC cross around `Mlc` whose arms are `mlc_half_size` wide and reach
/// `3 * mlc_half_size` from its center.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticPhantom {
    collimator_center: DVec2,
    mlc_center: DVec2,
    collimator_radius_sq: f64,
    ball_radius_sq: f64,
    mlc_half: f64,
    ball_level: f64,
}

impl SyntheticPhantom {
    pub fn new(config: &PhantomConfig, geometry: &BeamGeometry) -> Self {
        Self {
            collimator_center: geometry.collimator_center,
            mlc_center: geometry.mlc_center,
            collimator_radius_sq: config.collimator_radius * config.collimator_radius,
            ball_radius_sq: config.ball_radius * config.ball_radius,
            mlc_half: config.mlc_half_size,
            ball_level: (OPEN_FIELD * config.ball_attenuation).round(),
        }
    }

    #[inline]
    pub fn intensity(&self, p: DVec2) -> f64 {
        if (p - self.collimator_center).length_squared() > self.collimator_radius_sq {
            return 0.0;
        }
        let m = (p - self.mlc_center).abs();
        let arm = 3.0 * self.mlc_half;
        if m.x > arm || m.y > arm || (m.x > self.mlc_half && m.y > self.mlc_half) {
            return 0.0;
        }
        if p.length_squared() < self.ball_radius_sq {
            self.ball_level
        } else {
            OPEN_FIELD
        }
    }

    /// [`intensity`](Self::intensity) quantized to `0..levels`.
    #[inline]
    pub fn level(&self, p: DVec2, levels: usize) -> usize {
        let top = (levels - 1) as f64;
        (self.intensity(p) * top / OPEN_FIELD).round() as usize
    }
}
