//! Configuration for film fusion.
//!
//! Lengths are millimetres. Defaults reproduce the standard Winston-Lutz
//! phantom: 12.5 mm cone, 5 mm ball, 6 mm MLC cross.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, ensure};
use crate::optimizer::SimplexConfig;

// =============================================================================
// Phantom
// =============================================================================

/// Dimensions of the idealized device silhouette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhantomConfig {
    /// Conical collimator field radius.
    pub collimator_radius: f64,
    /// Fiducial ball radius.
    pub ball_radius: f64,
    /// Half width of the MLC square; the cross arms extend to three times this.
    pub mlc_half_size: f64,
    /// Fraction of the open-field intensity left behind the ball.
    pub ball_attenuation: f64,
}

impl Default for PhantomConfig {
    fn default() -> Self {
        Self {
            collimator_radius: 6.25,
            ball_radius: 2.5,
            mlc_half_size: 3.0,
            ball_attenuation: 0.8,
        }
    }
}

impl PhantomConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            is_positive(self.collimator_radius),
            "phantom.collimator_radius",
            "positive",
            self.collimator_radius,
        )?;
        ensure(
            is_positive(self.ball_radius),
            "phantom.ball_radius",
            "positive",
            self.ball_radius,
        )?;
        ensure(
            is_positive(self.mlc_half_size),
            "phantom.mlc_half_size",
            "positive",
            self.mlc_half_size,
        )?;
        ensure(
            self.ball_attenuation > 0.0 && self.ball_attenuation <= 1.0,
            "phantom.ball_attenuation",
            "in (0, 1]",
            self.ball_attenuation,
        )
    }
}

// =============================================================================
// Similarity measure
// =============================================================================

/// How agreement between the synthetic silhouette and the film is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    /// Mutual information of the joint intensity histogram.
    #[default]
    MutualInformation,
    /// Normalized cross-correlation of synthetic and film intensities.
    NormalizedCrossCorrelation,
    /// Pattern intensity of the difference image.
    PatternIntensity,
}

// =============================================================================
// Fusion
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Radius of the scored disk around the ball.
    pub search_radius: f64,
    /// Film window half-size as a multiple of `search_radius`.
    pub window_scale: f64,
    /// Number of normalized film intensity levels (joint histogram side).
    pub levels: usize,

    /// Radius around the ball used for centroid refinement.
    pub centroid_radius: f64,
    /// Inverted intensities at or below this are ignored when thresholding.
    pub noise_floor: u8,
    /// Centroid refinement passes before the search.
    pub centroid_iterations: usize,

    pub phantom: PhantomConfig,
    /// Spacing of the virtual grid the silhouette is sampled on.
    pub virtual_pixel_size: f64,

    /// Initial simplex steps for `[CC.x, CC.y, Mlc.x, Mlc.y, PS, FCA]`.
    pub initial_steps: Vec<f64>,
    pub measure: SimilarityMeasure,
    /// Missing fields take the fusion search defaults, not [`SimplexConfig::default`].
    #[serde(deserialize_with = "deserialize_search")]
    pub simplex: SimplexConfig,
}

fn default_search() -> SimplexConfig {
    SimplexConfig {
        ftol: 1e-12,
        max_evaluations: 1000,
        progress_step: 100,
    }
}

fn deserialize_search<'de, D>(deserializer: D) -> Result<SimplexConfig, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Overrides {
        ftol: Option<f64>,
        max_evaluations: Option<usize>,
        progress_step: Option<usize>,
    }

    let overrides = Overrides::deserialize(deserializer)?;
    let base = default_search();
    Ok(SimplexConfig {
        ftol: overrides.ftol.unwrap_or(base.ftol),
        max_evaluations: overrides.max_evaluations.unwrap_or(base.max_evaluations),
        progress_step: overrides.progress_step.unwrap_or(base.progress_step),
    })
}

fn is_positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            search_radius: 9.0,
            window_scale: 2.0,
            levels: 256,
            centroid_radius: 3.5,
            noise_floor: 64,
            centroid_iterations: 3,
            phantom: PhantomConfig::default(),
            virtual_pixel_size: 0.05,
            initial_steps: vec![0.5, 0.5, 0.5, 0.5, 0.005, 1.0],
            measure: SimilarityMeasure::default(),
            simplex: default_search(),
        }
    }
}

impl FusionConfig {
    /// Checks every field; the first offending one is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            is_positive(self.search_radius),
            "search_radius",
            "positive and finite",
            self.search_radius,
        )?;
        ensure(
            is_positive(self.window_scale),
            "window_scale",
            "positive and finite",
            self.window_scale,
        )?;
        ensure(
            (2..=256).contains(&self.levels),
            "levels",
            "between 2 and 256",
            self.levels as f64,
        )?;
        ensure(
            is_positive(self.centroid_radius),
            "centroid_radius",
            "positive and finite",
            self.centroid_radius,
        )?;
        ensure(
            self.virtual_pixel_size > 0.0 && self.virtual_pixel_size < self.search_radius,
            "virtual_pixel_size",
            "in (0, search_radius)",
            self.virtual_pixel_size,
        )?;
        for &step in &self.initial_steps {
            ensure(step.is_finite(), "initial_steps", "finite", step)?;
        }
        self.phantom.validate()?;
        self.simplex.validate()
    }

    /// Radius of the virtual grid in grid cells.
    pub fn grid_radius(&self) -> i32 {
        (self.search_radius / self.virtual_pixel_size) as i32
    }
}
