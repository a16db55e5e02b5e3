//! wlfit - automatic Winston-Lutz film alignment.
//!
//! Fits a parametric model of the collimator, MLC and isocenter ball to a
//! scanned radiographic film:
//! - Film window preparation and intensity normalization
//! - Ball centroid refinement
//! - Mutual-information (or NCC / pattern intensity) registration cost
//! - Nelder-Mead simplex search over the fit parameters
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wlfit::{BeamGeometry, FilmImage, FilmOrientation, FitControls, FusionConfig, fuse};
//!
//! let image = image::open("wl_g0_c0.png")?;
//! let film = FilmImage::from_dynamic_image(&image, 150.0)?;
//! let initial = BeamGeometry::new(glam::DVec2::new(412.0, 388.0), FilmOrientation::Up, film.dpi());
//!
//! let outcome = fuse(&film, &initial, &FusionConfig::default(), &FitControls::default())?;
//! println!("{}", outcome.geometry);
//! ```

pub mod error;
pub mod film;
pub mod geometry;
pub mod math;
pub mod optimizer;
pub mod registration;

#[cfg(test)]
pub mod testing;

// ============================================================================
// Film and geometry
// ============================================================================

pub use error::ConfigError;
pub use film::{FilmError, FilmImage};
pub use geometry::{
    BeamGeometry, FIT_PARAMETER_COUNT, FilmOrientation, GeometryError, pixel_size_from_dpi,
};

// ============================================================================
// Statistics
// ============================================================================

pub use math::{Distribution, WeightedSample};

// ============================================================================
// Optimizer
// ============================================================================

pub use optimizer::{Objective, SearchError, Simplex, SimplexConfig, SimplexResult, Termination};

// ============================================================================
// Registration
// ============================================================================

pub use registration::{
    CancelPredicate, FilmWindow, FitControls, FitProgress, FusionConfig, FusionError,
    FusionOutcome, JointHistogram, PhantomConfig, ProgressCallback, RegistrationObjective,
    SimilarityMeasure, SyntheticPhantom, WindowRect, fuse,
};
