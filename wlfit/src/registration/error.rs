use thiserror::Error;

use crate::error::ConfigError;
use crate::geometry::GeometryError;
use crate::optimizer::SearchError;

/// Reasons a fusion run produced no geometry.
#[derive(Debug, Error, PartialEq)]
pub enum FusionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Film window around the ball is blank (no exposed pixels)")]
    BlankWindow,

    #[error("No ball pixels found during centroid refinement pass {iteration}")]
    CentroidNotFound { iteration: usize },

    #[error("Pixel size must be positive and finite, got {0} mm")]
    InvalidPixelSize(f64),

    #[error("Optimizer setup failed: {0}")]
    Search(#[from] SearchError),

    #[error("Invalid fit result: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Similarity score is degenerate at the best point found")]
    DegenerateScore,
}
