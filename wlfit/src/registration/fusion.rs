//! Fusion: fits the beam geometry to a scanned film.

use serde::{Deserialize, Serialize};

use super::FusionError;
use super::centroid::refine_ball_center;
use super::config::FusionConfig;
use super::objective::RegistrationObjective;
use super::progress::FitControls;
use super::window::FilmWindow;
use crate::film::FilmImage;
use crate::geometry::BeamGeometry;
use crate::optimizer::{Simplex, Termination};

/// Result of a successful fusion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionOutcome {
    /// Refined geometry: ball center from centroiding, fit fields from the search.
    pub geometry: BeamGeometry,
    /// Cost at `geometry` (reciprocal similarity).
    pub cost: f64,
    pub evaluations: usize,
    pub termination: Termination,
}

/// Aligns the beam model to `film`, starting from `initial`.
///
/// Stages: crop and normalize the film window around the initial ball
/// center, refine the ball center by centroiding, then minimize the
/// configured similarity cost over the fit parameters. `initial` is only
/// read; the refined copy is returned. Cancellation through `controls`
/// ends the search early and still yields the best geometry found.
/// An invalid `config` is rejected before the film is touched.
pub fn fuse(
    film: &FilmImage,
    initial: &BeamGeometry,
    config: &FusionConfig,
    controls: &FitControls,
) -> Result<FusionOutcome, FusionError> {
    config.validate()?;
    if !(initial.pixel_size > 0.0 && initial.pixel_size.is_finite()) {
        return Err(FusionError::InvalidPixelSize(initial.pixel_size));
    }

    let window = FilmWindow::prepare(film, initial.ball_center, config)?;
    tracing::info!(
        width = window.width(),
        height = window.height(),
        "Fusion: window prepared"
    );

    let mut geometry = *initial;
    for iteration in 0..config.centroid_iterations {
        geometry = refine_ball_center(
            &window,
            geometry,
            config.centroid_radius,
            config.noise_floor,
            iteration,
        )?;
    }
    tracing::info!(
        x = geometry.ball_center.x,
        y = geometry.ball_center.y,
        "Fusion: ball centroid refined"
    );

    let objective = RegistrationObjective::new(&window, geometry, config, controls);
    tracing::info!(
        measure = ?config.measure,
        max_evaluations = config.simplex.max_evaluations,
        "Fusion: searching"
    );

    let result = Simplex::new(config.simplex).search(&objective)?;
    if !result.cost.is_finite() {
        tracing::warn!(evaluations = result.evaluations, "Fusion: degenerate score");
        return Err(FusionError::DegenerateScore);
    }

    let geometry = geometry.with_fit_parameters(&result.parameters)?;
    match result.termination {
        Termination::Cancelled => tracing::warn!(
            evaluations = result.evaluations,
            cost = result.cost,
            "Fusion: cancelled"
        ),
        termination => tracing::info!(
            evaluations = result.evaluations,
            cost = result.cost,
            ?termination,
            "Fusion: done"
        ),
    }

    Ok(FusionOutcome {
        geometry,
        cost: result.cost,
        evaluations: result.evaluations,
        termination: result.termination,
    })
}
