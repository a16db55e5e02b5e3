//! The registration cost as an optimizer objective.

use super::config::FusionConfig;
use super::progress::FitControls;
use super::window::FilmWindow;
use crate::geometry::BeamGeometry;
use crate::optimizer::Objective;

/// Scores fit-parameter vectors for one prepared film window.
///
/// Each evaluation copies `base`, applies the parameters and scores the
/// result; the window and base geometry are never modified.
pub struct RegistrationObjective<'a> {
    window: &'a FilmWindow,
    base: BeamGeometry,
    config: &'a FusionConfig,
    controls: &'a FitControls,
}

impl<'a> RegistrationObjective<'a> {
    pub fn new(
        window: &'a FilmWindow,
        base: BeamGeometry,
        config: &'a FusionConfig,
        controls: &'a FitControls,
    ) -> Self {
        Self {
            window,
            base,
            config,
            controls,
        }
    }

    pub fn base(&self) -> &BeamGeometry {
        &self.base
    }
}

impl Objective for RegistrationObjective<'_> {
    fn evaluate(&self, params: &[f64]) -> f64 {
        let Ok(candidate) = self.base.with_fit_parameters(params) else {
            return f64::INFINITY;
        };
        if !(candidate.pixel_size > 0.0 && candidate.pixel_size.is_finite()) {
            return f64::INFINITY;
        }
        self.config.measure.cost(self.window, &candidate, self.config)
    }

    fn should_cancel(&self) -> bool {
        self.controls.is_cancelled()
    }

    fn report_progress(&self, fraction: f64, best: &[f64]) {
        self.controls.report(fraction, best);
    }

    fn initial_parameters(&self) -> Option<Vec<f64>> {
        Some(self.base.fit_parameters().to_vec())
    }

    fn initial_step_sizes(&self) -> Option<Vec<f64>> {
        Some(self.config.initial_steps.clone())
    }
}
