//! Derivative-free minimization.
//!
//! [`Simplex`] drives any [`Objective`]; it knows nothing about films or
//! geometry.

mod error;
mod simplex;

#[cfg(test)]
mod tests;

pub use error::SearchError;
pub use simplex::{Simplex, SimplexConfig, SimplexResult, Termination};

/// A scalar cost function together with its starting point.
pub trait Objective {
    /// Cost at `params`. Lower is better; non-finite values count as `+inf`.
    fn evaluate(&self, params: &[f64]) -> f64;

    /// Polled once per iteration; `true` stops the search with the current best.
    fn should_cancel(&self) -> bool {
        false
    }

    /// Advisory progress: fraction of the evaluation budget used and the best
    /// point so far.
    fn report_progress(&self, _fraction: f64, _best: &[f64]) {}

    fn initial_parameters(&self) -> Option<Vec<f64>>;

    fn initial_step_sizes(&self) -> Option<Vec<f64>>;
}
