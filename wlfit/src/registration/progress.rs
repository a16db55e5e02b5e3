//! Progress reporting and cancellation for fusion runs.

use common::SharedFn;

/// Snapshot passed to the progress callback.
#[derive(Debug, Clone, PartialEq)]
pub struct FitProgress {
    /// Fraction of the evaluation budget used, in `[0, 1)`.
    pub fraction: f64,
    /// Best fit parameters so far.
    pub parameters: Vec<f64>,
}

/// Callback type for progress reporting.
pub type ProgressCallback = SharedFn<dyn Fn(FitProgress) + Send + Sync>;

/// Polled once per optimizer iteration; returning `true` stops the search.
pub type CancelPredicate = SharedFn<dyn Fn() -> bool + Send + Sync>;

/// Hooks a caller attaches to a fusion run. Both default to none.
#[derive(Debug, Clone, Default)]
pub struct FitControls {
    pub progress: ProgressCallback,
    pub cancel: CancelPredicate,
}

impl FitControls {
    pub(crate) fn report(&self, fraction: f64, parameters: &[f64]) {
        if let Some(f) = self.progress.get() {
            f(FitProgress {
                fraction,
                parameters: parameters.to_vec(),
            });
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.get().is_some_and(|f| f())
    }
}
