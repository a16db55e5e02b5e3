use std::cell::{Cell, RefCell};

use super::*;

/// Quadratic bowl with minimum at `center`, counting calls.
struct Bowl {
    center: Vec<f64>,
    start: Option<Vec<f64>>,
    steps: Option<Vec<f64>>,
    calls: Cell<usize>,
    cancel_after: Option<usize>,
    progress: RefCell<Vec<f64>>,
}

impl Bowl {
    fn new(center: &[f64], start: &[f64], steps: &[f64]) -> Self {
        Self {
            center: center.to_vec(),
            start: Some(start.to_vec()),
            steps: Some(steps.to_vec()),
            calls: Cell::new(0),
            cancel_after: None,
            progress: RefCell::new(Vec::new()),
        }
    }
}

impl Objective for Bowl {
    fn evaluate(&self, params: &[f64]) -> f64 {
        self.calls.set(self.calls.get() + 1);
        params
            .iter()
            .zip(&self.center)
            .map(|(p, c)| (p - c) * (p - c))
            .sum()
    }

    fn should_cancel(&self) -> bool {
        self.cancel_after.is_some_and(|n| self.calls.get() >= n)
    }

    fn report_progress(&self, fraction: f64, _best: &[f64]) {
        self.progress.borrow_mut().push(fraction);
    }

    fn initial_parameters(&self) -> Option<Vec<f64>> {
        self.start.clone()
    }

    fn initial_step_sizes(&self) -> Option<Vec<f64>> {
        self.steps.clone()
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

// ---------------------------------------------------------------------------
// Convergence
// ---------------------------------------------------------------------------

#[test]
fn test_converges_on_shifted_quadratic() {
    let bowl = Bowl::new(&[3.0, -2.0], &[0.0, 0.0], &[1.0, 1.0]);
    let simplex = Simplex::new(SimplexConfig {
        ftol: 1e-10,
        ..SimplexConfig::default()
    });

    let result = simplex.search(&bowl).unwrap();

    assert_eq!(result.termination, Termination::Converged);
    assert!(
        distance(&result.parameters, &[3.0, -2.0]) < 1e-4,
        "minimum at {:?}",
        result.parameters
    );
    assert!(result.evaluations < 1000, "took {} evaluations", result.evaluations);
    assert_eq!(result.evaluations, bowl.calls.get());
}

#[test]
fn test_result_is_best_vertex() {
    let bowl = Bowl::new(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0], &[0.5, 0.5, 0.5]);
    let result = Simplex::new(SimplexConfig {
        ftol: 1e-8,
        ..SimplexConfig::default()
    })
    .search(&bowl)
    .unwrap();

    assert_eq!(result.cost, bowl.evaluate(&result.parameters));
    assert!(result.cost < bowl.evaluate(&[0.0, 0.0, 0.0]));
}

#[test]
fn test_one_dimensional_search() {
    let bowl = Bowl::new(&[-4.0], &[1.0], &[0.25]);
    let result = Simplex::new(SimplexConfig {
        ftol: 1e-12,
        ..SimplexConfig::default()
    })
    .search(&bowl)
    .unwrap();
    assert!((result.parameters[0] + 4.0).abs() < 1e-4);
}

#[test]
fn test_loose_default_tolerance_stops_early() {
    // Default ftol = 1.0 accepts a simplex whose costs are within a factor of ~3.
    let bowl = Bowl::new(&[3.0, -2.0], &[0.0, 0.0], &[1.0, 1.0]);
    let result = Simplex::default().search(&bowl).unwrap();
    assert_eq!(result.termination, Termination::Converged);
    assert!(result.evaluations < 100);
}

/// Cost is undefined left of zero.
struct HalfLine;

impl Objective for HalfLine {
    fn evaluate(&self, params: &[f64]) -> f64 {
        let x = params[0];
        if x < 0.0 { f64::NAN } else { (x - 0.5).powi(2) + 1.0 }
    }

    fn initial_parameters(&self) -> Option<Vec<f64>> {
        Some(vec![0.2])
    }

    fn initial_step_sizes(&self) -> Option<Vec<f64>> {
        Some(vec![0.5])
    }
}

#[test]
fn test_non_finite_cost_is_treated_as_worst() {
    let result = Simplex::new(SimplexConfig {
        ftol: 1e-12,
        ..SimplexConfig::default()
    })
    .search(&HalfLine)
    .unwrap();
    assert!(result.cost.is_finite());
    assert!((result.parameters[0] - 0.5).abs() < 1e-3);
}

// ---------------------------------------------------------------------------
// Stopping rules
// ---------------------------------------------------------------------------

#[test]
fn test_cancellation_returns_best_so_far() {
    let mut bowl = Bowl::new(&[3.0, -2.0], &[0.0, 0.0], &[1.0, 1.0]);
    bowl.cancel_after = Some(10);
    let start_cost = bowl.evaluate(&[0.0, 0.0]);
    bowl.calls.set(0);

    let result = Simplex::new(SimplexConfig {
        ftol: 1e-12,
        ..SimplexConfig::default()
    })
    .search(&bowl)
    .unwrap();

    assert_eq!(result.termination, Termination::Cancelled);
    assert!(result.parameters.iter().all(|p| p.is_finite()));
    assert!(result.cost <= start_cost);
    // Polled once per iteration; an iteration costs at most 2 + N calls.
    assert!(bowl.calls.get() < 10 + 4);
}

#[test]
fn test_evaluation_budget_is_a_ceiling() {
    let bowl = Bowl::new(&[3.0, -2.0], &[0.0, 0.0], &[1.0, 1.0]);
    let config = SimplexConfig {
        ftol: 1e-15,
        max_evaluations: 5,
        progress_step: 100,
    };

    let result = Simplex::new(config).search(&bowl).unwrap();

    let ndim = 2;
    assert_eq!(result.termination, Termination::BudgetExhausted);
    // Initial vertices, the budget, and at most one overshooting iteration.
    assert!(bowl.calls.get() <= (ndim + 1) + 5 + (ndim + 1));
    assert!(bowl.calls.get() > ndim + 1);
}

#[test]
fn test_progress_reported_from_first_iteration() {
    let bowl = Bowl::new(&[3.0, -2.0], &[0.0, 0.0], &[1.0, 1.0]);
    let config = SimplexConfig {
        ftol: 1e-10,
        max_evaluations: 200,
        progress_step: 1,
    };
    Simplex::new(config).search(&bowl).unwrap();

    let progress = bowl.progress.borrow();
    assert_eq!(progress.first(), Some(&0.0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(progress.iter().all(|&f| (0.0..1.0).contains(&f)));
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[test]
fn test_missing_start_point() {
    let mut bowl = Bowl::new(&[0.0], &[0.0], &[1.0]);
    bowl.start = None;
    assert_eq!(
        Simplex::default().search(&bowl),
        Err(SearchError::MissingStartPoint)
    );
    assert_eq!(bowl.calls.get(), 0);
}

#[test]
fn test_missing_step_sizes() {
    let mut bowl = Bowl::new(&[0.0], &[0.0], &[1.0]);
    bowl.steps = None;
    assert_eq!(
        Simplex::default().search(&bowl),
        Err(SearchError::MissingStepSizes)
    );
}

#[test]
fn test_dimension_mismatch() {
    let bowl = Bowl::new(&[0.0, 0.0], &[0.0, 0.0], &[1.0, 1.0, 1.0]);
    assert_eq!(
        Simplex::default().search(&bowl),
        Err(SearchError::DimensionMismatch {
            parameters: 2,
            steps: 3
        })
    );
    assert_eq!(bowl.calls.get(), 0);
}

#[test]
fn test_empty_parameter_vector() {
    let bowl = Bowl::new(&[], &[], &[]);
    assert_eq!(
        Simplex::default().search(&bowl),
        Err(SearchError::EmptyParameterVector)
    );
}

#[test]
fn test_invalid_config_is_rejected_before_evaluating() {
    let bowl = Bowl::new(&[3.0, -2.0], &[0.0, 0.0], &[1.0, 1.0]);
    for config in [
        SimplexConfig {
            max_evaluations: 0,
            ..SimplexConfig::default()
        },
        SimplexConfig {
            ftol: 0.0,
            ..SimplexConfig::default()
        },
        SimplexConfig {
            ftol: f64::NAN,
            ..SimplexConfig::default()
        },
        SimplexConfig {
            progress_step: 0,
            ..SimplexConfig::default()
        },
    ] {
        let result = Simplex::new(config).search(&bowl);
        assert!(
            matches!(result, Err(SearchError::Config(_))),
            "{config:?} gave {result:?}"
        );
    }
    assert_eq!(bowl.calls.get(), 0);
}
