//! Nelder-Mead downhill simplex.

use serde::{Deserialize, Serialize};

use super::{Objective, SearchError};
use crate::error::{ConfigError, ensure};

const TINY: f64 = 1e-10;

/// Stopping and reporting parameters for [`Simplex`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplexConfig {
    /// Fractional tolerance on the spread between the best and worst vertex.
    pub ftol: f64,
    /// Evaluation budget, not counting the initial vertices.
    pub max_evaluations: usize,
    /// Report progress whenever the evaluation counter is a multiple of this.
    pub progress_step: usize,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            ftol: 1.0,
            max_evaluations: 5000,
            progress_step: 100,
        }
    }
}

impl SimplexConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.ftol > 0.0 && self.ftol.is_finite(),
            "simplex.ftol",
            "positive and finite",
            self.ftol,
        )?;
        ensure(
            self.max_evaluations > 0,
            "simplex.max_evaluations",
            "positive",
            self.max_evaluations as f64,
        )?;
        ensure(
            self.progress_step > 0,
            "simplex.progress_step",
            "positive",
            self.progress_step as f64,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Spread between best and worst vertex fell below `ftol`.
    Converged,
    /// Evaluation counter reached `max_evaluations`.
    BudgetExhausted,
    /// The objective asked to stop.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimplexResult {
    /// Best vertex found.
    pub parameters: Vec<f64>,
    pub cost: f64,
    /// Objective calls, initial vertices included.
    pub evaluations: usize,
    pub termination: Termination,
}

/// Downhill simplex minimizer.
#[derive(Debug, Clone, Default)]
pub struct Simplex {
    config: SimplexConfig,
}

impl Simplex {
    pub fn new(config: SimplexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimplexConfig {
        &self.config
    }

    /// Minimizes `objective` starting from its initial point and steps.
    ///
    /// Vertex 0 is the start point, vertex `k` moves dimension `k - 1` by its
    /// step. Cancellation is not an error: the best vertex so far is returned.
    pub fn search<O: Objective + ?Sized>(&self, objective: &O) -> Result<SimplexResult, SearchError> {
        self.config.validate()?;
        let start = objective
            .initial_parameters()
            .ok_or(SearchError::MissingStartPoint)?;
        let steps = objective
            .initial_step_sizes()
            .ok_or(SearchError::MissingStepSizes)?;
        if start.is_empty() {
            return Err(SearchError::EmptyParameterVector);
        }
        if steps.len() != start.len() {
            return Err(SearchError::DimensionMismatch {
                parameters: start.len(),
                steps: steps.len(),
            });
        }

        let ndim = start.len();
        let mut vertices: Vec<Vec<f64>> = Vec::with_capacity(ndim + 1);
        vertices.push(start.clone());
        for (k, step) in steps.iter().enumerate() {
            let mut v = start.clone();
            v[k] += step;
            vertices.push(v);
        }
        let costs: Vec<f64> = vertices.iter().map(|v| cost_of(objective, v)).collect();

        let mut state = SimplexState::new(vertices, costs);
        let termination = self.run(objective, &mut state);

        tracing::debug!(
            evaluations = state.counter + ndim + 1,
            cost = state.costs[0],
            ?termination,
            "Simplex search finished"
        );

        Ok(SimplexResult {
            parameters: state.vertices.swap_remove(0),
            cost: state.costs[0],
            evaluations: state.counter + ndim + 1,
            termination,
        })
    }

    fn run<O: Objective + ?Sized>(&self, objective: &O, state: &mut SimplexState) -> Termination {
        let ndim = state.psum.len();
        loop {
            let (ilo, ihi, inhi) = state.rank();
            let (ylo, yhi) = (state.costs[ilo], state.costs[ihi]);
            // Two infinite costs give NaN here, which never converges.
            let rtol = 2.0 * (yhi - ylo).abs() / (yhi.abs() + ylo.abs() + TINY);

            let termination = if rtol < self.config.ftol {
                Some(Termination::Converged)
            } else if state.counter >= self.config.max_evaluations {
                Some(Termination::BudgetExhausted)
            } else if objective.should_cancel() {
                Some(Termination::Cancelled)
            } else {
                None
            };
            if let Some(termination) = termination {
                state.vertices.swap(0, ilo);
                state.costs.swap(0, ilo);
                return termination;
            }

            if state.counter % self.config.progress_step == 0 {
                objective.report_progress(
                    state.counter as f64 / self.config.max_evaluations as f64,
                    &state.vertices[ilo],
                );
            }

            state.counter += 2;

            let ytry = state.try_move(objective, ihi, -1.0);
            if ytry <= state.costs[ilo] {
                state.try_move(objective, ihi, 2.0);
            } else if ytry >= state.costs[inhi] {
                let ysave = state.costs[ihi];
                let ytry = state.try_move(objective, ihi, 0.5);
                if ytry >= ysave {
                    state.shrink_towards(objective, ilo);
                    state.counter += ndim;
                }
            } else {
                state.counter -= 1;
            }
        }
    }
}

fn cost_of<O: Objective + ?Sized>(objective: &O, params: &[f64]) -> f64 {
    let cost = objective.evaluate(params);
    if cost.is_finite() { cost } else { f64::INFINITY }
}

struct SimplexState {
    vertices: Vec<Vec<f64>>,
    costs: Vec<f64>,
    /// Per-dimension sum over all vertices.
    psum: Vec<f64>,
    /// Evaluations since the initial simplex was built.
    counter: usize,
}

impl SimplexState {
    fn new(vertices: Vec<Vec<f64>>, costs: Vec<f64>) -> Self {
        let mut state = Self {
            psum: vec![0.0; vertices[0].len()],
            vertices,
            costs,
            counter: 0,
        };
        state.recompute_psum();
        state
    }

    fn recompute_psum(&mut self) {
        for (j, sum) in self.psum.iter_mut().enumerate() {
            *sum = self.vertices.iter().map(|v| v[j]).sum();
        }
    }

    /// Indices of the best, worst and second-worst vertex.
    fn rank(&self) -> (usize, usize, usize) {
        let y = &self.costs;
        let mut ilo = 0;
        let (mut ihi, mut inhi) = if y[0] > y[1] { (0, 1) } else { (1, 0) };
        for i in 0..y.len() {
            if y[i] <= y[ilo] {
                ilo = i;
            }
            if y[i] > y[ihi] {
                inhi = ihi;
                ihi = i;
            } else if y[i] > y[inhi] && i != ihi {
                inhi = i;
            }
        }
        (ilo, ihi, inhi)
    }

    /// Extrapolates the worst vertex by `factor` through the opposite face and
    /// keeps the trial point if it improves on the worst.
    fn try_move<O: Objective + ?Sized>(&mut self, objective: &O, ihi: usize, factor: f64) -> f64 {
        let ndim = self.psum.len() as f64;
        let fac1 = (1.0 - factor) / ndim;
        let fac2 = fac1 - factor;
        let trial: Vec<f64> = self
            .psum
            .iter()
            .zip(&self.vertices[ihi])
            .map(|(&sum, &worst)| sum * fac1 - worst * fac2)
            .collect();

        let ytry = cost_of(objective, &trial);
        if ytry < self.costs[ihi] {
            self.costs[ihi] = ytry;
            for ((sum, old), new) in self.psum.iter_mut().zip(&self.vertices[ihi]).zip(&trial) {
                *sum += new - old;
            }
            self.vertices[ihi] = trial;
        }
        ytry
    }

    /// Moves every vertex except `ilo` halfway towards it.
    fn shrink_towards<O: Objective + ?Sized>(&mut self, objective: &O, ilo: usize) {
        let best = self.vertices[ilo].clone();
        for i in 0..self.vertices.len() {
            if i == ilo {
                continue;
            }
            for (p, b) in self.vertices[i].iter_mut().zip(&best) {
                *p = 0.5 * (*p + b);
            }
            self.costs[i] = cost_of(objective, &self.vertices[i]);
        }
        self.recompute_psum();
    }
}
