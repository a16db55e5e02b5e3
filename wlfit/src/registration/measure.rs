//! Similarity scores between the synthetic silhouette and the film window.
//!
//! All scorers sample the silhouette on a virtual square grid centered on the
//! ball, map each grid point into the window through the candidate geometry
//! and read the film with bilinear weights. Costs are reciprocals of the
//! scores, `+inf` when the score is degenerate.

use common::buffer2::Buffer2;
use glam::DVec2;
use rayon::prelude::*;

use super::config::{FusionConfig, SimilarityMeasure};
use super::joint_histogram::JointHistogram;
use super::phantom::{OPEN_FIELD, SyntheticPhantom};
use super::window::FilmWindow;
use crate::geometry::BeamGeometry;

/// Pattern intensity neighbourhood radius, grid cells.
const PATTERN_RADIUS: i32 = 3;
/// Pattern intensity sigma squared, intensity units.
const PATTERN_SIGMA_SQ: f64 = 100.0;
/// Grid rows handed to one rayon task; bounds the number of partial histograms.
const MIN_ROWS_PER_TASK: usize = 16;

impl SimilarityMeasure {
    /// Cost of `geometry` against `window`; lower is better.
    pub fn cost(self, window: &FilmWindow, geometry: &BeamGeometry, config: &FusionConfig) -> f64 {
        let score = match self {
            SimilarityMeasure::MutualInformation => {
                mutual_information(window, geometry, config).unwrap_or(0.0)
            }
            SimilarityMeasure::NormalizedCrossCorrelation => {
                normalized_cross_correlation(window, geometry, config).unwrap_or(0.0)
            }
            SimilarityMeasure::PatternIntensity => {
                pattern_intensity(window, geometry, config).unwrap_or(0.0)
            }
        };
        if score > 0.0 && score.is_finite() {
            1.0 / score
        } else {
            f64::INFINITY
        }
    }
}

// =============================================================================
// Grid and projection
// =============================================================================

/// Disk of grid points `(i, k)` with `i^2 + k^2 <= radius^2`, spaced `pitch` mm.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VirtualGrid {
    pub radius: i32,
    pub pitch: f64,
}

impl VirtualGrid {
    pub fn from_config(config: &FusionConfig) -> Self {
        Self {
            radius: config.grid_radius(),
            pitch: config.virtual_pixel_size,
        }
    }

    /// Side of the bounding square in cells.
    pub fn side(&self) -> usize {
        (2 * self.radius + 1) as usize
    }

    /// Columns `i` of row `k` inside the disk.
    #[inline]
    pub fn row_span(&self, k: i32) -> std::ops::RangeInclusive<i32> {
        let r2 = self.radius * self.radius;
        let half = ((r2 - k * k).max(0) as f64).sqrt() as i32;
        // Integer sqrt may land one off; tighten to the exact disk.
        let half = if half * half + k * k > r2 { half - 1 } else { half };
        -half..=half
    }

    #[inline]
    pub fn point(&self, i: i32, k: i32) -> DVec2 {
        DVec2::new(i as f64 * self.pitch, k as f64 * self.pitch)
    }
}

/// Beam-frame to window-pixel mapping for one candidate geometry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Projection {
    cos: f64,
    sin: f64,
    inv_pixel_size: f64,
    ball: DVec2,
    width: usize,
    height: usize,
}

impl Projection {
    pub fn new(window: &FilmWindow, geometry: &BeamGeometry) -> Self {
        let (sin, cos) = geometry.rotation_angle().sin_cos();
        Self {
            cos,
            sin,
            inv_pixel_size: 1.0 / geometry.pixel_size,
            ball: window.to_local(geometry.ball_center),
            width: window.width(),
            height: window.height(),
        }
    }

    /// Window pixel position of beam-frame point `p`. Film rows grow downwards.
    #[inline]
    pub fn to_window(&self, p: DVec2) -> DVec2 {
        DVec2::new(
            self.ball.x + (p.x * self.cos + p.y * self.sin) * self.inv_pixel_size,
            self.ball.y + (p.x * self.sin - p.y * self.cos) * self.inv_pixel_size,
        )
    }

    /// Buffer indices and bilinear weights of the 2x2 pixels around `q`, or
    /// `None` when that neighbourhood leaves the window.
    #[inline]
    pub fn neighbours(&self, q: DVec2) -> Option<[(usize, f64); 4]> {
        let fx = q.x.floor();
        let fy = q.y.floor();
        // Bounds are checked in floating point; casting inf or NaN saturates.
        let inside = fx >= 0.0
            && fy >= 0.0
            && fx < self.width as f64 - 1.0
            && fy < self.height as f64 - 1.0;
        if !inside {
            return None;
        }
        let (ix, iy) = (fx as usize, fy as usize);
        let (wx, wy) = (q.x - fx, q.y - fy);
        let i00 = iy * self.width + ix;
        Some([
            (i00, (1.0 - wx) * (1.0 - wy)),
            (i00 + 1, wx * (1.0 - wy)),
            (i00 + self.width, (1.0 - wx) * wy),
            (i00 + self.width + 1, wx * wy),
        ])
    }
}

/// Bilinearly interpolated film level at `q`, scaled to synthetic units.
#[inline]
fn film_intensity(window: &FilmWindow, projection: &Projection, q: DVec2) -> Option<f64> {
    let pixels = window.normalized().pixels();
    let scale = OPEN_FIELD / (window.levels() - 1) as f64;
    projection
        .neighbours(q)
        .map(|n| n.iter().map(|&(idx, w)| pixels[idx] as f64 * w).sum::<f64>() * scale)
}

// =============================================================================
// Mutual information
// =============================================================================

/// Adds the contributions of grid row `k` to `hist`.
pub(crate) fn accumulate_row(
    hist: &mut JointHistogram,
    k: i32,
    grid: &VirtualGrid,
    phantom: &SyntheticPhantom,
    projection: &Projection,
    window: &FilmWindow,
) {
    let pixels = window.normalized().pixels();
    let levels = window.levels();
    for i in grid.row_span(k) {
        let p = grid.point(i, k);
        let Some(neighbours) = projection.neighbours(projection.to_window(p)) else {
            continue;
        };
        let synthetic = phantom.level(p, levels);
        for (idx, weight) in neighbours {
            hist.add(synthetic, pixels[idx] as usize, weight);
        }
    }
}

/// Joint histogram of synthetic level against film level over the grid.
///
/// Rows are split across rayon workers; each fills a private histogram and
/// the partials are summed at the end.
pub fn joint_histogram(
    window: &FilmWindow,
    geometry: &BeamGeometry,
    config: &FusionConfig,
) -> JointHistogram {
    let grid = VirtualGrid::from_config(config);
    let phantom = SyntheticPhantom::new(&config.phantom, geometry);
    let projection = Projection::new(window, geometry);
    let levels = window.levels();

    (-grid.radius..grid.radius + 1)
        .into_par_iter()
        .with_min_len(MIN_ROWS_PER_TASK)
        .fold(
            || JointHistogram::new(levels),
            |mut hist, k| {
                accumulate_row(&mut hist, k, &grid, &phantom, &projection, window);
                hist
            },
        )
        .reduce(
            || JointHistogram::new(levels),
            |mut a, b| {
                a.merge(&b);
                a
            },
        )
}

/// Mutual information between silhouette and film; `None` if no grid point
/// lands inside the window.
pub fn mutual_information(
    window: &FilmWindow,
    geometry: &BeamGeometry,
    config: &FusionConfig,
) -> Option<f64> {
    joint_histogram(window, geometry, config).mutual_information()
}

// =============================================================================
// Normalized cross-correlation
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    n: f64,
    s: f64,
    f: f64,
    ss: f64,
    ff: f64,
    sf: f64,
}

impl Moments {
    fn add(&mut self, s: f64, f: f64) {
        self.n += 1.0;
        self.s += s;
        self.f += f;
        self.ss += s * s;
        self.ff += f * f;
        self.sf += s * f;
    }

    fn combine(self, o: Moments) -> Moments {
        Moments {
            n: self.n + o.n,
            s: self.s + o.s,
            f: self.f + o.f,
            ss: self.ss + o.ss,
            ff: self.ff + o.ff,
            sf: self.sf + o.sf,
        }
    }

    fn correlation(&self) -> Option<f64> {
        if self.n < 2.0 {
            return None;
        }
        let cov = self.sf - self.s * self.f / self.n;
        let var_s = self.ss - self.s * self.s / self.n;
        let var_f = self.ff - self.f * self.f / self.n;
        if var_s <= 0.0 || var_f <= 0.0 {
            return None;
        }
        Some(cov / (var_s * var_f).sqrt())
    }
}

/// Pearson correlation of synthetic and interpolated film intensity.
pub fn normalized_cross_correlation(
    window: &FilmWindow,
    geometry: &BeamGeometry,
    config: &FusionConfig,
) -> Option<f64> {
    let grid = VirtualGrid::from_config(config);
    let phantom = SyntheticPhantom::new(&config.phantom, geometry);
    let projection = Projection::new(window, geometry);

    (-grid.radius..grid.radius + 1)
        .into_par_iter()
        .with_min_len(MIN_ROWS_PER_TASK)
        .fold(Moments::default, |mut m, k| {
            for i in grid.row_span(k) {
                let p = grid.point(i, k);
                if let Some(f) = film_intensity(window, &projection, projection.to_window(p)) {
                    m.add(phantom.intensity(p), f);
                }
            }
            m
        })
        .reduce(Moments::default, Moments::combine)
        .correlation()
}

// =============================================================================
// Pattern intensity
// =============================================================================

/// Difference image `synthetic - film` on the grid's bounding square, and
/// the number of cells that mapped into the window.
///
/// Cells outside the disk or mapping outside the window stay 0.
fn difference_image(
    window: &FilmWindow,
    geometry: &BeamGeometry,
    grid: &VirtualGrid,
    config: &FusionConfig,
) -> (Buffer2<f64>, usize) {
    let phantom = SyntheticPhantom::new(&config.phantom, geometry);
    let projection = Projection::new(window, geometry);
    let side = grid.side();
    let mut diff = Buffer2::new_filled(side, side, 0.0);

    let mapped = diff
        .pixels_mut()
        .par_chunks_mut(side)
        .enumerate()
        .map(|(row, out)| {
            let k = row as i32 - grid.radius;
            let mut mapped = 0usize;
            for i in grid.row_span(k) {
                let p = grid.point(i, k);
                if let Some(f) = film_intensity(window, &projection, projection.to_window(p)) {
                    out[(i + grid.radius) as usize] = phantom.intensity(p) - f;
                    mapped += 1;
                }
            }
            mapped
        })
        .sum();
    (diff, mapped)
}

/// Mean of `sigma^2 / (sigma^2 + d^2)` over pairs of difference-image cells
/// closer than [`PATTERN_RADIUS`], for centers inside the shrunken disk.
/// `None` when no grid point lands in the window.
pub fn pattern_intensity(
    window: &FilmWindow,
    geometry: &BeamGeometry,
    config: &FusionConfig,
) -> Option<f64> {
    let grid = VirtualGrid::from_config(config);
    let inner = grid.radius - PATTERN_RADIUS;
    if inner < 0 {
        return None;
    }
    let (diff, mapped) = difference_image(window, geometry, &grid, config);
    if mapped == 0 {
        return None;
    }
    let side = grid.side() as i32;
    let inner_grid = VirtualGrid {
        radius: inner,
        pitch: grid.pitch,
    };
    let r2 = PATTERN_RADIUS * PATTERN_RADIUS;

    let (sum, count) = (-inner..=inner)
        .into_par_iter()
        .map(|k| {
            let mut sum = 0.0;
            let mut count = 0usize;
            let y = k + grid.radius;
            for i in inner_grid.row_span(k) {
                let x = i + grid.radius;
                let center = diff[(x as usize, y as usize)];
                for dy in -PATTERN_RADIUS..=PATTERN_RADIUS {
                    for dx in -PATTERN_RADIUS..=PATTERN_RADIUS {
                        let (nx, ny) = (x + dx, y + dy);
                        if dx * dx + dy * dy > r2 || nx < 0 || ny < 0 || nx >= side || ny >= side {
                            continue;
                        }
                        let d = center - diff[(nx as usize, ny as usize)];
                        sum += PATTERN_SIGMA_SQ / (PATTERN_SIGMA_SQ + d * d);
                        count += 1;
                    }
                }
            }
            (sum, count)
        })
        .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    (count > 0).then(|| sum / count as f64)
}
