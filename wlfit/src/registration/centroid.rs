//! Ball center refinement from the film window.

use glam::DVec2;
use rayon::prelude::*;

use super::FusionError;
use super::window::FilmWindow;
use crate::geometry::BeamGeometry;
use crate::math::Distribution;

/// Moves `geometry.ball_center` to the centroid of the ball shadow.
///
/// Inside `radius` mm of the current center, exposed pixels (inverted value
/// above `noise_floor`) give a threshold at their mean; pixels below it are
/// the ball and their mean physical offset shifts the center. `iteration`
/// only labels the error.
pub fn refine_ball_center(
    window: &FilmWindow,
    geometry: BeamGeometry,
    radius: f64,
    noise_floor: u8,
    iteration: usize,
) -> Result<BeamGeometry, FusionError> {
    let ps = geometry.pixel_size;
    let center = window.to_local(geometry.ball_center);
    let inverted = window.inverted();
    let radius_sq = radius * radius;

    let offset = move |x: usize, y: usize| DVec2::new((x as f64 - center.x) * ps, (y as f64 - center.y) * ps);

    let histogram = (0..inverted.height())
        .into_par_iter()
        .fold(
            || Distribution::new(0.0, 1.0, 256),
            |mut hist, y| {
                for (x, &value) in inverted.row(y).iter().enumerate() {
                    if value > noise_floor && offset(x, y).length_squared() <= radius_sq {
                        hist.append_value(value as f64, 1.0);
                    }
                }
                hist
            },
        )
        .reduce(
            || Distribution::new(0.0, 1.0, 256),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );
    let threshold = histogram.mean() as u8;

    let (sum, count) = (0..inverted.height())
        .into_par_iter()
        .map(|y| {
            let mut sum = DVec2::ZERO;
            let mut count = 0usize;
            for (x, &value) in inverted.row(y).iter().enumerate() {
                let d = offset(x, y);
                if value < threshold && d.length_squared() <= radius_sq {
                    sum += d;
                    count += 1;
                }
            }
            (sum, count)
        })
        .reduce(|| (DVec2::ZERO, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    if count == 0 {
        return Err(FusionError::CentroidNotFound { iteration });
    }

    let shift = sum / count as f64 / ps;
    tracing::debug!(
        iteration,
        threshold,
        pixels = count,
        dx = shift.x,
        dy = shift.y,
        "Ball centroid refined"
    );

    Ok(BeamGeometry {
        ball_center: geometry.ball_center + shift,
        ..geometry
    })
}
