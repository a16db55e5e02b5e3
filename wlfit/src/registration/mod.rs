//! Film-to-model registration.
//!
//! A fusion run crops the film around the ball ([`FilmWindow`]), refines
//! the ball center, then searches the six fit parameters with the simplex
//! minimizer, scoring each candidate against a [`SyntheticPhantom`].

mod centroid;
mod config;
mod error;
mod fusion;
mod joint_histogram;
mod measure;
mod objective;
mod phantom;
mod progress;
mod window;


pub use centroid::refine_ball_center;
pub use config::{FusionConfig, PhantomConfig, SimilarityMeasure};
pub use error::FusionError;
pub use fusion::{FusionOutcome, fuse};
pub use joint_histogram::JointHistogram;
pub use measure::{joint_histogram, mutual_information, normalized_cross_correlation, pattern_intensity};
pub use objective::RegistrationObjective;
pub use phantom::{OPEN_FIELD, SyntheticPhantom};
pub use progress::{CancelPredicate, FitControls, FitProgress, ProgressCallback};
pub use window::{FilmWindow, WindowRect};
