//! Numeric building blocks shared by the fit stages.

pub mod distribution;

pub use distribution::{Distribution, WeightedSample};
