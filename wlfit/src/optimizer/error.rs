use crate::error::ConfigError;

/// Configuration problems detected before the first evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Objective provided no start point")]
    MissingStartPoint,
    #[error("Objective provided no start step sizes")]
    MissingStepSizes,
    #[error("Start point has {parameters} parameters but {steps} step sizes were given")]
    DimensionMismatch { parameters: usize, steps: usize },
    #[error("Start point is empty")]
    EmptyParameterVector,
}
