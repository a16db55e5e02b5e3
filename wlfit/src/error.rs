use thiserror::Error;

/// A configuration value outside its allowed range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid configuration: {field} must be {requirement}, got {value}")]
pub struct ConfigError {
    pub field: &'static str,
    pub requirement: &'static str,
    pub value: f64,
}

/// `Ok` when `ok` holds, otherwise a [`ConfigError`] for `field`.
pub(crate) fn ensure(
    ok: bool,
    field: &'static str,
    requirement: &'static str,
    value: f64,
) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            requirement,
            value,
        })
    }
}
