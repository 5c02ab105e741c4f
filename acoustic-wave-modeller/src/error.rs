//! Error types for the modelling core.

use thiserror::Error;

/// Result alias used throughout the numerical core.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    /// An input parameter violates a constraint. Always raised before the
    /// first time step.
    #[error("invalid configuration: {parameter} = {value} ({constraint})")]
    Configuration {
        parameter: String,
        value: String,
        constraint: String,
    },

    /// The pressure field grew past the configured divergence threshold.
    #[error("numerical divergence at step {step}: max |p| = {magnitude:e} exceeds {threshold:e}")]
    NumericalDivergence {
        step: usize,
        magnitude: f64,
        threshold: f64,
    },

    /// A snapshot observer returned an error.
    #[error("snapshot observer failed: {0}")]
    Observer(#[source] anyhow::Error),
}

impl ModelError {
    pub fn config(
        parameter: impl Into<String>,
        value: impl ToString,
        constraint: impl Into<String>,
    ) -> Self {
        ModelError::Configuration {
            parameter: parameter.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ModelError::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_names_parameter_and_constraint() {
        let err = ModelError::config("courant_number", 1.2, "must lie in (0, 1]");
        let msg = err.to_string();
        assert!(msg.contains("courant_number"));
        assert!(msg.contains("1.2"));
        assert!(msg.contains("(0, 1]"));
        assert!(err.is_configuration());
    }

    #[test]
    fn divergence_is_not_a_configuration_error() {
        let err = ModelError::NumericalDivergence {
            step: 10,
            magnitude: 1e12,
            threshold: 1e6,
        };
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("step 10"));
    }
}
