//! Parameter validation.

use super::*;

/// An atmosphere, domain, scene or trace setting outside of its physical range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: Float },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: Float },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: Float },

    #[error("empty domain along {axis}: [{min}, {max}]")]
    EmptyDomain {
        axis: &'static str,
        min: Float,
        max: Float,
    },

    #[error("sample_every must be at least 1")]
    ZeroDecimation,
}

/// Checks that a value can be traced with.
pub trait Validate {
    fn validate(&self) -> Result<(), ParameterError>;
}

pub(crate) fn finite(name: &'static str, value: Float) -> Result<Float, ParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NotFinite { name, value })
    }
}

pub(crate) fn positive(name: &'static str, value: Float) -> Result<(), ParameterError> {
    if finite(name, value)? > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::NotPositive { name, value })
    }
}

pub(crate) fn non_negative(name: &'static str, value: Float) -> Result<(), ParameterError> {
    if finite(name, value)? >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::Negative { name, value })
    }
}

impl Validate for DomainBounds {
    fn validate(&self) -> Result<(), ParameterError> {
        for (axis, min, max) in [("x", self.x_min, self.x_max), ("y", self.y_min, self.y_max)] {
            finite("domain bound", min)?;
            finite("domain bound", max)?;
            if min >= max {
                return Err(ParameterError::EmptyDomain { axis, min, max });
            }
        }
        Ok(())
    }
}

impl Validate for TraceParams {
    fn validate(&self) -> Result<(), ParameterError> {
        positive("step_size", self.step_size)?;
        if self.sample_every == 0 {
            return Err(ParameterError::ZeroDecimation);
        }
        Ok(())
    }
}

impl Validate for Scene {
    fn validate(&self) -> Result<(), ParameterError> {
        finite("object_x", self.object_x)?;
        finite("observer_x", self.observer_x)?;
        non_negative("object_height", self.object_height)?;
        non_negative("observer_height", self.observer_height)
    }
}
