use thiserror::Error;

/// Errors raised while building a cube from its configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CubeError {
    #[error("{name} must be a finite positive number, got {value}")]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("scale range ({0}, {1}) must hold two finite positive bounds")]
    InvalidScaleRange(f64, f64),
}

pub type Result<T> = std::result::Result<T, CubeError>;
