use crate::path::PathError;
use thiserror::Error;

/// Result type of the tessellation functions.
pub type TessellationResult<T> = Result<T, TessellationError>;

/// The tessellators' error enumeration.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum TessellationError {
    #[error("Invalid path: {0}")]
    Path(#[from] PathError),
    #[error("The step distance must be at least {min}, got {value}")]
    InvalidStepDistance { value: f32, min: f32 },
    #[error("Fill tessellation failed: {0}")]
    Fill(#[from] lyon_tessellation::TessellationError),
}
