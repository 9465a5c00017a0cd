use crate::tessellation::TessellationError;
use thiserror::Error;

/// Result type of the scene functions.
pub type SceneResult<T> = Result<T, SceneError>;

#[derive(Error, Clone, Debug, PartialEq)]
pub enum SceneError {
    #[error(transparent)]
    Tessellation(#[from] TessellationError),
    #[error("A mesh can't address {count} vertices with 16 bit indices")]
    TooManyVertices { count: usize },
}
