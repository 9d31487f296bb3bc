use crate::surface::{LoadError, SurfaceError};
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("gtk application exited with status {0}")]
    Exit(i32),
}
