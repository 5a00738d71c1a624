use thiserror::Error;

/// Validation failures raised by the canvas and alpha operations before any pixel work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitError {
	#[error("invalid image: {0}")]
	InvalidImage(String),

	#[error("invalid target dimension: {0}")]
	InvalidDimension(String),

	#[error("invalid fit mode {0:?} (expected contain or cover)")]
	InvalidMode(String)
}

pub type FitResult<T> = std::result::Result<T, FitError>;

pub(crate) fn ensure_non_empty(width: u32, height: u32) -> FitResult<()> {
	if width == 0 || height == 0 {
		return Err(FitError::InvalidImage(format!("zero-sized image ({width}x{height})")));
	}
	Ok(())
}
