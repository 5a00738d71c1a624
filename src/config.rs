use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::cli::Args;

pub const DEFAULT_MAX_IMAGE_SIZE: u32 = 4096;

/// Process-wide settings resolved once at startup from flags, environment and platform dirs.
#[derive(Debug, Clone)]
pub struct Settings {
	pub models_dir: PathBuf,
	pub ort_dylib: Option<PathBuf>,
	/// Largest accepted side of a decoded input; 0 disables the check.
	pub max_image_size: u32,
	pub allow_download: bool
}

impl Settings {
	pub fn from_args(args: &Args) -> Result<Self> {
		let models_dir = match &args.models_dir {
			Some(dir) => dir.clone(),
			None => default_models_dir()?
		};
		Ok(Self {
			models_dir,
			ort_dylib: args.ort_dylib.clone(),
			max_image_size: args.max_image_size,
			allow_download: !args.offline
		})
	}
}

pub fn default_models_dir() -> Result<PathBuf> {
	let dirs = directories::ProjectDirs::from("rs", "cutout", "cutout-rs")
		.ok_or_else(|| anyhow!("unable to resolve user cache directory"))?;
	Ok(dirs.cache_dir().join("models"))
}
