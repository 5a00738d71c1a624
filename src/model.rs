use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::download;

const RELEASE_BASE: &str = "https://github.com/danielgatis/rembg/releases/download/v0.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
	pub name: &'static str,
	/// Square side the network expects its input resized to.
	pub input_size: u32
}

impl ModelSpec {
	pub fn url(&self) -> String {
		format!("{RELEASE_BASE}/{}.onnx", self.name)
	}

	pub fn file_name(&self) -> String {
		format!("{}.onnx", self.name)
	}
}

// ISNet exports are trained at 1024; everything in the U2Net family at 320.
const MODELS: &[ModelSpec] = &[
	ModelSpec { name: "u2netp", input_size: 320 },
	ModelSpec { name: "u2net", input_size: 320 },
	ModelSpec { name: "u2net_human_seg", input_size: 320 },
	ModelSpec { name: "u2net_cloth_seg", input_size: 320 },
	ModelSpec { name: "silueta", input_size: 320 },
	ModelSpec { name: "isnet-general-use", input_size: 1024 },
	ModelSpec { name: "isnet-anime", input_size: 1024 }
];

pub fn supported_models() -> impl Iterator<Item = &'static str> {
	MODELS.iter().map(|m| m.name)
}

pub fn model_spec(name: &str) -> Result<ModelSpec> {
	let wanted = name.trim().to_ascii_lowercase();
	match MODELS.iter().find(|m| m.name == wanted) {
		Some(m) => Ok(*m),
		None => {
			let names: Vec<_> = supported_models().collect();
			bail!("unsupported model: {wanted} (supported: {})", names.join(", "))
		}
	}
}

#[derive(Debug, Clone)]
pub struct ModelInstall {
	pub spec: ModelSpec,
	pub path: PathBuf
}

/// Locate `name` under `models_dir`, fetching it from the release assets when missing.
pub fn ensure_model(name: &str, models_dir: &Path, allow_download: bool) -> Result<ModelInstall> {
	let spec = model_spec(name)?;
	let path = models_dir.join(spec.file_name());

	if !path.exists() {
		let url = spec.url();
		if !allow_download {
			bail!("download required: model {} ({url})", spec.name);
		}
		info!(model = spec.name, %url, "downloading model");
		download::download_to_path(&url, &path)
			.with_context(|| format!("download model {} from {url}", spec.name))?;
	}

	Ok(ModelInstall { spec, path })
}
