use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ort::ep;
use ort::session::Session;
use tracing::{info, warn};

use crate::model::{self, ModelSpec};
use crate::runtime::PreferredEp;

pub struct LoadedModel {
	pub spec: ModelSpec,
	pub session: Session
}

/// Loaded segmentation sessions keyed by model name.
///
/// Built once at startup and handed to whatever runs the pipeline. Sessions are created on
/// first use and then kept for the lifetime of the store; nothing is ever evicted.
pub struct ModelStore {
	models_dir: PathBuf,
	preferred_ep: Option<PreferredEp>,
	allow_download: bool,
	loaded: HashMap<&'static str, LoadedModel>
}

impl ModelStore {
	pub fn new(models_dir: impl Into<PathBuf>, preferred_ep: Option<PreferredEp>, allow_download: bool) -> Self {
		Self {
			models_dir: models_dir.into(),
			preferred_ep,
			allow_download,
			loaded: HashMap::new()
		}
	}

	pub fn models_dir(&self) -> &Path {
		&self.models_dir
	}

	pub fn is_loaded(&self, name: &str) -> bool {
		model::model_spec(name).is_ok_and(|m| self.loaded.contains_key(m.name))
	}

	pub fn get(&mut self, name: &str) -> Result<&mut LoadedModel> {
		let spec = model::model_spec(name)?;
		if !self.loaded.contains_key(spec.name) {
			let install = model::ensure_model(spec.name, &self.models_dir, self.allow_download)?;
			info!(model = spec.name, path = %install.path.display(), "loading model");
			let session = build_session(&install.path, self.preferred_ep)?;
			self.loaded.insert(spec.name, LoadedModel { spec, session });
		}
		self.loaded
			.get_mut(spec.name)
			.context("model vanished from store")
	}
}

fn build_session(model_path: &Path, preferred: Option<PreferredEp>) -> Result<Session> {
	let attempt = match preferred {
		None => return cpu_session(model_path),
		Some(PreferredEp::DirectML) => Session::builder()
			.context("create ORT session builder")?
			.with_execution_providers([ep::DirectML::default().build()])
			.context("configure DirectML EP")?
			.commit_from_file(model_path),
		Some(PreferredEp::Cuda) => Session::builder()
			.context("create ORT session builder")?
			.with_execution_providers([ep::CUDA::default().build()])
			.context("configure CUDA EP")?
			.commit_from_file(model_path)
	};

	match attempt {
		Ok(s) => Ok(s),
		Err(e) => {
			warn!(?preferred, "GPU execution provider failed to initialize, falling back to CPU: {e:#}");
			cpu_session(model_path)
		}
	}
}

fn cpu_session(model_path: &Path) -> Result<Session> {
	Session::builder()
		.context("create ORT session builder")?
		.commit_from_file(model_path)
		.with_context(|| format!("load onnx model: {}", model_path.display()))
}
