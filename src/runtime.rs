use std::{
	env,
	path::{Path, PathBuf},
	sync::OnceLock
};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Device {
	/// Always use CPU inference.
	#[default]
	Cpu,
	/// Prefer GPU. Falls back to CPU if the execution provider fails to load.
	Gpu
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GpuBackend {
	/// Platform default (Windows: DirectML, Linux: CUDA).
	#[default]
	Auto,
	/// Windows only, uses DirectML (DirectX 12).
	Directml,
	/// NVIDIA CUDA execution provider (Windows x64, Linux x64/aarch64).
	Cuda
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredEp {
	DirectML,
	Cuda
}

/// Pick the execution provider for `device` on the current platform. `None` means plain CPU.
pub fn preferred_ep(device: Device, backend: GpuBackend) -> Result<Option<PreferredEp>> {
	if device == Device::Cpu {
		return Ok(None);
	}

	let os = env::consts::OS;
	let arch = env::consts::ARCH;

	let ep = match backend {
		GpuBackend::Auto => match os {
			"windows" => PreferredEp::DirectML,
			"linux" => PreferredEp::Cuda,
			_ => bail!("GPU backend not supported on this platform ({os}/{arch})")
		},
		GpuBackend::Directml => PreferredEp::DirectML,
		GpuBackend::Cuda => PreferredEp::Cuda
	};

	match ep {
		PreferredEp::DirectML if os != "windows" => bail!("DirectML backend is only supported on Windows"),
		PreferredEp::Cuda => {
			let ok = (os == "windows" && arch == "x86_64")
				|| (os == "linux" && (arch == "x86_64" || arch == "aarch64"));
			if !ok {
				bail!("CUDA backend not supported on this platform ({os}/{arch})");
			}
		}
		_ => {}
	}
	Ok(Some(ep))
}

static ORT_DYLIB: OnceLock<PathBuf> = OnceLock::new();

/// Load ONNX Runtime from `dylib`. Must run before the first `Session` is built.
///
/// Without an explicit path `ort` falls back to `ORT_DYLIB_PATH` or the platform search path
/// when the first session is created.
pub fn init_ort(dylib: Option<&Path>) -> Result<()> {
	let Some(dylib) = dylib else {
		debug!("no onnxruntime library configured, relying on ORT_DYLIB_PATH / system search path");
		return Ok(());
	};
	let dylib = dylib.to_path_buf();

	if let Some(p) = ORT_DYLIB.get() {
		if p != &dylib {
			bail!(
				"ONNX Runtime is already initialized with {}. Restart required to switch to {}.",
				p.display(),
				dylib.display()
			);
		}
		return Ok(());
	}

	let builder = ort::init_from(&dylib)
		.with_context(|| format!("load onnxruntime from {}", dylib.display()))?;
	builder.commit();
	info!(path = %dylib.display(), "onnxruntime loaded");
	let _ = ORT_DYLIB.set(dylib);
	Ok(())
}
