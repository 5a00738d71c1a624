use std::path::{Path, PathBuf};

use clap::Parser;

use crate::canvas::FitMode;
use crate::config::{DEFAULT_MAX_IMAGE_SIZE, Settings};
use crate::core::CutoutOptions;
use crate::runtime::{Device, GpuBackend};

#[derive(Debug, Parser)]
#[command(name = "cutout-rs", version, about = "Remove an image background, feather the edge and fit it onto a transparent canvas")]
pub struct Args {
	/// Input image path (jpg/png/webp).
	pub input: PathBuf,

	/// Output PNG path (defaults to `<input>_cutout.png`).
	#[arg(short, long)]
	pub output: Option<PathBuf>,

	/// Segmentation model name (u2netp, u2net, u2net_human_seg, u2net_cloth_seg, silueta, isnet-general-use, isnet-anime).
	#[arg(short = 'm', long, default_value = "u2netp")]
	pub model: String,

	/// Target canvas width in px. Fitting only happens when height is given too.
	#[arg(long)]
	pub width: Option<u32>,

	/// Target canvas height in px.
	#[arg(long)]
	pub height: Option<u32>,

	/// `contain` keeps the full subject, `cover` fills the box by cropping overflow.
	#[arg(long, default_value = "contain")]
	pub mode: FitMode,

	/// Transparent padding in px added around the cutout before fitting.
	#[arg(long, default_value_t = 0)]
	pub pad: u32,

	/// Edge feather strength, as blur sigma per 1000 px of the shorter side (0 disables).
	#[arg(long, default_value_t = 2)]
	pub feather: u32,

	/// Binarize the mask: alpha becomes 0 or 255 based on this threshold (0-255).
	#[arg(long, value_parser = clap::value_parser!(u8))]
	pub mask_threshold: Option<u8>,

	/// Refine the uncertain band around the mask edge using the image colours on either side.
	#[arg(long)]
	pub alpha_matting: bool,

	/// Skip background removal and only feather/fit the input as is.
	#[arg(long)]
	pub keep_background: bool,

	/// Device selection.
	#[arg(long, value_enum, default_value_t = Device::Cpu)]
	pub device: Device,

	/// Which GPU backend to use (only relevant with `--device gpu`).
	#[arg(long, value_enum, default_value_t = GpuBackend::Auto)]
	pub gpu_backend: GpuBackend,

	/// Directory holding downloaded `.onnx` models (defaults to the user cache dir).
	#[arg(long, env = "CUTOUT_MODELS_DIR")]
	pub models_dir: Option<PathBuf>,

	/// Path to the onnxruntime shared library. Falls back to `ORT_DYLIB_PATH`.
	#[arg(long, env = "CUTOUT_ORT_DYLIB")]
	pub ort_dylib: Option<PathBuf>,

	/// Reject inputs whose longer side exceeds this many px (0 disables).
	#[arg(long, env = "CUTOUT_MAX_IMAGE_SIZE", default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
	pub max_image_size: u32,

	/// Never download models; fail if the requested one is not cached.
	#[arg(long)]
	pub offline: bool,

	/// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8
}

impl Args {
	pub fn cutout_options(&self, settings: &Settings) -> CutoutOptions {
		CutoutOptions {
			model: self.model.clone(),
			remove_background: !self.keep_background,
			mask_threshold: self.mask_threshold,
			alpha_matting: self.alpha_matting,
			feather: self.feather,
			width: self.width,
			height: self.height,
			mode: self.mode,
			pad: self.pad,
			max_image_size: settings.max_image_size
		}
	}

	pub fn output_path(&self) -> PathBuf {
		match &self.output {
			Some(p) => p.clone(),
			None => default_output_path(&self.input)
		}
	}
}

fn default_output_path(input: &Path) -> PathBuf {
	let stem = input
		.file_stem()
		.and_then(|s| s.to_str())
		.unwrap_or("out");
	input.with_file_name(format!("{stem}_cutout.png"))
}
