use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canvas::{FitMode, FitRequest};
use crate::config::DEFAULT_MAX_IMAGE_SIZE;
use crate::session::ModelStore;
use crate::matting::{self, MattingParams};
use crate::{compose, segment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoutOptions {
	pub model: String,
	/// When false the input's own alpha (or full opacity) is kept and no model runs.
	pub remove_background: bool,
	pub mask_threshold: Option<u8>,
	/// Re-estimate alpha in the uncertain band around the mask edge from local colours.
	pub alpha_matting: bool,
	/// Feather sigma per 1000 px of the shorter side.
	pub feather: u32,
	pub width: Option<u32>,
	pub height: Option<u32>,
	pub mode: FitMode,
	pub pad: u32,
	pub max_image_size: u32
}

impl Default for CutoutOptions {
	fn default() -> Self {
		Self {
			model: "u2netp".to_string(),
			remove_background: true,
			mask_threshold: None,
			alpha_matting: false,
			feather: 2,
			width: None,
			height: None,
			mode: FitMode::Contain,
			pad: 0,
			max_image_size: DEFAULT_MAX_IMAGE_SIZE
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoutResult {
	pub output_png: Vec<u8>,
	pub width: u32,
	pub height: u32
}

/// Decode, cut out, feather, fit and PNG-encode one image.
pub fn cutout_bytes(input_bytes: &[u8], opts: &CutoutOptions, store: &mut ModelStore) -> Result<CutoutResult> {
	let started = Instant::now();
	let img = image::load_from_memory(input_bytes).context("decode input image")?;
	let (w, h) = img.dimensions();
	debug!(width = w, height = h, elapsed_ms = started.elapsed().as_millis() as u64, "decoded input");

	let out = cutout_image(&img, opts, store)?;

	let stage = Instant::now();
	let output_png = encode_png(&out)?;
	debug!(bytes = output_png.len(), elapsed_ms = stage.elapsed().as_millis() as u64, "encoded png");

	Ok(CutoutResult {
		output_png,
		width: out.width(),
		height: out.height()
	})
}

pub fn cutout_image(img: &DynamicImage, opts: &CutoutOptions, store: &mut ModelStore) -> Result<RgbaImage> {
	let (w, h) = img.dimensions();
	if opts.max_image_size > 0 && w.max(h) > opts.max_image_size {
		bail!("image too large: {w}x{h} (longest side limit {})", opts.max_image_size);
	}

	let stage = Instant::now();
	let cut = if opts.remove_background {
		let rgb = img.to_rgb8();
		let loaded = store.get(&opts.model)?;
		let mask = segment::predict_mask(&mut loaded.session, loaded.spec.input_size, &rgb)
			.with_context(|| format!("run model: {}", loaded.spec.name))?;
		debug!(model = loaded.spec.name, elapsed_ms = stage.elapsed().as_millis() as u64, "predicted mask");
		let mask = if opts.alpha_matting {
			let stage = Instant::now();
			let refined = matting::refine_mask(&rgb, &mask, &MattingParams::default());
			debug!(elapsed_ms = stage.elapsed().as_millis() as u64, "refined mask edge");
			refined
		} else {
			mask
		};
		compose::apply_alpha(&rgb, &mask, opts.mask_threshold)
	} else {
		img.to_rgba8()
	};

	let stage = Instant::now();
	let req = FitRequest {
		target_width: opts.width,
		target_height: opts.height,
		mode: opts.mode,
		pad: opts.pad,
		feather_radius: compose::feather_radius_for(cut.width(), cut.height(), opts.feather)
	};
	let out = req.apply(&DynamicImage::ImageRgba8(cut))?;
	debug!(
		feather_radius = req.feather_radius,
		mode = %req.mode,
		width = out.width(),
		height = out.height(),
		elapsed_ms = stage.elapsed().as_millis() as u64,
		"feathered and fitted"
	);
	Ok(out)
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
	let mut buf = Vec::new();
	img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).context("encode png")?;
	Ok(buf)
}
