use anyhow::{Context, Result, bail};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use ndarray::{Array4, ArrayViewD};
use ort::session::Session;
use ort::value::TensorRef;

/// Run a U2Net-style salient object model and return a foreground mask at the size of `img`.
pub fn predict_mask(session: &mut Session, input_size: u32, img: &RgbImage) -> Result<GrayImage> {
	let resized = imageops::resize(img, input_size, input_size, FilterType::Lanczos3);
	let input = to_nchw(&resized);

	let outputs = session
		.run(ort::inputs![TensorRef::from_array_view(&input)?])
		.context("run inference")?;
	if outputs.len() == 0 {
		bail!("model produced no outputs");
	}
	let out = outputs[0].try_extract_array::<f32>().context("extract output tensor")?;

	let small = mask_from_output(out)?;
	Ok(imageops::resize(&small, img.width(), img.height(), FilterType::Lanczos3))
}

/// RGB in [0, 255] to a 1x3xHxW tensor scaled to [-1, 1].
fn to_nchw(img: &RgbImage) -> Array4<f32> {
	let (w, h) = (img.width() as usize, img.height() as usize);
	let mut t = Array4::<f32>::zeros((1, 3, h, w));
	for (x, y, p) in img.enumerate_pixels() {
		let (x, y) = (x as usize, y as usize);
		for c in 0..3 {
			t[[0, c, y, x]] = (p[c] as f32 / 255.0 - 0.5) / 0.5;
		}
	}
	t
}

fn mask_from_output(out: ArrayViewD<'_, f32>) -> Result<GrayImage> {
	let shape = out.shape();
	if shape.len() != 4 {
		bail!("unexpected output rank: {} (expected 4)", shape.len());
	}
	let (n, c, h, w) = (shape[0], shape[1], shape[2], shape[3]);
	if n != 1 || c != 1 {
		bail!("unexpected output shape {n}x{c}x{h}x{w} (expected 1x1xHxW)");
	}

	// Some exports emit probabilities, others logits. Squashing probabilities through a
	// sigmoid again would lift the background to ~0.5 alpha.
	let (min_v, max_v) = out
		.iter()
		.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
	let is_prob = min_v >= -0.01 && max_v <= 1.01;

	let mut mask = GrayImage::new(w as u32, h as u32);
	for (x, y, px) in mask.enumerate_pixels_mut() {
		let v = out[[0, 0, y as usize, x as usize]];
		let s = if is_prob { v } else { 1.0 / (1.0 + (-v).exp()) };
		*px = Luma([(s.clamp(0.0, 1.0) * 255.0).round() as u8]);
	}
	Ok(mask)
}
