use image::{DynamicImage, GrayImage, Luma, RgbImage, Rgba, RgbaImage, imageops};

use crate::error::{FitResult, ensure_non_empty};

/// Merge `mask` into `img` as the alpha channel. With `threshold` the mask is binarized first.
pub fn apply_alpha(img: &RgbImage, mask: &GrayImage, threshold: Option<u8>) -> RgbaImage {
	let (w, h) = (img.width(), img.height());
	let mut out = RgbaImage::new(w, h);

	for y in 0..h {
		for x in 0..w {
			let p = img.get_pixel(x, y);
			let a = binarize(mask.get_pixel(x, y)[0], threshold);
			out.put_pixel(x, y, Rgba([p[0], p[1], p[2], a]));
		}
	}
	out
}

fn binarize(a: u8, threshold: Option<u8>) -> u8 {
	match threshold {
		Some(t) => if a >= t { 255 } else { 0 },
		None => a
	}
}

/// Soften a cutout edge by Gaussian-blurring the alpha plane with `sigma = radius`.
///
/// The input is converted to RGBA first. Colour channels come back bit-identical; only
/// alpha changes, and only when `radius > 0`.
pub fn feather(img: &DynamicImage, radius: u32) -> FitResult<RgbaImage> {
	let mut out = img.to_rgba8();
	ensure_non_empty(out.width(), out.height())?;
	if radius == 0 {
		return Ok(out);
	}

	let alpha = GrayImage::from_fn(out.width(), out.height(), |x, y| Luma([out.get_pixel(x, y)[3]]));
	let blurred = imageops::blur(&alpha, radius as f32);
	for (p, a) in out.pixels_mut().zip(blurred.pixels()) {
		p.0[3] = a.0[0];
	}
	Ok(out)
}

/// Feather sigma for an image of `width`x`height` when `strength` is given per 1000 px of the
/// shorter side. Zero strength disables feathering; anything else yields at least 1.
pub fn feather_radius_for(width: u32, height: u32, strength: u32) -> u32 {
	if strength == 0 {
		return 0;
	}
	let short_side = width.min(height) as f64;
	let r = (short_side / 1000.0 * strength as f64).round() as u32;
	r.max(1)
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Left half opaque red, right half fully transparent blue.
	fn hard_edge(w: u32, h: u32) -> RgbaImage {
		RgbaImage::from_fn(w, h, |x, _| {
			if x < w / 2 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 0]) }
		})
	}

	fn max_alpha_step(img: &RgbaImage, y: u32) -> u8 {
		(1..img.width())
			.map(|x| img.get_pixel(x, y)[3].abs_diff(img.get_pixel(x - 1, y)[3]))
			.max()
			.unwrap_or(0)
	}

	#[test]
	fn zero_radius_is_identity() {
		let src = hard_edge(16, 8);
		let out = feather(&DynamicImage::ImageRgba8(src.clone()), 0).unwrap();
		assert_eq!(out, src);
	}

	#[test]
	fn rgb_input_gets_opaque_alpha() {
		let src = RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));
		let out = feather(&DynamicImage::ImageRgb8(src), 0).unwrap();
		assert!(out.pixels().all(|p| p.0 == [10, 20, 30, 255]));
	}

	#[test]
	fn blur_softens_the_edge_and_keeps_colour() {
		let src = hard_edge(40, 12);
		let out = feather(&DynamicImage::ImageRgba8(src.clone()), 2).unwrap();

		assert_eq!(out.dimensions(), src.dimensions());
		for (a, b) in out.pixels().zip(src.pixels()) {
			assert_eq!(&a.0[..3], &b.0[..3]);
		}

		let y = 6;
		assert_eq!(max_alpha_step(&src, y), 255);
		assert!(max_alpha_step(&out, y) < 255);
		assert!(out.get_pixel(19, y)[3] < 255);
		assert!(out.get_pixel(20, y)[3] > 0);

		// far from the edge the plateaus survive
		assert!(out.get_pixel(2, y)[3] >= 250);
		assert!(out.get_pixel(37, y)[3] <= 5);
	}

	#[test]
	fn empty_image_is_rejected() {
		let src = DynamicImage::ImageRgba8(RgbaImage::new(0, 5));
		assert!(matches!(feather(&src, 2), Err(crate::error::FitError::InvalidImage(_))));
	}

	#[test]
	fn radius_heuristic() {
		assert_eq!(feather_radius_for(4000, 3000, 0), 0);
		assert_eq!(feather_radius_for(200, 200, 2), 1);
		assert_eq!(feather_radius_for(4000, 3000, 2), 6);
		assert_eq!(feather_radius_for(1500, 2500, 3), 5);
	}

	#[test]
	fn threshold_binarizes_alpha() {
		let img = RgbImage::from_pixel(3, 1, image::Rgb([1, 2, 3]));
		let mask = GrayImage::from_raw(3, 1, vec![10, 127, 200]).unwrap();
		let out = apply_alpha(&img, &mask, Some(128));
		let alphas: Vec<u8> = out.pixels().map(|p| p[3]).collect();
		assert_eq!(alphas, vec![0, 0, 255]);

		let soft = apply_alpha(&img, &mask, None);
		let alphas: Vec<u8> = soft.pixels().map(|p| p[3]).collect();
		assert_eq!(alphas, vec![10, 127, 200]);
	}
}
