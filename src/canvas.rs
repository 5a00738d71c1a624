use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::compose;
use crate::error::{FitError, FitResult, ensure_non_empty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
	/// Keep the whole subject visible; unused canvas stays transparent.
	#[default]
	Contain,
	/// Fill the whole canvas; overflow is cropped around the centre.
	Cover
}

impl FromStr for FitMode {
	type Err = FitError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"contain" => Ok(FitMode::Contain),
			"cover" => Ok(FitMode::Cover),
			_ => Err(FitError::InvalidMode(s.to_string()))
		}
	}
}

impl fmt::Display for FitMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			FitMode::Contain => "contain",
			FitMode::Cover => "cover"
		})
	}
}

/// One feather-then-fit pass over a cutout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FitRequest {
	pub target_width: Option<u32>,
	pub target_height: Option<u32>,
	pub mode: FitMode,
	pub pad: u32,
	pub feather_radius: u32
}

impl FitRequest {
	pub fn apply(&self, img: &DynamicImage) -> FitResult<RgbaImage> {
		let feathered = compose::feather(img, self.feather_radius)?;
		fit_rgba(feathered, self.target_width, self.target_height, self.mode, self.pad)
	}
}

/// Scale `img` uniformly and centre it on a transparent `target_w`x`target_h` canvas.
///
/// When either target dimension is `None` the RGBA conversion of `img` is returned as is.
/// `pad` transparent pixels are added around the source before scaling.
pub fn fit_to_canvas(
	img: &DynamicImage,
	target_w: Option<u32>,
	target_h: Option<u32>,
	mode: FitMode,
	pad: u32
) -> FitResult<RgbaImage> {
	fit_rgba(img.to_rgba8(), target_w, target_h, mode, pad)
}

fn fit_rgba(
	src: RgbaImage,
	target_w: Option<u32>,
	target_h: Option<u32>,
	mode: FitMode,
	pad: u32
) -> FitResult<RgbaImage> {
	ensure_non_empty(src.width(), src.height())?;
	if target_w == Some(0) || target_h == Some(0) {
		return Err(FitError::InvalidDimension(format!(
			"target size must be positive (got {}x{})",
			target_w.map_or("-".to_string(), |w| w.to_string()),
			target_h.map_or("-".to_string(), |h| h.to_string())
		)));
	}
	let (Some(tw), Some(th)) = (target_w, target_h) else {
		return Ok(src);
	};

	let src = if pad > 0 { pad_transparent(&src, pad)? } else { src };
	let (sw, sh) = src.dimensions();

	let (sx, sy) = (tw as f64 / sw as f64, th as f64 / sh as f64);
	let scale = match mode {
		FitMode::Contain => sx.min(sy),
		FitMode::Cover => sx.max(sy)
	};
	let new_w = ((sw as f64 * scale).round() as u32).max(1);
	let new_h = ((sh as f64 * scale).round() as u32).max(1);

	let resized = if (new_w, new_h) == (sw, sh) {
		src
	} else {
		imageops::resize(&src, new_w, new_h, FilterType::Lanczos3)
	};

	let placed = match mode {
		FitMode::Contain => resized,
		FitMode::Cover => {
			let x0 = if new_w > tw { (new_w - tw) / 2 } else { 0 };
			let y0 = if new_h > th { (new_h - th) / 2 } else { 0 };
			let (cw, ch) = (new_w.min(tw), new_h.min(th));
			if (cw, ch) == (new_w, new_h) {
				resized
			} else {
				imageops::crop_imm(&resized, x0, y0, cw, ch).to_image()
			}
		}
	};

	let cx = (tw as i64 - placed.width() as i64).div_euclid(2);
	let cy = (th as i64 - placed.height() as i64).div_euclid(2);

	let mut canvas = RgbaImage::new(tw, th);
	paste_masked(&mut canvas, &placed, cx, cy);
	Ok(canvas)
}

/// Surround `img` with `pad` fully transparent pixels on every side.
pub fn pad_transparent(img: &RgbaImage, pad: u32) -> FitResult<RgbaImage> {
	let grow = |v: u32| {
		pad.checked_mul(2)
			.and_then(|p| v.checked_add(p))
			.ok_or_else(|| FitError::InvalidDimension(format!("padding {pad} overflows image size")))
	};
	let mut out = RgbaImage::new(grow(img.width())?, grow(img.height())?);
	imageops::replace(&mut out, img, pad as i64, pad as i64);
	Ok(out)
}

/// Paste `src` at (`x`, `y`) onto a freshly cleared canvas using its own alpha as the mask.
/// Fully transparent source pixels are skipped; every other pixel is copied verbatim, which is
/// what "over" reduces to on a transparent destination.
fn paste_masked(canvas: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
	let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
	for (sx, sy, p) in src.enumerate_pixels() {
		if p[3] == 0 {
			continue;
		}
		let (dx, dy) = (x + sx as i64, y + sy as i64);
		if dx < 0 || dy < 0 || dx >= cw || dy >= ch {
			continue;
		}
		canvas.put_pixel(dx as u32, dy as u32, *p);
	}
}
