use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::erode;
use serde::{Deserialize, Serialize};

pub const TRIMAP_BACKGROUND: u8 = 0;
pub const TRIMAP_UNKNOWN: u8 = 128;
pub const TRIMAP_FOREGROUND: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MattingParams {
	/// Mask values at or above this are certain foreground.
	pub foreground_threshold: u8,
	/// Mask values at or below this are certain background.
	pub background_threshold: u8,
	/// Both certain regions shrink by this many px, widening the unknown band.
	pub erode_size: u8
}

impl Default for MattingParams {
	fn default() -> Self {
		Self {
			foreground_threshold: 240,
			background_threshold: 10,
			erode_size: 10
		}
	}
}

/// Split a soft mask into certain background (0), certain foreground (255) and unknown (128).
pub fn trimap(mask: &GrayImage, params: &MattingParams) -> GrayImage {
	let select = |keep: &dyn Fn(u8) -> bool| {
		let binary = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
			Luma([if keep(mask.get_pixel(x, y)[0]) { 255 } else { 0 }])
		});
		if params.erode_size > 0 { erode(&binary, Norm::LInf, params.erode_size) } else { binary }
	};
	let fg = select(&|v| v >= params.foreground_threshold);
	let bg = select(&|v| v <= params.background_threshold);

	GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
		let v = if fg.get_pixel(x, y)[0] > 0 {
			TRIMAP_FOREGROUND
		} else if bg.get_pixel(x, y)[0] > 0 {
			TRIMAP_BACKGROUND
		} else {
			TRIMAP_UNKNOWN
		};
		Luma([v])
	})
}

/// Re-estimate alpha inside the unknown band of the mask's trimap.
///
/// Each unknown pixel is projected onto the line between the mean certain-foreground and mean
/// certain-background colour found in a window around it. Pixels without both samples nearby,
/// or whose two means are indistinguishable, keep the model's value.
pub fn refine_mask(img: &RgbImage, mask: &GrayImage, params: &MattingParams) -> GrayImage {
	let tri = trimap(mask, params);
	let fg = ColorSums::new(img, &tri, TRIMAP_FOREGROUND);
	let bg = ColorSums::new(img, &tri, TRIMAP_BACKGROUND);
	let radius = u32::from(params.erode_size.max(1)) * 2;
	let (w, h) = img.dimensions();

	GrayImage::from_fn(w, h, |x, y| {
		let a = match tri.get_pixel(x, y)[0] {
			TRIMAP_FOREGROUND => 255,
			TRIMAP_BACKGROUND => 0,
			_ => {
				let (x0, y0) = (x.saturating_sub(radius), y.saturating_sub(radius));
				let (x1, y1) = ((x + radius + 1).min(w), (y + radius + 1).min(h));
				match (fg.mean(x0, y0, x1, y1), bg.mean(x0, y0, x1, y1)) {
					(Some(f), Some(b)) => estimate_alpha(img.get_pixel(x, y).0, f, b)
						.unwrap_or(mask.get_pixel(x, y)[0]),
					_ => mask.get_pixel(x, y)[0]
				}
			}
		};
		Luma([a])
	})
}

fn estimate_alpha(px: [u8; 3], f: [f64; 3], b: [f64; 3]) -> Option<u8> {
	let mut num = 0.0;
	let mut den = 0.0;
	for c in 0..3 {
		let d = f[c] - b[c];
		num += (px[c] as f64 - b[c]) * d;
		den += d * d;
	}
	if den < 1.0 {
		return None;
	}
	Some(((num / den).clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Summed-area table of RGB values and counts over the pixels carrying one trimap label.
struct ColorSums {
	stride: usize,
	table: Vec<[u64; 4]>
}

impl ColorSums {
	fn new(img: &RgbImage, tri: &GrayImage, label: u8) -> Self {
		let (w, h) = (img.width() as usize, img.height() as usize);
		let stride = w + 1;
		let mut table = vec![[0u64; 4]; stride * (h + 1)];
		for y in 0..h {
			let mut row = [0u64; 4];
			for x in 0..w {
				if tri.get_pixel(x as u32, y as u32)[0] == label {
					let p = img.get_pixel(x as u32, y as u32);
					row[0] += u64::from(p[0]);
					row[1] += u64::from(p[1]);
					row[2] += u64::from(p[2]);
					row[3] += 1;
				}
				let above = table[y * stride + x + 1];
				table[(y + 1) * stride + x + 1] = [0, 1, 2, 3].map(|i| above[i] + row[i]);
			}
		}
		Self { stride, table }
	}

	/// Mean colour over `[x0, x1) x [y0, y1)`, `None` when no labelled pixel falls inside.
	fn mean(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Option<[f64; 3]> {
		let at = |x: u32, y: u32| self.table[y as usize * self.stride + x as usize];
		let (a, b, c, d) = (at(x1, y1), at(x0, y1), at(x1, y0), at(x0, y0));
		let s = [0, 1, 2, 3].map(|i| a[i] + d[i] - b[i] - c[i]);
		if s[3] == 0 {
			return None;
		}
		let n = s[3] as f64;
		Some([s[0] as f64 / n, s[1] as f64 / n, s[2] as f64 / n])
	}
}
