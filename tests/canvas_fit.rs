use cutout_rs::canvas::{FitMode, fit_to_canvas};
use image::{DynamicImage, Rgba, RgbaImage};

fn solid(w: u32, h: u32) -> DynamicImage {
	DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([30, 160, 90, 255])))
}

/// First and last column (or row) of the canvas holding a pixel with alpha above `min_alpha`.
fn alpha_span(img: &RgbaImage, horizontal: bool, min_alpha: u8) -> Option<(u32, u32)> {
	let (outer, inner) = if horizontal { (img.width(), img.height()) } else { (img.height(), img.width()) };
	let hit = |o: u32| {
		(0..inner).any(|i| {
			let (x, y) = if horizontal { (o, i) } else { (i, o) };
			img.get_pixel(x, y)[3] > min_alpha
		})
	};
	let first = (0..outer).find(|&o| hit(o))?;
	let last = (0..outer).rev().find(|&o| hit(o))?;
	Some((first, last))
}

fn opaque_span(img: &RgbaImage, horizontal: bool) -> Option<(u32, u32)> {
	alpha_span(img, horizontal, 0)
}

#[test]
fn tall_source_contained_in_square_is_centred_horizontally() {
	let out = fit_to_canvas(&solid(100, 200), Some(200), Some(200), FitMode::Contain, 0).unwrap();

	assert_eq!(out.dimensions(), (200, 200));
	assert_eq!(opaque_span(&out, true), Some((50, 149)));
	assert_eq!(opaque_span(&out, false), Some((0, 199)));
	assert_eq!(out.get_pixel(100, 100).0, [30, 160, 90, 255]);
	assert_eq!(out.get_pixel(10, 100).0, [0, 0, 0, 0]);
}

#[test]
fn fully_transparent_source_stays_transparent() {
	let src = DynamicImage::ImageRgba8(RgbaImage::new(100, 200));
	let out = fit_to_canvas(&src, Some(200), Some(200), FitMode::Contain, 0).unwrap();
	assert_eq!(out.dimensions(), (200, 200));
	assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn tall_source_covering_square_crops_rows_50_to_149() {
	// black bands on source rows 0..50 and 150..200, white in between. After the 2x upscale the
	// band edges sit between resized rows 99/100 and 299/300, so only a crop starting at exactly
	// resized row 100 puts the bright side of both edges on output rows 0 and 199.
	let src = RgbaImage::from_fn(100, 200, |_, y| match y {
		50..150 => Rgba([255, 255, 255, 255]),
		_ => Rgba([0, 0, 0, 255])
	});
	let out = fit_to_canvas(&DynamicImage::ImageRgba8(src), Some(200), Some(200), FitMode::Cover, 0).unwrap();

	assert_eq!(out.dimensions(), (200, 200));
	assert!(out.pixels().all(|p| p[3] > 0), "cover must fill the canvas");

	let top = out.get_pixel(100, 0)[0];
	let bottom = out.get_pixel(100, 199)[0];
	assert!(top > 127 && top < 250, "row 0 should straddle the upper band edge: {top}");
	assert!(bottom > 127 && bottom < 250, "row 199 should straddle the lower band edge: {bottom}");
	assert!(out.get_pixel(100, 100)[0] >= 250);
	// symmetric crop
	assert!(top.abs_diff(bottom) <= 1, "{top} vs {bottom}");
}

#[test]
fn padding_shrinks_the_subject_inside_the_box() {
	let out = fit_to_canvas(&solid(100, 100), Some(100), Some(100), FitMode::Contain, 10).unwrap();

	assert_eq!(out.dimensions(), (100, 100));
	assert_eq!(out.get_pixel(0, 0)[3], 0);
	assert_eq!(out.get_pixel(99, 99)[3], 0);
	assert!(out.get_pixel(50, 50)[3] >= 250);

	// 120x120 padded source scaled to 100x100 and placed at (0, 0): the 10 px border shrinks to
	// ~8.3 px on every side, so the half-opaque boundary lands on columns/rows 8 and 91.
	assert_eq!(alpha_span(&out, true, 127), Some((8, 91)));
	assert_eq!(alpha_span(&out, false, 127), Some((8, 91)));
}

#[test]
fn missing_width_returns_input_unchanged() {
	let src = solid(33, 17);
	let out = fit_to_canvas(&src, None, Some(200), FitMode::Contain, 10).unwrap();
	assert_eq!(out, src.to_rgba8());
}

#[test]
fn contain_never_crops() {
	let out = fit_to_canvas(&solid(300, 100), Some(50), Some(50), FitMode::Contain, 0).unwrap();

	assert_eq!(out.dimensions(), (50, 50));
	// 300x100 scaled by 1/6 -> 50x17, centred at y = 16
	let (top, bottom) = opaque_span(&out, false).unwrap();
	assert!(top >= 16 && bottom <= 32, "rows {top}..={bottom}");
	assert_eq!(opaque_span(&out, true), Some((0, 49)));
}

#[test]
fn cover_fills_wide_targets_from_square_sources() {
	let out = fit_to_canvas(&solid(64, 64), Some(160), Some(90), FitMode::Cover, 0).unwrap();
	assert_eq!(out.dimensions(), (160, 90));
	assert!(out.pixels().all(|p| p[3] > 0));
}

#[test]
fn output_size_is_exact_for_awkward_ratios() {
	let cases = [(1, 1, 7, 300), (999, 3, 17, 17), (5, 1000, 64, 48), (37, 59, 1, 1)];
	for (sw, sh, tw, th) in cases {
		for mode in [FitMode::Contain, FitMode::Cover] {
			let out = fit_to_canvas(&solid(sw, sh), Some(tw), Some(th), mode, 0).unwrap();
			assert_eq!(out.dimensions(), (tw, th), "{sw}x{sh} -> {tw}x{th} ({mode})");
		}
	}
}

#[test]
fn second_fit_to_the_same_box_is_a_no_op() {
	let src = RgbaImage::from_fn(90, 40, |x, y| Rgba([(x * 2) as u8, (y * 5) as u8, 77, ((x + y) * 3 % 256) as u8]));
	let src = DynamicImage::ImageRgba8(src);

	for mode in [FitMode::Contain, FitMode::Cover] {
		let once = fit_to_canvas(&src, Some(64), Some(48), mode, 0).unwrap();
		let twice = fit_to_canvas(&DynamicImage::ImageRgba8(once.clone()), Some(64), Some(48), mode, 0).unwrap();
		assert_eq!(once, twice, "{mode}");
	}
}

#[test]
fn rgb_input_is_treated_as_opaque() {
	let src = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(10, 10, image::Rgb([1, 2, 3])));
	let out = fit_to_canvas(&src, Some(20), Some(10), FitMode::Contain, 0).unwrap();
	assert_eq!(out.get_pixel(10, 5).0, [1, 2, 3, 255]);
	assert_eq!(out.get_pixel(0, 5).0, [0, 0, 0, 0]);
}
