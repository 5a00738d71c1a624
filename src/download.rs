use std::{
	fs,
	fs::File,
	io::{Read, Write},
	path::Path,
	time::{Duration, Instant}
};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

const REPORT_EVERY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
pub struct Progress {
	pub downloaded: u64,
	pub total: Option<u64>,
	pub secs: f64,
	pub done: bool
}

impl Progress {
	fn mib_per_sec(&self) -> f64 {
		if self.secs > 0.0 { mib(self.downloaded) / self.secs } else { 0.0 }
	}
}

fn mib(b: u64) -> f64 {
	(b as f64) / (1024.0 * 1024.0)
}

pub fn download_to_path(url: &str, dst: &Path) -> Result<()> {
	download_to_path_with_progress(url, dst, |p| log_progress(url, &p))
}

/// Stream `url` into `dst` through a `.part` file so an interrupted transfer never leaves a
/// truncated file at `dst`.
pub fn download_to_path_with_progress(url: &str, dst: &Path, mut on_progress: impl FnMut(Progress)) -> Result<()> {
	if let Some(parent) = dst.parent() {
		fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
	}

	let tmp = dst.with_extension("part");
	let _ = fs::remove_file(&tmp);

	let resp = ureq::get(url)
		.call()
		.with_context(|| format!("GET {url}"))?;

	let status = resp.status().as_u16();
	if status / 100 != 2 {
		bail!("download failed (HTTP {status}): {url}");
	}

	let total = resp
		.headers()
		.get(ureq::http::header::CONTENT_LENGTH)
		.and_then(|v| v.to_str().ok())
		.and_then(|s| s.parse::<u64>().ok());

	let mut reader = resp.into_body().into_reader();
	let mut file = File::create(&tmp).with_context(|| format!("create file: {}", tmp.display()))?;

	let mut buf = [0u8; 64 * 1024];
	let mut downloaded: u64 = 0;
	let start = Instant::now();
	let mut last = Instant::now();

	loop {
		let n = reader.read(&mut buf).context("read response body")?;
		if n == 0 {
			break;
		}
		downloaded += n as u64;
		file.write_all(&buf[..n]).context("write file")?;

		if last.elapsed() >= REPORT_EVERY {
			on_progress(Progress {
				downloaded,
				total,
				secs: start.elapsed().as_secs_f64(),
				done: false
			});
			last = Instant::now();
		}
	}
	file.flush().context("flush file")?;

	on_progress(Progress {
		downloaded,
		total,
		secs: start.elapsed().as_secs_f64(),
		done: true
	});

	fs::rename(&tmp, dst).with_context(|| format!("rename {} -> {}", tmp.display(), dst.display()))?;
	Ok(())
}

fn log_progress(url: &str, p: &Progress) {
	if p.done {
		info!(url, mib = mib(p.downloaded), secs = p.secs, "download finished");
		return;
	}
	match p.total {
		Some(t) if t > 0 => {
			let pct = (p.downloaded as f64) * 100.0 / (t as f64);
			debug!("downloading {:.1}/{:.1} MiB ({pct:.0}%) {:.1} MiB/s  {url}", mib(p.downloaded), mib(t), p.mib_per_sec());
		}
		_ => debug!("downloading {:.1} MiB {:.1} MiB/s  {url}", mib(p.downloaded), p.mib_per_sec())
	}
}
