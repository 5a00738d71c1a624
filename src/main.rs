use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cutout_rs::{cli, config::Settings, runtime, session::ModelStore};

fn main() {
	let args = cli::Args::parse();
	init_tracing(args.verbose);

	// Keep stdout clean for piping; errors go to stderr via `anyhow`.
	if let Err(e) = run(args) {
		eprintln!("{e:#}");
		std::process::exit(1);
	}
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace"
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("warn,cutout_rs={level}")));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn run(args: cli::Args) -> Result<()> {
	let settings = Settings::from_args(&args)?;
	let opts = args.cutout_options(&settings);

	let mut store = if opts.remove_background {
		let ep = runtime::preferred_ep(args.device, args.gpu_backend)?;
		runtime::init_ort(settings.ort_dylib.as_deref())?;
		ModelStore::new(&settings.models_dir, ep, settings.allow_download)
	} else {
		ModelStore::new(&settings.models_dir, None, false)
	};
	info!(models_dir = %store.models_dir().display(), "model store ready");

	let input_path = &args.input;
	let input = fs::read(input_path).with_context(|| format!("read image: {}", input_path.display()))?;

	let result = cutout_rs::core::cutout_bytes(&input, &opts, &mut store)
		.with_context(|| format!("process image: {}", input_path.display()))?;

	let out_path = args.output_path();
	fs::write(&out_path, &result.output_png)
		.with_context(|| format!("write image: {}", out_path.display()))?;
	info!(path = %out_path.display(), width = result.width, height = result.height, "wrote cutout");
	Ok(())
}
