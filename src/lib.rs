pub mod canvas;
pub mod cli;
pub mod compose;
pub mod config;
pub mod core;
pub mod download;
pub mod error;
pub mod matting;
pub mod model;
pub mod runtime;
pub mod segment;
pub mod session;
