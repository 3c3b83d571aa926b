//! External Tool Integrations

pub mod ffmpeg;
pub mod tmdb;

pub use ffmpeg::{FfmpegRunner, FfprobeAdapter};
pub use tmdb::TmdbClient;
