//! voicegate: HTTP speaker verification service.
//!
//! Wraps the [`voicegate_voiceprint`] engine with an axum API, a directory
//! registry of enrolled speakers and an `ffmpeg` transcoder for compressed
//! uploads.

pub mod config;
pub mod error;
pub mod registry;
pub mod server;
pub mod transcode;
pub mod upload;

pub use config::Config;
pub use error::ApiError;
pub use server::{AppState, create_router};
