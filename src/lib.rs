//! Webpforge - build-time image asset pipeline
//!
//! Transcodes the raster images of a static site to WebP, removes the
//! originals and rewrites root-relative references in the source tree. The
//! library crate exposes the pipeline for the binary and for integration tests.

pub mod config;
pub mod pipeline;
