//! Image transcoder.
//!
//! Decodes a candidate with the `image` crate and re-encodes it as lossy WebP
//! at a single global quality. Pixel data is passed through unchanged: no
//! resizing, cropping or colour management.

use image::DynamicImage;
use std::path::PathBuf;
use tracing::debug;
use webpforge_common::{Error, Result, Step};

use super::scanner::Candidate;
use super::write_atomic;
use crate::config::Config;

/// Encodes candidates into `dest_dir` as `<base_name>.<target_extension>`.
#[derive(Debug, Clone)]
pub struct Transcoder {
    dest_dir: PathBuf,
    target_extension: String,
    quality: f32,
}

impl Transcoder {
    /// Create a new `Transcoder`.
    ///
    /// # Arguments
    ///
    /// * `dest_dir` - Directory the encoded assets are written to
    /// * `target_extension` - Extension of the written files, without a dot
    /// * `quality` - WebP quality, 0-100
    pub fn new(dest_dir: impl Into<PathBuf>, target_extension: impl Into<String>, quality: u8) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            target_extension: target_extension.into(),
            quality: f32::from(quality.min(100)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.paths.dest_dir,
            &config.transcode.target_extension,
            config.transcode.quality,
        )
    }

    /// Where the transcoded asset for `candidate` is written.
    pub fn output_path(&self, candidate: &Candidate) -> PathBuf {
        self.dest_dir
            .join(format!("{}.{}", candidate.base_name, self.target_extension))
    }

    /// Transcode one candidate and return the path of the written asset.
    ///
    /// The asset is written to a temp file in the destination directory and
    /// renamed into place, so the final path never holds a partial file. The
    /// original is left untouched.
    pub fn transcode(&self, candidate: &Candidate) -> Result<PathBuf> {
        let source = &candidate.path;
        let data =
            std::fs::read(source).map_err(|e| Error::filesystem(Step::Transcode, source, e))?;
        let permissions = std::fs::metadata(source)
            .map_err(|e| Error::filesystem(Step::Transcode, source, e))?
            .permissions();

        let img = image::load_from_memory(&data).map_err(|e| Error::decode(source, e.to_string()))?;
        debug!(
            "Decoded {:?} ({}x{}, {:?})",
            source,
            img.width(),
            img.height(),
            img.color()
        );

        let encoded = encode_webp(&img, self.quality).map_err(|msg| Error::encode(source, msg))?;

        let output = self.output_path(candidate);
        write_atomic(&output, &encoded, permissions)
            .map_err(|e| Error::filesystem(Step::Transcode, &output, e))?;

        debug!(
            "Wrote {:?} ({} -> {} bytes)",
            output,
            data.len(),
            encoded.len()
        );
        Ok(output)
    }
}

/// Encode an image as lossy WebP.
///
/// Images with an alpha channel are encoded from RGBA, everything else from RGB.
pub fn encode_webp(img: &DynamicImage, quality: f32) -> std::result::Result<Vec<u8>, String> {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(format!("image has zero size ({}x{})", width, height));
    }

    let memory = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
    }
    .map_err(|e| format!("WebP encoder error: {:?}", e))?;

    Ok(memory.to_vec())
}
