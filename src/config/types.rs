use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use webpforge_common::paths::{DEFAULT_IMAGE_EXTENSIONS, DEFAULT_TEXT_EXTENSIONS};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub transcode: TranscodeConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,
}

impl Config {
    /// Join every relative directory onto `root`. Absolute paths are kept as-is.
    pub fn resolved(mut self, root: &Path) -> Self {
        self.paths.source_dir = root.join(&self.paths.source_dir);
        self.paths.dest_dir = root.join(&self.paths.dest_dir);
        self.paths.text_root = root.join(&self.paths.text_root);
        self
    }

    /// Number of transcoder threads, with `0` meaning one per CPU.
    pub fn worker_count(&self) -> usize {
        match self.transcode.workers {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory scanned (top level only) for candidate images
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory the transcoded assets are written to
    #[serde(default = "default_dest_dir")]
    pub dest_dir: PathBuf,

    /// Root of the source tree searched for references
    #[serde(default = "default_text_root")]
    pub text_root: PathBuf,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_dest_dir() -> PathBuf {
    PathBuf::from("public/images")
}
fn default_text_root() -> PathBuf {
    PathBuf::from("src")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            dest_dir: default_dest_dir(),
            text_root: default_text_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    /// Extension of the transcoded assets (default: "webp")
    #[serde(default = "default_target_extension")]
    pub target_extension: String,

    /// WebP encode quality, 0-100 (default: 80)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Extensions picked up by the scanner, case-insensitive
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Transcoder threads; 0 = one per CPU (default: 1)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// When originals are deleted
    #[serde(default)]
    pub removal: RemovalPolicy,
}

fn default_target_extension() -> String {
    "webp".to_string()
}
fn default_quality() -> u8 {
    80
}
fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}
fn default_workers() -> usize {
    1
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            target_extension: default_target_extension(),
            quality: default_quality(),
            image_extensions: default_image_extensions(),
            workers: default_workers(),
            removal: RemovalPolicy::default(),
        }
    }
}

/// When the original of a successfully transcoded candidate is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Right after that candidate's own transcode succeeds.
    #[default]
    Immediate,
    /// Only once the rewrite pass has finished without failures.
    AfterRewrite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewriteConfig {
    /// Path segment inserted in front of rewritten references (default: "images")
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    /// Extensions of files searched for references, case-insensitive
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,
}

fn default_url_prefix() -> String {
    "images".to_string()
}
fn default_text_extensions() -> Vec<String> {
    DEFAULT_TEXT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            url_prefix: default_url_prefix(),
            text_extensions: default_text_extensions(),
        }
    }
}
