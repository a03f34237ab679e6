//! Common error types used throughout webpforge.
//!
//! Every error names the pipeline step it came from so the build output can
//! report, per file, which step failed and why.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Pipeline step an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Loading or validating configuration.
    Config,
    /// Listing the source directory.
    Scan,
    /// Decoding, encoding or writing a transcoded asset.
    Transcode,
    /// Deleting an original after a successful transcode.
    Remove,
    /// Rewriting references in the source tree.
    Rewrite,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Scan => "scan",
            Self::Transcode => "transcode",
            Self::Remove => "remove",
            Self::Rewrite => "rewrite",
        };
        f.write_str(name)
    }
}

/// Common error type for webpforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A filesystem operation failed (missing directory, permission denied, delete failure).
    #[error("{step}: filesystem error at {}: {source}", path.display())]
    Filesystem {
        step: Step,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source image could not be decoded.
    #[error("transcode: failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// The decoded image could not be encoded into the target format.
    #[error("transcode: failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    /// A source text file could not be read, decoded as UTF-8, or written back.
    #[error("rewrite: failed to rewrite {}: {message}", path.display())]
    Rewrite { path: PathBuf, message: String },

    /// The configuration is invalid.
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Create a new Filesystem error for the given step.
    pub fn filesystem<P: AsRef<Path>>(step: Step, path: P, source: std::io::Error) -> Self {
        Self::Filesystem {
            step,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new Decode error.
    pub fn decode<P: AsRef<Path>, S: Into<String>>(path: P, msg: S) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Create a new Encode error.
    pub fn encode<P: AsRef<Path>, S: Into<String>>(path: P, msg: S) -> Self {
        Self::Encode {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Create a new Rewrite error.
    pub fn rewrite<P: AsRef<Path>, S: Into<String>>(path: P, msg: S) -> Self {
        Self::Rewrite {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// The pipeline step this error belongs to.
    pub fn step(&self) -> Step {
        match self {
            Self::Filesystem { step, .. } => *step,
            Self::Decode { .. } | Self::Encode { .. } => Step::Transcode,
            Self::Rewrite { .. } => Step::Rewrite,
            Self::Config(_) => Step::Config,
        }
    }

    /// The file or directory the error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Filesystem { path, .. }
            | Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::Rewrite { path, .. } => Some(path),
            Self::Config(_) => None,
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
