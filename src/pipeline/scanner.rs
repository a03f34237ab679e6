//! Directory scanner.
//!
//! Lists the top level of the source asset directory and returns every
//! regular file whose extension is on the image allow-list.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use webpforge_common::paths::{has_extension_in, stem_and_extension};
use webpforge_common::{Error, Result, Step};

use crate::config::Config;

/// A raster image eligible for transcoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Full path of the original file.
    pub path: PathBuf,
    /// File name without its extension.
    pub base_name: String,
    /// Extension as found on disk, case preserved.
    pub extension: String,
}

impl Candidate {
    /// Build a candidate from a path, or `None` if the name has no UTF-8 stem and extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let (base_name, extension) = stem_and_extension(path)?;
        Some(Self {
            path: path.to_path_buf(),
            base_name,
            extension,
        })
    }

    /// Original file name, e.g. `Photo.JPG`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.base_name, self.extension)
    }
}

/// List candidates, then make sure the destination directory exists.
///
/// The source directory is listed first so a missing one is reported
/// instead of being created as a parent of the destination.
pub fn scan(config: &Config) -> Result<Vec<Candidate>> {
    let candidates =
        list_candidates(&config.paths.source_dir, &config.transcode.image_extensions)?;

    let dest_dir = &config.paths.dest_dir;
    std::fs::create_dir_all(dest_dir).map_err(|e| Error::filesystem(Step::Scan, dest_dir, e))?;

    Ok(candidates)
}

/// List candidates in `source_dir` without touching the filesystem.
///
/// Only the top level is read. The result is sorted by file name. A missing
/// or unreadable `source_dir` is an error; an entry that cannot be resolved,
/// such as a dangling symlink, is logged and skipped.
pub fn list_candidates<S: AsRef<str>>(source_dir: &Path, allowed: &[S]) -> Result<Vec<Candidate>> {
    debug!("Scanning directory: {:?}", source_dir);
    let mut candidates = Vec::new();

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            // The source directory itself is unreadable
            Err(e) if e.depth() == 0 => {
                let path = e.path().unwrap_or(source_dir).to_path_buf();
                return Err(Error::filesystem(Step::Scan, path, e.into()));
            }
            Err(e) => {
                warn!(
                    "Skipping unreadable entry {:?}: {}",
                    e.path().unwrap_or(source_dir),
                    e
                );
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !has_extension_in(path, allowed) {
            continue;
        }

        match Candidate::from_path(path) {
            Some(candidate) => {
                debug!("Found candidate: {:?}", path);
                candidates.push(candidate);
            }
            None => warn!("Skipping image with a non UTF-8 name: {:?}", path),
        }
    }

    Ok(candidates)
}
