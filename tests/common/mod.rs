//! Shared fixture for integration tests.
//!
//! [`SiteFixture`] lays out a throwaway project in a temp dir with the
//! default `public/` and `src/` directories, and writes real PNG/JPEG files
//! generated with the `image` crate.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use webpforge::config::Config;

/// A temporary project with `public/` and `src/`.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn public(&self, name: &str) -> PathBuf {
        self.root().join("public").join(name)
    }

    pub fn image_output(&self, base_name: &str) -> PathBuf {
        self.root()
            .join("public/images")
            .join(format!("{}.webp", base_name))
    }

    pub fn src(&self, rel: &str) -> PathBuf {
        self.root().join("src").join(rel)
    }

    /// Write a valid image to `public/<name>`, encoded according to its extension.
    pub fn add_image(&self, name: &str) -> PathBuf {
        let format = match Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        };

        let path = self.public(name);
        std::fs::write(&path, sample_image(format)).unwrap();
        path
    }

    /// Write bytes that no decoder accepts to `public/<name>`.
    pub fn add_corrupt_image(&self, name: &str) -> PathBuf {
        let path = self.public(name);
        std::fs::write(&path, b"not an image at all").unwrap();
        path
    }

    pub fn add_source(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.src(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read_source(&self, rel: &str) -> String {
        std::fs::read_to_string(self.src(rel)).unwrap()
    }

    /// Make `public/` read-only so originals cannot be deleted, after creating
    /// `public/images` so transcoded assets can still be written.
    ///
    /// Returns `false`, leaving `public/` writable, when the current user can
    /// write to it anyway (for example when running as root).
    #[cfg(unix)]
    pub fn protect_public(&self) -> bool {
        use std::os::unix::fs::PermissionsExt;

        let public = self.root().join("public");
        std::fs::create_dir_all(public.join("images")).unwrap();
        std::fs::set_permissions(&public, std::fs::Permissions::from_mode(0o555)).unwrap();

        if tempfile::tempfile_in(&public).is_ok() {
            self.unprotect_public();
            return false;
        }
        true
    }

    #[cfg(unix)]
    pub fn unprotect_public(&self) {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(
            self.root().join("public"),
            std::fs::Permissions::from_mode(0o755),
        )
        .unwrap();
    }

    /// Default configuration resolved against this fixture.
    pub fn config(&self) -> Config {
        Config::default().resolved(self.root())
    }
}

pub fn sample_image(format: ImageFormat) -> Vec<u8> {
    let mut img = RgbImage::new(16, 12);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgb([(x * 16) as u8, (y * 20) as u8, 128]);
    }
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .expect("failed to encode sample image");
    buf.into_inner()
}

pub fn is_webp(path: &Path) -> bool {
    std::fs::read(path)
        .ok()
        .and_then(|bytes| image::guess_format(&bytes).ok())
        == Some(ImageFormat::WebP)
}
