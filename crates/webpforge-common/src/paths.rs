//! Path utilities for matching files against extension allow-lists.
//!
//! Extensions are compared case-insensitively and without the leading dot.
//! The scanner uses these against the image allow-list and the rewriter
//! against the program-text allow-list.

use std::path::Path;

/// Default image extensions eligible for transcoding.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Default program-text extensions searched for references.
pub const DEFAULT_TEXT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// Check if a path's extension is in `allowed`, ignoring ASCII case.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use webpforge_common::paths::has_extension_in;
///
/// assert!(has_extension_in(Path::new("hero.png"), &["jpg", "png"]));
/// assert!(has_extension_in(Path::new("/public/Photo.JPG"), &["jpg"]));
/// assert!(!has_extension_in(Path::new("notes.txt"), &["jpg"]));
/// ```
pub fn has_extension_in<S: AsRef<str>>(path: &Path, allowed: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.as_ref().eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Split a file name into its stem and extension.
///
/// Returns `None` when the name has no extension or is not valid UTF-8.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use webpforge_common::paths::stem_and_extension;
///
/// assert_eq!(
///     stem_and_extension(Path::new("public/hero.banner.PNG")),
///     Some(("hero.banner".to_string(), "PNG".to_string()))
/// );
/// assert_eq!(stem_and_extension(Path::new("README")), None);
/// ```
pub fn stem_and_extension(path: &Path) -> Option<(String, String)> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    Some((stem.to_string(), ext.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension_in_defaults() {
        assert!(has_extension_in(Path::new("a.jpg"), DEFAULT_IMAGE_EXTENSIONS));
        assert!(has_extension_in(Path::new("a.jpeg"), DEFAULT_IMAGE_EXTENSIONS));
        assert!(has_extension_in(Path::new("a.png"), DEFAULT_IMAGE_EXTENSIONS));

        // Case insensitive
        assert!(has_extension_in(Path::new("a.JPG"), DEFAULT_IMAGE_EXTENSIONS));
        assert!(has_extension_in(Path::new("a.Png"), DEFAULT_IMAGE_EXTENSIONS));

        // Not candidates
        assert!(!has_extension_in(Path::new("a.webp"), DEFAULT_IMAGE_EXTENSIONS));
        assert!(!has_extension_in(Path::new("a.gif"), DEFAULT_IMAGE_EXTENSIONS));
        assert!(!has_extension_in(Path::new("a.jsx"), DEFAULT_IMAGE_EXTENSIONS));

        assert!(has_extension_in(Path::new("src/App.jsx"), DEFAULT_TEXT_EXTENSIONS));
        assert!(has_extension_in(Path::new("src/main.TS"), DEFAULT_TEXT_EXTENSIONS));
        assert!(!has_extension_in(Path::new("src/index.css"), DEFAULT_TEXT_EXTENSIONS));
    }

    #[test]
    fn test_has_extension_in_owned_list() {
        let allowed = vec!["svelte".to_string(), "vue".to_string()];
        assert!(has_extension_in(Path::new("App.svelte"), &allowed));
        assert!(!has_extension_in(Path::new("App.jsx"), &allowed));
    }

    #[test]
    fn test_edge_cases() {
        // Empty path
        assert!(!has_extension_in(Path::new(""), DEFAULT_IMAGE_EXTENSIONS));

        // No extension
        assert!(!has_extension_in(Path::new("jpg"), DEFAULT_IMAGE_EXTENSIONS));

        // Hidden file with extension
        assert!(has_extension_in(Path::new(".hidden.png"), DEFAULT_IMAGE_EXTENSIONS));

        // Multiple dots: only the last one counts
        assert!(has_extension_in(Path::new("photo.bg.jpg"), DEFAULT_IMAGE_EXTENSIONS));
        assert!(!has_extension_in(Path::new("photo.jpg.bak"), DEFAULT_IMAGE_EXTENSIONS));
    }

    #[test]
    fn test_stem_and_extension() {
        assert_eq!(
            stem_and_extension(Path::new("Photo.JPG")),
            Some(("Photo".to_string(), "JPG".to_string()))
        );
        assert_eq!(
            stem_and_extension(Path::new("/public/photo-background.jpg")),
            Some(("photo-background".to_string(), "jpg".to_string()))
        );
        assert_eq!(stem_and_extension(Path::new("Makefile")), None);
    }
}
