mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
///
/// When `root` is given, `webpforge.toml` and `.webpforge.toml` inside it are
/// tried before the current directory.
pub fn load_config_or_default(custom_path: Option<&Path>, root: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    if let Some(path) = find_default_config(root) {
        tracing::debug!("Using config file: {:?}", path);
        return load_config(&path);
    }

    Ok(Config::default())
}

/// First existing config file among the default locations.
pub fn find_default_config(root: Option<&Path>) -> Option<PathBuf> {
    const FILE_NAMES: [&str; 2] = ["webpforge.toml", ".webpforge.toml"];

    let in_root = root
        .into_iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)));
    let in_cwd = FILE_NAMES.into_iter().map(PathBuf::from);
    let user = std::iter::once(PathBuf::from(
        shellexpand::tilde("~/.config/webpforge/config.toml").into_owned(),
    ));

    in_root.chain(in_cwd).chain(user).find(|path| path.is_file())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> webpforge_common::Result<()> {
    use webpforge_common::Error;

    let transcode = &config.transcode;
    if transcode.quality > 100 {
        return Err(Error::config(format!(
            "quality must be between 0 and 100, got {}",
            transcode.quality
        )));
    }

    let target = transcode.target_extension.as_str();
    if target.is_empty() || target.contains(['.', '/', '\\']) {
        return Err(Error::config(format!(
            "target_extension must be a bare extension, got {:?}",
            target
        )));
    }

    if transcode.image_extensions.is_empty() {
        return Err(Error::config("image_extensions cannot be empty"));
    }
    if transcode
        .image_extensions
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(target))
    {
        return Err(Error::config(format!(
            "target_extension {:?} cannot also be a source image extension",
            target
        )));
    }

    if config.rewrite.text_extensions.is_empty() {
        return Err(Error::config("text_extensions cannot be empty"));
    }

    let prefix = config.rewrite.url_prefix.as_str();
    if prefix.is_empty() || prefix.starts_with('/') || prefix.ends_with('/') {
        return Err(Error::config(format!(
            "url_prefix must be a non-empty path that does not start or end with '/', got {:?}",
            prefix
        )));
    }

    if config.paths.source_dir == config.paths.dest_dir {
        tracing::warn!(
            "source_dir and dest_dir are the same directory: {:?}",
            config.paths.source_dir
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.paths.source_dir, PathBuf::from("public"));
        assert_eq!(config.paths.dest_dir, PathBuf::from("public/images"));
        assert_eq!(config.paths.text_root, PathBuf::from("src"));
        assert_eq!(config.transcode.target_extension, "webp");
        assert_eq!(config.transcode.quality, 80);
        assert_eq!(config.transcode.image_extensions, ["jpg", "jpeg", "png"]);
        assert_eq!(config.transcode.workers, 1);
        assert_eq!(config.transcode.removal, RemovalPolicy::Immediate);
        assert_eq!(config.rewrite.url_prefix, "images");
        assert_eq!(config.rewrite.text_extensions, ["js", "jsx", "ts", "tsx"]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
[paths]
source_dir = "static"

[transcode]
quality = 65
removal = "after_rewrite"
"#,
        )
        .unwrap();

        assert_eq!(config.paths.source_dir, PathBuf::from("static"));
        assert_eq!(config.paths.dest_dir, PathBuf::from("public/images"));
        assert_eq!(config.transcode.quality, 65);
        assert_eq!(config.transcode.removal, RemovalPolicy::AfterRewrite);
        assert_eq!(config.transcode.target_extension, "webp");
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webpforge.toml");
        std::fs::write(
            &path,
            r#"
[rewrite]
url_prefix = "assets/img"
text_extensions = ["svelte"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.rewrite.url_prefix, "assets/img");
        assert_eq!(config.rewrite.text_extensions, ["svelte"]);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webpforge.toml");
        std::fs::write(&path, "[transcode]\nquality = 101\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("quality"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/webpforge.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_find_default_config_prefers_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_default_config(Some(dir.path())).map_or(true, |p| !p.starts_with(dir.path())));

        std::fs::write(dir.path().join(".webpforge.toml"), "").unwrap();
        assert_eq!(
            find_default_config(Some(dir.path())),
            Some(dir.path().join(".webpforge.toml"))
        );

        std::fs::write(dir.path().join("webpforge.toml"), "[transcode]\nquality = 55\n").unwrap();
        assert_eq!(
            find_default_config(Some(dir.path())),
            Some(dir.path().join("webpforge.toml"))
        );

        let config = load_config_or_default(None, Some(dir.path())).unwrap();
        assert_eq!(config.transcode.quality, 55);
    }

    #[test]
    fn test_validate_target_extension() {
        let mut config = Config::default();
        config.transcode.target_extension = ".webp".to_string();
        assert!(validate_config(&config).is_err());

        config.transcode.target_extension = String::new();
        assert!(validate_config(&config).is_err());

        config.transcode.target_extension = "PNG".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_extension_lists() {
        let mut config = Config::default();
        config.transcode.image_extensions.clear();
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.rewrite.text_extensions.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_url_prefix() {
        let mut config = Config::default();
        config.rewrite.url_prefix = "/images".to_string();
        assert!(validate_config(&config).is_err());

        config.rewrite.url_prefix = "images/".to_string();
        assert!(validate_config(&config).is_err());

        // An empty prefix would produce protocol-relative `//name.webp` URLs
        config.rewrite.url_prefix = String::new();
        assert!(validate_config(&config).is_err());

        config.rewrite.url_prefix = "static/images".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_resolved_paths() {
        let mut config = Config::default();
        config.paths.text_root = PathBuf::from("/abs/src");
        let config = config.resolved(Path::new("/project"));

        assert_eq!(config.paths.source_dir, PathBuf::from("/project/public"));
        assert_eq!(config.paths.dest_dir, PathBuf::from("/project/public/images"));
        assert_eq!(config.paths.text_root, PathBuf::from("/abs/src"));
    }

    #[test]
    fn test_worker_count() {
        let mut config = Config::default();
        assert_eq!(config.worker_count(), 1);

        config.transcode.workers = 4;
        assert_eq!(config.worker_count(), 4);

        config.transcode.workers = 0;
        assert!(config.worker_count() >= 1);
    }
}
