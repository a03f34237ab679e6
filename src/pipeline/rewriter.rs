//! Reference rewriter.
//!
//! Walks the source tree and replaces root-relative image references such as
//! `/hero.png` with the transcoded location, e.g. `/images/hero.webp`.
//!
//! A reference matches when it is a `/`, then the exact base name, then a dot
//! and any configured image extension (case-insensitive), followed by a word
//! boundary. Every extension is matched for every base name, not only the one
//! found on disk, so `/hero.JPEG` is rewritten even if the scanned file was
//! `hero.png`.

use regex::{NoExpand, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;
use webpforge_common::paths::has_extension_in;
use webpforge_common::{Error, Result, Step};

use super::report::FileError;
use super::write_atomic;
use crate::config::Config;

/// Counters and per-file failures from one rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    pub replacements: usize,
    pub failures: Vec<FileError>,
}

#[derive(Debug)]
struct RewriteRule {
    base_name: String,
    pattern: Regex,
    replacement: String,
}

/// Rewrites references for a fixed, ordered set of base names.
#[derive(Debug)]
pub struct ReferenceRewriter {
    rules: Vec<RewriteRule>,
    text_extensions: Vec<String>,
}

impl ReferenceRewriter {
    /// Build one rule per distinct base name, in the order given.
    ///
    /// Repeated base names after the first are ignored: every rule already
    /// covers all image extensions, so a second one could never match.
    pub fn new<'a, I>(base_names: I, config: &Config) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let extensions = config
            .transcode
            .image_extensions
            .iter()
            .map(|ext| regex::escape(ext))
            .collect::<Vec<_>>()
            .join("|");

        let mut seen = HashSet::new();
        let mut rules = Vec::new();
        for base_name in base_names {
            if !seen.insert(base_name) {
                continue;
            }

            let pattern = format!(r"/{}\.(?i:{})\b", regex::escape(base_name), extensions);
            let pattern = Regex::new(&pattern).map_err(|e| {
                Error::config(format!("invalid reference pattern for {:?}: {}", base_name, e))
            })?;
            let replacement = format!(
                "/{}/{}.{}",
                config.rewrite.url_prefix, base_name, config.transcode.target_extension
            );

            rules.push(RewriteRule {
                base_name: base_name.to_string(),
                pattern,
                replacement,
            });
        }

        Ok(Self {
            rules,
            text_extensions: config.rewrite.text_extensions.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule, in order, to `content`.
    ///
    /// Returns the new text and the number of replacements. The text is
    /// borrowed when nothing matched.
    pub fn rewrite_text<'t>(&self, content: &'t str) -> (Cow<'t, str>, usize) {
        let mut text = Cow::Borrowed(content);
        let mut replacements = 0;

        for rule in &self.rules {
            let count = rule.pattern.find_iter(&text).count();
            if count == 0 {
                continue;
            }
            replacements += count;
            let replaced = rule
                .pattern
                .replace_all(&text, NoExpand(&rule.replacement))
                .into_owned();
            text = Cow::Owned(replaced);
        }

        (text, replacements)
    }

    /// Rewrite one file in place. The file is only written when something matched.
    pub fn rewrite_file(&self, path: &Path) -> Result<usize> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::rewrite(path, e.to_string()))?;

        let (rewritten, replacements) = self.rewrite_text(&content);
        if replacements == 0 {
            return Ok(0);
        }

        // Write through symlinks so the link itself stays a link
        let target =
            std::fs::canonicalize(path).map_err(|e| Error::rewrite(path, e.to_string()))?;
        let permissions = std::fs::metadata(&target)
            .map_err(|e| Error::rewrite(path, e.to_string()))?
            .permissions();
        write_atomic(&target, rewritten.as_bytes(), permissions)
            .map_err(|e| Error::rewrite(path, e.to_string()))?;

        Ok(replacements)
    }

    /// Rewrite every program-text file under `root`.
    ///
    /// Per-file failures are logged and collected; the pass always visits the
    /// whole tree.
    pub fn rewrite_tree(&self, root: &Path) -> RewriteSummary {
        let mut summary = RewriteSummary::default();
        if self.is_empty() {
            debug!("No references to rewrite");
            return summary;
        }

        info!("Rewriting references under {:?}", root);
        let mut file_failures = Vec::new();
        self.walk_text_files(root, &mut summary.failures, |path| {
            summary.files_scanned += 1;
            match self.rewrite_file(path) {
                Ok(0) => {}
                Ok(count) => {
                    debug!("Rewrote {} reference(s) in {:?}", count, path);
                    summary.files_rewritten += 1;
                    summary.replacements += count;
                }
                Err(e) => {
                    error!("{}", e);
                    file_failures.push(FileError::from(e));
                }
            }
        });
        summary.failures.extend(file_failures);

        info!(
            "Rewrite complete: {} reference(s) in {} of {} file(s), {} failure(s)",
            summary.replacements,
            summary.files_rewritten,
            summary.files_scanned,
            summary.failures.len()
        );
        summary
    }

    /// Map each base name to the files under `root` that reference it, without writing.
    pub fn find_references(&self, root: &Path) -> (BTreeMap<String, Vec<PathBuf>>, Vec<FileError>) {
        let mut references: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut failures = Vec::new();
        if self.is_empty() {
            return (references, failures);
        }

        let mut read_failures = Vec::new();
        self.walk_text_files(root, &mut failures, |path| {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    read_failures.push(FileError::from(Error::rewrite(path, e.to_string())));
                    return;
                }
            };
            for rule in &self.rules {
                if rule.pattern.is_match(&content) {
                    references
                        .entry(rule.base_name.clone())
                        .or_default()
                        .push(path.to_path_buf());
                }
            }
        });
        failures.extend(read_failures);

        (references, failures)
    }

    /// Visit every regular file under `root` whose extension is on the text allow-list.
    ///
    /// Entries are visited in file-name order. Symlinks are followed; a link
    /// back to one of its own ancestors is logged and skipped.
    fn walk_text_files<F>(&self, root: &Path, failures: &mut Vec<FileError>, mut visit: F)
    where
        F: FnMut(&Path),
    {
        if let Err(e) = std::fs::metadata(root) {
            warn!("Source tree {:?} is not readable: {}", root, e);
            failures.push(FileError::from(Error::filesystem(Step::Rewrite, root, e)));
            return;
        }

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.loop_ancestor().is_some() => {
                    warn!("Skipping symlink loop at {:?}", e.path().unwrap_or(root));
                    continue;
                }
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    warn!("Failed to walk {:?}: {}", path, e);
                    failures.push(FileError::from(Error::rewrite(path, e.to_string())));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            if !has_extension_in(entry.path(), &self.text_extensions) {
                continue;
            }
            visit(entry.path());
        }
    }
}
