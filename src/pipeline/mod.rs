//! The asset transcoding pipeline.
//!
//! A run is strictly ordered: scan the source directory, transcode each
//! candidate (removing its original on success), then rewrite references in
//! the source tree. The rewrite pass only starts once every transcode has
//! finished, since it depends on the final set of transcoded base names.

pub mod remover;
pub mod report;
pub mod rewriter;
pub mod scanner;
pub mod transcoder;

pub use remover::remove_original;
pub use report::{
    CandidateOutcome, CandidateStatus, FileError, OriginalState, PipelineReport, Plan,
    PlannedCandidate,
};
pub use rewriter::{ReferenceRewriter, RewriteSummary};
pub use scanner::{list_candidates, scan, Candidate};
pub use transcoder::{encode_webp, Transcoder};

use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use tracing::{error, info, warn};
use webpforge_common::Result;

use crate::config::{Config, RemovalPolicy};

/// Runs the pipeline for one resolved configuration.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Create a pipeline. Paths in `config` should already be resolved against the project root.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run once: scan, transcode and remove, rewrite.
    ///
    /// Only scanner errors are returned as `Err`. Per-file failures are
    /// recorded in the report.
    pub fn run(&self) -> Result<PipelineReport> {
        let candidates = scanner::scan(&self.config)?;
        info!(
            "Found {} candidate image(s) in {:?}",
            candidates.len(),
            self.config.paths.source_dir
        );
        if candidates.is_empty() {
            return Ok(PipelineReport::default());
        }
        warn_duplicate_outputs(&candidates);

        let policy = self.config.transcode.removal;
        let transcoder = Transcoder::from_config(&self.config);
        let mut outcomes =
            self.process_candidates(&transcoder, candidates, policy == RemovalPolicy::Immediate);

        let rewriter = ReferenceRewriter::new(
            outcomes
                .iter()
                .filter(|o| o.is_transcoded())
                .map(|o| o.candidate.base_name.as_str()),
            &self.config,
        )?;
        let rewrite = rewriter.rewrite_tree(&self.config.paths.text_root);

        if policy == RemovalPolicy::AfterRewrite {
            if rewrite.failures.is_empty() {
                for outcome in outcomes.iter_mut().filter(|o| o.is_transcoded()) {
                    outcome.original = remove_and_record(&outcome.candidate);
                }
            } else {
                warn!(
                    "Keeping originals: the rewrite pass reported {} failure(s)",
                    rewrite.failures.len()
                );
            }
        }

        let report = PipelineReport {
            candidates: outcomes,
            rewrite,
        };
        info!(
            "Pipeline complete: {} transcoded, {} removed, {} failure(s), {} warning(s)",
            report.transcoded().count(),
            report.removed_count(),
            report.failures().len(),
            report.warnings().len()
        );
        Ok(report)
    }

    /// Describe what `run` would do without modifying anything, not even creating `dest_dir`.
    pub fn plan(&self) -> Result<Plan> {
        let candidates = scanner::list_candidates(
            &self.config.paths.source_dir,
            &self.config.transcode.image_extensions,
        )?;
        let transcoder = Transcoder::from_config(&self.config);
        let rewriter = ReferenceRewriter::new(
            candidates.iter().map(|c| c.base_name.as_str()),
            &self.config,
        )?;
        let (references, failures) = rewriter.find_references(&self.config.paths.text_root);

        let candidates = candidates
            .into_iter()
            .map(|candidate| PlannedCandidate {
                output: transcoder.output_path(&candidate),
                referenced_by: references
                    .get(&candidate.base_name)
                    .cloned()
                    .unwrap_or_default(),
                candidate,
            })
            .collect();

        Ok(Plan {
            candidates,
            failures,
        })
    }

    /// Transcode every candidate, sequentially or on a bounded worker pool.
    ///
    /// Outcomes are returned in scan order either way.
    fn process_candidates(
        &self,
        transcoder: &Transcoder,
        candidates: Vec<Candidate>,
        remove_now: bool,
    ) -> Vec<CandidateOutcome> {
        let workers = self.config.worker_count();
        let sequential = |candidates: Vec<Candidate>| -> Vec<CandidateOutcome> {
            candidates
                .into_iter()
                .map(|c| process_candidate(transcoder, c, remove_now))
                .collect()
        };

        if workers <= 1 || candidates.len() <= 1 {
            return sequential(candidates);
        }

        let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Failed to start {} transcode workers, running sequentially: {}", workers, e);
                return sequential(candidates);
            }
        };
        info!("Transcoding on {} workers", workers);

        // Candidates sharing an output path stay on one worker, in scan order.
        let groups = group_by_base_name(candidates);
        let mut indexed: Vec<(usize, CandidateOutcome)> = pool.install(|| {
            groups
                .into_par_iter()
                .flat_map_iter(|group| {
                    group
                        .into_iter()
                        .map(|(index, c)| (index, process_candidate(transcoder, c, remove_now)))
                        .collect::<Vec<_>>()
                })
                .collect()
        });
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

fn process_candidate(transcoder: &Transcoder, candidate: Candidate, remove_now: bool) -> CandidateOutcome {
    match transcoder.transcode(&candidate) {
        Ok(output) => {
            info!("Transcoded {:?} -> {:?}", candidate.path, output);
            let original = if remove_now {
                remove_and_record(&candidate)
            } else {
                OriginalState::Kept
            };
            CandidateOutcome {
                candidate,
                status: CandidateStatus::Transcoded { output },
                original,
            }
        }
        Err(e) => {
            error!("{}", e);
            CandidateOutcome {
                candidate,
                status: CandidateStatus::Failed {
                    error: FileError::from(e),
                },
                original: OriginalState::Kept,
            }
        }
    }
}

fn remove_and_record(candidate: &Candidate) -> OriginalState {
    match remove_original(candidate) {
        Ok(()) => OriginalState::Removed,
        Err(e) => {
            warn!("{} (original left in place)", e);
            OriginalState::RemoveFailed {
                error: FileError::from(e),
            }
        }
    }
}

/// Group candidates by base name, keeping first-seen order and each candidate's scan index.
fn group_by_base_name(candidates: Vec<Candidate>) -> Vec<Vec<(usize, Candidate)>> {
    let mut groups: Vec<Vec<(usize, Candidate)>> = Vec::new();
    for (index, candidate) in candidates.into_iter().enumerate() {
        match groups
            .iter_mut()
            .find(|g| g[0].1.base_name == candidate.base_name)
        {
            Some(group) => group.push((index, candidate)),
            None => groups.push(vec![(index, candidate)]),
        }
    }
    groups
}

fn warn_duplicate_outputs(candidates: &[Candidate]) {
    for (i, candidate) in candidates.iter().enumerate() {
        if let Some(earlier) = candidates[..i]
            .iter()
            .find(|c| c.base_name == candidate.base_name)
        {
            warn!(
                "{} and {} share an output name; {} wins",
                earlier.file_name(),
                candidate.file_name(),
                candidate.file_name()
            );
        }
    }
}

/// Write `bytes` to `path` through a temp file in the same directory.
///
/// Either the whole payload lands at `path` or nothing does.
pub(crate) fn write_atomic(
    path: &Path,
    bytes: &[u8],
    permissions: std::fs::Permissions,
) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".webpforge-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    std::fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
