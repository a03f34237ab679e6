//! Per-run results collected by the pipeline.
//!
//! Per-file failures are recorded here instead of aborting the run, so one
//! bad asset never blocks unrelated ones.

use serde::Serialize;
use std::path::PathBuf;
use webpforge_common::{Error, Step};

use super::rewriter::RewriteSummary;
use super::scanner::Candidate;

/// A per-file error, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub step: Step,
    pub path: Option<PathBuf>,
    pub message: String,
}

impl From<&Error> for FileError {
    fn from(err: &Error) -> Self {
        Self {
            step: err.step(),
            path: err.path().map(|p| p.to_path_buf()),
            message: err.to_string(),
        }
    }
}

impl From<Error> for FileError {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

/// Result of transcoding one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateStatus {
    Transcoded { output: PathBuf },
    Failed { error: FileError },
}

/// What happened to the original file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OriginalState {
    /// Deleted after the transcode succeeded.
    Removed,
    /// Left in place: the transcode failed, or deferred removal was cancelled.
    Kept,
    /// The delete itself failed; the original is orphaned.
    RemoveFailed { error: FileError },
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateOutcome {
    pub candidate: Candidate,
    #[serde(flatten)]
    pub status: CandidateStatus,
    pub original: OriginalState,
}

impl CandidateOutcome {
    pub fn is_transcoded(&self) -> bool {
        matches!(self.status, CandidateStatus::Transcoded { .. })
    }

    pub fn output(&self) -> Option<&PathBuf> {
        match &self.status {
            CandidateStatus::Transcoded { output } => Some(output),
            CandidateStatus::Failed { .. } => None,
        }
    }
}

/// Everything a pipeline run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub candidates: Vec<CandidateOutcome>,
    pub rewrite: RewriteSummary,
}

impl PipelineReport {
    pub fn transcoded(&self) -> impl Iterator<Item = &CandidateOutcome> {
        self.candidates.iter().filter(|o| o.is_transcoded())
    }

    pub fn removed_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|o| o.original == OriginalState::Removed)
            .count()
    }

    /// Transcode and rewrite failures. These fail the build.
    pub fn failures(&self) -> Vec<&FileError> {
        let transcode = self.candidates.iter().filter_map(|o| match &o.status {
            CandidateStatus::Failed { error } => Some(error),
            CandidateStatus::Transcoded { .. } => None,
        });
        transcode.chain(self.rewrite.failures.iter()).collect()
    }

    /// Originals that could not be deleted. Reported, but not fatal.
    pub fn warnings(&self) -> Vec<&FileError> {
        self.candidates
            .iter()
            .filter_map(|o| match &o.original {
                OriginalState::RemoveFailed { error } => Some(error),
                _ => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures().is_empty()
    }
}

/// A dry-run entry: what would happen to one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedCandidate {
    pub candidate: Candidate,
    pub output: PathBuf,
    /// Source files that currently reference the candidate's base name.
    pub referenced_by: Vec<PathBuf>,
}

/// Output of a dry run. Nothing on disk is modified to produce it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub candidates: Vec<PlannedCandidate>,
    pub failures: Vec<FileError>,
}
