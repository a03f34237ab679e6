//! Removal of originals after a successful transcode.

use tracing::debug;
use webpforge_common::{Error, Result, Step};

use super::scanner::Candidate;

/// Delete the original file of a transcoded candidate.
///
/// Callers must only invoke this once the transcoder has confirmed a complete
/// write. There is no trash or recovery.
pub fn remove_original(candidate: &Candidate) -> Result<()> {
    std::fs::remove_file(&candidate.path)
        .map_err(|e| Error::filesystem(Step::Remove, &candidate.path, e))?;
    debug!("Removed original {:?}", candidate.path);
    Ok(())
}
