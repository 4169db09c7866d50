use std::path::{Path, PathBuf};

/// Result of saving one image reference. `index` is the reference's position
/// in the generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved {
        index: usize,
        source: String,
        path: PathBuf,
        bytes: u64,
    },
    Failed {
        index: usize,
        source: String,
        reason: String,
        status: Option<u16>,
    },
}

impl DownloadOutcome {
    pub fn index(&self) -> usize {
        match self {
            DownloadOutcome::Saved { index, .. } | DownloadOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            DownloadOutcome::Saved { source, .. } | DownloadOutcome::Failed { source, .. } => {
                source
            }
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DownloadOutcome::Saved { path, .. } => Some(path),
            DownloadOutcome::Failed { .. } => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DownloadOutcome::Failed { status, .. } => *status,
            DownloadOutcome::Saved { .. } => None,
        }
    }
}
