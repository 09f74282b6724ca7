use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::archive::FrameKey;

/// A frame that was left without Green strain, and why
#[derive(Debug, Clone, PartialEq)]
pub struct FrameIssue {
    pub frame: FrameKey,
    pub reason: String,
}

/// Outcome of processing one archive
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveReport {
    pub path: PathBuf,
    pub frames_updated: usize,
    /// Frames without the source field
    pub frames_skipped: Vec<FrameIssue>,
    /// Frames whose source field could not be transformed
    pub frame_errors: Vec<FrameIssue>,
    /// Set when the archive could not be opened or saved
    pub failure: Option<String>,
}

impl ArchiveReport {
    pub fn new(path: &Path) -> ArchiveReport {
        ArchiveReport {
            path: path.to_path_buf(),
            frames_updated: 0,
            frames_skipped: Vec::new(),
            frame_errors: Vec::new(),
            failure: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Outcome of a whole run over several archives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub archives: Vec<ArchiveReport>,
}

impl RunReport {
    /// True if any archive could not be opened or saved
    pub fn has_failures(&self) -> bool {
        self.archives.iter().any(|a| a.is_failed())
    }

    pub fn archives_processed(&self) -> usize {
        self.archives.iter().filter(|a| !a.is_failed()).count()
    }

    pub fn frames_updated(&self) -> usize {
        self.archives.iter().map(|a| a.frames_updated).sum()
    }

    pub fn frames_skipped(&self) -> usize {
        self.archives.iter().map(|a| a.frames_skipped.len()).sum()
    }

    pub fn frame_errors(&self) -> usize {
        self.archives.iter().map(|a| a.frame_errors.len()).sum()
    }

    /// Renders the end of run summary
    pub fn summary(&self) -> String {
        let mut out = String::new();

        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "processed {} of {} archives: {} frames updated, {} skipped, {} failed",
            self.archives_processed(),
            self.archives.len(),
            self.frames_updated(),
            self.frames_skipped(),
            self.frame_errors()
        );

        for archive in &self.archives {
            let _ = match &archive.failure {
                Some(reason) => writeln!(out, "  {}: FAILED: {}", archive.path.display(), reason),
                None => writeln!(
                    out,
                    "  {}: {} frames updated",
                    archive.path.display(),
                    archive.frames_updated
                ),
            };
            for issue in &archive.frames_skipped {
                let _ = writeln!(out, "    skipped {}: {}", issue.frame, issue.reason);
            }
            for issue in &archive.frame_errors {
                let _ = writeln!(out, "    error {}: {}", issue.frame, issue.reason);
            }
        }

        out
    }
}
