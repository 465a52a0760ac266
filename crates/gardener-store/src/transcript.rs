//! Append-only markdown transcript of every prompt/response exchange

use chrono::Local;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

/// Human-readable record of what was asked and what came back.
///
/// Writes are fail-soft: a full disk or locked file costs the transcript
/// entry, never the loop.
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, actor: &str, input: &str, output: &str) {
        if let Err(e) = self.try_append(actor, input, output) {
            warn!("Transcript write failed: {}", e);
        }
    }

    fn try_append(&self, actor: &str, input: &str, output: &str) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "\n## {} - {}", ts, actor)?;
        writeln!(file, "**Input/Prompt:**\n```\n{}\n```", input.trim())?;
        writeln!(file, "**Output/Response:**\n```\n{}\n```", output.trim())?;
        writeln!(file, "{}", "-".repeat(40))?;
        Ok(())
    }
}
