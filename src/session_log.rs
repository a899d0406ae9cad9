use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::session::SessionRecord;

#[derive(Debug, Serialize)]
struct Row<'a> {
    date: String,
    subject: &'a str,
    difficulty: String,
    duration_secs: u64,
    elapsed_secs: u64,
    attempted: u32,
    correct: u32,
    accuracy: u32,
}

/// Append-only CSV history of finished timed sessions.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &SessionRecord) -> Result<(), csv::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Header only for a new file
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        writer.serialize(Row {
            date: record.finished_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            subject: record.subject.name(),
            difficulty: record.difficulty.to_string(),
            duration_secs: record.duration_secs,
            elapsed_secs: record.elapsed_secs,
            attempted: record.attempted,
            correct: record.correct,
            accuracy: record.accuracy,
        })?;
        writer.flush()?;
        Ok(())
    }
}
