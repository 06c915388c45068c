//! JSONL event reader - sequential reader for replay

use crate::command::JournalRecord;
use crate::error::EventError;
use crate::event::EngineEvent;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Sequential journal reader for replay
pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    /// Create a new reader from a directory
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                let file_path = entry.path();
                if file_path.extension().map_or(false, |ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        files.sort();

        Ok(Self { files })
    }

    /// Read all records from all files in order
    ///
    /// Sequence numbers must run 1, 2, 3, ... without gaps.
    pub fn read_all(&self) -> Result<Vec<JournalRecord>, EventError> {
        let mut records: Vec<JournalRecord> = Vec::new();

        for file_path in &self.files {
            let file = File::open(file_path)?;
            let reader = BufReader::new(file);

            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: JournalRecord = serde_json::from_str(&line).map_err(|e| {
                    EventError::InvalidFile(format!(
                        "{}:{}: {}",
                        file_path.display(),
                        line_no + 1,
                        e
                    ))
                })?;

                let expected = records.last().map_or(1, |r| r.sequence + 1);
                if record.sequence != expected {
                    return Err(EventError::SequenceGap {
                        expected,
                        actual: record.sequence,
                    });
                }
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Get the last sequence number
    pub fn last_sequence(&self) -> Result<Option<u64>, EventError> {
        Ok(self.read_all()?.last().map(|r| r.sequence))
    }

    /// Events of the records whose sequence lies in `from..=to`,
    /// paired with the record sequence
    pub fn events_in_range(&self, from: u64, to: u64) -> Result<Vec<(u64, EngineEvent)>, EventError> {
        let records = self.read_all()?;

        Ok(records
            .into_iter()
            .filter(|r| r.sequence >= from && r.sequence <= to)
            .flat_map(|r| {
                let sequence = r.sequence;
                r.events.into_iter().map(move |e| (sequence, e))
            })
            .collect())
    }

    /// All emitted events in journal order
    pub fn all_events(&self) -> Result<Vec<EngineEvent>, EventError> {
        Ok(self
            .read_all()?
            .into_iter()
            .flat_map(|r| r.events)
            .collect())
    }

    /// Count total records across all files
    pub fn count(&self) -> Result<usize, EventError> {
        let mut count = 0;

        for file_path in &self.files {
            let file = File::open(file_path)?;
            let reader = BufReader::new(file);

            for line in reader.lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    count += 1;
                }
            }
        }

        Ok(count)
    }
}
