// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use wp_core::Operation;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write-ahead log for durable operation storage
pub struct Wal {
    path: PathBuf,
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        // Count existing entries to set sequence number
        let reader = BufReader::new(File::open(path)?);
        let sequence = reader.lines().count() as u64;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence,
        })
    }

    /// Append an operation to the log
    ///
    /// An entry that fails to write or sync is cut off again, so a failed
    /// append never reappears on replay.
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        let entry = WalEntry {
            seq: self.sequence + 1,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        let offset = self.file.metadata()?.len();

        if let Err(e) = self.write_synced(&line) {
            tracing::error!(
                target_id = op.target_id(),
                seq = entry.seq,
                error = %e,
                "WAL append failed, rolling back"
            );
            self.rollback(offset);
            return Err(e.into());
        }

        self.sequence = entry.seq;
        Ok(self.sequence)
    }

    fn write_synced(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()
    }

    fn rollback(&mut self, offset: u64) {
        let result = self
            .file
            .set_len(offset)
            .and_then(|()| self.file.sync_all());
        if let Err(e) = result {
            tracing::error!(offset, error = %e, "failed to roll back WAL entry");
        }
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replace the log contents with `ops`
    ///
    /// Writes a temporary file next to the log and renames it over the
    /// original, so a crash leaves either the old or the new log in place.
    pub fn compact(&mut self, ops: &[Operation]) -> Result<(), WalError> {
        let temp_path = self.path.with_extension("wal.compact.tmp");
        {
            let mut file = File::create(&temp_path)?;
            for (i, op) in ops.iter().enumerate() {
                let entry = WalEntry {
                    seq: i as u64 + 1,
                    op: op.clone(),
                };
                writeln!(file, "{}", serde_json::to_string(&entry)?)?;
            }
            file.sync_all()?;
        }

        std::fs::rename(&temp_path, &self.path)?;

        self.file = OpenOptions::new()
            .append(true)
            .read(true)
            .open(&self.path)?;
        self.sequence = ops.len() as u64;
        Ok(())
    }

    /// Replay all operations from the log
    ///
    /// Stops at the first corrupt or unterminated entry; everything before it
    /// is returned. See [`Wal::repair`] to drop the damaged tail.
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        Ok(scan(path)?.map(|s| s.ops).unwrap_or_default())
    }

    /// Truncate the log at its first corrupt entry
    ///
    /// A crash in the middle of an append leaves a torn final line. Only call
    /// this while holding exclusive access to the log. Returns the number of
    /// bytes removed.
    pub fn repair(path: &Path) -> Result<u64, WalError> {
        let Some(scan) = scan(path)? else {
            return Ok(0);
        };
        if scan.valid_len >= scan.file_len {
            return Ok(0);
        }

        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(scan.valid_len)?;
        file.sync_all()?;

        let removed = scan.file_len - scan.valid_len;
        tracing::warn!(
            path = %path.display(),
            position = scan.valid_len,
            bytes_removed = removed,
            "WAL truncated at corruption point"
        );
        Ok(removed)
    }
}

struct Scan {
    ops: Vec<Operation>,
    /// Byte length of the intact prefix
    valid_len: u64,
    file_len: u64,
}

fn scan(path: &Path) -> Result<Option<Scan>, WalError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let file_len = file.metadata()?.len();

    let mut reader = BufReader::new(file);
    let mut ops = Vec::new();
    let mut valid_len = 0u64;
    let mut line_number = 0u64;
    let mut line = String::new();

    loop {
        line.clear();
        let read = match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(line = line_number + 1, "stopping WAL replay at invalid UTF-8");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        line_number += 1;

        if !line.ends_with('\n') {
            tracing::warn!(line = line_number, "stopping WAL replay at truncated entry");
            break;
        }
        let text = line.trim_end();
        if !text.is_empty() {
            match serde_json::from_str::<WalEntry>(text) {
                Ok(entry) => ops.push(entry.op),
                Err(e) => {
                    tracing::warn!(line = line_number, error = %e, "stopping WAL replay at corrupt entry");
                    break;
                }
            }
        }
        valid_len += read as u64;
    }

    Ok(Some(Scan {
        ops,
        valid_len,
        file_len,
    }))
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
