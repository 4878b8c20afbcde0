// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit log of operation events
//!
//! One JSON object per line, each tagged with a sequence number. Appends are
//! fsynced before returning.
//!
//! Several processes may append to the same file. Callers serialize appends
//! (the file store holds its directory lock); a writer that notices the file
//! grew under it re-reads the sequence from the final line only.

use eb_core::OperationEvent;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

/// Bytes read from the end of the file per attempt to find the last entry
const TAIL_CHUNK: u64 = 4096;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("unreadable last entry: {0}")]
    Tail(#[source] serde_json::Error),
}

/// Writer half of the audit log
pub struct Wal {
    file: File,
    sequence: u64,
    /// File length after our last write, to detect appends by other writers
    len: u64,
}

impl Wal {
    /// Open or create a WAL at the given path
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;
        let mut wal = Self {
            file,
            sequence: 0,
            len: 0,
        };
        wal.catch_up()?;
        Ok(wal)
    }

    /// Pick up entries appended since our last write
    fn catch_up(&mut self) -> Result<(), WalError> {
        let len = self.file.metadata()?.len();
        if len != self.len {
            self.sequence = last_sequence(&mut self.file, len)?;
            self.len = len;
        }
        Ok(())
    }

    /// Append an event, returning its sequence number
    pub fn append(&mut self, event: &OperationEvent) -> Result<u64, WalError> {
        self.catch_up()?;
        let entry = WalEntry {
            seq: self.sequence + 1,
            event: event.clone(),
        };
        let line = serde_json::to_string(&entry).map_err(|source| WalError::Json {
            line: entry.seq as usize,
            source,
        })?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        self.sequence = entry.seq;
        self.len += line.len() as u64 + 1;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay all events from the log
    pub fn replay(path: &Path) -> Result<Vec<OperationEvent>, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: WalEntry = serde_json::from_str(&line).map_err(|source| WalError::Json {
                line: index + 1,
                source,
            })?;
            events.push(entry.event);
        }

        Ok(events)
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    event: OperationEvent,
}

#[derive(serde::Deserialize)]
struct WalSeq {
    seq: u64,
}

/// Sequence number of the final entry, scanning backwards from `len`
fn last_sequence(file: &mut File, len: u64) -> Result<u64, WalError> {
    let parse = |line: &str| {
        serde_json::from_str::<WalSeq>(line)
            .map(|entry| entry.seq)
            .map_err(WalError::Tail)
    };

    let mut window = TAIL_CHUNK.min(len);
    loop {
        file.seek(SeekFrom::Start(len - window))?;
        let mut buf = Vec::with_capacity(window as usize);
        Read::by_ref(&mut *file).take(window).read_to_end(&mut buf)?;
        let text = String::from_utf8_lossy(&buf);
        let text = text.trim_end();

        if let Some(pos) = text.rfind('\n') {
            return parse(&text[pos + 1..]);
        }
        if window == len {
            return if text.trim().is_empty() { Ok(0) } else { parse(text) };
        }
        window = (window * 2).min(len);
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
