// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed store shared by every process on a host
//!
//! Layout under the root:
//!
//! ```text
//! operations/<id>.json   one record per operation
//! leases/<key>.json      one lease per operation
//! events.wal             append-only audit log
//! .lock                  advisory lock held around every read-modify-write
//! ```
//!
//! Records are written to a temporary file and renamed into place, so a
//! crash mid-write leaves the previous copy intact.

use crate::store::{apply_update, sort_due};
use crate::wal::Wal;
use crate::{LeaseStore, OperationStore, StoreError};
use chrono::{DateTime, Utc};
use eb_core::{
    Clock, HolderId, InstanceId, Lease, LeaseDecision, LeaseInput, Operation, OperationEvent,
    OperationId, SystemClock,
};
use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const OPERATIONS_DIR: &str = "operations";
const LEASES_DIR: &str = "leases";
const EVENTS_FILE: &str = "events.wal";
const LOCK_FILE: &str = ".lock";

/// Operation and lease store persisted as JSON files
#[derive(Clone)]
pub struct FileStore<C: Clock = SystemClock> {
    root: PathBuf,
    clock: C,
    events: Arc<Mutex<Wal>>,
}

impl FileStore<SystemClock> {
    /// Open a store at `root`, creating the directory layout if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_clock(root, SystemClock)
    }
}

impl<C: Clock> FileStore<C> {
    pub fn open_with_clock(root: impl Into<PathBuf>, clock: C) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(OPERATIONS_DIR))?;
        fs::create_dir_all(root.join(LEASES_DIR))?;
        let events = Arc::new(Mutex::new(Wal::open(&root.join(EVENTS_FILE))?));
        Ok(Self {
            root,
            clock,
            events,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn operation_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        check_key(id)?;
        Ok(self.root.join(OPERATIONS_DIR).join(format!("{}.json", id)))
    }

    fn lease_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(self.root.join(LEASES_DIR).join(format!("{}.json", key)))
    }

    /// Run `f` while holding the store-wide exclusive lock
    fn locked<T>(&self, f: impl FnOnce() -> Result<T, StoreError>) -> Result<T, StoreError> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.root.join(LOCK_FILE))?;
        lock.lock_exclusive()?;
        let result = f();
        // Dropping the handle also releases the lock
        let _ = lock.unlock();
        result
    }

    fn read_operations(&self) -> Result<Vec<Operation>, StoreError> {
        let dir = self.root.join(OPERATIONS_DIR);
        let mut ops = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(op) = read_json::<Operation>(&path)? {
                ops.push(op);
            }
        }
        Ok(ops)
    }

    fn apply_lease(&self, key: &str, input: LeaseInput) -> Result<LeaseDecision, StoreError> {
        let path = self.lease_path(key)?;
        self.locked(|| {
            let current = read_json::<Lease>(&path)?.unwrap_or_else(|| Lease::new(key));
            let (next, decision) = current.transition(input, self.clock.now());
            match &decision {
                LeaseDecision::Denied { .. } | LeaseDecision::Ignored => {}
                LeaseDecision::Released => remove_file(&path)?,
                LeaseDecision::Reclaimed { previous } => {
                    tracing::warn!(key, previous = %previous, "reclaimed expired lease");
                    write_json(&path, &next)?;
                }
                _ => write_json(&path, &next)?,
            }
            Ok(decision)
        })
    }
}

impl<C: Clock> OperationStore for FileStore<C> {
    fn get(&self, id: &OperationId) -> Result<Operation, StoreError> {
        let path = self.operation_path(id.as_str())?;
        read_json(&path)?.ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn insert(&self, op: &Operation) -> Result<(), StoreError> {
        let path = self.operation_path(op.id.as_str())?;
        self.locked(|| {
            if path.exists() {
                return Err(StoreError::AlreadyExists(op.id.clone()));
            }
            write_json(&path, op)
        })
    }

    fn update(&self, op: &Operation) -> Result<Operation, StoreError> {
        let path = self.operation_path(op.id.as_str())?;
        self.locked(|| {
            let stored: Operation =
                read_json(&path)?.ok_or_else(|| StoreError::NotFound(op.id.clone()))?;
            let committed = apply_update(&stored, op)?;
            write_json(&path, &committed)?;
            Ok(committed)
        })
    }

    fn list_due(&self, before: DateTime<Utc>) -> Result<Vec<Operation>, StoreError> {
        let mut due: Vec<_> = self
            .read_operations()?
            .into_iter()
            .filter(|op| op.is_due(before))
            .collect();
        sort_due(&mut due);
        Ok(due)
    }

    fn list_by_instance(&self, instance_id: &InstanceId) -> Result<Vec<Operation>, StoreError> {
        let mut ops: Vec<_> = self
            .read_operations()?
            .into_iter()
            .filter(|op| &op.instance_id == instance_id)
            .collect();
        ops.sort_by(|a, b| a.queue_key().cmp(&b.queue_key()));
        Ok(ops)
    }

    fn append_event(&self, event: &OperationEvent) -> Result<(), StoreError> {
        self.locked(|| {
            let mut wal = self.events.lock().unwrap_or_else(|e| e.into_inner());
            wal.append(event)?;
            Ok(())
        })
    }

    fn events(&self, id: &OperationId) -> Result<Vec<OperationEvent>, StoreError> {
        Ok(Wal::replay(&self.root.join(EVENTS_FILE))?
            .into_iter()
            .filter(|e| &e.operation_id == id)
            .collect())
    }
}

impl<C: Clock> LeaseStore for FileStore<C> {
    fn acquire(&self, key: &str, holder: &HolderId, ttl: Duration) -> Result<bool, StoreError> {
        let input = LeaseInput::Acquire {
            holder: holder.clone(),
            ttl,
        };
        Ok(self.apply_lease(key, input)?.is_held())
    }

    fn renew(&self, key: &str, holder: &HolderId, ttl: Duration) -> Result<bool, StoreError> {
        let input = LeaseInput::Renew {
            holder: holder.clone(),
            ttl,
        };
        Ok(self.apply_lease(key, input)?.is_held())
    }

    fn release(&self, key: &str, holder: &HolderId) -> Result<(), StoreError> {
        let input = LeaseInput::Release {
            holder: holder.clone(),
        };
        self.apply_lease(key, input)?;
        Ok(())
    }
}

/// Keys become file names; refuse anything that could escape the directory
fn check_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains("..")
        || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_file(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(value)?;
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
