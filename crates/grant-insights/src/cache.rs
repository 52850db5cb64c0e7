//! Memoized cleaning results keyed by the content of the export.

use crate::error::GrantDataError;
use crate::pipeline::{CleanedDataset, GrantCleaner};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// SHA-256 of the raw export bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetFingerprint(String);

impl DatasetFingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for DatasetFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Entries kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 8;

#[derive(Debug, Default)]
struct Entries {
    datasets: HashMap<DatasetFingerprint, Arc<CleanedDataset>>,
    /// Insertion order, oldest first.
    order: VecDeque<DatasetFingerprint>,
}

impl Entries {
    fn insert(
        &mut self,
        fingerprint: DatasetFingerprint,
        dataset: Arc<CleanedDataset>,
        capacity: usize,
    ) {
        if self.datasets.insert(fingerprint.clone(), dataset).is_none() {
            self.order.push_back(fingerprint);
        }
        while self.datasets.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.datasets.remove(&oldest);
            debug!(fingerprint = %oldest, "evicted cleaned grant export");
        }
    }

    fn remove(&mut self, fingerprint: &DatasetFingerprint) -> bool {
        self.order.retain(|candidate| candidate != fingerprint);
        self.datasets.remove(fingerprint).is_some()
    }
}

/// Cleaned datasets shared across requests, bounded to `capacity` entries.
/// Cleaning is deterministic for a given cleaner, so a hit is
/// indistinguishable from re-running.
#[derive(Debug)]
pub struct CleanedDatasetCache {
    cleaner: GrantCleaner,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl Default for CleanedDatasetCache {
    fn default() -> Self {
        Self::new(GrantCleaner::default())
    }
}

impl CleanedDatasetCache {
    pub fn new(cleaner: GrantCleaner) -> Self {
        Self::with_capacity(cleaner, DEFAULT_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(cleaner: GrantCleaner, capacity: usize) -> Self {
        Self {
            cleaner,
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn cleaner(&self) -> &GrantCleaner {
        &self.cleaner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_or_clean(
        &self,
        bytes: &[u8],
    ) -> Result<(DatasetFingerprint, Arc<CleanedDataset>), GrantDataError> {
        let fingerprint = DatasetFingerprint::from_bytes(bytes);
        if let Some(dataset) = self.entries().datasets.get(&fingerprint) {
            debug!(%fingerprint, "grant cache hit");
            return Ok((fingerprint, Arc::clone(dataset)));
        }

        // Cleaning happens without the lock held; a concurrent miss on the
        // same bytes produces an equal dataset and the first insert wins.
        let cleaned = Arc::new(self.cleaner.clean_bytes(bytes)?);
        let dataset = {
            let mut entries = self.entries();
            match entries.datasets.get(&fingerprint) {
                Some(existing) => Arc::clone(existing),
                None => {
                    entries.insert(fingerprint.clone(), Arc::clone(&cleaned), self.capacity);
                    cleaned
                }
            }
        };
        info!(%fingerprint, rows = dataset.summary.rows, "cached cleaned grant export");
        Ok((fingerprint, dataset))
    }

    /// Cleans unconditionally and replaces any cached entry.
    pub fn refresh(
        &self,
        bytes: &[u8],
    ) -> Result<(DatasetFingerprint, Arc<CleanedDataset>), GrantDataError> {
        let fingerprint = DatasetFingerprint::from_bytes(bytes);
        let dataset = Arc::new(self.cleaner.clean_bytes(bytes)?);
        self.entries()
            .insert(fingerprint.clone(), Arc::clone(&dataset), self.capacity);
        info!(%fingerprint, rows = dataset.summary.rows, "refreshed cleaned grant export");
        Ok((fingerprint, dataset))
    }

    pub fn invalidate(&self, fingerprint: &DatasetFingerprint) -> bool {
        let removed = self.entries().remove(fingerprint);
        if removed {
            debug!(%fingerprint, "invalidated cached grant export");
        }
        removed
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries();
        let cleared = entries.datasets.len();
        *entries = Entries::default();
        info!(cleared, "cleared grant cache");
        cleared
    }

    pub fn len(&self) -> usize {
        self.entries().datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().datasets.is_empty()
    }

    pub fn contains(&self, fingerprint: &DatasetFingerprint) -> bool {
        self.entries().datasets.contains_key(fingerprint)
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
