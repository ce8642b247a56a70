use std::collections::VecDeque;
use std::time::SystemTime;

use crate::clock::age_secs;
use crate::error::{Error, Result};
use crate::sector::SectorRecord;

/// Capacity used by the count-based policy when none is configured.
pub const DEFAULT_CAPACITY: usize = 75;

/// How records leave the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Drop records once they are fully faded.
    MaxAge,
    /// Keep at most this many records, dropping the oldest arrivals.
    /// Does not depend on sender and receiver clocks agreeing.
    MaxCount(usize),
}

impl EvictionPolicy {
    pub fn max_count(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(EvictionPolicy::MaxCount(capacity))
    }
}

/// Sector records in arrival order, oldest at the front.
pub struct SectorBuffer<T> {
    records: VecDeque<SectorRecord<T>>,
}

impl<T> SectorBuffer<T> {
    pub fn new() -> Self {
        Self {
            records: VecDeque::new(),
        }
    }

    /// Append a record at the back.
    pub fn push(&mut self, record: SectorRecord<T>) {
        self.records.push_back(record);
    }

    /// Remove every record at least `fade_secs` old, keeping arrival order of
    /// the rest. Dropping a record releases its texture.
    pub fn evict_expired(&mut self, now: SystemTime, fade_secs: f64) -> usize {
        let before = self.records.len();
        // Fast path: expired records are normally all at the front.
        while self
            .records
            .front()
            .is_some_and(|r| age_secs(now, r.timestamp) >= fade_secs)
        {
            self.records.pop_front();
        }
        // Out-of-order timestamps can leave expired records further back.
        self.records
            .retain(|r| age_secs(now, r.timestamp) < fade_secs);
        before - self.records.len()
    }

    /// Drop the oldest arrivals until at most `capacity` remain.
    pub fn enforce_capacity(&mut self, capacity: usize) -> usize {
        let excess = self.records.len().saturating_sub(capacity);
        self.records.drain(..excess);
        excess
    }

    /// Apply `policy` and return how many records were evicted.
    pub fn evict(&mut self, policy: EvictionPolicy, now: SystemTime, fade_secs: f64) -> usize {
        let evicted = match policy {
            EvictionPolicy::MaxAge => self.evict_expired(now, fade_secs),
            EvictionPolicy::MaxCount(capacity) => self.enforce_capacity(capacity),
        };
        if evicted > 0 {
            log::debug!("Evicted {} sectors, {} remain", evicted, self.records.len());
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SectorRecord<T>> {
        self.records.iter()
    }

    /// Oldest first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SectorRecord<T>> {
        self.records.iter_mut()
    }
}

impl<T> Default for SectorBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
