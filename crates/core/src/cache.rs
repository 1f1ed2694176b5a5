//! Bookkeeping of the button messages this bot currently owns, keyed by
//! channel. Recording a new button set supersedes older sets with the same
//! configuration fingerprint so stale buttons can be deleted from the
//! platform; the cache itself never talks to the platform.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::protocol::ConfigFingerprint;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct Record {
    message_id: MessageId,
    fingerprint: ConfigFingerprint,
    pinned: bool,
    seq: u64,
}

struct CacheInner {
    channels: HashMap<ChannelId, Vec<Record>>,
    next_seq: u64,
}

pub struct ActiveMessageCache {
    channel_retention: usize,
    inner: Mutex<CacheInner>,
}

impl Default for ActiveMessageCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHANNEL_RETENTION)
    }
}

impl ActiveMessageCache {
    pub const DEFAULT_CHANNEL_RETENTION: usize = 32;

    pub fn new(channel_retention: usize) -> Self {
        Self {
            channel_retention,
            inner: Mutex::new(CacheInner { channels: HashMap::new(), next_seq: 0 }),
        }
    }

    /// Registers a freshly posted button message and returns the ids of
    /// previously recorded, non-pinned messages with the same fingerprint in
    /// the channel. Those are dropped from bookkeeping here; the caller is
    /// responsible for deleting them from the platform. Re-recording an id
    /// that is already tracked changes nothing.
    pub fn record_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        fingerprint: ConfigFingerprint,
        pinned: bool,
    ) -> Vec<MessageId> {
        let mut guard = self.lock();
        let CacheInner { channels, next_seq } = &mut *guard;
        let records = channels.entry(channel).or_default();

        let mut superseded = Vec::new();
        records.retain(|record| {
            let stale = record.fingerprint == fingerprint
                && !record.pinned
                && record.message_id != message;
            if stale {
                superseded.push(record.message_id);
            }
            !stale
        });

        match records.iter_mut().find(|record| record.message_id == message) {
            Some(existing) => {
                existing.fingerprint = fingerprint;
                existing.pinned = pinned;
            }
            None => {
                *next_seq += 1;
                records.push(Record { message_id: message, fingerprint, pinned, seq: *next_seq });
            }
        }

        // Records stay seq-ordered, so the oldest sits at the front. Eviction
        // ignores pins: it only forgets bookkeeping, it never deletes.
        while records.len() > self.channel_retention {
            records.remove(0);
        }

        superseded
    }

    /// Drops every record for the channel, returning the non-pinned ids for
    /// deletion. Pinned messages are forgotten but left standing.
    pub fn clear_channel(&self, channel: ChannelId) -> Vec<MessageId> {
        let mut guard = self.lock();
        match guard.channels.remove(&channel) {
            Some(records) => records
                .into_iter()
                .filter(|record| !record.pinned)
                .map(|record| record.message_id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn tracked_channels(&self) -> usize {
        self.lock().channels.len()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
