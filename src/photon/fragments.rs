use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::photon::DecodeError;

/// One fragment of a reliable message, as parsed from a fragment command.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Sequence number of the first fragment in the set; identifies the set
    pub start_sequence: u32,
    pub fragment_count: u32,
    pub fragment_number: u32,
    pub total_length: u32,
    pub fragment_offset: u32,
    pub data: Vec<u8>,
}

struct PendingSet {
    fragment_count: u32,
    total_length: u32,
    received: HashMap<u32, (u32, Vec<u8>)>,
    first_seen: Instant,
}

/// Reassembly buffer for fragmented reliable messages.
///
/// Sets are keyed by (peer id, start sequence). Incomplete sets are dropped
/// after `ttl`; the game resends nothing, so an expired set is simply lost
/// tracking data.
pub struct FragmentBuffer {
    ttl: Duration,
    pending: HashMap<(u16, u32), PendingSet>,
}

// Anything larger than this is not a legitimate game message.
const MAX_MESSAGE_LENGTH: u32 = 1 << 20;

impl FragmentBuffer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: HashMap::new(),
        }
    }

    /// Number of incomplete sets currently buffered.
    pub fn pending_sets(&self) -> usize {
        self.pending.len()
    }

    /// Adds one fragment; returns the reassembled payload once every
    /// fragment of its set has arrived.
    pub fn insert(
        &mut self,
        peer_id: u16,
        fragment: Fragment,
        now: Instant,
    ) -> Result<Option<Vec<u8>>, DecodeError> {
        if fragment.fragment_count == 0 || fragment.fragment_number >= fragment.fragment_count {
            return Err(DecodeError::MalformedHeader {
                reason: "fragment number outside declared count",
            });
        }
        if fragment.total_length > MAX_MESSAGE_LENGTH {
            return Err(DecodeError::MalformedHeader {
                reason: "fragment set declares an implausible total length",
            });
        }
        let end = fragment.fragment_offset as u64 + fragment.data.len() as u64;
        if end > u64::from(fragment.total_length) {
            return Err(DecodeError::MalformedHeader {
                reason: "fragment extends past declared total length",
            });
        }

        let key = (peer_id, fragment.start_sequence);
        let set = self.pending.entry(key).or_insert_with(|| PendingSet {
            fragment_count: fragment.fragment_count,
            total_length: fragment.total_length,
            received: HashMap::new(),
            first_seen: now,
        });
        if set.fragment_count != fragment.fragment_count
            || set.total_length != fragment.total_length
        {
            return Err(DecodeError::MalformedHeader {
                reason: "fragment disagrees with its set header",
            });
        }

        set.received.insert(
            fragment.fragment_number,
            (fragment.fragment_offset, fragment.data),
        );

        if set.received.len() as u32 == set.fragment_count {
            if let Some(set) = self.pending.remove(&key) {
                let mut payload = vec![0u8; set.total_length as usize];
                for (offset, data) in set.received.into_values() {
                    let start = offset as usize;
                    payload[start..start + data.len()].copy_from_slice(&data);
                }
                return Ok(Some(payload));
            }
        }

        Ok(None)
    }

    /// Drops sets older than the TTL; returns how many were dropped.
    ///
    /// Called opportunistically on packet arrival; there is no timer.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.pending.len();
        self.pending
            .retain(|_, set| now.duration_since(set.first_seen) < ttl);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            debug!(
                dropped = dropped,
                error = %DecodeError::FragmentTimeout,
                "dropped incomplete fragment sets"
            );
        }
        dropped
    }
}
