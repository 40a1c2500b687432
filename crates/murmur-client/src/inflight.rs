// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! De-duplication of concurrent identical operations.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// Tracks which operations are outstanding, keyed by operation identity
/// (for example `history:<conversation id>`).
///
/// A second caller for a key that is already active is turned away rather
/// than queued; it sees the first call's result through shared state.
#[derive(Debug, Clone, Default)]
pub struct InflightGuard {
    active: Arc<DashMap<String, ()>>,
}

impl InflightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`, or returns `None` if another caller holds it.
    ///
    /// The claim is released when the returned ticket is dropped.
    pub fn try_begin(&self, key: impl Into<String>) -> Option<InflightTicket> {
        let key = key.into();
        match self.active.entry(key.clone()) {
            Entry::Occupied(_) => {
                debug!(%key, "operation already in flight, dropping duplicate");
                None
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InflightTicket {
                    active: Arc::clone(&self.active),
                    key,
                })
            }
        }
    }
}

/// Proof of an outstanding operation. Releases its key on drop.
#[derive(Debug)]
pub struct InflightTicket {
    active: Arc<DashMap<String, ()>>,
    key: String,
}

impl Drop for InflightTicket {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_refused_until_release() {
        let guard = InflightGuard::new();
        let ticket = guard.try_begin("history:c1").unwrap();
        assert!(guard.try_begin("history:c1").is_none());
        assert!(guard.try_begin("history:c2").is_some());

        drop(ticket);
        assert!(guard.try_begin("history:c1").is_some());
    }

    #[test]
    fn clones_share_claims() {
        let guard = InflightGuard::new();
        let other = guard.clone();
        let _ticket = guard.try_begin("escalations").unwrap();
        assert!(other.try_begin("escalations").is_none());
    }
}
