//! Own-signature retry tracking.

use std::collections::BTreeMap;

use trestle_bridge_types::{NodeSignature, SignatureKind};

type Key = (String, SignatureKind);

/// Tracks this node's own signatures until they come back through
/// consensus, resending any whose last send is older than the retry
/// interval. A zero `last_sent` means never sent and forces an
/// immediate first send.
#[derive(Debug, Default)]
pub(crate) struct TxTracker {
    entries: BTreeMap<Key, Entry>,
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub sig: NodeSignature,
    pub last_sent: i64,
}

impl TxTracker {
    pub(crate) fn track(&mut self, sig: NodeSignature) {
        let key = sig.key();
        self.entries.insert(key, Entry { sig, last_sent: 0 });
    }

    pub(crate) fn clear(&mut self, key: &Key) {
        self.entries.remove(key);
    }

    /// Returns the signatures due for (re)send at time `t` and stamps
    /// them as sent.
    pub(crate) fn due(&mut self, t: i64, retry_interval: i64) -> Vec<NodeSignature> {
        let mut out = Vec::new();
        for entry in self.entries.values_mut() {
            if entry.last_sent == 0 || t - entry.last_sent >= retry_interval {
                entry.last_sent = t;
                out.push(entry.sig.clone());
            }
        }
        out
    }

    /// Entries in deterministic key order, for snapshots.
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(id: &str) -> NodeSignature {
        NodeSignature::new("me", vec![1], id, SignatureKind::Withdrawal)
    }

    #[test]
    fn test_never_sent_fires_immediately() {
        let mut tracker = TxTracker::default();
        tracker.track(sig("r1"));
        assert_eq!(tracker.due(5, 100).len(), 1);
        // Just sent, nothing due.
        assert!(tracker.due(6, 100).is_empty());
    }

    #[test]
    fn test_resend_after_interval() {
        let mut tracker = TxTracker::default();
        tracker.track(sig("r1"));
        tracker.due(10, 100);
        assert!(tracker.due(109, 100).is_empty());
        assert_eq!(tracker.due(110, 100).len(), 1);
    }

    #[test]
    fn test_clear_stops_resends() {
        let mut tracker = TxTracker::default();
        tracker.track(sig("r1"));
        tracker.clear(&("r1".to_owned(), SignatureKind::Withdrawal));
        assert!(tracker.due(1000, 1).is_empty());
    }
}
