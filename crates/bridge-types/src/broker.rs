//! Broker seam.

use crate::events::BridgeEvent;

/// Fan-out of domain events to in-process subscribers.
///
/// Delivery is fire-and-forget and at-least-once; the broker is an
/// external collaborator and nothing in the core depends on anyone
/// consuming these.
pub trait Broker: Send + Sync {
    fn send(&self, event: BridgeEvent);

    fn send_batch(&self, events: Vec<BridgeEvent>) {
        for ev in events {
            self.send(ev);
        }
    }
}
