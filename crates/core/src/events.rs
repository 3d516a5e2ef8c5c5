//! Typed session event bus
//!
//! The response interceptor announces authentication failures here so that
//! the session provider can react without any call site having to inspect
//! errors itself.

use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per receiver. `Expired` is idempotent for observers, so a
/// lagged receiver converges on the next delivery.
const EVENT_CAPACITY: usize = 16;

/// Cross-cutting session notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected a request as unauthenticated (HTTP 401)
    Expired,
}

/// Broadcast handle for [`SessionEvent`]s
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to session events. Only events emitted after the call are
    /// observed.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Announce that the current session is no longer authenticated
    pub fn session_expired(&self) {
        debug!("broadcasting session expiry");
        // No receivers is fine; nobody is watching yet.
        let _ = self.tx.send(SessionEvent::Expired);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_expiry() {
        let events = SessionEvents::new();
        let mut rx = events.subscribe();

        events.session_expired();

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Expired);
    }

    #[test]
    fn emit_without_subscribers_is_a_no_op() {
        let events = SessionEvents::new();
        events.session_expired();
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let events = SessionEvents::new();
        events.session_expired();

        let mut rx = events.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
