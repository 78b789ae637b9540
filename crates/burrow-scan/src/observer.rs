//! Access notifications for recent-items tracking.

use burrow_core::Entry;
use tokio::sync::mpsc;

/// Receives an entry each time the engine opens or touches a file on the
/// caller's behalf. Persistence is up to the implementor.
pub trait AccessObserver: Send + Sync {
    fn on_access(&self, entry: &Entry);
}

/// Forwards accessed entries over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Entry>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Entry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AccessObserver for ChannelObserver {
    fn on_access(&self, entry: &Entry) {
        // A dropped receiver just means nobody is recording history.
        let _ = self.tx.send(entry.clone());
    }
}
