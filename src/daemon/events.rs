use super::DaemonEvent;
use tokio::sync::broadcast;

/// Room for a burst of writes before a slow pane socket starts lagging.
const BACKLOG: usize = 64;

/// Fans store notifications out to the shell and every connected pane socket.
pub struct EventBus {
    tx: broadcast::Sender<DaemonEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BACKLOG);
        Self { tx }
    }

    /// Announces that `key` was rewritten. Returns how many listeners were told;
    /// zero is normal before the shell and pane are up.
    pub fn store_changed(&self, key: &str) -> usize {
        self.tx
            .send(DaemonEvent::StoreChanged { key: key.to_string() })
            .unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DaemonEvent> {
        self.tx.subscribe()
    }

    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
