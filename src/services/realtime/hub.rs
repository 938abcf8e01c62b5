use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A position published by an authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Fan-out of location updates to every connected socket.
///
/// Cheap to clone. Slow subscribers lag and skip updates instead of blocking publishers.
#[derive(Clone, Debug)]
pub struct LocationHub {
    tx: broadcast::Sender<LocationUpdate>,
}

impl LocationHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocationUpdate> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers received the update (0 when nobody listens).
    pub fn publish(&self, update: LocationUpdate) -> usize {
        self.tx.send(update).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
