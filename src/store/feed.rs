use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use super::{ChangeEvent, ChangeKind, StoreError};

/// Fan-out of change events to per-collection subscribers.
/// Subscribers whose receiving end was dropped are pruned on the next publish.
#[derive(Default)]
pub struct ChangeFeed {
    subscribers: Mutex<Vec<(String, Sender<ChangeEvent>)>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::channel();
        self.lock()?.push((collection.to_string(), tx));
        Ok(Subscription {
            collection: collection.to_string(),
            rx,
        })
    }

    /// Deliver `event` to subscribers of its collection
    pub fn publish(&self, event: ChangeEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            tracing::error!("change feed lock poisoned; dropping event");
            return;
        };
        subscribers.retain(|(collection, tx)| {
            if *collection != event.collection {
                return true;
            }
            tx.send(event.clone()).is_ok()
        });
    }

    /// Notify every subscriber that something changed outside this process
    pub fn publish_external(&self) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            tracing::error!("change feed lock poisoned; dropping event");
            return;
        };
        subscribers.retain(|(collection, tx)| {
            tx.send(ChangeEvent {
                collection: collection.clone(),
                id: None,
                kind: ChangeKind::External,
            })
            .is_ok()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<(String, Sender<ChangeEvent>)>>, StoreError> {
        self.subscribers
            .lock()
            .map_err(|_| StoreError::Unavailable("change feed lock poisoned".into()))
    }
}

/// Receiving end of a collection subscription
pub struct Subscription {
    collection: String,
    rx: Receiver<ChangeEvent>,
}

impl Subscription {
    /// Build a subscription around an existing channel, for stores that
    /// manage their own fan-out
    pub fn from_receiver(collection: &str, rx: Receiver<ChangeEvent>) -> Self {
        Self {
            collection: collection.to_string(),
            rx,
        }
    }

    /// Drain pending events without blocking. Returns how many arrived;
    /// fails once the store side has gone away.
    pub fn drain(&self) -> Result<usize, StoreError> {
        let mut received = 0;
        loop {
            match self.rx.try_recv() {
                Ok(_) => received += 1,
                Err(TryRecvError::Empty) => return Ok(received),
                Err(TryRecvError::Disconnected) => {
                    return Err(StoreError::Unavailable(format!(
                        "subscription to {} closed",
                        self.collection
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(collection: &str) -> ChangeEvent {
        ChangeEvent {
            collection: collection.into(),
            id: Some("x".into()),
            kind: ChangeKind::Created,
        }
    }

    #[test]
    fn events_reach_only_matching_collection() {
        let feed = ChangeFeed::new();
        let notes = feed.subscribe("note").unwrap();
        let visits = feed.subscribe("info").unwrap();

        feed.publish(created("note"));
        feed.publish(created("note"));

        assert_eq!(notes.drain().unwrap(), 2);
        assert_eq!(visits.drain().unwrap(), 0);
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe("note").unwrap();
        assert_eq!(feed.subscriber_count(), 1);
        drop(sub);
        feed.publish(created("note"));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn external_changes_reach_everyone() {
        let feed = ChangeFeed::new();
        let a = feed.subscribe("note").unwrap();
        let b = feed.subscribe("Customers").unwrap();
        feed.publish_external();
        assert_eq!(a.drain().unwrap(), 1);
        assert_eq!(b.drain().unwrap(), 1);
    }

    #[test]
    fn drain_fails_once_sender_is_gone() {
        let (tx, rx) = mpsc::channel();
        let sub = Subscription::from_receiver("note", rx);
        drop(tx);
        assert!(matches!(sub.drain(), Err(StoreError::Unavailable(_))));
    }
}
