// Live update channel - push delivery of new samples
use crate::application::error::ChannelError;
use crate::domain::record::Record;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Error(ChannelError),
    NewData(Record),
}

/// An open live-update connection.
///
/// Dropping the subscription stops the task reading from the connection, so
/// the connection is released on every exit path of the owner.
#[derive(Debug)]
pub struct LiveSubscription {
    events: mpsc::Receiver<ChannelEvent>,
    reader: Option<JoinHandle<()>>,
}

impl LiveSubscription {
    pub fn new(events: mpsc::Receiver<ChannelEvent>, reader: JoinHandle<()>) -> Self {
        Self {
            events,
            reader: Some(reader),
        }
    }

    /// Subscription fed directly by a sender, with no reader task to manage
    pub fn from_receiver(events: mpsc::Receiver<ChannelEvent>) -> Self {
        Self {
            events,
            reader: None,
        }
    }

    /// Next event, or `None` once the connection is gone for good
    pub async fn next(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

#[async_trait]
pub trait LiveUpdateChannel: Send + Sync {
    async fn subscribe(&self) -> Result<LiveSubscription, ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drop_stops_reader() {
        let (_tx, rx) = mpsc::channel(4);
        let (guard_tx, guard_rx) = tokio::sync::oneshot::channel::<()>();
        let reader = tokio::spawn(async move {
            let _guard = guard_tx;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        let subscription = LiveSubscription::new(rx, reader);
        drop(subscription);

        // The guard is dropped together with the aborted reader future
        let released = tokio::time::timeout(Duration::from_secs(1), guard_rx).await;
        assert!(matches!(released, Ok(Err(_))));
    }

    #[tokio::test]
    async fn test_from_receiver_ends_with_sender() {
        let (tx, rx) = mpsc::channel(4);
        let mut subscription = LiveSubscription::from_receiver(rx);

        tx.send(ChannelEvent::Connected).await.unwrap();
        drop(tx);

        assert_eq!(subscription.next().await, Some(ChannelEvent::Connected));
        assert_eq!(subscription.next().await, None);
    }
}
