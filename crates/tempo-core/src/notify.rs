//! Outbound change feed.
//!
//! The orchestrator publishes one event per successful mutation, *after*
//! the store write is acknowledged: never before, and at most once.
//! Delivery is decoupled through a bounded queue: a full or disconnected
//! queue drops the event with a warning and never fails (or rolls back)
//! the mutation that produced it.

use serde::Serialize;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use tracing::warn;

/// A committed mutation, as seen by downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    IssueCreated { id: String },
    IssueUpdated { id: String, fields: Vec<String> },
    ProjectCreated { id: String },
    ProjectUpdated { id: String, fields: Vec<String> },
}

/// Publisher half of the change feed.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: Option<SyncSender<ChangeEvent>>,
}

impl ChangeFeed {
    /// A feed nobody listens to; publishing is a no-op.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// A bounded feed plus its consumer end.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, Receiver<ChangeEvent>) {
        let (tx, rx) = sync_channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// Best-effort, non-blocking publish.
    pub fn publish(&self, event: ChangeEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "change feed full; dropping event");
            }
            Err(TrySendError::Disconnected(event)) => {
                warn!(?event, "change feed disconnected; dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeEvent, ChangeFeed};

    #[test]
    fn disabled_feed_swallows_events() {
        let feed = ChangeFeed::disabled();
        feed.publish(ChangeEvent::IssueCreated {
            id: "TASK-1".to_owned(),
        });
    }

    #[test]
    fn events_arrive_in_publish_order() {
        let (feed, rx) = ChangeFeed::channel(8);
        feed.publish(ChangeEvent::IssueCreated {
            id: "TASK-1".to_owned(),
        });
        feed.publish(ChangeEvent::IssueUpdated {
            id: "TASK-1".to_owned(),
            fields: vec!["status".to_owned()],
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent::IssueCreated {
                id: "TASK-1".to_owned(),
            }
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            ChangeEvent::IssueUpdated { .. }
        ));
    }

    #[test]
    fn full_feed_drops_instead_of_blocking() {
        let (feed, rx) = ChangeFeed::channel(1);
        feed.publish(ChangeEvent::IssueCreated {
            id: "TASK-1".to_owned(),
        });
        feed.publish(ChangeEvent::IssueCreated {
            id: "TASK-2".to_owned(),
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent::IssueCreated {
                id: "TASK-1".to_owned(),
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_does_not_fail_publish() {
        let (feed, rx) = ChangeFeed::channel(1);
        drop(rx);
        feed.publish(ChangeEvent::ProjectCreated {
            id: "PRJ-1".to_owned(),
        });
    }
}
