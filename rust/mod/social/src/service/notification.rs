//! Best-effort notifications.
//!
//! Callers hand a [`NotificationRequest`] to the [`NotificationDispatcher`],
//! which queues it and returns immediately. A [`NotificationWorker`] drains
//! the queue and calls the [`Notifier`]. Delivery failures end in the log and
//! never reach the request that triggered them.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use recharge_core::{ListParams, ListResult, now_rfc3339};
use recharge_sql::{Row, SQLStore, Value};

use crate::model::{Notification, NotificationRequest, SOURCE_FOLLOW};
use crate::service::{SocialError, SocialService};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification storage: {0}")]
    Storage(String),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Delivers a notification to its recipient.
pub trait Notifier: Send + Sync {
    fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError>;
}

/// Stores notifications in the `notifications` table for the in-app inbox.
pub struct SqlNotifier {
    sql: Arc<dyn SQLStore>,
}

impl SqlNotifier {
    /// The table is created by [`SocialService::new`].
    pub fn new(sql: Arc<dyn SQLStore>) -> Self {
        Self { sql }
    }
}

/// Inbox title shown for a notification source.
fn title_for(source_type: &str) -> &'static str {
    match source_type {
        SOURCE_FOLLOW => "New follower",
        _ => "New activity",
    }
}

impl Notifier for SqlNotifier {
    fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        self.sql
            .exec(
                "INSERT INTO notifications
                    (sender_id, source_type, recipient_id, kind, title, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                &[
                    Value::Text(request.sender_id.clone()),
                    Value::Text(request.source_type.clone()),
                    Value::Text(request.recipient_id.clone()),
                    Value::Text(request.kind.clone()),
                    Value::Text(title_for(&request.source_type).to_string()),
                    Value::Text(now_rfc3339()),
                ],
            )
            .map_err(|e| NotifyError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// Fire-and-forget handle for queueing notifications.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<NotificationRequest>,
}

/// Drains queued notifications into a [`Notifier`].
pub struct NotificationWorker {
    rx: mpsc::UnboundedReceiver<NotificationRequest>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    /// Create a dispatcher and the worker that must be run to deliver its queue.
    pub fn channel(notifier: Arc<dyn Notifier>) -> (Self, NotificationWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, NotificationWorker { rx, notifier })
    }

    /// Create a dispatcher whose worker runs on the current tokio runtime.
    pub fn spawn(notifier: Arc<dyn Notifier>) -> Self {
        let (dispatcher, worker) = Self::channel(notifier);
        tokio::spawn(worker.run());
        dispatcher
    }

    /// Queue a notification. Never blocks and never fails.
    pub fn dispatch(&self, request: NotificationRequest) {
        if let Err(e) = self.tx.send(request) {
            warn!(
                recipient = %e.0.recipient_id,
                kind = %e.0.kind,
                "notification worker is gone, dropping notification"
            );
        }
    }
}

impl NotificationWorker {
    /// Deliver queued notifications until every dispatcher is dropped.
    pub async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            match self.notifier.send(&request) {
                Ok(()) => debug!(
                    sender = %request.sender_id,
                    recipient = %request.recipient_id,
                    kind = %request.kind,
                    "notification delivered"
                ),
                Err(e) => warn!(
                    sender = %request.sender_id,
                    recipient = %request.recipient_id,
                    kind = %request.kind,
                    error = %e,
                    "notification delivery failed"
                ),
            }
        }
        debug!("notification worker stopped");
    }
}

impl SocialService {
    /// List a recipient's notifications, newest first.
    pub fn list_notifications(
        &self,
        recipient_id: &str,
        params: &ListParams,
    ) -> Result<ListResult<Notification>, SocialError> {
        let recipient = Value::Text(recipient_id.to_string());

        let count_rows = self.sql.query(
            "SELECT COUNT(*) AS cnt FROM notifications WHERE recipient_id = ?1",
            &[recipient.clone()],
        )?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let rows = self.sql.query(
            "SELECT id, sender_id, source_type, recipient_id, kind, title, read, created_at
             FROM notifications WHERE recipient_id = ?1
             ORDER BY id DESC LIMIT ?2 OFFSET ?3",
            &[
                recipient,
                Value::Integer(params.limit as i64),
                Value::Integer(params.offset as i64),
            ],
        )?;

        let items = rows.iter().map(row_to_notification).collect::<Result<Vec<_>, _>>()?;
        Ok(ListResult { items, total })
    }

    /// Mark one of the recipient's notifications as read.
    pub fn mark_notification_read(&self, id: i64, recipient_id: &str) -> Result<(), SocialError> {
        let affected = self.sql.exec(
            "UPDATE notifications SET read = 1 WHERE id = ?1 AND recipient_id = ?2",
            &[Value::Integer(id), Value::Text(recipient_id.to_string())],
        )?;
        if affected == 0 {
            return Err(SocialError::NotFound(format!("notifications/{}", id)));
        }
        Ok(())
    }
}

fn row_to_notification(row: &Row) -> Result<Notification, SocialError> {
    let missing = |col: &str| SocialError::Internal(format!("notifications.{} missing", col));
    Ok(Notification {
        id: row.get_i64("id").ok_or_else(|| missing("id"))?,
        sender_id: row.get_string("sender_id").ok_or_else(|| missing("sender_id"))?,
        source_type: row.get_string("source_type").ok_or_else(|| missing("source_type"))?,
        recipient_id: row.get_string("recipient_id").ok_or_else(|| missing("recipient_id"))?,
        kind: row.get_string("kind").ok_or_else(|| missing("kind"))?,
        title: row.get_string("title").ok_or_else(|| missing("title"))?,
        read: row.get_bool("read").unwrap_or(false),
        created_at: row.get_string("created_at").ok_or_else(|| missing("created_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::service::{SocialConfig, testutil};

    /// Records what it was asked to send.
    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<NotificationRequest>>,
    }

    impl Notifier for Recording {
        fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn worker_delivers_queued_requests() {
        let recording = Arc::new(Recording::default());
        let (dispatcher, worker) = NotificationDispatcher::channel(recording.clone());

        dispatcher.dispatch(NotificationRequest::follow("a", "b"));
        dispatcher.dispatch(NotificationRequest::follow("c", "b"));
        drop(dispatcher);
        worker.run().await;

        let sent = recording.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], NotificationRequest::follow("a", "b"));
        assert_eq!(sent[1].sender_id, "c");
    }

    #[test]
    fn dispatch_without_worker_is_absorbed() {
        let (dispatcher, worker) = NotificationDispatcher::channel(Arc::new(Recording::default()));
        drop(worker);
        dispatcher.dispatch(NotificationRequest::follow("a", "b"));
    }

    #[tokio::test]
    async fn sql_notifier_fills_inbox() {
        let sql = testutil::sql();
        let notifier = Arc::new(SqlNotifier::new(sql.clone()));
        let (dispatcher, worker) = NotificationDispatcher::channel(notifier);
        let svc = SocialService::new(sql, SocialConfig::default(), dispatcher.clone()).unwrap();

        dispatcher.dispatch(NotificationRequest::follow("fan", "idol"));
        // The service still holds a sender, so the worker never ends on its own.
        let handle = tokio::spawn(worker.run());
        for _ in 0..50 {
            if svc.list_notifications("idol", &ListParams::default()).unwrap().total == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        handle.abort();

        let inbox = svc.list_notifications("idol", &ListParams::default()).unwrap();
        assert_eq!(inbox.total, 1);
        let item = &inbox.items[0];
        assert_eq!(item.sender_id, "fan");
        assert_eq!(item.kind, "FOLLOW");
        assert_eq!(item.title, "New follower");
        assert!(!item.read);

        assert!(matches!(
            svc.mark_notification_read(item.id, "fan"),
            Err(SocialError::NotFound(_))
        ));
        svc.mark_notification_read(item.id, "idol").unwrap();
        let inbox = svc.list_notifications("idol", &ListParams::default()).unwrap();
        assert!(inbox.items[0].read);
        assert!(matches!(
            svc.mark_notification_read(9999, "idol"),
            Err(SocialError::NotFound(_))
        ));
    }
}
