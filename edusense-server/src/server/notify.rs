//! Notification dispatch. Delivery is the recipient's in-memory feed; the
//! service adds burst suppression and structured delivery logging on top of
//! the raw store insert.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use edusense_shared::domain::{Notification, NotificationKind, StudentId};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::store::{Store, StoreError};

/// Repeated identical notifications inside this window are dropped.
const SUPPRESSION_WINDOW_SECS: i64 = 30;

#[derive(Debug, Clone)]
pub enum PortalEvent {
    FeePaid {
        student_id: StudentId,
        fee_id: String,
        amount_cents: i64,
    },
    StudentAbsent {
        student_id: StudentId,
        date: NaiveDate,
    },
}

#[derive(Clone)]
pub struct NotifyService {
    inner: Arc<NotifyInner>,
}

struct NotifyInner {
    recent: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl NotifyService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(NotifyInner {
                recent: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Fire-and-forget fan-out for server-side events.
    pub fn dispatch_event(&self, store: Store, event: PortalEvent) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            if let Err(err) = inner.handle_event(store, event).await {
                warn!(error = %err, "notify: failed to handle event");
            }
        });
    }

    /// Explicit trigger command; returns the created record for the ack.
    pub async fn trigger(
        &self,
        store: &Store,
        recipient: &str,
        student_id: Option<StudentId>,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Result<Option<Notification>, StoreError> {
        if self.inner.suppressed(recipient, title).await {
            info!(recipient, title, "notify: duplicate burst suppressed");
            return Ok(None);
        }
        let note = store
            .add_notification(recipient, student_id, kind, title, message)
            .await?;
        info!(recipient, id = %note.id, kind = ?note.kind, "notify: delivered");
        Ok(Some(note))
    }
}

impl Default for NotifyService {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyInner {
    async fn handle_event(self: Arc<Self>, store: Store, event: PortalEvent) -> Result<(), String> {
        let (student_id, kind, title, message) = match &event {
            PortalEvent::FeePaid {
                student_id,
                fee_id,
                amount_cents,
            } => (
                student_id.clone(),
                NotificationKind::Fee,
                "Payment received".to_string(),
                format!(
                    "Payment of {:.2} recorded for fee {}.",
                    *amount_cents as f64 / 100.0,
                    fee_id
                ),
            ),
            PortalEvent::StudentAbsent { student_id, date } => (
                student_id.clone(),
                NotificationKind::Academic,
                "Absence recorded".to_string(),
                format!("Marked absent on {}.", date),
            ),
        };
        let Some(recipient) = store.parent_of(&student_id).await else {
            return Err(format!("no parent for student {}", student_id));
        };
        if self.suppressed(&recipient, &title).await {
            info!(recipient, title, "notify: duplicate burst suppressed");
            return Ok(());
        }
        let note = store
            .add_notification(&recipient, Some(student_id), kind, &title, &message)
            .await
            .map_err(|e| e.to_string())?;
        info!(recipient, id = %note.id, kind = ?note.kind, "notify: delivered");
        Ok(())
    }

    async fn suppressed(&self, recipient: &str, title: &str) -> bool {
        let key = format!("{}|{}", recipient, title);
        let now = Utc::now();
        let mut recent = self.recent.lock().await;
        if let Some(last) = recent.get(&key)
            && now - *last < Duration::seconds(SUPPRESSION_WINDOW_SECS)
        {
            return true;
        }
        recent.insert(key, now);
        false
    }
}
