pub mod curriculum;
pub mod fixtures;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use edusense_shared::domain::*;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::trace;

use curriculum::CurriculumIdMode;
use fixtures::Dataset;

/// Structured error type for all store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub jti: String,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinanceOverview {
    pub total_billed_cents: i64,
    pub total_paid_cents: i64,
    pub total_pending_cents: i64,
    pub total_overdue_cents: i64,
    pub students_with_dues: usize,
}

/// In-memory repository over the fixture dataset. All reads filter the
/// dataset under a read lock; mutations last for the process lifetime only.
///
/// An optional latency range reproduces the legacy portal's artificial
/// delays on data access. Session bookkeeping and ACL scope lookups are
/// exempt so auth never pays the simulated cost.
#[derive(Clone)]
pub struct Store {
    data: Arc<RwLock<Dataset>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    latency_ms: Option<(u64, u64)>,
}

impl Store {
    pub fn new(dataset: Dataset, latency_ms: Option<(u64, u64)>) -> Self {
        Store {
            data: Arc::new(RwLock::new(dataset)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            latency_ms,
        }
    }

    async fn simulate_latency(&self) {
        if let Some((lo, hi)) = self.latency_ms {
            let ms = if hi > lo {
                rand::rng().random_range(lo..=hi)
            } else {
                lo
            };
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    // ---- students ----

    pub async fn list_students(&self) -> Vec<Student> {
        self.simulate_latency().await;
        self.data.read().await.students.clone()
    }

    pub async fn students_for_parent(&self, parent_username: &str) -> Vec<Student> {
        self.simulate_latency().await;
        self.data
            .read()
            .await
            .students
            .iter()
            .filter(|s| s.parent_username == parent_username)
            .cloned()
            .collect()
    }

    pub async fn students_in_classes(&self, class_ids: &[String]) -> Vec<Student> {
        self.simulate_latency().await;
        self.data
            .read()
            .await
            .students
            .iter()
            .filter(|s| class_ids.contains(&s.class_id))
            .cloned()
            .collect()
    }

    pub async fn get_student(&self, id: &StudentId) -> Result<Student, StoreError> {
        self.simulate_latency().await;
        self.data
            .read()
            .await
            .students
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("student not found: {}", id)))
    }

    /// Scope lookup for the ACL layer; bypasses simulated latency.
    pub async fn student_class(&self, id: &StudentId) -> Option<String> {
        self.data
            .read()
            .await
            .students
            .iter()
            .find(|s| &s.id == id)
            .map(|s| s.class_id.clone())
    }

    async fn ensure_student(&self, id: &StudentId) -> Result<(), StoreError> {
        if self.student_class(id).await.is_none() {
            return Err(StoreError::NotFound(format!("student not found: {}", id)));
        }
        Ok(())
    }

    // ---- fees ----

    pub async fn fees_for_student(&self, id: &StudentId) -> Result<Vec<Fee>, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        Ok(self
            .data
            .read()
            .await
            .fees
            .iter()
            .filter(|f| &f.student_id == id)
            .cloned()
            .collect())
    }

    pub async fn pay_fee(&self, student: &StudentId, fee_id: &str) -> Result<Fee, StoreError> {
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        let fee = data
            .fees
            .iter_mut()
            .find(|f| &f.student_id == student && f.id == fee_id)
            .ok_or_else(|| StoreError::NotFound(format!("fee not found: {}", fee_id)))?;
        if fee.status == FeeStatus::Paid {
            return Err(StoreError::InvalidInput(format!(
                "fee already paid: {}",
                fee_id
            )));
        }
        fee.status = FeeStatus::Paid;
        trace!(student = %student, fee_id, "fee marked paid");
        Ok(fee.clone())
    }

    pub async fn finance_overview(&self) -> FinanceOverview {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let mut overview = FinanceOverview {
            total_billed_cents: 0,
            total_paid_cents: 0,
            total_pending_cents: 0,
            total_overdue_cents: 0,
            students_with_dues: 0,
        };
        let mut with_dues: Vec<&StudentId> = Vec::new();
        for fee in &data.fees {
            overview.total_billed_cents += fee.amount_cents;
            match fee.status {
                FeeStatus::Paid => overview.total_paid_cents += fee.amount_cents,
                FeeStatus::Pending => overview.total_pending_cents += fee.amount_cents,
                FeeStatus::Overdue => overview.total_overdue_cents += fee.amount_cents,
            }
            if fee.status != FeeStatus::Paid && !with_dues.contains(&&fee.student_id) {
                with_dues.push(&fee.student_id);
            }
        }
        overview.students_with_dues = with_dues.len();
        overview
    }

    // ---- attendance ----

    pub async fn attendance_for_student(
        &self,
        id: &StudentId,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        Ok(self
            .data
            .read()
            .await
            .attendance
            .iter()
            .filter(|a| &a.student_id == id && date.is_none_or(|d| a.date == d))
            .cloned()
            .collect())
    }

    pub async fn record_attendance(
        &self,
        id: &StudentId,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        let mut data = self.data.write().await;
        if let Some(existing) = data
            .attendance
            .iter_mut()
            .find(|a| &a.student_id == id && a.date == date)
        {
            existing.status = status;
            return Ok(existing.clone());
        }
        let record = AttendanceRecord {
            id: mint_id("ATT", data.attendance.len()),
            student_id: id.clone(),
            date,
            status,
        };
        data.attendance.push(record.clone());
        Ok(record)
    }

    // ---- diary ----

    pub async fn diary_for_student(&self, id: &StudentId) -> Result<Vec<DiaryEntry>, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        Ok(self
            .data
            .read()
            .await
            .diary
            .iter()
            .filter(|e| &e.student_id == id)
            .cloned()
            .collect())
    }

    pub async fn add_diary_entry(
        &self,
        id: &StudentId,
        teacher_username: &str,
        date: NaiveDate,
        content: &str,
    ) -> Result<DiaryEntry, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        if content.trim().is_empty() {
            return Err(StoreError::InvalidInput("diary content is empty".into()));
        }
        let mut data = self.data.write().await;
        let entry = DiaryEntry {
            id: mint_id("DRY", data.diary.len()),
            student_id: id.clone(),
            teacher_username: teacher_username.to_string(),
            date,
            content: content.to_string(),
        };
        data.diary.push(entry.clone());
        Ok(entry)
    }

    // ---- marks ----

    pub async fn marks_for_student(&self, id: &StudentId) -> Result<Vec<Mark>, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        Ok(self
            .data
            .read()
            .await
            .marks
            .iter()
            .filter(|m| &m.student_id == id)
            .cloned()
            .collect())
    }

    pub async fn add_mark(
        &self,
        id: &StudentId,
        subject: &str,
        assessment: &str,
        score: f64,
        max_score: f64,
    ) -> Result<Mark, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        if max_score <= 0.0 || score < 0.0 || score > max_score {
            return Err(StoreError::InvalidInput(format!(
                "score {} out of range 0..{}",
                score, max_score
            )));
        }
        let mut data = self.data.write().await;
        let mark = Mark {
            id: mint_id("MRK", data.marks.len()),
            student_id: id.clone(),
            subject: subject.to_string(),
            assessment: assessment.to_string(),
            score,
            max_score,
        };
        data.marks.push(mark.clone());
        Ok(mark)
    }

    // ---- curriculum ----

    pub async fn curriculum_for_student(&self, id: &StudentId) -> Result<Curriculum, StoreError> {
        self.simulate_latency().await;
        self.data
            .read()
            .await
            .curricula
            .iter()
            .find(|c| &c.student_id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("curriculum not found: {}", id)))
    }

    /// Regeneration never mutates the dataset; known students get their
    /// canned plan, unknown students a freshly minted default.
    pub async fn generate_curriculum(
        &self,
        id: &StudentId,
        mode: CurriculumIdMode,
    ) -> Curriculum {
        self.simulate_latency().await;
        let data = self.data.read().await;
        curriculum::generate(&data, id, mode)
    }

    pub async fn edit_curriculum(
        &self,
        id: &StudentId,
        content: Vec<CurriculumSubject>,
        mode: CurriculumIdMode,
    ) -> Result<Curriculum, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        if content.is_empty() {
            return Err(StoreError::InvalidInput(
                "curriculum content is empty".into(),
            ));
        }
        let mut data = self.data.write().await;
        if let Some(existing) = data.curricula.iter_mut().find(|c| &c.student_id == id) {
            existing.content = content;
            return Ok(existing.clone());
        }
        let mut fresh = curriculum::default_curriculum(id, mode);
        fresh.content = content;
        data.curricula.push(fresh.clone());
        Ok(fresh)
    }

    pub async fn download_curriculum(&self, id: &StudentId) -> Result<usize, StoreError> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let c = data
            .curricula
            .iter()
            .find(|c| &c.student_id == id)
            .ok_or_else(|| StoreError::NotFound(format!("curriculum not found: {}", id)))?;
        Ok(c.content.len())
    }

    // ---- transport ----

    pub async fn list_routes(&self) -> Vec<Route> {
        self.simulate_latency().await;
        self.data.read().await.routes.clone()
    }

    pub async fn routes_for_driver(&self, driver_username: &str) -> Vec<Route> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let assigned: Vec<&RouteId> = data
            .driver_assignments
            .iter()
            .filter(|a| a.driver_username == driver_username)
            .map(|a| &a.route_id)
            .collect();
        data.routes
            .iter()
            .filter(|r| assigned.contains(&&r.id))
            .cloned()
            .collect()
    }

    pub async fn get_route(&self, id: &RouteId) -> Result<Route, StoreError> {
        self.simulate_latency().await;
        self.data
            .read()
            .await
            .routes
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("route not found: {}", id)))
    }

    pub async fn stop_statuses(
        &self,
        route: &RouteId,
        date: Option<NaiveDate>,
    ) -> Result<Vec<StopStatus>, StoreError> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        if !data.routes.iter().any(|r| &r.id == route) {
            return Err(StoreError::NotFound(format!("route not found: {}", route)));
        }
        Ok(data
            .stop_statuses
            .iter()
            .filter(|s| &s.route_id == route && date.is_none_or(|d| s.date == d))
            .cloned()
            .collect())
    }

    pub async fn report_stop_status(
        &self,
        route: &RouteId,
        stop_id: &str,
        date: NaiveDate,
        state: StopState,
    ) -> Result<StopStatus, StoreError> {
        self.simulate_latency().await;
        let mut data = self.data.write().await;
        let route_def = data
            .routes
            .iter()
            .find(|r| &r.id == route)
            .ok_or_else(|| StoreError::NotFound(format!("route not found: {}", route)))?;
        if !route_def.stops.iter().any(|s| s.id == stop_id) {
            return Err(StoreError::NotFound(format!(
                "stop not found on {}: {}",
                route, stop_id
            )));
        }
        let now = Utc::now();
        if let Some(existing) = data
            .stop_statuses
            .iter_mut()
            .find(|s| &s.route_id == route && s.stop_id == stop_id && s.date == date)
        {
            existing.state = state;
            existing.reported_at = Some(now);
            return Ok(existing.clone());
        }
        let status = StopStatus {
            id: mint_id("STS", data.stop_statuses.len()),
            route_id: route.clone(),
            stop_id: stop_id.to_string(),
            date,
            state,
            reported_at: Some(now),
        };
        data.stop_statuses.push(status.clone());
        Ok(status)
    }

    // ---- hall tickets / leaves / calendar ----

    pub async fn hall_tickets_for_student(
        &self,
        id: &StudentId,
    ) -> Result<Vec<HallTicket>, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        Ok(self
            .data
            .read()
            .await
            .hall_tickets
            .iter()
            .filter(|t| &t.student_id == id)
            .cloned()
            .collect())
    }

    pub async fn leaves_for_student(
        &self,
        id: &StudentId,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        Ok(self
            .data
            .read()
            .await
            .leaves
            .iter()
            .filter(|l| &l.student_id == id)
            .cloned()
            .collect())
    }

    pub async fn submit_leave(
        &self,
        id: &StudentId,
        from_date: NaiveDate,
        to_date: NaiveDate,
        reason: &str,
    ) -> Result<LeaveRequest, StoreError> {
        self.simulate_latency().await;
        self.ensure_student(id).await?;
        if to_date < from_date {
            return Err(StoreError::InvalidInput(
                "leave to_date precedes from_date".into(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(StoreError::InvalidInput("leave reason is empty".into()));
        }
        let mut data = self.data.write().await;
        let leave = LeaveRequest {
            id: mint_id("LVE", data.leaves.len()),
            student_id: id.clone(),
            from_date,
            to_date,
            reason: reason.to_string(),
            status: LeaveStatus::Submitted,
        };
        data.leaves.push(leave.clone());
        Ok(leave)
    }

    pub async fn calendar_events(&self) -> Vec<CalendarEvent> {
        self.simulate_latency().await;
        self.data.read().await.calendar.clone()
    }

    // ---- notifications ----

    pub async fn notifications_for(&self, recipient: &str) -> Vec<Notification> {
        self.simulate_latency().await;
        let mut items: Vec<Notification> = self
            .data
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.recipient_username == recipient)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    pub async fn notification_count(&self, recipient: &str) -> usize {
        self.simulate_latency().await;
        self.data
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.recipient_username == recipient)
            .count()
    }

    pub async fn add_notification(
        &self,
        recipient: &str,
        student_id: Option<StudentId>,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Result<Notification, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::InvalidInput("notification title is empty".into()));
        }
        let mut data = self.data.write().await;
        let note = Notification {
            id: mint_id("NTF", data.notifications.len()),
            recipient_username: recipient.to_string(),
            student_id,
            kind,
            title: title.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        };
        data.notifications.push(note.clone());
        Ok(note)
    }

    /// Resolves the parent username for a student, for event fan-out.
    /// Bypasses simulated latency.
    pub async fn parent_of(&self, id: &StudentId) -> Option<String> {
        self.data
            .read()
            .await
            .students
            .iter()
            .find(|s| &s.id == id)
            .map(|s| s.parent_username.clone())
    }

    // ---- sessions (JWT inactivity windows) ----

    pub async fn create_session(&self, jti: &str, username: &str) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.entry(jti.to_string()).or_insert(Session {
            jti: jti.to_string(),
            username: username.to_string(),
            issued_at: now,
            last_used_at: now,
        });
    }

    /// Touch the session atomically, but only if it has not idled out.
    /// Returns `true` if the session was found and updated.
    pub async fn touch_session_with_cutoff(
        &self,
        jti: &str,
        cutoff: DateTime<Utc>,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(jti) {
            Some(s) if s.last_used_at >= cutoff => {
                s.last_used_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

fn mint_id(prefix: &str, existing: usize) -> String {
    format!("{}{:03}", prefix, existing + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn store() -> Store {
        Store::new(Dataset::sample(), None)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn stu002_has_exactly_one_pending_fee() {
        let fees = store().fees_for_student(&"STU002".into()).await.unwrap();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].status, FeeStatus::Pending);
    }

    #[tokio::test]
    async fn fees_for_unknown_student_is_not_found() {
        let err = store().fees_for_student(&"STU999".into()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn getters_are_idempotent() {
        let s = store();
        let a = s.fees_for_student(&"STU001".into()).await.unwrap();
        let b = s.fees_for_student(&"STU001".into()).await.unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
        let r1 = s.routes_for_driver("dummy_driver_001").await;
        let r2 = s.routes_for_driver("dummy_driver_001").await;
        assert_eq!(serde_json::to_string(&r1).unwrap(), serde_json::to_string(&r2).unwrap());
    }

    #[tokio::test]
    async fn driver_sees_both_assigned_routes() {
        let routes = store().routes_for_driver("dummy_driver_001").await;
        let ids: Vec<&str> = routes.iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"ROUTE001"));
        assert!(ids.contains(&"ROUTE002"));
    }

    #[tokio::test]
    async fn stop_statuses_filter_by_date() {
        let s = store();
        let day = date("2023-11-03");
        let mut all = s.stop_statuses(&"ROUTE001".into(), None).await.unwrap();
        all.extend(s.stop_statuses(&"ROUTE002".into(), None).await.unwrap());
        assert_eq!(all.len(), 4);
        let mut on_day = s
            .stop_statuses(&"ROUTE001".into(), Some(day))
            .await
            .unwrap();
        on_day.extend(s.stop_statuses(&"ROUTE002".into(), Some(day)).await.unwrap());
        assert_eq!(on_day.len(), 2);
    }

    #[tokio::test]
    async fn pay_fee_transitions_and_rejects_double_pay() {
        let s = store();
        let fee = s.pay_fee(&"STU002".into(), "FEE003").await.unwrap();
        assert_eq!(fee.status, FeeStatus::Paid);
        let err = s.pay_fee(&"STU002".into(), "FEE003").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        let err = s.pay_fee(&"STU002".into(), "FEE999").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn attendance_upserts_per_day() {
        let s = store();
        let day = date("2023-11-06");
        let first = s
            .record_attendance(&"STU001".into(), day, AttendanceStatus::Absent)
            .await
            .unwrap();
        let second = s
            .record_attendance(&"STU001".into(), day, AttendanceStatus::Late)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        let on_day = s
            .attendance_for_student(&"STU001".into(), Some(day))
            .await
            .unwrap();
        assert_eq!(on_day.len(), 1);
        assert_eq!(on_day[0].status, AttendanceStatus::Late);
    }

    #[tokio::test]
    async fn submit_leave_validates_range() {
        let s = store();
        let err = s
            .submit_leave(
                &"STU001".into(),
                date("2023-11-10"),
                date("2023-11-08"),
                "trip",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        let leave = s
            .submit_leave(
                &"STU001".into(),
                date("2023-11-08"),
                date("2023-11-10"),
                "trip",
            )
            .await
            .unwrap();
        assert_eq!(leave.status, LeaveStatus::Submitted);
        let listed = s.leaves_for_student(&"STU001".into()).await.unwrap();
        assert!(listed.iter().any(|l| l.id == leave.id));
    }

    #[tokio::test]
    async fn edit_curriculum_persists_in_process() {
        let s = store();
        let content = vec![CurriculumSubject {
            subject: "History".to_string(),
            topics: vec!["Indus valley".to_string()],
            difficulty: Difficulty::Beginner,
        }];
        let updated = s
            .edit_curriculum(&"STU001".into(), content, CurriculumIdMode::Stable)
            .await
            .unwrap();
        assert_eq!(updated.content.len(), 1);
        let fetched = s.curriculum_for_student(&"STU001".into()).await.unwrap();
        assert_eq!(fetched.content[0].subject, "History");
    }

    #[tokio::test]
    async fn finance_overview_totals_match_fixture() {
        let o = store().finance_overview().await;
        assert_eq!(o.total_billed_cents, 3_975_000);
        assert_eq!(o.total_paid_cents, 2_500_000);
        assert_eq!(o.total_pending_cents, 1_295_000);
        assert_eq!(o.total_overdue_cents, 180_000);
        // STU001 (overdue), STU002 (pending), STU003 (pending)
        assert_eq!(o.students_with_dues, 3);
    }

    #[tokio::test]
    async fn session_touch_respects_cutoff() {
        let s = store();
        s.create_session("jti-1", "priya.sharma").await;
        let fresh_cutoff = Utc::now() - ChronoDuration::days(1);
        assert!(s.touch_session_with_cutoff("jti-1", fresh_cutoff).await);
        let future_cutoff = Utc::now() + ChronoDuration::days(1);
        assert!(!s.touch_session_with_cutoff("jti-1", future_cutoff).await);
        assert!(!s.touch_session_with_cutoff("missing", fresh_cutoff).await);
    }

    #[tokio::test]
    async fn simulated_latency_delays_reads() {
        let s = Store::new(Dataset::sample(), Some((20, 30)));
        let started = std::time::Instant::now();
        let _ = s.list_students().await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
