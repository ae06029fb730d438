use serde::{Deserialize, Serialize};

use crate::domain::{
    AttendanceStatus, CalendarKind, Difficulty, FeeStatus, LeaveStatus, NotificationKind,
    StopState,
};

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

pub const API_V1_PREFIX: &str = "/api/v1";

/// Path prefix for all school-scoped endpoints: `/api/v1/school/{school_id}`.
pub fn school_scope(school_id: &str) -> String {
    format!("{}/school/{}", API_V1_PREFIX, school_id)
}

// Auth
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResp {
    pub token: String,
}

// Students
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentDto {
    pub id: String,
    pub name: String,
    pub class_id: String,
    pub route_id: Option<String>,
}

// Fees
#[derive(Debug, Serialize, Deserialize)]
pub struct FeeDto {
    pub id: String,
    pub student_id: String,
    pub description: String,
    pub amount_cents: i64,
    pub status: FeeStatus,
    pub due_date: String, // YYYY-MM-DD
}

// Attendance
#[derive(Debug, Serialize, Deserialize)]
pub struct AttendanceDto {
    pub id: String,
    pub date: String, // YYYY-MM-DD
    pub status: AttendanceStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordAttendanceReq {
    pub date: String,
    pub status: AttendanceStatus,
}

// Diary
#[derive(Debug, Serialize, Deserialize)]
pub struct DiaryEntryDto {
    pub id: String,
    pub date: String,
    pub teacher: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiaryEntryReq {
    pub date: String,
    pub content: String,
}

// Marks
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkDto {
    pub id: String,
    pub subject: String,
    pub assessment: String,
    pub score: f64,
    pub max_score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReq {
    pub subject: String,
    pub assessment: String,
    pub score: f64,
    pub max_score: f64,
}

// Curriculum
#[derive(Debug, Serialize, Deserialize)]
pub struct CurriculumSubjectDto {
    pub subject: String,
    pub topics: Vec<String>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurriculumDto {
    pub id: String,
    pub student_id: String,
    pub content: Vec<CurriculumSubjectDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurriculumEditReq {
    pub content: Vec<CurriculumSubjectDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurriculumDownloadResp {
    pub success: bool,
    pub subjects: usize,
}

// Hall tickets
#[derive(Debug, Serialize, Deserialize)]
pub struct HallTicketDto {
    pub id: String,
    pub exam_name: String,
    pub venue: String,
    pub date: String,
}

// Leaves
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveDto {
    pub id: String,
    pub from_date: String,
    pub to_date: String,
    pub reason: String,
    pub status: LeaveStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveReq {
    pub from_date: String,
    pub to_date: String,
    pub reason: String,
}

// Transport
#[derive(Debug, Serialize, Deserialize)]
pub struct StopDto {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub arrival_time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteDto {
    pub id: String,
    pub name: String,
    pub stops: Vec<StopDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopStatusDto {
    pub id: String,
    pub stop_id: String,
    pub date: String,
    pub state: StopState,
    pub reported_at: Option<String>, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportStopStatusReq {
    pub date: String,
    pub state: StopState,
}

// Calendar
#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarEventDto {
    pub id: String,
    pub date: String,
    pub title: String,
    pub kind: CalendarKind,
}

// Notifications
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationDto {
    pub id: String,
    pub student_id: Option<String>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: String, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationCountDto {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerNotificationReq {
    pub recipient: String,
    pub student_id: Option<String>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerNotificationResp {
    pub id: String,
    pub created_at: String,
}

// Finance (admin)
#[derive(Debug, Serialize, Deserialize)]
pub struct FinanceOverviewDto {
    pub total_billed_cents: i64,
    pub total_paid_cents: i64,
    pub total_pending_cents: i64,
    pub total_overdue_cents: i64,
    pub students_with_dues: usize,
}

// Version (public)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VersionInfoDto {
    pub version: String,
}
