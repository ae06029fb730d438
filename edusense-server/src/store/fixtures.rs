//! The seed dataset. A deployment can replace it via `fixtures_path` in the
//! config; the built-in sample mirrors the portal's demo school.

use chrono::NaiveDate;
use edusense_shared::domain::*;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub fees: Vec<Fee>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub driver_assignments: Vec<DriverAssignment>,
    #[serde(default)]
    pub stop_statuses: Vec<StopStatus>,
    #[serde(default)]
    pub diary: Vec<DiaryEntry>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub marks: Vec<Mark>,
    #[serde(default)]
    pub curricula: Vec<Curriculum>,
    #[serde(default)]
    pub hall_tickets: Vec<HallTicket>,
    #[serde(default)]
    pub leaves: Vec<LeaveRequest>,
    #[serde(default)]
    pub calendar: Vec<CalendarEvent>,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Dataset {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let text = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Built-in demo school dataset.
    pub fn sample() -> Self {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture date");

        let students = vec![
            Student {
                id: "STU001".into(),
                name: "Aarav Sharma".to_string(),
                class_id: "CLS5A".to_string(),
                parent_username: "priya.sharma".to_string(),
                route_id: Some("ROUTE001".into()),
            },
            Student {
                id: "STU002".into(),
                name: "Diya Patel".to_string(),
                class_id: "CLS5A".to_string(),
                parent_username: "nikhil.patel".to_string(),
                route_id: Some("ROUTE001".into()),
            },
            Student {
                id: "STU003".into(),
                name: "Rohan Gupta".to_string(),
                class_id: "CLS6B".to_string(),
                parent_username: "meera.gupta".to_string(),
                route_id: Some("ROUTE002".into()),
            },
            Student {
                id: "STU004".into(),
                name: "Sara Khan".to_string(),
                class_id: "CLS6B".to_string(),
                parent_username: "imran.khan".to_string(),
                route_id: None,
            },
        ];

        let fees = vec![
            Fee {
                id: "FEE001".to_string(),
                student_id: "STU001".into(),
                description: "Term 2 tuition".to_string(),
                amount_cents: 1_250_000,
                status: FeeStatus::Paid,
                due_date: d("2023-10-15"),
            },
            Fee {
                id: "FEE002".to_string(),
                student_id: "STU001".into(),
                description: "Transport - Q4".to_string(),
                amount_cents: 180_000,
                status: FeeStatus::Overdue,
                due_date: d("2023-10-31"),
            },
            // STU002 carries exactly one fee, still pending.
            Fee {
                id: "FEE003".to_string(),
                student_id: "STU002".into(),
                description: "Term 2 tuition".to_string(),
                amount_cents: 1_250_000,
                status: FeeStatus::Pending,
                due_date: d("2023-11-15"),
            },
            Fee {
                id: "FEE004".to_string(),
                student_id: "STU003".into(),
                description: "Term 2 tuition".to_string(),
                amount_cents: 1_250_000,
                status: FeeStatus::Paid,
                due_date: d("2023-10-15"),
            },
            Fee {
                id: "FEE005".to_string(),
                student_id: "STU003".into(),
                description: "Science lab kit".to_string(),
                amount_cents: 45_000,
                status: FeeStatus::Pending,
                due_date: d("2023-12-01"),
            },
        ];

        let attendance = vec![
            AttendanceRecord {
                id: "ATT001".to_string(),
                student_id: "STU001".into(),
                date: d("2023-11-01"),
                status: AttendanceStatus::Present,
            },
            AttendanceRecord {
                id: "ATT002".to_string(),
                student_id: "STU001".into(),
                date: d("2023-11-02"),
                status: AttendanceStatus::Late,
            },
            AttendanceRecord {
                id: "ATT003".to_string(),
                student_id: "STU001".into(),
                date: d("2023-11-03"),
                status: AttendanceStatus::Present,
            },
            AttendanceRecord {
                id: "ATT004".to_string(),
                student_id: "STU002".into(),
                date: d("2023-11-03"),
                status: AttendanceStatus::Absent,
            },
            AttendanceRecord {
                id: "ATT005".to_string(),
                student_id: "STU003".into(),
                date: d("2023-11-03"),
                status: AttendanceStatus::Present,
            },
        ];

        let routes = vec![
            Route {
                id: "ROUTE001".into(),
                name: "North Loop".to_string(),
                stops: vec![
                    Stop {
                        id: "STP001".to_string(),
                        name: "Maple Gate".to_string(),
                        latitude: 12.9352,
                        longitude: 77.6245,
                        arrival_time: "07:20".to_string(),
                    },
                    Stop {
                        id: "STP002".to_string(),
                        name: "Lakeview Circle".to_string(),
                        latitude: 12.9411,
                        longitude: 77.6330,
                        arrival_time: "07:35".to_string(),
                    },
                    Stop {
                        id: "STP003".to_string(),
                        name: "Hill Road Market".to_string(),
                        latitude: 12.9488,
                        longitude: 77.6391,
                        arrival_time: "07:50".to_string(),
                    },
                ],
            },
            Route {
                id: "ROUTE002".into(),
                name: "Riverside".to_string(),
                stops: vec![
                    Stop {
                        id: "STP004".to_string(),
                        name: "Old Bridge".to_string(),
                        latitude: 12.9102,
                        longitude: 77.5991,
                        arrival_time: "07:15".to_string(),
                    },
                    Stop {
                        id: "STP005".to_string(),
                        name: "Temple Street".to_string(),
                        latitude: 12.9175,
                        longitude: 77.6042,
                        arrival_time: "07:40".to_string(),
                    },
                ],
            },
        ];

        let driver_assignments = vec![
            DriverAssignment {
                driver_username: "dummy_driver_001".to_string(),
                route_id: "ROUTE001".into(),
            },
            DriverAssignment {
                driver_username: "dummy_driver_001".to_string(),
                route_id: "ROUTE002".into(),
            },
        ];

        // Four statuses total; exactly two fall on 2023-11-03.
        let stop_statuses = vec![
            StopStatus {
                id: "STS001".to_string(),
                route_id: "ROUTE001".into(),
                stop_id: "STP001".to_string(),
                date: d("2023-11-02"),
                state: StopState::Arrived,
                reported_at: None,
            },
            StopStatus {
                id: "STS002".to_string(),
                route_id: "ROUTE001".into(),
                stop_id: "STP001".to_string(),
                date: d("2023-11-03"),
                state: StopState::Arrived,
                reported_at: None,
            },
            StopStatus {
                id: "STS003".to_string(),
                route_id: "ROUTE001".into(),
                stop_id: "STP002".to_string(),
                date: d("2023-11-03"),
                state: StopState::Pending,
                reported_at: None,
            },
            StopStatus {
                id: "STS004".to_string(),
                route_id: "ROUTE002".into(),
                stop_id: "STP004".to_string(),
                date: d("2023-11-04"),
                state: StopState::Skipped,
                reported_at: None,
            },
        ];

        let diary = vec![
            DiaryEntry {
                id: "DRY001".to_string(),
                student_id: "STU001".into(),
                teacher_username: "anita.rao".to_string(),
                date: d("2023-11-02"),
                content: "Finish fractions worksheet, pages 12-14.".to_string(),
            },
            DiaryEntry {
                id: "DRY002".to_string(),
                student_id: "STU002".into(),
                teacher_username: "anita.rao".to_string(),
                date: d("2023-11-03"),
                content: "Bring herbarium sheets for the science display.".to_string(),
            },
        ];

        let notifications = vec![Notification {
            id: "NTF001".to_string(),
            recipient_username: "priya.sharma".to_string(),
            student_id: Some("STU001".into()),
            kind: NotificationKind::Transport,
            title: "Route change".to_string(),
            message: "North Loop departs 10 minutes earlier this week.".to_string(),
            created_at: d("2023-11-01").and_hms_opt(6, 30, 0).unwrap().and_utc(),
        }];

        let marks = vec![
            Mark {
                id: "MRK001".to_string(),
                student_id: "STU001".into(),
                subject: "Mathematics".to_string(),
                assessment: "Unit test 3".to_string(),
                score: 42.0,
                max_score: 50.0,
            },
            Mark {
                id: "MRK002".to_string(),
                student_id: "STU001".into(),
                subject: "Science".to_string(),
                assessment: "Unit test 3".to_string(),
                score: 38.5,
                max_score: 50.0,
            },
            Mark {
                id: "MRK003".to_string(),
                student_id: "STU002".into(),
                subject: "Mathematics".to_string(),
                assessment: "Unit test 3".to_string(),
                score: 47.0,
                max_score: 50.0,
            },
        ];

        let curricula = vec![
            Curriculum {
                id: "CURR-830114".to_string(),
                student_id: "STU001".into(),
                content: vec![
                    CurriculumSubject {
                        subject: "Mathematics".to_string(),
                        topics: vec![
                            "Fractions and decimals".to_string(),
                            "Geometry basics".to_string(),
                            "Word problems".to_string(),
                        ],
                        difficulty: Difficulty::Intermediate,
                    },
                    CurriculumSubject {
                        subject: "Science".to_string(),
                        topics: vec![
                            "Plant life cycles".to_string(),
                            "Simple machines".to_string(),
                        ],
                        difficulty: Difficulty::Beginner,
                    },
                ],
            },
            Curriculum {
                id: "CURR-417292".to_string(),
                student_id: "STU002".into(),
                content: vec![
                    CurriculumSubject {
                        subject: "Mathematics".to_string(),
                        topics: vec![
                            "Advanced fractions".to_string(),
                            "Intro to algebra".to_string(),
                        ],
                        difficulty: Difficulty::Advanced,
                    },
                    CurriculumSubject {
                        subject: "English".to_string(),
                        topics: vec![
                            "Comprehension".to_string(),
                            "Essay structure".to_string(),
                        ],
                        difficulty: Difficulty::Intermediate,
                    },
                ],
            },
            Curriculum {
                id: "CURR-552301".to_string(),
                student_id: "STU003".into(),
                content: vec![CurriculumSubject {
                    subject: "Science".to_string(),
                    topics: vec![
                        "Electricity".to_string(),
                        "Magnetism".to_string(),
                        "Lab safety".to_string(),
                    ],
                    difficulty: Difficulty::Intermediate,
                }],
            },
        ];

        let hall_tickets = vec![
            HallTicket {
                id: "HT001".to_string(),
                student_id: "STU001".into(),
                exam_name: "Term 2 finals".to_string(),
                venue: "Hall B".to_string(),
                date: d("2023-12-11"),
            },
            HallTicket {
                id: "HT002".to_string(),
                student_id: "STU002".into(),
                exam_name: "Term 2 finals".to_string(),
                venue: "Hall B".to_string(),
                date: d("2023-12-11"),
            },
        ];

        let leaves = vec![LeaveRequest {
            id: "LVE001".to_string(),
            student_id: "STU003".into(),
            from_date: d("2023-10-09"),
            to_date: d("2023-10-11"),
            reason: "Family function".to_string(),
            status: LeaveStatus::Approved,
        }];

        let calendar = vec![
            CalendarEvent {
                id: "CAL001".to_string(),
                date: d("2023-11-14"),
                title: "Children's Day assembly".to_string(),
                kind: CalendarKind::Event,
            },
            CalendarEvent {
                id: "CAL002".to_string(),
                date: d("2023-12-11"),
                title: "Term 2 finals begin".to_string(),
                kind: CalendarKind::Exam,
            },
            CalendarEvent {
                id: "CAL003".to_string(),
                date: d("2023-11-27"),
                title: "Last day for fee payment".to_string(),
                kind: CalendarKind::ImportantDay,
            },
        ];

        Dataset {
            students,
            fees,
            attendance,
            routes,
            driver_assignments,
            stop_statuses,
            diary,
            notifications,
            marks,
            curricula,
            hall_tickets,
            leaves,
            calendar,
        }
    }
}
