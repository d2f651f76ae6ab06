use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::reports::repo::{RetentionMonth, SessionAttendanceRow, StepCount, UpcomingSession};

#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub sessions_last_90_days: i64,
    pub attended_last_90_days: i64,
    pub last_attended_at: Option<OffsetDateTime>,
    pub sober_since: Date,
    pub days_sober: i64,
    pub current_step: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct GlobalReport {
    pub steps: Vec<StepCount>,
    pub retention: Vec<RetentionMonth>,
    pub average_attendance: f64,
    pub past_sessions: i64,
    pub active_members: i64,
    pub inactive_members: i64,
}

/// Chart-ready attendance series: one label and one count per session.
#[derive(Debug, Serialize)]
pub struct AttendanceSeries {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

impl AttendanceSeries {
    pub fn from_rows(rows: Vec<SessionAttendanceRow>) -> Self {
        let mut labels = Vec::with_capacity(rows.len());
        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            labels.push(format!("{}: {}", row.held_on, row.topic));
            data.push(row.attendees);
        }
        AttendanceSeries { labels, data }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub active_members: i64,
    pub attendance_today: i64,
    pub new_this_week: i64,
    pub next_session: Option<UpcomingSession>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_series_pairs_label_with_count() {
        let rows = vec![
            SessionAttendanceRow {
                session_id: 1,
                topic: "Step work".into(),
                held_on: "03 Aug".into(),
                attendees: 7,
            },
            SessionAttendanceRow {
                session_id: 2,
                topic: "Open share".into(),
                held_on: "10 Aug".into(),
                attendees: 0,
            },
        ];

        let series = AttendanceSeries::from_rows(rows);
        assert_eq!(series.labels, vec!["03 Aug: Step work", "10 Aug: Open share"]);
        assert_eq!(series.data, vec![7, 0]);
    }

    #[test]
    fn attendance_series_is_empty_without_sessions() {
        let series = AttendanceSeries::from_rows(Vec::new());
        assert!(series.labels.is_empty());
        assert!(series.data.is_empty());
    }
}
