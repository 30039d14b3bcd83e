use crate::error::{AttendanceError, AttendanceResult};
use crate::model::{CheckInRecord, RecordedAssignment, Status};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// Client-side copy of submitted check-ins, replaced wholesale on refresh.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    records: Vec<CheckInRecord>,
}

impl HistoryStore {
    pub fn replace(&mut self, records: Vec<CheckInRecord>) {
        self.records = records;
    }

    pub fn records(&self) -> &[CheckInRecord] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<&CheckInRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn summaries(&self) -> Vec<RecordSummary> {
        sort_by_date_desc(&self.records)
            .into_iter()
            .map(summarize)
            .collect()
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (UTC midnight).
pub fn parse_record_date(raw: &str) -> AttendanceResult<DateTime<Utc>> {
    let t = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(AttendanceError::data_integrity(format!(
        "malformed check-in date: {raw:?}"
    )))
}

/// Newest first. Equal timestamps keep fetch order; undated records go last.
pub fn sort_by_date_desc(records: &[CheckInRecord]) -> Vec<&CheckInRecord> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, &CheckInRecord)> = records
        .iter()
        .map(|r| (parse_record_date(&r.date).ok(), r))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(_, r)| r).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub present: usize,
    pub leave: usize,
    pub absent: usize,
    pub unknown: usize,
    /// Entries whose status is none of the four known values.
    pub unrecognized: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: Status) {
        match status {
            Status::Present => self.present += 1,
            Status::Leave => self.leave += 1,
            Status::Absent => self.absent += 1,
            Status::Unknown => self.unknown += 1,
        }
    }
}

/// Strict tally: the first unrecognized status fails the whole count.
pub fn count_by_status(record: &CheckInRecord) -> AttendanceResult<StatusCounts> {
    let mut counts = StatusCounts::default();
    for a in &record.students {
        counts.bump(a.status()?);
    }
    Ok(counts)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: String,
    pub date: String,
    /// Normalized UTC timestamp, absent when `date` could not be read.
    pub timestamp: Option<String>,
    pub counts: StatusCounts,
    pub issues: Vec<String>,
}

/// Lenient tally used for list display: problems are reported alongside the
/// counts instead of hiding the record.
pub fn summarize(record: &CheckInRecord) -> RecordSummary {
    let mut issues = Vec::new();
    let timestamp = match parse_record_date(&record.date) {
        Ok(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Err(e) => {
            issues.push(e.to_string());
            None
        }
    };
    let mut counts = StatusCounts::default();
    for a in &record.students {
        match a.status() {
            Ok(s) => counts.bump(s),
            Err(e) => {
                counts.unrecognized += 1;
                issues.push(format!("{} ({} {})", e, a.number, a.name));
            }
        }
    }
    RecordSummary {
        id: record.id.clone(),
        date: record.date.clone(),
        timestamp,
        counts,
        issues,
    }
}

/// Assignments in roster order; equal numbers keep stored order.
pub fn detail_sorted(record: &CheckInRecord) -> Vec<&RecordedAssignment> {
    let mut rows: Vec<&RecordedAssignment> = record.students.iter().collect();
    rows.sort_by_key(|a| a.number);
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub id: String,
    pub number: i64,
    pub name: String,
    pub status: String,
    pub recognized: bool,
}

pub fn detail_rows(record: &CheckInRecord) -> Vec<DetailRow> {
    detail_sorted(record)
        .into_iter()
        .map(|a| DetailRow {
            id: a.id.clone(),
            number: a.number,
            name: a.name.clone(),
            status: a.status.clone(),
            recognized: a.status().is_ok(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, date: &str, students: &[(i64, &str, &str)]) -> CheckInRecord {
        CheckInRecord {
            id: id.to_string(),
            date: date.to_string(),
            students: students
                .iter()
                .map(|(number, name, status)| RecordedAssignment {
                    id: format!("s{number}"),
                    number: *number,
                    name: name.to_string(),
                    status: status.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn sorts_newest_first() {
        let records = vec![
            record("a", "2024-01-01", &[]),
            record("b", "2024-03-01", &[]),
            record("c", "2024-02-01", &[]),
        ];
        let dates: Vec<&str> = sort_by_date_desc(&records)
            .iter()
            .map(|r| r.date.as_str())
            .collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
        // Input untouched.
        assert_eq!(records[0].id, "a");
    }

    #[test]
    fn equal_timestamps_keep_fetch_order_across_calls() {
        let records = vec![
            record("first", "2024-05-01T08:00:00.000Z", &[]),
            record("older", "2024-04-01T08:00:00Z", &[]),
            record("second", "2024-05-01T15:00:00+07:00", &[]),
            record("third", "2024-05-01T08:00:00.000Z", &[]),
        ];
        for _ in 0..3 {
            let ids: Vec<&str> = sort_by_date_desc(&records)
                .iter()
                .map(|r| r.id.as_str())
                .collect();
            assert_eq!(ids, vec!["first", "second", "third", "older"]);
        }
    }

    #[test]
    fn malformed_dates_sort_last_and_are_reported() {
        let records = vec![
            record("bad", "yesterday", &[]),
            record("ok", "2024-01-01", &[]),
        ];
        let ids: Vec<&str> = sort_by_date_desc(&records)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["ok", "bad"]);

        let summary = summarize(&records[0]);
        assert_eq!(summary.timestamp, None);
        assert_eq!(summary.issues.len(), 1);
        assert!(summary.issues[0].contains("malformed check-in date"));
    }

    #[test]
    fn counts_statuses() {
        let r = record(
            "r",
            "2024-01-01",
            &[
                (1, "A", "present"),
                (2, "B", "present"),
                (3, "C", "leave"),
                (4, "D", "unknown"),
            ],
        );
        let counts = count_by_status(&r).expect("counts");
        assert_eq!(
            counts,
            StatusCounts {
                present: 2,
                leave: 1,
                absent: 0,
                unknown: 1,
                unrecognized: 0
            }
        );
    }

    #[test]
    fn unrecognized_status_is_surfaced_not_dropped() {
        let r = record("r", "2024-01-01", &[(1, "A", "present"), (2, "B", "late")]);
        let e = count_by_status(&r).unwrap_err();
        assert!(matches!(e, AttendanceError::DataIntegrity(_)));

        let summary = summarize(&r);
        assert_eq!(summary.counts.present, 1);
        assert_eq!(summary.counts.unrecognized, 1);
        assert_eq!(summary.issues.len(), 1);
        assert!(summary.issues[0].contains("late"));
    }

    #[test]
    fn detail_sort_is_numeric_and_stable() {
        let r = record(
            "r",
            "2024-01-01",
            &[
                (3, "C", "present"),
                (10, "J", "present"),
                (1, "A", "absent"),
                (2, "B1", "leave"),
                (2, "B2", "unknown"),
            ],
        );
        let names: Vec<&str> = detail_sorted(&r).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B1", "B2", "C", "J"]);
        assert_eq!(r.students[0].name, "C");
    }

    #[test]
    fn detail_rows_mark_unrecognized_status() {
        let r = record("r", "2024-01-01", &[(2, "B", "???"), (1, "A", "present")]);
        let rows = detail_rows(&r);
        assert_eq!(rows[0].name, "A");
        assert!(rows[0].recognized);
        assert!(!rows[1].recognized);
        assert_eq!(rows[1].status, "???");
    }

    #[test]
    fn store_summaries_follow_sorted_order() {
        let mut store = HistoryStore::default();
        store.replace(vec![
            record("jan", "2024-01-01", &[(1, "A", "present")]),
            record("feb", "2024-02-01", &[(1, "A", "absent")]),
        ]);
        let ids: Vec<String> = store.summaries().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["feb", "jan"]);
        assert!(store.find("jan").is_some());
        assert!(store.find("mar").is_none());

        store.replace(Vec::new());
        assert!(store.records().is_empty());
    }
}
