use crate::error::{AttendanceError, AttendanceResult};
use crate::model::{Status, StatusAssignment, Student, SubmissionPayload};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

pub const EMPTY_SUBMISSION: &str = "select at least one student before submitting";
pub const ALREADY_SUBMITTED: &str = "check-in already submitted; start a new session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Populated,
    Submitted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusGroup {
    pub count: usize,
    pub students: Vec<StatusAssignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusGroups {
    pub present: StatusGroup,
    pub leave: StatusGroup,
    pub absent: StatusGroup,
    pub unknown: StatusGroup,
}

impl StatusGroups {
    pub fn get(&self, status: Status) -> &StatusGroup {
        match status {
            Status::Present => &self.present,
            Status::Leave => &self.leave,
            Status::Absent => &self.absent,
            Status::Unknown => &self.unknown,
        }
    }

    fn get_mut(&mut self, status: Status) -> &mut StatusGroup {
        match status {
            Status::Present => &mut self.present,
            Status::Leave => &mut self.leave,
            Status::Absent => &mut self.absent,
            Status::Unknown => &mut self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        Status::ALL.iter().map(|s| self.get(*s).count).sum()
    }
}

/// The open check-in: at most one assignment per student, kept in the order
/// students were (re)assigned.
#[derive(Debug, Clone, Default)]
pub struct CheckInSession {
    date: Option<String>,
    assignments: Vec<StatusAssignment>,
    submitted: bool,
}

impl CheckInSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.submitted {
            SessionState::Submitted
        } else if self.assignments.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Populated
        }
    }

    /// Timestamp stamped by the last `finalize`, if any.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn status_of(&self, student_id: &str) -> Option<Status> {
        self.assignments
            .iter()
            .find(|a| a.student_id == student_id)
            .map(|a| a.status)
    }

    fn ensure_open(&self) -> AttendanceResult<()> {
        if self.submitted {
            return Err(AttendanceError::validation(ALREADY_SUBMITTED));
        }
        Ok(())
    }

    /// Sets `student`'s status, replacing any earlier one.
    pub fn assign(&mut self, student: &Student, status: Status) -> AttendanceResult<()> {
        self.ensure_open()?;
        self.assignments.retain(|a| a.student_id != student.id);
        self.assignments.push(StatusAssignment {
            student_id: student.id.clone(),
            number: student.number,
            name: student.name.clone(),
            status,
        });
        Ok(())
    }

    /// Returns whether an assignment was removed. Removing an unassigned
    /// student is not an error.
    pub fn remove(&mut self, student_id: &str) -> AttendanceResult<bool> {
        self.ensure_open()?;
        let before = self.assignments.len();
        self.assignments.retain(|a| a.student_id != student_id);
        Ok(self.assignments.len() != before)
    }

    /// Returns the session to `Empty`. A submitted session is reset too, so
    /// the next assignment starts a fresh check-in.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn derive_groups(&self) -> StatusGroups {
        let mut groups = StatusGroups::default();
        for a in &self.assignments {
            let g = groups.get_mut(a.status);
            g.students.push(a.clone());
            g.count += 1;
        }
        groups
    }

    pub fn finalize(&mut self) -> AttendanceResult<SubmissionPayload> {
        self.finalize_at(Utc::now())
    }

    /// Stamps the session date and returns an owned copy of the assignments.
    /// Later edits to the session never reach a payload already handed out.
    pub fn finalize_at(&mut self, now: DateTime<Utc>) -> AttendanceResult<SubmissionPayload> {
        self.ensure_open()?;
        if self.assignments.is_empty() {
            return Err(AttendanceError::validation(EMPTY_SUBMISSION));
        }
        let date = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.date = Some(date.clone());
        Ok(SubmissionPayload {
            date,
            students: self.assignments.clone(),
        })
    }

    /// Called once the store has accepted the finalized payload.
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
    }
}
