mod http;
mod local;

pub use http::HttpRecordStore;
pub use local::LocalRecordStore;

use crate::config::StoreConfig;
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::{AbsenceStat, CheckInRecord, ImportStudent, Student, SubmissionPayload};

/// The record store boundary. Each call is one request/response exchange;
/// nothing is retried and nothing is cached here.
pub trait RecordStore {
    fn list_students(&self) -> AttendanceResult<Vec<Student>>;
    fn list_check_ins(&self) -> AttendanceResult<Vec<CheckInRecord>>;
    fn list_absence_stats(&self) -> AttendanceResult<Vec<AbsenceStat>>;
    fn submit_check_in(&self, payload: &SubmissionPayload) -> AttendanceResult<()>;
    fn delete_check_in(&self, check_in_id: &str) -> AttendanceResult<()>;
    fn delete_student(&self, student_id: &str) -> AttendanceResult<()>;
    fn append_students(&self, students: &[ImportStudent]) -> AttendanceResult<()>;

    fn import_students(&self, students: &[ImportStudent]) -> AttendanceResult<()> {
        if students.is_empty() {
            return Err(AttendanceError::validation("no students to import"));
        }
        self.append_students(students)
    }
}

pub fn open_store(config: &StoreConfig) -> anyhow::Result<Box<dyn RecordStore>> {
    match config {
        StoreConfig::Http {
            url,
            store_id,
            relay_url,
        } => Ok(Box::new(HttpRecordStore::new(
            url.clone(),
            store_id.clone(),
            relay_url.clone(),
        )?)),
        StoreConfig::Local { path } => Ok(Box::new(LocalRecordStore::open(path)?)),
    }
}
