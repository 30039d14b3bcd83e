use super::RecordStore;
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::{
    AbsenceStat, CheckInRecord, ImportStudent, RecordedAssignment, Student, SubmissionPayload,
};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

pub const DB_FILE: &str = "rollcall.sqlite3";

/// SQLite-backed record store with the same contract as the web app.
pub struct LocalRecordStore {
    conn: Connection,
}

fn db_err(e: rusqlite::Error) -> AttendanceError {
    AttendanceError::remote(format!("local store: {e}"))
}

impl LocalRecordStore {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(DB_FILE))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS students(
                id TEXT PRIMARY KEY,
                number INTEGER NOT NULL,
                name TEXT NOT NULL,
                sort_order INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS check_ins(
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                sort_order INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS check_in_students(
                check_in_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                number INTEGER NOT NULL,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY(check_in_id, student_id),
                FOREIGN KEY(check_in_id) REFERENCES check_ins(id) ON DELETE CASCADE
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_check_in_students_student
             ON check_in_students(student_id)",
            [],
        )?;

        Ok(Self { conn })
    }

    fn next_sort_order(&self, table: &str) -> AttendanceResult<i64> {
        let max: Option<i64> = self
            .conn
            .query_row(&format!("SELECT MAX(sort_order) FROM {table}"), [], |r| {
                r.get(0)
            })
            .map_err(db_err)?;
        Ok(max.map(|m| m + 1).unwrap_or(0))
    }
}

impl RecordStore for LocalRecordStore {
    fn list_students(&self) -> AttendanceResult<Vec<Student>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, number, name FROM students ORDER BY number, sort_order")
            .map_err(db_err)?;
        stmt.query_map([], |r| {
            Ok(Student {
                id: r.get(0)?,
                number: r.get(1)?,
                name: r.get(2)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(db_err)
    }

    fn list_check_ins(&self) -> AttendanceResult<Vec<CheckInRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, date FROM check_ins ORDER BY sort_order")
            .map_err(db_err)?;
        let mut records = stmt
            .query_map([], |r| {
                Ok(CheckInRecord {
                    id: r.get(0)?,
                    date: r.get(1)?,
                    students: Vec::new(),
                })
            })
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .map_err(db_err)?;

        let mut stmt = self
            .conn
            .prepare(
                "SELECT check_in_id, student_id, number, name, status
                 FROM check_in_students
                 ORDER BY check_in_id, position",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    RecordedAssignment {
                        id: r.get(1)?,
                        number: r.get(2)?,
                        name: r.get(3)?,
                        status: r.get(4)?,
                    },
                ))
            })
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .map_err(db_err)?;

        let mut by_check_in: HashMap<String, Vec<RecordedAssignment>> = HashMap::new();
        for (check_in_id, a) in rows {
            by_check_in.entry(check_in_id).or_default().push(a);
        }
        for record in &mut records {
            record.students = by_check_in.remove(&record.id).unwrap_or_default();
        }
        Ok(records)
    }

    /// One entry per roster student: how many stored check-ins have no
    /// status for them.
    fn list_absence_stats(&self) -> AttendanceResult<Vec<AbsenceStat>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT
                   s.name,
                   (SELECT COUNT(*) FROM check_ins c
                     WHERE NOT EXISTS (
                       SELECT 1 FROM check_in_students cs
                       WHERE cs.check_in_id = c.id AND cs.student_id = s.id
                     )) AS missing
                 FROM students s
                 ORDER BY s.number, s.sort_order",
            )
            .map_err(db_err)?;
        stmt.query_map([], |r| {
            Ok(AbsenceStat {
                name: r.get(0)?,
                count: r.get(1)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(db_err)
    }

    fn submit_check_in(&self, payload: &SubmissionPayload) -> AttendanceResult<()> {
        let check_in_id = Uuid::new_v4().to_string();
        let sort_order = self.next_sort_order("check_ins")?;
        let tx = self.conn.unchecked_transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO check_ins(id, date, sort_order) VALUES(?, ?, ?)",
            (&check_in_id, &payload.date, sort_order),
        )
        .map_err(db_err)?;
        for (position, a) in payload.students.iter().enumerate() {
            tx.execute(
                "INSERT INTO check_in_students(check_in_id, student_id, number, name, status, position)
                 VALUES(?, ?, ?, ?, ?, ?)",
                (
                    &check_in_id,
                    &a.student_id,
                    a.number,
                    &a.name,
                    a.status.as_str(),
                    position as i64,
                ),
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;
        info!(check_in_id = %check_in_id, students = payload.students.len(), "local check-in stored");
        Ok(())
    }

    fn delete_check_in(&self, check_in_id: &str) -> AttendanceResult<()> {
        let n = self
            .conn
            .execute("DELETE FROM check_ins WHERE id = ?", [check_in_id])
            .map_err(db_err)?;
        if n == 0 {
            return Err(AttendanceError::remote("check-in not found"));
        }
        Ok(())
    }

    fn delete_student(&self, student_id: &str) -> AttendanceResult<()> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
                r.get::<_, i64>(0)
            })
            .optional()
            .map_err(db_err)?
            .is_some();
        if !exists {
            return Err(AttendanceError::remote("student not found"));
        }
        let tx = self.conn.unchecked_transaction().map_err(db_err)?;
        tx.execute(
            "DELETE FROM check_in_students WHERE student_id = ?",
            [student_id],
        )
        .map_err(db_err)?;
        tx.execute("DELETE FROM students WHERE id = ?", [student_id])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)
    }

    fn append_students(&self, students: &[ImportStudent]) -> AttendanceResult<()> {
        let mut sort_order = self.next_sort_order("students")?;
        let tx = self.conn.unchecked_transaction().map_err(db_err)?;
        for s in students {
            tx.execute(
                "INSERT INTO students(id, number, name, sort_order) VALUES(?, ?, ?, ?)",
                (Uuid::new_v4().to_string(), s.number, &s.name, sort_order),
            )
            .map_err(db_err)?;
            sort_order += 1;
        }
        tx.commit().map_err(db_err)?;
        info!(count = students.len(), "local students imported");
        Ok(())
    }
}
