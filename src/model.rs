use crate::error::{AttendanceError, AttendanceResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(deserialize_with = "flexible_string")]
    pub id: String,
    #[serde(deserialize_with = "flexible_int")]
    pub number: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Present,
    Leave,
    Absent,
    Unknown,
}

impl Status {
    /// Display order of the status buckets.
    pub const ALL: [Status; 4] = [Status::Present, Status::Leave, Status::Absent, Status::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Present => "present",
            Status::Leave => "leave",
            Status::Absent => "absent",
            Status::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> AttendanceResult<Status> {
        match raw {
            "present" => Ok(Status::Present),
            "leave" => Ok(Status::Leave),
            "absent" => Ok(Status::Absent),
            "unknown" => Ok(Status::Unknown),
            other => Err(AttendanceError::data_integrity(format!(
                "unrecognized status: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's status inside an open session. `number` and `name` are
/// copied from the roster when the status is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAssignment {
    #[serde(rename = "id")]
    pub student_id: String,
    pub number: i64,
    pub name: String,
    pub status: Status,
}

/// Snapshot handed to the gateway on submit. Owns its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    pub date: String,
    pub students: Vec<StatusAssignment>,
}

/// An assignment as stored by the record store; the status stays raw until
/// it is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAssignment {
    #[serde(deserialize_with = "flexible_string")]
    pub id: String,
    #[serde(deserialize_with = "flexible_int")]
    pub number: i64,
    pub name: String,
    #[serde(default, deserialize_with = "raw_text")]
    pub status: String,
}

impl RecordedAssignment {
    pub fn status(&self) -> AttendanceResult<Status> {
        Status::parse(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
    #[serde(deserialize_with = "flexible_string")]
    pub id: String,
    #[serde(default, deserialize_with = "raw_text")]
    pub date: String,
    #[serde(default)]
    pub students: Vec<RecordedAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceStat {
    pub name: String,
    #[serde(deserialize_with = "flexible_int")]
    pub count: i64,
}

/// A roster row waiting to be imported; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStudent {
    #[serde(deserialize_with = "flexible_int")]
    pub number: i64,
    pub name: String,
}

// Spreadsheet-backed stores hand back cells as numbers or strings depending on
// how the sheet was edited.
pub(crate) fn int_from_value(v: &Value) -> Option<i64> {
    fn whole(f: f64) -> Option<i64> {
        (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
    }
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    }
}

fn flexible_int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = Value::deserialize(d)?;
    int_from_value(&v).ok_or_else(|| D::Error::custom(format!("expected an integer, got {v}")))
}

// Fields checked after fetch are kept as text so that one bad cell becomes a
// per-record issue instead of failing the whole list. Null reads as empty.
fn raw_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn flexible_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected an id, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn student_accepts_numeric_strings_from_sheets() {
        let s: Student =
            serde_json::from_value(json!({ "id": 17, "number": " 4 ", "name": "Anan" }))
                .expect("decode student");
        assert_eq!(s.id, "17");
        assert_eq!(s.number, 4);

        let s: Student = serde_json::from_value(json!({ "id": "s-1", "number": 12.0, "name": "B" }))
            .expect("decode float number");
        assert_eq!(s.number, 12);
    }

    #[test]
    fn student_rejects_non_integer_number() {
        let r: Result<Student, _> =
            serde_json::from_value(json!({ "id": "s", "number": "twelve", "name": "B" }));
        assert!(r.is_err());
        let r: Result<Student, _> =
            serde_json::from_value(json!({ "id": "s", "number": 1.5, "name": "B" }));
        assert!(r.is_err());
    }

    #[test]
    fn status_parse_flags_unknown_values() {
        assert_eq!(Status::parse("leave"), Ok(Status::Leave));
        let e = Status::parse("late").unwrap_err();
        assert!(matches!(e, AttendanceError::DataIntegrity(_)));
        assert!(Status::parse("Present").is_err());
    }

    #[test]
    fn assignment_serializes_with_wire_field_names() {
        let a = StatusAssignment {
            student_id: "s1".into(),
            number: 3,
            name: "Chai".into(),
            status: Status::Absent,
        };
        assert_eq!(
            serde_json::to_value(&a).expect("encode"),
            json!({ "id": "s1", "number": 3, "name": "Chai", "status": "absent" })
        );
    }
}
