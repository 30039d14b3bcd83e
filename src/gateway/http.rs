use super::RecordStore;
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::{AbsenceStat, CheckInRecord, ImportStudent, Student, SubmissionPayload};
use anyhow::Context;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone)]
struct Exchange<'a> {
    action: &'static str,
    verb: Verb,
    /// Whether a direct call names the action in the query string. Submissions
    /// post to the bare script URL.
    action_in_query: bool,
    params: Vec<(&'static str, &'a str)>,
    body: Option<Value>,
}

/// Talks to the spreadsheet-backed web app, either directly or through a
/// relay that forwards `{action, data}` and returns the store body verbatim.
pub struct HttpRecordStore {
    client: Client,
    url: String,
    store_id: String,
    relay_url: Option<String>,
}

impl HttpRecordStore {
    pub fn new(url: String, store_id: String, relay_url: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("rollcalld/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            url,
            store_id,
            relay_url,
        })
    }

    fn read(&self, action: &'static str) -> Exchange<'_> {
        Exchange {
            action,
            verb: Verb::Get,
            action_in_query: true,
            params: vec![("sheetId", self.store_id.as_str())],
            body: None,
        }
    }

    fn call(&self, ex: Exchange<'_>) -> AttendanceResult<String> {
        let request = match &self.relay_url {
            Some(relay) => self.client.post(relay).json(&relay_body(&ex)),
            None => {
                let mut query: Vec<(&str, &str)> = Vec::new();
                if ex.action_in_query {
                    query.push(("action", ex.action));
                }
                query.extend(ex.params.iter().copied());
                let builder = match ex.verb {
                    Verb::Get => self.client.get(&self.url),
                    Verb::Post => self.client.post(&self.url),
                    Verb::Delete => self.client.delete(&self.url),
                };
                let builder = builder.query(&query);
                match &ex.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };

        debug!(action = ex.action, relay = self.relay_url.is_some(), "store request");
        let response = request.send().map_err(|e| {
            warn!(action = ex.action, error = %e, "store transport failed");
            AttendanceError::remote(format!("{}: connection failed: {e}", ex.action))
        })?;
        let status = response.status();
        let text = response.text().map_err(|e| {
            AttendanceError::remote(format!("{}: failed to read response: {e}", ex.action))
        })?;
        debug!(action = ex.action, status = status.as_u16(), "store response");
        Ok(text)
    }

    fn list<T: DeserializeOwned>(&self, action: &'static str) -> AttendanceResult<Vec<T>> {
        let body = self.call(self.read(action))?;
        let out = decode_list(action, &body);
        if let Err(e) = &out {
            warn!(action, error = %e, "store read rejected");
        }
        out
    }

    fn write(&self, ex: Exchange<'_>) -> AttendanceResult<()> {
        let action = ex.action;
        let body = self.call(ex)?;
        match decode_ack(action, &body) {
            Ok(()) => {
                info!(action, "store write accepted");
                Ok(())
            }
            Err(e) => {
                warn!(action, error = %e, "store write rejected");
                Err(e)
            }
        }
    }
}

impl RecordStore for HttpRecordStore {
    fn list_students(&self) -> AttendanceResult<Vec<Student>> {
        self.list("getStudents")
    }

    fn list_check_ins(&self) -> AttendanceResult<Vec<CheckInRecord>> {
        self.list("getCheckIns")
    }

    fn list_absence_stats(&self) -> AttendanceResult<Vec<AbsenceStat>> {
        self.list("getAbsentStats")
    }

    fn submit_check_in(&self, payload: &SubmissionPayload) -> AttendanceResult<()> {
        self.write(Exchange {
            action: "submitCheckIn",
            verb: Verb::Post,
            action_in_query: false,
            params: Vec::new(),
            body: Some(json!({
                "sheetId": self.store_id,
                "date": payload.date,
                "students": payload.students,
            })),
        })
    }

    fn delete_check_in(&self, check_in_id: &str) -> AttendanceResult<()> {
        self.write(Exchange {
            action: "deleteCheckIn",
            verb: Verb::Delete,
            action_in_query: true,
            params: vec![("sheetId", self.store_id.as_str()), ("checkInId", check_in_id)],
            body: None,
        })
    }

    fn delete_student(&self, student_id: &str) -> AttendanceResult<()> {
        self.write(Exchange {
            action: "deleteStudent",
            verb: Verb::Delete,
            action_in_query: true,
            params: vec![("sheetId", self.store_id.as_str()), ("studentId", student_id)],
            body: None,
        })
    }

    fn append_students(&self, students: &[ImportStudent]) -> AttendanceResult<()> {
        self.write(Exchange {
            action: "importStudents",
            verb: Verb::Post,
            action_in_query: true,
            params: Vec::new(),
            body: Some(json!({
                "sheetId": self.store_id,
                "students": students,
            })),
        })
    }
}

fn relay_body(ex: &Exchange<'_>) -> Value {
    let mut data = match &ex.body {
        Some(Value::Object(m)) => m.clone(),
        _ => Map::new(),
    };
    for (k, v) in &ex.params {
        data.insert((*k).to_string(), Value::String((*v).to_string()));
    }
    json!({ "action": ex.action, "data": data })
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

fn decode_envelope(action: &str, body: &str) -> AttendanceResult<Envelope> {
    let env: Envelope = serde_json::from_str(body).map_err(|e| {
        AttendanceError::remote(format!("{action}: response is not a store envelope: {e}"))
    })?;
    if !env.success {
        let message = env
            .message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "store reported failure".to_string());
        return Err(AttendanceError::remote(message));
    }
    Ok(env)
}

fn decode_list<T: DeserializeOwned>(action: &str, body: &str) -> AttendanceResult<Vec<T>> {
    let env = decode_envelope(action, body)?;
    match env.data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(data) => serde_json::from_value(data).map_err(|e| {
            AttendanceError::remote(format!("{action}: unexpected data shape: {e}"))
        }),
    }
}

fn decode_ack(action: &str, body: &str) -> AttendanceResult<()> {
    decode_envelope(action, body).map(|_| ())
}
