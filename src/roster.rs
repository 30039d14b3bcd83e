use crate::error::{AttendanceError, AttendanceResult};
use crate::model::{int_from_value, ImportStudent, Student};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Students known to this session, replaced wholesale on refresh.
#[derive(Debug, Clone, Default)]
pub struct RosterCache {
    students: Vec<Student>,
}

impl RosterCache {
    pub fn replace(&mut self, students: Vec<Student>) {
        self.students = students;
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }
}

pub fn read_import_file(path: &Path) -> AttendanceResult<Vec<ImportStudent>> {
    let file = std::fs::File::open(path).map_err(|e| {
        AttendanceError::validation(format!("cannot open {}: {e}", path.to_string_lossy()))
    })?;
    parse_import_csv(file)
}

/// Reads `number,name` rows. A leading row whose first cell is not a number is
/// taken as a header.
pub fn parse_import_csv<R: Read>(input: R) -> AttendanceResult<Vec<ImportStudent>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut out = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row_no = idx + 1;
        let row = row.map_err(|e| AttendanceError::validation(format!("row {row_no}: {e}")))?;
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let number_cell = row.get(0).unwrap_or("");
        let name = row.get(1).unwrap_or("").to_string();
        let number = int_from_value(&Value::String(number_cell.to_string()));
        let Some(number) = number else {
            if idx == 0 {
                continue;
            }
            return Err(AttendanceError::validation(format!(
                "row {row_no}: number must be an integer, got {number_cell:?}"
            )));
        };
        if name.is_empty() {
            return Err(AttendanceError::validation(format!(
                "row {row_no}: missing name"
            )));
        }
        out.push(ImportStudent { number, name });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_header_and_blanks() {
        let input = "number,name\n1,Anan\n\n2 , Boon \n10,Chai\n";
        let rows = parse_import_csv(input.as_bytes()).expect("parse");
        assert_eq!(
            rows,
            vec![
                ImportStudent { number: 1, name: "Anan".into() },
                ImportStudent { number: 2, name: "Boon".into() },
                ImportStudent { number: 10, name: "Chai".into() },
            ]
        );
    }

    #[test]
    fn rejects_non_numeric_number_after_first_row() {
        let e = parse_import_csv("1,Anan\nx,Boon\n".as_bytes()).unwrap_err();
        assert_eq!(
            e,
            AttendanceError::validation("row 2: number must be an integer, got \"x\"")
        );
    }

    #[test]
    fn rejects_missing_name() {
        let e = parse_import_csv("1,Anan\n2\n".as_bytes()).unwrap_err();
        assert!(matches!(e, AttendanceError::Validation(m) if m.contains("row 2")));
    }

    #[test]
    fn cache_lookup_and_replace() {
        let mut cache = RosterCache::default();
        cache.replace(vec![Student {
            id: "s1".into(),
            number: 1,
            name: "Anan".into(),
        }]);
        assert_eq!(cache.get("s1").map(|s| s.number), Some(1));
        cache.replace(Vec::new());
        assert!(cache.get("s1").is_none());
        assert!(cache.students().is_empty());
    }
}
