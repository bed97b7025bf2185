//! CSV export.

use tracing::info;

use super::ExportResult;
use crate::models::CaseRecord;

/// Column order of the CSV export.
pub const CSV_COLUMNS: [&str; 12] = [
    "id",
    "patientName",
    "dentistName",
    "toothNumbers",
    "prosthesisType",
    "material",
    "shade",
    "notes",
    "photoDataUri",
    "createdAt",
    "source",
    "dueDate",
];

/// Flatten the collection into CSV text.
///
/// An empty collection gives an empty string. Otherwise the result is the
/// header line, a newline, and one line per case joined by newlines (no
/// trailing newline).
pub fn to_csv(cases: &[CaseRecord]) -> ExportResult<String> {
    if cases.is_empty() {
        return Ok(String::new());
    }

    let header = CSV_COLUMNS.join(",");
    let rows: Vec<String> = cases
        .iter()
        .map(|case| {
            CSV_COLUMNS
                .iter()
                .map(|column| escape_csv(&cell_value(case, column)))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();

    info!(cases = cases.len(), "exported cases to CSV");
    Ok(format!("{}\n{}", header, rows.join("\n")))
}

/// Text of one cell before escaping. Missing values are empty.
fn cell_value(case: &CaseRecord, column: &str) -> String {
    match column {
        "id" => case.id.clone(),
        "patientName" => case.patient_name.clone(),
        "dentistName" => case.dentist_name.clone(),
        "toothNumbers" => case.tooth_numbers.to_text(),
        "prosthesisType" => case.prosthesis_types.to_text(),
        "material" => case.materials.to_text(),
        "shade" => case.shade.clone(),
        "notes" => case.notes.clone().unwrap_or_default(),
        "photoDataUri" => case.photo_data_uri.clone().unwrap_or_default(),
        "createdAt" => case
            .created_at
            .map(|ts| ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_default(),
        "source" => case.source.map(|s| s.to_string()).unwrap_or_default(),
        "dueDate" => case
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CaseSource, ToothNumbers, TokenList};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_case(id: &str, notes: Option<&str>) -> CaseRecord {
        CaseRecord {
            id: id.into(),
            patient_name: "Karim".into(),
            dentist_name: "Dr. Smith".into(),
            tooth_numbers: ToothNumbers::parse("11"),
            prosthesis_types: TokenList::parse("Separate"),
            materials: TokenList::parse("Zolid"),
            shade: "A1".into(),
            notes: notes.map(String::from),
            photo_data_uri: None,
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()),
            source: Some(CaseSource::Desktop),
            due_date: None,
        }
    }

    /// Minimal RFC 4180 reader used to check the export from the other side.
    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut cell = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, in_quotes) {
                ('"', true) if chars.peek() == Some(&'"') => {
                    cell.push('"');
                    chars.next();
                }
                ('"', true) => in_quotes = false,
                ('"', false) => in_quotes = true,
                (',', false) => row.push(std::mem::take(&mut cell)),
                ('\n', false) => {
                    row.push(std::mem::take(&mut cell));
                    rows.push(std::mem::take(&mut row));
                }
                (c, _) => cell.push(c),
            }
        }
        row.push(cell);
        rows.push(row);
        rows
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn test_header_and_rows() {
        let csv = to_csv(&[make_case("1", None), make_case("2", None)]).unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();

        assert_eq!(lines.len(), 3); // Header + 2 cases
        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "1,Karim,Dr. Smith,11,Separate,Zolid,A1,,,2024-01-15T10:00:00.000Z,Desktop,"
        );
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_multi_value_cells_are_quoted() {
        let mut case = make_case("1", None);
        case.materials = TokenList::parse("Zirconia, Implant");
        let csv = to_csv(&[case]).unwrap();
        assert!(csv.contains(",\"Zirconia, Implant\","));
    }

    #[test]
    fn test_due_date_as_plain_date() {
        let mut case = make_case("1", None);
        case.due_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        let csv = to_csv(&[case]).unwrap();
        assert!(csv.ends_with(",Desktop,2024-02-01"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_cells_survive_parsing() {
        let cases = vec![
            make_case("1", Some("fit, then \"glaze\"")),
            make_case("2", Some("line one\nline two")),
        ];
        let rows = parse_csv(&to_csv(&cases).unwrap());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], CSV_COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        assert_eq!(rows[1][7], "fit, then \"glaze\"");
        assert_eq!(rows[2][7], "line one\nline two");
        assert!(rows.iter().all(|r| r.len() == CSV_COLUMNS.len()));
    }
}
