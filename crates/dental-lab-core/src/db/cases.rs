//! Case database operations.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::{Database, DbError, DbResult};
use crate::models::{CasePatch, CaseRecord, CaseSource, NewCase, ToothNumbers, TokenList};

const CASE_COLUMNS: &str = r#"
    id, patient_name, dentist_name, tooth_numbers, prosthesis_type, material,
    shade, notes, photo_data_uri, created_at, source, due_date
"#;

impl Database {
    /// Insert a case record as-is.
    pub fn insert_case(&self, case: &CaseRecord) -> DbResult<()> {
        insert_case_with(&self.conn, case)?;
        debug!(id = %case.id, "inserted case");
        Ok(())
    }

    /// Create a case from form input, assigning ID and creation time.
    pub fn add_case(&self, new_case: NewCase) -> DbResult<CaseRecord> {
        let record = new_case.into_record();
        self.insert_case(&record)?;
        Ok(record)
    }

    /// Get a case by ID.
    pub fn get_case(&self, id: &str) -> DbResult<Option<CaseRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM dental_cases WHERE id = ?", CASE_COLUMNS),
                [id],
                CaseRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all cases, newest first.
    pub fn list_cases(&self) -> DbResult<Vec<CaseRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM dental_cases ORDER BY created_at DESC, rowid DESC",
            CASE_COLUMNS
        ))?;

        let rows = stmt.query_map([], CaseRow::from_row)?;

        let mut cases = Vec::new();
        for row in rows {
            cases.push(row?.try_into()?);
        }
        debug!(count = cases.len(), "listed cases");
        Ok(cases)
    }

    /// List one dentist's cases (exact name match), newest first.
    pub fn list_cases_by_dentist(&self, dentist_name: &str) -> DbResult<Vec<CaseRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM dental_cases WHERE dentist_name = ? ORDER BY created_at DESC, rowid DESC",
            CASE_COLUMNS
        ))?;

        let rows = stmt.query_map([dentist_name], CaseRow::from_row)?;

        let mut cases = Vec::new();
        for row in rows {
            cases.push(row?.try_into()?);
        }
        debug!(dentist = dentist_name, count = cases.len(), "listed cases for dentist");
        Ok(cases)
    }

    /// Apply a partial update and return the stored result.
    pub fn update_case(&self, id: &str, patch: &CasePatch) -> DbResult<CaseRecord> {
        let mut case = self
            .get_case(id)?
            .ok_or_else(|| DbError::NotFound(format!("case {}", id)))?;
        patch.apply(&mut case);

        self.conn.execute(
            r#"
            UPDATE dental_cases SET
                patient_name = ?2,
                dentist_name = ?3,
                tooth_numbers = ?4,
                prosthesis_type = ?5,
                material = ?6,
                shade = ?7,
                notes = ?8,
                photo_data_uri = ?9,
                source = ?10
            WHERE id = ?1
            "#,
            params![
                case.id,
                case.patient_name,
                case.dentist_name,
                case.tooth_numbers.to_text(),
                case.prosthesis_types.to_text(),
                case.materials.to_text(),
                case.shade,
                case.notes,
                case.photo_data_uri,
                case.source.map(|s| s.to_string()),
            ],
        )?;
        debug!(id, "updated case");
        Ok(case)
    }

    /// Delete a case.
    pub fn delete_case(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM dental_cases WHERE id = ?", [id])?;
        debug!(id, deleted = rows_affected > 0, "delete case");
        Ok(rows_affected > 0)
    }

    /// Replace the whole collection in one transaction.
    ///
    /// If any insert fails (for example a duplicate ID) nothing changes.
    pub fn replace_all_cases(&self, cases: &[CaseRecord]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM dental_cases", [])?;
        for case in cases {
            insert_case_with(&tx, case)?;
        }
        tx.commit()?;
        info!(count = cases.len(), "replaced case collection");
        Ok(())
    }

    /// Number of stored cases.
    pub fn count_cases(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dental_cases", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn insert_case_with(conn: &rusqlite::Connection, case: &CaseRecord) -> DbResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO dental_cases ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            CASE_COLUMNS
        ),
        params![
            case.id,
            case.patient_name,
            case.dentist_name,
            case.tooth_numbers.to_text(),
            case.prosthesis_types.to_text(),
            case.materials.to_text(),
            case.shade,
            case.notes,
            case.photo_data_uri,
            case.created_at.map(|ts| ts.to_rfc3339()),
            case.source.map(|s| s.to_string()),
            case.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct CaseRow {
    id: String,
    patient_name: String,
    dentist_name: String,
    tooth_numbers: String,
    prosthesis_type: String,
    material: String,
    shade: String,
    notes: Option<String>,
    photo_data_uri: Option<String>,
    created_at: Option<String>,
    source: Option<String>,
    due_date: Option<String>,
}

impl CaseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CaseRow {
            id: row.get(0)?,
            patient_name: row.get(1)?,
            dentist_name: row.get(2)?,
            tooth_numbers: row.get(3)?,
            prosthesis_type: row.get(4)?,
            material: row.get(5)?,
            shade: row.get(6)?,
            notes: row.get(7)?,
            photo_data_uri: row.get(8)?,
            created_at: row.get(9)?,
            source: row.get(10)?,
            due_date: row.get(11)?,
        })
    }
}

impl TryFrom<CaseRow> for CaseRecord {
    type Error = DbError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        let created_at = row
            .created_at
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(|e| DbError::Constraint(format!("Bad created_at {}: {}", s, e)))
            })
            .transpose()?;
        let source = row
            .source
            .map(|s| s.parse::<CaseSource>().map_err(DbError::Constraint))
            .transpose()?;
        let due_date = row
            .due_date
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| DbError::Constraint(format!("Bad due_date {}: {}", s, e)))
            })
            .transpose()?;

        Ok(CaseRecord {
            id: row.id,
            patient_name: row.patient_name,
            dentist_name: row.dentist_name,
            tooth_numbers: ToothNumbers::parse(&row.tooth_numbers),
            prosthesis_types: TokenList::parse(&row.prosthesis_type),
            materials: TokenList::parse(&row.material),
            shade: row.shade,
            notes: row.notes,
            photo_data_uri: row.photo_data_uri,
            created_at,
            source,
            due_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_case(patient: &str, dentist: &str) -> NewCase {
        NewCase {
            patient_name: patient.into(),
            dentist_name: dentist.into(),
            tooth_numbers: ToothNumbers::parse("11, 21"),
            prosthesis_types: TokenList::parse("Bridge"),
            materials: TokenList::parse("Zirconia, Implant"),
            shade: "A2".into(),
            notes: None,
            photo_data_uri: None,
            source: Some(CaseSource::Desktop),
        }
    }

    fn record_at(id: &str, dentist: &str, day: u32) -> CaseRecord {
        CaseRecord {
            id: id.into(),
            patient_name: format!("Patient {}", id),
            dentist_name: dentist.into(),
            created_at: Some(Utc.with_ymd_and_hms(2024, 4, day, 8, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_get() {
        let db = setup_db();
        let added = db.add_case(new_case("Huda", "Dr. Smith")).unwrap();

        let retrieved = db.get_case(&added.id).unwrap().unwrap();
        assert_eq!(retrieved, added);
        assert_eq!(retrieved.materials.to_text(), "Zirconia, Implant");
        assert_eq!(retrieved.source, Some(CaseSource::Desktop));
    }

    #[test]
    fn test_get_missing() {
        let db = setup_db();
        assert!(db.get_case("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let db = setup_db();
        db.insert_case(&record_at("old", "Dr. A", 1)).unwrap();
        db.insert_case(&record_at("new", "Dr. A", 20)).unwrap();
        db.insert_case(&record_at("mid", "Dr. B", 10)).unwrap();

        let ids: Vec<_> = db.list_cases().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_list_by_dentist_exact_match() {
        let db = setup_db();
        db.insert_case(&record_at("1", "Dr. A", 1)).unwrap();
        db.insert_case(&record_at("2", "Dr. B", 2)).unwrap();
        db.insert_case(&record_at("3", "dr. a", 3)).unwrap();

        let cases = db.list_cases_by_dentist("Dr. A").unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id, "1");
    }

    #[test]
    fn test_update_case() {
        let db = setup_db();
        let added = db.add_case(new_case("Huda", "Dr. Smith")).unwrap();

        let patch = CasePatch {
            shade: Some("B2".into()),
            notes: Some("Remake".into()),
            ..Default::default()
        };
        let updated = db.update_case(&added.id, &patch).unwrap();
        assert_eq!(updated.shade, "B2");
        assert_eq!(updated.created_at, added.created_at);

        let stored = db.get_case(&added.id).unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[test]
    fn test_update_missing_case() {
        let db = setup_db();
        let result = db.update_case("nope", &CasePatch::default());
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_delete_case() {
        let db = setup_db();
        let added = db.add_case(new_case("Huda", "Dr. Smith")).unwrap();

        assert!(db.delete_case(&added.id).unwrap());
        assert!(!db.delete_case(&added.id).unwrap());
        assert_eq!(db.count_cases().unwrap(), 0);
    }

    #[test]
    fn test_replace_all_is_atomic() {
        let db = setup_db();
        db.insert_case(&record_at("keep", "Dr. A", 1)).unwrap();

        // Duplicate IDs make the second insert fail
        let bad = vec![record_at("x", "Dr. B", 2), record_at("x", "Dr. B", 3)];
        assert!(db.replace_all_cases(&bad).is_err());

        let ids: Vec<_> = db.list_cases().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["keep"]);

        let good = vec![record_at("y", "Dr. B", 2), record_at("z", "Dr. B", 3)];
        db.replace_all_cases(&good).unwrap();
        assert_eq!(db.count_cases().unwrap(), 2);
        assert!(db.get_case("keep").unwrap().is_none());
    }
}
