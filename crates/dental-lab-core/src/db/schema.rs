//! SQLite schema definition.

/// Complete database schema for the dental lab hub.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Cases
-- ============================================================================

CREATE TABLE IF NOT EXISTS dental_cases (
    id TEXT PRIMARY KEY,
    patient_name TEXT NOT NULL,
    dentist_name TEXT NOT NULL DEFAULT '',
    tooth_numbers TEXT NOT NULL DEFAULT '',      -- comma-joined, e.g. '11, 12'
    prosthesis_type TEXT NOT NULL DEFAULT '',    -- comma-joined labels
    material TEXT NOT NULL DEFAULT '',           -- comma-joined labels
    shade TEXT NOT NULL DEFAULT '',
    notes TEXT,
    photo_data_uri TEXT,
    created_at TEXT,                             -- RFC 3339, NULL for legacy imports
    source TEXT CHECK (source IS NULL OR source IN ('Mobile', 'Desktop')),
    due_date TEXT                                -- YYYY-MM-DD
);

CREATE INDEX IF NOT EXISTS idx_cases_dentist ON dental_cases(dentist_name);
CREATE INDEX IF NOT EXISTS idx_cases_created_at ON dental_cases(created_at);

-- ============================================================================
-- Doctor accounts
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    salt TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_source_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO dental_cases (id, patient_name, source) VALUES ('a', 'P', 'Fax')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO dental_cases (id, patient_name, source) VALUES ('b', 'P', 'Mobile')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_doctor_name_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let insert = "INSERT INTO doctors (id, name, password_hash, salt, created_at) VALUES (?, 'Dr. Smith', 'h', 's', 't')";
        assert!(conn.execute(insert, ["1"]).is_ok());
        assert!(conn.execute(insert, ["2"]).is_err());
    }
}
