//! Dental Lab Core Library
//!
//! Case records for a small dental laboratory: entry, storage, dashboard
//! statistics and data export.
//!
//! # Architecture
//!
//! ```text
//! Mobile / desktop entry form
//!            │
//!       validation ──► FieldError list
//!            │
//!      ┌─────▼─────┐
//!      │ CaseStore │  (SQLite)
//!      └─────┬─────┘
//!            │  Vec<CaseRecord>, scoped by Session
//!            │
//!   ┌────────┼─────────────────────┐
//!   ▼        ▼                     ▼
//! stats   export::{json,csv}    export::report
//! (dashboard) (download/import) (summary text)
//! ```
//!
//! The aggregator and exporter are pure functions over a slice of cases; they
//! never touch storage.
//!
//! # Modules
//!
//! - [`models`]: Case records, tooth numbers, vocabularies, doctor accounts
//! - [`stats`]: Dashboard aggregation
//! - [`export`]: JSON/CSV export, JSON import, text report
//! - [`db`]: SQLite database layer
//! - [`store`]: Storage trait used by front ends
//! - [`validation`]: Entry form rules
//! - [`auth`]: Doctor and owner sign-in
//! - [`config`]: `.dental-lab.toml` settings

pub mod auth;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod stats;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use export::{ExportError, ExportFormat};
pub use models::{
    CasePatch, CaseRecord, CaseSource, DoctorAccount, Material, NewCase, ProsthesisType, Role,
    Session, ToothNumbers, TokenList,
};
pub use stats::{compute_stats, compute_stats_for_dentist, filter_cases, CaseStats, TallyEntry};
pub use store::CaseStore;
pub use validation::{FieldError, ValidationError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use models::Token;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DentalLabError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Duplicate user: {0}")]
    DuplicateUser(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for DentalLabError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => DentalLabError::NotFound(what),
            other => DentalLabError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ExportError> for DentalLabError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::ImportFormat(msg) => DentalLabError::ImportError(msg),
            ExportError::Serialization(msg) => DentalLabError::SerializationError(msg),
        }
    }
}

impl From<ValidationError> for DentalLabError {
    fn from(e: ValidationError) -> Self {
        DentalLabError::InvalidInput(e.to_string())
    }
}

impl From<auth::AuthError> for DentalLabError {
    fn from(e: auth::AuthError) -> Self {
        match e {
            auth::AuthError::DuplicateUser(name) => DentalLabError::DuplicateUser(name),
            auth::AuthError::Invalid(v) => v.into(),
            auth::AuthError::Db(d) => d.into(),
        }
    }
}

impl From<config::ConfigError> for DentalLabError {
    fn from(e: config::ConfigError) -> Self {
        DentalLabError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DentalLabError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DentalLabError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<DentalLabCore>, DentalLabError> {
    let db = Database::open(&path)?;
    Ok(DentalLabCore::wrap(db, Config::default()))
}

/// Load a `.dental-lab.toml` file and open the database it names.
#[uniffi::export]
pub fn open_database_with_config(config_path: String) -> Result<Arc<DentalLabCore>, DentalLabError> {
    let config = Config::load(std::path::Path::new(&config_path))?;
    let db = Database::open(&config.storage.database_path)?;
    Ok(DentalLabCore::wrap(db, config))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<DentalLabCore>, DentalLabError> {
    let db = Database::open_in_memory()?;
    Ok(DentalLabCore::wrap(db, Config::default()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DentalLabCore {
    db: Arc<Mutex<Database>>,
    config: Config,
}

impl DentalLabCore {
    fn wrap(db: Database, config: Config) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    fn scoped_cases(&self, dentist: Option<&str>) -> Result<Vec<CaseRecord>, DentalLabError> {
        let db = self.db.lock()?;
        let cases = match dentist {
            Some(name) => db.list_by_dentist(name)?,
            None => db.list_all()?,
        };
        Ok(cases)
    }
}

#[uniffi::export]
impl DentalLabCore {
    // =========================================================================
    // Case Operations
    // =========================================================================

    /// Validate and store a new case.
    pub fn add_case(&self, new_case: FfiNewCase) -> Result<FfiCaseRecord, DentalLabError> {
        let new_case: NewCase = new_case.into();
        validation::validate_new_case(&new_case, self.config.entry.max_photo_bytes)?;
        let db = self.db.lock()?;
        Ok(db.add(new_case)?.into())
    }

    /// Get a case by ID.
    pub fn get_case(&self, id: String) -> Result<Option<FfiCaseRecord>, DentalLabError> {
        let db = self.db.lock()?;
        Ok(db.get_case(&id)?.map(|c| c.into()))
    }

    /// Cases newest first. `dentist` limits the list to one doctor's cases.
    pub fn list_cases(&self, dentist: Option<String>) -> Result<Vec<FfiCaseRecord>, DentalLabError> {
        let cases = self.scoped_cases(dentist.as_deref())?;
        Ok(cases.into_iter().map(|c| c.into()).collect())
    }

    /// Cases visible to a session.
    pub fn list_cases_for_session(
        &self,
        session: FfiSession,
    ) -> Result<Vec<FfiCaseRecord>, DentalLabError> {
        let session: Session = session.try_into()?;
        let db = self.db.lock()?;
        let cases = db.list_for_session(&session)?;
        Ok(cases.into_iter().map(|c| c.into()).collect())
    }

    /// Case-insensitive search on dentist or patient name.
    pub fn search_cases(&self, query: String) -> Result<Vec<FfiCaseRecord>, DentalLabError> {
        let cases = self.scoped_cases(None)?;
        Ok(filter_cases(&cases, &query)
            .into_iter()
            .cloned()
            .map(|c| c.into())
            .collect())
    }

    /// Validate and apply an edit.
    pub fn update_case(
        &self,
        id: String,
        patch: FfiCasePatch,
    ) -> Result<FfiCaseRecord, DentalLabError> {
        let patch: CasePatch = patch.into();
        validation::validate_patch(&patch, self.config.entry.max_photo_bytes)?;
        let db = self.db.lock()?;
        Ok(db.update(&id, &patch)?.into())
    }

    /// Delete a case. Returns false if it did not exist.
    pub fn delete_case(&self, id: String) -> Result<bool, DentalLabError> {
        let db = self.db.lock()?;
        Ok(db.remove(&id)?)
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Dashboard statistics, optionally for one dentist.
    pub fn compute_stats(&self, dentist: Option<String>) -> Result<FfiCaseStats, DentalLabError> {
        let cases = self.scoped_cases(dentist.as_deref())?;
        Ok(compute_stats(&cases).into())
    }

    // =========================================================================
    // Export / Import
    // =========================================================================

    pub fn export_json(&self, dentist: Option<String>) -> Result<String, DentalLabError> {
        let cases = self.scoped_cases(dentist.as_deref())?;
        Ok(export::to_json(&cases)?)
    }

    pub fn export_csv(&self, dentist: Option<String>) -> Result<String, DentalLabError> {
        let cases = self.scoped_cases(dentist.as_deref())?;
        Ok(export::to_csv(&cases)?)
    }

    /// Summary report titled with the configured lab name.
    pub fn generate_report(&self, dentist: Option<String>) -> Result<String, DentalLabError> {
        let cases = self.scoped_cases(dentist.as_deref())?;
        Ok(export::generate_report(&cases, &self.config.lab.name))
    }

    /// Replace every stored case with the contents of a JSON export.
    ///
    /// Returns the number of imported cases. On any error the store is unchanged.
    pub fn import_json(&self, text: String) -> Result<u32, DentalLabError> {
        let cases = export::from_json(&text)?;
        let db = self.db.lock()?;
        db.replace_all(&cases)?;
        Ok(cases.len() as u32)
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn register_doctor(
        &self,
        name: String,
        password: String,
    ) -> Result<FfiDoctor, DentalLabError> {
        let db = self.db.lock()?;
        Ok(auth::register_doctor(&db, &name, &password)?.into())
    }

    pub fn list_doctors(&self) -> Result<Vec<FfiDoctor>, DentalLabError> {
        let db = self.db.lock()?;
        Ok(db.list_users()?.into_iter().map(|u| u.into()).collect())
    }

    pub fn delete_doctor(&self, id: String) -> Result<bool, DentalLabError> {
        let db = self.db.lock()?;
        Ok(db.delete_user(&id)?)
    }

    /// Doctor sign-in. `None` on unknown name or wrong password.
    pub fn login_doctor(
        &self,
        name: String,
        password: String,
    ) -> Result<Option<FfiSession>, DentalLabError> {
        let db = self.db.lock()?;
        Ok(auth::authenticate_doctor(&db, &name, &password)?.map(|s| s.into()))
    }

    pub fn login_owner(&self, password: String) -> Option<FfiSession> {
        auth::authenticate_owner(&self.config.auth, &password).map(|s| s.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe case record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCaseRecord {
    pub id: String,
    pub patient_name: String,
    pub dentist_name: String,
    pub tooth_numbers: Vec<u16>,
    pub prosthesis_types: Vec<String>,
    pub materials: Vec<String>,
    pub shade: String,
    pub notes: Option<String>,
    pub photo_data_uri: Option<String>,
    /// RFC 3339
    pub created_at: Option<String>,
    pub source: Option<String>,
    /// `YYYY-MM-DD`
    pub due_date: Option<String>,
}

impl From<CaseRecord> for FfiCaseRecord {
    fn from(case: CaseRecord) -> Self {
        Self {
            id: case.id,
            patient_name: case.patient_name,
            dentist_name: case.dentist_name,
            tooth_numbers: case.tooth_numbers.as_slice().to_vec(),
            prosthesis_types: case.prosthesis_types.labels().map(String::from).collect(),
            materials: case.materials.labels().map(String::from).collect(),
            shade: case.shade,
            notes: case.notes,
            photo_data_uri: case.photo_data_uri,
            created_at: case.created_at.map(|ts| ts.to_rfc3339()),
            source: case.source.map(|s| s.to_string()),
            due_date: case.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// FFI-safe entry form submission.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewCase {
    pub patient_name: String,
    pub dentist_name: String,
    pub tooth_numbers: Vec<u16>,
    pub prosthesis_types: Vec<String>,
    pub materials: Vec<String>,
    pub shade: String,
    pub notes: Option<String>,
    pub photo_data_uri: Option<String>,
    pub source: Option<String>,
}

impl From<FfiNewCase> for NewCase {
    fn from(case: FfiNewCase) -> Self {
        NewCase {
            patient_name: case.patient_name,
            dentist_name: case.dentist_name,
            tooth_numbers: ToothNumbers::new(case.tooth_numbers),
            prosthesis_types: labels_to_tokens(&case.prosthesis_types),
            materials: labels_to_tokens(&case.materials),
            shade: case.shade,
            notes: case.notes,
            photo_data_uri: case.photo_data_uri,
            source: case.source.and_then(|s| s.parse().ok()),
        }
    }
}

/// FFI-safe partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiCasePatch {
    pub patient_name: Option<String>,
    pub dentist_name: Option<String>,
    pub tooth_numbers: Option<Vec<u16>>,
    pub prosthesis_types: Option<Vec<String>>,
    pub materials: Option<Vec<String>>,
    pub shade: Option<String>,
    pub notes: Option<String>,
    pub photo_data_uri: Option<String>,
    pub source: Option<String>,
}

impl From<FfiCasePatch> for CasePatch {
    fn from(patch: FfiCasePatch) -> Self {
        CasePatch {
            patient_name: patch.patient_name,
            dentist_name: patch.dentist_name,
            tooth_numbers: patch.tooth_numbers.map(ToothNumbers::new),
            prosthesis_types: patch.prosthesis_types.as_deref().map(labels_to_tokens),
            materials: patch.materials.as_deref().map(labels_to_tokens),
            shade: patch.shade,
            notes: patch.notes,
            photo_data_uri: patch.photo_data_uri,
            source: patch.source.and_then(|s| s.parse().ok()),
        }
    }
}

fn labels_to_tokens<T: Token>(labels: &[String]) -> TokenList<T> {
    TokenList::new(labels.iter().map(|l| T::from_label(l)).collect())
}

/// FFI-safe tally line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTallyEntry {
    pub name: String,
    pub count: u64,
}

impl From<TallyEntry> for FfiTallyEntry {
    fn from(entry: TallyEntry) -> Self {
        Self {
            name: entry.name,
            count: entry.count as u64,
        }
    }
}

/// FFI-safe dashboard statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCaseStats {
    pub total_cases: u64,
    pub total_teeth: u64,
    pub total_material_selections: u64,
    pub cases_by_dentist: Vec<FfiTallyEntry>,
    pub material_usage: Vec<FfiTallyEntry>,
    pub teeth_by_material: Vec<FfiTallyEntry>,
    pub prosthesis_usage: Vec<FfiTallyEntry>,
}

impl From<CaseStats> for FfiCaseStats {
    fn from(stats: CaseStats) -> Self {
        fn entries(list: Vec<TallyEntry>) -> Vec<FfiTallyEntry> {
            list.into_iter().map(|e| e.into()).collect()
        }

        Self {
            total_cases: stats.total_cases as u64,
            total_teeth: stats.total_teeth as u64,
            total_material_selections: stats.total_material_selections as u64,
            cases_by_dentist: entries(stats.cases_by_dentist),
            material_usage: entries(stats.material_usage),
            teeth_by_material: entries(stats.teeth_by_material),
            prosthesis_usage: entries(stats.prosthesis_usage),
        }
    }
}

/// FFI-safe doctor account (no password material).
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl From<DoctorAccount> for FfiDoctor {
    fn from(account: DoctorAccount) -> Self {
        Self {
            id: account.id,
            name: account.name,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// FFI-safe session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub user_name: String,
    /// `owner` or `doctor`
    pub role: String,
    pub started_at: String,
}

impl From<Session> for FfiSession {
    fn from(session: Session) -> Self {
        Self {
            user_name: session.user_name,
            role: session.role.to_string(),
            started_at: session.started_at.to_rfc3339(),
        }
    }
}

impl TryFrom<FfiSession> for Session {
    type Error = DentalLabError;

    fn try_from(session: FfiSession) -> Result<Self, Self::Error> {
        let started_at = chrono::DateTime::parse_from_rfc3339(&session.started_at)
            .map_err(|e| DentalLabError::InvalidInput(format!("Bad session time: {}", e)))?
            .with_timezone(&chrono::Utc);
        let role = match session.role.as_str() {
            "owner" => Role::Owner,
            "doctor" => Role::Doctor,
            other => {
                return Err(DentalLabError::InvalidInput(format!(
                    "Unknown role: {}",
                    other
                )))
            }
        };
        Ok(Session {
            user_name: session.user_name,
            role,
            started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(dentist: &str) -> FfiNewCase {
        FfiNewCase {
            patient_name: "Mariam".into(),
            dentist_name: dentist.into(),
            tooth_numbers: vec![11, 21],
            prosthesis_types: vec!["Bridge".into()],
            materials: vec!["Zirconia".into(), "Implant".into()],
            shade: "A2".into(),
            notes: None,
            photo_data_uri: None,
            source: Some("Mobile".into()),
        }
    }

    #[test]
    fn test_add_list_and_stats() {
        let core = open_database_in_memory().unwrap();
        core.add_case(form("Dr. Smith")).unwrap();
        core.add_case(form("Dr. Jones")).unwrap();

        assert_eq!(core.list_cases(None).unwrap().len(), 2);
        assert_eq!(core.list_cases(Some("Dr. Jones".into())).unwrap().len(), 1);

        let stats = core.compute_stats(None).unwrap();
        assert_eq!(stats.total_cases, 2);
        assert_eq!(stats.total_teeth, 4);
        assert_eq!(stats.total_material_selections, 4);
    }

    #[test]
    fn test_add_rejects_invalid_form() {
        let core = open_database_in_memory().unwrap();
        let mut bad = form("Dr. Smith");
        bad.tooth_numbers = vec![];
        assert!(matches!(
            core.add_case(bad),
            Err(DentalLabError::InvalidInput(_))
        ));
        assert!(core.list_cases(None).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let core = open_database_in_memory().unwrap();
        let added = core.add_case(form("Dr. Smith")).unwrap();

        let updated = core
            .update_case(
                added.id.clone(),
                FfiCasePatch {
                    shade: Some("C1".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.shade, "C1");

        assert!(matches!(
            core.update_case("missing".into(), FfiCasePatch::default()),
            Err(DentalLabError::NotFound(_))
        ));

        assert!(core.delete_case(added.id).unwrap());
    }

    #[test]
    fn test_export_import_round_trip() {
        let core = open_database_in_memory().unwrap();
        core.add_case(form("Dr. Smith")).unwrap();
        let json = core.export_json(None).unwrap();

        let other = open_database_in_memory().unwrap();
        assert_eq!(other.import_json(json).unwrap(), 1);
        assert_eq!(
            other.list_cases(None).unwrap()[0].materials,
            vec!["Zirconia", "Implant"]
        );

        assert!(matches!(
            other.import_json("{}".into()),
            Err(DentalLabError::ImportError(_))
        ));
        assert_eq!(other.list_cases(None).unwrap().len(), 1);
    }

    #[test]
    fn test_doctor_login_scopes_cases() {
        let core = open_database_in_memory().unwrap();
        core.add_case(form("Dr. Smith")).unwrap();
        core.add_case(form("Dr. Jones")).unwrap();
        core.register_doctor("Dr. Jones".into(), "secret1".into())
            .unwrap();

        let session = core
            .login_doctor("Dr. Jones".into(), "secret1".into())
            .unwrap()
            .unwrap();
        assert_eq!(session.role, "doctor");

        let visible = core.list_cases_for_session(session).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].dentist_name, "Dr. Jones");

        assert!(matches!(
            core.register_doctor("Dr. Jones".into(), "secret2".into()),
            Err(DentalLabError::DuplicateUser(_))
        ));
        assert!(core.login_owner("anything".into()).is_none());
    }

    #[test]
    fn test_report_uses_lab_name() {
        let core = open_database_in_memory().unwrap();
        assert_eq!(
            core.generate_report(None).unwrap(),
            export::NO_DATA_REPORT
        );
        core.add_case(form("Dr. Smith")).unwrap();
        assert!(core
            .generate_report(None)
            .unwrap()
            .starts_with("Elegant Smile Dental Lab - Summary Report"));
    }
}
