//! Case collection storage seam.
//!
//! The aggregator and exporter work on plain slices; whatever serves the UI
//! reads and writes through this trait.

use crate::db::{Database, DbResult};
use crate::models::{CasePatch, CaseRecord, NewCase, Session};

pub trait CaseStore {
    /// Every case, newest first.
    fn list_all(&self) -> DbResult<Vec<CaseRecord>>;

    /// One dentist's cases (exact name match), newest first.
    fn list_by_dentist(&self, dentist_name: &str) -> DbResult<Vec<CaseRecord>>;

    /// Store a new case and return it with its assigned ID and timestamp.
    fn add(&self, new_case: NewCase) -> DbResult<CaseRecord>;

    fn update(&self, id: &str, patch: &CasePatch) -> DbResult<CaseRecord>;

    /// Returns false when no case had that ID.
    fn remove(&self, id: &str) -> DbResult<bool>;

    /// Swap the whole collection for `cases`. All or nothing.
    fn replace_all(&self, cases: &[CaseRecord]) -> DbResult<()>;

    /// Cases visible to a signed-in user.
    fn list_for_session(&self, session: &Session) -> DbResult<Vec<CaseRecord>> {
        match session.dentist_scope() {
            Some(dentist) => self.list_by_dentist(dentist),
            None => self.list_all(),
        }
    }
}

impl CaseStore for Database {
    fn list_all(&self) -> DbResult<Vec<CaseRecord>> {
        self.list_cases()
    }

    fn list_by_dentist(&self, dentist_name: &str) -> DbResult<Vec<CaseRecord>> {
        self.list_cases_by_dentist(dentist_name)
    }

    fn add(&self, new_case: NewCase) -> DbResult<CaseRecord> {
        self.add_case(new_case)
    }

    fn update(&self, id: &str, patch: &CasePatch) -> DbResult<CaseRecord> {
        self.update_case(id, patch)
    }

    fn remove(&self, id: &str) -> DbResult<bool> {
        self.delete_case(id)
    }

    fn replace_all(&self, cases: &[CaseRecord]) -> DbResult<()> {
        self.replace_all_cases(cases)
    }
}
