//! Form validation for case entry and doctor accounts.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CasePatch, NewCase};

/// Shortest accepted patient, dentist or doctor name.
pub const MIN_NAME_CHARS: usize = 2;

/// Shortest accepted doctor password.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// One failing form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Wire name of the field (`patientName`, `toothNumbers`, ...)
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field that failed, in form order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed: {}", summary(.failures))]
pub struct ValidationError {
    pub failures: Vec<FieldError>,
}

impl ValidationError {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.field.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }
}

fn summary(failures: &[FieldError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects failures, then turns them into a result.
#[derive(Default)]
struct Checker {
    failures: Vec<FieldError>,
}

impl Checker {
    fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.failures.push(FieldError::new(field, message));
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                failures: self.failures,
            })
        }
    }
}

fn long_enough(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

/// Validate a case submitted from the entry form.
pub fn validate_new_case(case: &NewCase, max_photo_bytes: usize) -> Result<(), ValidationError> {
    let mut checker = Checker::default();

    checker.check(
        long_enough(&case.patient_name, MIN_NAME_CHARS),
        "patientName",
        "Patient name must be at least 2 characters.",
    );
    checker.check(
        long_enough(&case.dentist_name, MIN_NAME_CHARS),
        "dentistName",
        "Dentist name must be at least 2 characters.",
    );
    check_teeth(&mut checker, &case.tooth_numbers);
    checker.check(
        !case.prosthesis_types.is_empty(),
        "prosthesisType",
        "Please select at least one prosthesis type.",
    );
    checker.check(
        !case.materials.is_empty(),
        "material",
        "Please select at least one material.",
    );
    checker.check(!case.shade.trim().is_empty(), "shade", "Shade is required.");
    if let Some(photo) = &case.photo_data_uri {
        check_photo(&mut checker, photo, max_photo_bytes);
    }

    checker.finish()
}

/// Validate only the fields a patch sets.
pub fn validate_patch(patch: &CasePatch, max_photo_bytes: usize) -> Result<(), ValidationError> {
    let mut checker = Checker::default();

    if let Some(name) = &patch.patient_name {
        checker.check(
            long_enough(name, MIN_NAME_CHARS),
            "patientName",
            "Patient name must be at least 2 characters.",
        );
    }
    if let Some(name) = &patch.dentist_name {
        checker.check(
            long_enough(name, MIN_NAME_CHARS),
            "dentistName",
            "Dentist name must be at least 2 characters.",
        );
    }
    if let Some(teeth) = &patch.tooth_numbers {
        check_teeth(&mut checker, teeth);
    }
    if let Some(types) = &patch.prosthesis_types {
        checker.check(
            !types.is_empty(),
            "prosthesisType",
            "Please select at least one prosthesis type.",
        );
    }
    if let Some(materials) = &patch.materials {
        checker.check(
            !materials.is_empty(),
            "material",
            "Please select at least one material.",
        );
    }
    if let Some(shade) = &patch.shade {
        checker.check(!shade.trim().is_empty(), "shade", "Shade is required.");
    }
    // Empty string clears the photo
    if let Some(photo) = patch.photo_data_uri.as_deref().filter(|p| !p.is_empty()) {
        check_photo(&mut checker, photo, max_photo_bytes);
    }

    checker.finish()
}

/// Validate the add-doctor form.
pub fn validate_doctor(name: &str, password: &str) -> Result<(), ValidationError> {
    let mut checker = Checker::default();
    checker.check(
        long_enough(name, MIN_NAME_CHARS),
        "name",
        "Doctor name must be at least 2 characters.",
    );
    checker.check(
        password.chars().count() >= MIN_PASSWORD_CHARS,
        "password",
        "Password must be at least 6 characters.",
    );
    checker.finish()
}

fn check_teeth(checker: &mut Checker, teeth: &crate::models::ToothNumbers) {
    if teeth.is_empty() {
        checker.check(false, "toothNumbers", "Please select at least one tooth.");
        return;
    }
    let invalid = teeth.invalid();
    checker.check(
        invalid.is_empty(),
        "toothNumbers",
        format!(
            "Not valid FDI tooth numbers: {}",
            invalid
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );
}

fn check_photo(checker: &mut Checker, photo: &str, max_photo_bytes: usize) {
    match data_uri_payload_len(photo) {
        None => checker.check(false, "photoDataUri", "Photo must be a data: URI."),
        Some(len) => checker.check(
            len <= max_photo_bytes,
            "photoDataUri",
            format!(
                "Photo is {} bytes; the limit is {} bytes.",
                len, max_photo_bytes
            ),
        ),
    }
}

/// Decoded size of a `data:` URI payload, or `None` if it is not one.
pub fn data_uri_payload_len(uri: &str) -> Option<usize> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;

    if header.ends_with(";base64") {
        let payload = payload.trim_end();
        let padding = payload.chars().rev().take_while(|&c| c == '=').count();
        Some(((payload.len() / 4) * 3 + base64_tail(payload.len() % 4)).saturating_sub(padding.min(2)))
    } else {
        Some(payload.len())
    }
}

/// Bytes carried by a trailing partial base64 quad.
fn base64_tail(rem: usize) -> usize {
    match rem {
        2 => 1,
        3 => 2,
        _ => 0,
    }
}
