//! Export and import of case collections (JSON, CSV, text report).

mod csv;
mod json;
mod report;

pub use self::csv::*;
pub use json::*;
pub use report::*;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Export/import errors.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The imported document is not a list of case records.
    #[error("Invalid import format: {0}")]
    ImportFormat(String),

    /// A record could not be turned into text.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Output formats offered by the export actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Report,
}

impl ExportFormat {
    /// File name used when the export is saved.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "elegant-smile-data.json",
            ExportFormat::Csv => "elegant-smile-data.csv",
            ExportFormat::Report => "dental-lab-report.txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Report => "text/plain",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Report => write!(f, "report"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "report" | "txt" | "text" => Ok(ExportFormat::Report),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}
