//! Plain-text summary report.

use chrono::{DateTime, Local, TimeZone};

use crate::models::CaseRecord;
use crate::stats::{compute_stats, TallyEntry};

/// Returned instead of a report when there are no cases.
pub const NO_DATA_REPORT: &str = "No data available to generate a report.";

/// Lab name used in the report title when none is configured.
pub const DEFAULT_LAB_NAME: &str = "Elegant Smile Dental Lab";

const RULE: &str = "==================================================";

/// Generate the summary report stamped with the current local time.
pub fn generate_report(cases: &[CaseRecord], lab_name: &str) -> String {
    generate_report_at(cases, lab_name, Local::now())
}

/// Generate the summary report with an explicit generation time.
pub fn generate_report_at<Tz>(cases: &[CaseRecord], lab_name: &str, generated_at: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if cases.is_empty() {
        return NO_DATA_REPORT.to_string();
    }

    let stats = compute_stats(cases);
    let mut report = String::new();

    report.push_str(&format!("{} - Summary Report\n", lab_name));
    report.push_str(&format!(
        "Generated on: {}\n",
        generated_at.format("%-m/%-d/%Y, %-I:%M:%S %p")
    ));
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Total Cases: {}\n\n", stats.total_cases));

    push_breakdown(&mut report, "Breakdown by Prosthesis Type", &stats.prosthesis_usage);
    push_breakdown(&mut report, "Breakdown by Material", &stats.material_usage);
    push_breakdown(&mut report, "Cases per Dentist", &stats.cases_by_dentist);

    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
    report.push_str("End of Report\n");

    report
}

fn push_breakdown(report: &mut String, title: &str, entries: &[TallyEntry]) {
    report.push_str(&format!("--- {} ---\n", title));
    for entry in entries {
        report.push_str(&format!("{}: {}\n", entry.name, entry.count));
    }
    report.push('\n');
}
