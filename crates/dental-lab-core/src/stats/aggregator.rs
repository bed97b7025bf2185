//! Case aggregation for the owner and doctor dashboards.

use serde::{Deserialize, Serialize};

use super::tally::{count_of, Tally, TallyEntry};
use crate::models::{CaseRecord, Token};

/// Summary statistics for a set of cases.
///
/// Every breakdown lists keys in the order they were first met while
/// scanning the cases front to back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseStats {
    /// Number of cases
    pub total_cases: usize,
    /// Teeth across all cases
    pub total_teeth: usize,
    /// Material selections across all cases (a two-material case counts 2)
    pub total_material_selections: usize,
    /// Cases per exact dentist name
    pub cases_by_dentist: Vec<TallyEntry>,
    /// Occurrences of each material
    pub material_usage: Vec<TallyEntry>,
    /// Teeth attributed to each material; a case with several materials
    /// contributes its full tooth count to each of them
    pub teeth_by_material: Vec<TallyEntry>,
    /// Occurrences of each prosthesis type
    pub prosthesis_usage: Vec<TallyEntry>,
}

impl CaseStats {
    /// True when there is nothing to chart.
    pub fn is_empty(&self) -> bool {
        self.total_cases == 0
    }

    pub fn cases_for_dentist(&self, dentist: &str) -> Option<usize> {
        count_of(&self.cases_by_dentist, dentist)
    }

    pub fn material_count(&self, material: &str) -> Option<usize> {
        count_of(&self.material_usage, material)
    }

    pub fn teeth_for_material(&self, material: &str) -> Option<usize> {
        count_of(&self.teeth_by_material, material)
    }

    pub fn prosthesis_count(&self, prosthesis: &str) -> Option<usize> {
        count_of(&self.prosthesis_usage, prosthesis)
    }
}

/// Compute dashboard statistics. Pure; order of `cases` only affects key order.
pub fn compute_stats(cases: &[CaseRecord]) -> CaseStats {
    let mut by_dentist = Tally::new();
    let mut material_usage = Tally::new();
    let mut teeth_by_material = Tally::new();
    let mut prosthesis_usage = Tally::new();
    let mut total_teeth = 0;
    let mut total_material_selections = 0;

    for case in cases {
        let teeth = case.tooth_count();
        total_teeth += teeth;
        total_material_selections += case.materials.len();

        by_dentist.increment(&case.dentist_name);

        for material in &case.materials {
            material_usage.increment(material.label());
            teeth_by_material.add(material.label(), teeth);
        }

        for prosthesis in &case.prosthesis_types {
            prosthesis_usage.increment(prosthesis.label());
        }
    }

    CaseStats {
        total_cases: cases.len(),
        total_teeth,
        total_material_selections,
        cases_by_dentist: by_dentist.into_entries(),
        material_usage: material_usage.into_entries(),
        teeth_by_material: teeth_by_material.into_entries(),
        prosthesis_usage: prosthesis_usage.into_entries(),
    }
}

/// Statistics restricted to one dentist's cases (doctor dashboard).
pub fn compute_stats_for_dentist(cases: &[CaseRecord], dentist: &str) -> CaseStats {
    let own: Vec<CaseRecord> = cases
        .iter()
        .filter(|c| c.dentist_name == dentist)
        .cloned()
        .collect();
    compute_stats(&own)
}

/// Owner search box: keep cases whose dentist or patient name contains `query`.
///
/// A blank query keeps everything.
pub fn filter_cases<'a>(cases: &'a [CaseRecord], query: &str) -> Vec<&'a CaseRecord> {
    let query = query.trim();
    if query.is_empty() {
        return cases.iter().collect();
    }
    cases.iter().filter(|c| c.matches_query(query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ToothNumbers, TokenList};

    fn case(id: &str, dentist: &str, teeth: &str, prosthesis: &str, material: &str) -> CaseRecord {
        CaseRecord {
            id: id.into(),
            patient_name: format!("Patient {}", id),
            dentist_name: dentist.into(),
            tooth_numbers: ToothNumbers::parse(teeth),
            prosthesis_types: TokenList::parse(prosthesis),
            materials: TokenList::parse(material),
            shade: "A2".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_collection() {
        let stats = compute_stats(&[]);
        assert!(stats.is_empty());
        assert_eq!(stats, CaseStats::default());
    }

    #[test]
    fn test_single_case_two_materials() {
        let stats = compute_stats(&[case("1", "Dr. A", "11, 12", "Bridge", "Zirconia, Implant")]);

        assert_eq!(stats.total_teeth, 2);
        assert_eq!(stats.total_material_selections, 2);
        assert_eq!(stats.material_count("Zirconia"), Some(1));
        assert_eq!(stats.material_count("Implant"), Some(1));
        assert_eq!(stats.teeth_for_material("Zirconia"), Some(2));
        assert_eq!(stats.teeth_for_material("Implant"), Some(2));
    }

    #[test]
    fn test_dentist_order_is_first_seen() {
        let cases = vec![
            case("1", "Dr. B", "11", "Separate", "Zolid"),
            case("2", "Dr. A", "12", "Separate", "Zolid"),
            case("3", "Dr. B", "13", "Separate", "Zolid"),
        ];
        let stats = compute_stats(&cases);

        let names: Vec<_> = stats.cases_by_dentist.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Dr. B", "Dr. A"]);
        assert_eq!(stats.cases_for_dentist("Dr. B"), Some(2));
    }

    #[test]
    fn test_empty_material_contributes_nothing() {
        let stats = compute_stats(&[case("1", "Dr. A", "11, 12, 13", "Bridge", "")]);
        assert_eq!(stats.total_teeth, 3);
        assert!(stats.material_usage.is_empty());
        assert!(stats.teeth_by_material.is_empty());
    }

    #[test]
    fn test_prosthesis_is_token_split() {
        let stats = compute_stats(&[
            case("1", "Dr. A", "11", "Separate, Bridge", "Zolid"),
            case("2", "Dr. A", "12", "Bridge", "Zolid"),
        ]);
        assert_eq!(stats.prosthesis_count("Bridge"), Some(2));
        assert_eq!(stats.prosthesis_count("Separate"), Some(1));
        assert_eq!(stats.prosthesis_count("Separate, Bridge"), None);
    }

    #[test]
    fn test_stats_for_dentist() {
        let cases = vec![
            case("1", "Dr. A", "11", "Separate", "Zolid"),
            case("2", "Dr. B", "12, 13", "Separate", "Zolid"),
        ];
        let stats = compute_stats_for_dentist(&cases, "Dr. B");
        assert_eq!(stats.total_cases, 1);
        assert_eq!(stats.total_teeth, 2);
    }

    #[test]
    fn test_filter_cases() {
        let cases = vec![
            case("1", "Dr. Smith", "11", "Separate", "Zolid"),
            case("2", "Dr. Jones", "12", "Separate", "Zolid"),
        ];
        assert_eq!(filter_cases(&cases, "smi").len(), 1);
        assert_eq!(filter_cases(&cases, "patient").len(), 2);
        assert_eq!(filter_cases(&cases, "  ").len(), 2);
        assert!(filter_cases(&cases, "nobody").is_empty());
    }
}
