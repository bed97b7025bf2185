//! Case records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::tooth::ToothNumbers;
use super::vocab::{Material, ProsthesisType, TokenList};

/// Channel a case was entered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseSource {
    Mobile,
    Desktop,
}

impl fmt::Display for CaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseSource::Mobile => write!(f, "Mobile"),
            CaseSource::Desktop => write!(f, "Desktop"),
        }
    }
}

impl std::str::FromStr for CaseSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mobile" => Ok(CaseSource::Mobile),
            "desktop" => Ok(CaseSource::Desktop),
            other => Err(format!("unknown case source: {}", other)),
        }
    }
}

/// One dental-lab work order.
///
/// Field names on the wire follow the existing export files (`patientName`,
/// `toothNumbers`, `material`, ...), so exports from earlier versions of the
/// hub import unchanged. Decoding never fails on an off-shape field: `null`
/// or a value of the wrong type falls back to the field's default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseRecord {
    /// Unique ID within the collection
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub patient_name: String,
    /// Grouping key; doctor identity is matched on this exact string
    #[serde(deserialize_with = "lenient::text")]
    pub dentist_name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub tooth_numbers: ToothNumbers,
    #[serde(rename = "prosthesisType", deserialize_with = "lenient::or_default")]
    pub prosthesis_types: TokenList<ProsthesisType>,
    #[serde(rename = "material", deserialize_with = "lenient::or_default")]
    pub materials: TokenList<Material>,
    /// Shade code, free text
    #[serde(deserialize_with = "lenient::text")]
    pub shade: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_text"
    )]
    pub notes: Option<String>,
    /// Embedded photo as a `data:` URI
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_text"
    )]
    pub photo_data_uri: Option<String>,
    /// Creation timestamp (RFC 3339 on the wire)
    #[serde(
        serialize_with = "created_at::serialize",
        deserialize_with = "created_at::deserialize"
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Unknown channels read as `None`
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::source"
    )]
    pub source: Option<CaseSource>,
    /// Legacy due date carried by older exports
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "due_date::deserialize"
    )]
    pub due_date: Option<NaiveDate>,
}

impl CaseRecord {
    /// Teeth in this case.
    pub fn tooth_count(&self) -> usize {
        self.tooth_numbers.count()
    }

    /// Case-insensitive substring match on dentist or patient name.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.dentist_name.to_lowercase().contains(&query)
            || self.patient_name.to_lowercase().contains(&query)
    }
}

/// A case as submitted from the entry form, before it has an ID or timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCase {
    pub patient_name: String,
    pub dentist_name: String,
    pub tooth_numbers: ToothNumbers,
    #[serde(rename = "prosthesisType")]
    pub prosthesis_types: TokenList<ProsthesisType>,
    #[serde(rename = "material")]
    pub materials: TokenList<Material>,
    pub shade: String,
    pub notes: Option<String>,
    pub photo_data_uri: Option<String>,
    pub source: Option<CaseSource>,
}

impl NewCase {
    /// Assign a fresh ID and creation time.
    pub fn into_record(self) -> CaseRecord {
        CaseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_name: self.patient_name,
            dentist_name: self.dentist_name,
            tooth_numbers: self.tooth_numbers,
            prosthesis_types: self.prosthesis_types,
            materials: self.materials,
            shade: self.shade,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            photo_data_uri: self.photo_data_uri.filter(|p| !p.is_empty()),
            created_at: Some(Utc::now()),
            source: self.source,
            due_date: None,
        }
    }
}

/// Partial update applied to an existing case (replace-by-id edit).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CasePatch {
    pub patient_name: Option<String>,
    pub dentist_name: Option<String>,
    pub tooth_numbers: Option<ToothNumbers>,
    #[serde(rename = "prosthesisType")]
    pub prosthesis_types: Option<TokenList<ProsthesisType>>,
    #[serde(rename = "material")]
    pub materials: Option<TokenList<Material>>,
    pub shade: Option<String>,
    pub notes: Option<String>,
    pub photo_data_uri: Option<String>,
    pub source: Option<CaseSource>,
}

impl CasePatch {
    /// Full replacement of every editable field from another record.
    pub fn replace_with(record: &CaseRecord) -> Self {
        Self {
            patient_name: Some(record.patient_name.clone()),
            dentist_name: Some(record.dentist_name.clone()),
            tooth_numbers: Some(record.tooth_numbers.clone()),
            prosthesis_types: Some(record.prosthesis_types.clone()),
            materials: Some(record.materials.clone()),
            shade: Some(record.shade.clone()),
            notes: record.notes.clone(),
            photo_data_uri: record.photo_data_uri.clone(),
            source: record.source,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch in place. `id` and `created_at` never change.
    ///
    /// An empty `notes` or `photo_data_uri` string clears the field.
    pub fn apply(&self, record: &mut CaseRecord) {
        if let Some(ref v) = self.patient_name {
            record.patient_name = v.clone();
        }
        if let Some(ref v) = self.dentist_name {
            record.dentist_name = v.clone();
        }
        if let Some(ref v) = self.tooth_numbers {
            record.tooth_numbers = v.clone();
        }
        if let Some(ref v) = self.prosthesis_types {
            record.prosthesis_types = v.clone();
        }
        if let Some(ref v) = self.materials {
            record.materials = v.clone();
        }
        if let Some(ref v) = self.shade {
            record.shade = v.clone();
        }
        if let Some(ref v) = self.notes {
            record.notes = Some(v.clone()).filter(|n| !n.trim().is_empty());
        }
        if let Some(ref v) = self.photo_data_uri {
            record.photo_data_uri = Some(v.clone()).filter(|p| !p.is_empty());
        }
        if let Some(source) = self.source {
            record.source = Some(source);
        }
    }
}

/// Field readers for imported records that fall back instead of failing.
pub(crate) mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::CaseSource;

    /// Strings as-is, numbers and booleans as text, anything else empty.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(optional_text(deserializer)?.unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn source<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<CaseSource>, D::Error> {
        Ok(optional_text(deserializer)?.and_then(|s| s.parse().ok()))
    }

    /// Decode with the type's own rules, or use its default.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }
}

/// `createdAt` codec.
///
/// Writes RFC 3339. Reads RFC 3339 strings, bare dates, and the
/// `{"seconds": .., "nanoseconds": ..}` objects found in exports taken from
/// the hosted database. Anything else reads as `None`.
pub(crate) mod created_at {
    use super::*;
    use serde_json::Value;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Hosted {
            #[serde(alias = "_seconds")]
            seconds: i64,
            #[serde(default, alias = "_nanoseconds")]
            nanoseconds: u32,
        },
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match serde_json::from_value::<RawTimestamp>(value) {
            Ok(RawTimestamp::Text(s)) => parse_timestamp(&s),
            Ok(RawTimestamp::Hosted {
                seconds,
                nanoseconds,
            }) => DateTime::from_timestamp(seconds, nanoseconds),
            Err(_) => None,
        })
    }

    /// Parse RFC 3339, falling back to a bare date at midnight UTC.
    pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// `dueDate` reader: accepts `YYYY-MM-DD` or a full timestamp and keeps the
/// date. Unparseable values read as `None`.
pub(crate) mod due_date {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = super::lenient::optional_text(deserializer)?;
        Ok(raw.and_then(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| super::created_at::parse_timestamp(&s).map(|ts| ts.date_naive()))
        }))
    }
}
