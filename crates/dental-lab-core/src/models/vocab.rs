//! Fixed vocabularies for multi-value case fields.
//!
//! Materials and prosthesis types are picked from short fixed lists on the
//! entry form, but stored records may carry any text. Unknown labels are kept
//! verbatim as `Other` so aggregation and export never lose data.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Separator used when a token list is written back to its legacy text form.
pub const TOKEN_SEPARATOR: &str = ", ";

/// A single vocabulary entry that can be read from and written to text.
pub trait Token: Clone + PartialEq + fmt::Debug {
    /// Parse one already-trimmed, non-empty token.
    fn from_label(label: &str) -> Self;

    /// Display label as used in forms, exports and reports.
    fn label(&self) -> &str;
}

/// Restoration material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Material {
    Zolid,
    Zirconia,
    NickelFree,
    NGuard,
    Implant,
    MookUp,
    Other(String),
}

impl Material {
    /// Materials offered on the case-entry form, in form order.
    pub const STANDARD: [Material; 6] = [
        Material::Zolid,
        Material::Zirconia,
        Material::NickelFree,
        Material::NGuard,
        Material::Implant,
        Material::MookUp,
    ];
}

impl Token for Material {
    fn from_label(label: &str) -> Self {
        match label {
            "Zolid" => Material::Zolid,
            "Zirconia" => Material::Zirconia,
            "Nickel Free" => Material::NickelFree,
            "N-Guard" => Material::NGuard,
            "Implant" => Material::Implant,
            "MookUp" => Material::MookUp,
            other => Material::Other(other.to_string()),
        }
    }

    fn label(&self) -> &str {
        match self {
            Material::Zolid => "Zolid",
            Material::Zirconia => "Zirconia",
            Material::NickelFree => "Nickel Free",
            Material::NGuard => "N-Guard",
            Material::Implant => "Implant",
            Material::MookUp => "MookUp",
            Material::Other(s) => s,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Prosthesis construction type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProsthesisType {
    /// Individual crowns
    Separate,
    Bridge,
    Other(String),
}

impl ProsthesisType {
    /// Types offered on the case-entry form, in form order.
    pub const STANDARD: [ProsthesisType; 2] = [ProsthesisType::Separate, ProsthesisType::Bridge];
}

impl Token for ProsthesisType {
    fn from_label(label: &str) -> Self {
        match label {
            "Separate" => ProsthesisType::Separate,
            "Bridge" => ProsthesisType::Bridge,
            other => ProsthesisType::Other(other.to_string()),
        }
    }

    fn label(&self) -> &str {
        match self {
            ProsthesisType::Separate => "Separate",
            ProsthesisType::Bridge => "Bridge",
            ProsthesisType::Other(s) => s,
        }
    }
}

impl fmt::Display for ProsthesisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Split a comma-joined field into trimmed, non-empty pieces.
pub fn split_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Ordered list of vocabulary tokens.
///
/// In memory this is a plain list; on the wire (JSON, CSV, SQLite) it is the
/// legacy comma-joined text, e.g. `"Zirconia, Implant"`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenList<T: Token>(Vec<T>);

impl<T: Token> Default for TokenList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Token> TokenList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }

    /// Parse the legacy comma-joined text form.
    pub fn parse(text: &str) -> Self {
        Self(split_tokens(text).map(T::from_label).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    /// Labels in stored order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(Token::label)
    }

    /// Legacy comma-joined text form.
    pub fn to_text(&self) -> String {
        self.labels().collect::<Vec<_>>().join(TOKEN_SEPARATOR)
    }
}

impl<T: Token> From<Vec<T>> for TokenList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<'a, T: Token> IntoIterator for &'a TokenList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: Token> fmt::Display for TokenList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl<T: Token> Serialize for TokenList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de, T: Token> Deserialize<'de> for TokenList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LegacyListVisitor(std::marker::PhantomData))
    }
}

/// Accepts the comma-joined text form, `null`, or a JSON array of labels.
struct LegacyListVisitor<T>(std::marker::PhantomData<T>);

impl<'de, T: Token> Visitor<'de> for LegacyListVisitor<T> {
    type Value = TokenList<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a comma-separated string or a list of strings")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(TokenList::parse(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(TokenList::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(TokenList::default())
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(label) = seq.next_element::<String>()? {
            items.extend(split_tokens(&label).map(T::from_label));
        }
        Ok(TokenList(items))
    }
}
