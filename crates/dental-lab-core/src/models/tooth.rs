//! Tooth numbers in FDI two-digit notation.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::vocab::{split_tokens, TOKEN_SEPARATOR};

/// Upper arch as shown on the tooth selector, patient right to left.
pub const UPPER_ARCH: [u16; 16] = [18, 17, 16, 15, 14, 13, 12, 11, 21, 22, 23, 24, 25, 26, 27, 28];

/// Lower arch as shown on the tooth selector, patient right to left.
pub const LOWER_ARCH: [u16; 16] = [48, 47, 46, 45, 44, 43, 42, 41, 31, 32, 33, 34, 35, 36, 37, 38];

/// Check that a number is a permanent-dentition FDI code (quadrant 1-4, position 1-8).
pub fn is_fdi_permanent(number: u16) -> bool {
    let quadrant = number / 10;
    let position = number % 10;
    (1..=4).contains(&quadrant) && (1..=8).contains(&position)
}

/// Ordered list of tooth numbers for one case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToothNumbers(Vec<u16>);

impl ToothNumbers {
    pub fn new(numbers: Vec<u16>) -> Self {
        Self(numbers)
    }

    /// Parse the legacy text form (`"11, 12, 21"`).
    ///
    /// Tokens that are not integers are dropped silently.
    pub fn parse(text: &str) -> Self {
        Self(
            split_tokens(text)
                .filter_map(|t| t.parse::<u16>().ok())
                .collect(),
        )
    }

    /// Number of teeth in the case.
    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }

    /// Toggle a tooth on or off, keeping the list sorted ascending.
    pub fn toggle(&mut self, number: u16) {
        if let Some(pos) = self.0.iter().position(|n| *n == number) {
            self.0.remove(pos);
        } else {
            self.0.push(number);
        }
        self.0.sort_unstable();
    }

    /// Numbers that are not valid permanent FDI codes.
    pub fn invalid(&self) -> Vec<u16> {
        self.0
            .iter()
            .copied()
            .filter(|n| !is_fdi_permanent(*n))
            .collect()
    }

    /// Legacy comma-joined text form.
    pub fn to_text(&self) -> String {
        self.0
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(TOKEN_SEPARATOR)
    }
}

impl From<Vec<u16>> for ToothNumbers {
    fn from(numbers: Vec<u16>) -> Self {
        Self(numbers)
    }
}

impl fmt::Display for ToothNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Serialize for ToothNumbers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for ToothNumbers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ToothNumbersVisitor)
    }
}

struct ToothNumbersVisitor;

impl<'de> Visitor<'de> for ToothNumbersVisitor {
    type Value = ToothNumbers;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a comma-separated string of tooth numbers or a list of numbers")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ToothNumbers::parse(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ToothNumbers(u16::try_from(v).ok().into_iter().collect()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ToothNumbers::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ToothNumbers::default())
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut numbers = Vec::new();
        while let Some(value) = seq.next_element::<serde_json::Value>()? {
            match value {
                serde_json::Value::Number(n) => {
                    if let Some(n) = n.as_u64().and_then(|n| u16::try_from(n).ok()) {
                        numbers.push(n);
                    }
                }
                serde_json::Value::String(s) => numbers.extend(ToothNumbers::parse(&s).0),
                _ => {}
            }
        }
        Ok(ToothNumbers(numbers))
    }
}
