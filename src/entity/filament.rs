use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpooldexError};

/// Upper bound for the remaining percentage of a spool.
pub const MAX_REMAINING: u8 = 100;

/// A `#RRGGBB` color code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorHex(String);

impl ColorHex {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ColorHex {
    fn default() -> Self {
        Self("#000000".to_string())
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ColorHex {
    type Err = SpooldexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SpooldexError::InvalidColorHex(s.to_string()));
        }

        Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
    }
}

impl TryFrom<String> for ColorHex {
    type Error = SpooldexError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColorHex> for String {
    fn from(value: ColorHex) -> Self {
        value.0
    }
}

/// One filament spool in the inventory.
///
/// Records carry no identity of their own; they are addressed by their
/// position in the stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilamentRecord {
    pub color: String,
    pub company: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub remaining: u8,
    pub color_hex: ColorHex,
}

impl FilamentRecord {
    /// Build a record, clamping `remaining` into `0..=100`.
    pub fn new(
        color: impl Into<String>,
        company: impl Into<String>,
        kind: impl Into<String>,
        remaining: i64,
        color_hex: ColorHex,
    ) -> Self {
        Self {
            color: color.into(),
            company: company.into(),
            kind: kind.into(),
            remaining: clamp_remaining(remaining),
            color_hex,
        }
    }

    /// Label used by the edit selector, e.g. `Ruby Red (PLA)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.color, self.kind)
    }

    /// The records a fresh inventory starts with.
    pub fn seed() -> Vec<FilamentRecord> {
        [
            ("Army Green", "#4B5320"),
            ("Fluorescent Green", "#39FF14"),
            ("Ruby Red", "#E0115F"),
        ]
        .into_iter()
        .map(|(color, hex)| FilamentRecord {
            color: color.to_string(),
            company: "Creality".to_string(),
            kind: "PLA".to_string(),
            remaining: 50,
            color_hex: ColorHex(hex.to_string()),
        })
        .collect()
    }
}

fn clamp_remaining(value: i64) -> u8 {
    value.clamp(0, MAX_REMAINING as i64) as u8
}

/// Unvalidated input from the add and edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilamentDraft {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub remaining: i64,
    #[serde(default)]
    pub color_hex: String,
}

impl FilamentDraft {
    pub fn new(
        color: impl Into<String>,
        company: impl Into<String>,
        kind: impl Into<String>,
        remaining: i64,
        color_hex: impl Into<String>,
    ) -> Self {
        Self {
            color: color.into(),
            company: company.into(),
            kind: kind.into(),
            remaining,
            color_hex: color_hex.into(),
        }
    }

    /// Check required fields and normalise the draft into a record.
    pub fn validate(&self) -> Result<FilamentRecord> {
        let color = required("Color Name", &self.color)?;
        let company = required("Company", &self.company)?;
        let kind = required("Type", &self.kind)?;
        let color_hex: ColorHex = self.color_hex.parse()?;

        Ok(FilamentRecord::new(
            color,
            company,
            kind,
            self.remaining,
            color_hex,
        ))
    }
}

impl From<&FilamentRecord> for FilamentDraft {
    fn from(record: &FilamentRecord) -> Self {
        Self {
            color: record.color.clone(),
            company: record.company.clone(),
            kind: record.kind.clone(),
            remaining: i64::from(record.remaining),
            color_hex: record.color_hex.to_string(),
        }
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SpooldexError::Validation { field });
    }
    Ok(trimmed)
}
