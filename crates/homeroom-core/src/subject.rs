//! Subject — a named, color-coded bucket that homework is filed under.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Color ───────────────────────────────────────────────────────────────────

/// A CSS hex color, normalised to lowercase (`#rgb` or `#rrggbb`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
  /// The color a subject gets when the caller does not pick one.
  pub const DEFAULT: &'static str = "#6366f1";

  pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for Color {
  fn default() -> Self { Self(Self::DEFAULT.to_owned()) }
}

impl FromStr for Color {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    let valid = trimmed
      .strip_prefix('#')
      .filter(|hex| matches!(hex.len(), 3 | 6))
      .is_some_and(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()));

    if !valid {
      return Err(Error::InvalidColor(s.to_owned()));
    }
    Ok(Self(trimmed.to_ascii_lowercase()))
  }
}

impl TryFrom<String> for Color {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Color> for String {
  fn from(c: Color) -> Self { c.0 }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

/// A persisted subject. The `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:    Uuid,
  pub name:  String,
  pub color: Color,
}

/// Input for creating a subject. Names need not be unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
  pub name:  String,
  #[serde(default)]
  pub color: Color,
}

impl NewSubject {
  pub fn new(name: impl Into<String>, color: Color) -> Self {
    Self { name: name.into(), color }
  }

  /// Trim the name and reject it if nothing is left.
  pub fn validated(self) -> Result<Self> {
    let name = self.name.trim();
    if name.is_empty() {
      return Err(Error::EmptySubjectName);
    }
    Ok(Self { name: name.to_owned(), color: self.color })
  }
}
