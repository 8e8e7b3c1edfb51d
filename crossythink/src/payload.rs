//! The puzzle payload exchanged with the generator.
//!
//! ```json
//! {
//!   "success": true,
//!   "grid": [["", "C", ""], ["", "A", ""]],
//!   "words": [{ "word": "CA", "direction": "down", "row": 0, "col": 1, "length": 2 }],
//!   "definitions": { "CA": "California, briefly" },
//!   "grid_size": 3
//! }
//! ```
//!
//! Word coordinates are in the space of `grid` as delivered, before normalization.

use crate::{Direction, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

fn default_success() -> bool {
  true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
  #[serde(default = "default_success")]
  pub success: bool,
  /// Raw letter grid. `null`, `""` and whitespace are all empty cells.
  #[serde(default)]
  pub grid: Vec<Vec<Option<String>>>,
  #[serde(default)]
  pub words: Vec<Placement>,
  /// Clue text keyed by answer.
  #[serde(default)]
  pub definitions: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_words: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placed_words: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub grid_size: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Where one answer sits in the raw grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
  pub word: String,
  #[serde(default)]
  pub direction: String,
  #[serde(default)]
  pub row: usize,
  #[serde(default)]
  pub col: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub length: Option<usize>,
}

impl Placement {
  pub fn direction(&self) -> Direction {
    Direction::from_label(&self.direction)
  }

  /// The declared length, or the length of the word when none was given.
  pub fn length(&self) -> usize {
    match self.length {
      Some(len) if len > 0 => len,
      _ => self.word.trim().chars().count(),
    }
  }
}

impl Payload {
  pub fn from_json(text: &str) -> Result<Self> {
    Ok(serde_json::from_str(text)?)
  }

  pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
    Ok(serde_json::from_reader(reader)?)
  }

  pub fn to_json_pretty(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Turns a payload that reports failure into an [Error::Generation].
  pub fn into_result(self) -> Result<Self> {
    if self.success {
      Ok(self)
    } else {
      let message = self
        .error
        .unwrap_or_else(|| "generator reported failure".to_string());
      Err(Error::Generation(message))
    }
  }
}
