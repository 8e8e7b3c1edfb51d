//! A backtracking crossword generator.
//!
//! Words are placed longest first. The first word goes across the middle of a square
//! working grid; every later word has to cross a letter that is already down. When a
//! word cannot be placed anywhere, the previous placement is undone and the next
//! candidate for it is tried.
//!
//! The grid it produces is the large, mostly empty working grid, so it goes through
//! [normalize](crate::grid::normalize) like any other generator output.

use crate::Direction::{Across, Down};
use crate::payload::{Payload, Placement};
use crate::{Direction, Error, Pos, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Side of the working grid.
pub const DEFAULT_SIZE: usize = 30;

/// Placements tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 20_000;

/// Reads a word list, one entry per line, either `WORD` or `WORD - clue`. Blank lines
/// and lines starting with `#` are skipped.
pub fn parse_word_list(text: &str) -> Vec<(String, String)> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with('#'))
    .filter_map(|line| {
      let (word, clue) = line.split_once(" - ").unwrap_or((line, ""));
      let word = word.trim().to_uppercase();
      (!word.is_empty()).then(|| (word, clue.trim().to_string()))
    })
    .collect()
}

/// One word as placed by the generator, in working-grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedWord {
  pub word: String,
  pub start: Pos,
  pub direction: Direction,
}

/// A finished layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
  pub grid: Vec<Vec<Option<char>>>,
  pub placements: Vec<PlacedWord>,
}

impl Generated {
  /// Packs the layout the way the generation service returns it: empty cells are
  /// `""`, coordinates are in the working grid.
  pub fn into_payload(self, definitions: &BTreeMap<String, String>) -> Payload {
    let size = self.grid.len();
    let grid = self
      .grid
      .into_iter()
      .map(|row| {
        row
          .into_iter()
          .map(|cell| Some(cell.map(String::from).unwrap_or_default()))
          .collect()
      })
      .collect();

    let words: Vec<Placement> = self
      .placements
      .into_iter()
      .map(|p| Placement {
        length: Some(p.word.chars().count()),
        direction: p.direction.as_str().to_string(),
        row: p.start.0,
        col: p.start.1,
        word: p.word,
      })
      .collect();

    let definitions = words
      .iter()
      .filter_map(|p| Some((p.word.clone(), definitions.get(&p.word)?.clone())))
      .collect();

    Payload {
      success: true,
      grid,
      total_words: Some(words.len()),
      placed_words: Some(words.len()),
      words,
      definitions,
      grid_size: Some(size),
      error: None,
    }
  }
}

/// A letter written by a placement, and what was there before, so it can be undone.
type Snapshot = Vec<(Pos, Option<char>)>;

/// Places a list of words on a square grid.
#[derive(Debug)]
pub struct Generator<'a, R> {
  words: Vec<Vec<char>>,
  size: usize,
  grid: Vec<Vec<Option<char>>>,
  placed: Vec<(usize, Pos, Direction)>,
  attempts: usize,
  max_attempts: usize,
  rng: &'a mut R,
}

impl<'a, R: Rng> Generator<'a, R> {
  pub fn new<S: AsRef<str>>(words: &[S], size: usize, rng: &'a mut R) -> Self {
    let mut words: Vec<Vec<char>> = words
      .iter()
      .map(|w| w.as_ref().trim().to_uppercase().chars().collect::<Vec<_>>())
      .filter(|w| !w.is_empty())
      .collect();
    // Longest first gives the short words more letters to cross.
    words.sort_by_key(|w| std::cmp::Reverse(w.len()));

    Self {
      words,
      size,
      grid: vec![vec![None; size]; size],
      placed: Vec::new(),
      attempts: 0,
      max_attempts: DEFAULT_MAX_ATTEMPTS,
      rng,
    }
  }

  pub fn max_attempts(mut self, max_attempts: usize) -> Self {
    self.max_attempts = max_attempts;
    self
  }

  /// Places every word or fails.
  pub fn generate(mut self) -> Result<Generated> {
    let Some(first) = self.words.first() else {
      return Err(Error::Generation("no words to place".to_string()));
    };
    if first.len() > self.size {
      return Err(Error::Generation(format!(
        "{} letters do not fit a {}x{} grid",
        first.len(),
        self.size,
        self.size
      )));
    }

    let start = (self.size / 2, (self.size - first.len()) / 2);
    self.place(0, start, Across);

    if !self.solve(1) {
      return Err(Error::Generation(format!(
        "could only place {} of {} words after {} attempts",
        self.placed.len(),
        self.words.len(),
        self.attempts
      )));
    }

    info!(
      words = self.placed.len(),
      attempts = self.attempts,
      "crossword generated"
    );

    let placements = self
      .placed
      .iter()
      .map(|&(index, start, direction)| PlacedWord {
        word: self.words[index].iter().collect(),
        start,
        direction,
      })
      .collect();

    Ok(Generated {
      grid: self.grid,
      placements,
    })
  }

  fn solve(&mut self, index: usize) -> bool {
    if index == self.words.len() {
      return true;
    }

    let mut candidates = self.candidates(index);
    candidates.shuffle(&mut *self.rng);

    for (start, direction) in candidates {
      if self.attempts >= self.max_attempts {
        debug!(attempts = self.attempts, "attempt budget exhausted");
        return false;
      }
      self.attempts += 1;

      let snapshot = self.place(index, start, direction);
      if self.solve(index + 1) {
        return true;
      }
      self.revert(snapshot);
    }

    false
  }

  fn letter(&self, (row, col): Pos) -> Option<char> {
    self.grid.get(row).and_then(|r| r.get(col)).copied().flatten()
  }

  /// Every legal (start, direction) for the word, found by lining it up with letters
  /// already on the grid.
  fn candidates(&self, index: usize) -> Vec<(Pos, Direction)> {
    let word = &self.words[index];
    let mut candidates = vec![];

    for row in 0..self.size {
      for col in 0..self.size {
        let Some(existing) = self.grid[row][col] else {
          continue;
        };
        for (i, _) in word.iter().enumerate().filter(|&(_, &c)| c == existing) {
          if let Some(start_col) = col.checked_sub(i) {
            candidates.push(((row, start_col), Across));
          }
          if let Some(start_row) = row.checked_sub(i) {
            candidates.push(((start_row, col), Down));
          }
        }
      }
    }

    candidates.sort_by_key(|&((row, col), direction)| (row, col, direction));
    candidates.dedup();
    candidates.retain(|&(start, direction)| self.can_place(word, start, direction));
    candidates
  }

  /// A word fits if it stays on the grid, agrees with every letter it crosses, does
  /// not run alongside another word, and does not touch a letter at either end.
  fn can_place(&self, word: &[char], start: Pos, direction: Direction) -> bool {
    let len = word.len();
    let (row, col) = start;
    let end = match direction {
      Across => col + len,
      Down => row + len,
    };
    if end > self.size {
      return false;
    }

    // The squares on either side of a position, across the word's direction.
    let sides = |(r, c): Pos| -> [Option<Pos>; 2] {
      match direction {
        Across => [r.checked_sub(1).map(|r| (r, c)), Some((r + 1, c))],
        Down => [c.checked_sub(1).map(|c| (r, c)), Some((r, c + 1))],
      }
    };

    for (i, &letter) in word.iter().enumerate() {
      let pos = direction.advance(start, i);
      match self.letter(pos) {
        Some(existing) if existing != letter => return false,
        Some(_) => {}
        None => {
          if sides(pos).into_iter().flatten().any(|p| self.letter(p).is_some()) {
            return false;
          }
        }
      }
    }

    let before = match direction {
      Across => col.checked_sub(1).map(|c| (row, c)),
      Down => row.checked_sub(1).map(|r| (r, col)),
    };
    let after = direction.advance(start, len);
    before.is_none_or(|p| self.letter(p).is_none()) && self.letter(after).is_none()
  }

  fn place(&mut self, index: usize, start: Pos, direction: Direction) -> Snapshot {
    let mut snapshot = Vec::with_capacity(self.words[index].len());
    for (i, &letter) in self.words[index].iter().enumerate() {
      let (row, col) = direction.advance(start, i);
      snapshot.push(((row, col), self.grid[row][col]));
      self.grid[row][col] = Some(letter);
    }
    self.placed.push((index, start, direction));
    snapshot
  }

  fn revert(&mut self, snapshot: Snapshot) {
    for ((row, col), previous) in snapshot {
      self.grid[row][col] = previous;
    }
    self.placed.pop();
  }
}

/// Generates a crossword for `words` on a `size` grid.
pub fn generate<S: AsRef<str>, R: Rng>(words: &[S], size: usize, rng: &mut R) -> Result<Generated> {
  Generator::new(words, size, rng).generate()
}
