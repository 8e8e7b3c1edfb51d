//! This crate is the foundation of the CrossyThink crossword game. It provides no UI
//! itself, but see `crosstui` for an example of how you can use it to produce a
//! crossword app.
//!
//! Puzzles arrive from a generator as a sparse grid of letters plus a list of word
//! placements (see [payload]). [grid::normalize] trims and squares that grid,
//! [viewport::fit_or_scroll] maps it onto whatever the screen can show, and
//! [Puzzle] holds the state of a single solving session.

use Direction::{Across, Down};
use std::fmt::Debug;
use std::fmt::Display;
use std::ops::Not;

pub mod generator;
pub mod grid;
pub mod payload;
mod puzzle;
pub mod viewport;

pub use grid::{Cell, Normalized, Offset, normalize};
pub use payload::{Payload, Placement};
pub use puzzle::{CheckOutcome, Mark, Puzzle, SquareStyle, Word};
pub use viewport::{DisplayLayout, fit_or_scroll, to_display_coords, to_puzzle_coords};

/// The two crossword directions: `Across` and `Down`
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub enum Direction {
  Across,
  Down,
}

impl Direction {
  /// Reads a direction label as the generator writes it. `h`, `horizontal` and
  /// `across` (in any case) mean [Across]; everything else means [Down].
  pub fn from_label(label: &str) -> Self {
    match label.trim().to_ascii_lowercase().as_str() {
      "h" | "horizontal" | "across" => Across,
      _ => Down,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Across => "across",
      Down => "down",
    }
  }

  /// The position `steps` squares after `pos` in this direction.
  pub fn advance(self, (row, col): Pos, steps: usize) -> Pos {
    match self {
      Across => (row, col + steps),
      Down => (row + steps, col),
    }
  }
}

impl Not for Direction {
  type Output = Self;
  fn not(self) -> Self {
    match self {
      Across => Down,
      Down => Across,
    }
  }
}

impl Display for Direction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.pad(self.as_str())
  }
}

/// A square in a crossword grid.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Square {
  /// A black square where nothing can be entered.
  Black,
  /// A square where a letter could be entered, but that is currently empty.
  Empty,
  /// A square with a letter written in it.
  Letter(char),
}

impl Square {
  /// Whether this is [Square::Black].
  pub fn is_black(&self) -> bool {
    *self == Self::Black
  }

  pub fn is_empty(&self) -> bool {
    *self == Self::Empty
  }

  /// Whether this is not a black square, i.e. either a [Square::Empty] or [Square::Letter].
  pub fn is_white(&self) -> bool {
    !self.is_black()
  }
}

impl Debug for Square {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Black => write!(f, "■"),
      Self::Empty => write!(f, " "),
      Self::Letter(c) => write!(f, "{}", c),
    }?;
    Ok(())
  }
}

impl Display for Square {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// A position in a grid: (row, column)
pub type Pos = (usize, usize);

/// A grid of squares. Used to represent the current state of a partially-solved puzzle,
/// or the solution of a puzzle.
#[derive(Clone, Eq, PartialEq)]
pub struct Grid(Vec<Vec<Square>>);

impl Grid {
  fn new(rows: Vec<Vec<Square>>) -> Self {
    Self(rows)
  }

  /// A copy of this grid with every letter erased, ready to be solved.
  fn erased(&self) -> Self {
    let rows = self
      .0
      .iter()
      .map(|row| {
        row
          .iter()
          .map(|&sq| if sq.is_black() { sq } else { Square::Empty })
          .collect()
      })
      .collect();
    Self(rows)
  }

  /// The width of this grid.
  pub fn width(&self) -> usize {
    self.0.first().map_or(0, Vec::len)
  }

  /// The height of this grid.
  pub fn height(&self) -> usize {
    self.0.len()
  }

  /// An iterator over all the positions of this grid, from left to right and top to bottom.
  pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
    let width = self.width();
    (0..self.height()).flat_map(move |row| (0..width).map(move |col| (row, col)))
  }

  /// Returns the [Square] at the given [Pos].
  pub fn get(&self, (r, c): Pos) -> Square {
    self.0[r][c]
  }

  /// Like [Grid::get], but returns `None` instead of panicking outside the grid.
  pub fn try_get(&self, (r, c): Pos) -> Option<Square> {
    self.0.get(r).and_then(|row| row.get(c)).copied()
  }

  fn set(&mut self, (r, c): Pos, square: Square) {
    self.0[r][c] = square;
  }

  /// Returns the position of the next white square above `pos`.
  fn next_up_neighbor(&self, pos: Pos) -> Option<Pos> {
    let (mut row, col) = pos;
    loop {
      if row == 0 {
        return None;
      }
      row -= 1;
      if self.get((row, col)).is_white() {
        return Some((row, col));
      }
    }
  }

  /// Returns the position of the next white square below `pos`.
  fn next_down_neighbor(&self, pos: Pos) -> Option<Pos> {
    let (mut row, col) = pos;
    loop {
      if row + 1 >= self.height() {
        return None;
      }
      row += 1;
      if self.get((row, col)).is_white() {
        return Some((row, col));
      }
    }
  }

  /// Returns the position of the next white square to the left of `pos`.
  fn next_left_neighbor(&self, pos: Pos) -> Option<Pos> {
    let (row, mut col) = pos;
    loop {
      if col == 0 {
        return None;
      }
      col -= 1;
      if self.get((row, col)).is_white() {
        return Some((row, col));
      }
    }
  }

  /// Returns the position of the next white square to the right of `pos`.
  fn next_right_neighbor(&self, pos: Pos) -> Option<Pos> {
    let (row, mut col) = pos;
    loop {
      if col + 1 >= self.width() {
        return None;
      }
      col += 1;
      if self.get((row, col)).is_white() {
        return Some((row, col));
      }
    }
  }
}

impl Debug for Grid {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for row in &self.0 {
      for sq in row {
        write!(f, "{}", sq)?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

impl Display for Grid {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "\n{:?}", self)
  }
}

/// The errors that may be produced by functions in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The raw grid is not rectangular.
  #[error("row {row} has {found} cells but the first row has {expected}")]
  RaggedGrid {
    row: usize,
    expected: usize,
    found: usize,
  },
  /// A grid cell holds something other than a single letter or a blank.
  #[error("cell ({row}, {col}) holds {value:?}, expected a single letter")]
  InvalidCell { row: usize, col: usize, value: String },
  /// A word placement does not fit the grid it was delivered with.
  #[error("word {number} ({word}) {reason}")]
  Placement {
    number: u32,
    word: String,
    reason: String,
  },
  /// The grid has a letter that no word covers, so the puzzle could never be solved.
  #[error("letter {letter} at ({row}, {col}) is not part of any word")]
  StrayLetter { row: usize, col: usize, letter: char },
  /// The generator could not produce a puzzle, or reported that it couldn't.
  #[error("puzzle generation failed: {0}")]
  Generation(String),
  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
  /// An [I/O error](std::io::Error) occurred.
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
