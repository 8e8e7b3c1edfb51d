//! Normalization of raw generator grids.
//!
//! A generator lays its words out somewhere inside a large working grid, so the
//! grid it returns usually has wide empty borders. [normalize] crops those away,
//! surrounds the content with a one-square margin, and pads the shorter side so the
//! result is square. The [Offset] it returns translates every raw coordinate into
//! the normalized grid, and must be applied to all word placements that came with
//! the raw grid.

use crate::{Error, Pos, Result, Square};
use std::cmp::max;
use tracing::debug;

/// Number of empty layers kept around the content on every side.
pub const MARGIN: usize = 1;

/// A value that can sit in a raw grid.
pub trait Cell: Clone {
  /// The cell used for padding.
  fn blank() -> Self;

  /// Whether this cell holds no letter.
  fn is_blank(&self) -> bool;
}

impl Cell for String {
  fn blank() -> Self {
    String::new()
  }

  fn is_blank(&self) -> bool {
    self.trim().is_empty()
  }
}

impl Cell for &str {
  fn blank() -> Self {
    ""
  }

  fn is_blank(&self) -> bool {
    self.trim().is_empty()
  }
}

impl Cell for char {
  fn blank() -> Self {
    ' '
  }

  fn is_blank(&self) -> bool {
    self.is_whitespace()
  }
}

/// `None` is how JSON `null` cells arrive.
impl<T: Cell> Cell for Option<T> {
  fn blank() -> Self {
    None
  }

  fn is_blank(&self) -> bool {
    self.as_ref().is_none_or(Cell::is_blank)
  }
}

impl Cell for Square {
  fn blank() -> Self {
    Square::Black
  }

  fn is_blank(&self) -> bool {
    self.is_black()
  }
}

/// A coordinate shift between two grids: `to = from + offset`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
  pub row: isize,
  pub col: isize,
}

impl Offset {
  pub const ZERO: Self = Self { row: 0, col: 0 };

  /// Moves a raw-grid position into the normalized grid. Returns `None` if the
  /// result would be negative, which means `pos` was not part of the raw grid's
  /// content.
  pub fn apply(self, (row, col): Pos) -> Option<Pos> {
    Some((
      row.checked_add_signed(self.row)?,
      col.checked_add_signed(self.col)?,
    ))
  }

  /// Moves a normalized-grid position back into raw-grid space.
  pub fn invert(self, (row, col): Pos) -> Option<Pos> {
    Some((
      row.checked_add_signed(self.row.checked_neg()?)?,
      col.checked_add_signed(self.col.checked_neg()?)?,
    ))
  }
}

/// A square grid produced by [normalize].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<C> {
  /// `size` rows of `size` cells each.
  pub cells: Vec<Vec<C>>,
  pub size: usize,
  /// Shift from raw-grid coordinates to `cells` coordinates.
  pub offset: Offset,
}

impl<C> Normalized<C> {
  fn degenerate() -> Self {
    Self {
      cells: Vec::new(),
      size: 0,
      offset: Offset::ZERO,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  pub fn get(&self, (row, col): Pos) -> Option<&C> {
    self.cells.get(row).and_then(|r| r.get(col))
  }

  /// Converts every cell, keeping the shape and offset. Stops at the first error.
  pub fn try_map<D, F>(self, mut f: F) -> Result<Normalized<D>>
  where
    F: FnMut(Pos, C) -> Result<D>,
  {
    let cells = self
      .cells
      .into_iter()
      .enumerate()
      .map(|(row, cells)| {
        cells
          .into_iter()
          .enumerate()
          .map(|(col, cell)| f((row, col), cell))
          .collect::<Result<Vec<D>>>()
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Normalized {
      cells,
      size: self.size,
      offset: self.offset,
    })
  }
}

/// Inclusive bounding box of the non-blank cells.
#[derive(Debug, PartialEq, Eq)]
struct Bounds {
  top: usize,
  bottom: usize,
  left: usize,
  right: usize,
}

fn content_bounds<C: Cell>(raw: &[Vec<C>], width: usize) -> Option<Bounds> {
  let row_occupied = |r: &usize| raw[*r].iter().any(|cell| !cell.is_blank());
  let col_occupied = |c: &usize| raw.iter().any(|row| !row[*c].is_blank());

  let top = (0..raw.len()).find(row_occupied)?;
  let bottom = (top..raw.len()).rev().find(row_occupied)?;
  let left = (0..width).find(col_occupied)?;
  let right = (left..width).rev().find(col_occupied)?;

  Some(Bounds {
    top,
    bottom,
    left,
    right,
  })
}

/// Splits `extra` padding between two opposite sides. The odd square goes to the
/// bottom or right.
fn split(extra: usize) -> usize {
  extra / 2
}

/// Trims the empty border of `raw`, adds a [MARGIN] on every side and pads the
/// result to a square, keeping the content as close to centered as possible.
///
/// An input with no rows, or whose first row has no cells, gives an empty grid of
/// size 0. An input where every cell is blank gives a single blank cell. A ragged
/// input is rejected, since it would make the offset meaningless.
pub fn normalize<C: Cell>(raw: &[Vec<C>]) -> Result<Normalized<C>> {
  let width = match raw.first() {
    Some(first) if !first.is_empty() => first.len(),
    _ => return Ok(Normalized::degenerate()),
  };

  if let Some((row, cells)) = raw.iter().enumerate().find(|(_, r)| r.len() != width) {
    return Err(Error::RaggedGrid {
      row,
      expected: width,
      found: cells.len(),
    });
  }

  let Some(bounds) = content_bounds(raw, width) else {
    debug!(rows = raw.len(), cols = width, "raw grid has no letters");
    return Ok(Normalized {
      cells: vec![vec![C::blank()]],
      size: 1,
      offset: Offset::ZERO,
    });
  };

  let content_rows = bounds.bottom - bounds.top + 1;
  let content_cols = bounds.right - bounds.left + 1;
  let padded_rows = content_rows + 2 * MARGIN;
  let padded_cols = content_cols + 2 * MARGIN;
  let size = max(padded_rows, padded_cols);

  let pad_top = MARGIN + split(size - padded_rows);
  let pad_left = MARGIN + split(size - padded_cols);

  let mut cells = vec![vec![C::blank(); size]; size];
  for (r, row) in raw[bounds.top..=bounds.bottom].iter().enumerate() {
    for (c, cell) in row[bounds.left..=bounds.right].iter().enumerate() {
      cells[r + pad_top][c + pad_left] = cell.clone();
    }
  }

  let offset = Offset {
    row: pad_top as isize - bounds.top as isize,
    col: pad_left as isize - bounds.left as isize,
  };

  debug!(
    raw_rows = raw.len(),
    raw_cols = width,
    size,
    offset_row = offset.row,
    offset_col = offset.col,
    "normalized grid"
  );

  Ok(Normalized {
    cells,
    size,
    offset,
  })
}
