//! Mapping a puzzle onto the screen.
//!
//! Cells are drawn at a fixed size, so the screen can hold some number of cells in
//! each direction. When it can hold more than the puzzle needs, the rendered grid is
//! enlarged to fill the screen and the puzzle is centered in it. When it can hold
//! fewer, the rendered grid is exactly the puzzle and the screen scrolls over it.
//!
//! Positions in the puzzle are "puzzle coordinates"; positions in the rendered grid
//! are "display coordinates". Everything that paints cells, moves focus, or handles
//! clicks has to go through the same [DisplayLayout] so the two never drift apart.

use crate::Pos;
use std::cmp::max;
use tracing::debug;

/// The result of [fit_or_scroll].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLayout {
  /// Rows in the rendered grid.
  pub rows: usize,
  /// Columns in the rendered grid.
  pub cols: usize,
  pub row_offset: usize,
  pub col_offset: usize,
  pub puzzle_rows: usize,
  pub puzzle_cols: usize,
}

/// Sizes the rendered grid for a puzzle of `puzzle_rows` by `puzzle_cols` on a
/// screen that fits `max_visible_rows` by `max_visible_cols` cells.
pub fn fit_or_scroll(
  puzzle_rows: usize,
  puzzle_cols: usize,
  max_visible_rows: usize,
  max_visible_cols: usize,
) -> DisplayLayout {
  let rows = max(puzzle_rows, max_visible_rows);
  let cols = max(puzzle_cols, max_visible_cols);

  let layout = DisplayLayout {
    rows,
    cols,
    row_offset: (rows - puzzle_rows) / 2,
    col_offset: (cols - puzzle_cols) / 2,
    puzzle_rows,
    puzzle_cols,
  };
  debug!(?layout, max_visible_rows, max_visible_cols, "fit or scroll");
  layout
}

/// Puzzle coordinates to display coordinates.
pub fn to_display_coords(
  puzzle_row: usize,
  puzzle_col: usize,
  row_offset: usize,
  col_offset: usize,
) -> Pos {
  (puzzle_row + row_offset, puzzle_col + col_offset)
}

/// Display coordinates to puzzle coordinates.
///
/// # Panics
///
/// If the display position lies above or left of the puzzle. Use
/// [DisplayLayout::puzzle_pos] to hit-test arbitrary display positions.
pub fn to_puzzle_coords(
  display_row: usize,
  display_col: usize,
  row_offset: usize,
  col_offset: usize,
) -> Pos {
  assert!(
    display_row >= row_offset && display_col >= col_offset,
    "display position ({display_row}, {display_col}) is outside the puzzle at offset ({row_offset}, {col_offset})"
  );
  (display_row - row_offset, display_col - col_offset)
}

impl DisplayLayout {
  /// Whether the rendered grid is larger than the puzzle.
  pub fn is_enlarged(&self) -> bool {
    self.rows > self.puzzle_rows || self.cols > self.puzzle_cols
  }

  /// # Panics
  ///
  /// If `pos` is not in the puzzle.
  pub fn to_display(&self, (row, col): Pos) -> Pos {
    assert!(
      row < self.puzzle_rows && col < self.puzzle_cols,
      "puzzle position ({row}, {col}) is outside a {}x{} puzzle",
      self.puzzle_rows,
      self.puzzle_cols
    );
    to_display_coords(row, col, self.row_offset, self.col_offset)
  }

  /// The puzzle position drawn at `pos`, or `None` for filler cells around the puzzle
  /// and positions off the rendered grid.
  pub fn puzzle_pos(&self, (row, col): Pos) -> Option<Pos> {
    let row = row.checked_sub(self.row_offset)?;
    let col = col.checked_sub(self.col_offset)?;
    (row < self.puzzle_rows && col < self.puzzle_cols).then_some((row, col))
  }

  /// Adjusts the top-left display position of a `visible` window (rows, cols) the
  /// least amount needed to show `target`, and keeps the window on the grid.
  pub fn scroll_into_view(&self, origin: Pos, visible: (usize, usize), target: Pos) -> Pos {
    let axis = |origin: usize, visible: usize, target: usize, len: usize| {
      let max_origin = len.saturating_sub(visible);
      let origin = if visible == 0 || target < origin {
        target
      } else if target >= origin + visible {
        target + 1 - visible
      } else {
        origin
      };
      origin.min(max_origin)
    };

    (
      axis(origin.0, visible.0, target.0, self.rows),
      axis(origin.1, visible.1, target.1, self.cols),
    )
  }
}

/// Rough screen categories. Each has its own fixed cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
  Desktop,
  Tablet,
  Mobile,
}

impl DeviceClass {
  pub const DESKTOP_MIN_WIDTH: u32 = 1025;
  pub const MOBILE_MAX_WIDTH: u32 = 768;

  pub fn for_width(width: u32) -> Self {
    if width >= Self::DESKTOP_MIN_WIDTH {
      Self::Desktop
    } else if width <= Self::MOBILE_MAX_WIDTH {
      Self::Mobile
    } else {
      Self::Tablet
    }
  }
}

/// Edge length of a cell for each [DeviceClass], in the same unit as the
/// [Viewport].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSizes {
  pub desktop: u32,
  pub tablet: u32,
  pub mobile: u32,
}

impl Default for CellSizes {
  fn default() -> Self {
    Self {
      desktop: 36,
      tablet: 44,
      mobile: 48,
    }
  }
}

impl CellSizes {
  pub fn for_class(&self, class: DeviceClass) -> u32 {
    match class {
      DeviceClass::Desktop => self.desktop,
      DeviceClass::Tablet => self.tablet,
      DeviceClass::Mobile => self.mobile,
    }
  }
}

/// How many cells of `extent` fit in `available`.
pub fn max_visible(available: u32, extent: u32) -> usize {
  available.checked_div(extent).unwrap_or(0) as usize
}

/// The space available to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
  pub width: u32,
  pub height: u32,
}

impl Viewport {
  pub fn device_class(&self) -> DeviceClass {
    DeviceClass::for_width(self.width)
  }

  /// (max visible rows, max visible columns)
  pub fn capacity(&self, sizes: &CellSizes) -> (usize, usize) {
    let extent = sizes.for_class(self.device_class());
    (max_visible(self.height, extent), max_visible(self.width, extent))
  }

  pub fn layout(&self, puzzle_rows: usize, puzzle_cols: usize, sizes: &CellSizes) -> DisplayLayout {
    let (max_rows, max_cols) = self.capacity(sizes);
    fit_or_scroll(puzzle_rows, puzzle_cols, max_rows, max_cols)
  }
}
