//! Property-based invariant tests for grid normalization and viewport fitting.
//!
//! 1. The normalized grid is square.
//! 2. Letters keep at least one blank square between them and every edge.
//! 3. Normalizing a normalized grid changes nothing.
//! 4. The offset maps every raw letter onto the same letter.
//! 5. Grids without letters collapse to a single blank cell.
//! 6. fit_or_scroll never enlarges past the viewport and centers with a floor bias.
//! 7. Puzzle and display coordinates convert back and forth exactly.
//! 8. Generated puzzles load, with every word landing on its letters.

use crossythink::generator;
use crossythink::{
  Cell, Offset, Puzzle, fit_or_scroll, normalize, to_display_coords, to_puzzle_coords,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

// ── Helpers ─────────────────────────────────────────────────────────────

fn cell() -> impl Strategy<Value = Option<char>> {
  prop_oneof![
    4 => Just(None),
    1 => Just(Some(' ')),
    2 => proptest::char::range('A', 'Z').prop_map(Some),
  ]
}

fn raw_grid(max_side: usize) -> impl Strategy<Value = Vec<Vec<Option<char>>>> {
  (1..=max_side, 1..=max_side).prop_flat_map(|(rows, cols)| {
    proptest::collection::vec(proptest::collection::vec(cell(), cols), rows)
  })
}

fn has_letters(grid: &[Vec<Option<char>>]) -> bool {
  grid.iter().flatten().any(|c| !c.is_blank())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Squareness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
  #[test]
  fn normalized_grid_is_square(raw in raw_grid(14)) {
    let normalized = normalize(&raw).unwrap();

    prop_assert_eq!(normalized.cells.len(), normalized.size);
    for row in &normalized.cells {
      prop_assert_eq!(row.len(), normalized.size);
    }
  }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Margin
// ═════════════════════════════════════════════════════════════════════════

proptest! {
  #[test]
  fn letters_stay_off_the_edges(raw in raw_grid(14)) {
    prop_assume!(has_letters(&raw));
    let normalized = normalize(&raw).unwrap();
    let last = normalized.size - 1;

    for (r, row) in normalized.cells.iter().enumerate() {
      for (c, cell) in row.iter().enumerate() {
        if !cell.is_blank() {
          prop_assert!(r >= 1 && r < last && c >= 1 && c < last,
            "letter at ({}, {}) in a grid of size {}", r, c, normalized.size);
        }
      }
    }
  }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
  #[test]
  fn normalizing_twice_is_a_fixed_point(raw in raw_grid(14)) {
    let once = normalize(&raw).unwrap();
    let twice = normalize(&once.cells).unwrap();

    prop_assert_eq!(&twice.cells, &once.cells);
    prop_assert_eq!(twice.size, once.size);
    prop_assert_eq!(twice.offset, Offset::ZERO);
  }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Offset correctness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
  #[test]
  fn offset_maps_letters_onto_themselves(raw in raw_grid(14)) {
    let normalized = normalize(&raw).unwrap();

    for (r, row) in raw.iter().enumerate() {
      for (c, cell) in row.iter().enumerate() {
        if cell.is_blank() {
          continue;
        }
        let pos = normalized.offset.apply((r, c));
        prop_assert!(pos.is_some(), "letter at ({}, {}) mapped off the grid", r, c);
        let pos = pos.unwrap();
        prop_assert_eq!(normalized.get(pos), Some(cell));
        prop_assert_eq!(normalized.offset.invert(pos), Some((r, c)));
      }
    }
  }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Grids without letters
// ═════════════════════════════════════════════════════════════════════════

proptest! {
  #[test]
  fn blank_grids_collapse(rows in 1usize..20, cols in 1usize..20, spaces in any::<bool>()) {
    let blank = if spaces { Some(' ') } else { None };
    let raw = vec![vec![blank; cols]; rows];
    let normalized = normalize(&raw).unwrap();

    prop_assert_eq!(normalized.size, 1);
    prop_assert_eq!(normalized.cells, vec![vec![None]]);
    prop_assert_eq!(normalized.offset, Offset::ZERO);
  }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. fit_or_scroll
// ═════════════════════════════════════════════════════════════════════════

proptest! {
  #[test]
  fn small_viewports_leave_the_puzzle_alone(
    puzzle_rows in 1usize..60,
    puzzle_cols in 1usize..60,
    shrink_rows in 0usize..60,
    shrink_cols in 0usize..60,
  ) {
    let layout = fit_or_scroll(
      puzzle_rows,
      puzzle_cols,
      puzzle_rows.saturating_sub(shrink_rows),
      puzzle_cols.saturating_sub(shrink_cols),
    );

    prop_assert_eq!((layout.rows, layout.cols), (puzzle_rows, puzzle_cols));
    prop_assert_eq!((layout.row_offset, layout.col_offset), (0, 0));
    prop_assert!(!layout.is_enlarged());
  }

  #[test]
  fn large_viewports_center_the_puzzle(
    puzzle_rows in 1usize..60,
    puzzle_cols in 1usize..60,
    visible_rows in 0usize..120,
    visible_cols in 0usize..120,
  ) {
    let layout = fit_or_scroll(puzzle_rows, puzzle_cols, visible_rows, visible_cols);

    prop_assert_eq!(layout.rows, puzzle_rows.max(visible_rows));
    prop_assert_eq!(layout.cols, puzzle_cols.max(visible_cols));
    prop_assert!(layout.row_offset + puzzle_rows <= layout.rows);
    prop_assert!(layout.col_offset + puzzle_cols <= layout.cols);

    let spare_rows = layout.rows - puzzle_rows;
    let spare_cols = layout.cols - puzzle_cols;
    prop_assert!(spare_rows == 2 * layout.row_offset || spare_rows == 2 * layout.row_offset + 1);
    prop_assert!(spare_cols == 2 * layout.col_offset || spare_cols == 2 * layout.col_offset + 1);
  }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Coordinate translation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
  #[test]
  fn coordinates_round_trip(
    puzzle_rows in 1usize..40,
    puzzle_cols in 1usize..40,
    visible_rows in 0usize..80,
    visible_cols in 0usize..80,
    pick_row in any::<prop::sample::Index>(),
    pick_col in any::<prop::sample::Index>(),
  ) {
    let layout = fit_or_scroll(puzzle_rows, puzzle_cols, visible_rows, visible_cols);
    let pos = (pick_row.index(puzzle_rows), pick_col.index(puzzle_cols));

    let (row_offset, col_offset) = (layout.row_offset, layout.col_offset);
    let display = layout.to_display(pos);
    prop_assert_eq!(display, to_display_coords(pos.0, pos.1, row_offset, col_offset));
    prop_assert_eq!(to_puzzle_coords(display.0, display.1, row_offset, col_offset), pos);
    prop_assert_eq!(layout.puzzle_pos(display), Some(pos));
  }

  #[test]
  fn only_puzzle_cells_hit_test(
    puzzle_rows in 1usize..30,
    puzzle_cols in 1usize..30,
    visible_rows in 0usize..60,
    visible_cols in 0usize..60,
  ) {
    let layout = fit_or_scroll(puzzle_rows, puzzle_cols, visible_rows, visible_cols);

    let hits = (0..layout.rows)
      .flat_map(|r| (0..layout.cols).map(move |c| (r, c)))
      .filter_map(|pos| layout.puzzle_pos(pos))
      .count();
    prop_assert_eq!(hits, puzzle_rows * puzzle_cols);
  }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Generated puzzles
// ═════════════════════════════════════════════════════════════════════════

const VOCABULARY: [&str; 8] = [
  "BANANA", "CANAL", "PANDA", "ALPACA", "SALSA", "LLAMA", "SAGA", "AREA",
];

proptest! {
  #![proptest_config(ProptestConfig::with_cases(32))]

  #[test]
  fn generated_puzzles_load(seed in any::<u64>(), count in 2usize..=VOCABULARY.len()) {
    let mut rng = StdRng::seed_from_u64(seed);
    let words = &VOCABULARY[..count];

    // Not every seed has to succeed; whatever does succeed must load.
    if let Ok(generated) = generator::generate(words, generator::DEFAULT_SIZE, &mut rng) {
      let payload = generated.into_payload(&BTreeMap::new());
      let puzzle = Puzzle::from_payload(payload).unwrap();

      prop_assert_eq!(puzzle.words().len(), count);
      prop_assert!(puzzle.size() <= generator::DEFAULT_SIZE + 2);
      for word in puzzle.words() {
        for pos in word.cells() {
          prop_assert!(puzzle.solution().get(pos).is_white());
        }
      }
    }
  }
}
