use crate::Direction::{Across, Down};
use crate::grid::{Offset, normalize};
use crate::payload::Payload;
use crate::{Direction, Error, Grid, Pos, Result, Square};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

/// One answer of the puzzle, in normalized-grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
  /// 1-based, in the order the generator listed the words.
  pub number: u32,
  pub answer: String,
  pub start: Pos,
  pub direction: Direction,
  pub length: usize,
}

impl Word {
  /// The positions of this word's squares, from first to last.
  pub fn cells(&self) -> impl Iterator<Item = Pos> + use<> {
    let (start, direction) = (self.start, self.direction);
    (0..self.length).map(move |i| direction.advance(start, i))
  }

  /// The index of `pos` within this word, if the word covers it.
  pub fn index_of(&self, (row, col): Pos) -> Option<usize> {
    let (start_row, start_col) = self.start;
    let index = match self.direction {
      Across if row == start_row => col.checked_sub(start_col)?,
      Down if col == start_col => row.checked_sub(start_row)?,
      _ => return None,
    };
    (index < self.length).then_some(index)
  }

  pub fn contains(&self, pos: Pos) -> bool {
    self.index_of(pos).is_some()
  }
}

/// The verdict on a square after [Puzzle::check].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
  Correct,
  Incorrect,
}

/// What [Puzzle::check] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
  /// Some words still have empty squares. Nothing was marked.
  Incomplete(Vec<u32>),
  /// Every square was filled; these are the numbers of the right and wrong words.
  Checked { correct: Vec<u32>, incorrect: Vec<u32> },
}

impl CheckOutcome {
  pub fn is_solved(&self) -> bool {
    matches!(self, Self::Checked { incorrect, .. } if incorrect.is_empty())
  }
}

/// Indicates how a particular square should be styled. For instance, [Standard](Self::Standard)
/// might map to white, [Cursor](Self::Cursor) to yellow, and [Word](Self::Word) to gray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareStyle {
  /// Default styling
  Standard,
  /// The cursor is positioned on this square.
  Cursor,
  /// The cursor is not on this square, but the word indicated by the cursor includes this square.
  Word,
}

/// Represents the position of the user's currently-highlighted square, the word it
/// belongs to, and the `Direction` of that word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
  pos: Pos,
  word: Option<u32>,
  direction: Direction,
}

/// A crossword being solved: the normalized solution, what the player has entered so
/// far, and the numbered words. When implementing a crossword app, this will be the
/// main structure you will use.
#[derive(Debug, Clone)]
pub struct Puzzle {
  solution: Grid,
  entries: Grid,
  words: Vec<Word>,
  definitions: HashMap<String, String>,
  offset: Offset,
  cursor: Cursor,
  hinted: HashSet<Pos>,
  marks: HashMap<Pos, Mark>,
}

fn square_from_cell(pos: Pos, cell: Option<String>) -> Result<Square> {
  let Some(value) = cell else {
    return Ok(Square::Black);
  };
  let mut chars = value.trim().chars();
  match (chars.next(), chars.next()) {
    (None, _) => Ok(Square::Black),
    (Some(c), None) if c.is_alphabetic() => Ok(Square::Letter(uppercase(c))),
    _ => Err(Error::InvalidCell {
      row: pos.0,
      col: pos.1,
      value,
    }),
  }
}

/// Uppercases a letter, keeping it as is when its uppercase form is several characters.
fn uppercase(c: char) -> char {
  let mut upper = c.to_uppercase();
  match (upper.next(), upper.next()) {
    (Some(u), None) => u,
    _ => c,
  }
}

impl Puzzle {
  /// Builds a puzzle from a generator payload. The grid is normalized and every word
  /// start is moved by the same offset.
  ///
  /// Fails if the payload reports failure or carries no words, if a word doesn't
  /// match the letters in the grid, or if a letter belongs to no word.
  pub fn from_payload(payload: Payload) -> Result<Self> {
    let payload = payload.into_result()?;
    if payload.words.is_empty() {
      return Err(Error::Generation("payload contains no words".to_string()));
    }

    let normalized = normalize(&payload.grid)?.try_map(square_from_cell)?;
    let offset = normalized.offset;
    let solution = Grid::new(normalized.cells);

    let mut words = Vec::with_capacity(payload.words.len());
    for (number, placement) in (1..).zip(&payload.words) {
      let answer: String = placement.word.trim().chars().map(uppercase).collect();
      let length = placement.length();
      let placement_error = |reason: String| Error::Placement {
        number,
        word: answer.clone(),
        reason,
      };

      if length != answer.chars().count() {
        return Err(placement_error(format!(
          "is {} letters long but declares length {length}",
          answer.chars().count()
        )));
      }

      let start = offset
        .apply((placement.row, placement.col))
        .ok_or_else(|| {
          placement_error(format!(
            "starts at ({}, {}), outside the grid's letters",
            placement.row, placement.col
          ))
        })?;

      let word = Word {
        number,
        answer: answer.clone(),
        start,
        direction: placement.direction(),
        length,
      };

      for (pos, expected) in word.cells().zip(answer.chars()) {
        if solution.try_get(pos) != Some(Square::Letter(expected)) {
          return Err(placement_error(format!(
            "expects {expected} at ({}, {}) of the normalized grid",
            pos.0, pos.1
          )));
        }
      }

      words.push(word);
    }

    let covered: HashSet<Pos> = words.iter().flat_map(Word::cells).collect();
    let stray = solution.positions().find_map(|pos| match solution.get(pos) {
      Square::Letter(letter) if !covered.contains(&pos) => Some((pos, letter)),
      _ => None,
    });
    if let Some((pos, letter)) = stray {
      let (row, col) = offset.invert(pos).unwrap_or(pos);
      return Err(Error::StrayLetter { row, col, letter });
    }

    let definitions = payload
      .definitions
      .into_iter()
      .map(|(word, text)| (word.trim().to_uppercase(), text.trim().to_string()))
      .collect();

    let first = &words[0];
    let cursor = Cursor {
      pos: first.start,
      word: Some(first.number),
      direction: first.direction,
    };

    info!(
      size = solution.height(),
      words = words.len(),
      offset_row = offset.row,
      offset_col = offset.col,
      "crossword loaded"
    );

    Ok(Self {
      entries: solution.erased(),
      solution,
      words,
      definitions,
      offset,
      cursor,
      hinted: HashSet::new(),
      marks: HashMap::new(),
    })
  }

  /// Returns a reference to the player's grid.
  pub fn grid(&self) -> &Grid {
    &self.entries
  }

  pub fn solution(&self) -> &Grid {
    &self.solution
  }

  /// Rows (and columns) of the square grid.
  pub fn size(&self) -> usize {
    self.solution.height()
  }

  /// The shift that was applied to the generator's coordinates.
  pub fn offset(&self) -> Offset {
    self.offset
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }

  pub fn word(&self, number: u32) -> Option<&Word> {
    let index = usize::try_from(number).ok()?.checked_sub(1)?;
    self.words.get(index)
  }

  /// Clue text for a word, or `""` if the generator sent none.
  pub fn clue(&self, number: u32) -> &str {
    self
      .word(number)
      .and_then(|w| self.definitions.get(&w.answer))
      .map_or("", String::as_str)
  }

  /// Words grouped by direction, as (number, clue) pairs in number order.
  pub fn clues(&self) -> BTreeMap<Direction, Vec<(u32, &str)>> {
    let mut clues: BTreeMap<Direction, Vec<(u32, &str)>> = BTreeMap::new();
    for word in &self.words {
      clues
        .entry(word.direction)
        .or_default()
        .push((word.number, self.clue(word.number)));
    }
    clues
  }

  pub fn cursor_pos(&self) -> Pos {
    self.cursor.pos
  }

  pub fn direction(&self) -> Direction {
    self.cursor.direction
  }

  pub fn current_word(&self) -> Option<&Word> {
    self.cursor.word.and_then(|n| self.word(n))
  }

  /// Returns the text of the clue corresponding to the cursor.
  pub fn current_clue(&self) -> &str {
    self.cursor.word.map_or("", |n| self.clue(n))
  }

  /// The number printed in the square at `pos`: that of the first word starting there.
  pub fn cell_number(&self, pos: Pos) -> Option<u32> {
    self.words.iter().find(|w| w.start == pos).map(|w| w.number)
  }

  /// The word covering `pos` in `direction`, if there is one.
  pub fn word_in(&self, pos: Pos, direction: Direction) -> Option<&Word> {
    self
      .words
      .iter()
      .find(|w| w.direction == direction && w.contains(pos))
  }

  /// The word covering `pos`, preferring one in the cursor's direction.
  pub fn word_at(&self, pos: Pos) -> Option<&Word> {
    self
      .word_in(pos, self.cursor.direction)
      .or_else(|| self.word_in(pos, !self.cursor.direction))
  }

  fn move_cursor(&mut self, pos: Pos) {
    let word = self.word_at(pos).map(|w| (w.number, w.direction));
    self.cursor.pos = pos;
    if let Some((number, direction)) = word {
      self.cursor.word = Some(number);
      self.cursor.direction = direction;
    } else {
      self.cursor.word = None;
    }
  }

  /// Puts the cursor on a white square. Black squares and positions off the grid are
  /// ignored.
  pub fn select_cell(&mut self, pos: Pos) -> bool {
    match self.solution.try_get(pos) {
      Some(sq) if sq.is_white() => {
        self.move_cursor(pos);
        true
      }
      _ => false,
    }
  }

  /// Puts the cursor on the first square of the given word.
  pub fn select_word(&mut self, number: u32) -> bool {
    let Some(word) = self.word(number) else {
      return false;
    };
    self.cursor = Cursor {
      pos: word.start,
      word: Some(word.number),
      direction: word.direction,
    };
    true
  }

  /// Moves to the start of the next word, wrapping around after the last one.
  pub fn select_next_word(&mut self) {
    let next = match self.cursor.word {
      Some(n) if (n as usize) < self.words.len() => n + 1,
      _ => 1,
    };
    self.select_word(next);
  }

  /// Switches to the word crossing the current square, if there is one.
  pub fn swap_cursor_direction(&mut self) {
    let crossing = self
      .word_in(self.cursor.pos, !self.cursor.direction)
      .map(|w| (w.number, w.direction));
    if let Some((number, direction)) = crossing {
      self.cursor.word = Some(number);
      self.cursor.direction = direction;
    }
  }

  /// Moves the cursor one square along the current word, if not already at its end.
  fn step_in_word(&mut self, forward: bool) {
    let Some(word) = self.current_word() else {
      return;
    };
    let Some(index) = word.index_of(self.cursor.pos) else {
      return;
    };
    let next = if forward {
      index + 1
    } else if index > 0 {
      index - 1
    } else {
      return;
    };
    if next < word.length {
      let pos = word.direction.advance(word.start, next);
      self.cursor.pos = pos;
    }
  }

  /// Writes the given letter to the current square and moves to the next square of
  /// the current word.
  pub fn add_letter(&mut self, letter: char) {
    assert!(letter.is_alphabetic());

    let pos = self.cursor.pos;
    self.entries.set(pos, Square::Letter(uppercase(letter)));
    self.marks.remove(&pos);
    self.step_in_word(true);
  }

  /// Sets the current square to [Empty](Square::Empty).
  pub fn erase_letter(&mut self) {
    let pos = self.cursor.pos;
    self.entries.set(pos, Square::Empty);
    self.marks.remove(&pos);
  }

  /// Erases the current square, or if it is already empty, steps back one square in
  /// the current word.
  pub fn backspace(&mut self) {
    if self.entries.get(self.cursor.pos).is_empty() {
      self.step_in_word(false);
    } else {
      self.erase_letter();
    }
  }

  pub fn cursor_up(&mut self) {
    if let Some(pos) = self.entries.next_up_neighbor(self.cursor.pos) {
      self.move_cursor(pos);
    }
  }
  pub fn cursor_down(&mut self) {
    if let Some(pos) = self.entries.next_down_neighbor(self.cursor.pos) {
      self.move_cursor(pos);
    }
  }
  pub fn cursor_left(&mut self) {
    if let Some(pos) = self.entries.next_left_neighbor(self.cursor.pos) {
      self.move_cursor(pos);
    }
  }
  pub fn cursor_right(&mut self) {
    if let Some(pos) = self.entries.next_right_neighbor(self.cursor.pos) {
      self.move_cursor(pos);
    }
  }

  fn reveal(&mut self, pos: Pos) {
    self.entries.set(pos, self.solution.get(pos));
    self.marks.remove(&pos);
    self.hinted.insert(pos);
  }

  /// Reveals the first letter of the current word if that square is still empty.
  /// Returns whether anything was revealed.
  pub fn reveal_letter(&mut self) -> bool {
    let Some(start) = self.current_word().map(|w| w.start) else {
      return false;
    };
    if !self.entries.get(start).is_empty() {
      return false;
    }
    self.reveal(start);
    true
  }

  /// Fills in the whole current word. Returns whether there was a word to reveal.
  pub fn reveal_word(&mut self) -> bool {
    let Some(cells) = self.current_word().map(|w| w.cells().collect::<Vec<_>>()) else {
      return false;
    };
    for pos in cells {
      self.reveal(pos);
    }
    true
  }

  /// Whether the square at `pos` was filled in by a hint.
  pub fn is_hinted(&self, pos: Pos) -> bool {
    self.hinted.contains(&pos)
  }

  /// The result of the last [Puzzle::check] for this square, unless it was edited since.
  pub fn mark(&self, pos: Pos) -> Option<Mark> {
    self.marks.get(&pos).copied()
  }

  fn entered_word(&self, word: &Word) -> Option<String> {
    word
      .cells()
      .map(|pos| match self.entries.get(pos) {
        Square::Letter(c) => Some(c),
        _ => None,
      })
      .collect()
  }

  /// Compares the player's entries against the answers. Words are only judged once
  /// every square has been filled in; after that each square of a word is marked
  /// right or wrong, later words overriding earlier ones where they cross.
  pub fn check(&mut self) -> CheckOutcome {
    let incomplete: Vec<u32> = self
      .words
      .iter()
      .filter(|w| self.entered_word(w).is_none())
      .map(|w| w.number)
      .collect();
    if !incomplete.is_empty() {
      return CheckOutcome::Incomplete(incomplete);
    }

    let mut correct = vec![];
    let mut incorrect = vec![];
    for word in &self.words {
      let mark = if self.entered_word(word).as_deref() == Some(word.answer.as_str()) {
        correct.push(word.number);
        Mark::Correct
      } else {
        incorrect.push(word.number);
        Mark::Incorrect
      };
      for pos in word.cells() {
        self.marks.insert(pos, mark);
      }
    }

    if incorrect.is_empty() {
      info!(words = correct.len(), "crossword solved");
    } else {
      warn!(
        correct = correct.len(),
        incorrect = incorrect.len(),
        "crossword checked with wrong answers"
      );
    }
    CheckOutcome::Checked { correct, incorrect }
  }

  /// Whether the puzzle is fully filled in, and matches the solution.
  pub fn is_solved(&self) -> bool {
    self.entries == self.solution
  }

  /// Determines how a particular square should be styled.
  /// See [SquareStyle].
  pub fn square_style(&self, pos: Pos) -> SquareStyle {
    if pos == self.cursor.pos {
      SquareStyle::Cursor
    } else if self.current_word().is_some_and(|w| w.contains(pos)) {
      SquareStyle::Word
    } else {
      SquareStyle::Standard
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::payload::Placement;

  fn placement(word: &str, direction: &str, row: usize, col: usize) -> Placement {
    Placement {
      word: word.to_string(),
      direction: direction.to_string(),
      row,
      col,
      length: Some(word.len()),
    }
  }

  /// A raw grid with a wide empty border, as the generator sends it:
  ///
  /// ```text
  /// ......
  /// ..CAT.
  /// ..O...
  /// ..W...
  /// ```
  fn payload() -> Payload {
    let rows = ["......", "..CAT.", "..O...", "..W..."];
    let grid = rows
      .iter()
      .map(|row| {
        row
          .chars()
          .map(|c| if c == '.' { Some(String::new()) } else { Some(c.to_string()) })
          .collect()
      })
      .collect();

    Payload {
      success: true,
      grid,
      words: vec![placement("cat", "h", 1, 2), placement("cow", "v", 1, 2)],
      definitions: [
        ("cat".to_string(), "Feline".to_string()),
        ("COW".to_string(), " Bovine ".to_string()),
      ]
      .into_iter()
      .collect(),
      total_words: Some(2),
      placed_words: Some(2),
      grid_size: Some(6),
      error: None,
    }
  }

  fn puzzle() -> Puzzle {
    Puzzle::from_payload(payload()).unwrap()
  }

  #[test]
  fn loads_and_shifts_words() {
    let puzzle = puzzle();

    #[rustfmt::skip]
    assert_eq!(
      puzzle.solution().to_string(),
      concat!(
        "\n",
        "■■■■■\n",
        "■CAT■\n",
        "■O■■■\n",
        "■W■■■\n",
        "■■■■■\n",
      )
    );
    assert_eq!(puzzle.size(), 5);
    assert_eq!(puzzle.offset(), Offset { row: 0, col: -1 });

    let cat = puzzle.word(1).unwrap();
    assert_eq!((cat.start, cat.direction, cat.answer.as_str()), ((1, 1), Across, "CAT"));
    let cow = puzzle.word(2).unwrap();
    assert_eq!((cow.start, cow.direction), ((1, 1), Down));

    assert_eq!(puzzle.clue(1), "Feline");
    assert_eq!(puzzle.clue(2), "Bovine");
    assert_eq!(puzzle.clue(3), "");
    assert_eq!(puzzle.cell_number((1, 1)), Some(1));
    assert_eq!(puzzle.cell_number((1, 2)), None);
    assert!(puzzle.grid().get((1, 1)).is_empty());
  }

  #[test]
  fn rejects_words_that_do_not_match_the_grid() {
    let mut bad = payload();
    bad.words[1] = placement("cod", "down", 1, 2);
    assert!(matches!(
      Puzzle::from_payload(bad),
      Err(Error::Placement { number: 2, .. })
    ));

    let mut shifted = payload();
    shifted.words[0].col = 3;
    assert!(matches!(
      Puzzle::from_payload(shifted),
      Err(Error::Placement { number: 1, .. })
    ));

    let mut off_grid = payload();
    off_grid.words[0].col = 0;
    assert!(matches!(
      Puzzle::from_payload(off_grid),
      Err(Error::Placement { number: 1, .. })
    ));

    let mut no_words = payload();
    no_words.words.clear();
    assert!(matches!(Puzzle::from_payload(no_words), Err(Error::Generation(_))));
  }

  #[test]
  fn rejects_letters_outside_every_word() {
    let mut stray = payload();
    stray.grid[3][4] = Some("x".to_string());
    assert!(matches!(
      Puzzle::from_payload(stray),
      Err(Error::StrayLetter { row: 3, col: 4, letter: 'X' })
    ));
  }

  #[test]
  fn rejects_multi_letter_cells() {
    let mut bad = payload();
    bad.grid[3][2] = Some("WX".to_string());
    assert!(matches!(
      Puzzle::from_payload(bad),
      Err(Error::InvalidCell { row: 3, col: 1, .. })
    ));
  }

  #[test]
  fn word_lookup_prefers_the_cursor_direction() {
    let mut puzzle = puzzle();

    assert_eq!(puzzle.word_at((1, 1)).unwrap().number, 1);
    assert_eq!(puzzle.word_at((2, 1)).unwrap().number, 2);
    assert!(puzzle.word_at((2, 2)).is_none());

    puzzle.swap_cursor_direction();
    assert_eq!(puzzle.direction(), Down);
    assert_eq!(puzzle.word_at((1, 1)).unwrap().number, 2);
    assert_eq!(puzzle.current_clue(), "Bovine");
  }

  #[test]
  fn typing_advances_within_the_word() {
    let mut puzzle = puzzle();

    for c in ['c', 'a', 't', 's'] {
      puzzle.add_letter(c);
    }
    // The last letter overwrote the final square instead of leaving the word.
    assert_eq!(puzzle.cursor_pos(), (1, 3));
    assert_eq!(puzzle.grid().get((1, 3)), Square::Letter('S'));

    puzzle.backspace();
    assert!(puzzle.grid().get((1, 3)).is_empty());
    puzzle.backspace();
    assert_eq!(puzzle.cursor_pos(), (1, 2));
    assert_eq!(puzzle.grid().get((1, 2)), Square::Letter('A'));
  }

  #[test]
  fn arrows_move_to_white_squares() {
    let mut puzzle = puzzle();

    puzzle.cursor_down();
    assert_eq!(puzzle.cursor_pos(), (2, 1));
    assert_eq!(puzzle.direction(), Down);
    assert_eq!(puzzle.square_style((3, 1)), SquareStyle::Word);
    assert_eq!(puzzle.square_style((1, 2)), SquareStyle::Standard);

    puzzle.cursor_right();
    assert_eq!(puzzle.cursor_pos(), (2, 1));

    puzzle.cursor_up();
    puzzle.cursor_right();
    assert_eq!(puzzle.cursor_pos(), (1, 2));
    assert_eq!(puzzle.direction(), Across);
    assert_eq!(puzzle.square_style((1, 2)), SquareStyle::Cursor);
  }

  #[test]
  fn selecting_cells_and_words() {
    let mut puzzle = puzzle();

    assert!(!puzzle.select_cell((0, 0)));
    assert!(!puzzle.select_cell((9, 9)));
    assert!(puzzle.select_cell((3, 1)));
    assert_eq!(puzzle.current_word().unwrap().number, 2);

    assert!(puzzle.select_word(1));
    assert_eq!(puzzle.cursor_pos(), (1, 1));
    assert!(!puzzle.select_word(0));
    assert!(!puzzle.select_word(3));

    puzzle.select_next_word();
    assert_eq!(puzzle.current_word().unwrap().number, 2);
    puzzle.select_next_word();
    assert_eq!(puzzle.current_word().unwrap().number, 1);
  }

  #[test]
  fn hints_fill_from_the_solution() {
    let mut puzzle = puzzle();

    assert!(puzzle.reveal_letter());
    assert_eq!(puzzle.grid().get((1, 1)), Square::Letter('C'));
    assert!(puzzle.is_hinted((1, 1)));
    assert!(!puzzle.reveal_letter());

    puzzle.select_word(2);
    assert!(puzzle.reveal_word());
    assert_eq!(puzzle.grid().get((3, 1)), Square::Letter('W'));
    assert!(!puzzle.is_solved());
  }

  #[test]
  fn checking_marks_words() {
    let mut puzzle = puzzle();

    puzzle.add_letter('c');
    assert_eq!(puzzle.check(), CheckOutcome::Incomplete(vec![1, 2]));
    assert_eq!(puzzle.mark((1, 1)), None);

    for c in ['a', 'r'] {
      puzzle.add_letter(c);
    }
    puzzle.select_word(2);
    for c in ['c', 'o', 'w'] {
      puzzle.add_letter(c);
    }

    let outcome = puzzle.check();
    assert_eq!(
      outcome,
      CheckOutcome::Checked {
        correct: vec![2],
        incorrect: vec![1]
      }
    );
    assert!(!outcome.is_solved());
    assert_eq!(puzzle.mark((1, 3)), Some(Mark::Incorrect));
    assert_eq!(puzzle.mark((2, 1)), Some(Mark::Correct));
    // The shared square belongs to the later, correct word.
    assert_eq!(puzzle.mark((1, 1)), Some(Mark::Correct));

    puzzle.select_cell((1, 3));
    puzzle.add_letter('t');
    assert_eq!(puzzle.mark((1, 3)), None);
    assert!(puzzle.check().is_solved());
    assert!(puzzle.is_solved());
  }

  #[test]
  fn clues_by_direction() {
    let puzzle = puzzle();
    let clues = puzzle.clues();

    assert_eq!(clues[&Across], vec![(1, "Feline")]);
    assert_eq!(clues[&Down], vec![(2, "Bovine")]);
  }
}
