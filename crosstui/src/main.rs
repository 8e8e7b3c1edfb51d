use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Args, Parser, value_parser};
use crossterm::event::{
  self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
  KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossythink::generator::{self, DEFAULT_SIZE};
use crossythink::viewport::max_visible;
use crossythink::{
  CheckOutcome, Direction, DisplayLayout, Mark, Payload, Pos, Puzzle, Square, SquareStyle,
  fit_or_scroll,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::{
  DefaultTerminal, Frame,
  buffer::Buffer,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style, Stylize},
  text::Line,
  widgets::{Block, Padding, Paragraph, Widget, Wrap},
};
use ratatui_macros::{line, span};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const SQUARE_WIDTH: u16 = 7;
const SQUARE_HEIGHT: u16 = 3;
const MAX_SQUARE_SIDE: i64 = 64;

/// Solve generated crossword puzzles in your terminal
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
  #[command(flatten)]
  source: Source,
  /// Side of the working grid when generating from a word list
  #[arg(long, default_value_t = DEFAULT_SIZE)]
  size: usize,
  /// Seed for the generator, for reproducible layouts
  #[arg(long)]
  seed: Option<u64>,
  /// Width of a square, in terminal columns
  #[arg(
    long,
    default_value_t = SQUARE_WIDTH,
    value_parser = value_parser!(u16).range(1..=MAX_SQUARE_SIDE)
  )]
  cell_width: u16,
  /// Height of a square, in terminal rows
  #[arg(
    long,
    default_value_t = SQUARE_HEIGHT,
    value_parser = value_parser!(u16).range(1..=MAX_SQUARE_SIDE)
  )]
  cell_height: u16,
  /// Write logs to this file (filtered by RUST_LOG, default "info")
  #[arg(long)]
  log_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Source {
  /// A puzzle payload (JSON) as returned by the generation service
  #[arg(long)]
  puzzle: Option<PathBuf>,
  /// A word list to generate a puzzle from, `WORD` or `WORD - clue` per line
  #[arg(long)]
  words: Option<PathBuf>,
}

fn main() -> io::Result<()> {
  let cli = Cli::parse();
  if let Some(path) = &cli.log_file {
    init_logging(path)?;
  }

  let puzzle = load_puzzle(&cli);
  let app = App::new(puzzle, cli.cell_width, cli.cell_height);

  let terminal = ratatui::init();
  execute!(io::stdout(), EnableMouseCapture)?;
  let result = app.run(terminal);
  execute!(io::stdout(), DisableMouseCapture)?;
  ratatui::restore();
  result
}

fn init_logging(path: &Path) -> io::Result<()> {
  let file = File::create(path)?;
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

fn load_puzzle(cli: &Cli) -> Puzzle {
  let payload = match (&cli.source.puzzle, &cli.source.words) {
    (Some(path), _) => {
      let file = File::open(path).unwrap_or_else(|err| {
        eprintln!("{}: {}", path.display(), err);
        std::process::exit(1);
      });
      Payload::from_reader(file).unwrap_or_else(|e| {
        eprintln!("Failed to parse puzzle payload: {}", e);
        std::process::exit(2);
      })
    }
    (None, Some(path)) => generate_payload(path, cli.size, cli.seed),
    (None, None) => unreachable!("clap requires one puzzle source"),
  };

  Puzzle::from_payload(payload).unwrap_or_else(|e| {
    eprintln!("Failed to load puzzle: {}", e);
    std::process::exit(3);
  })
}

fn generate_payload(path: &Path, size: usize, seed: Option<u64>) -> Payload {
  let text = std::fs::read_to_string(path).unwrap_or_else(|err| {
    eprintln!("{}: {}", path.display(), err);
    std::process::exit(1);
  });
  let entries = generator::parse_word_list(&text);
  let words: Vec<&str> = entries.iter().map(|(word, _)| word.as_str()).collect();
  let definitions = entries.iter().cloned().collect();

  let mut rng = match seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };
  match generator::generate(&words, size, &mut rng) {
    Ok(generated) => generated.into_payload(&definitions),
    Err(e) => {
      eprintln!("{}", e);
      std::process::exit(2);
    }
  }
}

fn square_style(value: SquareStyle) -> Style {
  let base_style = match value {
    SquareStyle::Standard => Style::new().bg(Color::White),
    SquareStyle::Cursor => Style::new().bg(Color::LightRed),
    SquareStyle::Word => Style::new().bg(Color::LightYellow),
  };
  base_style.fg(Color::Black).add_modifier(Modifier::BOLD)
}

/// Where the grid was last drawn, so clicks can be mapped back to squares.
#[derive(Debug, Clone, Copy)]
struct GridView {
  area: Rect,
  layout: DisplayLayout,
  /// Display rows and columns on screen.
  visible: (usize, usize),
  /// Display position of the top-left square on screen.
  scroll: Pos,
}

#[derive(Debug)]
pub struct App {
  puzzle: Puzzle,
  running: bool,
  cell_width: u16,
  cell_height: u16,
  scroll: Pos,
  view: Option<GridView>,
  status: String,
}

impl App {
  fn new(puzzle: Puzzle, cell_width: u16, cell_height: u16) -> Self {
    Self {
      puzzle,
      running: true,
      cell_width,
      cell_height,
      scroll: (0, 0),
      view: None,
      status: String::new(),
    }
  }

  pub fn run(mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
    self.running = true;
    while self.running {
      terminal.draw(|frame| self.draw(frame))?;
      self.handle_crossterm_events()?;
    }
    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    let (_, puzzle_area, _) = areas(frame.area());
    self.view = Some(self.fit(puzzle_area));
    frame.render_widget(&*self, frame.area());
  }

  /// Lays the puzzle out for `area` and scrolls the cursor into view. Runs on every
  /// draw, so a terminal resize is picked up on the next frame.
  fn fit(&mut self, area: Rect) -> GridView {
    let (pitch_w, pitch_h) = self.pitch();
    let max_rows = max_visible(area.height.into(), pitch_h.into());
    let max_cols = max_visible(area.width.into(), pitch_w.into());

    let size = self.puzzle.size();
    let layout = fit_or_scroll(size, size, max_rows, max_cols);
    let visible = (max_rows.min(layout.rows), max_cols.min(layout.cols));

    let cursor = layout.to_display(self.puzzle.cursor_pos());
    self.scroll = layout.scroll_into_view(self.scroll, visible, cursor);

    let grid_area = center(
      area,
      Constraint::Length(visible.1 as u16 * pitch_w),
      Constraint::Length(visible.0 as u16 * pitch_h),
    );
    debug!(?layout, ?visible, scroll = ?self.scroll, "grid fitted");

    GridView {
      area: grid_area,
      layout,
      visible,
      scroll: self.scroll,
    }
  }

  /// Screen distance between neighboring squares.
  fn pitch(&self) -> (u16, u16) {
    (self.cell_width.saturating_add(1), self.cell_height.saturating_add(1))
  }

  /// Reads the crossterm events and updates the state of [`App`].
  fn handle_crossterm_events(&mut self) -> io::Result<()> {
    match event::read()? {
      // it's important to check KeyEventKind::Press to avoid handling key release events
      Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
      Event::Mouse(mouse) => self.on_mouse_event(mouse),
      Event::Resize(width, height) => debug!(width, height, "terminal resized"),
      _ => {}
    }
    Ok(())
  }

  /// Handles the key events and updates the state of [`App`].
  fn on_key_event(&mut self, key: KeyEvent) {
    match (key.modifiers, key.code) {
      (_, KeyCode::Esc) | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
        self.quit()
      }
      (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
        if !self.puzzle.reveal_letter() {
          self.status = "The first letter of this word is already filled in".to_string();
        }
      }
      (KeyModifiers::CONTROL, KeyCode::Char('w')) => {
        self.puzzle.reveal_word();
      }
      (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(' ')) => {
        self.puzzle.swap_cursor_direction()
      }
      (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) if c.is_alphabetic() => {
        self.puzzle.add_letter(c)
      }
      (_, KeyCode::Backspace) => self.puzzle.backspace(),
      (_, KeyCode::Delete) => self.puzzle.erase_letter(),
      (_, KeyCode::Up) => self.puzzle.cursor_up(),
      (_, KeyCode::Down) => self.puzzle.cursor_down(),
      (_, KeyCode::Left) => self.puzzle.cursor_left(),
      (_, KeyCode::Right) => self.puzzle.cursor_right(),
      (_, KeyCode::Tab) => self.puzzle.select_next_word(),
      (_, KeyCode::Enter) => self.check(),
      _ => {}
    }
  }

  fn on_mouse_event(&mut self, mouse: MouseEvent) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
      return;
    }
    let Some(pos) = self.hit_test(mouse.column, mouse.row) else {
      return;
    };
    if pos == self.puzzle.cursor_pos() {
      self.puzzle.swap_cursor_direction();
    } else {
      self.puzzle.select_cell(pos);
    }
  }

  /// The puzzle square under a terminal cell, if any.
  fn hit_test(&self, column: u16, row: u16) -> Option<Pos> {
    let view = self.view?;
    let (pitch_w, pitch_h) = self.pitch();
    let x = column.checked_sub(view.area.x)?;
    let y = row.checked_sub(view.area.y)?;
    if x % pitch_w >= self.cell_width || y % pitch_h >= self.cell_height {
      return None;
    }
    let (r, c) = (usize::from(y / pitch_h), usize::from(x / pitch_w));
    if r >= view.visible.0 || c >= view.visible.1 {
      return None;
    }
    view.layout.puzzle_pos((view.scroll.0 + r, view.scroll.1 + c))
  }

  fn check(&mut self) {
    self.status = match self.puzzle.check() {
      CheckOutcome::Incomplete(words) => format!(
        "Not finished yet. Words still missing letters: {}",
        join_numbers(&words)
      ),
      outcome @ CheckOutcome::Checked { .. } if outcome.is_solved() => {
        info!("puzzle solved in the terminal");
        "Solved! Every word is correct.".to_string()
      }
      CheckOutcome::Checked { correct, incorrect } => format!(
        "{} of {} words correct. Check: {}",
        correct.len(),
        correct.len() + incorrect.len(),
        join_numbers(&incorrect)
      ),
    };
  }

  /// Set running to false to quit the application.
  fn quit(&mut self) {
    self.running = false;
  }

  fn render_square(&self, pos: Pos, square_area: Rect, buf: &mut Buffer) {
    let square = self.puzzle.grid().get(pos);
    let mut style = square_style(self.puzzle.square_style(pos));
    match self.puzzle.mark(pos) {
      Some(Mark::Correct) => style = style.fg(Color::Green),
      Some(Mark::Incorrect) => style = style.fg(Color::Red),
      None if self.puzzle.is_hinted(pos) => style = style.fg(Color::Blue),
      None => {}
    }

    match square {
      Square::Black => Block::new()
        .style(Style::new().bg(Color::Black))
        .render(square_area, buf),
      Square::Empty | Square::Letter(_) => {
        let text = match square {
          Square::Letter(c) => c.to_string(),
          _ => String::new(),
        };
        Paragraph::new(text)
          .block(
            Block::new()
              .style(style)
              .padding(Padding::top(square_area.height / 2)),
          )
          .centered()
          .render(square_area, buf);
      }
    };

    if let Some(number) = self.puzzle.cell_number(pos) {
      let number_area = Rect {
        height: 1,
        ..square_area
      };
      let number_style = style.remove_modifier(Modifier::BOLD);
      Line::from(span!(number_style; "{}", number)).render(number_area, buf);
    }
  }

  fn render_grid(&self, buf: &mut Buffer) {
    let Some(view) = self.view else {
      return;
    };
    let (pitch_w, pitch_h) = self.pitch();

    for r in 0..view.visible.0 {
      for c in 0..view.visible.1 {
        let square_area = Rect {
          x: view.area.x + c as u16 * pitch_w,
          y: view.area.y + r as u16 * pitch_h,
          width: self.cell_width,
          height: self.cell_height,
        }
        .intersection(view.area);

        let display = (view.scroll.0 + r, view.scroll.1 + c);
        match view.layout.puzzle_pos(display) {
          Some(pos) => self.render_square(pos, square_area, buf),
          // Filler around a puzzle smaller than the screen.
          None => Block::new()
            .style(Style::new().bg(Color::DarkGray))
            .render(square_area, buf),
        }
      }
    }
  }

  fn clue_lines(&self) -> Vec<Line<'_>> {
    let mut lines = vec![];

    if let Some(word) = self.puzzle.current_word() {
      lines.push(line![span!(Modifier::BOLD; "{} {}", word.number, word.direction)]);
      lines.push(Line::from(self.puzzle.current_clue()));
      lines.push(Line::default());
    }

    for (direction, clues) in self.puzzle.clues() {
      let heading = match direction {
        Direction::Across => "Across",
        Direction::Down => "Down",
      };
      lines.push(Line::from(heading).bold().blue());
      for (number, clue) in clues {
        lines.push(line![span!(Modifier::BOLD; "{:>3} ", number), clue]);
      }
      lines.push(Line::default());
    }

    if !self.status.is_empty() {
      lines.push(Line::from(self.status.clone()).italic());
      lines.push(Line::default());
    }

    lines.push(
      Line::from("Type to fill · Space: turn · Tab: next word · Enter: check").dark_gray(),
    );
    lines.push(Line::from("Ctrl+R: reveal letter · Ctrl+W: reveal word · Esc: quit").dark_gray());
    lines
  }
}

impl Widget for &App {
  fn render(self, area: Rect, buf: &mut Buffer) {
    let (title_area, _, clue_area) = areas(area);

    let offset = self.puzzle.offset();
    let title = line![
      "CrossyThink".bold().blue(),
      ": ".bold(),
      span!(
        Modifier::BOLD;
        "{0}x{0} puzzle, {1} words (generator offset {2}, {3})",
        self.puzzle.size(),
        self.puzzle.words().len(),
        offset.row,
        offset.col
      ),
    ]
    .centered();
    title.render(title_area, buf);

    self.render_grid(buf);

    Paragraph::new(self.clue_lines())
      .wrap(Wrap { trim: false })
      .block(
        Block::bordered()
          .title(Line::from("Clues").centered())
          .padding(Padding::uniform(1)),
      )
      .render(clue_area, buf);
  }
}

/// Splits the screen into (title, puzzle, clues).
fn areas(area: Rect) -> (Rect, Rect, Rect) {
  let [title_area, main_area] =
    Layout::vertical([Constraint::Length(2), Constraint::Percentage(100)]).areas(area);
  let [puzzle_area, clue_area] =
    Layout::horizontal([Constraint::Percentage(100), Constraint::Length(45)]).areas(main_area);
  (title_area, puzzle_area, clue_area)
}

fn join_numbers(numbers: &[u32]) -> String {
  numbers
    .iter()
    .map(u32::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}

/// https://ratatui.rs/recipes/layout/center-a-widget/
fn center(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
  let [area] = Layout::horizontal([horizontal])
    .flex(Flex::Center)
    .areas(area);
  let [area] = Layout::vertical([vertical]).flex(Flex::Center).areas(area);
  area
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app() -> App {
    let payload = Payload::from_json(
      r#"{
        "grid": [["", "", "", ""], ["", "C", "A", "T"], ["", "O", "", ""], ["", "W", "", ""]],
        "words": [
          { "word": "CAT", "direction": "across", "row": 1, "col": 1, "length": 3 },
          { "word": "COW", "direction": "down", "row": 1, "col": 1, "length": 3 }
        ],
        "definitions": { "CAT": "Feline", "COW": "Bovine" }
      }"#,
    )
    .unwrap();
    App::new(Puzzle::from_payload(payload).unwrap(), 3, 1)
  }

  #[test]
  fn small_puzzle_is_centered_in_a_large_area() {
    let mut app = app();
    let view = app.fit(Rect::new(0, 0, 40, 20));

    // 5x5 puzzle, squares 4 columns by 2 rows apart: 10x10 fit.
    assert_eq!((view.layout.rows, view.layout.cols), (10, 10));
    assert_eq!((view.layout.row_offset, view.layout.col_offset), (2, 2));
    assert_eq!(view.visible, (10, 10));
    assert_eq!(view.scroll, (0, 0));
  }

  #[test]
  fn large_puzzle_scrolls_to_the_cursor() {
    let mut app = app();
    app.puzzle.select_word(2);
    app.puzzle.cursor_down();
    app.puzzle.cursor_down();
    assert_eq!(app.puzzle.cursor_pos(), (3, 1));

    let view = app.fit(Rect::new(0, 0, 8, 4));
    assert_eq!((view.layout.rows, view.layout.cols), (5, 5));
    assert_eq!(view.visible, (2, 2));
    assert_eq!(view.scroll, (2, 0));
  }

  #[test]
  fn clicks_map_to_squares() {
    let mut app = app();
    let area = Rect::new(0, 0, 40, 20);
    app.view = Some(app.fit(area));
    let view = app.view.unwrap();

    // Display (3, 3) is puzzle (1, 1).
    let (x, y) = (view.area.x + 3 * 4, view.area.y + 3 * 2);
    assert_eq!(app.hit_test(x, y), Some((1, 1)));
    // The gap between squares.
    assert_eq!(app.hit_test(x + 3, y), None);
    // Filler.
    assert_eq!(app.hit_test(view.area.x, view.area.y), None);

    app.on_mouse_event(MouseEvent {
      kind: MouseEventKind::Down(MouseButton::Left),
      column: x + 4,
      row: y,
      modifiers: KeyModifiers::NONE,
    });
    assert_eq!(app.puzzle.cursor_pos(), (1, 2));
  }

  #[test]
  fn square_sides_are_bounded() {
    let parse = |width: &str| {
      Cli::try_parse_from(["crosstui", "--words", "w.txt", "--cell-width", width])
    };

    assert_eq!(parse("64").unwrap().cell_width, 64);
    assert!(parse("65535").is_err());
    assert!(parse("0").is_err());

    let mut wide = app();
    wide.cell_width = u16::MAX;
    assert_eq!(wide.pitch(), (u16::MAX, 2));
  }

  #[test]
  fn styles_follow_the_cursor() {
    assert_eq!(square_style(SquareStyle::Cursor).bg, Some(Color::LightRed));
    assert_eq!(square_style(SquareStyle::Word).bg, Some(Color::LightYellow));
    assert_eq!(square_style(SquareStyle::Standard).fg, Some(Color::Black));
  }

  #[test]
  fn checking_reports_progress() {
    let mut app = app();
    app.check();
    assert!(app.status.starts_with("Not finished yet"));

    for c in ['c', 'a', 't'] {
      app.on_key_event(KeyEvent::from(KeyCode::Char(c)));
    }
    app.on_key_event(KeyEvent::from(KeyCode::Tab));
    for c in ['c', 'o', 'w'] {
      app.on_key_event(KeyEvent::from(KeyCode::Char(c)));
    }
    app.on_key_event(KeyEvent::from(KeyCode::Enter));
    assert_eq!(app.status, "Solved! Every word is correct.");
  }
}
