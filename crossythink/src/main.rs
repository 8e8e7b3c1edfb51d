use clap::{Parser, Subcommand};
use crossythink::generator::{self, DEFAULT_SIZE};
use crossythink::viewport::{CellSizes, Viewport};
use crossythink::{Error, Payload, Puzzle, normalize};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Inspect and produce CrossyThink puzzle payloads
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Normalize a payload file, every payload in a directory, or stdin (no path or
  /// `-`), and print the result
  Normalize { path: Option<PathBuf> },
  /// Generate a payload from a word list (`WORD` or `WORD - clue` per line)
  Generate {
    #[arg(long)]
    words: PathBuf,
    /// Side of the working grid
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,
    #[arg(long)]
    seed: Option<u64>,
  },
  /// Show how a puzzle would be laid out on a screen of the given pixel size
  Layout {
    #[arg(long)]
    rows: usize,
    #[arg(long)]
    cols: usize,
    #[arg(long)]
    width: u32,
    #[arg(long)]
    height: u32,
    /// Cell size for screens at least 1025 wide
    #[arg(long, default_value_t = CellSizes::default().desktop)]
    desktop_cell: u32,
    /// Cell size for screens between 769 and 1024 wide
    #[arg(long, default_value_t = CellSizes::default().tablet)]
    tablet_cell: u32,
    /// Cell size for screens at most 768 wide
    #[arg(long, default_value_t = CellSizes::default().mobile)]
    mobile_cell: u32,
  },
}

fn load_payload(path: &Path) -> Result<Payload, Error> {
  Payload::from_reader(fs::File::open(path)?)
}

/// The normalized grid of a payload, `.` for blank cells, followed by its words when
/// it has any.
fn describe(payload: Payload, source: &str) -> Result<Vec<String>, Error> {
  let payload = payload.into_result()?;
  let normalized = normalize(&payload.grid)?;
  let offset = normalized.offset;

  let mut lines = vec![format!(
    "Normalized {} into a {}x{} grid, offset ({}, {})",
    source, normalized.size, normalized.size, offset.row, offset.col
  )];
  if normalized.is_empty() {
    lines.push("(empty grid)".to_string());
  }
  for row in &normalized.cells {
    lines.push(
      row
        .iter()
        .map(|cell| match cell.as_deref().map(str::trim) {
          Some(letter) if !letter.is_empty() => letter,
          _ => ".",
        })
        .collect(),
    );
  }

  if payload.words.is_empty() {
    return Ok(lines);
  }

  let puzzle = Puzzle::from_payload(payload)?;
  for word in puzzle.words() {
    lines.push(format!(
      "{:>3} {:<6} {:<15} at ({:2}, {:2})  {}",
      word.number,
      word.direction,
      word.answer,
      word.start.0,
      word.start.1,
      puzzle.clue(word.number)
    ));
  }
  Ok(lines)
}

fn print_payload(payload: Payload, source: &str) -> Result<(), Error> {
  for line in describe(payload, source)? {
    println!("{line}");
  }
  Ok(())
}

fn normalize_path(path: Option<&Path>) -> Result<(), Error> {
  let path = match path {
    Some(path) if path != Path::new("-") => path,
    _ => return print_payload(Payload::from_reader(io::stdin().lock())?, "stdin"),
  };

  if !fs::metadata(path)?.is_dir() {
    return print_payload(load_payload(path)?, &path.display().to_string());
  }

  let mut success = 0;
  let mut failure = 0;

  for entry in fs::read_dir(path)? {
    let payload_path = entry?.path();
    if payload_path.extension().is_none_or(|ext| ext != "json") {
      continue;
    }
    let source = payload_path.display().to_string();
    match load_payload(&payload_path).and_then(|payload| describe(payload, &source)) {
      Ok(lines) => {
        for line in lines {
          println!("{line}");
        }
        success += 1;
      }
      Err(e) => {
        println!("Failed with {} from {}", e, source);
        failure += 1;
      }
    }
  }
  println!("{success} normalized, {failure} failed");

  Ok(())
}

fn generate(words: &Path, size: usize, seed: Option<u64>) -> Result<(), Error> {
  let entries = generator::parse_word_list(&fs::read_to_string(words)?);
  let definitions: BTreeMap<String, String> = entries.iter().cloned().collect();
  let words: Vec<&str> = entries.iter().map(|(word, _)| word.as_str()).collect();

  let mut rng = match seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };
  let payload = generator::generate(&words, size, &mut rng)?.into_payload(&definitions);
  println!("{}", payload.to_json_pretty()?);
  Ok(())
}

/// A small CLI around the crossythink library
fn main() -> Result<(), Error> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  match Cli::parse().command {
    Command::Normalize { path } => normalize_path(path.as_deref()),
    Command::Generate { words, size, seed } => generate(&words, size, seed),
    Command::Layout {
      rows,
      cols,
      width,
      height,
      desktop_cell,
      tablet_cell,
      mobile_cell,
    } => {
      let sizes = CellSizes {
        desktop: desktop_cell,
        tablet: tablet_cell,
        mobile: mobile_cell,
      };
      let viewport = Viewport { width, height };
      let (max_rows, max_cols) = viewport.capacity(&sizes);
      let layout = viewport.layout(rows, cols, &sizes);
      println!(
        "{:?} screen fits {}x{} cells: display grid {}x{}, puzzle at offset ({}, {})",
        viewport.device_class(),
        max_rows,
        max_cols,
        layout.rows,
        layout.cols,
        layout.row_offset,
        layout.col_offset,
      );
      if rows > max_rows || cols > max_cols {
        println!("The puzzle is larger than the screen and will scroll");
      }
      Ok(())
    }
  }
}
