#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Prismatic levels headlessly.

mod logging;
mod report;

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use prismatic_core::{Level, Placement};
use prismatic_levels::{
    encode_share, parse_placements, parse_share, placements_from_records, LevelCatalog, LevelFile,
    PieceRecord, SOLUTIONS_FILE,
};
use prismatic_system_builder::validate;
use prismatic_system_propagation::{simulate, SimOptions};

/// Headless runner for Prismatic optics puzzles.
#[derive(Parser, Debug)]
#[command(name = "prismatic", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate one level file, optionally with a placements file.
    Simulate {
        /// Level JSON file.
        level: PathBuf,
        /// JSON array of placements to apply.
        #[arg(short, long)]
        placements: Option<PathBuf>,
        /// Stop after this many ticks. The level budget still applies.
        #[arg(short, long)]
        tick_limit: Option<u32>,
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the levels of a catalog directory in play order.
    Levels {
        /// Directory holding level JSON files.
        dir: PathBuf,
    },
    /// Check that every reference solution in a catalog still solves its level.
    Verify {
        /// Directory holding level JSON files.
        dir: PathBuf,
        /// Solutions file, defaults to `solutions.json` inside the directory.
        #[arg(short, long)]
        solutions: Option<PathBuf>,
    },
    /// Convert between level files and share strings.
    Share {
        #[command(subcommand)]
        action: ShareAction,
    },
}

#[derive(Subcommand, Debug)]
enum ShareAction {
    /// Print the share string of a level file.
    Encode {
        /// Level JSON file.
        level: PathBuf,
    },
    /// Decode a share string into a level document.
    Decode {
        /// Share string.
        share: String,
        /// Write the level here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Entry point for the Prismatic command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Simulate {
            level,
            placements,
            tick_limit,
            format,
        } => run_simulate(&level, placements.as_deref(), tick_limit, format),
        Command::Levels { dir } => run_levels(&dir),
        Command::Verify { dir, solutions } => {
            let solutions = solutions.unwrap_or_else(|| dir.join(SOLUTIONS_FILE));
            run_verify(&dir, &solutions)
        }
        Command::Share { action } => match action {
            ShareAction::Encode { level } => {
                let file = read_level_file(&level)?;
                println!("{}", encode_share(&file)?);
                Ok(())
            }
            ShareAction::Decode { share, output } => {
                let file = parse_share(&share)?;
                let json = serde_json::to_string_pretty(&file)?;
                match output {
                    Some(path) => fs::write(&path, json)
                        .with_context(|| format!("could not write {}", path.display())),
                    None => {
                        println!("{json}");
                        Ok(())
                    }
                }
            }
        },
    }
}

fn run_simulate(
    path: &Path,
    placements: Option<&Path>,
    tick_limit: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let level = read_level_file(path)?
        .to_level()
        .with_context(|| format!("invalid level {}", path.display()))?;
    let placements = match placements {
        Some(path) => {
            let text = read(path)?;
            parse_placements(&text, level.grid)
                .with_context(|| format!("invalid placements {}", path.display()))?
        }
        None => Vec::new(),
    };
    for violation in validate(&level, &placements) {
        warn!("{violation}");
    }

    let result = simulate(&level, &placements, SimOptions { tick_limit });
    info!(
        "{} finished after {} ticks",
        level.id, result.stats.elapsed_ticks
    );
    match format {
        OutputFormat::Text => print!("{}", report::render(&level, &placements, &result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn run_levels(dir: &Path) -> Result<()> {
    let catalog = LevelCatalog::load_dir(dir)?;
    for entry in catalog.iter() {
        let level = entry.level();
        println!(
            "{:<8} {:<12} {:>2}x{:<2} {}",
            level.id,
            format!("{:?}", level.difficulty).to_lowercase(),
            level.grid.width(),
            level.grid.height(),
            level.title
        );
    }
    Ok(())
}

fn run_verify(dir: &Path, solutions: &Path) -> Result<()> {
    let catalog = LevelCatalog::load_dir(dir)?;
    let text = read(solutions)?;
    let records: BTreeMap<String, Vec<PieceRecord>> = serde_json::from_str(&text)
        .with_context(|| format!("invalid solutions {}", solutions.display()))?;

    let mut failures = 0_usize;
    for entry in catalog.iter() {
        let level = entry.level();
        let Some(solution) = records.get(&level.id) else {
            failures += 1;
            println!("{:<8} FAIL no reference solution", level.id);
            continue;
        };
        let placements = placements_from_records(solution, level.grid)
            .with_context(|| format!("invalid solution for {}", level.id))?;
        match check_solution(level, &placements) {
            Ok(tick) => println!("{:<8} PASS solved on tick {tick}", level.id),
            Err(reason) => {
                failures += 1;
                println!("{:<8} FAIL {reason}", level.id);
            }
        }
    }

    for id in records.keys().filter(|id| catalog.get(id).is_none()) {
        failures += 1;
        println!("{id:<8} FAIL solution for a level that is not in the catalog");
    }
    if failures > 0 {
        bail!("{failures} verification failures in {}", dir.display());
    }
    debug!("verified {} levels", catalog.len());
    Ok(())
}

fn check_solution(level: &Level, placements: &[Placement]) -> Result<u32, String> {
    let violations = validate(level, placements);
    if let Some(first) = violations.first() {
        return Err(format!("{first} ({} violations)", violations.len()));
    }
    let result = simulate(level, placements, SimOptions::default());
    match result.stats.solve_tick {
        Some(tick) if result.victory => Ok(tick),
        _ => Err(format!(
            "not solved after {} ticks with {} leaks",
            result.stats.elapsed_ticks, result.stats.leak_count
        )),
    }
}

fn read_level_file(path: &Path) -> Result<LevelFile> {
    let text = read(path)?;
    LevelFile::from_json(&text).with_context(|| format!("invalid level {}", path.display()))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}
