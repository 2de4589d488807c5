mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use file_scout_core::{EngineConfig, FileEngine, SilentReporter};
use progress::CliReporter;
use tracing::error;

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let config = match file_scout_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();
    let engine = FileEngine::new(config);

    let result = match args.command {
        Some(Commands::Load { dir }) => run_load(&engine, &dir),
        Some(Commands::Create { dir, name, content }) => run_create(&engine, &dir, &name, &content),
        Some(Commands::Delete { dir, name }) => run_delete(&engine, &dir, &name),
        Some(Commands::Append { dir, name, content }) => run_append(&engine, &dir, &name, &content),
        Some(Commands::Dedupe { dir, yes }) => run_dedupe(&engine, &dir, yes),
        Some(Commands::Search { dir, keyword }) => run_search(&engine, &dir, &keyword),
        Some(Commands::Count {
            dir,
            name,
            workers,
            top,
        }) => run_count(&engine, &dir, &name, workers, top),
        Some(Commands::PrintConfig) => {
            print_config(engine.config());
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        // Flush the file appender before exiting
        drop(guard);
        process::exit(1);
    }
}

fn run_load(engine: &FileEngine, dir: &Path) -> anyhow::Result<()> {
    let snapshot = engine.load_directory(dir, &CliReporter::new())?;

    println!(
        "{:<40} {:>12} {:>10} {:>10}",
        "NAME".bold(),
        "BYTES".bold(),
        "WORDS".bold(),
        "CHARS".bold()
    );
    for record in snapshot.iter() {
        println!(
            "{:<40} {:>12} {:>10} {:>10}",
            record.name, record.byte_size, record.word_count, record.char_count
        );
    }
    println!(
        "{} files, {} bytes",
        format!("{}", snapshot.len()).green(),
        format!("{}", snapshot.total_bytes()).green()
    );
    Ok(())
}

fn run_create(engine: &FileEngine, dir: &Path, name: &str, content: &str) -> anyhow::Result<()> {
    let snapshot = engine.load_directory(dir, &SilentReporter)?;
    engine
        .create_file(&snapshot, name, content)
        .with_context(|| format!("creating '{}'", name))?;
    println!("{} {}", "Created".green(), name);
    Ok(())
}

fn run_delete(engine: &FileEngine, dir: &Path, name: &str) -> anyhow::Result<()> {
    let snapshot = engine.load_directory(dir, &SilentReporter)?;
    engine
        .delete_file(&snapshot, name)
        .with_context(|| format!("deleting '{}'", name))?;
    println!("{} {}", "Deleted".red(), name);
    Ok(())
}

fn run_append(engine: &FileEngine, dir: &Path, name: &str, content: &str) -> anyhow::Result<()> {
    let snapshot = engine.load_directory(dir, &SilentReporter)?;
    engine
        .append_file(&snapshot, name, content)
        .with_context(|| format!("appending to '{}'", name))?;
    println!("{} {}", "Appended to".green(), name);
    Ok(())
}

fn run_dedupe(engine: &FileEngine, dir: &Path, yes: bool) -> anyhow::Result<()> {
    if !yes
        && !prompt_confirm(
            &format!("Delete duplicate files in {}?", dir.display()),
            Some(false),
        )?
    {
        return Ok(());
    }

    let reporter = CliReporter::new();
    let mut snapshot = engine.load_directory(dir, &reporter)?;
    let report = engine.delete_duplicates(&mut snapshot, &reporter)?;

    for group in &report.groups {
        println!(
            "{} {} ({} bytes)",
            "kept".green(),
            group.canonical,
            group.byte_size
        );
        for name in &group.duplicates {
            println!("  {}", name.dimmed());
        }
    }
    for failure in &report.failures {
        println!("{} {}: {}", "failed".red(), failure.name, failure.reason);
    }
    println!(
        "{} removed, {} kept, {} failed",
        format!("{}", report.removed_files.len()).red(),
        format!("{}", report.kept_files.len()).green(),
        format!("{}", report.failures.len()).yellow()
    );
    Ok(())
}

fn run_search(engine: &FileEngine, dir: &Path, keyword: &str) -> anyhow::Result<()> {
    let snapshot = engine.load_directory(dir, &SilentReporter)?;
    let matches = engine.search_keyword(&snapshot, keyword)?;
    if matches.is_empty() {
        println!("No files contain '{}'", keyword);
    }
    for name in matches {
        println!("{}", name);
    }
    Ok(())
}

fn run_count(
    engine: &FileEngine,
    dir: &Path,
    name: &str,
    workers: usize,
    top: Option<usize>,
) -> anyhow::Result<()> {
    let snapshot = engine.load_directory(dir, &SilentReporter)?;
    let table = engine
        .count_words(&snapshot, name, workers)
        .with_context(|| format!("counting words in '{}'", name))?;

    let entries = match top {
        Some(n) => table.top(n),
        None => table.entries(),
    };
    for entry in entries {
        println!("{}", entry);
    }
    println!(
        "{} words, {} distinct",
        format!("{}", table.total_words()).cyan(),
        format!("{}", table.distinct_words()).cyan()
    );
    Ok(())
}

fn print_config(config: &EngineConfig) {
    println!("Configuration: {:?}", config);
    println!("Max workers per operation: {}", config.max_workers());
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
