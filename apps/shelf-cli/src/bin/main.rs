use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelf_core::config::{resolve_with_base, Config, Settings};
use shelf_core::library::LibraryDir;
use shelf_core::types::ScoredResult;
use shelf_hybrid::{LibraryIndex, RebuildReport};
use shelf_vector::EmbeddingCache;

/// Shelf - search a local book library
#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Substring, regex and vector search over a local book library")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and its overlays
    #[arg(long, env = "SHELF_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Books directory, overriding library.books_dir
    #[arg(long, value_name = "DIR")]
    books: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the index and report what was indexed
    Index,
    /// Run one query
    Search {
        query: String,
        /// Maximum number of results (clamped to search.max_limit)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read queries from stdin until /quit
    Interactive,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(io::stderr).compact().init();

    let config = Config::load_from(&cli.config_dir).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    info!(env = config.env_name(), "configuration loaded");

    let library = match &cli.books {
        Some(dir) => LibraryDir::new(dir),
        None => LibraryDir::from_settings(&settings.library, &cli.config_dir),
    };
    let index = open_index(&settings, &cli)?;

    match cli.command {
        Command::Index => {
            println!("📚 Indexing {}", library.books_dir().display());
            let report = rebuild_with_bar(&index, &library)?;
            print_report(&report);
        }
        Command::Search { query, limit, json } => {
            index.rebuild(&library)?;
            let results = index.search(&query, limit.unwrap_or(settings.search.default_limit));
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&query, &results);
            }
        }
        Command::Interactive => {
            println!("🔍 Interactive Search");
            println!("====================");
            let report = rebuild_with_bar(&index, &library)?;
            print_report(&report);
            interactive_loop(&index, &library)?;
        }
    }
    Ok(())
}

fn open_index(settings: &Settings, cli: &Cli) -> anyhow::Result<LibraryIndex> {
    let index = LibraryIndex::from_settings(settings.clone()).context("Failed to create library index")?;
    Ok(match &settings.library.cache_file {
        Some(path) => index.with_cache(EmbeddingCache::open(resolve_with_base(&cli.config_dir, path))),
        None => index,
    })
}

fn rebuild_with_bar(index: &LibraryIndex, library: &LibraryDir) -> anyhow::Result<RebuildReport> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} books ({percent}%)")?
            .progress_chars("#>-"),
    );
    let report = index.rebuild_with_progress(library, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();
    Ok(report)
}

fn print_report(report: &RebuildReport) {
    println!("✅ Indexed {} books", report.indexed);
    if report.cache_hits > 0 {
        println!("📦 {} embeddings reused from cache", report.cache_hits);
    }
    for skipped in &report.skipped {
        println!("⚠️  Skipped {}: {}", skipped.id, skipped.reason);
    }
}

fn print_results(query: &str, results: &[ScoredResult]) {
    if results.is_empty() {
        println!("❌ No results for '{}'", query);
        return;
    }
    println!("🎯 {} results for '{}'", results.len(), query);
    for r in results {
        println!(
            "{:>3}. {:<12} {:.3}  (substring {:.3}, regex {:.3}, vector {:.3})",
            r.rank, r.id, r.combined, r.scores.substring, r.scores.regex, r.scores.vector
        );
    }
}

fn show_help() {
    println!("🎯 Commands:");
    println!("  /help      - Show this help message");
    println!("  /stats     - Show index statistics");
    println!("  /limit N   - Set the result limit");
    println!("  /reindex   - Rebuild from the books directory");
    println!("  /quit      - Exit");
    println!("  <query>    - Search (plain words or a regex)");
    println!();
}

fn interactive_loop(index: &LibraryIndex, library: &LibraryDir) -> anyhow::Result<()> {
    let mut limit = index.settings().search.default_limit;
    show_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("search> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/help" | "/h" => show_help(),
            "/quit" | "/q" | "/exit" => break,
            "/stats" | "/s" => {
                let snapshot = index.snapshot();
                println!("📊 Books: {}", snapshot.len());
                println!("📊 Embedder: {} (dim {})", index.embedder().embedder_id(), index.embedder().dim());
                println!("📊 Metric: {}", snapshot.vectors().metric());
                println!("📊 Consistent: {}", snapshot.is_consistent());
            }
            "/reindex" => match rebuild_with_bar(index, library) {
                Ok(report) => print_report(&report),
                Err(e) => println!("❌ Reindex failed: {:#}", e),
            },
            cmd if cmd.starts_with("/limit") => match cmd.trim_start_matches("/limit").trim().parse::<usize>() {
                Ok(n) => {
                    limit = n;
                    println!("Limit set to {}", n);
                }
                Err(_) => println!("❌ Usage: /limit N"),
            },
            query => print_results(query, &index.search(query, limit)),
        }
        println!();
    }

    if index.persist_cache()? {
        info!("embedding cache saved");
    }
    println!("👋 Goodbye!");
    Ok(())
}
