use std::env;
use std::path::{Path, PathBuf};

use shelf_core::config::Settings;
use shelf_core::library::LibraryDir;
use shelf_hybrid::LibraryIndex;

// Index a books directory in memory and print ranked results.
// Usage:
//   cargo run -p shelf-hybrid --example search -- "your query" \
//     [--books ../dev_data/books] [--limit 10]

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: cargo run -p shelf-hybrid --example search -- <query> [--books DIR] [--limit N]");
        std::process::exit(1);
    }
    let mut query = String::new();
    let mut books_dir: Option<PathBuf> = None;
    let mut limit: usize = 10;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--books" => {
                if i + 1 >= args.len() { eprintln!("--books requires a path"); std::process::exit(2); }
                books_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2; continue;
            }
            "--limit" => {
                if i + 1 >= args.len() { eprintln!("--limit requires a number"); std::process::exit(2); }
                limit = args[i + 1].parse().unwrap_or(limit);
                i += 2; continue;
            }
            s if s.starts_with("--") => {
                eprintln!("Unknown flag: {}", s); std::process::exit(2);
            }
            s => {
                if query.is_empty() { query = s.to_string(); }
                i += 1; continue;
            }
        }
    }

    // flag > BOOKS_DIR > workspace-relative fallback
    let books_dir = if let Some(dir) = books_dir {
        dir
    } else if let Ok(env_path) = env::var("BOOKS_DIR") {
        PathBuf::from(env_path)
    } else {
        let base = Path::new(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap_or(Path::new("."));
        base.join("dev_data/books")
    };

    let index = LibraryIndex::from_settings(Settings::default())?;
    let report = index.rebuild(&LibraryDir::new(&books_dir))?;
    println!("Indexed {} books from {} ({} skipped)", report.indexed, books_dir.display(), report.skipped.len());

    let results = index.search(&query, limit);
    println!("Query: {}  (hits: {})", query, results.len());
    for r in results {
        println!(
            "{:>3}. {:<12} combined={:.3} substring={:.3} regex={:.3} vector={:.3}",
            r.rank, r.id, r.combined, r.scores.substring, r.scores.regex, r.scores.vector
        );
    }
    Ok(())
}
