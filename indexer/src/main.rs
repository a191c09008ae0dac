use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use webdex_core::{Corpus, IndexBuilder, IndexReader, SearchEngine, SearchResult};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a disk-resident inverted index of HTML pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a directory of .json/.jsonl pages
    Build {
        /// Corpus root directory
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
    },
    /// Run a query, or read queries from stdin when --query is omitted
    Query {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long)]
        query: Option<String>,
        /// Number of results to print
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// Print the summary statistics of an index
    Stats {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(input, output),
        Commands::Query { index, query, top_k } => {
            let engine = SearchEngine::open(&index)?;
            match query {
                Some(q) => {
                    let results = engine.search(&q, top_k)?;
                    write_results(&mut io::stdout().lock(), &q, &results)?;
                    Ok(())
                }
                None => interactive(&engine, top_k),
            }
        }
        Commands::Stats { index } => {
            let reader = IndexReader::open(&index)?;
            println!("{}", serde_json::to_string_pretty(&*reader.stats()?)?);
            Ok(())
        }
    }
}

fn build_index(input: PathBuf, output: PathBuf) -> Result<()> {
    let corpus = Corpus::open(&input)?;
    let report = IndexBuilder::new(&output).build(corpus.documents())?;
    if report.documents_indexed == 0 {
        tracing::warn!(input = %input.display(), "no documents were indexed");
    }
    println!("Documents indexed: {}", report.stats.num_documents);
    println!("Unique terms: {}", report.stats.num_unique_terms);
    println!("Index size: {} KB ({} bytes)", report.stats.index_size_kb, report.stats.index_size_bytes);
    println!(
        "Skipped: {} duplicates, {} malformed, {} unreadable",
        report.duplicates, report.parse_errors, report.read_errors
    );
    Ok(())
}

fn interactive(engine: &SearchEngine, top_k: usize) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Query: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { return Ok(()) };
        let query = line?;
        let query = query.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_lowercase().as_str(), "quit" | "exit" | "q") {
            return Ok(());
        }
        match engine.search(query, top_k) {
            Ok(results) => write_results(&mut io::stdout().lock(), query, &results)?,
            Err(e) => eprintln!("error: {e}"),
        }
    }
}

/// Blank queries tokenize to nothing and are reported like any other miss.
fn write_results<W: Write>(out: &mut W, query: &str, results: &[SearchResult]) -> io::Result<()> {
    if results.is_empty() {
        writeln!(out, "No results found for {query:?}.")?;
        return Ok(());
    }
    writeln!(out, "Top {} result(s) for {query:?}:", results.len())?;
    for (i, r) in results.iter().enumerate() {
        writeln!(out, "{:>3}. [{:.4}] {}", i + 1, r.score, r.url)?;
    }
    Ok(())
}
