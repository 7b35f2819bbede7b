//! Pageflow CLI (for testing purposes only)
//! The main interface is through WASM bindings.
//!
//! Paginates a file (or stdin) with monospace metrics and prints one
//! summary line per page.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pageflow::layout::DEFAULT_FONT_SIZE;
use pageflow::{LayoutContext, MetricsOracle, NullSurface, Paginator};

/// Paginate rich-text markup onto A4 pages
#[derive(Parser, Debug)]
#[command(name = "pageflow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Markup file to paginate; stdin when omitted or `-`
    file: Option<PathBuf>,

    /// Font size in layout units
    #[arg(short, long, default_value_t = DEFAULT_FONT_SIZE, value_parser = parse_font_size)]
    font_size: f32,
}

fn parse_font_size(arg: &str) -> Result<f32, String> {
    match arg.parse::<f32>() {
        Ok(size) if size.is_finite() && size > 0.0 => Ok(size),
        Ok(_) => Err("font size must be positive".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let path = cli.file.filter(|path| path.as_os_str() != "-");

    let input = match read_input(path.as_deref()) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("cannot read input: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let layout = LayoutContext::a4().with_font_size(cli.font_size);
    let paginator = Paginator::new(&input, MetricsOracle::new(), NullSurface, layout);

    println!(
        "Pageflow: {} pages, {} lines per page at {}px",
        paginator.pages().len(),
        paginator.max_lines(),
        cli.font_size
    );
    for (index, page) in paginator.pages().iter().enumerate() {
        let text = page.content().plain_text();
        let first_line = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
        println!(
            "  page {:>3} (id {}): {:>6} chars | {}",
            index + 1,
            page.id(),
            page.content().char_len(),
            first_line.chars().take(48).collect::<String>()
        );
    }

    let stats = paginator.stats();
    println!(
        "{} words, {} sentences, {} characters",
        stats.word_count, stats.sentence_count, stats.char_count
    );
    ExitCode::SUCCESS
}

fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
