use anyhow::{Context, Result};
use clap::Parser;
use esglens::analysis::Analyzer;
use esglens::config::Analysis;
use esglens::standards::ReferenceTable;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "esg_keywords")]
#[command(about = "Extract keywords from an ESG report PDF")]
struct Cli {
    pdf_path: PathBuf,
    /// Reference table to look the standard up in
    #[arg(long)]
    standards: Option<PathBuf>,
    #[arg(long, default_value = "")]
    standard: String,
    /// Only print the bounded text preview
    #[arg(long)]
    preview_only: bool,
    #[arg(long, default_value_t = 2000)]
    preview_chars: usize,
    #[arg(long)]
    max_pages: Option<usize>,
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Serialize)]
struct PreviewOutput<'a> {
    filename: &'a str,
    preview: String,
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

fn display_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let path = cli.pdf_path.as_path();

    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("Path is not a file: {}", path.display());
    }

    let table = match &cli.standards {
        Some(csv) => ReferenceTable::load(csv)
            .with_context(|| format!("Failed to load standards: {}", csv.display()))?,
        None => ReferenceTable::default(),
    };

    let cfg = Analysis {
        preview_chars: cli.preview_chars,
        max_pages: cli.max_pages,
        ..Analysis::default()
    };
    let analyzer = Analyzer::new(Arc::new(table), &cfg);

    if cli.preview_only {
        let preview = analyzer
            .preview(path)
            .with_context(|| format!("Failed to read PDF: {}", path.display()))?;
        return print_json(
            &PreviewOutput {
                filename: display_name(path),
                preview,
            },
            cli.pretty,
        );
    }

    // The CLI has no form, so an empty standard just means "no lookup".
    let standard = if cli.standard.trim().is_empty() {
        "-"
    } else {
        cli.standard.as_str()
    };
    let result = analyzer
        .analyze(standard, display_name(path), path)
        .with_context(|| format!("Failed to analyze PDF: {}", path.display()))?;

    print_json(&result, cli.pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/reports/bank.pdf")), "bank.pdf");
        assert_eq!(display_name(Path::new("/")), "unknown");
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "esg_keywords",
            "report.pdf",
            "--standard",
            "GRI",
            "--preview-only",
            "--max-pages",
            "3",
        ]);
        assert_eq!(cli.pdf_path, PathBuf::from("report.pdf"));
        assert_eq!(cli.standard, "GRI");
        assert!(cli.preview_only);
        assert_eq!(cli.max_pages, Some(3));
        assert_eq!(cli.preview_chars, 2000);
    }
}
