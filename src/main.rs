mod coverage;
mod db;
mod fetch;
mod messaging;
mod parser;
mod service;
mod settings;
mod view;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use fetch::{Fetcher, LoadedPage, PageSource};
use settings::{ExtractorConfig, Settings};
use view::ViewState;

#[derive(Parser)]
#[command(name = "resume_tailor", about = "Tailor a resume to a job posting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct ExtractorArgs {
    /// Only consider h1-h4 headings and the shorter keyword list
    #[arg(long)]
    narrow: bool,
    /// Deepest heading level to anchor on and stop at (1-6)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
    max_heading_level: Option<u8>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the job description from pages (files or URLs)
    Extract {
        #[arg(required = true)]
        sources: Vec<String>,
        #[command(flatten)]
        extractor: ExtractorArgs,
    },
    /// Answer one JSON request from stdin against a page
    Respond {
        /// Page to answer for (file or URL)
        #[arg(long)]
        page: String,
        #[command(flatten)]
        extractor: ExtractorArgs,
    },
    /// Extract text from a PDF resume and store it
    Upload { pdf: PathBuf },
    /// Compare the stored resume with a job description
    Analyze {
        /// Job description as plain text
        #[arg(long, conflicts_with = "page", required_unless_present = "page")]
        jd_file: Option<PathBuf>,
        /// Extract the job description from this page (file or URL)
        #[arg(long)]
        page: Option<String>,
        #[command(flatten)]
        extractor: ExtractorArgs,
    },
    /// Render edited resume text to PDF
    Render {
        text_file: PathBuf,
        #[arg(short, long, default_value = "Edited_Resume.pdf")]
        output: PathBuf,
    },
    /// Record the cloud document the stored resume is being edited in
    LinkDoc { document_id: String },
    /// Show what is stored
    Status,
    /// Forget the stored resume
    Clear,
    /// Recent extractions
    History {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Extract { sources, extractor } => {
            let config = extractor_config(&settings, extractor);
            let fetcher = Arc::new(Fetcher::new(settings.timeout())?);
            let pages = fetcher
                .load_all(sources.iter().map(|s| PageSource::parse(s)).collect())
                .await;
            let rows = extract_pages(&pages, &config);

            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            db::log_extractions(&conn, &rows)?;

            if let [row] = rows.as_slice() {
                if let Some(err) = &row.error {
                    bail!("{}", err);
                }
                if row.text.is_empty() {
                    println!("Could not locate a job description automatically. Paste it manually.");
                } else {
                    println!("{}", row.text);
                }
            } else {
                print_extract_summary(&rows);
            }
            Ok(())
        }
        Commands::Respond { page, extractor } => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read request from stdin")?;
            let request = messaging::parse_request(&raw)?;
            let fetcher = Fetcher::new(settings.timeout())?;
            let html = fetcher.load(&PageSource::parse(&page)).await?;
            let response =
                messaging::respond(request, html, extractor_config(&settings, extractor)).await?;
            if response.is_empty() {
                info!("No job description found on {}", page);
            }
            println!("{}", serde_json::to_string(&response)?);
            Ok(())
        }
        Commands::Upload { pdf } => {
            let client = service::ServiceClient::new(&settings.service_url, settings.timeout())?;
            let text = client.extract_resume(&pdf).await?;
            let file_name = pdf
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| pdf.display().to_string());

            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            db::save_resume(&conn, &text, &file_name)?;
            println!("Stored {} ({} chars of text).", file_name, text.chars().count());
            Ok(())
        }
        Commands::Analyze { jd_file, page, extractor } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let stored = db::load_resume(&conn)?;
            if !ViewState::from_stored(stored.as_ref()).has_resume() {
                bail!("Please upload your resume first (resume_tailor upload <PDF>).");
            }
            let resume = stored.ok_or_else(|| anyhow!("No resume stored"))?;

            let job_description = match (jd_file, page) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, Some(page)) => {
                    let html = Fetcher::new(settings.timeout())?
                        .load(&PageSource::parse(&page))
                        .await?;
                    let config = extractor_config(&settings, extractor);
                    parser::extract_from_html(&html, &config)
                        .map(|(_, text)| text)
                        .unwrap_or_default()
                }
                (None, None) => String::new(),
            };
            let job_description = job_description.trim();
            if job_description.is_empty() {
                bail!("Please provide the job description (no text found; pass --jd-file).");
            }

            let client = service::ServiceClient::new(&settings.service_url, settings.timeout())?;
            let suggestions = client.analyze(&resume.text, job_description).await?;
            let report = coverage::Coverage::compute(job_description, &suggestions);
            print!("{}", report.report());
            Ok(())
        }
        Commands::Render { text_file, output } => {
            let text = std::fs::read_to_string(&text_file)
                .with_context(|| format!("Failed to read {}", text_file.display()))?;
            if text.trim().is_empty() {
                bail!("{} is empty", text_file.display());
            }
            let client = service::ServiceClient::new(&settings.service_url, settings.timeout())?;
            let pdf = client.generate_pdf(text.trim()).await?;
            std::fs::write(&output, &pdf)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} ({} bytes).", output.display(), pdf.len());
            Ok(())
        }
        Commands::LinkDoc { document_id } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            if !db::link_document(&conn, document_id.trim())? {
                bail!("Please upload your resume first.");
            }
            let state = ViewState::from_stored(db::load_resume(&conn)?.as_ref());
            println!("{}", state);
            Ok(())
        }
        Commands::Status => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let stored = db::load_resume(&conn)?;
            println!("{}", ViewState::from_stored(stored.as_ref()));
            if let Some(r) = stored {
                println!(
                    "Stored at {} ({} chars)",
                    r.stored_at.format("%Y-%m-%d %H:%M UTC"),
                    r.text.chars().count()
                );
            }
            Ok(())
        }
        Commands::Clear => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            if db::clear_resume(&conn)? {
                println!("Stored resume removed.");
            } else {
                println!("Nothing to clear.");
            }
            Ok(())
        }
        Commands::History { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::recent_extractions(&conn, limit)?;
            if rows.is_empty() {
                println!("No extractions yet.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<40} | {:<18} | {:>6} | {:<20}",
                "#", "Source", "Tier", "Chars", "When"
            );
            println!("{}", "-".repeat(100));
            for (i, r) in rows.iter().enumerate() {
                let tier = match (&r.tier, &r.error) {
                    (Some(t), _) => t.clone(),
                    (None, Some(_)) => "error".to_string(),
                    (None, None) => "-".to_string(),
                };
                println!(
                    "{:>3} | {:<40} | {:<18} | {:>6} | {:<20}",
                    i + 1,
                    truncate(&r.source, 40),
                    tier,
                    r.chars,
                    truncate(&r.extracted_at, 19)
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {}", format_duration(elapsed));
    }

    result
}

fn extractor_config(settings: &Settings, args: ExtractorArgs) -> ExtractorConfig {
    settings.extractor_config(args.narrow, args.max_heading_level)
}

/// Run the cascade on every loaded page. Each worker parses its own document.
fn extract_pages(pages: &[LoadedPage], config: &ExtractorConfig) -> Vec<db::ExtractionRow> {
    use rayon::prelude::*;

    pages
        .par_iter()
        .map(|page| match &page.html {
            Some(html) => {
                let found = parser::extract_from_html(html, config);
                db::ExtractionRow {
                    source: page.source.clone(),
                    tier: found.as_ref().map(|(tier, _)| tier.to_string()),
                    text: found.map(|(_, text)| text).unwrap_or_default(),
                    error: None,
                    latency_ms: page.latency_ms,
                }
            }
            None => db::ExtractionRow {
                source: page.source.clone(),
                tier: None,
                text: String::new(),
                error: page.error.clone(),
                latency_ms: page.latency_ms,
            },
        })
        .collect()
}

fn print_extract_summary(rows: &[db::ExtractionRow]) {
    let mut found = 0;
    for row in rows {
        let status = match (&row.error, &row.tier) {
            (Some(e), _) => format!("error: {}", truncate(e, 60)),
            (None, Some(tier)) => {
                found += 1;
                format!("{} ({} chars)", tier, row.text.chars().count())
            }
            (None, None) => "nothing found".to_string(),
        };
        println!("{:<50} {}", truncate(&row.source, 50), status);
    }
    println!("\n{} of {} pages yielded a job description.", found, rows.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
