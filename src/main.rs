use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use legis_parser::batch::{self, BatchReport, Summary};
use legis_parser::db;
use legis_parser::feed::{self, CommitteeKind};
use legis_parser::{Schema, Settings};

#[derive(Parser)]
#[command(name = "legis", about = "Wisconsin legislature panel extractor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract legislator panels (*.txt) from a directory
    Legislators {
        dir: PathBuf,
        /// Max files to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print the name of every extracted subject
        #[arg(long)]
        list: bool,
    },
    /// Extract committee panels (*.txt) from a directory
    Committees {
        dir: PathBuf,
        /// Max files to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print the name of every extracted subject
        #[arg(long)]
        list: bool,
    },
    /// Store committee names and links from an RSS feed file
    Feed {
        xml: PathBuf,
        #[arg(short, long, value_enum)]
        kind: CommitteeKind,
    },
    /// Print stored records as JSON lines
    Export {
        #[arg(value_enum)]
        schema: Schema,
    },
    /// Show table counts and recent runs
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load settings")?;

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Legislators { dir, limit, list } => {
            extract_dir(&conn, &settings, Schema::Legislator, &dir, limit, list)
        }
        Commands::Committees { dir, limit, list } => {
            extract_dir(&conn, &settings, Schema::Committee, &dir, limit, list)
        }
        Commands::Feed { xml, kind } => {
            let text = std::fs::read_to_string(&xml)
                .with_context(|| format!("Failed to read {}", xml.display()))?;
            let meta = feed::committee_metadata(&text, kind)?;
            let saved = db::save_feed(&conn, &meta)?;
            println!("Saved {} {} committees.", saved, kind.name());
            Ok(())
        }
        Commands::Export { schema } => {
            for (subject, record) in db::fetch_records(&conn, schema)? {
                let mut json = record.to_json();
                json["subject"] = subject.into();
                println!("{}", json);
            }
            Ok(())
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Legislators: {}", s.legislators);
            println!("Committees:  {}", s.committees);
            println!("Feed:        {}", s.feed);
            println!("Runs:        {}", s.runs);
            println!("Diagnostics: {}", s.diagnostics);
            let runs = db::fetch_recent_runs(&conn, 5)?;
            if !runs.is_empty() {
                println!("\n--- Recent runs ---");
                for r in runs {
                    println!("  {} {:<10} {}", r.run_id, r.schema, r.summary);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn extract_dir(
    conn: &rusqlite::Connection,
    settings: &Settings,
    schema: Schema,
    dir: &Path,
    limit: Option<usize>,
    list: bool,
) -> anyhow::Result<()> {
    let subjects = batch::load_dir(dir, limit)?;
    if subjects.is_empty() {
        println!("No *.txt files in {}.", dir.display());
        return Ok(());
    }

    let started = chrono::Utc::now();
    let run_id = db::new_run_id(started);
    info!(run_id = %run_id, schema = %schema, "extracting {} subjects", subjects.len());

    let (summary, names, reports) = process_subjects(conn, settings, schema, &run_id, &subjects)?;
    db::save_run(
        conn,
        &db::RunRow {
            run_id: run_id.clone(),
            schema: schema.name().to_string(),
            summary,
            started_at: started.to_rfc3339(),
        },
    )?;
    for report in &reports {
        db::save_diagnostics(conn, &run_id, report)?;
    }

    if list {
        for name in &names {
            println!("{}", name);
        }
    }
    println!("{} {}: {}.", run_id, schema, summary);
    Ok(())
}

/// Extract in chunks so the store and the progress bar advance together.
fn process_subjects(
    conn: &rusqlite::Connection,
    settings: &Settings,
    schema: Schema,
    run_id: &str,
    subjects: &[batch::Subject],
) -> anyhow::Result<(Summary, Vec<String>, Vec<BatchReport>)> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(subjects.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut summary = Summary::default();
    let mut names = Vec::new();
    let mut reports: Vec<BatchReport> = Vec::new();

    for chunk in subjects.chunks(500) {
        let report = batch::run(chunk, schema, settings);
        db::save_records(conn, schema, run_id, report.records())?;
        summary.merge(report.summary());
        names.extend(report.records().map(|(id, _)| id.to_string()));
        reports.push(report);
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    Ok((summary, names, reports))
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
