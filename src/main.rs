mod config;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};

use logscope_engine::{
    export_filename, AnalysisSession, SortKey, StatusClassFilter, EXPORT_MIME_TYPE,
};

use crate::config::Config;

/// Logscope - dashboard views over anomaly-classified web server logs
#[derive(Parser, Debug)]
#[command(name = "logscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (default: ./logscope.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print summary statistics for a results file
    Summary {
        /// Classified results file (CSV or JSON)
        file: PathBuf,
    },

    /// Print the status-code distribution
    Status {
        /// Classified results file (CSV or JSON)
        file: PathBuf,
    },

    /// Print the hourly request series
    Hourly {
        /// Classified results file (CSV or JSON)
        file: PathBuf,
    },

    /// Print one page of the filtered record table
    Table {
        /// Classified results file (CSV or JSON)
        file: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Page number to display (clamped into range)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Records per page (overrides the config file)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Export the filtered records as CSV
    Export {
        /// Classified results file (CSV or JSON)
        file: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output path (default: log_analysis_<date>.csv in the configured directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Filter and sort flags shared by `table` and `export`.
#[derive(Args, Debug)]
struct FilterArgs {
    /// Case-insensitive search over IP address and timestamp
    #[arg(long, default_value = "")]
    search: String,

    /// Keep only records the classifier flagged as anomalous
    #[arg(long)]
    anomalies_only: bool,

    /// Status class to keep: all, 2, 3, 4, or 5
    #[arg(long, default_value = "all")]
    status_class: StatusClassFilter,

    /// Sort key: timestamp, ip, status, size, or anomaly
    #[arg(long)]
    sort: Option<SortKey>,

    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    desc: bool,
}

fn main() -> Result<()> {
    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Summary { file } => {
            let session = load_session(&file)?;
            print_summary(&session);
        }
        Command::Status { file } => {
            let session = load_session(&file)?;
            print_status_distribution(&session);
        }
        Command::Hourly { file } => {
            let session = load_session(&file)?;
            print_time_buckets(&session);
        }
        Command::Table {
            file,
            filter,
            page,
            page_size,
        } => {
            let mut session = load_session(&file)?;
            apply_filters(&mut session, &filter);
            session.view_state_mut().page_size = page_size.unwrap_or(config.view.page_size);
            session.view_state_mut().set_page(page);
            print_table(&mut session);
        }
        Command::Export {
            file,
            filter,
            output,
        } => {
            let mut session = load_session(&file)?;
            apply_filters(&mut session, &filter);

            let text = session.export_csv()?;
            let row_count = session.filtered().len();
            let path = output.unwrap_or_else(|| {
                config
                    .export
                    .directory
                    .join(export_filename(Local::now().date_naive()))
            });
            fs::write(&path, text)
                .with_context(|| format!("failed to write export to {}", path.display()))?;
            println!(
                "Wrote {} records to {} ({})",
                row_count,
                path.display(),
                EXPORT_MIME_TYPE
            );
        }
    }

    Ok(())
}

fn load_session(file: &PathBuf) -> Result<AnalysisSession> {
    let records = logscope_ingest::load_records(file)
        .with_context(|| format!("failed to load results from {}", file.display()))?;
    Ok(AnalysisSession::load(records))
}

fn apply_filters(session: &mut AnalysisSession, filter: &FilterArgs) {
    let state = session.view_state_mut();
    state.set_search_term(filter.search.clone());
    state.set_anomalies_only(filter.anomalies_only);
    state.set_status_class(filter.status_class);
    if let Some(key) = filter.sort {
        state.toggle_sort(key);
        if filter.desc {
            // Second toggle of the same key flips to descending
            state.toggle_sort(key);
        }
    }
}

fn print_summary(session: &AnalysisSession) {
    let stats = session.summary();
    println!("Total requests:    {}", stats.total_requests);
    println!(
        "Anomalies:         {} ({:.2}%)",
        stats.anomaly_count, stats.anomaly_rate_percent
    );
    println!("Unique IPs:        {}", stats.unique_ip_count);
    println!("Avg response size: {} bytes", stats.avg_response_size_bytes);
}

fn print_status_distribution(session: &AnalysisSession) {
    println!("{:<8} {:>8}  {}", "STATUS", "COUNT", "CLASS");
    for entry in session.status_distribution() {
        println!(
            "{:<8} {:>8}  {}",
            entry.status_code,
            entry.count,
            entry.color_class.as_str()
        );
    }
}

fn print_time_buckets(session: &AnalysisSession) {
    println!(
        "{:<6} {:>10} {:>10} {:>14}",
        "HOUR", "REQUESTS", "ANOMALIES", "BYTES"
    );
    for bucket in session.time_buckets() {
        println!(
            "{:<6} {:>10} {:>10} {:>14}",
            bucket.hour_label, bucket.request_count, bucket.anomaly_count, bucket.total_size_bytes
        );
    }
}

fn print_table(session: &mut AnalysisSession) {
    let (records, page) = session.current_page();
    println!(
        "{:<28} {:<16} {:<7} {:>10}  {}",
        "TIMESTAMP", "IP", "STATUS", "SIZE", "ANOMALY"
    );
    for record in records {
        println!(
            "{:<28} {:<16} {:<7} {:>10}  {}",
            record.timestamp,
            record.ip,
            record.status,
            record.size,
            if record.is_anomalous() { "Yes" } else { "No" }
        );
    }
    println!(
        "Page {} of {} ({} records)",
        page.page_number, page.total_pages, page.total_items
    );
}
