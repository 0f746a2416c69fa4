// ABOUTME: CLI for running board/feed extractions and NEIS queries.
// ABOUTME: Prints extraction results (and optional post details) as JSON for inspection.

use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;
use signage_extract::{ColumnProfile, Extractor, SourceFormat};
use signage_neis::NeisClient;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "signage-cli")]
#[command(about = "Extract school-site board, feed, and NEIS data as JSON", long_about = None)]
struct Args {
    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract records from a board page or RSS/Atom feed URL.
    Board {
        url: String,

        /// Human-readable source label (defaults to the URL's host).
        #[arg(long)]
        label: Option<String>,

        /// Keep only the first N records.
        #[arg(long)]
        max_records: Option<usize>,

        /// Extraction strategy: auto (default), feed, board.
        #[arg(long, default_value = "auto")]
        format: String,

        /// Column profile for board tables: auto (default), rich, minimal.
        #[arg(long, default_value = "auto")]
        profile: String,

        /// Request timeout in seconds.
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// Also fetch each record's detail page (album flow).
        #[arg(long, default_value_t = false)]
        details: bool,
    },

    /// Fetch meal-service rows from the NEIS API.
    Meals {
        /// NEIS API key.
        #[arg(long)]
        key: String,

        /// Education-office code, e.g. J10.
        #[arg(long, default_value = "J10")]
        office_code: String,

        /// NEIS school code.
        #[arg(long)]
        school_code: String,

        /// Range start, YYYY-MM-DD.
        #[arg(long)]
        from: NaiveDate,

        /// Range end, YYYY-MM-DD.
        #[arg(long)]
        to: NaiveDate,
    },

    /// Fetch one month of the academic calendar from the NEIS API.
    Schedule {
        /// NEIS API key.
        #[arg(long)]
        key: String,

        /// Education-office code, e.g. J10.
        #[arg(long, default_value = "J10")]
        office_code: String,

        /// NEIS school code.
        #[arg(long)]
        school_code: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,
    },
}

fn parse_source_format(s: &str) -> Result<SourceFormat> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(SourceFormat::Auto),
        "feed" | "rss" => Ok(SourceFormat::Feed),
        "board" | "table" => Ok(SourceFormat::Board),
        other => Err(anyhow!("unknown format: {}", other)),
    }
}

fn parse_column_profile(s: &str) -> Result<ColumnProfile> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(ColumnProfile::Auto),
        "rich" => Ok(ColumnProfile::Rich),
        "minimal" => Ok(ColumnProfile::Minimal),
        other => Err(anyhow!("unknown profile: {}", other)),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &serde_json::Value, compact: bool) -> Result<()> {
    let output = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    match args.command {
        Command::Board {
            url,
            label,
            max_records,
            format,
            profile,
            timeout,
            details,
        } => {
            let extractor = Extractor::builder()
                .format(parse_source_format(&format)?)
                .profile(parse_column_profile(&profile)?)
                .timeout(Duration::from_secs(timeout))
                .build();

            let result = extractor.extract(&url, label.as_deref(), max_records).await;

            if details {
                let post_details = extractor.fetch_details(&result).await;
                print_json(
                    &json!({ "result": result, "details": post_details }),
                    args.compact,
                )?;
            } else {
                print_json(&serde_json::to_value(&result)?, args.compact)?;
            }
        }

        Command::Meals {
            key,
            office_code,
            school_code,
            from,
            to,
        } => {
            let client = NeisClient::builder()
                .api_key(key)
                .office_code(office_code)
                .school_code(school_code)
                .build();
            let days = client.meals(from, to).await?;
            print_json(&serde_json::to_value(&days)?, args.compact)?;
        }

        Command::Schedule {
            key,
            office_code,
            school_code,
            year,
            month,
        } => {
            let client = NeisClient::builder()
                .api_key(key)
                .office_code(office_code)
                .school_code(school_code)
                .build();
            let events = client.monthly_schedule(year, month).await?;
            print_json(&serde_json::to_value(&events)?, args.compact)?;
        }
    }

    Ok(())
}
