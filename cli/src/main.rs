use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use logsearch_engine::{
    Database, EngineConfig, NewLogRecord, SearchEngine, SearchFields, SearchRequest, Sort,
};
use serde::Deserialize;
use std::env;
use std::io::{BufRead, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "logsearch")]
#[command(about = "Log search query engine CLI")]
struct Cli {
    /// SQLite database URL; falls back to DATABASE_URL, then a local file.
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search query
    Search {
        /// Query string, e.g. 'level:error AND service:api'
        query: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long)]
        page_size: Option<i64>,
        #[arg(long, value_enum, default_value_t = SortArg::Newest)]
        sort: SortArg,
        /// Field to facet on; repeatable
        #[arg(long = "facet")]
        facets: Vec<String>,
        /// User recorded in the query history
        #[arg(long)]
        user: Option<String>,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ingest JSON-lines log records from a file or stdin
    Ingest {
        /// Input file; reads stdin when omitted
        file: Option<String>,
    },
    /// Show recent searches
    History {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Newest,
    Oldest,
}

impl From<SortArg> for Sort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Newest => Sort::NewestFirst,
            SortArg::Oldest => Sort::OldestFirst,
        }
    }
}

/// One JSON line of ingest input. `timestamp` is RFC 3339 and defaults to
/// now; `level` defaults to "info".
#[derive(Debug, Deserialize)]
struct IngestLine {
    timestamp: Option<String>,
    level: Option<String>,
    service: String,
    message: String,
    user_id: Option<String>,
    request_id: Option<String>,
}

impl IngestLine {
    fn into_record(self) -> Result<NewLogRecord> {
        let timestamp = match self.timestamp {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .with_context(|| format!("invalid timestamp: {raw}"))?
                .timestamp_nanos_opt()
                .context("timestamp out of range")?,
            None => Utc::now().timestamp_nanos_opt().unwrap_or(0),
        };
        Ok(NewLogRecord {
            timestamp,
            level: self.level.unwrap_or_else(|| "info".to_string()),
            service: self.service,
            message: self.message,
            user_id: self.user_id,
            request_id: self.request_id,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = cli
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:./logs.db?mode=rwc".to_string());
    let database = Database::new(&database_url)
        .await
        .with_context(|| format!("failed to open database at {database_url}"))?;

    match cli.command {
        Commands::Search {
            query,
            page,
            page_size,
            sort,
            facets,
            user,
            json,
        } => {
            let engine = SearchEngine::new(
                database,
                SearchFields::default(),
                EngineConfig::from_env(),
                None,
            );
            let request = SearchRequest {
                query,
                page,
                page_size,
                sort: sort.into(),
                facets,
                user_id: user,
            };
            let response = engine.search(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }

            let page = &response.page;
            println!(
                "{} matched, page {} ({} rows, {}ms)",
                page.total_matched,
                page.page,
                page.items.len(),
                page.took_ms
            );
            for item in &page.items {
                println!(
                    "{}  {:8}  {:12}  {}",
                    format_ns(item.timestamp),
                    item.level,
                    item.service,
                    item.message
                );
            }
            for facet in &response.facets {
                println!();
                println!("{} ({} distinct):", facet.field, facet.total_distinct);
                for bucket in &facet.buckets {
                    println!("  {:6}  {}", bucket.count, bucket.value);
                }
            }
        }

        Commands::Ingest { file } => {
            let reader: Box<dyn BufRead> = match file {
                Some(path) => Box::new(BufReader::new(
                    std::fs::File::open(&path)
                        .with_context(|| format!("failed to open {path}"))?,
                )),
                None => Box::new(BufReader::new(std::io::stdin())),
            };

            let mut records = Vec::new();
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let parsed: IngestLine =
                    serde_json::from_str(&line).with_context(|| format!("bad record: {line}"))?;
                records.push(parsed.into_record()?);
            }

            let inserted = database.insert_logs(&records).await?;
            println!("ingested {inserted} records");
        }

        Commands::History { limit } => {
            for row in database.query_history(limit).await? {
                println!(
                    "{}  {:4}  {:5}ms  {:6} rows  {}",
                    format_ns(row.created_at_ns),
                    row.cache_status,
                    row.execution_time_ms,
                    row.result_count,
                    row.query_string
                );
            }
        }
    }

    Ok(())
}

fn format_ns(ns: i64) -> String {
    Utc.timestamp_nanos(ns)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
