//! dispatch-preview — 对定时邮件执行一次演练发送（不会真正发信）
//!
//! Usage:
//!   dispatch-preview <emails.json> [--config <file.yaml>] [--now <unix-seconds>] [--reject <email>]...
//!
//! Reads a JSON array of scheduled emails, runs one dispatch pass with a
//! logging-only sender, and prints the updated records plus the run summary.

use anyhow::{bail, Context, Result};
use campaign_dispatch::batch::BatchRunConfig;
use campaign_dispatch::dispatch::{Dispatcher, DryRunSender, ScheduledEmail};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

struct Args {
    emails: PathBuf,
    config: Option<PathBuf>,
    now: Option<u64>,
    reject: Vec<String>,
}

fn print_usage() {
    println!(
        r#"dispatch-preview — dry-run one scheduled dispatch pass

USAGE:
    dispatch-preview <emails.json> [OPTIONS]

OPTIONS:
    --config <file.yaml>    Batch run configuration
    --now <unix-seconds>    Treat this instant as the current time
    --reject <email>        Simulate a provider rejection for this recipient
    -h, --help              Show this help message

ENVIRONMENT:
    CAMPAIGN_BATCH_SIZE, CAMPAIGN_BATCH_DELAY_MS,
    CAMPAIGN_LARGE_VOLUME, CAMPAIGN_ITEM_TIMEOUT_MS
    RUST_LOG                Log filter (default: info)"#
    );
}

fn parse_args(raw: &[String]) -> Result<Option<Args>> {
    let mut emails = None;
    let mut config = None;
    let mut now = None;
    let mut reject = Vec::new();

    let mut it = raw.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                config = Some(PathBuf::from(it.next().context("--config needs a path")?));
            }
            "--now" => {
                let v = it.next().context("--now needs a value")?;
                now = Some(v.parse().with_context(|| format!("invalid --now: {v}"))?);
            }
            "--reject" => reject.push(it.next().context("--reject needs an address")?.clone()),
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            other => {
                if emails.is_some() {
                    bail!("unexpected argument: {other}");
                }
                emails = Some(PathBuf::from(other));
            }
        }
    }

    let emails = emails.context("missing <emails.json>")?;
    Ok(Some(Args {
        emails,
        config,
        now,
        reject,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&raw)? else {
        print_usage();
        return Ok(());
    };

    let config = match &args.config {
        Some(path) => BatchRunConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BatchRunConfig::default(),
    }
    .with_env_overrides();

    let body = std::fs::read_to_string(&args.emails)
        .with_context(|| format!("reading {}", args.emails.display()))?;
    let mut emails: Vec<ScheduledEmail> =
        serde_json::from_str(&body).context("parsing scheduled emails")?;

    let now = match args.now {
        Some(n) => n,
        None => SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
    };

    let sender = args
        .reject
        .into_iter()
        .fold(DryRunSender::new(), |s, r| s.reject(r));
    let dispatcher = Dispatcher::new(sender, config).on_batch_complete(|e| {
        tracing::info!(
            "batch {}/{}: {} sent, {} failed",
            e.batch_number,
            e.total_batches,
            e.succeeded,
            e.failed
        );
    });

    let report = dispatcher.dispatch_due(&mut emails, now).await?;

    let out = serde_json::json!({
        "emails": emails,
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
