//! lustre2d - Lustre server statistics collector daemon.
//!
//! Polls the Lustre `/proc` and debugfs statistics of the local server and
//! writes every merged record as one JSON object per line to stdout.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use lustre2_core::collector::lustre::GroupKind;
use lustre2_core::collector::{CycleStats, FileSystem, Lustre2Collector, RealFs};
use lustre2_core::config::{ConfigError, Lustre2Config};
use lustre2_core::model::{FieldSet, TagSet};
use lustre2_core::sink::MetricSink;

/// Lustre server statistics collector daemon.
#[derive(Parser, Debug)]
#[command(name = "lustre2d", about = "Lustre server statistics collector", version)]
struct Args {
    /// TOML file with ost_procfiles / mds_procfiles / lnet_procfiles.
    /// Without it the stock Lustre 2.x locations are used.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Run a single collection cycle and exit.
    #[arg(long)]
    once: bool,

    /// Directory prepended to every pattern (for captured trees).
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr, stdout carries the records.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("lustre2d={}", level).parse().unwrap())
        .add_directive(format!("lustre2_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Builds the collector configuration from the command line.
fn load_config(args: &Args) -> Result<Lustre2Config, ConfigError> {
    let config = match &args.config {
        Some(path) => Lustre2Config::from_file(path)?,
        None => Lustre2Config::with_default_paths(),
    };
    Ok(match &args.root {
        Some(root) => config.with_root(root),
        None => config,
    })
}

/// One output line.
#[derive(Serialize)]
struct JsonLine<'a> {
    measurement: &'a str,
    timestamp: &'a str,
    tags: &'a TagSet,
    fields: &'a FieldSet,
}

/// Writes records as JSON lines, stamped with the time of the current cycle.
struct JsonLinesSink<W: Write> {
    out: W,
    timestamp: String,
    written: usize,
    failed: usize,
}

impl<W: Write> JsonLinesSink<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            timestamp: String::new(),
            written: 0,
            failed: 0,
        }
    }

    /// Sets the timestamp of the records emitted next.
    fn start_cycle(&mut self, now: DateTime<Utc>) {
        self.timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn write_line(&mut self, line: &JsonLine<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, line)?;
        self.out.write_all(b"\n")
    }
}

impl<W: Write> MetricSink for JsonLinesSink<W> {
    fn emit(&mut self, measurement: &str, tags: TagSet, fields: FieldSet) {
        let timestamp = self.timestamp.clone();
        let line = JsonLine {
            measurement,
            timestamp: &timestamp,
            tags: &tags,
            fields: &fields,
        };
        match self.write_line(&line) {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!(tags = %tags, error = %e, "failed to write record");
                self.failed += 1;
            }
        }
    }
}

/// Runs one collection cycle into `sink`.
fn run_cycle<F: FileSystem, W: Write>(
    collector: &mut Lustre2Collector<F>,
    sink: &mut JsonLinesSink<W>,
) -> CycleStats {
    sink.start_cycle(Utc::now());
    let stats = collector.gather(sink);
    if let Err(e) = sink.flush() {
        error!("Failed to flush output: {}", e);
    }
    stats
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("lustre2d {} starting", env!("CARGO_PKG_VERSION"));

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Config: interval={}s, patterns: ost={}, mds={}, lnet={}",
        args.interval,
        config.patterns(GroupKind::ObjectStorage).len(),
        config.patterns(GroupKind::MetadataServer).len(),
        config.patterns(GroupKind::NetworkTransport).len()
    );

    let mut collector = Lustre2Collector::new(RealFs::new(), &config);
    let mut sink = JsonLinesSink::new(BufWriter::new(io::stdout().lock()));

    let interval = Duration::from_secs(args.interval);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mut cycle_count: u64 = 0;

    info!("Starting collection loop");

    while running.load(Ordering::SeqCst) {
        let stats = run_cycle(&mut collector, &mut sink);
        cycle_count += 1;

        info!(
            "Cycle #{}: {} records from {} files ({} skipped) in {:?}",
            cycle_count,
            stats.records_emitted,
            stats.files_collected,
            stats.files_skipped,
            stats.duration
        );
        if stats.field_collisions > 0 {
            warn!(
                "Cycle #{}: {} fields reported by more than one source",
                cycle_count, stats.field_collisions
            );
        }
        debug!("Output: {} lines written, {} failed", sink.written, sink.failed);

        if args.once {
            break;
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lustre2_core::collector::MockFs;
    use lustre2_core::collector::mock::scenarios::TARGET;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["lustre2d"]).unwrap();
        assert_eq!(args.interval, 10);
        assert!(!args.once);
        assert!(args.config.is_none());

        let config = load_config(&args).unwrap();
        assert_eq!(config, Lustre2Config::with_default_paths());
    }

    #[test]
    fn test_load_config_with_root() {
        let args = Args::try_parse_from(["lustre2d", "--root", "/tmp/capture", "--once"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(
            config.lnet_procfiles,
            vec!["/tmp/capture/sys/kernel/debug/lnet/stats".to_string()]
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let args = Args::try_parse_from(["lustre2d", "-c", "/nonexistent/lustre2.toml"]).unwrap();
        assert!(matches!(load_config(&args), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_json_lines_output() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.start_cycle(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

        let fields: FieldSet = [("lnet_msgs_max", 7u64)].into_iter().collect();
        sink.emit("lustre2", TagSet::target("lnet"), fields);
        sink.emit(
            "lustre2",
            TagSet::target("OST0001").with_jobid("testjob2"),
            [("jobstats_open", 6u64)].into_iter().collect(),
        );
        assert_eq!(sink.written, 2);

        let output = String::from_utf8(sink.out).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["measurement"], "lustre2");
        assert_eq!(lines[0]["timestamp"], "2024-05-01T12:00:00.000Z");
        assert_eq!(lines[0]["tags"]["name"], "lnet");
        assert!(lines[0]["tags"].get("jobid").is_none());
        assert_eq!(lines[0]["fields"]["lnet_msgs_max"], 7);
        assert_eq!(lines[1]["tags"]["jobid"], "testjob2");
    }

    #[test]
    fn test_run_cycle_against_mock_server() {
        let mut collector =
            Lustre2Collector::new(MockFs::lustre_server(), &Lustre2Config::with_default_paths());
        let mut sink = JsonLinesSink::new(Vec::new());

        let stats = run_cycle(&mut collector, &mut sink);
        assert_eq!(stats.records_emitted, 4);
        assert_eq!(sink.written, 4);

        let output = String::from_utf8(sink.out).unwrap();
        let target = output
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .find(|v| v["tags"]["name"] == TARGET && v["tags"].get("jobid").is_none())
            .unwrap();
        assert_eq!(target["fields"]["write_calls"], 71893382u64);
        assert_eq!(target["fields"]["cache_hit"], 7393729777u64);
    }
}
