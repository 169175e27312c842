//! Parsers for Lustre statistics files.
//!
//! These are pure functions over the full content of one file. A line or
//! job block that does not match its grammar is skipped (and logged at
//! debug level); the rest of the file is still parsed.
//!
//! Three layouts are understood:
//!
//! ```text
//! # lprocfs stats (obdfilter, osd-*, mdt md_stats, exports/*/stats)
//! snapshot_time             1438693064.430544 secs.usecs
//! read_bytes                203238095 samples [bytes] 4096 1048576 78026117632000
//! getattr                   1503663097 samples [reqs]
//!
//! # job_stats
//! job_stats:
//! - job_id:          testjob2
//!   snapshot_time:   1461772761
//!   read_bytes:      { samples: 1, unit: bytes, min: 1024, max: 1024, sum: 1024 }
//!   punch:           { samples: 1, unit: reqs }
//!
//! # lnet stats
//! 0 7 0 20481 28239 0 0 8892268623 8225856 0 0
//! ```

use tracing::debug;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// One counter line, either from an lprocfs stats file or from a job block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatLine {
    /// Lower-cased statistic name (`read_bytes`, `getattr`).
    pub name: String,
    /// Number of samples (calls).
    pub samples: u64,
    /// Unit without brackets (`bytes`, `reqs`, `usec`), if given.
    pub unit: Option<String>,
    /// Size columns, present only for statistics that track an amount.
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub sum: Option<u64>,
}

/// A `- job_id:` block of a job_stats file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobBlock {
    pub job_id: String,
    pub stats: Vec<StatLine>,
}

/// Counters from `/sys/kernel/debug/lnet/stats`, in file order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LnetStats {
    pub msgs_alloc: u64,
    pub msgs_max: u64,
    pub rst_alloc: u64,
    pub send_count: u64,
    pub recv_count: u64,
    pub route_count: u64,
    pub drop_count: u64,
    pub send_length: u64,
    pub recv_length: u64,
    pub route_length: u64,
    pub drop_length: u64,
}

/// Number of counters on the lnet stats line.
pub const LNET_FIELD_COUNT: usize = 11;

impl LnetStats {
    /// Field names and values, prefixed `lnet_`.
    pub fn fields(&self) -> [(&'static str, u64); LNET_FIELD_COUNT] {
        [
            ("lnet_msgs_alloc", self.msgs_alloc),
            ("lnet_msgs_max", self.msgs_max),
            ("lnet_rst_alloc", self.rst_alloc),
            ("lnet_send_count", self.send_count),
            ("lnet_recv_count", self.recv_count),
            ("lnet_route_count", self.route_count),
            ("lnet_drop_count", self.drop_count),
            ("lnet_send_length", self.send_length),
            ("lnet_recv_length", self.recv_length),
            ("lnet_route_length", self.route_length),
            ("lnet_drop_length", self.drop_length),
        ]
    }
}

fn parse_u64(token: &str, what: &str) -> Result<u64, ParseError> {
    token
        .parse()
        .map_err(|_| ParseError::new(format!("invalid {}: {:?}", what, token)))
}

/// Parses one lprocfs stats line.
///
/// Format: `<name> <samples> samples [<unit>] [<min> <max> <sum> [<sumsq>]]`
///
/// Returns `Ok(None)` for lines that are not sample lines (`snapshot_time`,
/// headers, blank lines) and an error for sample lines with bad numbers.
pub fn parse_stat_line(line: &str) -> Result<Option<StatLine>, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 || fields[2] != "samples" {
        return Ok(None);
    }

    let samples = parse_u64(fields[1], "sample count")?;
    let unit = fields
        .get(3)
        .and_then(|u| u.strip_prefix('['))
        .and_then(|u| u.strip_suffix(']'))
        .map(str::to_string);

    let (min, max, sum) = if fields.len() >= 7 {
        (
            Some(parse_u64(fields[4], "min")?),
            Some(parse_u64(fields[5], "max")?),
            Some(parse_u64(fields[6], "sum")?),
        )
    } else {
        (None, None, None)
    };

    Ok(Some(StatLine {
        name: fields[0].to_lowercase(),
        samples,
        unit,
        min,
        max,
        sum,
    }))
}

/// Parses an lprocfs stats file (also used for per-export stats).
pub fn parse_stats(content: &str) -> Vec<StatLine> {
    let mut stats = Vec::new();
    for line in content.lines() {
        match parse_stat_line(line) {
            Ok(Some(stat)) => stats.push(stat),
            Ok(None) => {}
            Err(e) => debug!(line, error = %e, "skipping stats line"),
        }
    }
    stats
}

/// Parses one job_stats metric line.
///
/// Format: `<name>: { samples: <n>, unit: <u>[, min: <a>, max: <b>, sum: <c>, ...] }`
///
/// Returns `Ok(None)` for lines without a `{ ... }` body (`snapshot_time`,
/// `start_time`, ...).
pub fn parse_job_stat_line(line: &str) -> Result<Option<StatLine>, ParseError> {
    let Some((name, body)) = line.split_once(':') else {
        return Ok(None);
    };
    let body = body.trim();
    if !body.starts_with('{') {
        return Ok(None);
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::new("missing metric name"));
    }

    // Flatten `{ samples: 1, unit: bytes, min: 4096, ... }` into key/value
    // tokens. Nested histograms (`hist: { 1: 0, 2: 5 }`) only contribute
    // numeric keys and are ignored.
    let tokens: Vec<&str> = body
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | '{' | '}'))
        .filter(|t| !t.is_empty())
        .collect();

    let value_of = |key: &str| -> Option<&str> {
        tokens
            .iter()
            .position(|t| *t == key)
            .and_then(|i| tokens.get(i + 1).copied())
    };
    let number_of = |key: &str| -> Result<Option<u64>, ParseError> {
        value_of(key).map(|v| parse_u64(v, key)).transpose()
    };

    let samples = number_of("samples")?
        .ok_or_else(|| ParseError::new(format!("missing samples for {}", name)))?;

    Ok(Some(StatLine {
        name: name.to_lowercase(),
        samples,
        unit: value_of("unit").map(str::to_string),
        min: number_of("min")?,
        max: number_of("max")?,
        sum: number_of("sum")?,
    }))
}

/// Extracts the job id from a `- job_id: <id>` line.
fn job_id_of(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('-')?;
    let id = rest.trim_start().strip_prefix("job_id:")?.trim();
    let id = id
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(id);
    Some(id)
}

/// Parses a job_stats file into one block per job.
///
/// Lines before the first `- job_id:` (the `job_stats:` header) are ignored.
/// A block with an empty job id is dropped.
pub fn parse_job_stats(content: &str) -> Vec<JobBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<JobBlock> = None;

    for line in content.lines() {
        if let Some(job_id) = job_id_of(line) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            if job_id.is_empty() {
                debug!(line, "skipping job block without job_id");
                continue;
            }
            current = Some(JobBlock {
                job_id: job_id.to_string(),
                stats: Vec::new(),
            });
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };
        match parse_job_stat_line(line) {
            Ok(Some(stat)) => block.stats.push(stat),
            Ok(None) => {}
            Err(e) => debug!(job_id = %block.job_id, line, error = %e, "skipping job_stats line"),
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

/// Parses `/sys/kernel/debug/lnet/stats`.
///
/// The first non-empty line must carry at least [`LNET_FIELD_COUNT`]
/// unsigned integers; extra trailing counters are ignored.
pub fn parse_lnet_stats(content: &str) -> Result<LnetStats, ParseError> {
    let line = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| ParseError::new("empty lnet stats"))?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < LNET_FIELD_COUNT {
        return Err(ParseError::new(format!(
            "not enough fields in lnet stats: expected {}, got {}",
            LNET_FIELD_COUNT,
            fields.len()
        )));
    }

    let mut values = [0u64; LNET_FIELD_COUNT];
    for (value, token) in values.iter_mut().zip(&fields) {
        *value = parse_u64(token, "lnet counter")?;
    }

    Ok(LnetStats {
        msgs_alloc: values[0],
        msgs_max: values[1],
        rst_alloc: values[2],
        send_count: values[3],
        recv_count: values[4],
        route_count: values[5],
        drop_count: values[6],
        send_length: values[7],
        recv_length: values[8],
        route_length: values[9],
        drop_length: values[10],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::scenarios::{
        LNET_STATS, MDT_JOB_STATS, OBDFILTER_JOB_STATS, OBDFILTER_STATS, OSD_LDISKFS_STATS,
    };

    #[test]
    fn test_parse_stat_line_with_sizes() {
        let stat = parse_stat_line(
            "read_bytes                203238095 samples [bytes] 4096 1048576 78026117632000",
        )
        .unwrap()
        .unwrap();
        assert_eq!(stat.name, "read_bytes");
        assert_eq!(stat.samples, 203238095);
        assert_eq!(stat.unit.as_deref(), Some("bytes"));
        assert_eq!(stat.min, Some(4096));
        assert_eq!(stat.max, Some(1048576));
        assert_eq!(stat.sum, Some(78026117632000));
    }

    #[test]
    fn test_parse_stat_line_without_sizes() {
        let stat = parse_stat_line("getattr                   1503663097 samples [reqs]")
            .unwrap()
            .unwrap();
        assert_eq!(stat.samples, 1503663097);
        assert_eq!(stat.sum, None);
        assert_eq!(stat.min, None);
    }

    #[test]
    fn test_parse_stat_line_lowercases_name() {
        let stat = parse_stat_line("GetAttr 3 samples [reqs]").unwrap().unwrap();
        assert_eq!(stat.name, "getattr");
    }

    #[test]
    fn test_parse_stat_line_sumsq_column_ignored() {
        let stat = parse_stat_line(
            "get_page                  275132812 samples [usec] 0 3147 1320420955 22041662259",
        )
        .unwrap()
        .unwrap();
        assert_eq!(stat.sum, Some(1320420955));
    }

    #[test]
    fn test_parse_stat_line_skips_non_sample_lines() {
        assert_eq!(
            parse_stat_line("snapshot_time             1438693064.430544 secs.usecs").unwrap(),
            None
        );
        assert_eq!(parse_stat_line("").unwrap(), None);
        assert_eq!(parse_stat_line("job_stats:").unwrap(), None);
    }

    #[test]
    fn test_parse_stat_line_bad_number() {
        assert!(parse_stat_line("open -5 samples [reqs]").is_err());
        assert!(parse_stat_line("read_bytes 1 samples [bytes] 1 x 3").is_err());
    }

    #[test]
    fn test_parse_stats_partial_file() {
        let content = "\
snapshot_time 1438693064.430544 secs.usecs
open 12 samples [reqs]
close garbage samples [reqs]
mkdir 3 samples [reqs]
";
        let stats = parse_stats(content);
        let names: Vec<_> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["open", "mkdir"]);
    }

    #[test]
    fn test_parse_stats_fixtures() {
        let obdfilter = parse_stats(OBDFILTER_STATS);
        assert_eq!(obdfilter.len(), 17);
        let write = obdfilter.iter().find(|s| s.name == "write_bytes").unwrap();
        assert_eq!(write.samples, 71893382);
        assert_eq!(write.sum, Some(15201500833981));

        let osd = parse_stats(OSD_LDISKFS_STATS);
        let hit = osd.iter().find(|s| s.name == "cache_hit").unwrap();
        assert_eq!(hit.samples, 7393729777);
    }

    #[test]
    fn test_parse_job_stat_line() {
        let stat = parse_job_stat_line(
            "  write_bytes:     { samples:          25, unit: bytes, min: 1048576, max: 16777216, sum:        26214400 }",
        )
        .unwrap()
        .unwrap();
        assert_eq!(stat.name, "write_bytes");
        assert_eq!(stat.samples, 25);
        assert_eq!(stat.unit.as_deref(), Some("bytes"));
        assert_eq!(stat.min, Some(1048576));
        assert_eq!(stat.max, Some(16777216));
        assert_eq!(stat.sum, Some(26214400));
    }

    #[test]
    fn test_parse_job_stat_line_with_histogram() {
        let stat = parse_job_stat_line(
            "  read:  { samples: 4, unit: usecs, min: 10, max: 40, sum: 100, sumsq: 3000, hist: { 1: 0, 2: 4 } }",
        )
        .unwrap()
        .unwrap();
        assert_eq!(stat.samples, 4);
        assert_eq!(stat.sum, Some(100));
    }

    #[test]
    fn test_parse_job_stat_line_non_metric() {
        assert_eq!(
            parse_job_stat_line("  snapshot_time:   1461772761").unwrap(),
            None
        );
        assert!(parse_job_stat_line("  open: { unit: reqs }").is_err());
    }

    #[test]
    fn test_parse_job_stats_blocks() {
        let blocks = parse_job_stats(MDT_JOB_STATS);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].job_id, "cluster-testjob1");
        assert_eq!(blocks[1].job_id, "testjob2");
        assert_eq!(blocks[1].stats.len(), 16);
        let mkdir = blocks[1].stats.iter().find(|s| s.name == "mkdir").unwrap();
        assert_eq!(mkdir.samples, 200);
    }

    #[test]
    fn test_parse_job_stats_is_restartable() {
        let first = parse_job_stats(OBDFILTER_JOB_STATS);
        let second = parse_job_stats(OBDFILTER_JOB_STATS);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_parse_job_stats_skips_bad_lines_and_empty_ids() {
        let content = "\
job_stats:
- job_id:
  open:            { samples:           5, unit:  reqs }
- job_id:          \"dd.1000\"
  open:            { samples:         bad, unit:  reqs }
  close:           { samples:           4, unit:  reqs }
";
        let blocks = parse_job_stats(content);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].job_id, "dd.1000");
        assert_eq!(blocks[0].stats.len(), 1);
        assert_eq!(blocks[0].stats[0].name, "close");
    }

    #[test]
    fn test_parse_job_stats_empty() {
        assert!(parse_job_stats("job_stats:\n").is_empty());
        assert!(parse_job_stats("").is_empty());
    }

    #[test]
    fn test_parse_lnet_stats_fixture() {
        let stats = parse_lnet_stats(LNET_STATS).unwrap();
        assert_eq!(stats.msgs_max, 7);
        assert_eq!(stats.send_count, 20481);
        assert_eq!(stats.recv_count, 28239);
        assert_eq!(stats.send_length, 8892268623);
        assert_eq!(stats.recv_length, 8225856);
    }

    #[test]
    fn test_parse_lnet_stats_positional() {
        let stats = parse_lnet_stats("0 6 0 1420 1420 0 0 1004048 1004048 0 0").unwrap();
        let fields = stats.fields();
        assert_eq!(fields.len(), LNET_FIELD_COUNT);
        assert_eq!(fields[0], ("lnet_msgs_alloc", 0));
        assert_eq!(fields[1], ("lnet_msgs_max", 6));
        assert_eq!(fields[3], ("lnet_send_count", 1420));
        assert_eq!(fields[4], ("lnet_recv_count", 1420));
        assert_eq!(fields[7], ("lnet_send_length", 1004048));
        assert_eq!(fields[10], ("lnet_drop_length", 0));
    }

    #[test]
    fn test_parse_lnet_stats_errors() {
        assert!(parse_lnet_stats("").is_err());
        assert!(parse_lnet_stats("0 6 0 1420").is_err());
        assert!(parse_lnet_stats("0 6 0 1420 1420 0 0 x 1004048 0 0").is_err());
    }

    #[test]
    fn test_parse_lnet_stats_ignores_extra_counters() {
        let stats = parse_lnet_stats("1 2 3 4 5 6 7 8 9 10 11 12 13").unwrap();
        assert_eq!(stats.msgs_alloc, 1);
        assert_eq!(stats.drop_length, 11);
    }
}
