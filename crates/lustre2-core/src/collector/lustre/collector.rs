//! Collection cycle over all configured pattern groups.
//!
//! One cycle is expand → parse → merge → emit. Every group is expanded and
//! parsed on its own scoped worker; the calling thread merges the workers'
//! records in configuration order, so nothing is shared mutably between
//! workers and the output does not depend on scheduling.

use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::collector::traits::FileSystem;
use crate::config::Lustre2Config;
use crate::model::{FieldSet, Record, TagSet};
use crate::sink::{MEASUREMENT, MetricSink};

use super::fields::map_fields;
use super::group::{Grammar, GroupKind, PatternGroup};
use super::merge::RecordMerger;
use super::parser::{parse_job_stats, parse_lnet_stats, parse_stats};
use super::path::target_tags;

/// Tag value of the lnet record.
const LNET_TARGET: &str = "lnet";

/// Error for a single statistics file that could not be collected.
///
/// These never end a cycle: the file simply contributes nothing.
#[derive(Debug)]
pub enum CollectError {
    /// File vanished or could not be read.
    Io(io::Error),
    /// Path does not identify a target.
    NoTarget,
    /// Content does not match the file's grammar.
    Parse(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::NoTarget => write!(f, "path does not name a target"),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<io::Error> for CollectError {
    fn from(e: io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Counters describing the last collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Total cycle time.
    pub duration: Duration,
    /// Patterns dropped at construction because they failed to compile.
    pub invalid_patterns: usize,
    /// Files matched by the patterns.
    pub files_matched: usize,
    /// Files that were read and produced at least one record.
    pub files_collected: usize,
    /// Files that vanished, could not be read or held nothing usable.
    pub files_skipped: usize,
    /// Records produced by the grammars before merging.
    pub records_parsed: usize,
    /// Records after merging (one per unique tag set).
    pub records_emitted: usize,
    /// Fields overwritten because two sources reported the same name.
    pub field_collisions: usize,
}

/// Output of one group's worker.
#[derive(Debug, Default)]
struct GroupOutput {
    records: Vec<Record>,
    files_matched: usize,
    files_collected: usize,
    files_skipped: usize,
}

/// Collects Lustre server statistics.
///
/// Patterns are compiled once; paths are expanded afresh on every cycle
/// since targets, exports and jobs come and go between polls.
pub struct Lustre2Collector<F: FileSystem> {
    fs: F,
    groups: Vec<PatternGroup>,
    last_stats: Option<CycleStats>,
}

impl<F: FileSystem> Lustre2Collector<F> {
    /// Creates a collector for the patterns in `config`.
    ///
    /// Invalid patterns are logged and ignored.
    pub fn new(fs: F, config: &Lustre2Config) -> Self {
        let groups = GroupKind::ALL
            .iter()
            .map(|&kind| PatternGroup::compile(kind, config.patterns(kind)))
            .collect();

        Self {
            fs,
            groups,
            last_stats: None,
        }
    }

    pub fn groups(&self) -> &[PatternGroup] {
        &self.groups
    }

    /// Statistics of the last `collect`/`gather` call.
    pub fn last_stats(&self) -> Option<&CycleStats> {
        self.last_stats.as_ref()
    }

    /// Runs one cycle and returns the merged records, ordered by tags.
    pub fn collect(&mut self) -> Vec<Record> {
        let start = Instant::now();
        let mut stats = CycleStats {
            invalid_patterns: self.groups.iter().map(PatternGroup::invalid).sum(),
            ..Default::default()
        };

        let this: &Self = self;
        let outputs: Vec<GroupOutput> = thread::scope(|scope| {
            let workers: Vec<_> = this
                .groups
                .iter()
                .filter(|group| !group.is_empty())
                .map(|group| (group.kind(), scope.spawn(move || this.collect_group(group))))
                .collect();

            workers
                .into_iter()
                .map(|(kind, worker)| {
                    worker.join().unwrap_or_else(|_| {
                        warn!(group = kind.label(), "collection worker panicked");
                        GroupOutput::default()
                    })
                })
                .collect()
        });

        let mut merger = RecordMerger::new();
        for output in outputs {
            stats.files_matched += output.files_matched;
            stats.files_collected += output.files_collected;
            stats.files_skipped += output.files_skipped;
            stats.records_parsed += output.records.len();
            merger.extend(output.records);
        }
        stats.field_collisions = merger.collisions();

        let records = merger.into_records();
        stats.records_emitted = records.len();
        stats.duration = start.elapsed();
        debug!(
            files = stats.files_matched,
            skipped = stats.files_skipped,
            records = stats.records_emitted,
            collisions = stats.field_collisions,
            elapsed_us = stats.duration.as_micros() as u64,
            "lustre2 collection cycle complete"
        );
        self.last_stats = Some(stats);
        records
    }

    /// Runs one cycle and emits every merged record to `sink`.
    pub fn gather<S: MetricSink + ?Sized>(&mut self, sink: &mut S) -> CycleStats {
        for record in self.collect() {
            sink.emit(MEASUREMENT, record.tags, record.fields);
        }
        self.last_stats.clone().unwrap_or_default()
    }

    fn collect_group(&self, group: &PatternGroup) -> GroupOutput {
        let mut output = GroupOutput::default();

        for compiled in group.patterns() {
            let paths = compiled.pattern.expand(&self.fs);
            trace!(group = group.kind().label(), pattern = compiled.pattern.as_str(),
                matches = paths.len(), "expanded pattern");

            for path in paths {
                output.files_matched += 1;
                match self.collect_file(&path, group.kind(), compiled.grammar) {
                    Ok(records) if !records.is_empty() => {
                        output.files_collected += 1;
                        output.records.extend(records);
                    }
                    Ok(_) => {
                        debug!(path = %path.display(), "no usable statistics in file");
                        output.files_skipped += 1;
                    }
                    Err(CollectError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                        debug!(path = %path.display(), "statistics file vanished");
                        output.files_skipped += 1;
                    }
                    Err(e @ CollectError::Io(_)) => {
                        warn!(path = %path.display(), error = %e, "failed to read statistics file");
                        output.files_skipped += 1;
                    }
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "skipping statistics file");
                        output.files_skipped += 1;
                    }
                }
            }
        }

        output
    }

    /// Reads and parses one file. Records are only returned once the whole
    /// file has been parsed.
    fn collect_file(
        &self,
        path: &Path,
        kind: GroupKind,
        grammar: Grammar,
    ) -> Result<Vec<Record>, CollectError> {
        let bytes = self.fs.read(path)?;
        // Invalid UTF-8 only spoils the line or job id it occurs in.
        let content = String::from_utf8_lossy(&bytes);
        let table = grammar.field_table(kind);

        match grammar {
            Grammar::Lnet => {
                let lnet = parse_lnet_stats(&content).map_err(|e| CollectError::Parse(e.message))?;
                let fields: FieldSet = lnet.fields().into_iter().collect();
                Ok(vec![Record::new(TagSet::target(LNET_TARGET), fields)])
            }
            Grammar::Stats | Grammar::ClientStats => {
                let tags = target_tags(path).ok_or(CollectError::NoTarget)?;
                let fields = map_fields(table, &parse_stats(&content));
                if fields.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![Record::new(tags, fields)])
            }
            Grammar::JobStats => {
                let tags = target_tags(path).ok_or(CollectError::NoTarget)?;
                Ok(parse_job_stats(&content)
                    .into_iter()
                    .filter_map(|job| {
                        let fields = map_fields(table, &job.stats);
                        (!fields.is_empty())
                            .then(|| Record::new(tags.clone().with_jobid(job.job_id), fields))
                    })
                    .collect())
            }
        }
    }
}
