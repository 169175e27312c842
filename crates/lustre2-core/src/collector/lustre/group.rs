//! Pattern groups: compiled patterns bound to the grammar that reads them.

use tracing::warn;

use super::fields::{FieldMapping, MDS_JOBSTATS, MDS_STATS, OST_JOBSTATS, OST_STATS};
use super::path::PathPattern;

/// The three independently configured groups of statistics files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Object storage targets (obdfilter, osd-*).
    ObjectStorage,
    /// Metadata targets (mdt).
    MetadataServer,
    /// LNet message counters.
    NetworkTransport,
}

impl GroupKind {
    /// All groups, in collection order.
    pub const ALL: [GroupKind; 3] = [
        GroupKind::ObjectStorage,
        GroupKind::MetadataServer,
        GroupKind::NetworkTransport,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GroupKind::ObjectStorage => "ost",
            GroupKind::MetadataServer => "mds",
            GroupKind::NetworkTransport => "lnet",
        }
    }
}

/// File grammar, chosen per pattern when the group is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// lprocfs `stats` / `md_stats` of a target.
    Stats,
    /// lprocfs stats of one client under `exports/<nid>/`.
    ClientStats,
    /// Per-job blocks of `job_stats`.
    JobStats,
    /// The single lnet counters line.
    Lnet,
}

impl Grammar {
    /// Selects the grammar for `pattern` within a group of `kind`.
    pub fn select(kind: GroupKind, pattern: &PathPattern) -> Self {
        if kind == GroupKind::NetworkTransport {
            Grammar::Lnet
        } else if pattern.file_name() == "job_stats" {
            Grammar::JobStats
        } else if pattern.has_exports() {
            Grammar::ClientStats
        } else {
            Grammar::Stats
        }
    }

    /// Field mapping applied to files of this grammar in a group of `kind`.
    ///
    /// Lnet is positional and has no table.
    pub fn field_table(&self, kind: GroupKind) -> &'static [FieldMapping] {
        match (kind, self) {
            (_, Grammar::Lnet) | (GroupKind::NetworkTransport, _) => &[],
            (GroupKind::ObjectStorage, Grammar::JobStats) => OST_JOBSTATS,
            (GroupKind::ObjectStorage, _) => OST_STATS,
            (GroupKind::MetadataServer, Grammar::JobStats) => MDS_JOBSTATS,
            (GroupKind::MetadataServer, _) => MDS_STATS,
        }
    }
}

/// A pattern together with the grammar used for the files it matches.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub pattern: PathPattern,
    pub grammar: Grammar,
}

/// The compiled, read-only patterns of one group.
#[derive(Debug, Clone)]
pub struct PatternGroup {
    kind: GroupKind,
    patterns: Vec<CompiledPattern>,
    invalid: usize,
}

impl PatternGroup {
    /// Compiles `patterns` for a group of `kind`.
    ///
    /// Invalid patterns are logged and left out; the rest of the group is
    /// still usable.
    pub fn compile<S: AsRef<str>>(kind: GroupKind, patterns: &[S]) -> Self {
        let mut compiled = Vec::with_capacity(patterns.len());
        let mut invalid = 0;

        for raw in patterns {
            let raw = raw.as_ref();
            match PathPattern::new(raw) {
                Ok(pattern) => {
                    let grammar = Grammar::select(kind, &pattern);
                    compiled.push(CompiledPattern { pattern, grammar });
                }
                Err(e) => {
                    warn!(group = kind.label(), pattern = raw, error = %e,
                        "skipping invalid pattern");
                    invalid += 1;
                }
            }
        }

        Self {
            kind,
            patterns: compiled,
            invalid,
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Number of configured patterns that failed to compile.
    pub fn invalid(&self) -> usize {
        self.invalid
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_selection() {
        let group = PatternGroup::compile(
            GroupKind::ObjectStorage,
            &[
                "/proc/fs/lustre/obdfilter/*/stats",
                "/proc/fs/lustre/obdfilter/*/job_stats",
                "/proc/fs/lustre/obdfilter/*/exports/*/stats",
            ],
        );
        let grammars: Vec<_> = group.patterns().iter().map(|p| p.grammar).collect();
        assert_eq!(
            grammars,
            vec![Grammar::Stats, Grammar::JobStats, Grammar::ClientStats]
        );
    }

    #[test]
    fn test_lnet_group_always_lnet() {
        let group = PatternGroup::compile(
            GroupKind::NetworkTransport,
            &["/sys/kernel/debug/lnet/stats"],
        );
        assert_eq!(group.patterns()[0].grammar, Grammar::Lnet);
        assert!(Grammar::Lnet.field_table(GroupKind::NetworkTransport).is_empty());
    }

    #[test]
    fn test_field_table_by_group() {
        assert_eq!(
            Grammar::JobStats.field_table(GroupKind::MetadataServer),
            MDS_JOBSTATS
        );
        assert_eq!(
            Grammar::ClientStats.field_table(GroupKind::ObjectStorage),
            OST_STATS
        );
        assert_eq!(
            Grammar::Stats.field_table(GroupKind::MetadataServer),
            MDS_STATS
        );
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let group = PatternGroup::compile(
            GroupKind::MetadataServer,
            &["/proc/fs/lustre/mdt/[/md_stats", "/proc/fs/lustre/mdt/*/md_stats"],
        );
        assert_eq!(group.patterns().len(), 1);
        assert_eq!(group.invalid(), 1);
        assert_eq!(group.kind(), GroupKind::MetadataServer);
    }

    #[test]
    fn test_empty_group() {
        let group = PatternGroup::compile::<String>(GroupKind::ObjectStorage, &[]);
        assert!(group.is_empty());
        assert_eq!(group.invalid(), 0);
    }
}
