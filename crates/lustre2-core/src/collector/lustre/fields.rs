//! Mapping from parsed statistics to reported field names.
//!
//! Each table lists the statistics collected for one kind of file; any
//! statistic not listed is skipped. A statistic may appear several times to
//! report several of its columns.

use crate::model::FieldSet;

use super::parser::StatLine;

/// Column of a [`StatLine`] to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Samples,
    Min,
    Max,
    Sum,
}

/// Reports `column` of statistic `stat` as field `report_as`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub stat: &'static str,
    pub column: Column,
    pub report_as: &'static str,
}

const fn samples(stat: &'static str, report_as: &'static str) -> FieldMapping {
    FieldMapping {
        stat,
        column: Column::Samples,
        report_as,
    }
}

const fn column(stat: &'static str, column: Column, report_as: &'static str) -> FieldMapping {
    FieldMapping {
        stat,
        column,
        report_as,
    }
}

/// obdfilter and osd-* `stats`, and obdfilter `exports/*/stats`.
pub const OST_STATS: &[FieldMapping] = &[
    column("write_bytes", Column::Sum, "write_bytes"),
    samples("write_bytes", "write_calls"),
    column("read_bytes", Column::Sum, "read_bytes"),
    samples("read_bytes", "read_calls"),
    samples("cache_hit", "cache_hit"),
    samples("cache_miss", "cache_miss"),
    samples("cache_access", "cache_access"),
];

/// obdfilter `job_stats`.
pub const OST_JOBSTATS: &[FieldMapping] = &[
    samples("read_bytes", "jobstats_read_calls"),
    column("read_bytes", Column::Min, "jobstats_read_min_size"),
    column("read_bytes", Column::Max, "jobstats_read_max_size"),
    column("read_bytes", Column::Sum, "jobstats_read_bytes"),
    samples("write_bytes", "jobstats_write_calls"),
    column("write_bytes", Column::Min, "jobstats_write_min_size"),
    column("write_bytes", Column::Max, "jobstats_write_max_size"),
    column("write_bytes", Column::Sum, "jobstats_write_bytes"),
    samples("getattr", "jobstats_ost_getattr"),
    samples("setattr", "jobstats_ost_setattr"),
    samples("punch", "jobstats_punch"),
    samples("sync", "jobstats_ost_sync"),
    samples("destroy", "jobstats_destroy"),
    samples("create", "jobstats_create"),
    samples("statfs", "jobstats_ost_statfs"),
    samples("get_info", "jobstats_get_info"),
    samples("set_info", "jobstats_set_info"),
    samples("quotactl", "jobstats_quotactl"),
];

/// mdt `md_stats` and mdt `exports/*/stats`.
pub const MDS_STATS: &[FieldMapping] = &[
    samples("open", "open"),
    samples("close", "close"),
    samples("mknod", "mknod"),
    samples("link", "link"),
    samples("unlink", "unlink"),
    samples("mkdir", "mkdir"),
    samples("rmdir", "rmdir"),
    samples("rename", "rename"),
    samples("getattr", "getattr"),
    samples("setattr", "setattr"),
    samples("getxattr", "getxattr"),
    samples("setxattr", "setxattr"),
    samples("statfs", "statfs"),
    samples("sync", "sync"),
    samples("samedir_rename", "samedir_rename"),
    samples("crossdir_rename", "crossdir_rename"),
];

/// mdt `job_stats`.
pub const MDS_JOBSTATS: &[FieldMapping] = &[
    samples("open", "jobstats_open"),
    samples("close", "jobstats_close"),
    samples("mknod", "jobstats_mknod"),
    samples("link", "jobstats_link"),
    samples("unlink", "jobstats_unlink"),
    samples("mkdir", "jobstats_mkdir"),
    samples("rmdir", "jobstats_rmdir"),
    samples("rename", "jobstats_rename"),
    samples("getattr", "jobstats_getattr"),
    samples("setattr", "jobstats_setattr"),
    samples("getxattr", "jobstats_getxattr"),
    samples("setxattr", "jobstats_setxattr"),
    samples("statfs", "jobstats_statfs"),
    samples("sync", "jobstats_sync"),
    samples("samedir_rename", "jobstats_samedir_rename"),
    samples("crossdir_rename", "jobstats_crossdir_rename"),
];

impl FieldMapping {
    /// Value of the mapped column, if the line carries it.
    pub fn value(&self, stat: &StatLine) -> Option<u64> {
        match self.column {
            Column::Samples => Some(stat.samples),
            Column::Min => stat.min,
            Column::Max => stat.max,
            Column::Sum => stat.sum,
        }
    }
}

/// Builds the field set for `stats` according to `table`.
///
/// Statistics without a mapping are skipped, as are size columns missing
/// from the line.
pub fn map_fields(table: &[FieldMapping], stats: &[StatLine]) -> FieldSet {
    let mut fields = FieldSet::new();
    for stat in stats {
        for mapping in table.iter().filter(|m| m.stat == stat.name) {
            if let Some(value) = mapping.value(stat) {
                fields.insert(mapping.report_as, value);
            }
        }
    }
    fields
}
