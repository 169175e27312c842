//! Merging of records that describe the same entity.
//!
//! Different files report on the same target: `obdfilter/<t>/stats` and
//! `osd-ldiskfs/<t>/stats` both describe `{name: t}`, and the mdt and
//! obdfilter `job_stats` of `t` both describe `{name: t, jobid: j}`. The
//! merger unions their field sets keyed by tag set.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{FieldSet, Record, TagSet};

/// Accumulates records and unions field sets with equal tags.
///
/// Sources are expected to report disjoint field names. If they do not, the
/// record added last wins and the overwrite is counted in
/// [`collisions`](Self::collisions).
#[derive(Debug, Default)]
pub struct RecordMerger {
    records: BTreeMap<TagSet, FieldSet>,
    collisions: usize,
}

impl RecordMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record, merging it into any record with the same tags.
    pub fn add(&mut self, record: Record) {
        let Record { tags, fields } = record;
        match self.records.get_mut(&tags) {
            Some(existing) => {
                for (name, value) in fields {
                    if let Some(previous) = existing.insert(name.as_str(), value) {
                        debug!(tags = %tags, field = %name, previous, value,
                            "field reported by more than one source, keeping the later value");
                        self.collisions += 1;
                    }
                }
            }
            None => {
                self.records.insert(tags, fields);
            }
        }
    }

    /// Number of distinct tag sets seen so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of fields overwritten by a later source.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Finished records, ordered by tag set.
    pub fn into_records(self) -> Vec<Record> {
        self.records
            .into_iter()
            .map(|(tags, fields)| Record::new(tags, fields))
            .collect()
    }
}

impl Extend<Record> for RecordMerger {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for record in iter {
            self.add(record);
        }
    }
}
