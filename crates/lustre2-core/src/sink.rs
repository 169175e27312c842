//! Destination of finished records.

use crate::model::{FieldSet, Record, TagSet};

/// Measurement name of every record emitted by the collector.
pub const MEASUREMENT: &str = "lustre2";

/// Receives finished records, one call per unique tag set.
pub trait MetricSink {
    fn emit(&mut self, measurement: &str, tags: TagSet, fields: FieldSet);
}

/// A record as received by an [`Accumulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub measurement: String,
    pub tags: TagSet,
    pub fields: FieldSet,
}

/// In-memory sink that keeps everything it receives.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pub metrics: Vec<Metric>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// First metric of `measurement` with exactly `tags`.
    pub fn find(&self, measurement: &str, tags: &TagSet) -> Option<&Metric> {
        self.metrics
            .iter()
            .find(|m| m.measurement == measurement && &m.tags == tags)
    }

    /// Whether a metric with exactly these tags and fields was received.
    pub fn contains_tagged_fields(&self, measurement: &str, tags: &TagSet, fields: &FieldSet) -> bool {
        self.find(measurement, tags)
            .is_some_and(|m| &m.fields == fields)
    }
}

impl MetricSink for Accumulator {
    fn emit(&mut self, measurement: &str, tags: TagSet, fields: FieldSet) {
        self.metrics.push(Metric {
            measurement: measurement.to_string(),
            tags,
            fields,
        });
    }
}

impl MetricSink for Vec<Record> {
    fn emit(&mut self, _measurement: &str, tags: TagSet, fields: FieldSet) {
        self.push(Record::new(tags, fields));
    }
}
