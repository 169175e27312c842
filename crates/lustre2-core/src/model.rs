//! Tagged metric records produced by the Lustre collector.
//!
//! A [`Record`] is the unit handed from the grammars to the merger and from
//! the merger to the sink: a [`TagSet`] identifying the entity (target,
//! client, job) and a [`FieldSet`] of unsigned counters.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// Tag carrying the target name (`OST0001`, `lustre-MDT0000`, `lnet`).
pub const TAG_NAME: &str = "name";
/// Tag carrying the client NID of a per-export statistics file.
pub const TAG_CLIENT: &str = "client";
/// Tag carrying the job identifier of a job_stats block.
pub const TAG_JOBID: &str = "jobid";

/// Identity of a metric record.
///
/// Only the tags that are present take part in equality and ordering; there
/// are no empty placeholders. The derived ordering (name, client, jobid) is
/// the canonical key used when merging records from different files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagSet {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jobid: Option<String>,
}

impl TagSet {
    /// Tags for a whole target (`{name}`).
    pub fn target(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client: None,
            jobid: None,
        }
    }

    /// Returns a copy with the `client` tag set.
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// Returns a copy with the `jobid` tag set.
    pub fn with_jobid(mut self, jobid: impl Into<String>) -> Self {
        self.jobid = Some(jobid.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> Option<&str> {
        self.client.as_deref()
    }

    pub fn jobid(&self) -> Option<&str> {
        self.jobid.as_deref()
    }

    /// Number of present tags.
    pub fn len(&self) -> usize {
        1 + usize::from(self.client.is_some()) + usize::from(self.jobid.is_some())
    }

    /// Never true: every tag set carries at least `name`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over present tags in alphabetical key order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (TAG_CLIENT, self.client.as_deref()),
            (TAG_JOBID, self.jobid.as_deref()),
            (TAG_NAME, Some(self.name.as_str())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Counter values of one record, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeMap<String, u64>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, returning the previous value if the name was taken.
    pub fn insert(&mut self, name: impl Into<String>, value: u64) -> Option<u64> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl IntoIterator for FieldSet {
    type Item = (String, u64);
    type IntoIter = btree_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One tagged set of counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub tags: TagSet,
    pub fields: FieldSet,
}

impl Record {
    pub fn new(tags: TagSet, fields: FieldSet) -> Self {
        Self { tags, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagset_equality_ignores_construction_order() {
        let a = TagSet::target("OST0001")
            .with_client("10.2.4.27@o2ib1")
            .with_jobid("job");
        let b = TagSet::target("OST0001")
            .with_jobid("job")
            .with_client("10.2.4.27@o2ib1");
        assert_eq!(a, b);
        assert_ne!(a, TagSet::target("OST0001"));
    }

    #[test]
    fn test_tagset_iter_only_present_tags() {
        let tags = TagSet::target("OST0001").with_jobid("testjob2");
        let collected: Vec<_> = tags.iter().collect();
        assert_eq!(collected, vec![("jobid", "testjob2"), ("name", "OST0001")]);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.to_string(), "jobid=testjob2,name=OST0001");
    }

    #[test]
    fn test_tagset_serializes_without_absent_tags() {
        let tags = TagSet::target("lnet");
        let value = toml::Value::try_from(&tags).unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["name"].as_str(), Some("lnet"));
    }

    #[test]
    fn test_fieldset_insert_reports_previous() {
        let mut fields = FieldSet::new();
        assert_eq!(fields.insert("read_calls", 1), None);
        assert_eq!(fields.insert("read_calls", 2), Some(1));
        assert_eq!(fields.get("read_calls"), Some(2));
        assert_eq!(fields.len(), 1);
    }
}
