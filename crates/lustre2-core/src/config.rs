//! Collector configuration: the glob pattern lists of the three groups.
//!
//! ```toml
//! [[inputs.lustre2]]
//! ost_procfiles = [
//!   "/proc/fs/lustre/obdfilter/*/stats",
//!   "/proc/fs/lustre/osd-ldiskfs/*/stats",
//! ]
//! mds_procfiles = ["/proc/fs/lustre/mdt/*/md_stats"]
//! lnet_procfiles = ["/sys/kernel/debug/lnet/stats"]
//! ```
//!
//! A missing list means the group contributes nothing. Inside
//! `[[inputs.lustre2]]` the agent's common per-plugin settings (`interval`,
//! `name_override`, `tags`, ...) are accepted and ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::collector::lustre::GroupKind;

/// Error loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    Io(std::io::Error),
    /// Configuration is not valid TOML or has the wrong shape.
    Toml(toml::de::Error),
    /// `inputs.lustre2` is present but empty.
    MissingPlugin,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Toml(e) => write!(f, "invalid configuration: {}", e),
            ConfigError::MissingPlugin => write!(f, "[[inputs.lustre2]] has no entries"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Toml(e)
    }
}

/// Glob patterns per group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Lustre2Config {
    /// Object storage target statistics.
    pub ost_procfiles: Vec<String>,
    /// Metadata target statistics.
    pub mds_procfiles: Vec<String>,
    /// LNet statistics.
    pub lnet_procfiles: Vec<String>,
}

/// Settings the agent accepts on every input plugin.
const AGENT_PLUGIN_KEYS: &[&str] = &[
    "alias",
    "collection_jitter",
    "collection_offset",
    "fielddrop",
    "fieldexclude",
    "fieldinclude",
    "fieldpass",
    "interval",
    "log_level",
    "name_override",
    "name_prefix",
    "name_suffix",
    "namedrop",
    "namepass",
    "precision",
    "startup_error_behavior",
    "tagdrop",
    "tagexclude",
    "taginclude",
    "tagpass",
    "tags",
];

/// `[[inputs.lustre2]]` agent layout.
#[derive(Deserialize)]
struct AgentFile {
    inputs: AgentInputs,
}

#[derive(Deserialize)]
struct AgentInputs {
    #[serde(default)]
    lustre2: Vec<toml::Table>,
}

impl Lustre2Config {
    /// Stock locations of Lustre 2.x server statistics.
    pub fn with_default_paths() -> Self {
        Self {
            ost_procfiles: vec![
                "/proc/fs/lustre/obdfilter/*/stats".to_string(),
                "/proc/fs/lustre/osd-ldiskfs/*/stats".to_string(),
                "/proc/fs/lustre/obdfilter/*/job_stats".to_string(),
                "/proc/fs/lustre/obdfilter/*/exports/*/stats".to_string(),
            ],
            mds_procfiles: vec![
                "/proc/fs/lustre/mdt/*/md_stats".to_string(),
                "/proc/fs/lustre/mdt/*/job_stats".to_string(),
                "/proc/fs/lustre/mdt/*/exports/*/stats".to_string(),
            ],
            lnet_procfiles: vec!["/sys/kernel/debug/lnet/stats".to_string()],
        }
    }

    /// Parses a configuration from TOML.
    ///
    /// Accepts either the bare keys or the `[[inputs.lustre2]]` agent layout,
    /// in which case the first entry is used.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = content.parse()?;
        if table.contains_key("inputs") {
            let agent: AgentFile = table.try_into()?;
            let mut plugin = agent
                .inputs
                .lustre2
                .into_iter()
                .next()
                .ok_or(ConfigError::MissingPlugin)?;
            plugin.retain(|key, _| !AGENT_PLUGIN_KEYS.contains(&key));
            return Ok(plugin.try_into()?);
        }
        Ok(table.try_into()?)
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Patterns configured for `kind`.
    pub fn patterns(&self, kind: GroupKind) -> &[String] {
        match kind {
            GroupKind::ObjectStorage => &self.ost_procfiles,
            GroupKind::MetadataServer => &self.mds_procfiles,
            GroupKind::NetworkTransport => &self.lnet_procfiles,
        }
    }

    /// Returns a copy with every pattern placed below `root`.
    ///
    /// Used to point the collector at a captured tree instead of `/`.
    pub fn with_root(&self, root: &Path) -> Self {
        let rebase = |patterns: &[String]| -> Vec<String> {
            patterns
                .iter()
                .map(|p| root.join(p.trim_start_matches('/')).to_string_lossy().into_owned())
                .collect()
        };
        Self {
            ost_procfiles: rebase(&self.ost_procfiles),
            mds_procfiles: rebase(&self.mds_procfiles),
            lnet_procfiles: rebase(&self.lnet_procfiles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agent_layout() {
        let content = r#"
[[inputs.lustre2]]
  ost_procfiles = [
    "/proc/fs/lustre/obdfilter/*/stats",
    "/proc/fs/lustre/osd-ldiskfs/*/stats",
  ]
  mds_procfiles = [
    "/proc/fs/lustre/mdt/*/md_stats",
  ]
  lnet_procfiles = [
    "/sys/kernel/debug/lnet/stats",
  ]
"#;
        let config = Lustre2Config::from_toml_str(content).unwrap();
        assert_eq!(
            config,
            Lustre2Config {
                ost_procfiles: vec![
                    "/proc/fs/lustre/obdfilter/*/stats".to_string(),
                    "/proc/fs/lustre/osd-ldiskfs/*/stats".to_string(),
                ],
                mds_procfiles: vec!["/proc/fs/lustre/mdt/*/md_stats".to_string()],
                lnet_procfiles: vec!["/sys/kernel/debug/lnet/stats".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_agent_layout_with_plugin_settings() {
        let content = r#"
[[inputs.lustre2]]
  interval = "30s"
  name_override = "lustre"
  mds_procfiles = ["/proc/fs/lustre/mdt/*/md_stats"]

  [inputs.lustre2.tags]
    cluster = "scratch"
"#;
        let config = Lustre2Config::from_toml_str(content).unwrap();
        assert_eq!(
            config.mds_procfiles,
            vec!["/proc/fs/lustre/mdt/*/md_stats".to_string()]
        );
        assert!(config.ost_procfiles.is_empty());

        // Misspelled plugin keys are still rejected.
        let typo = "[[inputs.lustre2]]\n  mds_procfile = []\n";
        assert!(matches!(
            Lustre2Config::from_toml_str(typo),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_default_paths_include_client_exports() {
        let config = Lustre2Config::with_default_paths();
        assert!(
            config
                .ost_procfiles
                .contains(&"/proc/fs/lustre/obdfilter/*/exports/*/stats".to_string())
        );
        assert!(
            config
                .mds_procfiles
                .contains(&"/proc/fs/lustre/mdt/*/exports/*/stats".to_string())
        );
    }

    #[test]
    fn test_parse_bare_layout_missing_lists() {
        let config =
            Lustre2Config::from_toml_str("mds_procfiles = [\"/proc/fs/lustre/mdt/*/md_stats\"]\n")
                .unwrap();
        assert!(config.ost_procfiles.is_empty());
        assert!(config.lnet_procfiles.is_empty());
        assert_eq!(config.patterns(GroupKind::MetadataServer).len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Lustre2Config::from_toml_str("ost_procfiles = 3"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            Lustre2Config::from_toml_str("unknown_key = []"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            Lustre2Config::from_toml_str("[inputs]\n"),
            Err(ConfigError::MissingPlugin)
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lustre2.toml");
        std::fs::write(&path, "lnet_procfiles = [\"/sys/kernel/debug/lnet/stats\"]\n").unwrap();
        let config = Lustre2Config::from_file(&path).unwrap();
        assert_eq!(config.lnet_procfiles.len(), 1);

        let missing = Lustre2Config::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_with_root() {
        let config = Lustre2Config::with_default_paths().with_root(Path::new("/tmp/capture"));
        assert_eq!(
            config.lnet_procfiles,
            vec!["/tmp/capture/sys/kernel/debug/lnet/stats".to_string()]
        );
        assert_eq!(
            config.patterns(GroupKind::ObjectStorage)[0],
            "/tmp/capture/proc/fs/lustre/obdfilter/*/stats"
        );
    }
}
