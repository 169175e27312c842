//! Glob expansion of statistics paths and identity extraction.
//!
//! Patterns are matched one path segment at a time against directory
//! listings obtained through [`FileSystem`], so the same code walks the real
//! `/proc/fs/lustre` tree and the in-memory mock.

use std::io;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use tracing::warn;

use crate::collector::traits::FileSystem;
use crate::model::TagSet;

/// Directory holding one subdirectory per client of a target.
const EXPORTS_DIR: &str = "exports";

/// Error for a pattern that cannot be used.
#[derive(Debug)]
pub enum PatternError {
    /// A segment is not valid glob syntax.
    Glob {
        pattern: String,
        source: glob::PatternError,
    },
    /// `**` segments are not supported.
    Recursive(String),
    /// Pattern has no segments.
    Empty,
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternError::Glob { pattern, source } => {
                write!(f, "invalid glob pattern {:?}: {}", pattern, source)
            }
            PatternError::Recursive(pattern) => {
                write!(f, "recursive '**' is not supported in {:?}", pattern)
            }
            PatternError::Empty => write!(f, "empty pattern"),
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatternError::Glob { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Glob(Pattern),
}

impl Segment {
    fn as_str(&self) -> &str {
        match self {
            Segment::Literal(s) => s,
            Segment::Glob(p) => p.as_str(),
        }
    }
}

/// A compiled statistics path pattern such as
/// `/proc/fs/lustre/obdfilter/*/exports/*/stats`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    root: PathBuf,
    segments: Vec<Segment>,
}

fn is_glob(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

impl PathPattern {
    /// Compiles a pattern. Supports `*`, `?` and `[...]` within a segment.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let root = if pattern.starts_with('/') {
            PathBuf::from("/")
        } else {
            PathBuf::from(".")
        };

        let mut segments = Vec::new();
        for part in pattern.split('/').filter(|p| !p.is_empty() && *p != ".") {
            if part.contains("**") {
                return Err(PatternError::Recursive(pattern.to_string()));
            }
            if is_glob(part) {
                let compiled = Pattern::new(part).map_err(|source| PatternError::Glob {
                    pattern: pattern.to_string(),
                    source,
                })?;
                segments.push(Segment::Glob(compiled));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        if segments.is_empty() {
            return Err(PatternError::Empty);
        }

        Ok(Self {
            raw: pattern.to_string(),
            root,
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Final segment of the pattern (`stats`, `job_stats`, ...).
    pub fn file_name(&self) -> &str {
        self.segments.last().map(Segment::as_str).unwrap_or_default()
    }

    /// Whether the pattern walks per-client `exports/<nid>` directories.
    pub fn has_exports(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Literal(l) if l == EXPORTS_DIR))
    }

    /// Expands the pattern into the sorted list of existing files.
    ///
    /// Directories that cannot be listed contribute nothing. A missing
    /// directory is silent, any other listing error is logged. Zero matches
    /// is not an error.
    pub fn expand<F: FileSystem + ?Sized>(&self, fs: &F) -> Vec<PathBuf> {
        let mut current = vec![self.root.clone()];

        for segment in &self.segments {
            let mut next = Vec::new();
            for dir in &current {
                match segment {
                    Segment::Literal(name) => {
                        let candidate = dir.join(name);
                        if fs.exists(&candidate) {
                            next.push(candidate);
                        }
                    }
                    Segment::Glob(pattern) => {
                        let entries = match fs.read_dir(dir) {
                            Ok(entries) => entries,
                            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                            Err(e) => {
                                warn!(dir = %dir.display(), pattern = %self.raw, error = %e,
                                    "failed to list directory");
                                continue;
                            }
                        };
                        next.extend(entries.into_iter().filter(|entry| {
                            entry
                                .file_name()
                                .and_then(|n| n.to_str())
                                .is_some_and(|n| pattern.matches(n))
                        }));
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }

        current.retain(|p| !fs.is_dir(p));
        current.sort();
        current.dedup();
        current
    }
}

/// Restores `@` in a client NID directory name that was written escaped.
pub fn normalize_client(segment: &str) -> String {
    segment.replace("\\@", "@")
}

/// Derives `name` (and `client`) tags from a statistics file path.
///
/// * `.../<target>/<file>` → `{name: target}`
/// * `.../<target>/exports/<nid>/<file>` → `{name: target, client: nid}`
///
/// Returns `None` when the path is too short to carry a target.
pub fn target_tags(path: &Path) -> Option<TagSet> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    if let Some(i) = parts.iter().rposition(|p| *p == EXPORTS_DIR)
        && i >= 1
        && i + 2 < parts.len()
    {
        return Some(TagSet::target(parts[i - 1]).with_client(normalize_client(parts[i + 1])));
    }

    if parts.len() < 2 {
        return None;
    }
    Some(TagSet::target(parts[parts.len() - 2]))
}
