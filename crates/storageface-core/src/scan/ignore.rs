//! Ignore patterns matched against `/`-separated paths relative to the upload folder.

use glob::{MatchOptions, Pattern};

use crate::error::JobError;

/// Named patterns the CLI can enable with `--preset`.
pub const PRESETS: &[(&str, &str)] = &[
    ("pycache", "**/__pycache__/**"),
    ("git", "**/.git/**"),
    ("venv", "venv/**"),
    ("pyc", "*.pyc"),
    ("log", "*.log"),
    ("tmp", "*.tmp"),
    ("ds-store", "**/.DS_Store"),
];

pub fn preset_pattern(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, p)| *p)
}

// `*` may cross `/`, like fnmatch.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, JobError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| JobError::InvalidPattern {
                    pattern: p.to_string(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_ignored(&self, relative: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(relative, MATCH_OPTIONS))
    }
}
