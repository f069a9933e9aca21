//! Locally staged update feed.
//!
//! Operators can stage a rollout by dropping an `UPDATE.txt` into the
//! data directory; it overrides the remote check. Line grammar:
//!
//! ```text
//! # comment
//! version=1.8.0
//! title=Maintenance release
//! body=• Fix: proxy leak on resume
//! body=• Feat: dark tray icon
//! staleness=h:12
//! ```
//!
//! `version` is required; `body` lines accumulate; `staleness` replaces
//! the default reminder cadence for this candidate and accepts either a
//! bare millisecond count or `<unit>:<number>` with units
//! ms/s/m/h/d (long names accepted). The file mtime is the revision, so
//! re-publishing the same version is treated as a fresh detection.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::error::CoreError;
use crate::storage::data_dir;

const FEED_FILE: &str = "UPDATE.txt";

/// A parsed feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUpdate {
    pub version: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub staleness_ms: Option<u64>,
    /// File mtime in epoch ms.
    pub revision_ms: u64,
}

/// Parse a duration value: bare positive ms count, or unit-prefixed
/// (`h:12`, `minutes 30`, `d2`).
pub fn parse_duration_ms(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(direct) = trimmed.parse::<f64>() {
        if direct > 0.0 {
            return Some(direct as u64);
        }
        return None;
    }

    const UNITS: [(&str, f64); 10] = [
        ("milliseconds", 1.0),
        ("ms", 1.0),
        ("seconds", 1_000.0),
        ("s", 1_000.0),
        ("minutes", 60_000.0),
        ("m", 60_000.0),
        ("hours", 3_600_000.0),
        ("h", 3_600_000.0),
        ("days", 86_400_000.0),
        ("d", 86_400_000.0),
    ];

    let lower = trimmed.to_ascii_lowercase();
    for (unit, factor) in UNITS {
        if let Some(rest) = lower.strip_prefix(unit) {
            let rest = rest.trim_start().trim_start_matches(':').trim();
            let numeric = rest.parse::<f64>().ok()?;
            if numeric <= 0.0 {
                return None;
            }
            return Some((numeric * factor) as u64);
        }
    }
    None
}

/// Parse feed content. Returns `None` when no `version` line is present.
pub fn parse_feed(raw: &str, revision_ms: u64) -> Option<FeedUpdate> {
    let mut version = None;
    let mut title = None;
    let mut body_lines = Vec::new();
    let mut staleness_ms = None;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "version" if !value.is_empty() => version = Some(value.to_string()),
            "title" if !value.is_empty() => title = Some(value.to_string()),
            "body" if !value.is_empty() => body_lines.push(value.to_string()),
            "staleness" => staleness_ms = parse_duration_ms(value),
            _ => {}
        }
    }

    Some(FeedUpdate {
        version: version?,
        title,
        body: if body_lines.is_empty() {
            None
        } else {
            Some(body_lines.join("\n"))
        },
        staleness_ms,
        revision_ms,
    })
}

/// Reads `UPDATE.txt` from a fixed path. Polled on a short refresh
/// interval independent of the reminder cadence.
pub struct LocalFeedSource {
    path: PathBuf,
}

impl LocalFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Feed source rooted at the default data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn default_location() -> Result<Self, CoreError> {
        Ok(Self::new(data_dir()?.join(FEED_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the feed. Any failure (missing file, unreadable,
    /// no version line) resolves to `None`; only unexpected read errors
    /// are logged.
    pub fn read(&self) -> Option<FeedUpdate> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to stat update feed");
                return None;
            }
        };
        let revision_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read update feed");
                return None;
            }
        };
        parse_feed(&raw, revision_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_feed() {
        let raw = "# staged rollout\nversion=1.8.0\ntitle=Maintenance release\nbody=first\nbody=second\nstaleness=h:12\n";
        let feed = parse_feed(raw, 42).unwrap();
        assert_eq!(feed.version, "1.8.0");
        assert_eq!(feed.title.as_deref(), Some("Maintenance release"));
        assert_eq!(feed.body.as_deref(), Some("first\nsecond"));
        assert_eq!(feed.staleness_ms, Some(12 * 3_600_000));
        assert_eq!(feed.revision_ms, 42);
    }

    #[test]
    fn missing_version_is_none() {
        assert!(parse_feed("title=No version here\n", 0).is_none());
    }

    #[test]
    fn skips_comments_and_unknown_keys() {
        let raw = "# comment\nversion=2.0.0\ncolor=red\n\n";
        let feed = parse_feed(raw, 0).unwrap();
        assert_eq!(feed.version, "2.0.0");
        assert!(feed.body.is_none());
    }

    #[test]
    fn keeps_equals_signs_in_values() {
        let feed = parse_feed("version=1.0.0\nbody=a=b=c\n", 0).unwrap();
        assert_eq!(feed.body.as_deref(), Some("a=b=c"));
    }

    #[test]
    fn duration_grammar() {
        assert_eq!(parse_duration_ms("1500"), Some(1500));
        assert_eq!(parse_duration_ms("ms:250"), Some(250));
        assert_eq!(parse_duration_ms("s:30"), Some(30_000));
        assert_eq!(parse_duration_ms("minutes 5"), Some(300_000));
        assert_eq!(parse_duration_ms("H:2"), Some(7_200_000));
        assert_eq!(parse_duration_ms("d:1"), Some(86_400_000));
        assert_eq!(parse_duration_ms("days:1.5"), Some(129_600_000));
        assert_eq!(parse_duration_ms("0"), None);
        assert_eq!(parse_duration_ms("-5"), None);
        assert_eq!(parse_duration_ms("fortnight:1"), None);
        assert_eq!(parse_duration_ms(""), None);
    }

    #[test]
    fn read_missing_file_is_none() {
        let source = LocalFeedSource::new("/nonexistent/UPDATE.txt");
        assert!(source.read().is_none());
    }

    #[test]
    fn read_parses_file_with_mtime_revision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FEED_FILE);
        std::fs::write(&path, "version=3.1.4\nbody=notes\n").unwrap();
        let source = LocalFeedSource::new(&path);
        let feed = source.read().unwrap();
        assert_eq!(feed.version, "3.1.4");
        assert!(feed.revision_ms > 0);
    }
}
