/// News-source record loading.
///
/// Source files are JSON objects with at least a `content` string field and
/// optional `source` / `title` display fields. Parsing is deliberately
/// lenient: a missing `content` is an empty string, missing display fields
/// fall back to fixed literals at token-naming time. A file that is not
/// valid JSON at all is skipped with a warning; it never aborts the pass.
///
/// Anchoring enumerates records in directory-listing order. Reconciliation
/// needs reproducible reports and uses the sorted loader instead.
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{AnchorError, Result};

/// Token unit-symbol length limit on the ledger.
pub const UNIT_NAME_LIMIT: usize = 8;
/// Token display-name length limit on the ledger.
pub const ASSET_NAME_LIMIT: usize = 32;

/// Fallback unit symbol when a record carries no `source` field.
pub const DEFAULT_UNIT_NAME: &str = "SRC";
/// Fallback display name when a record carries no `title` field.
pub const DEFAULT_ASSET_NAME: &str = "News Source";

/// On-disk shape of a source file. Only the fields this system consumes.
#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    content: String,
    source: Option<String>,
    title: Option<String>,
}

/// One loaded news-source record.
///
/// Records have no persistent identity across runs; each pass loads its own
/// set fresh from disk and never writes back.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    /// File name the record was loaded from, used as its report identifier.
    pub file_name: String,
    /// The text whose integrity is anchored.
    pub content: String,
    source: Option<String>,
    title: Option<String>,
}

impl SourceRecord {
    pub fn new(
        file_name: impl Into<String>,
        content: impl Into<String>,
        source: Option<String>,
        title: Option<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            source,
            title,
        }
    }

    /// Unit symbol for the registration token: `source` truncated to 8
    /// characters, or `"SRC"` when the field is absent. A present-but-empty
    /// field stays empty; the fallback applies only to absence.
    pub fn unit_name(&self) -> String {
        truncate_chars(
            self.source.as_deref().unwrap_or(DEFAULT_UNIT_NAME),
            UNIT_NAME_LIMIT,
        )
    }

    /// Display name for the registration token: `title` truncated to 32
    /// characters, or `"News Source"` when the field is absent.
    pub fn asset_name(&self) -> String {
        truncate_chars(
            self.title.as_deref().unwrap_or(DEFAULT_ASSET_NAME),
            ASSET_NAME_LIMIT,
        )
    }

    fn from_json(file_name: &str, bytes: &[u8]) -> Result<Self> {
        let raw: RawSource = serde_json::from_slice(bytes)
            .map_err(|e| AnchorError::Serialization(format!("{file_name}: {e}")))?;
        Ok(Self {
            file_name: file_name.to_string(),
            content: raw.content,
            source: raw.source,
            title: raw.title,
        })
    }
}

/// Truncate to at most `limit` characters (not bytes), keeping multi-byte
/// text valid.
fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

/// Load every `*.json` record in `dir`, in directory-listing order.
///
/// A missing directory is not an error here — the anchoring loop simply has
/// nothing to do. Unreadable or unparseable files are skipped with a
/// warning.
pub fn load_records(dir: &Path) -> Result<Vec<SourceRecord>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    read_json_records(dir)
}

/// Load every `*.json` record in `dir`, sorted lexicographically by file
/// name for reproducible reports.
///
/// Unlike [`load_records`], a missing directory is an error the caller is
/// expected to turn into a clean phase skip.
pub fn load_records_sorted(dir: &Path) -> Result<Vec<SourceRecord>> {
    if !dir.is_dir() {
        return Err(AnchorError::MissingSourceDir(dir.display().to_string()));
    }
    let mut records = read_json_records(dir)?;
    records.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(records)
}

fn read_json_records(dir: &Path) -> Result<Vec<SourceRecord>> {
    let mut records = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %file_name, error = %e, "Skipping unreadable source file");
                continue;
            }
        };

        match SourceRecord::from_json(&file_name, &bytes) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(file = %file_name, error = %e, "Skipping malformed source file");
            }
        }
    }

    Ok(records)
}
