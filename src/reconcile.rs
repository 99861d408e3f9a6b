/// Reconciliation engine.
///
/// Re-derives fingerprints from a local source set and checks each against
/// the issuer's anchors via the indexer. Read-only; the ledger is never
/// touched on this path.
///
/// Records are processed in lexicographic file-name order so reports are
/// reproducible run to run. Per-record query or decode failures classify
/// that record as Mismatched and move on; only a missing index collaborator
/// or a missing source directory skips the whole phase, with a status
/// distinct from "zero verified".
use std::path::Path;

use tracing::{info, warn};

use crate::fingerprint::{fingerprint, Fingerprint};
use crate::ledger::{IndexQuery, IndexedTxn, NotePrefixQuery};
use crate::report::{Outcome, Reporter};
use crate::sources;

/// Default indexer page size. Only the first page is ever inspected, so an
/// issuer with more matching anchors than this could miss a true match —
/// a documented limit, configurable per run.
pub const DEFAULT_QUERY_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Some returned transaction's decoded note exactly equals the
    /// fingerprint.
    Verified,
    /// Covers "note exists but differs", "nothing on chain at all", and
    /// "query failed for this record".
    Mismatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStatus {
    Completed,
    /// No index collaborator was configured or reachable.
    SkippedNoIndex,
    /// The configured source directory does not exist.
    SkippedNoSources,
}

/// Outcome of one reconciliation pass.
#[derive(Debug)]
pub struct ReconcileReport {
    pub status: ReconcileStatus,
    /// Per-file classifications, in lexicographic file-name order.
    pub results: Vec<(String, Classification)>,
    pub verified: usize,
    pub mismatched: usize,
    /// File names classified Mismatched, for the run summary.
    pub mismatched_files: Vec<String>,
}

impl ReconcileReport {
    fn empty(status: ReconcileStatus) -> Self {
        Self {
            status,
            results: Vec::new(),
            verified: 0,
            mismatched: 0,
            mismatched_files: Vec::new(),
        }
    }
}

/// Reconcile every `*.json` record under `sources_dir` against the
/// issuer's on-chain anchors.
///
/// `index` is resolved once at composition time; `None` means the phase is
/// skipped cleanly rather than failed.
pub async fn reconcile_sources(
    sources_dir: &Path,
    issuer: &str,
    index: Option<&dyn IndexQuery>,
    query_limit: u32,
    reporter: &dyn Reporter,
) -> ReconcileReport {
    let Some(index) = index else {
        warn!("No index collaborator configured, skipping reconciliation");
        reporter.record(Outcome::PhaseSkipped {
            phase: "reconcile",
            reason: "no index collaborator".into(),
        });
        return ReconcileReport::empty(ReconcileStatus::SkippedNoIndex);
    };

    let records = match sources::load_records_sorted(sources_dir) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Source directory unavailable, skipping reconciliation");
            reporter.record(Outcome::PhaseSkipped {
                phase: "reconcile",
                reason: e.to_string(),
            });
            return ReconcileReport::empty(ReconcileStatus::SkippedNoSources);
        }
    };

    let mut report = ReconcileReport::empty(ReconcileStatus::Completed);

    for record in &records {
        let fp = fingerprint(&record.content);
        let query = NotePrefixQuery {
            address: issuer.to_string(),
            note_prefix: fp.as_note_bytes().to_vec(),
            limit: query_limit,
        };

        let classification = match index.search_acfg(&query).await {
            Ok(txns) => classify(&fp, &txns),
            Err(e) => {
                warn!(
                    file = %record.file_name,
                    error = %e,
                    "Index query failed, classifying as mismatched"
                );
                Classification::Mismatched
            }
        };

        match classification {
            Classification::Verified => {
                report.verified += 1;
                reporter.record(Outcome::Verified {
                    file: record.file_name.clone(),
                });
            }
            Classification::Mismatched => {
                report.mismatched += 1;
                report.mismatched_files.push(record.file_name.clone());
                reporter.record(Outcome::Mismatched {
                    file: record.file_name.clone(),
                });
            }
        }
        report.results.push((record.file_name.clone(), classification));
    }

    info!(
        verified = report.verified,
        mismatched = report.mismatched,
        "Reconciliation complete"
    );
    report
}

/// A record verifies iff some returned transaction's decoded note exactly
/// equals the fingerprint hex. The prefix search may return historical
/// anchors whose full note differs; those do not count.
fn classify(fp: &Fingerprint, txns: &[IndexedTxn]) -> Classification {
    let matched = txns
        .iter()
        .any(|t| t.note_utf8().as_deref() == Some(fp.as_str()));
    if matched {
        Classification::Verified
    } else {
        Classification::Mismatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnchorError, Result};
    use crate::report::MemoryReporter;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;

    /// Canned responses keyed by note-prefix (the fingerprint hex).
    /// Prefixes in `failing` return an index error instead.
    #[derive(Default)]
    struct FakeIndex {
        by_prefix: HashMap<String, Vec<IndexedTxn>>,
        failing: Vec<String>,
    }

    impl FakeIndex {
        fn with_anchor(mut self, content: &str) -> Self {
            let fp = fingerprint(content);
            self.by_prefix.insert(
                fp.as_str().to_string(),
                vec![IndexedTxn::with_note("TX1", fp.as_str())],
            );
            self
        }
    }

    #[async_trait]
    impl IndexQuery for FakeIndex {
        async fn search_acfg(&self, query: &NotePrefixQuery) -> Result<Vec<IndexedTxn>> {
            let prefix = String::from_utf8(query.note_prefix.clone()).unwrap();
            if self.failing.contains(&prefix) {
                return Err(AnchorError::IndexQuery("indexer timeout".into()));
            }
            Ok(self.by_prefix.get(&prefix).cloned().unwrap_or_default())
        }

        async fn health(&self) -> Result<()> {
            Ok(())
        }
    }

    fn write_source(dir: &Path, name: &str, content: &str) {
        let body = serde_json::json!({ "content": content, "source": "AP" });
        fs::write(dir.join(name), body.to_string()).unwrap();
    }

    #[test]
    fn test_classify_exact_match_verifies() {
        let fp = fingerprint("anchored content");
        let txns = vec![IndexedTxn::with_note("TX1", fp.as_str())];
        assert_eq!(classify(&fp, &txns), Classification::Verified);
    }

    #[test]
    fn test_classify_empty_results_mismatch() {
        let fp = fingerprint("never anchored");
        assert_eq!(classify(&fp, &[]), Classification::Mismatched);
    }

    #[test]
    fn test_classify_prefix_hit_full_note_differs() {
        // The prefix search returned an old anchor; its full note is a
        // different fingerprint, so equality must reject it.
        let old_fp = fingerprint("original content");
        let new_fp = fingerprint("tampered content");
        let txns = vec![IndexedTxn::with_note("TX-OLD", old_fp.as_str())];
        assert_eq!(classify(&new_fp, &txns), Classification::Mismatched);
    }

    #[test]
    fn test_classify_undecodable_note_mismatch() {
        let fp = fingerprint("content");
        let txns = vec![IndexedTxn {
            id: Some("TX1".into()),
            note: Some("%%% not base64".into()),
        }];
        assert_eq!(classify(&fp, &txns), Classification::Mismatched);
    }

    #[tokio::test]
    async fn test_round_trip_verification() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "a.json", "unmodified copy");
        let index = FakeIndex::default().with_anchor("unmodified copy");
        let reporter = MemoryReporter::default();

        let report = reconcile_sources(
            dir.path(),
            "ISSUER",
            Some(&index),
            DEFAULT_QUERY_LIMIT,
            &reporter,
        )
        .await;

        assert_eq!(report.status, ReconcileStatus::Completed);
        assert_eq!(report.verified, 1);
        assert_eq!(report.mismatched, 0);
        assert_eq!(report.results[0].1, Classification::Verified);
    }

    #[tokio::test]
    async fn test_mutated_content_mismatches() {
        let dir = tempfile::tempdir().unwrap();
        // Anchored one text, local copy now says something else.
        write_source(dir.path(), "a.json", "edited after anchoring");
        let index = FakeIndex::default().with_anchor("original wording");
        let reporter = MemoryReporter::default();

        let report = reconcile_sources(
            dir.path(),
            "ISSUER",
            Some(&index),
            DEFAULT_QUERY_LIMIT,
            &reporter,
        )
        .await;

        assert_eq!(report.verified, 0);
        assert_eq!(report.mismatched, 1);
        assert_eq!(report.mismatched_files, ["a.json"]);
    }

    #[tokio::test]
    async fn test_one_query_failure_spares_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "a.json", "fine");
        write_source(dir.path(), "b.json", "query blows up");
        write_source(dir.path(), "c.json", "also fine");

        let mut index = FakeIndex::default()
            .with_anchor("fine")
            .with_anchor("also fine");
        index
            .failing
            .push(fingerprint("query blows up").as_str().to_string());
        let reporter = MemoryReporter::default();

        let report = reconcile_sources(
            dir.path(),
            "ISSUER",
            Some(&index),
            DEFAULT_QUERY_LIMIT,
            &reporter,
        )
        .await;

        assert_eq!(report.status, ReconcileStatus::Completed);
        assert_eq!(report.verified, 2);
        assert_eq!(report.mismatched, 1);
        assert_eq!(report.mismatched_files, ["b.json"]);
    }

    #[tokio::test]
    async fn test_results_sorted_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "c.json", "three");
        write_source(dir.path(), "a.json", "one");
        write_source(dir.path(), "b.json", "two");
        let index = FakeIndex::default();
        let reporter = MemoryReporter::default();

        let report = reconcile_sources(
            dir.path(),
            "ISSUER",
            Some(&index),
            DEFAULT_QUERY_LIMIT,
            &reporter,
        )
        .await;

        let names: Vec<&str> = report.results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a.json", "b.json", "c.json"]);
    }

    #[tokio::test]
    async fn test_no_index_skips_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "a.json", "whatever");
        let reporter = MemoryReporter::default();

        let report =
            reconcile_sources(dir.path(), "ISSUER", None, DEFAULT_QUERY_LIMIT, &reporter).await;

        assert_eq!(report.status, ReconcileStatus::SkippedNoIndex);
        assert_eq!(report.verified, 0);
        assert_eq!(report.mismatched, 0);
        assert!(report.results.is_empty());
        assert!(matches!(
            reporter.take()[0],
            Outcome::PhaseSkipped { phase: "reconcile", .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_source_dir_skips_cleanly() {
        let index = FakeIndex::default();
        let reporter = MemoryReporter::default();

        let report = reconcile_sources(
            Path::new("/nonexistent/sources"),
            "ISSUER",
            Some(&index),
            DEFAULT_QUERY_LIMIT,
            &reporter,
        )
        .await;

        assert_eq!(report.status, ReconcileStatus::SkippedNoSources);
        assert_eq!(report.verified, 0);
        assert_eq!(report.mismatched, 0);
    }

    #[tokio::test]
    async fn test_reporter_sees_structured_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "a.json", "anchored");
        write_source(dir.path(), "b.json", "not anchored");
        let index = FakeIndex::default().with_anchor("anchored");
        let reporter = MemoryReporter::default();

        reconcile_sources(
            dir.path(),
            "ISSUER",
            Some(&index),
            DEFAULT_QUERY_LIMIT,
            &reporter,
        )
        .await;

        let outcomes = reporter.take();
        assert_eq!(
            outcomes,
            vec![
                Outcome::Verified { file: "a.json".into() },
                Outcome::Mismatched { file: "b.json".into() },
            ]
        );
    }
}
