/// Anchoring engine.
///
/// Walks a set of news-source records, fingerprints each record's content,
/// and mints one single-supply token per record whose note carries the
/// fingerprint hex string, attributed to the issuer.
///
/// The pass is best-effort: a failed submission is recorded and the loop
/// moves on to the next record. It is NOT idempotent — re-running against
/// the same sources mints duplicate tokens with identical fingerprints.
/// The opt-in `dedup_precheck` queries the indexer for an existing exact
/// anchor before minting; the default reproduces the at-least-once
/// behavior unchanged.
use tracing::{info, warn};

use crate::fingerprint::{fingerprint, Fingerprint};
use crate::ledger::{AnchorReceipt, AssetCreateRequest, IndexQuery, LedgerWriter, NotePrefixQuery};
use crate::report::{Outcome, Reporter};
use crate::sources::SourceRecord;

/// Options for an anchoring pass.
#[derive(Debug, Clone)]
pub struct AnchorOptions {
    /// Query the index for an existing exact anchor before minting.
    /// Off by default; duplicate anchors are the documented behavior.
    pub dedup_precheck: bool,
    /// Page size for the dedup pre-check query.
    pub query_limit: u32,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            dedup_precheck: false,
            query_limit: crate::reconcile::DEFAULT_QUERY_LIMIT,
        }
    }
}

/// What happened to one record during the pass.
#[derive(Debug)]
pub enum AnchorResult {
    /// A new registration token was minted.
    Minted(AnchorReceipt),
    /// Dedup pre-check found an existing exact anchor.
    Skipped { existing_tx: String },
    /// Submission failed; the error is opaque.
    Failed(String),
}

/// Per-record outcome of an anchoring pass, in enumeration order.
#[derive(Debug)]
pub struct AnchorOutcome {
    pub file_name: String,
    pub fingerprint: Fingerprint,
    pub result: AnchorResult,
}

impl AnchorOutcome {
    pub fn minted(&self) -> bool {
        matches!(self.result, AnchorResult::Minted(_))
    }
}

/// Anchor every record, in the order given.
///
/// One irreversible ledger write per record. Per-record failures never
/// abort the batch; every record gets its attempt and its outcome.
pub async fn anchor_sources(
    records: &[SourceRecord],
    issuer: &str,
    writer: &dyn LedgerWriter,
    index: Option<&dyn IndexQuery>,
    reporter: &dyn Reporter,
    opts: &AnchorOptions,
) -> Vec<AnchorOutcome> {
    let mut outcomes = Vec::with_capacity(records.len());

    for record in records {
        let fp = fingerprint(&record.content);

        if opts.dedup_precheck {
            if let Some(existing_tx) = find_existing_anchor(issuer, &fp, index, opts).await {
                reporter.record(Outcome::AnchorSkipped {
                    file: record.file_name.clone(),
                    existing_tx: existing_tx.clone(),
                });
                outcomes.push(AnchorOutcome {
                    file_name: record.file_name.clone(),
                    fingerprint: fp,
                    result: AnchorResult::Skipped { existing_tx },
                });
                continue;
            }
        }

        let req = AssetCreateRequest::registration(
            issuer,
            record.unit_name(),
            record.asset_name(),
            fp.as_note_bytes().to_vec(),
        );

        let result = match writer.create_asset(&req).await {
            Ok(receipt) => {
                info!(
                    file = %record.file_name,
                    tx_id = %receipt.tx_id,
                    "Anchored source content"
                );
                reporter.record(Outcome::Anchored {
                    file: record.file_name.clone(),
                    fingerprint: fp.as_str().to_string(),
                    tx_id: receipt.tx_id.clone(),
                });
                AnchorResult::Minted(receipt)
            }
            Err(e) => {
                warn!(
                    file = %record.file_name,
                    error = %e,
                    "Anchor submission failed, continuing"
                );
                reporter.record(Outcome::AnchorFailed {
                    file: record.file_name.clone(),
                    error: e.to_string(),
                });
                AnchorResult::Failed(e.to_string())
            }
        };

        outcomes.push(AnchorOutcome {
            file_name: record.file_name.clone(),
            fingerprint: fp,
            result,
        });
    }

    outcomes
}

/// Best-effort lookup of an existing exact anchor. Query failures fall
/// through to minting; the pre-check must never block an anchor.
async fn find_existing_anchor(
    issuer: &str,
    fp: &Fingerprint,
    index: Option<&dyn IndexQuery>,
    opts: &AnchorOptions,
) -> Option<String> {
    let index = index?;
    let query = NotePrefixQuery {
        address: issuer.to_string(),
        note_prefix: fp.as_note_bytes().to_vec(),
        limit: opts.query_limit,
    };
    match index.search_acfg(&query).await {
        Ok(txns) => txns
            .iter()
            .find(|t| t.note_utf8().as_deref() == Some(fp.as_str()))
            .map(|t| t.id.clone().unwrap_or_default()),
        Err(e) => {
            warn!(error = %e, "Dedup pre-check query failed, minting anyway");
            None
        }
    }
}
