/// Run configuration.
///
/// Everything is resolved once at startup — flags with environment-variable
/// fallbacks — and passed down by value. No global state, no per-call
/// probing for collaborators: the indexer is either configured and
/// reachable at composition time or the reconciliation phase is skipped.
use std::path::PathBuf;
use std::time::Duration;

/// Default per-request timeout for both collaborators.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Issuer address: sender, manager and reserve of every anchor.
    pub issuer: String,
    /// Directory anchored by the anchoring phase.
    pub anchor_dir: PathBuf,
    /// Directory reconciled against the chain (may differ from anchor_dir).
    pub verify_dir: PathBuf,
    /// Ledger-write gateway base URL.
    pub node_url: String,
    /// Indexer base URL. None means reconciliation is skipped.
    pub indexer_url: Option<String>,
    /// API token forwarded to both collaborators, if set.
    pub api_token: Option<String>,
    /// Indexer page size; only the first page is inspected.
    pub query_limit: u32,
    /// Opt-in dedup pre-check before minting.
    pub dedup_precheck: bool,
    /// Per-request timeout.
    pub timeout: Duration,
}
