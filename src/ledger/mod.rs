/// Ledger collaborators for anchoring and verification.
///
/// Two external services are involved: the node gateway that accepts
/// asset-creation transactions (write path) and the indexer that serves
/// historical transaction queries (read path). Both are reached over REST.
/// The traits here are the seams the engines depend on, so the engines can
/// be exercised against in-memory fakes without a ledger.
///
/// Account and key management, transaction signing, and consensus are the
/// collaborators' problem. Errors coming back from them are opaque to this
/// system: a failed submission is a failed submission.
pub mod indexer;
pub mod node;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Request to mint one registration token for a source.
///
/// Supply is always exactly 1 with 0 decimals: a non-fractional,
/// non-fungible registration marker, never a currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCreateRequest {
    pub sender: String,
    pub total: u64,
    pub decimals: u32,
    pub default_frozen: bool,
    pub manager: String,
    pub reserve: String,
    /// Unit symbol, at most 8 characters.
    pub unit_name: String,
    /// Display name, at most 32 characters.
    pub asset_name: String,
    /// Raw note bytes — the UTF-8 hex string of the content fingerprint.
    pub note: Vec<u8>,
}

impl AssetCreateRequest {
    /// Single-supply registration token with sender, manager and reserve
    /// all set to the issuer.
    pub fn registration(
        issuer: &str,
        unit_name: String,
        asset_name: String,
        note: Vec<u8>,
    ) -> Self {
        Self {
            sender: issuer.to_string(),
            total: 1,
            decimals: 0,
            default_frozen: false,
            manager: issuer.to_string(),
            reserve: issuer.to_string(),
            unit_name,
            asset_name,
            note,
        }
    }
}

/// Receipt for a submitted asset-creation transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorReceipt {
    /// Transaction ID on the ledger.
    pub tx_id: String,
    /// Created asset ID (None if the gateway does not wait for confirmation).
    pub asset_id: Option<u64>,
    /// Round the transaction was confirmed in (None if unconfirmed).
    pub confirmed_round: Option<u64>,
}

/// A transaction row returned by the indexer.
///
/// Only the fields this system consumes. `note` is transport-encoded
/// (base64) and may be absent entirely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexedTxn {
    pub id: Option<String>,
    pub note: Option<String>,
}

impl IndexedTxn {
    pub fn with_note(id: &str, note_plaintext: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            note: Some(STANDARD.encode(note_plaintext.as_bytes())),
        }
    }

    /// Decode the transport-encoded note to a UTF-8 string.
    ///
    /// A missing note, malformed base64, or non-UTF-8 bytes all yield
    /// `None`: a transaction whose note cannot be decoded simply does not
    /// match anything.
    pub fn note_utf8(&self) -> Option<String> {
        let encoded = self.note.as_deref()?;
        let bytes = STANDARD.decode(encoded).ok()?;
        String::from_utf8(bytes).ok()
    }
}

/// Parameters for an indexer note-prefix search.
#[derive(Debug, Clone)]
pub struct NotePrefixQuery {
    /// Issuer address; only transactions it sent are authoritative.
    pub address: String,
    /// Raw prefix bytes the note must start with.
    pub note_prefix: Vec<u8>,
    /// Page size. Only the first page is ever inspected.
    pub limit: u32,
}

/// Write path: submits asset-creation transactions.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Submit one asset-creation transaction. Each call is one irreversible
    /// ledger write; there is no server-side deduplication.
    async fn create_asset(&self, req: &AssetCreateRequest) -> Result<AnchorReceipt>;
}

/// Read path: queries historical transactions by sender and note prefix.
#[async_trait]
pub trait IndexQuery: Send + Sync {
    /// Search asset-configuration transactions sent by `query.address`
    /// whose note starts with `query.note_prefix`. Returns at most
    /// `query.limit` rows — the first page only.
    async fn search_acfg(&self, query: &NotePrefixQuery) -> Result<Vec<IndexedTxn>>;

    /// Cheap reachability probe, called once at composition time.
    async fn health(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_request_shape() {
        let req = AssetCreateRequest::registration(
            "ISSUER",
            "SRC".into(),
            "News Source".into(),
            b"deadbeef".to_vec(),
        );
        assert_eq!(req.total, 1);
        assert_eq!(req.decimals, 0);
        assert!(!req.default_frozen);
        assert_eq!(req.sender, "ISSUER");
        assert_eq!(req.manager, "ISSUER");
        assert_eq!(req.reserve, "ISSUER");
    }

    #[test]
    fn test_note_decode_round_trip() {
        let txn = IndexedTxn::with_note("TX1", "abc123");
        assert_eq!(txn.note_utf8().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_absent_note_does_not_match() {
        let txn = IndexedTxn {
            id: Some("TX1".into()),
            note: None,
        };
        assert_eq!(txn.note_utf8(), None);
    }

    #[test]
    fn test_malformed_base64_does_not_match() {
        let txn = IndexedTxn {
            id: Some("TX1".into()),
            note: Some("!!! not base64 !!!".into()),
        };
        assert_eq!(txn.note_utf8(), None);
    }

    #[test]
    fn test_non_utf8_note_does_not_match() {
        let txn = IndexedTxn {
            id: Some("TX1".into()),
            note: Some(STANDARD.encode([0xff, 0xfe, 0xfd])),
        };
        assert_eq!(txn.note_utf8(), None);
    }
}
