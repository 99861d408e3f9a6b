/// REST client for the ledger indexer.
///
/// The indexer serves filtered queries over transaction history. This
/// system uses exactly one shape of query: asset-configuration
/// transactions from one sender whose note starts with a given byte
/// prefix, capped at one page. The note-prefix parameter travels
/// base64url-encoded; returned notes come back standard-base64-encoded
/// and are decoded by [`IndexedTxn::note_utf8`].
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use super::{IndexQuery, IndexedTxn, NotePrefixQuery};
use crate::error::{AnchorError, Result};
use async_trait::async_trait;

/// Configuration for the indexer client.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Indexer base URL.
    pub base_url: String,
    /// API token, sent as `X-Indexer-API-Token` when present.
    pub api_token: Option<String>,
    /// Per-request timeout. A timed-out query fails that record only.
    pub timeout: Duration,
}

pub struct IndexerClient {
    client: Client,
    config: IndexerConfig,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<IndexedTxn>,
}

impl IndexerClient {
    pub fn new(config: IndexerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnchorError::IndexQuery(format!("HTTP client build failed: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl IndexQuery for IndexerClient {
    async fn search_acfg(&self, query: &NotePrefixQuery) -> Result<Vec<IndexedTxn>> {
        let note_prefix = URL_SAFE_NO_PAD.encode(&query.note_prefix);
        let limit = query.limit.to_string();
        let mut request = self
            .client
            .get(format!("{}/v2/transactions", self.config.base_url))
            .query(&[
                ("address", query.address.as_str()),
                ("address-role", "sender"),
                ("tx-type", "acfg"),
                ("note-prefix", note_prefix.as_str()),
                ("limit", limit.as_str()),
            ]);
        if let Some(token) = &self.config.api_token {
            request = request.header("X-Indexer-API-Token", token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| AnchorError::IndexQuery(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AnchorError::IndexQuery(format!(
                "indexer returned {status}: {body}"
            )));
        }

        let parsed: TransactionsResponse = resp
            .json()
            .await
            .map_err(|e| AnchorError::Serialization(format!("transactions response: {e}")))?;

        Ok(parsed.transactions)
    }

    async fn health(&self) -> Result<()> {
        let resp = self
            .client
            .get(format!("{}/health", self.config.base_url))
            .send()
            .await
            .map_err(|e| AnchorError::IndexUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AnchorError::IndexUnavailable(format!(
                "health check returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
