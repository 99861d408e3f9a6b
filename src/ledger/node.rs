/// REST client for the ledger-write gateway.
///
/// The gateway holds the issuer's signing key and turns an asset-creation
/// request into a signed, submitted transaction — key management and
/// signing stay on its side of the wire. This client only shapes the
/// request, posts it, and maps the response to a receipt.
///
/// Any error on this path — connection refused, timeout, validation
/// rejection, insufficient balance — surfaces as a single opaque
/// submission failure; callers treat them all the same way.
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AnchorReceipt, AssetCreateRequest, LedgerWriter};
use crate::error::{AnchorError, Result};
use async_trait::async_trait;

/// Configuration for the write gateway.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Gateway base URL (e.g. a localnet algod gateway).
    pub base_url: String,
    /// API token, sent as `X-Algo-API-Token` when present.
    pub api_token: Option<String>,
    /// Per-request timeout. A timed-out submission is a per-record
    /// failure, never a batch abort.
    pub timeout: Duration,
}

pub struct NodeClient {
    client: Client,
    config: NodeConfig,
}

/// Wire shape of an asset-creation request. The note travels base64-encoded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssetCreateBody<'a> {
    sender: &'a str,
    total: u64,
    decimals: u32,
    default_frozen: bool,
    manager: &'a str,
    reserve: &'a str,
    unit_name: &'a str,
    asset_name: &'a str,
    note: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetCreateResponse {
    tx_id: String,
    asset_id: Option<u64>,
    confirmed_round: Option<u64>,
}

impl NodeClient {
    pub fn new(config: NodeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnchorError::Submission(format!("HTTP client build failed: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl LedgerWriter for NodeClient {
    async fn create_asset(&self, req: &AssetCreateRequest) -> Result<AnchorReceipt> {
        let body = AssetCreateBody {
            sender: &req.sender,
            total: req.total,
            decimals: req.decimals,
            default_frozen: req.default_frozen,
            manager: &req.manager,
            reserve: &req.reserve,
            unit_name: &req.unit_name,
            asset_name: &req.asset_name,
            note: STANDARD.encode(&req.note),
        };

        let mut request = self
            .client
            .post(format!("{}/v1/asset-create", self.config.base_url))
            .json(&body);
        if let Some(token) = &self.config.api_token {
            request = request.header("X-Algo-API-Token", token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| AnchorError::Submission(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AnchorError::Submission(format!(
                "gateway returned {status}: {body}"
            )));
        }

        let parsed: AssetCreateResponse = resp
            .json()
            .await
            .map_err(|e| AnchorError::Serialization(format!("asset-create response: {e}")))?;

        Ok(AnchorReceipt {
            tx_id: parsed.tx_id,
            asset_id: parsed.asset_id,
            confirmed_round: parsed.confirmed_round,
        })
    }
}
