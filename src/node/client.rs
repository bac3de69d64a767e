//! Node REST API client
//!
//! Builds transactions through the node's wallet API:
//! `POST {node}/api/v1/wallet/transaction`.
//!
//! The node must have its wallet API enabled. When CSRF protection is on, a
//! token is fetched from `/api/v1/csrf` before each request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::form::{DestinationPayload, HoursSelection};
use crate::submit::services::{BuildError, TransactionBuilder, TransactionRequest};
use crate::submit::transaction::Transaction;

/// Wallet transaction endpoint, relative to the node URL
pub const WALLET_TRANSACTION_PATH: &str = "/api/v1/wallet/transaction";

/// CSRF token endpoint, relative to the node URL
pub const CSRF_PATH: &str = "/api/v1/csrf";

/// Header carrying the CSRF token
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Wallet section of the request body
#[derive(Debug, Clone, Serialize)]
pub struct WalletSpec {
    pub id: String,
    pub addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Request body for the wallet transaction endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CreateTransactionBody {
    pub hours_selection: HoursSelection,
    pub wallet: WalletSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_address: Option<String>,
    pub to: Vec<DestinationPayload>,
}

impl From<&TransactionRequest> for CreateTransactionBody {
    fn from(request: &TransactionRequest) -> Self {
        Self {
            hours_selection: request.hours_selection.clone(),
            wallet: WalletSpec {
                id: request.wallet.id.clone(),
                addresses: request.addresses.clone(),
                password: request.secret.clone(),
            },
            change_address: request.change_address.clone(),
            to: request.destinations.clone(),
        }
    }
}

/// Response body from the wallet transaction endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionResponse {
    pub transaction: Transaction,
    #[serde(default)]
    pub encoded_transaction: String,
}

impl CreateTransactionResponse {
    /// Flatten into a transaction carrying its encoding
    pub fn into_transaction(self) -> Transaction {
        let mut transaction = self.transaction;
        if transaction.encoded.is_empty() {
            transaction.encoded = self.encoded_transaction;
        }
        transaction
    }
}

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    csrf_token: String,
}

/// HTTP transaction builder backed by a node
pub struct NodeTransactionBuilder {
    client: Client,
    base_url: String,
    use_csrf: bool,
}

impl NodeTransactionBuilder {
    /// Create a builder for the node at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration, use_csrf: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            use_csrf,
        })
    }

    /// Create a builder from configuration
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        Self::new(
            config.url.clone(),
            Duration::from_millis(config.timeout_ms),
            config.use_csrf,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn csrf_token(&self) -> std::result::Result<String, BuildError> {
        let response = self
            .client
            .get(self.url(CSRF_PATH))
            .send()
            .await
            .map_err(|e| BuildError::transport(format!("CSRF request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BuildError::new(Some(status.as_u16()), body));
        }

        let token: CsrfResponse = response.json().await.map_err(|e| {
            BuildError::transport(format!("Failed to parse CSRF response: {}", e))
        })?;

        Ok(token.csrf_token)
    }
}

#[async_trait]
impl TransactionBuilder for NodeTransactionBuilder {
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> std::result::Result<Transaction, BuildError> {
        let body = CreateTransactionBody::from(request);

        debug!(
            "Creating transaction: wallet {} with {} destinations",
            body.wallet.id,
            body.to.len()
        );

        let mut http_request = self
            .client
            .post(self.url(WALLET_TRANSACTION_PATH))
            .json(&body);

        if self.use_csrf {
            let token = self.csrf_token().await?;
            http_request = http_request.header(CSRF_HEADER, token);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| BuildError::transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BuildError::transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(BuildError::new(Some(status.as_u16()), text));
        }

        let parsed: CreateTransactionResponse = serde_json::from_str(&text).map_err(|e| {
            BuildError::transport(format!("Failed to parse transaction response: {}", e))
        })?;

        let transaction = parsed.into_transaction();
        info!("Node built transaction {}", transaction.txid);

        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::AutoHoursMode;
    use crate::wallet::types::Wallet;

    fn request(secret: Option<&str>) -> TransactionRequest {
        TransactionRequest {
            wallet: Wallet {
                id: "main.wlt".to_string(),
                label: String::new(),
                encrypted: secret.is_some(),
                addresses: vec![],
            },
            addresses: vec!["src".to_string()],
            destinations: vec![DestinationPayload {
                address: "X".to_string(),
                coins: "1.5".to_string(),
                hours: None,
            }],
            hours_selection: HoursSelection::Auto {
                mode: AutoHoursMode::Share,
                share_factor: "0.5".to_string(),
            },
            change_address: None,
            secret: secret.map(str::to_string),
        }
    }

    #[test]
    fn test_body_format() {
        let body = CreateTransactionBody::from(&request(Some("pw")));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "hours_selection": {"type": "auto", "mode": "share", "share_factor": "0.5"},
                "wallet": {"id": "main.wlt", "addresses": ["src"], "password": "pw"},
                "to": [{"address": "X", "coins": "1.5"}]
            })
        );
    }

    #[test]
    fn test_body_omits_missing_password() {
        let body = CreateTransactionBody::from(&request(None));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["wallet"].get("password").is_none());
        assert!(json.get("change_address").is_none());
    }

    #[test]
    fn test_parse_response() {
        let text = r#"{
            "transaction": {
                "length": 220,
                "type": 0,
                "txid": "9f2a",
                "inner_hash": "44ab",
                "fee": "375",
                "sigs": ["00"],
                "inputs": [{
                    "uxid": "u1",
                    "address": "src",
                    "coins": "10.000000",
                    "hours": "800",
                    "calculated_hours": "812"
                }],
                "outputs": [
                    {"uxid": "o1", "address": "X", "coins": "1.500000", "hours": "200"},
                    {"uxid": "o2", "address": "src", "coins": "8.500000", "hours": "237"}
                ]
            },
            "encoded_transaction": "dc00"
        }"#;

        let parsed: CreateTransactionResponse = serde_json::from_str(text).unwrap();
        let tx = parsed.into_transaction();
        assert_eq!(tx.txid, "9f2a");
        assert_eq!(tx.encoded, "dc00");
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.total_coins(), 10.0);
        assert_eq!(tx.inputs[0].calculated_hours, "812");
    }

    #[test]
    fn test_url_joining() {
        let builder =
            NodeTransactionBuilder::new("http://127.0.0.1:6420/", Duration::from_secs(5), true)
                .unwrap();
        assert_eq!(
            builder.url(WALLET_TRANSACTION_PATH),
            "http://127.0.0.1:6420/api/v1/wallet/transaction"
        );
    }
}
