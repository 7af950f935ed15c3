use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use roundup_common::domain::RawTransaction;
use roundup_common::{Result, RoundupError};

/// Suspension point: every request respects this timeout (§5 "Cancellation
/// & timeouts" recommends 30s).
const AGGREGATOR_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A date range bounding the transactions requested from the aggregator.
#[derive(Debug, Clone)]
pub struct DateRange {
    pub gte: String,
    pub lte: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConnectGetOptions<'a> {
    gte: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lte: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ConnectGetResponse {
    #[serde(default)]
    transactions: Vec<RawTransaction>,
}

/// HTTP client for the external transaction aggregator's `/connect/get`
/// endpoint — the only collaborator C8 talks to over the network
/// besides the queue and the signer trigger.
pub struct AggregatorClient {
    http: Client,
    base_url: String,
    client_id: String,
    secret: String,
}

impl AggregatorClient {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(AGGREGATOR_REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client with a fixed timeout always builds");

        Self {
            http,
            base_url: base_url.into(),
            client_id: client_id.into(),
            secret: secret.into(),
        }
    }

    /// Fetches recent transactions for one user's aggregator account.
    /// A non-200 response aborts this user's run (§4.8 step 1).
    pub async fn fetch_transactions(&self, access_token: &str, range: &DateRange) -> Result<Vec<RawTransaction>> {
        let options = ConnectGetOptions {
            gte: &range.gte,
            lte: range.lte.as_deref(),
        };
        let options_json = serde_json::to_string(&options)
            .map_err(|e| RoundupError::AggregatorHttpError(format!("failed to encode options: {e}")))?;

        let form = [
            ("client_id", self.client_id.as_str()),
            ("secret", self.secret.as_str()),
            ("access_token", access_token),
            ("options", options_json.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/connect/get", self.base_url))
            .form(&form)
            .send()
            .await
            .map_err(|e| RoundupError::AggregatorHttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RoundupError::AggregatorHttpError(format!(
                "non-200 response: {}",
                response.status()
            )));
        }

        let parsed: ConnectGetResponse = response
            .json()
            .await
            .map_err(|e| RoundupError::AggregatorHttpError(format!("malformed response body: {e}")))?;

        Ok(parsed.transactions)
    }
}
