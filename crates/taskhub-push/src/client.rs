//! FCM multicast client.
//!
//! Maps each HTTP outcome onto the gateway contract: a reachable gateway
//! yields a per-token verdict for every token; an unreachable one yields
//! `Unavailable` and no token may be judged. The client never retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use taskhub_core::config::PushConfig;
use taskhub_core::error::{AppError, ErrorKind};
use taskhub_core::result::AppResult;
use taskhub_delivery::ports::{
    DeliveryStatus, MulticastOutcome, PushGateway, PushMessage, TokenDelivery,
};

/// Gateway error codes that mean the token will never work again.
const PERMANENT_ERRORS: &[&str] = &[
    "NotRegistered",
    "InvalidRegistration",
    "MismatchSenderId",
];

/// Client for the legacy FCM multicast send endpoint.
pub struct FcmClient {
    http: reqwest::Client,
    endpoint: String,
    server_key: String,
}

#[derive(Serialize)]
struct MulticastRequest<'a> {
    registration_ids: &'a [String],
    notification: NotificationPayload<'a>,
    data: &'a std::collections::HashMap<String, String>,
}

#[derive(Serialize)]
struct NotificationPayload<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct MulticastResponse {
    #[serde(default)]
    results: Vec<TokenResult>,
}

#[derive(Deserialize)]
struct TokenResult {
    #[serde(default)]
    message_id: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl FcmClient {
    /// Build a client from configuration. Fails only on an invalid HTTP
    /// client setup; a missing credential is reported per call instead, so
    /// the process still starts without push configured.
    pub fn new(config: &PushConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build push HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            server_key: config.server_key.clone(),
        })
    }

    fn classify(result: &TokenResult) -> DeliveryStatus {
        if result.message_id.is_some() {
            return DeliveryStatus::Delivered;
        }
        match result.error.as_deref() {
            Some(code) if PERMANENT_ERRORS.contains(&code) => {
                DeliveryStatus::PermanentFailure(code.to_string())
            }
            _ => DeliveryStatus::TransientFailure,
        }
    }
}

#[async_trait]
impl PushGateway for FcmClient {
    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> MulticastOutcome {
        if self.server_key.is_empty() {
            return MulticastOutcome::Unavailable("push server key not configured".to_string());
        }
        if tokens.is_empty() {
            return MulticastOutcome::Sent(Vec::new());
        }

        let request = MulticastRequest {
            registration_ids: tokens,
            notification: NotificationPayload {
                title: &message.title,
                body: &message.body,
            },
            data: &message.data,
        };

        let response = match self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                // Timeouts and connect errors say nothing about the tokens.
                warn!(error = %e, "Push gateway request failed");
                return MulticastOutcome::Unavailable(e.to_string());
            }
        };

        let status = response.status();
        if status.is_server_error() {
            return MulticastOutcome::Unavailable(format!("gateway returned {status}"));
        }
        if !status.is_success() {
            // Auth or request errors apply to the whole batch but the
            // tokens themselves are not implicated.
            warn!(status = %status, "Push gateway rejected the request");
            return MulticastOutcome::Unavailable(format!("gateway rejected request: {status}"));
        }

        let body: MulticastResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Unparseable push gateway response");
                return MulticastOutcome::Unavailable(e.to_string());
            }
        };

        // A short result list leaves the tail of the batch unjudged;
        // treat missing entries as transient.
        let results = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| TokenDelivery {
                token: token.clone(),
                status: body
                    .results
                    .get(i)
                    .map(Self::classify)
                    .unwrap_or(DeliveryStatus::TransientFailure),
            })
            .collect();

        debug!(tokens = tokens.len(), "Push multicast completed");
        MulticastOutcome::Sent(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(message_id: Option<&str>, error: Option<&str>) -> TokenResult {
        TokenResult {
            message_id: message_id.map(|m| Value::String(m.to_string())),
            error: error.map(String::from),
        }
    }

    #[test]
    fn message_id_means_delivered() {
        assert_eq!(
            FcmClient::classify(&result(Some("0:1"), None)),
            DeliveryStatus::Delivered
        );
    }

    #[test]
    fn unregistered_token_is_a_permanent_failure() {
        assert_eq!(
            FcmClient::classify(&result(None, Some("NotRegistered"))),
            DeliveryStatus::PermanentFailure("NotRegistered".to_string())
        );
        assert_eq!(
            FcmClient::classify(&result(None, Some("InvalidRegistration"))),
            DeliveryStatus::PermanentFailure("InvalidRegistration".to_string())
        );
    }

    #[test]
    fn unknown_errors_are_transient() {
        assert_eq!(
            FcmClient::classify(&result(None, Some("Unavailable"))),
            DeliveryStatus::TransientFailure
        );
        assert_eq!(
            FcmClient::classify(&result(None, None)),
            DeliveryStatus::TransientFailure
        );
    }

    #[tokio::test]
    async fn missing_server_key_reports_unavailable() {
        let client = FcmClient::new(&PushConfig::default()).unwrap();
        let message = PushMessage {
            title: "t".to_string(),
            body: "b".to_string(),
            data: Default::default(),
        };

        let outcome = client
            .send_multicast(&["token".to_string()], &message)
            .await;

        assert!(matches!(outcome, MulticastOutcome::Unavailable(_)));
    }
}
