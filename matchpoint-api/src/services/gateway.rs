//! Client for the in-game banking payment gateway: token generation for
//! a fixed price, and token verification. The gateway is unreliable, so
//! verification runs an ordered list of endpoint/header strategies; an
//! explicit policy flag decides whether an unconfirmed redirect is
//! trusted anyway.

use serde::{Deserialize, Serialize};

use matchpoint_shared::errors::{AppError, AppResult, ErrorCode};

use crate::config::AppConfig;

pub const PAYMENT_SUCCESS_MESSAGE: &str = "payment_successful";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStrategy {
    /// `/gateway_token/{token}/strict`, no auth header.
    Strict,
    /// `/gateway_token/{token}`, no auth header.
    Plain,
    /// `/gateway_token/{token}/strict` with the auth key as bearer.
    Bearer,
}

impl VerifyStrategy {
    pub fn parse(s: &str) -> Option<VerifyStrategy> {
        match s.trim() {
            "strict" => Some(VerifyStrategy::Strict),
            "plain" => Some(VerifyStrategy::Plain),
            "bearer" => Some(VerifyStrategy::Bearer),
            _ => None,
        }
    }

    /// Parse a comma separated strategy list, dropping unknown entries.
    pub fn parse_list(s: &str) -> Vec<VerifyStrategy> {
        s.split(',').filter_map(VerifyStrategy::parse).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayVerdict {
    pub auth_key: Option<String>,
    pub message: Option<String>,
    pub payment: Option<f64>,
    #[serde(default)]
    pub sandbox: bool,
}

impl GatewayVerdict {
    pub fn confirms(&self, expected_auth_key: &str) -> bool {
        self.auth_key.as_deref() == Some(expected_auth_key)
            && self.message.as_deref() == Some(PAYMENT_SUCCESS_MESSAGE)
    }

    pub fn paid_amount(&self) -> i64 {
        self.payment.unwrap_or(0.0) as i64
    }
}

/// Token-generation responses come back as a raw string, a quoted
/// string, or JSON carrying the token under `token` or `data`.
pub fn parse_token_body(body: &str) -> Option<String> {
    let token = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Object(map)) => map
            .get("token")
            .or_else(|| map.get("data"))
            .and_then(|v| v.as_str())
            .map(str::to_string)?,
        _ => body.trim().trim_matches('"').to_string(),
    };
    let token = token.trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    auth_key: String,
    strategies: Vec<VerifyStrategy>,
    pub trust_redirect: bool,
}

impl GatewayClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.gateway_base_url.trim_end_matches('/').to_string(),
            auth_key: config.gateway_auth_key.clone(),
            strategies: VerifyStrategy::parse_list(&config.gateway_verify_strategies),
            trust_redirect: config.gateway_trust_redirect,
        }
    }

    /// Where the browser is sent to complete the payment.
    pub fn redirect_url(&self, token: &str) -> String {
        format!("{}/gateway/{}", self.base_url, urlencode(token))
    }

    /// Request a single-use payment token for a fixed price.
    pub async fn generate_token(&self, price: i64) -> AppResult<String> {
        let url = format!(
            "{}/gateway_token/generateToken?price={}&type=0",
            self.base_url, price
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.auth_key)
            .send()
            .await
            .map_err(|e| {
                AppError::new(ErrorCode::GatewayUnavailable, format!("gateway token request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "gateway token error");
            return Err(AppError::new(
                ErrorCode::GatewayUnavailable,
                "payment page could not be opened",
            ));
        }

        let body = response.text().await.map_err(|e| {
            AppError::new(ErrorCode::GatewayUnavailable, format!("gateway token body unreadable: {e}"))
        })?;
        parse_token_body(&body).ok_or_else(|| {
            AppError::new(ErrorCode::GatewayUnavailable, "payment token could not be retrieved")
        })
    }

    /// Try each configured strategy in order; the first verdict that
    /// carries our auth key and a success message wins. `Ok(None)` means
    /// no strategy confirmed.
    pub async fn verify_token(&self, token: &str) -> AppResult<Option<GatewayVerdict>> {
        for strategy in &self.strategies {
            let (url, bearer) = match strategy {
                VerifyStrategy::Strict => {
                    (format!("{}/gateway_token/{}/strict", self.base_url, urlencode(token)), false)
                }
                VerifyStrategy::Plain => {
                    (format!("{}/gateway_token/{}", self.base_url, urlencode(token)), false)
                }
                VerifyStrategy::Bearer => {
                    (format!("{}/gateway_token/{}/strict", self.base_url, urlencode(token)), true)
                }
            };

            let mut request = self.http.get(&url);
            if bearer {
                request = request.bearer_auth(&self.auth_key);
            }

            let response = match request.send().await {
                Ok(r) if r.status().is_success() => r,
                Ok(r) => {
                    tracing::debug!(strategy = ?strategy, status = %r.status(), "verify attempt rejected");
                    continue;
                }
                Err(e) => {
                    tracing::debug!(strategy = ?strategy, error = %e, "verify attempt failed");
                    continue;
                }
            };

            match response.json::<GatewayVerdict>().await {
                Ok(verdict) if verdict.confirms(&self.auth_key) => return Ok(Some(verdict)),
                Ok(verdict) => {
                    tracing::debug!(strategy = ?strategy, message = ?verdict.message, "verify attempt unconfirmed");
                }
                Err(e) => {
                    tracing::debug!(strategy = ?strategy, error = %e, "verify body unparsable");
                }
            }
        }

        Ok(None)
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_body_raw_string() {
        assert_eq!(parse_token_body("abc123"), Some("abc123".into()));
    }

    #[test]
    fn token_body_quoted_json_string() {
        assert_eq!(parse_token_body("\"abc123\""), Some("abc123".into()));
    }

    #[test]
    fn token_body_object_token_field() {
        assert_eq!(parse_token_body(r#"{"token":"tok-1"}"#), Some("tok-1".into()));
        assert_eq!(parse_token_body(r#"{"data":"tok-2"}"#), Some("tok-2".into()));
    }

    #[test]
    fn token_body_empty_is_none() {
        assert_eq!(parse_token_body(""), None);
        assert_eq!(parse_token_body("\"\""), None);
        assert_eq!(parse_token_body(r#"{"other":"x"}"#), None);
    }

    #[test]
    fn strategy_list_parsing_drops_unknowns() {
        assert_eq!(
            VerifyStrategy::parse_list("strict, plain,bogus,bearer"),
            vec![VerifyStrategy::Strict, VerifyStrategy::Plain, VerifyStrategy::Bearer]
        );
        assert!(VerifyStrategy::parse_list("").is_empty());
    }

    #[test]
    fn verdict_confirmation_requires_key_and_message() {
        let verdict = GatewayVerdict {
            auth_key: Some("key".into()),
            message: Some(PAYMENT_SUCCESS_MESSAGE.into()),
            payment: Some(5000.0),
            sandbox: false,
        };
        assert!(verdict.confirms("key"));
        assert!(!verdict.confirms("other"));

        let unpaid = GatewayVerdict {
            auth_key: Some("key".into()),
            message: Some("payment_pending".into()),
            payment: None,
            sandbox: false,
        };
        assert!(!unpaid.confirms("key"));
        assert_eq!(unpaid.paid_amount(), 0);
    }

    #[test]
    fn urlencode_escapes_reserved_bytes() {
        assert_eq!(urlencode("a b/c"), "a%20b%2Fc");
        assert_eq!(urlencode("token-1_2.3~"), "token-1_2.3~");
    }
}
