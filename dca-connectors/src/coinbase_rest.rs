//! Coinbase Pro REST API Client
//!
//! Provides exactly the three calls a run needs:
//! - Listing the product catalog (public)
//! - Placing a market order (signed)
//! - Fetching an order by identifier (signed)
//!
//! # Authentication
//!
//! Signed requests carry four headers:
//! - `CB-ACCESS-KEY`: the API key
//! - `CB-ACCESS-TIMESTAMP`: unix seconds
//! - `CB-ACCESS-PASSPHRASE`: the key's passphrase
//! - `CB-ACCESS-SIGN`: base64(HMAC-SHA256(base64-decode(secret), timestamp + METHOD + path + body))

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

use dca_domain::{ApiCredentials, Environment, Order, OrderQuantity, OrderRequest, OrderSide, Product};

// =============================================================================
// Constants
// =============================================================================

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur in the Coinbase REST client.
#[derive(Debug, Clone, Error)]
pub enum CoinbaseRestError {
    /// Failed to build request signature
    #[error("Failed to build signature: {0}")]
    SignatureError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// API returned an error message where data was required
    #[error("Coinbase API error: {0}")]
    ApiError(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,
}

// =============================================================================
// Replies
// =============================================================================

/// Decoded reply from an endpoint that may answer with an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinbaseReply<T> {
    /// Expected payload
    Ok(T),
    /// Body carried a `message` field instead
    Message {
        /// HTTP status of the reply
        status: u16,
        /// Exchange message, verbatim
        message: String,
    },
}

/// Message Coinbase returns for an unknown order id
pub const NOT_FOUND_MESSAGE: &str = "NotFound";

/// Coinbase error body.
#[derive(Debug, Deserialize)]
struct CoinbaseErrorResponse {
    message: String,
}

/// Interpret a raw reply.
///
/// A body with a `message` field is an exchange message whatever the HTTP
/// status. A 404 without one reads as `NotFound`. Any other non-2xx reply is
/// a request failure.
pub fn parse_reply<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<CoinbaseReply<T>, CoinbaseRestError> {
    if let Ok(err) = serde_json::from_str::<CoinbaseErrorResponse>(body) {
        return Ok(CoinbaseReply::Message {
            status: status.as_u16(),
            message: err.message,
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Ok(CoinbaseReply::Message {
            status: status.as_u16(),
            message: NOT_FOUND_MESSAGE.to_string(),
        });
    }

    if !status.is_success() {
        return Err(CoinbaseRestError::RequestFailed(format!("HTTP {}: {}", status, body)));
    }

    serde_json::from_str(body)
        .map(CoinbaseReply::Ok)
        .map_err(|e| CoinbaseRestError::ParseError(e.to_string()))
}

/// JSON body for `POST /orders`.
#[derive(Debug, Serialize)]
struct MarketOrderBody<'a> {
    product_id: &'a str,
    side: OrderSide,
    #[serde(rename = "type")]
    order_type: &'static str,
    #[serde(flatten)]
    quantity: OrderQuantity,
}

impl<'a> From<&'a OrderRequest> for MarketOrderBody<'a> {
    fn from(request: &'a OrderRequest) -> Self {
        Self {
            product_id: &request.product_id,
            side: request.side,
            order_type: "market",
            quantity: request.quantity,
        }
    }
}

// =============================================================================
// Coinbase REST Client
// =============================================================================

/// Coinbase Pro REST API client.
pub struct CoinbaseRestClient {
    /// HTTP client
    client: Client,
    /// Key, secret and passphrase
    credentials: ApiCredentials,
    /// API root, no trailing slash
    base_url: String,
    /// Log every request and response body
    debug: bool,
}

impl CoinbaseRestClient {
    /// Create a client for `environment`.
    pub fn new(credentials: ApiCredentials, environment: Environment) -> Self {
        Self {
            client: Client::new(),
            credentials,
            base_url: environment.base_url().to_string(),
            debug: false,
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Log request and response bodies at debug level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// API root in use.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Compute the `CB-ACCESS-SIGN` value for one request.
    fn sign(
        &self,
        timestamp: &str,
        method: &Method,
        path: &str,
        body: &str,
    ) -> Result<String, CoinbaseRestError> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        type HmacSha256 = Hmac<Sha256>;

        let key = STANDARD
            .decode(self.credentials.api_secret.as_bytes())
            .map_err(|e| CoinbaseRestError::SignatureError(format!("Secret is not base64: {}", e)))?;

        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| CoinbaseRestError::SignatureError(format!("HMAC error: {}", e)))?;

        mac.update(timestamp.as_bytes());
        mac.update(method.as_str().as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Send one request and return the status and raw body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        signed: bool,
    ) -> Result<(StatusCode, String), CoinbaseRestError> {
        let url = format!("{}{}", self.base_url, path);
        let payload = body.unwrap_or_default();

        if self.debug {
            debug!(%method, %url, body = %payload, "Coinbase request");
        }

        let mut request = self.client.request(method.clone(), &url);

        if signed {
            let timestamp = Utc::now().timestamp().to_string();
            let signature = self.sign(&timestamp, &method, path, &payload)?;
            request = request
                .header("CB-ACCESS-KEY", &self.credentials.api_key)
                .header("CB-ACCESS-SIGN", signature)
                .header("CB-ACCESS-TIMESTAMP", timestamp)
                .header("CB-ACCESS-PASSPHRASE", self.credentials.passphrase.as_str());
        }

        if !payload.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(payload);
        }

        let response = timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS), request.send())
            .await
            .map_err(|_| CoinbaseRestError::Timeout)?
            .map_err(|e| CoinbaseRestError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| CoinbaseRestError::ParseError(e.to_string()))?;

        if self.debug {
            debug!(%status, %url, %body, "Coinbase response");
        }

        Ok((status, body))
    }

    // =========================================================================
    // Endpoints
    // =========================================================================

    /// List every product.
    ///
    /// # Endpoint
    ///
    /// `GET /products` (public)
    pub async fn get_products(&self) -> Result<Vec<Product>, CoinbaseRestError> {
        let (status, body) = self.send(Method::GET, "/products", None, false).await?;

        match parse_reply(status, &body)? {
            CoinbaseReply::Ok(products) => Ok(products),
            CoinbaseReply::Message { message, .. } => Err(CoinbaseRestError::ApiError(message)),
        }
    }

    /// Place a market order.
    ///
    /// # Endpoint
    ///
    /// `POST /orders` with `{product_id, side, type: "market", size|funds}`
    ///
    /// # Example
    ///
    /// ```ignore
    /// match client.place_market_order(&request).await? {
    ///     CoinbaseReply::Ok(order) => println!("order_id: {}", order.id),
    ///     CoinbaseReply::Message { message, .. } => eprintln!("{}", message),
    /// }
    /// ```
    pub async fn place_market_order(
        &self,
        request: &OrderRequest,
    ) -> Result<CoinbaseReply<Order>, CoinbaseRestError> {
        let body = serde_json::to_string(&MarketOrderBody::from(request))
            .map_err(|e| CoinbaseRestError::ParseError(e.to_string()))?;

        let (status, body) = self.send(Method::POST, "/orders", Some(body), true).await?;

        parse_reply(status, &body)
    }

    /// Fetch an order.
    ///
    /// # Endpoint
    ///
    /// `GET /orders/{order_id}`. Orders cancelled before any fill answer
    /// with `{"message": "NotFound"}`.
    pub async fn get_order(&self, order_id: &str) -> Result<CoinbaseReply<Order>, CoinbaseRestError> {
        let path = format!("/orders/{}", order_id);
        let (status, body) = self.send(Method::GET, &path, None, true).await?;

        parse_reply(status, &body)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dca_domain::OrderStatus;
    use rust_decimal_macros::dec;

    // base64 of "0123456789abcdef0123456789abcdef"
    const SECRET: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

    fn client(secret: &str) -> CoinbaseRestClient {
        CoinbaseRestClient::new(
            ApiCredentials::new("test_key", secret, "test_passphrase"),
            Environment::Sandbox,
        )
    }

    #[test]
    fn test_sign_is_deterministic() {
        let client = client(SECRET);

        let a = client.sign("1700000000", &Method::GET, "/orders/abc123", "").unwrap();
        let b = client.sign("1700000000", &Method::GET, "/orders/abc123", "").unwrap();

        assert_eq!(a, b);
        // base64 of a 32-byte digest
        assert_eq!(a.len(), 44);
        assert!(STANDARD.decode(&a).is_ok());
    }

    #[test]
    fn test_sign_covers_every_component() {
        let client = client(SECRET);
        let base = client.sign("1700000000", &Method::POST, "/orders", "{}").unwrap();

        assert_ne!(base, client.sign("1700000001", &Method::POST, "/orders", "{}").unwrap());
        assert_ne!(base, client.sign("1700000000", &Method::GET, "/orders", "{}").unwrap());
        assert_ne!(base, client.sign("1700000000", &Method::POST, "/products", "{}").unwrap());
        assert_ne!(base, client.sign("1700000000", &Method::POST, "/orders", "").unwrap());
    }

    #[test]
    fn test_sign_rejects_non_base64_secret() {
        let client = client("not base64!");
        let result = client.sign("1700000000", &Method::GET, "/orders", "");
        assert!(matches!(result, Err(CoinbaseRestError::SignatureError(_))));
    }

    #[test]
    fn test_base_url_selection() {
        assert_eq!(client(SECRET).base_url(), "https://api-public.sandbox.pro.coinbase.com");

        let overridden = client(SECRET).with_base_url("http://localhost:8080/");
        assert_eq!(overridden.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_market_order_body_funds() {
        let request = OrderRequest {
            product_id: "BTC-USD".to_string(),
            side: OrderSide::Buy,
            quantity: OrderQuantity::Funds(dec!(14.00)),
        };

        let json: serde_json::Value =
            serde_json::to_value(MarketOrderBody::from(&request)).unwrap();

        assert_eq!(json["product_id"], "BTC-USD");
        assert_eq!(json["side"], "buy");
        assert_eq!(json["type"], "market");
        assert_eq!(json["funds"], "14.00");
        assert!(json.get("size").is_none());
    }

    #[test]
    fn test_market_order_body_size() {
        let request = OrderRequest {
            product_id: "ETH-BTC".to_string(),
            side: OrderSide::Sell,
            quantity: OrderQuantity::Size(dec!(2.50000000)),
        };

        let json: serde_json::Value =
            serde_json::to_value(MarketOrderBody::from(&request)).unwrap();

        assert_eq!(json["side"], "sell");
        assert_eq!(json["size"], "2.50000000");
        assert!(json.get("funds").is_none());
    }

    #[test]
    fn test_parse_reply_order() {
        let body = r#"{"id": "abc123", "status": "pending", "product_id": "BTC-USD"}"#;
        let reply: CoinbaseReply<Order> = parse_reply(StatusCode::OK, body).unwrap();

        match reply {
            CoinbaseReply::Ok(order) => {
                assert_eq!(order.id, "abc123");
                assert_eq!(order.status, OrderStatus::Pending);
            },
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_parse_reply_message_on_error_status() {
        let reply: CoinbaseReply<Order> =
            parse_reply(StatusCode::BAD_REQUEST, r#"{"message": "Insufficient funds"}"#).unwrap();

        assert_eq!(
            reply,
            CoinbaseReply::Message {
                status: 400,
                message: "Insufficient funds".to_string()
            }
        );
    }

    #[test]
    fn test_parse_reply_not_found() {
        let reply: CoinbaseReply<Order> =
            parse_reply(StatusCode::NOT_FOUND, r#"{"message": "NotFound"}"#).unwrap();

        assert!(matches!(reply, CoinbaseReply::Message { status: 404, ref message } if message == "NotFound"));
    }

    #[test]
    fn test_parse_reply_error_without_message() {
        let result: Result<CoinbaseReply<Order>, _> =
            parse_reply(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");

        assert!(matches!(result, Err(CoinbaseRestError::RequestFailed(_))));
    }

    #[test]
    fn test_parse_reply_bare_not_found() {
        for body in ["", "<html>404 page not found</html>"] {
            let reply: CoinbaseReply<Order> = parse_reply(StatusCode::NOT_FOUND, body).unwrap();
            assert_eq!(
                reply,
                CoinbaseReply::Message {
                    status: 404,
                    message: NOT_FOUND_MESSAGE.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_parse_reply_garbage_body() {
        let result: Result<CoinbaseReply<Vec<Product>>, _> = parse_reply(StatusCode::OK, "not json");
        assert!(matches!(result, Err(CoinbaseRestError::ParseError(_))));
    }
}
