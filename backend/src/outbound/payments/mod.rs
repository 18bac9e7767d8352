//! Razorpay payment gateway adapter.
//!
//! Orders are opened over the REST API with basic authentication; the
//! verification signature is HMAC-SHA256 over `"<order_id>|<payment_id>"`
//! keyed with the API secret, hex encoded.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::domain::ports::{GatewayOrder, PaymentGateway, PaymentGatewayError};
use crate::domain::OrderId;

type HmacSha256 = Hmac<Sha256>;

/// Razorpay-backed implementation of the `PaymentGateway` port.
pub struct RazorpayGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    /// Build a gateway client against the production endpoint.
    pub fn new(http: reqwest::Client, key_id: String, key_secret: String) -> Self {
        Self::with_base_url(http, "https://api.razorpay.com".to_owned(), key_id, key_secret)
    }

    /// Build a gateway client against a custom endpoint (used in tests).
    pub fn with_base_url(
        http: reqwest::Client,
        base_url: String,
        key_id: String,
        key_secret: String,
    ) -> Self {
        Self {
            http,
            base_url,
            key_id,
            key_secret,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_minor_units,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await
            .map_err(|err| PaymentGatewayError::unavailable(err.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(PaymentGatewayError::unavailable(format!(
                "gateway returned {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentGatewayError::rejected(format!(
                "gateway returned {status}: {body}"
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|err| PaymentGatewayError::unavailable(format!("bad response: {err}")))?;
        let order_id = OrderId::new(order.id)
            .map_err(|err| PaymentGatewayError::rejected(err.message().to_owned()))?;
        Ok(GatewayOrder {
            order_id,
            amount_minor_units: order.amount,
            currency: order.currency,
        })
    }

    fn expected_signature(&self, order_id: &OrderId, payment_id: &str) -> String {
        #[expect(
            clippy::expect_used,
            reason = "HMAC accepts keys of any length; this cannot fail"
        )]
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
