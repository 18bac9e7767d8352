//! Ports onto external services: the payment gateway, the media host, the
//! transactional mail sender, and password hashing.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::Error as DomainError;
use crate::domain::payment::OrderId;

/// Failure raised by the payment gateway.
#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    /// The gateway could not be reached or returned a server error.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
    /// The gateway rejected the order request.
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
}

impl PaymentGatewayError {
    /// Build a [`PaymentGatewayError::Unavailable`].
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::Unavailable(detail.into())
    }

    /// Build a [`PaymentGatewayError::Rejected`].
    pub fn rejected(detail: impl Into<String>) -> Self {
        Self::Rejected(detail.into())
    }
}

impl From<PaymentGatewayError> for DomainError {
    fn from(err: PaymentGatewayError) -> Self {
        match err {
            PaymentGatewayError::Unavailable(detail) => {
                Self::upstream(format!("Payment gateway unavailable: {detail}"))
            }
            PaymentGatewayError::Rejected(detail) => {
                Self::invalid_request(format!("Payment gateway rejected the order: {detail}"))
            }
        }
    }
}

/// Order opened on the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub order_id: OrderId,
    pub amount_minor_units: i64,
    pub currency: String,
}

/// Payment gateway port.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an order for the given minor-unit amount.
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentGatewayError>;

    /// The signature the gateway would produce for this order and payment.
    ///
    /// Verification compares this against the caller-supplied signature
    /// with exact string equality.
    fn expected_signature(&self, order_id: &OrderId, payment_id: &str) -> String;
}

/// Failure raised by the media host.
#[derive(Debug, Clone, Error)]
pub enum MediaHostError {
    #[error("media upload failed: {0}")]
    Upload(String),
    #[error("media deletion failed: {0}")]
    Delete(String),
}

impl MediaHostError {
    /// Build a [`MediaHostError::Upload`].
    pub fn upload(detail: impl Into<String>) -> Self {
        Self::Upload(detail.into())
    }

    /// Build a [`MediaHostError::Delete`].
    pub fn delete(detail: impl Into<String>) -> Self {
        Self::Delete(detail.into())
    }
}

impl From<MediaHostError> for DomainError {
    fn from(err: MediaHostError) -> Self {
        Self::upstream(err.to_string())
    }
}

/// Kind of asset held on the media host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// An asset stored on the media host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub url: String,
    pub external_id: String,
}

/// Media host port.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedAsset, MediaHostError>;
    async fn upload_video(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedAsset, MediaHostError>;
    async fn delete(&self, external_id: &str, kind: MediaKind) -> Result<(), MediaHostError>;
}

/// Failure raised by the mail sender.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("mail delivery failed: {0}")]
    Send(String),
}

impl NotifyError {
    /// Build a [`NotifyError::Send`].
    pub fn send(detail: impl Into<String>) -> Self {
        Self::Send(detail.into())
    }
}

/// A transactional email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Transactional mail port. Deliveries are fire-and-forget; no workflow
/// outcome depends on one succeeding.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError>;
}

/// Failure raised by the password hasher.
#[derive(Debug, Clone, Error)]
pub enum PasswordHashError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl PasswordHashError {
    /// Build a [`PasswordHashError::Hash`].
    pub fn hash(detail: impl Into<String>) -> Self {
        Self::Hash(detail.into())
    }
}

impl From<PasswordHashError> for DomainError {
    fn from(err: PasswordHashError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Password hashing port. Hashing is deliberately expensive, so the
/// operations are async and a real implementation moves the work off the
/// request executor.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError>;
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
