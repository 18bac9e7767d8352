//! Application configuration loaded via OrthoConfig.
//!
//! Values layer from defaults, configuration files, `LMS_`-prefixed
//! environment variables, and CLI flags.

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Runtime configuration for the service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LMS")]
pub struct AppConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// Address to bind the HTTP listener to.
    pub bind_address: Option<String>,
    /// Port for the HTTP listener.
    #[ortho_config(default = 8080)]
    pub port: u16,
    /// Secret used to sign access, refresh, and reset tokens.
    pub jwt_secret: String,
    /// Base URL of the web frontend, used in password-reset links.
    pub frontend_url: Option<String>,

    /// Razorpay API key id.
    pub razorpay_key_id: String,
    /// Razorpay API key secret.
    pub razorpay_key_secret: String,

    /// Cloudinary cloud name.
    pub cloudinary_cloud_name: String,
    /// Cloudinary API key.
    pub cloudinary_api_key: String,
    /// Cloudinary API secret.
    pub cloudinary_api_secret: String,

    /// Brevo API key.
    pub brevo_api_key: String,
    /// Sender name for transactional mail.
    pub mail_sender_name: Option<String>,
    /// Sender address for transactional mail.
    pub mail_sender_email: String,

    /// Maximum PostgreSQL pool size.
    #[ortho_config(default = 10)]
    pub db_pool_size: u32,
    /// Maximum Redis pool size.
    #[ortho_config(default = 10)]
    pub redis_pool_size: u32,
    /// Connection checkout timeout in seconds, shared by both pools.
    #[ortho_config(default = 30)]
    pub connection_timeout_secs: u64,
}

impl AppConfig {
    /// The bind address, defaulting to all interfaces.
    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    /// The frontend base URL, defaulting to the local dev server.
    pub fn frontend_url(&self) -> &str {
        self.frontend_url.as_deref().unwrap_or(DEFAULT_FRONTEND_URL)
    }

    /// The mail sender name, defaulting to the service name.
    pub fn mail_sender_name(&self) -> &str {
        self.mail_sender_name.as_deref().unwrap_or("Learning Platform")
    }
}
