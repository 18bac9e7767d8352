//! Backend entry-point: loads configuration and starts the HTTP server.

use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use backend::server::{self, AppConfig};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config =
        AppConfig::load().map_err(|e| std::io::Error::other(format!("config error: {e}")))?;

    server::run(config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))
}
