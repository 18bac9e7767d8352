//! Server wiring: adapters, services, routes, and startup.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpResponse, HttpServer, Scope};
use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;
use tracing::info;
use utoipa::OpenApi;

use crate::domain::ports::{CacheError, KeyValueCache};
use crate::domain::{
    AccountService, CachePolicy, CatalogueService, EnrollmentService, Notifications,
    TicketService, TokenIssuer,
};
use crate::doc::ApiDoc;
use crate::inbound::http::{self, HttpState, RateLimiter};
use crate::outbound::cache::RedisKeyValueCache;
use crate::outbound::media::CloudinaryMediaHost;
use crate::outbound::notify::BrevoNotifier;
use crate::outbound::payments::RazorpayGateway;
use crate::outbound::persistence::{
    DbPool, DieselCourseRepository, DieselEnrollmentRepository, DieselPaymentRepository,
    DieselTicketRepository, DieselUserRepository, PoolConfig, PoolError,
};
use crate::outbound::security::BcryptPasswordHasher;

pub use config::AppConfig;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Errors that can abort startup.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("database pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Apply pending migrations over a dedicated blocking connection.
async fn run_migrations(database_url: String) -> Result<(), BootError> {
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|err| BootError::Migration(err.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| BootError::Migration(err.to_string()))?;
        Ok(())
    })
    .await
    .map_err(|err| BootError::Migration(format!("migration task panicked: {err}")))?
}

/// Construct every adapter and service from configuration.
pub async fn build_state(config: &AppConfig) -> Result<HttpState, BootError> {
    let timeout = Duration::from_secs(config.connection_timeout_secs);

    let pool = DbPool::new(
        PoolConfig::new(&config.database_url)
            .with_max_size(config.db_pool_size)
            .with_connection_timeout(timeout),
    )
    .await?;

    let cache: Arc<dyn KeyValueCache> = Arc::new(
        RedisKeyValueCache::connect(&config.redis_url, config.redis_pool_size, timeout).await?,
    );
    let policy = CachePolicy::new(Arc::clone(&cache));

    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let courses = Arc::new(DieselCourseRepository::new(pool.clone()));
    let enrollments = Arc::new(DieselEnrollmentRepository::new(pool.clone()));
    let payments = Arc::new(DieselPaymentRepository::new(pool.clone()));
    let tickets = Arc::new(DieselTicketRepository::new(pool));

    let http_client = outbound_http_client(timeout)?;
    let gateway = Arc::new(RazorpayGateway::new(
        http_client.clone(),
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    ));
    let media = Arc::new(CloudinaryMediaHost::new(
        http_client.clone(),
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_api_key.clone(),
        config.cloudinary_api_secret.clone(),
    ));
    let notifier = Arc::new(BrevoNotifier::new(
        http_client,
        config.brevo_api_key.clone(),
        config.mail_sender_name().to_owned(),
        config.mail_sender_email.clone(),
    ));
    let notifications = Notifications::new(notifier);

    let tokens = TokenIssuer::new(&config.jwt_secret);
    let hasher = Arc::new(BcryptPasswordHasher::new());

    let catalogue = Arc::new(CatalogueService::new(
        courses.clone(),
        enrollments.clone(),
        users.clone(),
        media,
        policy.clone(),
    ));
    let enrollment_service = Arc::new(EnrollmentService::new(
        courses,
        enrollments,
        payments,
        gateway,
        policy.clone(),
    ));
    let ticket_service = Arc::new(TicketService::new(
        users.clone(),
        tickets,
        notifications.clone(),
        policy.clone(),
    ));
    let accounts = Arc::new(AccountService::new(
        users,
        hasher,
        tokens.clone(),
        Arc::clone(&cache),
        policy,
        notifications,
        config.frontend_url().to_owned(),
    ));

    Ok(HttpState {
        catalogue,
        enrollments: enrollment_service,
        tickets: ticket_service,
        accounts,
        tokens,
        rate_limiter: RateLimiter::new(cache),
    })
}

/// Shared client for the payment gateway, media host, and mail sender.
/// Every request it issues is bounded by the configured timeout.
fn outbound_http_client(timeout: Duration) -> Result<reqwest::Client, BootError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?)
}

/// Every route under `/api/v1`.
///
/// Literal segments (`/courses/mine`, `/courses/enrolled`) register before
/// the `{id}` routes so they are not captured as identifiers.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .service(http::accounts::register)
        .service(http::accounts::verify_registration)
        .service(http::accounts::login)
        .service(http::accounts::refresh)
        .service(http::accounts::logout)
        .service(http::accounts::forgot_password)
        .service(http::accounts::reset_password)
        .service(http::accounts::select_role)
        .service(http::accounts::me)
        .service(http::courses::list)
        .service(http::courses::mine)
        .service(http::courses::enrolled)
        .service(http::courses::create)
        .service(http::enrollments::enroll)
        .service(http::enrollments::unenroll)
        .service(http::enrollments::list_mine)
        .service(http::enrollments::count)
        .service(http::payments::checkout)
        .service(http::payments::verify)
        .service(http::courses::remove_video)
        .service(http::courses::detail)
        .service(http::courses::update)
        .service(http::courses::remove)
        .service(http::tickets::create)
        .service(http::tickets::mine)
        .service(http::tickets::list_open)
        .service(http::tickets::resolve)
        .route(
            "/openapi.json",
            web::get().to(|| async { HttpResponse::Ok().json(ApiDoc::openapi()) }),
        )
}

/// Run migrations, wire the application, and serve until shutdown.
pub async fn run(config: AppConfig) -> Result<(), BootError> {
    run_migrations(config.database_url.clone()).await?;
    let state = build_state(&config).await?;

    let bind = (config.bind_address().to_owned(), config.port);
    info!(address = %bind.0, port = bind.1, "starting http server");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .service(api_scope())
    })
    .bind(bind)?
    .run()
    .await?;
    Ok(())
}
