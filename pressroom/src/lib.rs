//! # pressroom: Multi-Tenant Content-Operations Backend
//!
//! `pressroom` is the backend of a content-operations dashboard: organizations
//! manage their members, connect a WordPress site, store AI provider API keys,
//! generate newsletters, social threads, summaries, and fact-check reports
//! through those providers, and read usage analytics computed from an activity
//! log.
//!
//! ## Overview
//!
//! Every piece of data belongs to exactly one **organization** (tenant).
//! Members authenticate with email/password and carry a role (`OWNER`,
//! `ADMIN`, `USER`) within their organization; a separate platform admin flag
//! marks operators who may create and delete tenants.
//!
//! The four **tools** (newsletter, thread, lie detector, summary) share one
//! execution path: resolve the organization's active key for the requested
//! provider, assemble a prompt from the form input and the tool's settings,
//! call the provider's structured-generation endpoint, persist the parsed
//! result as content, and append a row to the activity log. Failed
//! invocations are logged too, so the analytics view sees them.
//!
//! The **analytics** endpoint fetches one organization's log rows for a date
//! window and aggregates them in memory ([`analytics::summarize`]) into the
//! fixed summary shape the dashboard charts consume.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL (via `sqlx`) for all persistence.
//! Handlers access the database through per-table repositories ([`db`]),
//! outbound AI and WordPress calls go through shared `reqwest` clients owned
//! by [`AppState`], and every request is authenticated by the `CurrentUser`
//! extractor ([`auth`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use pressroom::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = pressroom::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     pressroom::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
mod crypto;
pub mod db;
mod email;
pub mod errors;
mod openapi;
pub mod telemetry;
mod types;
pub mod wordpress;

#[cfg(test)]
pub mod test_utils;

use crate::{
    ai::client::ProviderClient,
    api::models::users::Role,
    auth::password,
    db::handlers::{Organizations, Profiles, Repository},
    db::models::{organizations::OrganizationCreateDBRequest, profiles::ProfileCreateDBRequest},
    email::EmailService,
    openapi::ApiDoc,
    wordpress::WordPressClient,
};
use axum::{
    Router,
    http::{self, HeaderValue},
    routing::{delete, get, patch, post, put},
};
use bon::Builder;
pub use config::Config;
use config::CorsOrigin;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{ContentId, IntegrationId, InvitationId, LogEntryId, OrgId, ProfileId, ProviderKeyId};

/// Application state shared across all request handlers.
///
/// This is the single injected context object: database pool, configuration,
/// and the shared outbound clients. Handlers never construct clients ad hoc.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub providers: ProviderClient,
    pub wordpress: WordPressClient,
    pub email: Arc<EmailService>,
}

/// Get the pressroom database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial platform admin (and its organization) if absent.
///
/// Idempotent: an existing profile with this email keeps its organization and
/// only has its password updated when one is provided. Called on every
/// startup so a fresh database always has a way in.
#[instrument(skip_all)]
pub async fn create_initial_admin(email: &str, admin_password: Option<&str>, org_name: &str, db: &PgPool) -> anyhow::Result<ProfileId> {
    let password_hash = match admin_password {
        Some(pwd) => Some(password::hash_string(pwd).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?),
        None => None,
    };

    let mut tx = db.begin().await?;
    let mut profile_repo = Profiles::new(&mut tx);

    if let Some(existing) = profile_repo
        .get_by_email(email)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to check existing admin: {e}"))?
    {
        if let Some(hash) = password_hash {
            profile_repo
                .set_password(existing.id, &hash)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to update admin password: {e}"))?;
        }
        tx.commit().await?;
        return Ok(existing.id);
    }

    // The admin needs a tenant to live in; reuse one with the configured name
    // if it already exists
    let mut org_repo = Organizations::new(&mut tx);
    let organization = match org_repo
        .get_by_name(org_name)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to look up admin organization: {e}"))?
    {
        Some(org) => org,
        None => org_repo
            .create(&OrganizationCreateDBRequest {
                name: org_name.to_string(),
                created_by: None,
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create admin organization: {e}"))?,
    };

    let mut profile_repo = Profiles::new(&mut tx);
    let profile = profile_repo
        .create(&ProfileCreateDBRequest {
            organization_id: organization.id,
            email: email.to_string(),
            display_name: None,
            role: Role::Owner,
            is_admin: true,
            auth_source: "system".to_string(),
            password_hash,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin profile: {e}"))?;

    tx.commit().await?;
    info!("Created initial admin user {}", email);
    Ok(profile.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// - Authentication routes at root level (`/authentication/*`)
/// - Management API at `/admin/api/v1/*`
/// - OpenAPI document and interactive docs
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Authentication routes (at root level)
    let auth_routes = Router::new()
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .route("/authentication/password-change", post(api::handlers::auth::change_password))
        .route(
            "/authentication/invitations/{id}/accept",
            post(api::handlers::auth::accept_invitation),
        )
        .with_state(state.clone());

    // Management API routes
    let api_routes = Router::new()
        // Profiles
        .route("/users/me", get(api::handlers::users::get_current_profile))
        .route("/users", get(api::handlers::users::list_profiles))
        .route("/users/invitations", post(api::handlers::users::invite_user))
        .route("/users/{id}", get(api::handlers::users::get_profile))
        .route("/users/{id}", patch(api::handlers::users::update_profile))
        .route("/users/{id}", delete(api::handlers::users::delete_profile))
        // Organizations
        .route("/organizations", post(api::handlers::organizations::create_organization))
        .route("/organizations", get(api::handlers::organizations::list_organizations))
        .route("/organizations/{id}", get(api::handlers::organizations::get_organization))
        .route("/organizations/{id}", patch(api::handlers::organizations::update_organization))
        .route("/organizations/{id}", delete(api::handlers::organizations::delete_organization))
        // Provider keys
        .route(
            "/organizations/{org_id}/provider-keys",
            get(api::handlers::provider_keys::list_provider_keys).post(api::handlers::provider_keys::create_provider_key),
        )
        .route(
            "/organizations/{org_id}/provider-keys/{id}",
            patch(api::handlers::provider_keys::update_provider_key).delete(api::handlers::provider_keys::delete_provider_key),
        )
        // Tool settings
        .route(
            "/organizations/{org_id}/tool-settings",
            get(api::handlers::tool_settings::list_tool_settings),
        )
        .route(
            "/organizations/{org_id}/tool-settings/{tool}",
            put(api::handlers::tool_settings::upsert_tool_settings).delete(api::handlers::tool_settings::delete_tool_settings),
        )
        // WordPress integration
        .route(
            "/organizations/{org_id}/wordpress",
            get(api::handlers::wordpress::list_integrations).put(api::handlers::wordpress::save_credentials),
        )
        .route("/organizations/{org_id}/wordpress/test", post(api::handlers::wordpress::test_connection))
        .route(
            "/organizations/{org_id}/wordpress/oauth/authorize-url",
            get(api::handlers::wordpress::oauth_authorize_url),
        )
        .route(
            "/organizations/{org_id}/wordpress/oauth/exchange",
            post(api::handlers::wordpress::oauth_exchange),
        )
        .route(
            "/organizations/{org_id}/wordpress/{id}",
            delete(api::handlers::wordpress::delete_integration),
        )
        // Tools
        .route("/tools/newsletter", post(api::handlers::tools::generate_newsletter))
        .route("/tools/thread", post(api::handlers::tools::generate_thread))
        .route("/tools/lie-detector", post(api::handlers::tools::generate_lie_detector))
        .route("/tools/summary", post(api::handlers::tools::generate_summary))
        // Content
        .route("/content", get(api::handlers::content::list_content))
        .route(
            "/content/{id}",
            get(api::handlers::content::get_content).delete(api::handlers::content::delete_content),
        )
        // Analytics + logs
        .route("/analytics", get(api::handlers::analytics::get_analytics))
        .route("/logs", get(api::handlers::logs::list_logs))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/admin/api/v1", api_routes)
        .merge(Scalar::with_url("/admin/docs", ApiDoc::openapi()))
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        );

    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    // Tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, ensures the initial admin exists, and builds the router
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPool::connect(&config.database_url).await?;
        migrator().run(&pool).await?;

        create_initial_admin(&config.admin_email, config.admin_password.as_deref(), &config.admin_organization, &pool).await?;

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .providers(ProviderClient::new(config.providers.clone()))
            .wordpress(WordPressClient::new(config.wordpress.clone()))
            .email(Arc::new(EmailService::new(&config)?))
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Pressroom listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{create_test_member, create_test_org, create_test_server, set_test_encryption_key, test_bearer};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz_and_docs(pool: PgPool) {
        set_test_encryption_key();
        let server = create_test_server(&pool).await;

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        assert_eq!(health.text(), "OK");

        let docs = server.get("/api-docs/openapi.json").await;
        docs.assert_status_ok();
        assert!(docs.text().contains("/tools/newsletter"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_initial_admin_is_idempotent(pool: PgPool) {
        let first = create_initial_admin("admin@example.com", Some("hunter2hunter2"), "Platform", &pool)
            .await
            .unwrap();
        let second = create_initial_admin("admin@example.com", Some("changed-password"), "Platform", &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let profile = Profiles::new(&mut conn).get_by_email("admin@example.com").await.unwrap().unwrap();
        assert!(profile.is_admin);
        assert_eq!(profile.role, Role::Owner);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_flow_end_to_end(pool: PgPool) {
        set_test_encryption_key();
        create_initial_admin("admin@example.com", Some("hunter2hunter2"), "Platform", &pool)
            .await
            .unwrap();
        let server = create_test_server(&pool).await;

        // Wrong password is rejected
        let bad = server
            .post("/authentication/login")
            .json(&serde_json::json!({"email": "admin@example.com", "password": "wrong"}))
            .await;
        bad.assert_status_unauthorized();

        // Correct password sets a session cookie
        let good = server
            .post("/authentication/login")
            .json(&serde_json::json!({"email": "admin@example.com", "password": "hunter2hunter2"}))
            .await;
        good.assert_status_ok();
        let cookie_header = good
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .expect("login should set a cookie")
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie_header.contains("pressroom_session="));

        // Unauthenticated API access is rejected
        let anonymous = server.get("/admin/api/v1/users/me").await;
        anonymous.assert_status_unauthorized();

        // The session cookie authenticates API access
        let token = cookie_header
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, v)| v.to_string())
            .unwrap();
        let me = server
            .get("/admin/api/v1/users/me")
            .add_header("authorization", format!("Bearer {token}"))
            .await;
        me.assert_status_ok();
        assert!(me.text().contains("admin@example.com"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_organization_management_requires_platform_admin(pool: PgPool) {
        set_test_encryption_key();
        create_initial_admin("admin@example.com", Some("hunter2hunter2"), "Platform", &pool)
            .await
            .unwrap();
        let server = create_test_server(&pool).await;

        // A regular member may not create or list organizations
        let org = create_test_org(&pool, "Member Org").await;
        let member = create_test_member(&pool, org, "member@example.com").await;
        let forbidden = server
            .post("/admin/api/v1/organizations")
            .add_header("authorization", test_bearer(&member))
            .json(&serde_json::json!({"name": "Sneaky Org"}))
            .await;
        forbidden.assert_status_forbidden();

        let forbidden_list = server
            .get("/admin/api/v1/organizations")
            .add_header("authorization", test_bearer(&member))
            .await;
        forbidden_list.assert_status_forbidden();

        // The platform admin creates a tenant with an invited owner
        let login = server
            .post("/authentication/login")
            .json(&serde_json::json!({"email": "admin@example.com", "password": "hunter2hunter2"}))
            .await;
        login.assert_status_ok();
        let token = login
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, v)| v.to_string())
            .unwrap();

        let created = server
            .post("/admin/api/v1/organizations")
            .add_header("authorization", format!("Bearer {token}"))
            .json(&serde_json::json!({"name": "Fresh Tenant", "owner_email": "owner@freshtenant.example"}))
            .await;
        created.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = created.json();
        assert_eq!(body["organization"]["name"], "Fresh Tenant");
        assert_eq!(body["owner_invitation"]["profile"]["role"], "OWNER");
        assert_eq!(body["owner_invitation"]["profile"]["activated"], false);

        let listed = server
            .get("/admin/api/v1/organizations")
            .add_header("authorization", format!("Bearer {token}"))
            .await;
        listed.assert_status_ok();
        assert!(listed.text().contains("Fresh Tenant"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_analytics_endpoint_returns_empty_summary_without_rows(pool: PgPool) {
        set_test_encryption_key();
        let server = create_test_server(&pool).await;
        let org = create_test_org(&pool, "Quiet Org").await;
        let member = create_test_member(&pool, org, "quiet@example.com").await;

        let response = server
            .get("/admin/api/v1/analytics")
            .add_header("authorization", test_bearer(&member))
            .await;
        response.assert_status_ok();

        let summary: serde_json::Value = response.json();
        assert_eq!(summary["tool_usage"], serde_json::json!([]));
        assert_eq!(summary["daily_activity"], serde_json::json!([]));
        assert_eq!(summary["top_users"], serde_json::json!([]));

        // An inverted date range is rejected
        let inverted = server
            .get("/admin/api/v1/analytics?from=2024-06-10&to=2024-06-01")
            .add_header("authorization", test_bearer(&member))
            .await;
        inverted.assert_status_bad_request();
    }
}
