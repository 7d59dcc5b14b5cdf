//! Shared helpers for tests: state construction and entity factories.

use std::sync::{Arc, Once};

use base64::{Engine as _, engine::general_purpose};
use sqlx::PgPool;
use url::Url;

use crate::{
    AppState,
    ai::client::ProviderClient,
    api::models::users::{CurrentUser, Role},
    build_router,
    config::{Config, EmailTransportConfig, ProvidersConfig, WordPressConfig},
    db::handlers::{Organizations, Profiles, Repository},
    db::models::{organizations::OrganizationCreateDBRequest, profiles::ProfileCreateDBRequest},
    email::EmailService,
    types::OrgId,
    wordpress::WordPressClient,
};

static INIT_ENCRYPTION_KEY: Once = Once::new();

/// Install a fixed ENCRYPTION_KEY for the test process (once).
pub fn set_test_encryption_key() {
    INIT_ENCRYPTION_KEY.call_once(|| {
        let key = general_purpose::STANDARD.encode([7u8; 32]);
        unsafe { std::env::set_var("ENCRYPTION_KEY", key) };
    });
}

/// Test configuration: providers and WordPress pointed at `base_url` (usually
/// a wiremock server), email to a temp directory, fixed JWT secret.
pub fn create_test_config(base_url: &str) -> Config {
    let base = Url::parse(base_url).expect("valid test base URL");
    let email_dir = std::env::temp_dir().join("pressroom-test-emails");

    Config {
        secret_key: Some("test-secret-key".to_string()),
        providers: ProvidersConfig {
            openai_base_url: base.clone(),
            anthropic_base_url: base.clone(),
            google_base_url: base.clone(),
            request_timeout: std::time::Duration::from_secs(5),
        },
        wordpress: WordPressConfig {
            com_client_id: Some("test-client".to_string()),
            com_client_secret: Some("test-secret".to_string()),
            com_api_base_url: base,
            request_timeout: std::time::Duration::from_secs(5),
        },
        email: crate::config::EmailConfig {
            from_email: "noreply@test.local".to_string(),
            from_name: "Pressroom Test".to_string(),
            transport: EmailTransportConfig::File {
                path: email_dir.to_string_lossy().to_string(),
            },
        },
        ..Default::default()
    }
}

/// Build an [`AppState`] over the given pool, with outbound clients pointed
/// at `base_url`.
pub async fn create_test_state(pool: &PgPool, base_url: &str) -> AppState {
    let config = create_test_config(base_url);

    AppState::builder()
        .db(pool.clone())
        .config(config.clone())
        .providers(ProviderClient::new(config.providers.clone()))
        .wordpress(WordPressClient::new(config.wordpress.clone()))
        .email(Arc::new(EmailService::new(&config).expect("test email service")))
        .build()
}

/// Full test server over the real router (outbound clients point at an
/// unroutable localhost port; point them at a mock with
/// [`create_test_state`] + [`build_router`] when a test needs them).
pub async fn create_test_server(pool: &PgPool) -> axum_test::TestServer {
    let state = create_test_state(pool, "http://localhost:9").await;
    let router = build_router(&state).expect("test router");
    axum_test::TestServer::new(router).expect("Failed to create test server")
}

/// Create an organization and return its id
pub async fn create_test_org(pool: &PgPool, name: &str) -> OrgId {
    let mut conn = pool.acquire().await.unwrap();
    Organizations::new(&mut conn)
        .create(&OrganizationCreateDBRequest {
            name: name.to_string(),
            created_by: None,
        })
        .await
        .unwrap()
        .id
}

/// Mint a bearer token for a user, signed with the test config's JWT secret
pub fn test_bearer(user: &CurrentUser) -> String {
    let config = create_test_config("http://localhost:9");
    let token = crate::auth::session::create_session_token(user, &config).expect("test session token");
    format!("Bearer {token}")
}

/// Create a regular member of an organization and return it as a CurrentUser
pub async fn create_test_member(pool: &PgPool, org: OrgId, email: &str) -> CurrentUser {
    create_test_profile(pool, org, email, Role::User, false).await
}

/// Create a profile with the given role/admin flag and return it as a CurrentUser
pub async fn create_test_profile(pool: &PgPool, org: OrgId, email: &str, role: Role, is_admin: bool) -> CurrentUser {
    let mut conn = pool.acquire().await.unwrap();
    let profile = Profiles::new(&mut conn)
        .create(&ProfileCreateDBRequest {
            organization_id: org,
            email: email.to_string(),
            display_name: None,
            role,
            is_admin,
            auth_source: "native".to_string(),
            password_hash: None,
        })
        .await
        .unwrap();

    CurrentUser::from(profile)
}
