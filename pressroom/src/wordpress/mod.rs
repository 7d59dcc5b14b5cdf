//! WordPress REST integration.
//!
//! Two connection flavors, matching the dashboard's integration screen:
//!
//! - **Self-hosted**: the site's REST API at `{site}/wp-json`, authenticated
//!   with an application password over HTTP Basic. [`WordPressClient::test_connection`]
//!   probes site metadata and the post count without persisting anything.
//! - **WordPress.com**: OAuth2 against `public-api.wordpress.com`. The
//!   authorize URL carries a signed `state` bound to the organization, and
//!   [`WordPressClient::exchange_code`] turns the callback code into an access
//!   token.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::{
    api::models::wordpress::{WordPressCredentials, WordPressTestResponse},
    config::{Config, WordPressConfig},
    errors::Error,
    types::OrgId,
};

/// Header WordPress uses to report the total number of posts for a collection
const WP_TOTAL_HEADER: &str = "x-wp-total";

/// How long an OAuth state value stays valid
const STATE_TTL_SECS: i64 = 15 * 60;

#[derive(Debug, Clone)]
pub struct WordPressClient {
    http: Client,
    config: WordPressConfig,
}

/// Site metadata from `{site}/wp-json`
#[derive(Debug, Deserialize)]
struct SiteInfo {
    name: Option<String>,
    description: Option<String>,
}

/// Token response from the WordPress.com OAuth2 token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub blog_url: Option<String>,
}

/// Claims of the signed OAuth `state` value
#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    org: OrgId,
    purpose: String,
    exp: i64,
}

impl WordPressClient {
    pub fn new(config: WordPressConfig) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { http, config }
    }

    /// Probe a self-hosted site: metadata from `/wp-json`, post count from the
    /// posts collection headers. Nothing is stored.
    #[instrument(skip(self, credentials), fields(site = %credentials.site_url), err)]
    pub async fn test_connection(&self, credentials: &WordPressCredentials) -> Result<WordPressTestResponse, Error> {
        let site = parse_site_url(&credentials.site_url)?;

        let root_url = site.join("wp-json").map_err(|e| wp_error(format!("construct URL: {e}")))?;
        debug!("Probing WordPress site metadata at {}", root_url);

        let root_response = self
            .http
            .get(root_url)
            .basic_auth(&credentials.username, Some(&credentials.app_password))
            .send()
            .await
            .map_err(|e| wp_error(e.to_string()))?;

        if !root_response.status().is_success() {
            return Err(wp_error(format!("site metadata request returned {}", root_response.status())));
        }

        let site_info: SiteInfo = root_response.json().await.map_err(|e| wp_error(format!("parse site metadata: {e}")))?;

        let posts_url = site
            .join("wp-json/wp/v2/posts?per_page=1")
            .map_err(|e| wp_error(format!("construct URL: {e}")))?;

        let posts_response = self
            .http
            .get(posts_url)
            .basic_auth(&credentials.username, Some(&credentials.app_password))
            .send()
            .await
            .map_err(|e| wp_error(e.to_string()))?;

        if !posts_response.status().is_success() {
            return Err(wp_error(format!("posts request returned {}", posts_response.status())));
        }

        let post_count = posts_response
            .headers()
            .get(WP_TOTAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        Ok(WordPressTestResponse {
            site_name: site_info.name,
            description: site_info.description,
            post_count,
        })
    }

    /// Build the WordPress.com OAuth2 authorize URL
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, Error> {
        let client_id = self.config.com_client_id.as_ref().ok_or_else(|| Error::BadRequest {
            message: "WordPress.com integration is not configured (missing client id)".to_string(),
        })?;

        let mut url = self
            .config
            .com_api_base_url
            .join("oauth2/authorize")
            .map_err(|e| wp_error(format!("construct URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange an authorization code for an access token
    #[instrument(skip(self, code), err)]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<OAuthToken, Error> {
        let client_id = self.config.com_client_id.as_ref().ok_or_else(|| Error::BadRequest {
            message: "WordPress.com integration is not configured (missing client id)".to_string(),
        })?;
        let client_secret = self.config.com_client_secret.as_ref().ok_or_else(|| Error::BadRequest {
            message: "WordPress.com integration is not configured (missing client secret)".to_string(),
        })?;

        let token_url = self
            .config
            .com_api_base_url
            .join("oauth2/token")
            .map_err(|e| wp_error(format!("construct URL: {e}")))?;

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http
            .post(token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| wp_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let mut snippet = body;
            snippet.truncate(512);
            return Err(wp_error(format!("token exchange returned {status}: {snippet}")));
        }

        response.json().await.map_err(|e| wp_error(format!("parse token response: {e}")))
    }
}

fn wp_error(message: String) -> Error {
    Error::Upstream {
        service: "wordpress".to_string(),
        message,
    }
}

/// Validate and normalize a user-supplied site URL (https or http only)
fn parse_site_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw.trim()).map_err(|_| Error::BadRequest {
        message: format!("Invalid site URL: {raw}"),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::BadRequest {
            message: format!("Site URL must use http or https, got {}", url.scheme()),
        });
    }

    // Join semantics need the trailing slash
    if !url.path().ends_with('/') {
        let mut path = url.path().to_string();
        path.push('/');
        url.set_path(&path);
    }
    Ok(url)
}

/// Create the signed `state` value binding an OAuth flow to an organization
pub fn create_oauth_state(org: OrgId, config: &Config) -> Result<String, Error> {
    let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
        operation: "OAuth state: secret_key is required".to_string(),
    })?;

    let claims = StateClaims {
        org,
        purpose: "wp_oauth".to_string(),
        exp: Utc::now().timestamp() + STATE_TTL_SECS,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret_key.as_bytes())).map_err(|e| Error::Internal {
        operation: format!("sign OAuth state: {e}"),
    })
}

/// Verify a returned `state` value belongs to this organization and flow
pub fn verify_oauth_state(state: &str, org: OrgId, config: &Config) -> Result<(), Error> {
    let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
        operation: "OAuth state: secret_key is required".to_string(),
    })?;

    let token = decode::<StateClaims>(state, &DecodingKey::from_secret(secret_key.as_bytes()), &Validation::default()).map_err(|_| {
        Error::BadRequest {
            message: "Invalid or expired OAuth state".to_string(),
        }
    })?;

    if token.claims.org != org || token.claims.purpose != "wp_oauth" {
        return Err(Error::BadRequest {
            message: "OAuth state does not match this organization".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose};
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str) -> WordPressConfig {
        WordPressConfig {
            com_client_id: Some("client-123".to_string()),
            com_client_secret: Some("secret-456".to_string()),
            com_api_base_url: Url::parse(base).unwrap(),
            request_timeout: std::time::Duration::from_secs(5),
        }
    }

    fn credentials(site: &str) -> WordPressCredentials {
        WordPressCredentials {
            site_url: site.to_string(),
            username: "editor".to_string(),
            app_password: "abcd efgh ijkl".to_string(),
        }
    }

    #[tokio::test]
    async fn test_connection_reports_metadata_and_post_count() {
        let server = MockServer::start().await;
        let expected_auth = format!("Basic {}", general_purpose::STANDARD.encode("editor:abcd efgh ijkl"));

        Mock::given(method("GET"))
            .and(path("/wp-json"))
            .and(header("authorization", expected_auth.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "My Site",
                "description": "Just another WordPress site",
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-WP-Total", "42")
                    .set_body_json(json!([])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = WordPressClient::new(test_config(&server.uri()));
        let result = client.test_connection(&credentials(&server.uri())).await.unwrap();

        assert_eq!(result.site_name.as_deref(), Some("My Site"));
        assert_eq!(result.description.as_deref(), Some("Just another WordPress site"));
        assert_eq!(result.post_count, 42);
    }

    #[tokio::test]
    async fn test_connection_unauthorized_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wp-json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = WordPressClient::new(test_config(&server.uri()));
        let err = client.test_connection(&credentials(&server.uri())).await.unwrap_err();

        match err {
            Error::Upstream { service, message } => {
                assert_eq!(service, "wordpress");
                assert!(message.contains("401"));
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_rejects_bad_site_url() {
        let client = WordPressClient::new(test_config("http://localhost"));

        let err = client.test_connection(&credentials("not a url")).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));

        let err = client.test_connection(&credentials("ftp://example.com")).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "wpcom-token",
                "blog_url": "https://blog.example.wordpress.com",
                "token_type": "bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = WordPressClient::new(test_config(&server.uri()));
        let token = client.exchange_code("auth-code", "https://app.example.com/callback").await.unwrap();

        assert_eq!(token.access_token, "wpcom-token");
        assert_eq!(token.blog_url.as_deref(), Some("https://blog.example.wordpress.com"));
    }

    #[test]
    fn test_authorize_url_contains_parameters() {
        let client = WordPressClient::new(test_config("https://public-api.wordpress.com"));

        let url = client.authorize_url("https://app.example.com/callback", "state-value").unwrap();
        assert!(url.starts_with("https://public-api.wordpress.com/oauth2/authorize?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=state-value"));
    }

    #[test]
    fn test_authorize_url_requires_client_id() {
        let mut config = test_config("https://public-api.wordpress.com");
        config.com_client_id = None;
        let client = WordPressClient::new(config);

        let err = client.authorize_url("https://app.example.com/callback", "s").unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }

    #[test]
    fn test_oauth_state_roundtrip_and_org_binding() {
        let config = Config {
            secret_key: Some("state-test-secret".to_string()),
            ..Default::default()
        };
        let org = Uuid::new_v4();
        let other_org = Uuid::new_v4();

        let state = create_oauth_state(org, &config).unwrap();
        verify_oauth_state(&state, org, &config).unwrap();

        let err = verify_oauth_state(&state, other_org, &config).unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));

        let err = verify_oauth_state("garbage", org, &config).unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }
}
