//! The tool runner: one invocation = key lookup, prompt assembly, provider
//! call, content persistence, and an activity-log row.
//!
//! Failures surface immediately to the caller - there are no retries - and
//! every failed invocation is still recorded in the activity log so analytics
//! sees it.

use serde::{Serialize, de::DeserializeOwned};
use std::time::Instant;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    AppState,
    ai::{
        ToolError,
        client::GenerationRequest,
        prompts::{content_title, lie_detector_prompt, newsletter_prompt, summary_prompt, thread_prompt},
    },
    api::models::{
        content::ContentResponse,
        provider_keys::Provider,
        tools::{
            FactCheckReport, LieDetectorRequest, LogStatus, ModelSelection, NewsletterDraft, NewsletterRequest, SummaryRequest,
            SummaryResult, ThreadDraft, ThreadRequest, Tool,
        },
        users::CurrentUser,
    },
    crypto,
    db::handlers::{ActivityLog, Contents, ProviderKeys, Repository, ToolSettings},
    db::models::{activity_log::LogEntryCreateDBRequest, content::ContentCreateDBRequest},
    errors::{Error, Result},
    types::OrgId,
};

/// Generate a newsletter draft
#[instrument(skip(state, user, request), fields(topic = %request.topic))]
pub async fn run_newsletter(state: &AppState, user: &CurrentUser, request: NewsletterRequest) -> Result<ContentResponse> {
    if request.topic.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Newsletter topic cannot be empty".to_string(),
        });
    }

    let title = content_title(&request.topic);
    let user_prompt = newsletter_prompt(&request);
    run::<NewsletterDraft>(state, user, Tool::Newsletter, &request.selection, title, user_prompt, request.session_id).await
}

/// Generate a social-media thread
#[instrument(skip(state, user, request))]
pub async fn run_thread(state: &AppState, user: &CurrentUser, request: ThreadRequest) -> Result<ContentResponse> {
    if request.content.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Thread content cannot be empty".to_string(),
        });
    }

    let title = content_title(&request.content);
    let user_prompt = thread_prompt(&request);
    run::<ThreadDraft>(state, user, Tool::Thread, &request.selection, title, user_prompt, request.session_id).await
}

/// Fact-check the claims in a piece of content
#[instrument(skip(state, user, request))]
pub async fn run_lie_detector(state: &AppState, user: &CurrentUser, request: LieDetectorRequest) -> Result<ContentResponse> {
    if request.content.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Content to fact-check cannot be empty".to_string(),
        });
    }

    let title = content_title(&request.content);
    let user_prompt = lie_detector_prompt(&request);
    run::<FactCheckReport>(state, user, Tool::LieDetector, &request.selection, title, user_prompt, request.session_id).await
}

/// Summarize a piece of content
#[instrument(skip(state, user, request))]
pub async fn run_summary(state: &AppState, user: &CurrentUser, request: SummaryRequest) -> Result<ContentResponse> {
    if request.content.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Content to summarize cannot be empty".to_string(),
        });
    }

    let title = content_title(&request.content);
    let user_prompt = summary_prompt(&request);
    run::<SummaryResult>(state, user, Tool::Summary, &request.selection, title, user_prompt, request.session_id).await
}

/// Outcome of provider key resolution: either a usable secret, or a typed
/// failure that must be recorded before surfacing.
enum Resolved {
    Secret(String),
    Failure(ToolError),
}

async fn resolve_key(conn: &mut sqlx::PgConnection, org: OrgId, provider: Provider) -> Result<Resolved> {
    let mut repo = ProviderKeys::new(conn);

    let key = match repo.find_active(org, provider).await? {
        Some(key) => key,
        None => {
            let failure = if repo.exists_for_provider(org, provider).await? {
                ToolError::KeyInactive { provider }
            } else {
                ToolError::KeyMissing { provider }
            };
            return Ok(Resolved::Failure(failure));
        }
    };

    let secret = crypto::decrypt_string_with_env_key(&key.secret).map_err(|e| Error::Internal {
        operation: format!("decrypt provider key: {e}"),
    })?;

    if secret.trim().is_empty() {
        return Ok(Resolved::Failure(ToolError::KeyEmpty { provider }));
    }

    Ok(Resolved::Secret(secret))
}

/// Record a failed invocation in the activity log. Best effort: a logging
/// failure must not mask the original error.
#[allow(clippy::too_many_arguments)]
async fn record_failure(
    state: &AppState,
    org: OrgId,
    user: &CurrentUser,
    tool: Tool,
    provider: Provider,
    session_id: Uuid,
    duration_ms: i64,
    tokens_used: Option<i64>,
    err: &ToolError,
) {
    let request = LogEntryCreateDBRequest {
        organization_id: org,
        tool,
        status: LogStatus::Failed,
        duration_ms: Some(duration_ms),
        tokens_used,
        provider: Some(provider),
        user_id: Some(user.id),
        session_id: Some(session_id),
        error_code: Some(err.code().to_string()),
        error_message: Some(err.to_string()),
    };

    match state.db.acquire().await {
        Ok(mut conn) => {
            if let Err(log_err) = ActivityLog::new(&mut conn).insert(&request).await {
                warn!("Failed to record tool failure in activity log: {log_err}");
            }
        }
        Err(pool_err) => warn!("Failed to acquire connection for failure logging: {pool_err}"),
    }
}

/// Shared execution path for all four tools.
///
/// `T` is the tool's expected result shape; the provider's JSON is parsed into
/// it strictly, and the normalized value is what gets stored.
async fn run<T: DeserializeOwned + Serialize>(
    state: &AppState,
    user: &CurrentUser,
    tool: Tool,
    selection: &ModelSelection,
    title: String,
    user_prompt: String,
    session_id: Option<Uuid>,
) -> Result<ContentResponse> {
    let org = user.organization_id;
    let provider = selection.provider;
    let session_id = session_id.unwrap_or_else(Uuid::new_v4);
    let started = Instant::now();

    // Settings + key resolution. Key problems count as failed invocations;
    // database errors propagate untouched.
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let settings = ToolSettings::new(&mut conn)
        .effective(org, tool)
        .await?
        .ok_or_else(|| Error::Internal {
            operation: format!("load settings for tool {tool}"),
        })?;

    let secret = match resolve_key(&mut conn, org, provider).await? {
        Resolved::Secret(secret) => secret,
        Resolved::Failure(tool_err) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            record_failure(state, org, user, tool, provider, session_id, duration_ms, None, &tool_err).await;
            return Err(tool_err.into());
        }
    };
    drop(conn);

    let request = GenerationRequest {
        model: &selection.model,
        system_prompt: &settings.system_prompt,
        user_prompt: &user_prompt,
        temperature: settings.temperature,
        top_p: settings.top_p,
        max_tokens: settings.max_tokens,
    };

    let output = match state.providers.generate_object(provider, &secret, &request).await {
        Ok(output) => output,
        Err(tool_err) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            record_failure(state, org, user, tool, provider, session_id, duration_ms, None, &tool_err).await;
            return Err(tool_err.into());
        }
    };

    // Validate against the tool's shape; store the normalized value
    let parsed: T = match serde_json::from_value(output.json.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            let tool_err = ToolError::MalformedOutput {
                provider,
                message: format!("missing or mistyped fields: {e}"),
            };
            let duration_ms = started.elapsed().as_millis() as i64;
            record_failure(state, org, user, tool, provider, session_id, duration_ms, output.tokens_used, &tool_err).await;
            return Err(tool_err.into());
        }
    };

    let body = serde_json::to_value(&parsed).map_err(|e| Error::Internal {
        operation: format!("serialize generation result: {e}"),
    })?;
    let duration_ms = started.elapsed().as_millis() as i64;

    // Content row and log row land together or not at all
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let content = Contents::new(&mut tx)
        .create(&ContentCreateDBRequest {
            organization_id: org,
            tool,
            title,
            body,
            provider,
            model: selection.model.clone(),
            created_by: Some(user.id),
        })
        .await?;

    ActivityLog::new(&mut tx)
        .insert(&LogEntryCreateDBRequest {
            organization_id: org,
            tool,
            status: LogStatus::Completed,
            duration_ms: Some(duration_ms),
            tokens_used: output.tokens_used,
            provider: Some(provider),
            user_id: Some(user.id),
            session_id: Some(session_id),
            error_code: None,
            error_message: None,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(ContentResponse::from(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::activity_log::LogFilter;
    use crate::db::models::provider_keys::ProviderKeyCreateDBRequest;
    use crate::test_utils::{create_test_member, create_test_org, create_test_state, set_test_encryption_key};
    use serde_json::json;
    use sqlx::PgPool;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn thread_request() -> ThreadRequest {
        ThreadRequest {
            selection: ModelSelection {
                provider: Provider::OpenAi,
                model: "test-model".to_string(),
            },
            content: "We shipped a new analytics dashboard today.".to_string(),
            post_count: Some(3),
            session_id: None,
        }
    }

    async fn store_active_key(pool: &PgPool, org: OrgId, provider: Provider, plaintext: &str) {
        let encrypted = crypto::encrypt_with_env_key(plaintext.as_bytes()).unwrap();
        let mut conn = pool.acquire().await.unwrap();
        ProviderKeys::new(&mut conn)
            .create(&ProviderKeyCreateDBRequest {
                organization_id: org,
                provider,
                secret: encrypted,
                models: vec![],
                created_by: None,
            })
            .await
            .unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_thread_without_key_fails_before_any_provider_call(pool: PgPool) {
        set_test_encryption_key();
        let server = MockServer::start().await;

        // Zero requests may reach the provider
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let state = create_test_state(&pool, &server.uri()).await;
        let org = create_test_org(&pool, "No Key Org").await;
        let user = create_test_member(&pool, org, "nokey@example.com").await;

        let err = run_thread(&state, &user, thread_request()).await.unwrap_err();
        match err {
            Error::BadRequest { message } => assert!(message.contains("no openai API key")),
            other => panic!("expected BadRequest, got {other:?}"),
        }

        // The failure itself is on the activity log
        let mut conn = pool.acquire().await.unwrap();
        let entries = ActivityLog::new(&mut conn)
            .list(&LogFilter {
                skip: 0,
                limit: 10,
                organization_id: org,
                from: None,
                to: None,
                tool: None,
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, LogStatus::Failed);
        assert_eq!(entries[0].error_code.as_deref(), Some("key_missing"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_inactive_key_is_distinguished_from_missing(pool: PgPool) {
        set_test_encryption_key();
        let server = MockServer::start().await;
        let state = create_test_state(&pool, &server.uri()).await;
        let org = create_test_org(&pool, "Inactive Key Org").await;
        let user = create_test_member(&pool, org, "inactive@example.com").await;

        store_active_key(&pool, org, Provider::OpenAi, "sk-live-key").await;
        {
            let mut conn = pool.acquire().await.unwrap();
            let mut repo = ProviderKeys::new(&mut conn);
            let keys = repo
                .list(&crate::db::handlers::provider_keys::ProviderKeyFilter {
                    skip: 0,
                    limit: 10,
                    organization_id: Some(org),
                })
                .await
                .unwrap();
            repo.update(
                keys[0].id,
                &crate::db::models::provider_keys::ProviderKeyUpdateDBRequest {
                    active: Some(false),
                    models: None,
                },
            )
            .await
            .unwrap();
        }

        let err = run_thread(&state, &user, thread_request()).await.unwrap_err();
        match err {
            Error::BadRequest { message } => assert!(message.contains("inactive")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_successful_thread_stores_content_and_log_row(pool: PgPool) {
        set_test_encryption_key();
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"threads\": [\"a\", \"b\", \"c\"]}"}}],
                "usage": {"prompt_tokens": 50, "completion_tokens": 30, "total_tokens": 80},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = create_test_state(&pool, &server.uri()).await;
        let org = create_test_org(&pool, "Thread Org").await;
        let user = create_test_member(&pool, org, "thread@example.com").await;
        store_active_key(&pool, org, Provider::OpenAi, "sk-live-key").await;

        let content = run_thread(&state, &user, thread_request()).await.unwrap();
        assert_eq!(content.tool, Tool::Thread);
        assert_eq!(content.body["threads"], json!(["a", "b", "c"]));
        assert_eq!(content.created_by, Some(user.id));

        let mut conn = pool.acquire().await.unwrap();
        let entries = ActivityLog::new(&mut conn)
            .list(&LogFilter {
                skip: 0,
                limit: 10,
                organization_id: org,
                from: None,
                to: None,
                tool: Some(Tool::Thread),
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, LogStatus::Completed);
        assert_eq!(entries[0].tokens_used, Some(80));
        assert_eq!(entries[0].provider, Some(Provider::OpenAi));
        assert!(entries[0].session_id.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_wrong_shape_from_provider_is_recorded_as_failure(pool: PgPool) {
        set_test_encryption_key();
        let server = MockServer::start().await;

        // Valid JSON object, but not the thread shape
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"wrong\": true}"}}],
            })))
            .mount(&server)
            .await;

        let state = create_test_state(&pool, &server.uri()).await;
        let org = create_test_org(&pool, "Bad Shape Org").await;
        let user = create_test_member(&pool, org, "shape@example.com").await;
        store_active_key(&pool, org, Provider::OpenAi, "sk-live-key").await;

        let err = run_thread(&state, &user, thread_request()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));

        let mut conn = pool.acquire().await.unwrap();
        let entries = ActivityLog::new(&mut conn)
            .list(&LogFilter {
                skip: 0,
                limit: 10,
                organization_id: org,
                from: None,
                to: None,
                tool: None,
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].error_code.as_deref(), Some("malformed_output"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_empty_form_content_rejected_without_logging(pool: PgPool) {
        set_test_encryption_key();
        let server = MockServer::start().await;
        let state = create_test_state(&pool, &server.uri()).await;
        let org = create_test_org(&pool, "Empty Form Org").await;
        let user = create_test_member(&pool, org, "empty@example.com").await;

        let mut request = thread_request();
        request.content = "   ".to_string();

        let err = run_thread(&state, &user, request).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));

        // Form validation failures never reach the activity log
        let mut conn = pool.acquire().await.unwrap();
        let entries = ActivityLog::new(&mut conn)
            .list(&LogFilter {
                skip: 0,
                limit: 10,
                organization_id: org,
                from: None,
                to: None,
                tool: None,
            })
            .await
            .unwrap();
        assert!(entries.is_empty());
    }
}
