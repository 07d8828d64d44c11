// Integration tests for the HTTP API
//
// Requests go through the full router (auth middleware included) with
// tower's `oneshot`; the chat provider is a local fake.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use solace::config::{Config, TokenEntry};
use solace::providers::ChatProvider;
use solace::server::{create_router, hash_token, CompanionServer};
use solace::services::Therapist;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower::ServiceExt;

const ALICE: &str = "token-alice";
const BOB: &str = "token-bob";

const COMPANION_REPLY: &str = "That sounds like a lot. What's been weighing on you most?";

/// Records prompts and answers with a fixed reply
struct FakeProvider {
    prompts: Mutex<Vec<String>>,
    reply: String,
    fail: bool,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::replying(COMPANION_REPLY)
    }
}

impl FakeProvider {
    fn replying(reply: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: reply.to_string(),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for FakeProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            anyhow::bail!("Gemini API request failed\n\nStatus: 503");
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

fn therapist() -> Therapist {
    Therapist {
        id: "t1".to_string(),
        username: "dr_smith".to_string(),
        display_name: Some("Dr. Sarah Smith".to_string()),
        email: Some("dr.smith@therapy.test".to_string()),
        available: true,
    }
}

fn test_config(therapists: Vec<Therapist>) -> Config {
    let mut config = Config::default();
    config.auth.tokens = vec![
        TokenEntry {
            token_sha256: hash_token(ALICE),
            user_id: "alice".to_string(),
        },
        TokenEntry {
            token_sha256: hash_token(BOB),
            user_id: "bob".to_string(),
        },
    ];
    config.therapists = therapists;
    config.escalation.lookup_timeout_ms = 500;
    config.escalation.booking_timeout_ms = 500;
    config.escalation.notify_timeout_ms = 200;
    config
}

fn app(config: &Config, provider: Arc<FakeProvider>) -> Router {
    let server = CompanionServer::from_config(config, provider).unwrap();
    create_router(Arc::new(server))
}

async fn send(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, text) = get_text(app, uri).await;
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn start_session(app: &Router, token: &str) -> String {
    let (status, body) = send(app, "/ai/start-session", Some(token), json!({ "mood": 4 })).await;
    assert_eq!(status, StatusCode::OK);
    body["sessionId"].as_str().unwrap().to_string()
}

async fn generate(app: &Router, token: &str, session_id: &str, prompt: &str) -> (StatusCode, Value) {
    send(
        app,
        "/ai/session-generate",
        Some(token),
        json!({ "prompt": prompt, "sessionId": session_id }),
    )
    .await
}

#[tokio::test]
async fn test_crisis_message_books_appointment() {
    let provider = Arc::new(FakeProvider::default());
    let app = app(&test_config(vec![therapist()]), provider.clone());
    let session_id = start_session(&app, ALICE).await;

    let (status, body) = generate(&app, ALICE, &session_id, "I want to kill myself").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crisisDetected"], true);
    assert_eq!(body["danger"], true);
    assert_eq!(body["reason"], "crisis");
    assert_eq!(body["crisisType"], "suicidal_ideation");
    assert_eq!(body["crisisLevel"], 4);
    assert_eq!(body["urgencyMinutes"], 30);
    assert_eq!(body["therapistAssigned"], "t1");
    assert_eq!(body["therapistName"], "Dr. Sarah Smith");
    assert_eq!(body["appointment"]["therapist"], "Dr. Sarah Smith");
    assert!(body["appointmentScheduled"].is_string());
    assert_eq!(body["sessionId"], session_id.as_str());
    assert!(body["text"].as_str().unwrap().contains("988"));

    // The provider never sees crisis messages
    assert!(provider.prompts().is_empty());
}

#[tokio::test]
async fn test_crisis_without_available_therapist() {
    let provider = Arc::new(FakeProvider::default());
    let app = app(&test_config(vec![]), provider.clone());
    let session_id = start_session(&app, ALICE).await;

    let (status, body) = generate(&app, ALICE, &session_id, "I'm going to end it all tonight").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crisisDetected"], true);
    assert_eq!(body["crisisLevel"], 5);
    assert!(body["therapistAssigned"].is_null());
    assert!(body["appointment"].is_null());
    assert!(body["appointmentScheduled"].is_null());
    assert_eq!(body["notification"], "skipped");
    assert!(body["text"].as_str().unwrap().contains("911"));
}

#[tokio::test]
async fn test_figurative_message_goes_to_provider() {
    let provider = Arc::new(FakeProvider::default());
    let app = app(&test_config(vec![therapist()]), provider.clone());
    let session_id = start_session(&app, ALICE).await;

    let (status, body) =
        generate(&app, ALICE, &session_id, "I died laughing at that video").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("crisisDetected").is_none());
    assert!(body.get("danger").is_none());
    assert_eq!(body["text"], COMPANION_REPLY);

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("User: I died laughing at that video"));
}

#[tokio::test]
async fn test_history_is_included_in_later_prompts() {
    let provider = Arc::new(FakeProvider::default());
    let app = app(&test_config(vec![]), provider.clone());
    let session_id = start_session(&app, ALICE).await;

    generate(&app, ALICE, &session_id, "Work has been stressful").await;
    generate(&app, ALICE, &session_id, "My manager keeps moving deadlines").await;

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("User: Work has been stressful"));
    assert!(prompts[1].contains("Companion: That sounds like a lot."));
}

#[tokio::test]
async fn test_failing_mail_relay_does_not_block_crisis_response() {
    let mut mail = mockito::Server::new_async().await;
    let relay = mail
        .mock("POST", "/send")
        .with_status(500)
        .with_body("relay down")
        .create_async()
        .await;

    let mut config = test_config(vec![therapist()]);
    config.mail.endpoint = Some(format!("{}/send", mail.url()));
    config.escalation.notify_timeout_ms = 2000;
    let app = app(&config, Arc::new(FakeProvider::default()));
    let session_id = start_session(&app, ALICE).await;

    let (status, body) = generate(&app, ALICE, &session_id, "I want to die").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crisisDetected"], true);
    assert_eq!(body["notification"], "failed");
    assert_eq!(body["therapistAssigned"], "t1");
    relay.assert_async().await;
}

#[tokio::test]
async fn test_hanging_mail_relay_is_bounded() {
    // Accepts connections and never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let mut config = test_config(vec![therapist()]);
    config.mail.endpoint = Some(format!("http://{}/send", addr));
    let app = app(&config, Arc::new(FakeProvider::default()));
    let session_id = start_session(&app, ALICE).await;

    let started = Instant::now();
    let (status, body) = generate(&app, ALICE, &session_id, "I want to kill myself").await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crisisDetected"], true);
    assert_eq!(body["notification"], "timed_out");
    assert!(body["appointmentId"].is_string());
}

#[tokio::test]
async fn test_auth_required() {
    let app = app(&test_config(vec![]), Arc::new(FakeProvider::default()));

    let (status, body) = send(&app, "/ai/start-session", None, json!({ "mood": 5 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "authentication_error");

    let (status, _) = send(&app, "/ai/start-session", Some("wrong"), json!({ "mood": 5 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get_text(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("healthy"));
}

#[tokio::test]
async fn test_mood_must_be_in_range() {
    let app = app(&test_config(vec![]), Arc::new(FakeProvider::default()));

    for mood in [0, 11, -3] {
        let (status, body) =
            send(&app, "/ai/start-session", Some(ALICE), json!({ "mood": mood })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "mood {}", mood);
        assert!(body["error"]["message"].as_str().unwrap().contains("between 1 and 10"));
    }
}

#[tokio::test]
async fn test_ended_session_rejects_messages() {
    let app = app(&test_config(vec![]), Arc::new(FakeProvider::default()));
    let session_id = start_session(&app, ALICE).await;

    let (status, body) = send(
        &app,
        "/ai/end-session",
        Some(ALICE),
        json!({ "sessionId": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session ended");

    let (status, _) = generate(&app, ALICE, &session_id, "hello again").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sessions_are_private_to_their_user() {
    let app = app(&test_config(vec![]), Arc::new(FakeProvider::default()));
    let session_id = start_session(&app, ALICE).await;

    let (status, _) = generate(&app, BOB, &session_id, "hello").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "/ai/end-session",
        Some(BOB),
        json!({ "sessionId": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = generate(&app, ALICE, "no-such-session", "hello").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_session_id_opens_session() {
    let provider = Arc::new(FakeProvider::default());
    let app = app(&test_config(vec![]), provider.clone());

    let (status, body) = send(
        &app,
        "/ai/session-generate",
        Some(ALICE),
        json!({ "prompt": "hi there", "sessionId": null }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let session_id = body["sessionId"].as_str().unwrap().to_string();
    let (status, _) = generate(&app, ALICE, &session_id, "still here").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.prompts().len(), 2);
}

#[tokio::test]
async fn test_empty_prompt_rejected() {
    let app = app(&test_config(vec![]), Arc::new(FakeProvider::default()));
    let session_id = start_session(&app, ALICE).await;

    let (status, _) = generate(&app, ALICE, &session_id, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway() {
    let app = app(&test_config(vec![]), Arc::new(FakeProvider::failing()));
    let session_id = start_session(&app, ALICE).await;

    let (status, body) = generate(&app, ALICE, &session_id, "Tell me something nice").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["type"], "upstream_error");
    // Provider details stay in the log
    assert!(!body["error"]["message"].as_str().unwrap().contains("503"));

    // Crisis handling does not depend on the provider
    let (status, body) = generate(&app, ALICE, &session_id, "I want to kill myself").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crisisDetected"], true);
}

#[tokio::test]
async fn test_metrics_count_classifications() {
    let app = app(&test_config(vec![therapist()]), Arc::new(FakeProvider::default()));
    let session_id = start_session(&app, ALICE).await;

    generate(&app, ALICE, &session_id, "I want to kill myself").await;
    generate(&app, ALICE, &session_id, "my battery died").await;

    let (status, text) = get_text(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("solace_classifications_total{verdict=\"crisis\"} 1"));
    assert!(text.contains("solace_classifications_total{verdict=\"safe\"} 1"));
    assert!(text.contains("solace_escalations_total{booking=\"booked\"} 1"));
    assert!(text.contains("solace_sessions 1"));
}

#[tokio::test]
async fn test_crisis_answered_when_session_limit_reached() {
    let provider = Arc::new(FakeProvider::default());
    let mut config = test_config(vec![therapist()]);
    config.server.max_sessions = 1;
    let app = app(&config, provider.clone());

    let open = json!({ "prompt": "hello", "sessionId": null });
    let (status, _) = send(&app, "/ai/session-generate", Some(ALICE), open.clone()).await;
    assert_eq!(status, StatusCode::OK);

    // Ordinary messages still hit the limit
    let (status, body) = send(&app, "/ai/session-generate", Some(BOB), open).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "overloaded_error");

    let (status, body) = send(
        &app,
        "/ai/session-generate",
        Some(BOB),
        json!({ "prompt": "I want to kill myself", "sessionId": null }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crisisDetected"], true);
    assert_eq!(body["therapistAssigned"], "t1");
    assert!(body["sessionId"].is_string());
    assert!(body["text"].as_str().unwrap().contains("988"));
    assert_eq!(provider.prompts().len(), 1);
}

#[tokio::test]
async fn test_crisis_answered_on_ended_session() {
    let app = app(&test_config(vec![therapist()]), Arc::new(FakeProvider::default()));
    let session_id = start_session(&app, ALICE).await;
    send(
        &app,
        "/ai/end-session",
        Some(ALICE),
        json!({ "sessionId": session_id }),
    )
    .await;

    let (status, body) = generate(&app, ALICE, &session_id, "I want to end my life").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crisisDetected"], true);
    assert!(body["appointmentId"].is_string());
    // The ended session is not reopened
    assert_ne!(body["sessionId"], session_id.as_str());
}

#[tokio::test]
async fn test_elevated_distress_is_level_two() {
    let app = app(&test_config(vec![therapist()]), Arc::new(FakeProvider::default()));
    let session_id = start_session(&app, ALICE).await;

    let (status, body) = generate(&app, ALICE, &session_id, "I'm hopeless").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crisisDetected"], true);
    assert_eq!(body["crisisLevel"], 2);
    assert_eq!(body["urgencyMinutes"], 60);
    assert_eq!(body["crisisType"], "emergency");
}

#[tokio::test]
async fn test_self_care_home_content() {
    let reply = r#"Sure! Here you go:
{
  "quote": "Rest is productive too.",
  "focus": "Take three slow breaths before each meeting.",
  "article": {
    "title": "Gentle Mornings",
    "summary": "Start the day without rushing.",
    "icon": "cloud-outline",
    "body": "Wake up a little earlier.",
    "links": [],
    "related": ["Evening wind-down"]
  }
}"#;
    let provider = Arc::new(FakeProvider::replying(reply));
    let app = app(&test_config(vec![]), provider.clone());

    let (status, body) = get_json(&app, "/ai/self-care-home").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quote"], "Rest is productive too.");
    assert_eq!(body["focus"]["tip"], "Take three slow breaths before each meeting.");
    assert_eq!(body["focus"]["duration"], 300);
    assert_eq!(body["article"]["title"], "Gentle Mornings");
    assert_eq!(body["article"]["related"][0], "Evening wind-down");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Return ONLY the JSON object"));
}

#[tokio::test]
async fn test_self_care_home_rejects_unparseable_reply() {
    let provider = Arc::new(FakeProvider::replying("I can't do that today."));
    let app = app(&test_config(vec![]), provider);

    let (status, body) = get_json(&app, "/ai/self-care-home").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["type"], "upstream_error");
}

#[tokio::test]
async fn test_auth_disabled_uses_anonymous_user() {
    let mut config = test_config(vec![]);
    config.server.auth_enabled = false;
    config.auth.tokens.clear();
    let app = app(&config, Arc::new(FakeProvider::default()));

    let (status, body) = send(&app, "/ai/start-session", None, json!({ "mood": 6 })).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = body["sessionId"].as_str().unwrap().to_string();

    // Every caller is the same anonymous user, whatever header they send
    let (status, _) = generate(&app, "unknown-token", &session_id, "hello").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "/ai/end-session",
        None,
        json!({ "sessionId": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
