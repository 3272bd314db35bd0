//! Router-level tests: real handlers and middleware, in-memory store,
//! manual clock and a scripted AI backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use hh_ai::AiBackend;
use hh_domain::config::Config;
use hh_domain::error::{Error, Result};
use hh_domain::user::{Plan, ProfileUpdate, Subscription, UserId, UserRecord};
use hh_gateway::http::build_app;
use hh_gateway::questions::QuestionLog;
use hh_gateway::state::AppState;
use hh_ledger::{JsonUserStore, ManualClock, ResetOutcome, UserStore};

const ADMIN_TOKEN: &str = "letmein";

// ── Fixtures ─────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedAi {
    fail: AtomicBool,
    calls: AtomicUsize,
}

#[async_trait]
impl AiBackend for ScriptedAi {
    async fn ask(&self, question: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::AiBackend("connection refused".into()));
        }
        Ok(format!("answer: {question}"))
    }
}

struct Harness {
    app: Router,
    store: Arc<JsonUserStore>,
    clock: Arc<ManualClock>,
    ai: Arc<ScriptedAi>,
    questions: Arc<QuestionLog>,
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
}

fn harness_with(admin_token: Option<&str>) -> Harness {
    let store = Arc::new(JsonUserStore::in_memory());
    let clock = Arc::new(ManualClock::new(at(2024, 3, 5)));
    let ai = Arc::new(ScriptedAi::default());
    let questions = Arc::new(QuestionLog::in_memory());

    let state = AppState::new(
        Arc::new(Config::default()),
        store.clone(),
        ai.clone(),
        clock.clone(),
        questions.clone(),
        admin_token.map(|t| Sha256::digest(t.as_bytes()).to_vec()),
    )
    .unwrap();

    Harness {
        app: build_app(state).unwrap(),
        store,
        clock,
        ai,
        questions,
    }
}

fn harness() -> Harness {
    harness_with(Some(ADMIN_TOKEN))
}

impl Harness {
    fn add_user(&self, usage: u64, active: bool) -> UserId {
        let mut rec = UserRecord::new("Amani", format!("{}@example.com", UserId::new()), at(2024, 3, 1));
        rec.usage = usage;
        rec.subscription = Subscription {
            active,
            plan: active.then_some(Plan::Monthly),
            ..Default::default()
        };
        let id = rec.id;
        self.store.insert(rec).unwrap();
        id
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, body, None)).await
    }

    async fn chat(&self, user_id: Option<&str>, question: &str) -> (StatusCode, Value) {
        self.post("/api/chat", json!({ "question": question, "userId": user_id }))
            .await
    }
}

fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// ── Chat ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_question_is_rejected() {
    let h = harness();
    let (status, body) = h.post("/api/chat", json!({ "userId": "demo" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Question is required");

    let (status, _) = h.chat(None, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.ai.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn guests_are_answered_without_metering() {
    let h = harness();
    for raw in [None, Some(""), Some("demo"), Some("guest"), Some("not-a-uuid")] {
        let (status, body) = h.chat(raw, "what is a noun?").await;
        assert_eq!(status, StatusCode::OK, "caller {raw:?}");
        assert_eq!(body["answer"], "answer: what is a noun?");
        assert_eq!(body["userType"], "guest");
        assert!(body["usage"].is_null());
    }
    assert_eq!(h.questions.total(), 5);
}

#[tokio::test]
async fn unknown_user_id_is_a_guest() {
    let h = harness();
    let stranger = UserId::new().to_string();
    let (status, body) = h.chat(Some(&stranger), "hi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userType"], "guest");
    assert_eq!(h.store.count(), 0);
}

#[tokio::test]
async fn registered_user_is_counted_then_refused_at_the_limit() {
    let h = harness();
    let id = h.add_user(0, false);
    let raw = id.to_string();

    for n in 1..=10u64 {
        let (status, body) = h.chat(Some(&raw), "q").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["usage"], n);
        assert_eq!(body["userType"], "registered");
    }

    let (status, body) = h.chat(Some(&raw), "one more").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["usage"], 10);
    assert_eq!(body["limit"], 10);
    assert!(body["message"].as_str().unwrap().contains("limit"));

    // The refused request never reached the AI service.
    assert_eq!(h.ai.calls.load(Ordering::SeqCst), 10);
    assert_eq!(h.store.get(&id).unwrap().unwrap().usage, 10);
}

#[tokio::test]
async fn subscribers_are_never_refused() {
    let h = harness();
    let id = h.add_user(25, true);
    let (status, body) = h.chat(Some(&id.to_string()), "q").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"], 26);
}

#[tokio::test]
async fn failed_answer_does_not_consume_quota() {
    let h = harness();
    let id = h.add_user(4, false);
    h.ai.fail.store(true, Ordering::SeqCst);

    let (status, body) = h.chat(Some(&id.to_string()), "q").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "AI service temporarily unavailable. Please try again."
    );
    assert_eq!(h.store.get(&id).unwrap().unwrap().usage, 4);
    assert_eq!(h.questions.total(), 0);
}

#[tokio::test]
async fn new_month_restores_access() {
    let h = harness();
    let id = h.add_user(10, false);
    let raw = id.to_string();

    let (status, _) = h.chat(Some(&raw), "q").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    h.clock.set(at(2024, 4, 1));
    let (status, body) = h.chat(Some(&raw), "q").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"], 1);

    let stored = h.store.get(&id).unwrap().unwrap();
    assert_eq!(stored.usage_reset_at, Some(at(2024, 4, 1)));
}

#[tokio::test]
async fn non_string_user_ids_are_guests() {
    let h = harness();
    for user_id in [json!(42), json!({ "_id": "65f0c2a9e4b0a1b2c3d4e5f6" }), json!(["x"]), json!(true)] {
        let (status, body) = h
            .post("/api/chat", json!({ "question": "hi", "userId": user_id }))
            .await;
        assert_eq!(status, StatusCode::OK, "userId {user_id}");
        assert_eq!(body["userType"], "guest");
        assert!(body["usage"].is_null());
    }
    assert_eq!(h.store.count(), 0);
}

#[tokio::test]
async fn unreadable_chat_bodies_get_a_json_message() {
    let h = harness();

    let (status, body) = h.post("/api/chat", json!({ "question": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let no_content_type = Request::post("/api/chat")
        .body(Body::from(r#"{"question":"hi"}"#))
        .unwrap();
    let (status, body) = h.send(no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let truncated = Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"question":"#))
        .unwrap();
    let (status, body) = h.send(truncated).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    assert_eq!(h.ai.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn question_is_forwarded_and_logged_verbatim() {
    let h = harness();
    let id = h.add_user(0, false);
    let question = "  Solve:\n  2x + 3 = 7\n";

    let (status, body) = h.chat(Some(&id.to_string()), question).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], format!("answer: {question}"));

    let logged = h.questions.recent_for(&id, 1).await;
    assert_eq!(logged[0].question, question);
}

#[tokio::test]
async fn image_url_is_kept_with_the_question() {
    let h = harness();
    let id = h.add_user(0, false);
    let raw = id.to_string();
    h.post(
        "/api/chat",
        json!({ "question": "what is this?", "userId": raw, "imageUrl": "/uploads/abc.png" }),
    )
    .await;
    h.chat(Some(&raw), "plain").await;

    let (_, body) = h.get(&format!("/api/user/{raw}/questions")).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list[0].get("imageUrl").is_none());
    assert_eq!(list[1]["imageUrl"], "/uploads/abc.png");
}

/// Store whose increments always fail, as when the disk fills mid-request.
struct NoIncrementStore {
    inner: Arc<JsonUserStore>,
}

impl UserStore for NoIncrementStore {
    fn get(&self, id: &UserId) -> Result<Option<UserRecord>> {
        self.inner.get(id)
    }
    fn insert(&self, record: UserRecord) -> Result<()> {
        self.inner.insert(record)
    }
    fn increment_usage(&self, _id: &UserId) -> Result<u64> {
        Err(Error::Store("disk full".into()))
    }
    fn reset_usage_if(
        &self,
        id: &UserId,
        expected: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome> {
        self.inner.reset_usage_if(id, expected, now)
    }
    fn set_subscription(&self, id: &UserId, s: Subscription) -> Result<Option<UserRecord>> {
        self.inner.set_subscription(id, s)
    }
    fn set_pending_checkout(
        &self,
        id: &UserId,
        plan: Plan,
        checkout_id: &str,
        phone: Option<&str>,
    ) -> Result<Option<UserRecord>> {
        self.inner.set_pending_checkout(id, plan, checkout_id, phone)
    }
    fn activate_by_checkout(&self, checkout_id: &str, now: DateTime<Utc>) -> Result<Option<UserRecord>> {
        self.inner.activate_by_checkout(checkout_id, now)
    }
    fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<Option<UserRecord>> {
        self.inner.update_profile(id, update)
    }
    fn count(&self) -> usize {
        self.inner.count()
    }
}

#[tokio::test]
async fn lost_increment_still_answers_with_the_expected_count() {
    let h = harness();
    let id = h.add_user(3, false);

    let state = AppState::new(
        Arc::new(Config::default()),
        Arc::new(NoIncrementStore {
            inner: h.store.clone(),
        }),
        h.ai.clone(),
        h.clock.clone(),
        h.questions.clone(),
        None,
    )
    .unwrap();
    let app = build_app(state).unwrap();

    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/api/chat",
            json!({ "question": "q", "userId": id.to_string() }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["answer"], "answer: q");
    assert_eq!(body["usage"], 4);
    assert_eq!(body["userType"], "registered");

    assert_eq!(h.store.get(&id).unwrap().unwrap().usage, 3);
    assert_eq!(h.questions.total(), 1);
}

// ── Usage, history, config ───────────────────────────────────────────

#[tokio::test]
async fn usage_reports_guest_defaults() {
    let h = harness();
    let unknown = format!("/api/user/{}/usage", UserId::new());
    for uri in ["/api/user/demo/usage", "/api/user/xyz/usage", unknown.as_str()] {
        let (status, body) = h.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(
            body,
            json!({ "usage": 0, "isSubscribed": false, "limit": 10, "userType": "guest" })
        );
    }
}

#[tokio::test]
async fn usage_applies_the_month_reset() {
    let h = harness();
    let id = h.add_user(7, false);
    let uri = format!("/api/user/{id}/usage");

    let (_, body) = h.get(&uri).await;
    assert_eq!(body["usage"], 7);
    assert_eq!(body["userType"], "registered");
    assert!(body["usageResetAt"].is_string());

    h.clock.set(at(2024, 5, 2));
    let (_, body) = h.get(&uri).await;
    assert_eq!(body["usage"], 0);
    assert_eq!(h.store.get(&id).unwrap().unwrap().usage, 0);
}

#[tokio::test]
async fn question_history_is_per_user_newest_first() {
    let h = harness();
    let id = h.add_user(0, false);
    let raw = id.to_string();
    h.chat(Some(&raw), "first").await;
    h.chat(None, "guest question").await;
    h.chat(Some(&raw), "second").await;

    let (status, body) = h.get(&format!("/api/user/{raw}/questions?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["question"], "second");
    assert_eq!(list[0]["userType"], "registered");

    let (_, body) = h.get("/api/user/demo/questions").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn config_exposes_the_free_limit() {
    let h = harness();
    let (status, body) = h.get("/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "freeUserLimit": 10 }));
}

// ── Billing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_subscription_is_404() {
    let h = harness();
    let (status, body) = h.get(&format!("/api/subscription/{}", UserId::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "active": false, "message": "User not found" }));
}

#[tokio::test]
async fn checkout_then_callback_activates_subscription() {
    let h = harness();
    let id = h.add_user(10, false);

    let req = json_request(
        Method::POST,
        &format!("/api/admin/users/{id}/checkout"),
        json!({ "plan": "yearly", "checkoutId": "ws_CO_123" }),
        Some(ADMIN_TOKEN),
    );
    let (status, _) = h.send(req).await;
    assert_eq!(status, StatusCode::OK);

    let callback = json!({
        "Body": { "stkCallback": {
            "ResultCode": 0,
            "ResultDesc": "The service request is processed successfully.",
            "CheckoutRequestID": "ws_CO_123"
        }}
    });
    let (status, body) = h.post("/api/mpesa/callback", callback).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ResultCode": 0, "ResultDesc": "Accepted" }));

    let (_, body) = h.get(&format!("/api/subscription/{id}")).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["plan"], "yearly");
    assert!(body["activatedAt"].is_string());

    // Subscribed now, so the exhausted free tier no longer matters.
    let (status, _) = h.chat(Some(&id.to_string()), "q").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn failed_payment_is_acknowledged_but_ignored() {
    let h = harness();
    let id = h.add_user(0, false);
    h.store
        .set_pending_checkout(&id, Plan::Monthly, "ws_CO_9", None)
        .unwrap();

    let callback = json!({
        "Body": { "stkCallback": { "ResultCode": 1032, "CheckoutRequestID": "ws_CO_9" } }
    });
    let (status, body) = h.post("/api/mpesa/callback", callback).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ResultCode"], 0);
    assert!(!h.store.get(&id).unwrap().unwrap().subscription.active);
}

#[tokio::test]
async fn loosely_typed_callbacks_are_acknowledged() {
    let h = harness();
    let id = h.add_user(0, false);
    h.store
        .set_pending_checkout(&id, Plan::Monthly, "ws_CO_7", None)
        .unwrap();
    let ack = json!({ "ResultCode": 0, "ResultDesc": "Accepted" });

    // A string result code is not a confirmed payment.
    let stringly = json!({
        "Body": { "stkCallback": { "ResultCode": "0", "CheckoutRequestID": "ws_CO_7" } }
    });
    let (status, body) = h.post("/api/mpesa/callback", stringly).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ack);
    assert!(!h.store.get(&id).unwrap().unwrap().subscription.active);

    let numeric_checkout = json!({
        "Body": { "stkCallback": { "ResultCode": 0, "CheckoutRequestID": 7 } }
    });
    let (status, body) = h.post("/api/mpesa/callback", numeric_checkout).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ack);

    let plain_text = Request::post("/api/mpesa/callback")
        .body(Body::from("ResultCode=0"))
        .unwrap();
    let (status, body) = h.send(plain_text).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ack);

    let (status, body) = h.post("/api/mpesa/callback", json!(["not", "an", "object"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ack);
    assert!(!h.store.get(&id).unwrap().unwrap().subscription.active);
}

#[tokio::test]
async fn checkout_phone_is_recorded() {
    let h = harness();
    let id = h.add_user(0, false);
    let req = json_request(
        Method::POST,
        &format!("/api/admin/users/{id}/checkout"),
        json!({ "plan": "monthly", "checkoutId": "ws_CO_55", "phone": "254700000003" }),
        Some(ADMIN_TOKEN),
    );
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["phone"], "254700000003");
    assert_eq!(body["subscription"]["checkoutId"], "ws_CO_55");
}

// ── Profile ──────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_read_and_update() {
    let h = harness();
    let id = h.add_user(6, true);
    let uri = format!("/api/user/{id}");

    let (status, body) = h.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Amani");
    assert!(body["phone"].is_null());
    assert!(body.get("usage").is_none());

    let (status, body) = h
        .send(json_request(
            Method::PUT,
            &uri,
            json!({ "name": "Amani W.", "phone": "254700000004" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["name"], "Amani W.");
    assert_eq!(body["user"]["phone"], "254700000004");

    let stored = h.store.get(&id).unwrap().unwrap();
    assert_eq!(stored.usage, 6);
    assert!(stored.subscription.active);

    // Usage routes under the same prefix are unaffected.
    let (_, body) = h.get(&format!("{uri}/usage")).await;
    assert_eq!(body["usage"], 6);
}

#[tokio::test]
async fn profile_of_unknown_user_is_404() {
    let h = harness();
    for uri in [format!("/api/user/{}", UserId::new()), "/api/user/demo".to_owned()] {
        let (status, body) = h.get(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "message": "User not found" }));

        let (status, body) = h
            .send(json_request(Method::PUT, &uri, json!({ "name": "x" }), None))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "message": "User not found" }));
    }
}

// ── Admin ────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_require_the_token() {
    let h = harness();
    let body = json!({ "name": "Baraka", "email": "baraka@example.com" });

    let (status, _) = h
        .send(json_request(Method::POST, "/api/admin/users", body.clone(), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h
        .send(json_request(Method::POST, "/api/admin/users", body.clone(), Some("nope")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, created) = h
        .send(json_request(Method::POST, "/api/admin/users", body.clone(), Some(ADMIN_TOKEN)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "baraka@example.com");
    assert_eq!(created["usage"], 0);

    let (status, _) = h
        .send(json_request(Method::POST, "/api/admin/users", body, Some(ADMIN_TOKEN)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_routes_are_closed_without_a_configured_token() {
    let h = harness_with(None);
    let (status, _) = h
        .send(json_request(
            Method::POST,
            "/api/admin/users",
            json!({ "email": "x@example.com" }),
            Some(ADMIN_TOKEN),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_can_toggle_subscription() {
    let h = harness();
    let id = h.add_user(10, false);
    let uri = format!("/api/admin/users/{id}/subscription");

    let (status, user) = h
        .send(json_request(
            Method::PUT,
            &uri,
            json!({ "active": true, "plan": "monthly" }),
            Some(ADMIN_TOKEN),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["subscription"]["active"], true);

    let (_, body) = h.get(&format!("/api/user/{id}/usage")).await;
    assert_eq!(body["isSubscribed"], true);

    let (status, _) = h
        .send(json_request(
            Method::PUT,
            &format!("/api/admin/users/{}/subscription", UserId::new()),
            json!({ "active": true }),
            Some(ADMIN_TOKEN),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Liveness + middleware ────────────────────────────────────────────

#[tokio::test]
async fn health_reports_counts() {
    let h = harness();
    h.add_user(0, false);
    h.chat(None, "q").await;

    let (status, body) = h.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Homework Helper API running");

    let (status, body) = h.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["users"], 1);
    assert_eq!(body["questions"], 1);
}

#[tokio::test]
async fn cors_allows_localhost_dev_ports() {
    let h = harness();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = h.app.clone().oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}
