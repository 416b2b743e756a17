//!
//! aula HTTP/WS server
//! -------------------
//! This module defines the Axum-based HTTP API for aula.
//!
//! Responsibilities:
//! - Registration, login and logout endpoints backed by the `identity` module.
//! - Session management with a simple cookie model.
//! - A guarded `/dashboard` group for scheduling and fetching video lessons;
//!   the guard resolves the session and attaches the account to the request,
//!   role checks stay with the individual operations.
//! - WebSocket endpoint reserved for WebRTC signaling (placeholder).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::{get, post}, Router, extract::{State, ws::{WebSocketUpgrade, Message}, Path, Request}, Json, Extension};
use axum::extract::rejection::JsonRejection;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::{
    Account, AccountStore, AuthProvider, LocalAuthProvider, LoginRequest, RegisterRequest,
    SessionManager, SessionState,
};
use crate::lessons::{LessonId, LessonRecord, LessonStore};

const SESSION_COOKIE: &str = "aula_session";

/// Shared server state injected into all handlers.
///
/// Holds the account and lesson stores, the session manager, and the
/// credential provider wired over them. All members are cheap clones over
/// shared interiors.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountStore,
    pub lessons: LessonStore,
    pub sessions: SessionManager,
    pub auth: Arc<LocalAuthProvider>,
}

impl AppState {
    pub fn new(session_ttl: Duration) -> Self {
        let accounts = AccountStore::new();
        let sessions = SessionManager::new(session_ttl);
        let auth = Arc::new(LocalAuthProvider::new(accounts.clone(), sessions.clone()));
        Self {
            accounts,
            lessons: LessonStore::new(),
            sessions,
            auth,
        }
    }
}

/// Mount all HTTP and WebSocket routes over the given state.
pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/lessons", post(schedule_lesson))
        .route("/lessons/{id}", get(get_lesson))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(|| async { "aula ok" }))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .nest("/dashboard", guarded)
        .route("/ws/signaling", get(ws_signaling))
        .with_state(state)
}

/// Start the aula HTTP server bound to the given port.
pub async fn run_with_port(http_port: u16, session_ttl: Duration) -> anyhow::Result<()> {
    let state = AppState::new(session_ttl);
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Convenience entry point using the default port (8080) and a one hour
/// session TTL.
pub async fn run() -> anyhow::Result<()> {
    run_with_port(8080, Duration::from_secs(60 * 60)).await
}

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    email: String,
    password: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    title: String,
    scheduled_at: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({"status": self.code_str(), "error": self.message()}));
        (status, body).into_response()
    }
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name { return Some(v[1..].to_string()); }
        }
    }
    None
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    parse_cookie(headers, SESSION_COOKIE)
}

fn set_session_cookie(token: &str) -> HeaderValue {
    // HttpOnly cookie scoped to path / with SameSite=Strict
    HeaderValue::from_str(&format!("{}={}; HttpOnly; SameSite=Strict; Path=/", SESSION_COOKIE, token)).unwrap()
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!("{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Strict; Path=/", SESSION_COOKIE)).unwrap()
}

/// Access guard for the `/dashboard` group. Resolves the session cookie to an
/// account and attaches it to the request; anonymous requests and sessions
/// whose account no longer resolves are rejected with 401. No role check here.
async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = session_token(req.headers());
    let account = match state.sessions.resolve(token.as_deref()) {
        SessionState::Authenticated(id) => state.accounts.find_by_id(id),
        SessionState::Anonymous => None,
    };
    let Some(account) = account else {
        return AppError::unauthenticated().into_response();
    };
    req.extensions_mut().insert(account);
    next.run(req).await
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::invalid_input(e.body_text()))?;
    let account = state.auth.register(&RegisterRequest {
        email: payload.email,
        password: payload.password,
        role: payload.role,
    })?;
    info!("account registered id={} role={}", account.id, account.role);
    Ok((StatusCode::CREATED, Json(serde_json::json!({"status":"ok","id": account.id}))))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::invalid_input(e.body_text()))?;
    let resp = state.auth.login(&LoginRequest {
        email: payload.email,
        password: payload.password,
    })?;
    info!("login account={}", resp.account.id);
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", set_session_cookie(&resp.session.token));
    Ok((StatusCode::OK, headers, Json(serde_json::json!({"status":"ok"}))))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.sessions.logout(&token);
    }
    let mut h = HeaderMap::new();
    h.insert("Set-Cookie", clear_session_cookie());
    (StatusCode::OK, h, Json(serde_json::json!({"status":"ok"})))
}

async fn schedule_lesson(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    payload: Result<Json<SchedulePayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::invalid_input(e.body_text()))?;
    let record = state.lessons.schedule(&account, &payload.title, &payload.scheduled_at)?;
    info!("lesson scheduled id={} teacher={}", record.id, record.teacher_id);
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_lesson(
    State(state): State<AppState>,
    Extension(_account): Extension<Account>,
    Path(id): Path<String>,
) -> AppResult<Json<LessonRecord>> {
    let id: LessonId = id.parse().map_err(|_| AppError::invalid_input("invalid lesson id"))?;
    Ok(Json(state.lessons.get(id)?))
}

async fn ws_signaling(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|mut socket| async move {
        // Placeholder until the WebRTC signaling exchange lands: report the
        // feature as unavailable, then drain frames until the peer closes.
        let notice = serde_json::json!({"status":"error","error":"signaling not implemented"});
        let _ = socket.send(Message::Text(notice.to_string().into())).await;
        use futures_util::StreamExt;
        while let Some(Ok(msg)) = socket.next().await {
            match msg {
                Message::Close(_) => break,
                _ => {}
            }
        }
    })
}
