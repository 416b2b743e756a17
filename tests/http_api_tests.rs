//! End-to-end HTTP API tests driving a real bound server with a
//! cookie-holding client.

use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use aula::server::{self, AppState};

async fn spawn_server(session_ttl: Duration) -> Result<String> {
    let state = AppState::new(session_ttl);
    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok(format!("http://{}", addr))
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().unwrap()
}

async fn register(base: &str, c: &reqwest::Client, email: &str, password: &str, role: &str) -> reqwest::Response {
    c.post(format!("{base}/register"))
        .json(&json!({"email": email, "password": password, "role": role}))
        .send()
        .await
        .unwrap()
}

async fn login(base: &str, c: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
    c.post(format!("{base}/login"))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn full_teacher_scenario() -> Result<()> {
    let base = spawn_server(Duration::from_secs(3600)).await?;
    let c = client();

    let resp = register(&base, &c, "t@x.com", "pw1", "teacher").await;
    assert_eq!(resp.status(), 201);

    let resp = login(&base, &c, "t@x.com", "pw1").await;
    assert_eq!(resp.status(), 200);

    let resp = c
        .post(format!("{base}/dashboard/lessons"))
        .json(&json!({"title": "Algebra", "scheduled_at": "2026-09-01T10:00:00Z"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = resp.json().await?;
    assert_eq!(created["id"], 1);
    assert_eq!(created["title"], "Algebra");
    assert_eq!(created["teacher_id"], 1);
    assert!(created.get("password_hash").is_none());

    let resp = c.get(format!("{base}/dashboard/lessons/1")).send().await?;
    assert_eq!(resp.status(), 200);
    let fetched: serde_json::Value = resp.json().await?;
    assert_eq!(fetched, created);

    let resp = c.get(format!("{base}/dashboard/lessons/2")).send().await?;
    assert_eq!(resp.status(), 404);
    Ok(())
}

#[tokio::test]
async fn guarded_routes_require_a_session() -> Result<()> {
    let base = spawn_server(Duration::from_secs(3600)).await?;
    let c = client();

    let resp = c
        .post(format!("{base}/dashboard/lessons"))
        .json(&json!({"title": "Algebra", "scheduled_at": "2026-09-01T10:00:00Z"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 401);

    let resp = c.get(format!("{base}/dashboard/lessons/1")).send().await?;
    assert_eq!(resp.status(), 401);

    // a made-up cookie is no better
    let resp = c
        .get(format!("{base}/dashboard/lessons/1"))
        .header("cookie", "aula_session=forged")
        .send()
        .await?;
    assert_eq!(resp.status(), 401);
    Ok(())
}

#[tokio::test]
async fn student_cannot_schedule() -> Result<()> {
    let base = spawn_server(Duration::from_secs(3600)).await?;
    let c = client();

    assert_eq!(register(&base, &c, "s@x.com", "pw1", "student").await.status(), 201);
    assert_eq!(login(&base, &c, "s@x.com", "pw1").await.status(), 200);

    let resp = c
        .post(format!("{base}/dashboard/lessons"))
        .json(&json!({"title": "Algebra", "scheduled_at": "2026-09-01T10:00:00Z"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 403);

    // reading is allowed for any authenticated account
    let resp = c.get(format!("{base}/dashboard/lessons/1")).send().await?;
    assert_eq!(resp.status(), 404);
    Ok(())
}

#[tokio::test]
async fn registration_and_login_failures() -> Result<()> {
    let base = spawn_server(Duration::from_secs(3600)).await?;
    let c = client();

    // bad role
    assert_eq!(register(&base, &c, "a@x.com", "pw1", "admin").await.status(), 400);
    // empty fields
    assert_eq!(register(&base, &c, "", "pw1", "teacher").await.status(), 400);
    assert_eq!(register(&base, &c, "a@x.com", "", "teacher").await.status(), 400);

    assert_eq!(register(&base, &c, "a@x.com", "pw1", "teacher").await.status(), 201);
    // duplicate
    assert_eq!(register(&base, &c, "a@x.com", "other", "student").await.status(), 400);

    // wrong password and unknown email both come back 401
    assert_eq!(login(&base, &c, "a@x.com", "wrong").await.status(), 401);
    assert_eq!(login(&base, &c, "ghost@x.com", "pw1").await.status(), 401);

    // malformed body
    let resp = c
        .post(format!("{base}/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    Ok(())
}

#[tokio::test]
async fn invalid_lesson_inputs() -> Result<()> {
    let base = spawn_server(Duration::from_secs(3600)).await?;
    let c = client();

    assert_eq!(register(&base, &c, "t@x.com", "pw1", "teacher").await.status(), 201);
    assert_eq!(login(&base, &c, "t@x.com", "pw1").await.status(), 200);

    // empty title
    let resp = c
        .post(format!("{base}/dashboard/lessons"))
        .json(&json!({"title": "", "scheduled_at": "2026-09-01T10:00:00Z"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    // unparseable timestamp
    let resp = c
        .post(format!("{base}/dashboard/lessons"))
        .json(&json!({"title": "Algebra", "scheduled_at": "tomorrow"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    // non-numeric lesson id
    let resp = c.get(format!("{base}/dashboard/lessons/abc")).send().await?;
    assert_eq!(resp.status(), 400);
    Ok(())
}

#[tokio::test]
async fn logout_invalidates_the_session() -> Result<()> {
    let base = spawn_server(Duration::from_secs(3600)).await?;
    let c = client();

    assert_eq!(register(&base, &c, "t@x.com", "pw1", "teacher").await.status(), 201);
    assert_eq!(login(&base, &c, "t@x.com", "pw1").await.status(), 200);

    let resp = c
        .post(format!("{base}/dashboard/lessons"))
        .json(&json!({"title": "Algebra", "scheduled_at": "2026-09-01T10:00:00Z"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);

    assert_eq!(c.post(format!("{base}/logout")).send().await?.status(), 200);

    let resp = c.get(format!("{base}/dashboard/lessons/1")).send().await?;
    assert_eq!(resp.status(), 401);
    Ok(())
}

#[tokio::test]
async fn expired_session_is_rejected() -> Result<()> {
    let base = spawn_server(Duration::ZERO).await?;
    let c = client();

    assert_eq!(register(&base, &c, "t@x.com", "pw1", "teacher").await.status(), 201);
    assert_eq!(login(&base, &c, "t@x.com", "pw1").await.status(), 200);

    let resp = c.get(format!("{base}/dashboard/lessons/1")).send().await?;
    assert_eq!(resp.status(), 401);
    Ok(())
}

#[tokio::test]
async fn liveness_route_answers() -> Result<()> {
    let base = spawn_server(Duration::from_secs(3600)).await?;
    let resp = reqwest::get(&base).await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await?, "aula ok");
    Ok(())
}
