use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port = std::env::var("AULA_HTTP_PORT").unwrap_or_else(|_| "8080".to_string());
    let ttl_secs = std::env::var("AULA_SESSION_TTL_SECS").unwrap_or_else(|_| "3600".to_string());
    info!(
        target: "aula",
        "aula starting: RUST_LOG='{}', http_port={}, session_ttl_secs={}",
        rust_log, http_port, ttl_secs
    );

    let port: u16 = http_port.parse().unwrap_or(8080);
    let ttl = std::time::Duration::from_secs(ttl_secs.parse().unwrap_or(3600));
    aula::server::run_with_port(port, ttl).await
}
