mod backend;
mod config;
mod guard;
mod identity;
mod rate_limit;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use backend::completions::CompletionsClient;
use backend::documents::DocumentsClient;
use backend::http::HttpChatBackend;
use identity::gotrue::GoTrueClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let auth = GoTrueClient::new(&config.auth.url, config.auth.anon_key.clone(), config.timeouts)
        .expect("auth provider client init failed");
    let backend = HttpChatBackend::new(&config.backend_url, config.timeouts).expect("backend client init failed");

    // Optional upstreams: routes answer 503 when these are missing.
    let documents = match config.documents_url.as_deref() {
        Some(url) => match DocumentsClient::new(url, config.timeouts) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "document store client init failed; document routes disabled");
                None
            }
        },
        None => {
            tracing::warn!("DOCUMENTS_API_URL not set; document routes disabled");
            None
        }
    };
    let completions = match config.completions.as_ref() {
        Some(cfg) => match CompletionsClient::new(cfg, config.timeouts) {
            Ok(client) => {
                tracing::info!(model = client.model(), "completions client initialized");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!(error = %e, "completions client init failed; /api/chat disabled");
                None
            }
        },
        None => {
            tracing::warn!("OPENAI_API_KEY not set; /api/chat disabled");
            None
        }
    };

    tracing::info!(
        static_dir = %config.static_dir.display(),
        excluded = ?config.exclusions.prefixes(),
        "route guard configured"
    );

    let state = state::AppState::new(config, Arc::new(auth), Arc::new(backend))
        .with_documents(documents)
        .with_completions(completions)
        .with_rate_limiter(rate_limit::RateLimiter::new());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "chatgate listening");
    axum::serve(listener, app).await.expect("server failed");
}
