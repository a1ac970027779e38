mod handlers;
mod models;
mod routes;
mod state;
use std::env;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use routes::{ratings::rating_routes, summary::summary_routes};
use state::AppState;
use summarizer_service_cli::{
    ai::AIAnalyzer,
    config::{OracleConfig, SummarizerConfig},
    scraper::ArticleFetcher,
    utils,
};


pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(summary_routes(state.clone()))
        .merge(rating_routes(state))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    utils::init_tracing();

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

    let config = SummarizerConfig::from_env().expect("invalid summarizer configuration");
    let oracle_config = OracleConfig::from_env(config.batch_size).expect("invalid oracle configuration");
    let analyzer = Arc::new(AIAnalyzer::new(oracle_config).expect("failed to build oracle client"));
    let fetcher = Arc::new(ArticleFetcher::new().expect("failed to build http client"));

    let state = AppState::new(fetcher, analyzer.clone(), analyzer, config);
    let mut app = build_app(state);

    match env::var("CLIENT_URL") {
        Ok(client_url) => {
            let cors = CorsLayer::new()
                .allow_origin(client_url.parse::<HeaderValue>().expect("CLIENT_URL must be a valid origin"))
                .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]);
            app = app.layer(cors);
        }
        Err(_) => warn!("CLIENT_URL not set, CORS disabled"),
    }

    let listener = TcpListener::bind(&bind_addr).await.unwrap();
    info!("listening on {}", bind_addr);
    axum::serve(listener, app).await.unwrap();
}
