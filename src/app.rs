use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    api,
    config::AppConfig,
    fetcher::{FeedRetriever, FeedSource},
};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn FeedSource>,
    pub default_handle: String,
    pub feed_host: String,
}

pub fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let retriever = FeedRetriever::new(&config.relay)?;

    tracing::info!(
        relay = %config.relay.base_url,
        feed_host = %config.relay.feed_host,
        handle = %config.blog.handle,
        "feed retriever ready"
    );

    let state = AppState {
        source: Arc::new(retriever),
        default_handle: config.blog.handle.clone(),
        feed_host: config.relay.feed_host.clone(),
    };

    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Router::new()
        .route("/healthz", get(api::health::health_check))
        .route("/api/posts", get(api::posts::list_posts))
        .route("/blog", get(api::blog::blog_section))
        .layer(middleware)
        .with_state(state)
}
