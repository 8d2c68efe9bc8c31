use std::net::SocketAddr;

use anyhow::Context;
use axum::{handler::HandlerWithoutStateExt, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::state::AppState;
use crate::{auth, orders, products};

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(products::router())
        .merge(orders::router())
        .route("/health", get(|| async { "ok" }));

    let router = Router::new().nest("/api", api);

    // with a frontend directory the banner gives way to index.html
    let router = match state.config.static_dir.clone() {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).not_found_service(route_not_found.into_service()),
        ),
        None => router.route("/", get(index)).fallback(route_not_found),
    };

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "E-commerce API is running!",
        "endpoints": {
            "products": "/api/products",
            "featured": "/api/products/featured",
            "register": "/api/auth/register",
            "login": "/api/auth/login",
            "profile": "/api/auth/me",
            "cart": "/api/auth/cart",
            "orders": "/api/orders",
            "myOrders": "/api/orders/my-orders"
        }
    }))
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found")
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
