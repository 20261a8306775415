//! Gas Planner - Rust/Axum calculator
//!
//! Minimum gas, turn pressure and dive time for a single-tank or twinset
//! recreational dive, with a pressure-over-time chart.

use axum::{response::Json, routing::get, Router};
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod chart;
mod error;
pub mod gas;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gas_planner_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("{} tank types loaded", gas::TANKS.len());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app()).await?;

    Ok(())
}

/// Build the application router.
fn app() -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Calculator page
        .route("/", get(routes::home::index))
        // Gas planning API
        .merge(gas::router())
        // Static files
        .nest_service("/static", ServeDir::new("static"))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "gas-planner-web"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn get_body(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_body("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_index_lists_every_tank() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        for tank in gas::TANKS.iter() {
            assert!(body.contains(&format!("value=\"{}\"", tank.name)), "{}", tank.name);
        }
    }

    #[tokio::test]
    async fn test_calculate_is_mounted_at_root() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"sac":0.5,"depth":60,"tank":"HP130","config":"double","start_pressure":3400}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
