//! HTTP route handlers for the gas planning API.

use axum::{
    extract::rejection::JsonRejection,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::chart;
use crate::error::{AppError, Result};

use super::calculator::{compute_minimum_gas, compute_turn_data};
use super::models::{CalculateRequest, CalculateResponse, DiveInputs, Waypoints};
use super::tanks::{TankSpec, TANKS};

/// Create the gas planning router.
pub fn router() -> Router {
    Router::new()
        .route("/calculate", post(calculate))
        .route("/tanks", get(tanks))
}

/// Tank table in display order.
async fn tanks() -> Json<&'static [TankSpec]> {
    Json(&TANKS[..])
}

/// Compute minimum gas, turn pressure and dive time, with a chart.
async fn calculate(
    payload: std::result::Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculateResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let inputs = DiveInputs::try_from(request)?;
    tracing::debug!(?inputs, "Planning dive");

    // Chart rasterisation is CPU-bound.
    let response = tokio::task::spawn_blocking(move || plan(&inputs)).await??;
    Ok(Json(response))
}

fn plan(inputs: &DiveInputs) -> Result<CalculateResponse> {
    let minimum = compute_minimum_gas(inputs.sac, inputs.depth, &inputs.tank, inputs.config)?;
    let turn = compute_turn_data(
        inputs.start_pressure,
        minimum.pressure_psi,
        &inputs.tank,
        inputs.config,
        inputs.sac,
        inputs.depth,
    )?;

    let waypoints = Waypoints::for_dive(inputs.start_pressure, minimum.pressure_psi, &turn);
    let graph_img = chart::render_base64_png(&waypoints.times, &waypoints.pressures)?;

    tracing::info!(
        tank = %inputs.tank,
        minimum_gas = minimum.pressure_psi,
        average_ata = minimum.average_ata,
        turn_pressure = turn.turn_pressure,
        cf_per_min_at_depth = turn.consumption_at_depth,
        "Dive planned"
    );

    Ok(CalculateResponse::new(minimum.pressure_psi, &turn, graph_img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post_json(body: String) -> (StatusCode, Value) {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn calculate_json(body: Value) -> (StatusCode, Value) {
        post_json(body.to_string()).await
    }

    #[tokio::test]
    async fn test_twinset_plan() {
        let (status, body) = calculate_json(json!({
            "sac": 0.5,
            "depth": 60,
            "tank": "HP130",
            "config": "double",
            "start_pressure": 3400
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["minimum_gas"], 500);
        assert_eq!(body["turn_pressure"], 1950);
        assert_eq!(body["gas_before_turn_psi"], 1450.0);
        assert_eq!(body["gas_before_turn_cf"], 116.0);
        assert_eq!(body["total_dive_time_min"], 164.65);
        assert_eq!(body["time_before_turn"], 82.32);
        assert_eq!(body["usable_gas"], 2900.0);
        assert!(!body["graph_img"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reserve_above_floor() {
        let (status, body) = calculate_json(json!({
            "sac": "0.5",
            "depth": "40",
            "tank": "AL40",
            "config": "single",
            "start_pressure": "3000"
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["minimum_gas"], 642);
        assert_eq!(body["turn_pressure"], 1821);
        assert_eq!(body["gas_before_turn_psi"], 1178.79);
        assert_eq!(body["gas_before_turn_cf"], 14.73);
        assert_eq!(body["time_before_turn"], 13.32);
        assert_eq!(body["total_dive_time_min"], 26.64);
        assert_eq!(body["usable_gas"], 2357.58);
    }

    #[tokio::test]
    async fn test_identical_requests_identical_responses() {
        let request = json!({
            "sac": 0.7, "depth": 45, "tank": "LP95", "config": "single", "start_pressure": 2640
        });
        let (_, first) = calculate_json(request.clone()).await;
        let (_, second) = calculate_json(request).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_hundred_feet_al80_is_unsuitable() {
        let (status, body) = calculate_json(json!({
            "sac": 0.6,
            "depth": 100,
            "tank": "AL80",
            "config": "single",
            "start_pressure": 3000
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "The gas tank type/ starting pressure is not suitable for this dive."
        );
    }

    #[tokio::test]
    async fn test_start_pressure_below_reserve() {
        let (status, body) = calculate_json(json!({
            "sac": 0.5, "depth": 30, "tank": "AL80", "config": "single", "start_pressure": 500
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Start pressure must be greater than minimum gas.");
    }

    #[tokio::test]
    async fn test_unknown_tank() {
        let (status, body) = calculate_json(json!({
            "sac": 0.5, "depth": 30, "tank": "AL100", "config": "single", "start_pressure": 3000
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input: unknown tank \"AL100\"");
    }

    #[tokio::test]
    async fn test_missing_field() {
        let (status, body) = calculate_json(json!({
            "depth": 30, "tank": "AL80", "config": "single", "start_pressure": 3000
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input: missing field sac");
    }

    #[tokio::test]
    async fn test_huge_start_pressure_is_rejected() {
        for start_pressure in [1.7e308, 1e20, 10_001.0] {
            let (status, body) = calculate_json(json!({
                "sac": 0.5, "depth": 30, "tank": "AL80", "config": "single",
                "start_pressure": start_pressure
            }))
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{start_pressure}");
            assert_eq!(
                body["error"],
                "Invalid input: start_pressure must be between 1 and 10000"
            );
        }
    }

    #[tokio::test]
    async fn test_vanishing_sac_is_rejected() {
        let (status, body) = calculate_json(json!({
            "sac": 5e-324, "depth": 30, "tank": "AL80", "config": "single", "start_pressure": 3000
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input: sac must be between 0.01 and 10");
    }

    #[tokio::test]
    async fn test_input_limits_are_inclusive() {
        let (status, body) = calculate_json(json!({
            "sac": 10, "depth": 0, "tank": "HP130", "config": "double", "start_pressure": 10000
        }))
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["minimum_gas"], 500);
        assert_eq!(body["turn_pressure"], 5250);

        // 2610 psi reserve at 1000 ft, so only a full cylinder turns above it.
        let (status, body) = calculate_json(json!({
            "sac": 0.01, "depth": 1000, "tank": "AL40", "config": "single", "start_pressure": 10000
        }))
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["minimum_gas"], 2610);

        let (status, body) = calculate_json(json!({
            "sac": 0.5, "depth": 1000.5, "tank": "AL80", "config": "single", "start_pressure": 3000
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input: depth must be between 0 and 1000");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (status, body) = post_json("{not json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_tank_list() {
        let response = router()
            .oneshot(Request::builder().uri("/tanks").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let tanks = body.as_array().unwrap();
        assert_eq!(tanks.len(), 11);
        assert_eq!(tanks[0], json!({ "name": "AL40", "capacity_factor": 1.25 }));
    }
}
