//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, InvoiceResponse, SessionRecord, SessionsQuery};

/// `GET /invoice` → 200 + `InvoiceResponse` JSON
pub async fn get_invoice(State(state): State<Arc<AppState>>) -> Json<InvoiceResponse> {
    Json(InvoiceResponse {
        period: state.period.map(|p| p.to_string()),
        vehicle: state.vehicle.clone(),
        billed_sessions: state.invoice.lines.len(),
        excluded_sessions: state.invoice.excluded,
        rejected_rows: state.rejected_rows,
        totals: state.invoice.totals,
    })
}

/// Returns billed sessions, optionally filtered by start date.
///
/// `GET /sessions` → 200 + `Vec<SessionRecord>` JSON
/// `GET /sessions?from=2025-08-01&to=2025-08-15` → inclusive range
/// `GET /sessions?from=2025-08-15&to=2025-08-01` → 400 + `ErrorResponse`
pub async fn get_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionsQuery>,
) -> impl IntoResponse {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("`from` ({from}) must be <= `to` ({to})"),
                }),
            ));
        }
    }

    let records: Vec<SessionRecord> = state
        .invoice
        .lines
        .iter()
        .filter(|l| {
            let day = l.session.start.date();
            query.from.is_none_or(|from| day >= from) && query.to.is_none_or(|to| day <= to)
        })
        .map(SessionRecord::from)
        .collect();

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::billing::{ChargingSession, ImpactModel, Invoice, SessionAllocator};

    fn make_test_state() -> Arc<AppState> {
        let sessions: Vec<ChargingSession> = (1..=10)
            .map(|d| {
                let start = NaiveDate::from_ymd_opt(2025, 8, d)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap();
                ChargingSession::new(start, 3600, 5.0).unwrap()
            })
            .collect();
        let invoice = Invoice::build(
            &sessions,
            &SessionAllocator::default(),
            &ImpactModel::default(),
        )
        .unwrap();
        Arc::new(AppState {
            invoice,
            period: "2025-08".parse().ok(),
            vehicle: Some("Scenic".to_string()),
            rejected_rows: 1,
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn invoice_returns_totals() {
        let (status, json) = get_json("/invoice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["period"], "2025-08");
        assert_eq!(json["billed_sessions"], 10);
        assert_eq!(json["rejected_rows"], 1);
        let kwh = json["totals"]["energy"]["total_kwh"].as_f64().unwrap();
        assert!((kwh - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn sessions_returns_all_lines() {
        let (status, json) = get_json("/sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(10));
    }

    #[tokio::test]
    async fn sessions_range_is_inclusive() {
        let (status, json) = get_json("/sessions?from=2025-08-03&to=2025-08-05").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["start"], "2025-08-03T00:00:00");
        assert_eq!(rows[2]["start"], "2025-08-05T00:00:00");
    }

    #[tokio::test]
    async fn inverted_range_returns_400() {
        let (status, json) = get_json("/sessions?from=2025-08-09&to=2025-08-02").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }
}
