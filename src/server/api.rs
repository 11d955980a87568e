use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::analytics;
use crate::error::AppError;
use crate::models::{Company, PriceField};
use crate::server::AppState;

type FieldErrors = BTreeMap<&'static str, String>;

fn validation_error(errors: FieldErrors) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Not found." })),
    )
        .into_response()
}

fn internal_error(err: AppError) -> Response {
    error!(error = %err, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error." })),
    )
        .into_response()
}

async fn company_or_404(state: &AppState, ticker: &str) -> Result<Company, Response> {
    match state.store.get_company(ticker).await {
        Ok(Some(company)) => Ok(company),
        Ok(None) => Err(not_found()),
        Err(e) => Err(internal_error(e)),
    }
}

/// GET /api/stocks/ - list all companies.
pub async fn list_companies(State(state): State<AppState>) -> Response {
    match state.store.list_companies().await {
        Ok(companies) => Json(companies).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/stocks/{ticker}/ - the company's stock days, newest first.
pub async fn list_stock_days(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Response {
    let company = match company_or_404(&state, &ticker).await {
        Ok(company) => company,
        Err(response) => return response,
    };

    match state.store.stock_days_desc(company.id).await {
        Ok(days) => Json(days).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/stocks/{ticker}/insider/ - the company's trades, newest first.
pub async fn list_trades(State(state): State<AppState>, Path(ticker): Path<String>) -> Response {
    let company = match company_or_404(&state, &ticker).await {
        Ok(company) => company,
        Err(response) => return response,
    };

    match state.store.trades(company.id, None).await {
        Ok(trades) => Json(trades).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/stocks/{ticker}/insider/{insider}/ - trades filtered by insider
/// slug.
pub async fn list_insider_trades(
    State(state): State<AppState>,
    Path((ticker, insider)): Path<(String, String)>,
) -> Response {
    let company = match company_or_404(&state, &ticker).await {
        Ok(company) => company,
        Err(response) => return response,
    };

    match state.store.trades(company.id, Some(&insider)).await {
        Ok(trades) => Json(trades).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct PriceAnalyticsQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

fn parse_query_date(errors: &mut FieldErrors, field: &'static str, value: Option<&str>) -> Option<NaiveDate> {
    let Some(value) = value else {
        errors.insert(field, "This field is required.".to_string());
        return None;
    };

    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.insert(field, format!("Invalid date '{}', expected YYYY-MM-DD.", value));
            None
        }
    }
}

fn validate_date_range(query: &PriceAnalyticsQuery) -> Result<(NaiveDate, NaiveDate), FieldErrors> {
    let mut errors = FieldErrors::new();
    let date_from = parse_query_date(&mut errors, "date_from", query.date_from.as_deref());
    let date_to = parse_query_date(&mut errors, "date_to", query.date_to.as_deref());

    match (date_from, date_to) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(errors),
    }
}

/// GET /api/stocks/{ticker}/analytics/?date_from&date_to - signed
/// field-wise price difference between the earliest and latest stock day in
/// the range. An empty range yields an empty diff object.
pub async fn price_analytics(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<PriceAnalyticsQuery>,
) -> Response {
    let (date_from, date_to) = match validate_date_range(&query) {
        Ok(range) => range,
        Err(errors) => return validation_error(errors),
    };

    let company = match company_or_404(&state, &ticker).await {
        Ok(company) => company,
        Err(response) => return response,
    };

    let days = match state
        .store
        .stock_days_in_range(company.id, date_from, date_to)
        .await
    {
        Ok(days) => days,
        Err(e) => return internal_error(e),
    };

    match (days.first(), days.last()) {
        (Some(start), Some(end)) => {
            Json(json!({ "analytics": start.prices_diff(end) })).into_response()
        }
        _ => Json(json!({ "analytics": {} })).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    #[serde(rename = "type")]
    pub price_type: Option<String>,
    pub value: Option<String>,
}

fn validate_period_query(query: &PeriodQuery) -> Result<(PriceField, u64), FieldErrors> {
    let mut errors = FieldErrors::new();

    let field = match query.price_type.as_deref() {
        None => {
            errors.insert("type", "This field is required.".to_string());
            None
        }
        Some(value) => match PriceField::parse(value) {
            Ok(field) => Some(field),
            Err(e) => {
                errors.insert("type", e.to_string());
                None
            }
        },
    };

    let threshold = match query.value.as_deref() {
        None => {
            errors.insert("value", "This field is required.".to_string());
            None
        }
        Some(value) => match value.parse::<u64>() {
            Ok(threshold) => Some(threshold),
            Err(_) => {
                errors.insert(
                    "value",
                    format!("Invalid value '{}', expected a non-negative integer.", value),
                );
                None
            }
        },
    };

    match (field, threshold) {
        (Some(field), Some(threshold)) => Ok((field, threshold)),
        _ => Err(errors),
    }
}

/// GET /api/stocks/{ticker}/delta/?type&value - minimal covering set of
/// price jumps of at least `value` for the chosen price field.
pub async fn period_analytics(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let (field, threshold) = match validate_period_query(&query) {
        Ok(validated) => validated,
        Err(errors) => return validation_error(errors),
    };

    let company = match company_or_404(&state, &ticker).await {
        Ok(company) => company,
        Err(response) => return response,
    };

    let days = match state.store.stock_days_asc(company.id).await {
        Ok(days) => days,
        Err(e) => return internal_error(e),
    };

    let points = analytics::period_points(&days, field);
    let periods = analytics::min_price_periods(&points, threshold.into());

    Json(json!({ "analytics": periods })).into_response()
}
