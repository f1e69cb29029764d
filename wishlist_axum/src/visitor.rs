//! Public visitor endpoints

use std::collections::HashMap;

use axum::{
    Json,
    response::IntoResponse,
    routing::{Router, get, post},
};
use http::{HeaderMap, HeaderValue, header::CACHE_CONTROL};
use serde::Serialize;

use wishlist::{
    RateLimitPolicy, WishlistItem, enforce_rate_limit, exchange_table, list_public_items,
    reservation_map, reserve_item, unreserve_item,
    validation::{ReserveRequest, UnreserveRequest},
};

use crate::error::{ErrorResponse, IntoResponseError, rate_limit_headers};
use crate::extract::{ClientIp, ValidJson};

pub(crate) fn router() -> Router {
    Router::new()
        .route("/items", get(list_items))
        .route("/reserve", post(reserve))
        .route("/unreserve", post(unreserve))
        .route("/reservations", get(reservations))
        .route("/exchange-rates", get(exchange_rates))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReserveResponse {
    success: bool,
    reservation_token: String,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

async fn list_items() -> Result<Json<Vec<WishlistItem>>, ErrorResponse> {
    let items = list_public_items().await.into_response_error()?;
    Ok(Json(items))
}

async fn reserve(
    ip: ClientIp,
    ValidJson(request): ValidJson<ReserveRequest>,
) -> Result<(HeaderMap, Json<ReserveResponse>), ErrorResponse> {
    let decision = enforce_rate_limit(&RateLimitPolicy::RESERVATION, &ip.rate_limit_key("reserve"))
        .await
        .into_response_error()?;

    let reservation_token =
        reserve_item(request.item_id, request.visitor_id.trim(), ip.0.as_deref())
            .await
            .into_response_error()?;

    let headers = decision.as_ref().map(rate_limit_headers).unwrap_or_default();
    Ok((
        headers,
        Json(ReserveResponse {
            success: true,
            reservation_token,
        }),
    ))
}

async fn unreserve(
    ip: ClientIp,
    ValidJson(request): ValidJson<UnreserveRequest>,
) -> Result<(HeaderMap, Json<SuccessResponse>), ErrorResponse> {
    let decision =
        enforce_rate_limit(&RateLimitPolicy::RESERVATION, &ip.rate_limit_key("unreserve"))
            .await
            .into_response_error()?;

    unreserve_item(
        request.item_id,
        &request.visitor_id,
        request.reservation_token.as_deref(),
    )
    .await
    .into_response_error()?;

    let headers = decision.as_ref().map(rate_limit_headers).unwrap_or_default();
    Ok((headers, Json(SuccessResponse { success: true })))
}

/// Current reservation state by item id; never cached
async fn reservations() -> Result<impl IntoResponse, ErrorResponse> {
    let map = reservation_map().await.into_response_error()?;
    Ok((
        [(CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(map),
    ))
}

async fn exchange_rates() -> Result<Json<HashMap<String, f64>>, ErrorResponse> {
    let table = exchange_table().await.into_response_error()?;
    Ok(Json(table.as_map()))
}
