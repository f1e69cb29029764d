//! Admin endpoints; every handler requires [`AdminUser`]

use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path},
    response::{IntoResponse, Response},
    routing::{Router, delete, get, post, put},
};
use http::StatusCode;
use serde::Serialize;
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;

use wishlist::{
    AdminCredential, AdminItem, Ban, CoordinationError, ExchangeRate, RateLimitPolicy,
    StoredImage, WishlistItem, batch_reweight, confirm_reservation, create_ban, create_item,
    delete_ban, delete_credential, delete_item, list_bans, list_credentials, list_items_admin,
    patch_item, set_exchange_rate, update_item, upload_image,
    validation::{
        BanRequest, BatchReweightRequest, ExchangeRateRequest, ItemPatchRequest, ItemRequest,
    },
};

use crate::config::UPLOAD_BODY_LIMIT;
use crate::error::{ErrorResponse, IntoResponseError};
use crate::extract::{AdminUser, ValidJson};

/// Multipart field carrying the image
const UPLOAD_FIELD: &str = "file";

pub(crate) fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create))
        .route("/items/batch", post(batch))
        .route("/items/{id}", put(update).patch(patch).delete(remove))
        .route("/reservations/{item_id}/confirm", post(confirm))
        .route("/bans", get(bans).post(ban))
        .route("/bans/{id}", delete(unban))
        .route("/exchange-rates", put(exchange_rate))
        .route("/credentials", get(credentials))
        .route("/credentials/{id}", delete(remove_credential))
        .merge(
            Router::new()
                .route("/upload", post(upload))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(UPLOAD_BODY_LIMIT)),
        )
}

#[derive(Serialize)]
struct BatchResult {
    updated: usize,
}

async fn list_items(_admin: AdminUser) -> Result<Json<Vec<AdminItem>>, ErrorResponse> {
    Ok(Json(list_items_admin().await.into_response_error()?))
}

async fn create(
    admin: AdminUser,
    ValidJson(fields): ValidJson<ItemRequest>,
) -> Result<(StatusCode, Json<WishlistItem>), ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    let item = create_item(fields).await.into_response_error()?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update(
    admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(fields): ValidJson<ItemRequest>,
) -> Result<Json<WishlistItem>, ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    Ok(Json(update_item(id, fields).await.into_response_error()?))
}

async fn patch(
    admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(patch): ValidJson<ItemPatchRequest>,
) -> Result<Json<AdminItem>, ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    Ok(Json(patch_item(id, patch).await.into_response_error()?))
}

async fn remove(admin: AdminUser, Path(id): Path<i64>) -> Result<StatusCode, ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    delete_item(id).await.into_response_error()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn batch(
    admin: AdminUser,
    ValidJson(updates): ValidJson<BatchReweightRequest>,
) -> Result<Json<BatchResult>, ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    let updated = batch_reweight(updates).await.into_response_error()?;
    Ok(Json(BatchResult { updated }))
}

async fn confirm(admin: AdminUser, Path(item_id): Path<i64>) -> Result<StatusCode, ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    confirm_reservation(item_id).await.into_response_error()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bans(_admin: AdminUser) -> Result<Json<Vec<Ban>>, ErrorResponse> {
    Ok(Json(list_bans().await.into_response_error()?))
}

async fn ban(
    admin: AdminUser,
    ValidJson(ban): ValidJson<BanRequest>,
) -> Result<(StatusCode, Json<Ban>), ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    let ban = create_ban(ban).await.into_response_error()?;
    Ok((StatusCode::CREATED, Json(ban)))
}

async fn unban(admin: AdminUser, Path(id): Path<i64>) -> Result<StatusCode, ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    delete_ban(id).await.into_response_error()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn exchange_rate(
    admin: AdminUser,
    ValidJson(rate): ValidJson<ExchangeRateRequest>,
) -> Result<Json<ExchangeRate>, ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    Ok(Json(set_exchange_rate(rate).await.into_response_error()?))
}

async fn credentials(_admin: AdminUser) -> Result<Json<Vec<AdminCredential>>, ErrorResponse> {
    Ok(Json(list_credentials().await.into_response_error()?))
}

async fn remove_credential(
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    admin.enforce(&RateLimitPolicy::ADMIN).await?;
    delete_credential(&id).await.into_response_error()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accepts one image in the `file` field. The stored type comes from the
/// bytes, never from the declared content type.
async fn upload(admin: AdminUser, mut multipart: Multipart) -> Result<Json<StoredImage>, Response> {
    admin
        .enforce(&RateLimitPolicy::UPLOAD)
        .await
        .map_err(IntoResponse::into_response)?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let declared_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let stored = upload_image(&bytes, declared_type.as_deref())
            .await
            .into_response_error()
            .map_err(IntoResponse::into_response)?;
        return Ok(Json(stored));
    }

    Err(ErrorResponse(CoordinationError::BadRequest(format!(
        "Missing '{UPLOAD_FIELD}' field"
    )))
    .into_response())
}

/// Keeps the parser's status so an oversized body stays a `413`
fn multipart_error(err: axum::extract::multipart::MultipartError) -> Response {
    tracing::debug!("Multipart error: {}", err);
    let status = err.status();
    (status, Json(json!({ "error": err.body_text() }))).into_response()
}
