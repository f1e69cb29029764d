//! Calls from the page to the reservation JSON API

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::catalog::ReservationStatus;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Non-2xx response with the server's `error` message
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl ApiError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Status { status: 403, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[async_trait]
pub trait ReservationApi: Send + Sync {
    /// Returns the reservation token
    async fn reserve(&self, item_id: i64, visitor_id: &str) -> Result<String, ApiError>;

    async fn unreserve(
        &self,
        item_id: i64,
        visitor_id: &str,
        reservation_token: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn reservation_map(&self) -> Result<HashMap<i64, ReservationStatus>, ApiError>;
}

/// `ReservationApi` over HTTP against the wishlist routes
pub struct HttpReservationApi {
    client: reqwest::Client,
    /// e.g. `https://example.com/api`
    base_url: String,
}

impl HttpReservationApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/wishlist/{}", self.base_url, path)
    }

    async fn error_from(response: reqwest::Response) -> ApiError {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: String,
        }

        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("Request failed with status {status}"),
        };
        ApiError::Status { status, message }
    }
}

#[async_trait]
impl ReservationApi for HttpReservationApi {
    async fn reserve(&self, item_id: i64, visitor_id: &str) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ReserveBody {
            reservation_token: String,
        }

        let response = self
            .client
            .post(self.url("reserve"))
            .json(&json!({ "itemId": item_id, "visitorId": visitor_id }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.json::<ReserveBody>().await?.reservation_token)
    }

    async fn unreserve(
        &self,
        item_id: i64,
        visitor_id: &str,
        reservation_token: Option<&str>,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("unreserve"))
            .json(&json!({
                "itemId": item_id,
                "visitorId": visitor_id,
                "reservationToken": reservation_token
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    async fn reservation_map(&self) -> Result<HashMap<i64, ReservationStatus>, ApiError> {
        let response = self.client.get(self.url("reservations")).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        // JSON object keys are strings
        let raw: HashMap<String, ReservationStatus> = response.json().await?;
        Ok(raw
            .into_iter()
            .filter_map(|(id, status)| id.parse().ok().map(|id| (id, status)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_detection() {
        let forbidden = ApiError::Status {
            status: 403,
            message: "banned".to_string(),
        };
        assert!(forbidden.is_forbidden());
        assert!(!ApiError::Network("down".to_string()).is_forbidden());
    }

    #[test]
    fn test_url_building() {
        let api = HttpReservationApi::new("http://localhost:3001/api/").unwrap();
        assert_eq!(
            api.url("reserve"),
            "http://localhost:3001/api/wishlist/reserve"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let api = HttpReservationApi::new("http://127.0.0.1:1/api").unwrap();
        assert!(matches!(
            api.reserve(1, "visitor").await,
            Err(ApiError::Network(_))
        ));
    }
}
