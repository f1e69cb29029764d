//! Cache-invalidation signal sent to the page-rendering layer after mutations

use std::sync::LazyLock;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;

/// Endpoint that drops cached renderings of the given paths; unset disables the signal
static REVALIDATE_URL: LazyLock<Option<String>> = LazyLock::new(|| {
    std::env::var("REVALIDATE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
});

static REVALIDATE_SECRET: LazyLock<String> =
    LazyLock::new(|| std::env::var("REVALIDATE_SECRET").unwrap_or_default());

static CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create reqwest client")
});

pub(crate) const REVALIDATE_SECRET_HEADER: &str = "x-revalidate-secret";

/// Public paths whose rendering depends on wishlist rows
pub(crate) const WISHLIST_PATHS: &[&str] = &["/wishlist"];

#[derive(Debug, Error)]
pub(crate) enum RevalidateError {
    #[error("Revalidation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Revalidation endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// Fires the signal in the background. Failures are logged, never returned.
pub(crate) fn revalidate_paths(paths: &[&str]) {
    let Some(url) = REVALIDATE_URL.clone() else {
        tracing::debug!("REVALIDATE_URL not set, skipping revalidation of {:?}", paths);
        return;
    };
    let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();

    tokio::spawn(async move {
        if let Err(e) = send_revalidation(&url, &REVALIDATE_SECRET, &paths).await {
            tracing::warn!("Cache revalidation for {:?} failed: {}", paths, e);
        }
    });
}

pub(crate) async fn send_revalidation(
    url: &str,
    secret: &str,
    paths: &[String],
) -> Result<(), RevalidateError> {
    let response = CLIENT
        .post(url)
        .header(REVALIDATE_SECRET_HEADER, secret)
        .json(&json!({ "paths": paths }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(RevalidateError::Status(response.status()));
    }

    tracing::debug!("Revalidated {:?}", paths);
    Ok(())
}
