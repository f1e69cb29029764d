//! Bans, exchange rates and passkey management for the admin panel

use chrono::Utc;

use crate::catalog::{Ban, CatalogStore, ExchangeRate, ExchangeTable, NewBan};
use crate::passkey::{AdminCredential, CredentialStore};
use crate::revalidate::{WISHLIST_PATHS, revalidate_paths};
use crate::session::SessionStore;

use super::errors::CoordinationError;

#[tracing::instrument(skip(ban), fields(reason = ban.reason.as_str()))]
pub async fn create_ban(ban: NewBan) -> Result<Ban, CoordinationError> {
    let ban = CatalogStore::insert_ban(&ban, Utc::now()).await?;
    tracing::info!(ban_id = ban.id, "Ban created");
    Ok(ban)
}

pub async fn list_bans() -> Result<Vec<Ban>, CoordinationError> {
    Ok(CatalogStore::list_bans().await?)
}

#[tracing::instrument]
pub async fn delete_ban(id: i64) -> Result<(), CoordinationError> {
    if !CatalogStore::delete_ban(id).await? {
        return Err(CoordinationError::NotFound("Ban not found".to_string()).log());
    }
    tracing::info!(ban_id = id, "Ban lifted");
    Ok(())
}

/// Compiled-in rates overlaid with the stored overrides
pub async fn exchange_table() -> Result<ExchangeTable, CoordinationError> {
    let overrides = CatalogStore::list_exchange_rates().await?;
    Ok(ExchangeTable::with_overrides(&overrides))
}

#[tracing::instrument]
pub async fn set_exchange_rate(rate: ExchangeRate) -> Result<ExchangeRate, CoordinationError> {
    CatalogStore::upsert_exchange_rate(&rate).await?;
    tracing::info!(
        "Exchange rate {}->{} set to {}",
        rate.from_currency,
        rate.to_currency,
        rate.rate
    );
    revalidate_paths(WISHLIST_PATHS);
    Ok(rate)
}

pub async fn list_credentials() -> Result<Vec<AdminCredential>, CoordinationError> {
    Ok(CredentialStore::list_credentials().await?)
}

/// Removes a passkey and every session opened with it. The last passkey cannot be removed.
#[tracing::instrument]
pub async fn delete_credential(id: &str) -> Result<(), CoordinationError> {
    if CredentialStore::get_credential(id).await?.is_none() {
        return Err(CoordinationError::NotFound("Passkey not found".to_string()).log());
    }
    if CredentialStore::count_credentials().await? <= 1 {
        return Err(
            CoordinationError::BadRequest("Cannot delete the last passkey".to_string()).log(),
        );
    }

    CredentialStore::delete_credential(id).await?;
    let revoked = SessionStore::delete_sessions_by_credential(id).await?;
    tracing::info!(revoked, "Passkey deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BanReason;
    use crate::passkey::test_utils::register_fake_authenticator;
    use crate::session::create_session;
    use crate::test_utils::init_test_environment;

    #[tokio::test]
    async fn test_ban_lifecycle() {
        init_test_environment().await;
        let ban = create_ban(NewBan {
            visitor_id: None,
            ip: Some("203.0.113.99".to_string()),
            reason: BanReason::Spam,
            expires_at: None,
        })
        .await
        .unwrap();

        assert!(list_bans().await.unwrap().iter().any(|b| b.id == ban.id));
        delete_ban(ban.id).await.unwrap();
        assert!(matches!(
            delete_ban(ban.id).await,
            Err(CoordinationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_exchange_rate_override_is_applied() {
        init_test_environment().await;
        set_exchange_rate(ExchangeRate {
            from_currency: "GBP".to_string(),
            to_currency: "EUR".to_string(),
            rate: 1.17,
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

        let table = exchange_table().await.unwrap();
        assert_eq!(
            table.rate(crate::catalog::Currency::Gbp, crate::catalog::Currency::Eur),
            Some(1.17)
        );
    }

    #[tokio::test]
    async fn test_delete_credential_revokes_its_sessions() {
        init_test_environment().await;
        // Two credentials so neither is the last one
        let keep = register_fake_authenticator().await;
        let remove = register_fake_authenticator().await;

        let (session, _) = create_session(&remove.credential_id(), None).await.unwrap();
        delete_credential(&remove.credential_id()).await.unwrap();

        assert!(SessionStore::get_session(&session.id).await.unwrap().is_none());
        assert!(
            CredentialStore::get_credential(&keep.credential_id())
                .await
                .unwrap()
                .is_some()
        );
        assert!(matches!(
            delete_credential(&remove.credential_id()).await,
            Err(CoordinationError::NotFound(_))
        ));
    }
}
