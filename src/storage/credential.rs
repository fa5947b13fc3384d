//! Admin credential Redis operations.
//!
//! Redis key patterns:
//! - `admin:{identifier}` - credential record (JSON, no TTL)
//!
//! Records hold a password hash, not the password, but the JSON is still
//! wrapped in `Zeroizing` so the hash does not linger in freed memory.

use super::{CredentialStore, StoreError};
use crate::models::{unix_now, AdminCredential, Role};
use async_trait::async_trait;
use redis::AsyncCommands;
use zeroize::Zeroizing;

fn credential_key(identifier: &str) -> String {
    format!("admin:{}", identifier)
}

/// Get a credential by identifier.
pub async fn get_credential<C>(
    con: &mut C,
    identifier: &str,
) -> Result<Option<AdminCredential>, StoreError>
where
    C: AsyncCommands,
{
    let json: Option<String> = con.get(credential_key(identifier)).await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            let credential: AdminCredential = serde_json::from_str(&zeroizing_data)
                .map_err(|e| StoreError::Corrupt(format!("admin:{}: {}", identifier, e)))?;
            Ok(Some(credential))
        }
        None => Ok(None),
    }
}

/// Upsert an admin credential (permanent, no TTL).
///
/// Used for startup provisioning only; the request path never writes.
pub async fn upsert_admin<C>(
    con: &mut C,
    identifier: &str,
    secret_hash: &str,
    role: Role,
) -> Result<(), StoreError>
where
    C: AsyncCommands,
{
    let credential = AdminCredential {
        identifier: identifier.to_string(),
        secret_hash: secret_hash.to_string(),
        role,
        created_at: unix_now(),
    };

    let json = Zeroizing::new(
        serde_json::to_string(&credential)
            .map_err(|e| StoreError::Corrupt(format!("serialize credential: {}", e)))?,
    );

    con.set::<_, _, ()>(credential_key(identifier), json.as_str())
        .await?;

    Ok(())
}

/// Redis-backed [`CredentialStore`].
#[derive(Clone)]
pub struct RedisCredentialStore {
    client: redis::Client,
}

impl RedisCredentialStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AdminCredential>, StoreError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis connection error: {}", e)))?;

        get_credential(&mut con, identifier).await
    }
}
