//! The authoritative identity source consulted on cache misses

use crate::error::Result;
use crate::types::UserInfo;
use async_trait::async_trait;
use std::sync::Arc;

/// Slow, authoritative lookups (a user database in production).
///
/// `Ok(None)` means the key is unknown; `Err` means the lookup itself failed
/// and nothing should be concluded about the key.
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Find the user owning an API key
    async fn user_by_key(&self, api_key: &str) -> Result<Option<UserInfo>>;

    /// Find the user a chat server ID is registered to
    async fn user_by_server(&self, server_id: &str) -> Result<Option<UserInfo>>;
}

#[async_trait]
impl<T: UserSource + ?Sized> UserSource for Arc<T> {
    async fn user_by_key(&self, api_key: &str) -> Result<Option<UserInfo>> {
        (**self).user_by_key(api_key).await
    }

    async fn user_by_server(&self, server_id: &str) -> Result<Option<UserInfo>> {
        (**self).user_by_server(server_id).await
    }
}
