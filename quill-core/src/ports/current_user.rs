//! Current-user port - who the caller is

use async_trait::async_trait;

/// Resolves the authenticated identity for the current request.
///
/// Implementations must return the same answer for every call made while
/// serving one request. `None` means nobody is signed in.
#[async_trait]
pub trait CurrentUser: Send + Sync {
    async fn user_id(&self) -> Option<String>;
}
