//! Fixed-identity user resolver

use async_trait::async_trait;

use crate::ports::CurrentUser;

/// Resolves to the same user for its whole lifetime.
///
/// Used by the CLI, where the identity comes from config or `QUILL_USER`,
/// and by tests. A blank id means nobody is signed in.
#[derive(Debug, Clone, Default)]
pub struct StaticUser {
    id: Option<String>,
}

impl StaticUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_option(Some(id.into()))
    }

    pub fn from_option(id: Option<String>) -> Self {
        let id = id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self { id }
    }

    pub fn anonymous() -> Self {
        Self { id: None }
    }
}

#[async_trait]
impl CurrentUser for StaticUser {
    async fn user_id(&self) -> Option<String> {
        self.id.clone()
    }
}
