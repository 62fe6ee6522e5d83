//! Elevated identity lookup
//!
//! Requests flagged with `use_elevated_identity` are sent with an `MSCRMCallerID`
//! header. The id comes from a [`CallerIdentity`] injected into the client.

use super::error::SdkError;
use async_trait::async_trait;

/// Supplies the systemuserid to impersonate for elevated requests
#[async_trait]
pub trait CallerIdentity: Send + Sync {
    async fn caller_id(&self) -> Result<String, SdkError>;
}

/// A fixed caller id, usually read from configuration
#[derive(Debug, Clone)]
pub struct StaticCallerId(String);

impl StaticCallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(super::constants::normalize_id(&id.into()))
    }
}

#[async_trait]
impl CallerIdentity for StaticCallerId {
    async fn caller_id(&self) -> Result<String, SdkError> {
        Ok(self.0.clone())
    }
}

/// Used when no elevated identity is configured; elevated requests fail fast
#[derive(Debug, Clone, Default)]
pub struct NoCallerIdentity;

#[async_trait]
impl CallerIdentity for NoCallerIdentity {
    async fn caller_id(&self) -> Result<String, SdkError> {
        Err(SdkError::invalid_argument(
            "elevated identity requested but no caller id is configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_caller_id_strips_braces() {
        let identity = StaticCallerId::new("{11111111-2222-3333-4444-555555555555}");
        assert_eq!(
            identity.caller_id().await.unwrap(),
            "11111111-2222-3333-4444-555555555555"
        );
    }

    #[tokio::test]
    async fn test_missing_identity_is_invalid_argument() {
        let err = NoCallerIdentity.caller_id().await.unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
