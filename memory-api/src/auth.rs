//! Authentication is an external collaborator per the configured default — API-key
//! issuance and JWT verification live outside this crate. What lives
//! here is the seam: an [`Authenticator`] trait the REST and JSON-RPC
//! surfaces call with whatever credential the request carried, plus a
//! trivial implementation for tests and single-tenant/local use.

use async_trait::async_trait;

use memory_core::{UserId, SYSTEM_USER_ID};

use crate::error::ApiError;

/// The credential a request carried, extracted from either the
/// `X-API-Key` header or an `Authorization: Bearer <jwt>` header.
#[derive(Clone, Debug)]
pub enum Credential {
    ApiKey(String),
    Bearer(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: &Credential) -> Result<UserId, ApiError>;
}

/// Resolves every credential to [`SYSTEM_USER_ID`] — the single-tenant
/// / local invocation path . Never accepts no credential at
/// all; a missing header is an `Authentication` error produced by the
/// caller before this trait is even consulted.
pub struct LocalAuthenticator;

#[async_trait]
impl Authenticator for LocalAuthenticator {
    async fn authenticate(&self, _credential: &Credential) -> Result<UserId, ApiError> {
        Ok(SYSTEM_USER_ID)
    }
}

/// Fixed table of `key -> user_id`, for tests and for operators who want
/// static API keys without standing up the full key-issuance service.
/// I7: `SYSTEM_USER_ID` is never a valid mapping target here — the
/// reserved identity cannot be reached via the multi-tenant surface.
pub struct StaticApiKeyAuthenticator {
    keys: std::collections::HashMap<String, UserId>,
}

impl StaticApiKeyAuthenticator {
    pub fn new(keys: std::collections::HashMap<String, UserId>) -> Self {
        let keys = keys.into_iter().filter(|(_, uid)| *uid != SYSTEM_USER_ID).collect();
        Self { keys }
    }
}

#[async_trait]
impl Authenticator for StaticApiKeyAuthenticator {
    async fn authenticate(&self, credential: &Credential) -> Result<UserId, ApiError> {
        let key = match credential {
            Credential::ApiKey(k) => k,
            Credential::Bearer(_) => {
                return Err(ApiError::Authentication("bearer tokens require a JWT verifier".into()))
            }
        };
        self.keys
            .get(key)
            .copied()
            .ok_or_else(|| ApiError::Authentication("unknown API key".to_string()))
    }
}
