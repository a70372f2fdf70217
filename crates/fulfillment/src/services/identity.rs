//! Caller identity.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use domain::User;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Per-call context: who is calling and how to abandon the call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<UserId>,
    pub cancellation: CancellationToken,
}

impl RequestContext {
    /// A context with no authenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            principal: Some(user_id.into()),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("no authenticated principal")]
    Unauthenticated,

    #[error("unknown user: {0}")]
    UnknownUser(UserId),
}

/// Resolves the caller of a request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self, ctx: &RequestContext) -> Result<User, IdentityError>;
}

/// Identity provider backed by a fixed user table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub async fn register(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn current_user(&self, ctx: &RequestContext) -> Result<User, IdentityError> {
        let principal = ctx.principal.as_ref().ok_or(IdentityError::Unauthenticated)?;
        self.users
            .read()
            .await
            .get(principal)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownUser(principal.clone()))
    }
}
