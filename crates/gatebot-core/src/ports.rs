use std::time::Duration;

use async_trait::async_trait;

use crate::{domain::UserId, Result};

/// Invite policy: one approval yields exactly one admission opportunity.
/// These are process constants, not caller parameters.
pub const INVITE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const INVITE_MEMBER_LIMIT: u32 = 1;

/// Closed classification of invite-issuer failures.
///
/// Produced at the adapter boundary so handlers never inspect raw upstream
/// payloads. The deciding admin gets a kind-specific diagnostic; the
/// applicant never sees any of this.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InviteError {
    #[error("bot lacks admin rights to create invite links")]
    MissingPrivilege,

    #[error("group chat not found")]
    GroupNotFound,

    #[error("invite issuer error: {0}")]
    Upstream(String),
}

/// Membership Oracle: "is this user currently in the group?"
///
/// "Unknown to the group" and "explicitly not a member" are `Ok(false)`, not
/// errors; only transport failures surface as `Err`. Callers fail safe by
/// treating an error as `false` and logging it.
#[async_trait]
pub trait MembershipPort: Send + Sync {
    async fn is_member(&self, user_id: UserId) -> Result<bool>;
}

/// Invite Issuer: mint a scoped, expiring, single-use join credential.
///
/// Implementations apply [`INVITE_TTL`] and [`INVITE_MEMBER_LIMIT`].
#[async_trait]
pub trait InvitePort: Send + Sync {
    async fn create_join_invite(&self) -> std::result::Result<String, InviteError>;
}
