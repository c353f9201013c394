//! Group-side capabilities: membership lookup and invite issuance.

use async_trait::async_trait;

use chrono::Utc;
use teloxide::{prelude::*, types::ChatMemberKind, ApiError, RequestError};
use tracing::info;

use gatebot_core::{
    domain::UserId,
    errors::Error,
    ports::{InviteError, InvitePort, MembershipPort, INVITE_MEMBER_LIMIT, INVITE_TTL},
    Result,
};

#[derive(Clone)]
pub struct TelegramGroup {
    bot: Bot,
    group_chat_id: teloxide::types::ChatId,
}

impl TelegramGroup {
    pub fn new(bot: Bot, group_chat_id: i64) -> Self {
        Self {
            bot,
            group_chat_id: teloxide::types::ChatId(group_chat_id),
        }
    }
}

/// "The group has never heard of this user" answers, which are a `false`
/// membership verdict rather than a failure.
fn is_unknown_identity(e: &RequestError) -> bool {
    match e {
        RequestError::Api(ApiError::UserNotFound) => true,
        RequestError::Api(ApiError::ChatNotFound) => true,
        RequestError::Api(ApiError::Unknown(s)) => {
            let s = s.to_lowercase();
            s.contains("user not found")
                || s.contains("chat not found")
                || s.contains("user is not a member")
        }
        _ => false,
    }
}

/// Translate opaque invite-creation failures into the closed `InviteError`
/// classification before they reach the core.
fn classify_invite_error(e: RequestError) -> InviteError {
    match e {
        RequestError::Api(ApiError::ChatNotFound) => InviteError::GroupNotFound,
        RequestError::Api(ApiError::Unknown(s)) => {
            let lower = s.to_lowercase();
            if lower.contains("not enough rights") || lower.contains("administrator rights") {
                return InviteError::MissingPrivilege;
            }
            if lower.contains("chat not found") {
                return InviteError::GroupNotFound;
            }
            InviteError::Upstream(s)
        }
        other => InviteError::Upstream(format!("{other}")),
    }
}

#[async_trait]
impl MembershipPort for TelegramGroup {
    async fn is_member(&self, user_id: UserId) -> Result<bool> {
        let member = self
            .bot
            .get_chat_member(self.group_chat_id, teloxide::types::UserId(user_id.0 as u64))
            .await;

        match member {
            Ok(m) => {
                let present = matches!(
                    m.kind,
                    ChatMemberKind::Owner(_)
                        | ChatMemberKind::Administrator(_)
                        | ChatMemberKind::Member
                        | ChatMemberKind::Restricted(_)
                );
                Ok(present)
            }
            Err(e) if is_unknown_identity(&e) => Ok(false),
            Err(e) => Err(Error::Transport(format!("membership lookup failed: {e}"))),
        }
    }
}

#[async_trait]
impl InvitePort for TelegramGroup {
    async fn create_join_invite(&self) -> std::result::Result<String, InviteError> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(INVITE_TTL)
                .map_err(|e| InviteError::Upstream(format!("invalid invite ttl: {e}")))?;

        let link = self
            .bot
            .create_chat_invite_link(self.group_chat_id)
            .expire_date(expires_at)
            .member_limit(INVITE_MEMBER_LIMIT)
            .await
            .map_err(classify_invite_error)?;

        info!(expires_at = %expires_at, "single-use invite link created");
        Ok(link.invite_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_identity_answers_are_not_errors() {
        assert!(is_unknown_identity(&RequestError::Api(
            ApiError::UserNotFound
        )));
        assert!(is_unknown_identity(&RequestError::Api(ApiError::Unknown(
            "Bad Request: user not found".to_string()
        ))));
        assert!(!is_unknown_identity(&RequestError::Api(ApiError::Unknown(
            "Internal Server Error".to_string()
        ))));
    }

    #[test]
    fn invite_errors_classify_privilege_and_missing_group() {
        assert_eq!(
            classify_invite_error(RequestError::Api(ApiError::Unknown(
                "Bad Request: not enough rights to manage chat invite links".to_string()
            ))),
            InviteError::MissingPrivilege
        );
        assert_eq!(
            classify_invite_error(RequestError::Api(ApiError::ChatNotFound)),
            InviteError::GroupNotFound
        );
        assert_eq!(
            classify_invite_error(RequestError::Api(ApiError::Unknown(
                "Bad Request: chat not found".to_string()
            ))),
            InviteError::GroupNotFound
        );
        assert!(matches!(
            classify_invite_error(RequestError::Api(ApiError::Unknown(
                "something else".to_string()
            ))),
            InviteError::Upstream(_)
        ));
    }
}
