use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram user id (numeric). Admins are identified the same way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). For private chats this equals the user id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message (used to edit admin copies later).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Who is applying, as seen at submission time.
#[derive(Clone, Debug)]
pub struct Applicant {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// An admin's verdict on a pending application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// One membership application attempt.
///
/// Records are append-only history: a terminal record is never mutated again
/// and never deleted. `invite_link`, `processed_by` and `processed_at` are
/// only ever written together with the status transition out of `Pending`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Application {
    pub user_id: UserId,
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub invite_link: Option<String>,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new_pending(applicant: &Applicant, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: applicant.user_id,
            username: applicant.username.clone(),
            first_name: applicant.first_name.clone(),
            last_name: applicant.last_name.clone(),
            created_at,
            status: ApplicationStatus::Pending,
            invite_link: None,
            processed_by: None,
            processed_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    /// Display name for admin-facing notices ("First Last", username fallback).
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        match &self.username {
            Some(u) => format!("@{u}"),
            None => self.user_id.0.to_string(),
        }
    }
}
