use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    domain::{Applicant, Decision, UserId},
    store::{ApplicationStore, InsertOutcome, Resolution, ResolveOutcome},
    Result,
};

/// Owns the per-user application state machine.
///
/// This is the single state-transition point: handlers never mutate
/// application status through any other path. Both operations lean on the
/// store's conditional writes, so concurrent submissions and concurrent
/// admin decisions race at the store and exactly one side wins.
pub struct ApplicationLifecycle {
    store: Arc<dyn ApplicationStore>,
}

impl ApplicationLifecycle {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    pub async fn has_pending(&self, user_id: UserId) -> Result<bool> {
        Ok(self.store.find_pending(user_id).await?.is_some())
    }

    /// Create a pending application, or return the existing one unchanged.
    pub async fn submit(&self, applicant: Applicant) -> Result<InsertOutcome> {
        let outcome = self.store.insert_pending(&applicant, Utc::now()).await?;
        match &outcome {
            InsertOutcome::Created(_) => {
                info!(user_id = applicant.user_id.0, "application submitted");
            }
            InsertOutcome::AlreadyPending(_) => {
                info!(
                    user_id = applicant.user_id.0,
                    "duplicate submission absorbed, application already pending"
                );
            }
        }
        Ok(outcome)
    }

    /// Transition the pending application for `user_id` out of `Pending`.
    ///
    /// `NoMatchingPending` means "already resolved or never existed"; the
    /// caller answers the admin accordingly and must not retry. The invite
    /// link is only recorded for approvals.
    pub async fn resolve(
        &self,
        user_id: UserId,
        decision: Decision,
        admin_id: UserId,
        invite_link: Option<String>,
    ) -> Result<ResolveOutcome> {
        let resolution = Resolution {
            decision,
            processed_by: admin_id,
            processed_at: Utc::now(),
            invite_link,
        };

        let outcome = self.store.complete_pending(user_id, resolution).await?;
        match &outcome {
            ResolveOutcome::Updated(app) => {
                info!(
                    user_id = user_id.0,
                    admin_id = admin_id.0,
                    status = ?app.status,
                    "application resolved"
                );
            }
            ResolveOutcome::NoMatchingPending => {
                warn!(
                    user_id = user_id.0,
                    admin_id = admin_id.0,
                    "resolve found no pending application"
                );
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ApplicationStatus;
    use crate::store::JsonFileStore;

    fn lifecycle(prefix: &str) -> ApplicationLifecycle {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = std::process::id();
        let path = format!("/tmp/{prefix}-{pid}-{ts}.json");
        ApplicationLifecycle::new(Arc::new(JsonFileStore::open(path).unwrap()))
    }

    fn applicant(id: i64) -> Applicant {
        Applicant {
            user_id: UserId(id),
            username: None,
            first_name: "Ada".to_string(),
            last_name: "L".to_string(),
        }
    }

    #[tokio::test]
    async fn submit_twice_yields_one_pending() {
        let lc = lifecycle("gatebot-lc-submit");

        assert!(matches!(
            lc.submit(applicant(42)).await.unwrap(),
            InsertOutcome::Created(_)
        ));
        assert!(matches!(
            lc.submit(applicant(42)).await.unwrap(),
            InsertOutcome::AlreadyPending(_)
        ));
        assert!(lc.has_pending(UserId(42)).await.unwrap());
    }

    #[tokio::test]
    async fn approval_is_at_most_once() {
        let lc = lifecycle("gatebot-lc-once");
        lc.submit(applicant(42)).await.unwrap();

        let first = lc
            .resolve(
                UserId(42),
                Decision::Approve,
                UserId(7),
                Some("https://t.me/+abc".to_string()),
            )
            .await
            .unwrap();
        let ResolveOutcome::Updated(app) = first else {
            panic!("expected Updated");
        };
        assert_eq!(app.status, ApplicationStatus::Approved);
        assert_eq!(app.processed_by, Some(UserId(7)));
        assert_eq!(app.invite_link.as_deref(), Some("https://t.me/+abc"));
        assert!(app.processed_at.is_some());

        // Second admin loses the race.
        let second = lc
            .resolve(UserId(42), Decision::Reject, UserId(9), None)
            .await
            .unwrap();
        assert!(matches!(second, ResolveOutcome::NoMatchingPending));
        assert!(!lc.has_pending(UserId(42)).await.unwrap());
    }

    #[tokio::test]
    async fn resolve_without_submission_is_no_matching_pending() {
        let lc = lifecycle("gatebot-lc-missing");
        let out = lc
            .resolve(UserId(999), Decision::Approve, UserId(7), None)
            .await
            .unwrap();
        assert!(matches!(out, ResolveOutcome::NoMatchingPending));
    }
}
