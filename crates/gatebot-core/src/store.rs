use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    domain::{Applicant, Application, ApplicationStatus, Decision, UserId},
    errors::Error,
    Result,
};

/// Outcome of an insert attempt.
#[derive(Clone, Debug)]
pub enum InsertOutcome {
    Created(Application),
    AlreadyPending(Application),
}

/// Outcome of a conditional transition scoped to `{user_id, status=Pending}`.
#[derive(Clone, Debug)]
pub enum ResolveOutcome {
    Updated(Application),
    NoMatchingPending,
}

/// The composite terminal state applied in one step.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub decision: Decision,
    pub processed_by: UserId,
    pub processed_at: DateTime<Utc>,
    pub invite_link: Option<String>,
}

/// Durable application records keyed by user + status.
///
/// Both write operations are conditional read-modify-writes: `insert_pending`
/// refuses to create a second pending record for a user, `complete_pending`
/// only transitions a record it finds in `Pending`. Implementations must make
/// each of them atomic so concurrent submissions / decisions race safely.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn find_pending(&self, user_id: UserId) -> Result<Option<Application>>;

    async fn insert_pending(
        &self,
        applicant: &Applicant,
        created_at: DateTime<Utc>,
    ) -> Result<InsertOutcome>;

    async fn complete_pending(
        &self,
        user_id: UserId,
        resolution: Resolution,
    ) -> Result<ResolveOutcome>;
}

/// Flat-file store: the full record list lives in memory and is rewritten to
/// a JSON file on every mutation. All operations run under one lock, which
/// is what makes the conditional writes atomic. Records are never deleted;
/// terminal ones accumulate as the audit trail.
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<Vec<Application>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<Vec<Application>>(&contents)
                .map_err(|e| Error::Store(format!("corrupt store file {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn persist(&self, records: &[Application]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for JsonFileStore {
    async fn find_pending(&self, user_id: UserId) -> Result<Option<Application>> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .find(|a| a.user_id == user_id && a.is_pending())
            .cloned())
    }

    async fn insert_pending(
        &self,
        applicant: &Applicant,
        created_at: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        let mut records = self.records.lock().await;

        if let Some(existing) = records
            .iter()
            .find(|a| a.user_id == applicant.user_id && a.is_pending())
        {
            return Ok(InsertOutcome::AlreadyPending(existing.clone()));
        }

        let application = Application::new_pending(applicant, created_at);
        records.push(application.clone());
        self.persist(&records)?;
        Ok(InsertOutcome::Created(application))
    }

    async fn complete_pending(
        &self,
        user_id: UserId,
        resolution: Resolution,
    ) -> Result<ResolveOutcome> {
        let mut records = self.records.lock().await;

        let Some(record) = records
            .iter_mut()
            .find(|a| a.user_id == user_id && a.is_pending())
        else {
            return Ok(ResolveOutcome::NoMatchingPending);
        };

        record.status = match resolution.decision {
            Decision::Approve => ApplicationStatus::Approved,
            Decision::Reject => ApplicationStatus::Rejected,
        };
        record.processed_by = Some(resolution.processed_by);
        record.processed_at = Some(resolution.processed_at);
        record.invite_link = match resolution.decision {
            Decision::Approve => resolution.invite_link,
            Decision::Reject => None,
        };

        let updated = record.clone();
        self.persist(&records)?;
        Ok(ResolveOutcome::Updated(updated))
    }
}
