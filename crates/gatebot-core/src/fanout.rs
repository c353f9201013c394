use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    domain::{Application, ChatId, Decision, MessageRef, UserId},
    formatting::{admin_notification_html, admin_resolution_html},
    messaging::{
        port::MessagingPort,
        types::{CallbackAction, InlineButton, InlineKeyboard},
    },
};

/// Sends each new application to every configured admin and later edits
/// those copies in place once the application resolves.
///
/// The index maps applicant -> (admin -> sent message). It is the only way
/// to find which message belongs to which admin for which applicant, so the
/// key must be the (applicant, admin) pair: one admin can have many pending
/// notices outstanding at once. The index is process-lifetime only; after a
/// restart, older pending notices simply stay stale.
pub struct NotificationFanout {
    admins: Vec<UserId>,
    messenger: Arc<dyn MessagingPort>,
    index: Mutex<HashMap<UserId, HashMap<UserId, MessageRef>>>,
}

impl NotificationFanout {
    pub fn new(admins: Vec<UserId>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            admins,
            messenger,
            index: Mutex::new(HashMap::new()),
        }
    }

    fn decision_keyboard(applicant: UserId) -> InlineKeyboard {
        InlineKeyboard::row(vec![
            InlineButton::new(
                "✅ Approve",
                CallbackAction::Decide {
                    decision: Decision::Approve,
                    applicant,
                },
            ),
            InlineButton::new(
                "❌ Reject",
                CallbackAction::Decide {
                    decision: Decision::Reject,
                    applicant,
                },
            ),
        ])
    }

    /// Notify every admin about a new application. A failure for one admin
    /// is logged and does not abort delivery to the rest. Returns how many
    /// copies were delivered and recorded.
    pub async fn broadcast_new_application(&self, app: &Application) -> usize {
        let html = admin_notification_html(app);
        let mut delivered = 0usize;

        for &admin in &self.admins {
            let sent = self
                .messenger
                .send_inline_keyboard(
                    ChatId(admin.0),
                    &html,
                    Self::decision_keyboard(app.user_id),
                )
                .await;

            match sent {
                Ok(msg) => {
                    let mut index = self.index.lock().await;
                    index.entry(app.user_id).or_default().insert(admin, msg);
                    delivered += 1;
                    info!(
                        admin_id = admin.0,
                        user_id = app.user_id.0,
                        "admin notified of new application"
                    );
                }
                Err(e) => {
                    warn!(
                        admin_id = admin.0,
                        user_id = app.user_id.0,
                        error = %e,
                        "failed to notify admin"
                    );
                }
            }
        }

        delivered
    }

    /// Edit every admin copy except the deciding admin's to show the final
    /// decision (the decider already saw the edit on the direct response
    /// path). Admins with no recorded handle keep a stale copy.
    pub async fn propagate_resolution(
        &self,
        app: &Application,
        deciding_admin: UserId,
        admin_label: &str,
    ) {
        let handles = {
            let index = self.index.lock().await;
            index.get(&app.user_id).cloned().unwrap_or_default()
        };

        let html = admin_resolution_html(app, admin_label);

        for &admin in &self.admins {
            if admin == deciding_admin {
                continue;
            }

            let Some(&msg) = handles.get(&admin) else {
                warn!(
                    admin_id = admin.0,
                    user_id = app.user_id.0,
                    "no message handle for admin, leaving copy stale"
                );
                continue;
            };

            if let Err(e) = self.messenger.edit_html(msg, &html).await {
                warn!(
                    admin_id = admin.0,
                    user_id = app.user_id.0,
                    error = %e,
                    "failed to update admin copy"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Applicant, ApplicationStatus};
    use crate::errors::Error;
    use crate::messaging::types::InlineKeyboard;
    use crate::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex as StdMutex;

    /// Records every port call; sends to chat ids listed in `fail_chats`
    /// fail with a transport error.
    #[derive(Default)]
    struct RecordingMessenger {
        fail_chats: Vec<i64>,
        sent: StdMutex<Vec<(i64, String)>>,
        edited: StdMutex<Vec<(MessageRef, String)>>,
        next_message_id: StdMutex<i32>,
    }

    impl RecordingMessenger {
        fn failing(fail_chats: Vec<i64>) -> Self {
            Self {
                fail_chats,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
            self.send_inline_keyboard(chat_id, html, InlineKeyboard { rows: vec![] })
                .await
        }

        async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
            self.edited.lock().unwrap().push((msg, html.to_string()));
            Ok(())
        }

        async fn send_inline_keyboard(
            &self,
            chat_id: ChatId,
            html: &str,
            _keyboard: InlineKeyboard,
        ) -> Result<MessageRef> {
            if self.fail_chats.contains(&chat_id.0) {
                return Err(Error::Transport("telegram error: forbidden".to_string()));
            }
            self.sent.lock().unwrap().push((chat_id.0, html.to_string()));
            let mut next = self.next_message_id.lock().unwrap();
            *next += 1;
            Ok(MessageRef {
                chat_id,
                message_id: crate::domain::MessageId(*next),
            })
        }

        async fn answer_callback_query(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
            Ok(())
        }
    }

    fn application(user_id: i64) -> Application {
        Application::new_pending(
            &Applicant {
                user_id: UserId(user_id),
                username: Some("ada".to_string()),
                first_name: "Ada".to_string(),
                last_name: String::new(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn one_failing_admin_does_not_abort_the_rest() {
        let messenger = Arc::new(RecordingMessenger::failing(vec![8]));
        let fanout = NotificationFanout::new(
            vec![UserId(7), UserId(8), UserId(9)],
            messenger.clone(),
        );

        let delivered = fanout.broadcast_new_application(&application(42)).await;
        assert_eq!(delivered, 2);

        let sent = messenger.sent.lock().unwrap();
        let chats: Vec<i64> = sent.iter().map(|(c, _)| *c).collect();
        assert_eq!(chats, vec![7, 9]);

        // Only the successful sends got handles recorded.
        let index = fanout.index.lock().await;
        assert_eq!(index.get(&UserId(42)).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn propagate_skips_the_deciding_admin() {
        let messenger = Arc::new(RecordingMessenger::default());
        let fanout =
            NotificationFanout::new(vec![UserId(7), UserId(9)], messenger.clone());

        let mut app = application(42);
        fanout.broadcast_new_application(&app).await;

        app.status = ApplicationStatus::Approved;
        app.processed_by = Some(UserId(7));
        app.processed_at = Some(Utc::now());
        fanout.propagate_resolution(&app, UserId(7), "Grace").await;

        let edited = messenger.edited.lock().unwrap();
        assert_eq!(edited.len(), 1);
        assert_eq!(edited[0].0.chat_id.0, 9);
        assert!(edited[0].1.contains("Approved"));
        assert!(edited[0].1.contains("Grace"));
    }

    #[tokio::test]
    async fn propagate_without_handles_edits_nothing() {
        let messenger = Arc::new(RecordingMessenger::default());
        let fanout =
            NotificationFanout::new(vec![UserId(7), UserId(9)], messenger.clone());

        // No broadcast happened (e.g. process restarted mid-flight).
        let mut app = application(42);
        app.status = ApplicationStatus::Rejected;
        fanout.propagate_resolution(&app, UserId(7), "Grace").await;

        assert!(messenger.edited.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handles_are_keyed_per_applicant_and_admin() {
        let messenger = Arc::new(RecordingMessenger::default());
        let fanout =
            NotificationFanout::new(vec![UserId(7), UserId(9)], messenger.clone());

        let mut first = application(42);
        let second = application(43);
        fanout.broadcast_new_application(&first).await;
        fanout.broadcast_new_application(&second).await;

        // Resolving the first applicant must not touch the second's copies.
        first.status = ApplicationStatus::Approved;
        first.processed_at = Some(Utc::now());
        fanout.propagate_resolution(&first, UserId(9), "Grace").await;

        let edited = messenger.edited.lock().unwrap();
        assert_eq!(edited.len(), 1);
        assert_eq!(edited[0].0.chat_id.0, 7);

        let index = fanout.index.lock().await;
        assert_eq!(index.get(&UserId(43)).unwrap().len(), 2);
    }
}
