use std::sync::Arc;

use teloxide::{prelude::*, types::User};
use tracing::{error, warn};

use gatebot_core::{
    domain::{Applicant, Application, ChatId, Decision, MessageId, MessageRef, UserId},
    formatting::{
        admin_resolution_html, applicant_approved_html, applicant_rejected_html,
        applicant_submitted_html,
    },
    messaging::types::CallbackAction,
    ports::InviteError,
    store::{InsertOutcome, ResolveOutcome},
};

use crate::router::AppState;

pub async fn handle_callback(
    _bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let data = q.data.clone().unwrap_or_default();

    let Some(action) = CallbackAction::parse(&data) else {
        // Always answer the query so the client stops its spinner.
        let _ = state.messenger.answer_callback_query(&cb_id, None).await;
        return Ok(());
    };

    // The deciding admin's own copy of the notice, edited on the direct
    // response path.
    let own_message = q.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat.id.0),
        message_id: MessageId(m.id.0),
    });

    let result = match action {
        CallbackAction::Apply => handle_apply(&cb_id, &q.from, &state).await,
        CallbackAction::Decide {
            decision,
            applicant,
        } => handle_decision(&cb_id, &q.from, decision, applicant, own_message, &state).await,
    };

    if let Err(e) = result {
        error!(user_id = q.from.id.0, data = %data, error = %e, "callback handler failed");
        let _ = state
            .messenger
            .answer_callback_query(&cb_id, Some("Something went wrong. Please try again later."))
            .await;
    }

    Ok(())
}

async fn handle_apply(cb_id: &str, from: &User, state: &AppState) -> gatebot_core::Result<()> {
    let chat = ChatId(from.id.0 as i64);
    let applicant = Applicant {
        user_id: UserId(from.id.0 as i64),
        username: from.username.clone(),
        first_name: from.first_name.clone(),
        last_name: from.last_name.clone().unwrap_or_default(),
    };

    match state.lifecycle.submit(applicant).await? {
        InsertOutcome::AlreadyPending(_) => {
            state
                .messenger
                .answer_callback_query(cb_id, Some("You already have a pending application"))
                .await?;
            state
                .messenger
                .send_html(
                    chat,
                    "You already have an active join application. \
                     Please wait for the administrators to review it.",
                )
                .await?;
        }
        InsertOutcome::Created(app) => {
            let delivered = state.fanout.broadcast_new_application(&app).await;
            if delivered == 0 {
                warn!(
                    user_id = app.user_id.0,
                    "application created but no admin could be notified"
                );
            }

            state
                .messenger
                .answer_callback_query(cb_id, Some("Your application has been submitted!"))
                .await?;
            state
                .messenger
                .send_html(chat, &applicant_submitted_html())
                .await?;
        }
    }

    Ok(())
}

async fn handle_decision(
    cb_id: &str,
    from: &User,
    decision: Decision,
    applicant: UserId,
    own_message: Option<MessageRef>,
    state: &AppState,
) -> gatebot_core::Result<()> {
    let admin_id = UserId(from.id.0 as i64);
    if !state.cfg.is_admin(admin_id.0) {
        state
            .messenger
            .answer_callback_query(cb_id, Some("You are not allowed to do that"))
            .await?;
        return Ok(());
    }

    let admin_label = admin_display_name(from);

    let invite_link = match decision {
        Decision::Approve => {
            // Mint the link before the transition so an approved record never
            // lacks one. If the transition below loses the race, the unused
            // link just expires.
            match state.invites.create_join_invite().await {
                Ok(link) => Some(link),
                Err(e) => {
                    state
                        .messenger
                        .answer_callback_query(cb_id, Some("Failed to create an invite link"))
                        .await?;
                    state
                        .messenger
                        .send_html(ChatId(admin_id.0), &invite_failure_html(&e))
                        .await?;
                    return Ok(());
                }
            }
        }
        Decision::Reject => None,
    };

    let outcome = state
        .lifecycle
        .resolve(applicant, decision, admin_id, invite_link.clone())
        .await?;

    let app = match outcome {
        ResolveOutcome::NoMatchingPending => {
            if invite_link.is_some() {
                warn!(
                    user_id = applicant.0,
                    admin_id = admin_id.0,
                    "application was resolved concurrently, abandoning unused invite link"
                );
            }
            state
                .messenger
                .answer_callback_query(
                    cb_id,
                    Some("This application is no longer pending, another admin already handled it"),
                )
                .await?;
            return Ok(());
        }
        ResolveOutcome::Updated(app) => app,
    };

    notify_applicant(state, &app).await;

    let confirmation = match decision {
        Decision::Approve => "Application approved. The user received the invite link.",
        Decision::Reject => "Application rejected. The user has been notified.",
    };
    state
        .messenger
        .answer_callback_query(cb_id, Some(confirmation))
        .await?;

    // Edit the deciding admin's own copy, then the other admins' copies.
    let resolution_html = admin_resolution_html(&app, &admin_label);
    if let Some(own) = own_message {
        if let Err(e) = state.messenger.edit_html(own, &resolution_html).await {
            warn!(admin_id = admin_id.0, error = %e, "failed to edit deciding admin's copy");
        }
    }
    state
        .fanout
        .propagate_resolution(&app, admin_id, &admin_label)
        .await;

    Ok(())
}

/// Tell the applicant the outcome. Best-effort: a delivery failure is logged
/// but does not unwind the resolution, which is already committed.
async fn notify_applicant(state: &AppState, app: &Application) {
    let html = match app.invite_link.as_deref() {
        Some(link) => applicant_approved_html(link),
        None => applicant_rejected_html(),
    };

    if let Err(e) = state
        .messenger
        .send_html(ChatId(app.user_id.0), &html)
        .await
    {
        error!(
            user_id = app.user_id.0,
            error = %e,
            "failed to notify applicant of the decision"
        );
    }
}

/// Admin-facing diagnostics: specific enough to self-diagnose, never shown
/// to the applicant.
fn invite_failure_html(e: &InviteError) -> String {
    match e {
        InviteError::MissingPrivilege => {
            "Could not create an invite link: the bot needs to be an administrator \
             of the group with the right to invite users via link."
                .to_string()
        }
        InviteError::GroupNotFound => {
            "Could not create an invite link: the configured group was not found. \
             Check the GROUP_CHAT_ID setting."
                .to_string()
        }
        InviteError::Upstream(detail) => {
            format!(
                "Could not create an invite link: {}",
                gatebot_core::formatting::escape_html(detail)
            )
        }
    }
}

fn admin_display_name(user: &User) -> String {
    let last = user.last_name.clone().unwrap_or_default();
    format!("{} {}", user.first_name, last).trim().to_string()
}
