//! Message templates (Telegram HTML) for applicant- and admin-facing notices.

use crate::domain::{Application, ApplicationStatus};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn applicant_fields(app: &Application) -> String {
    let username = match &app.username {
        Some(u) => format!("@{}", escape_html(u)),
        None => "not set".to_string(),
    };
    format!(
        "<b>Name:</b> {}\n<b>Username:</b> {}\n<b>ID:</b> {}",
        escape_html(&app.display_name()),
        username,
        app.user_id.0
    )
}

/// Fresh-application notice sent to every admin, paired with the
/// Approve/Reject keyboard.
pub fn admin_notification_html(app: &Application) -> String {
    format!(
        "🔔 <b>New group join application</b>\n\n{}\n\nPlease review this application:",
        applicant_fields(app)
    )
}

/// Final text an admin copy is edited to once the application is resolved.
/// `admin_label` is the deciding admin's display name.
pub fn admin_resolution_html(app: &Application, admin_label: &str) -> String {
    let verdict = match app.status {
        ApplicationStatus::Approved => "Approved ✅",
        ApplicationStatus::Rejected => "Rejected ❌",
        ApplicationStatus::Pending => "Pending",
    };
    let when = app
        .processed_at
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default();

    format!(
        "🔔 <b>Group join application</b>\n\n{}\n\n<b>Decision:</b> {}\n<b>Processed by:</b> {}\n<b>Date:</b> {}",
        applicant_fields(app),
        verdict,
        escape_html(admin_label),
        when
    )
}

pub fn applicant_approved_html(invite_link: &str) -> String {
    format!(
        "✅ <b>Your application to join the group has been approved!</b>\n\n\
         Use the link below to enter the group:\n{}\n\n\
         <i>Note: the link is valid for 24 hours and can be used only once.</i>",
        escape_html(invite_link)
    )
}

pub fn applicant_rejected_html() -> String {
    "❌ Unfortunately, your application to join the group was rejected.".to_string()
}

pub fn applicant_submitted_html() -> String {
    "✅ Thank you! Your application to join the group has been submitted.\n\n\
     The administrators will review it shortly and you will be notified of the decision."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Applicant, UserId};
    use chrono::Utc;

    fn app(username: Option<&str>) -> Application {
        Application::new_pending(
            &Applicant {
                user_id: UserId(42),
                username: username.map(|s| s.to_string()),
                first_name: "Ada".to_string(),
                last_name: "<L>".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(escape_html("<b>&\"x\""), "&lt;b&gt;&amp;&quot;x&quot;");
    }

    #[test]
    fn notification_escapes_names_and_falls_back_without_username() {
        let with = admin_notification_html(&app(Some("ada_l")));
        assert!(with.contains("@ada_l"));
        assert!(with.contains("&lt;L&gt;"));

        let without = admin_notification_html(&app(None));
        assert!(without.contains("<b>Username:</b> not set"));
        assert!(without.contains("<b>ID:</b> 42"));
    }

    #[test]
    fn resolution_shows_verdict_and_decider() {
        let mut a = app(None);
        a.status = ApplicationStatus::Approved;
        a.processed_at = Some(Utc::now());

        let html = admin_resolution_html(&a, "Grace");
        assert!(html.contains("Approved ✅"));
        assert!(html.contains("<b>Processed by:</b> Grace"));

        a.status = ApplicationStatus::Rejected;
        assert!(admin_resolution_html(&a, "Grace").contains("Rejected ❌"));
    }
}
