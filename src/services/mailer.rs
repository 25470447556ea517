//! Best-effort delivery of invitation emails through an HTTP mail relay.
//!
//! Emails are enqueued after the membership mutation is persisted and
//! delivered from a background task, so a relay failure can never be mistaken
//! for a workflow failure.

use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::MailerConfig;
use crate::dao::models::UserEntity;

/// Payload handed to the mail relay.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Queue handle used to enqueue emails without blocking the request path.
pub type MailerHandle = mpsc::UnboundedSender<OutboundEmail>;

/// Spawn the background delivery task and return its queue handle.
///
/// Without relay configuration the task drains the queue and drops every
/// email, so callers never need to care whether delivery is enabled.
pub fn spawn(config: Option<MailerConfig>) -> MailerHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundEmail>();

    tokio::spawn(async move {
        let Some(config) = config else {
            info!("mail relay not configured; invitation emails are disabled");
            while rx.recv().await.is_some() {}
            return;
        };

        let client = Client::new();
        while let Some(email) = rx.recv().await {
            deliver(&client, &config, email).await;
        }
    });

    tx
}

async fn deliver(client: &Client, config: &MailerConfig, email: OutboundEmail) {
    let payload = serde_json::json!({
        "from": config.sender,
        "to": email.to,
        "subject": email.subject,
        "html": email.html,
    });

    match client.post(&config.endpoint).json(&payload).send().await {
        Ok(response) if response.status().is_success() => {}
        Ok(response) => warn!(
            to = %email.to,
            status = %response.status(),
            "mail relay rejected invitation email"
        ),
        Err(err) => warn!(
            to = %email.to,
            error = %err,
            "failed to deliver invitation email"
        ),
    }
}

/// Render the invitation email for one invited user.
pub fn invitation_email(
    recipient: &UserEntity,
    team_name: &str,
    event_title: &str,
    invite_link: &str,
    message: Option<&str>,
) -> OutboundEmail {
    let personal_note = message
        .filter(|text| !text.trim().is_empty())
        .map(|text| format!("<blockquote>{text}</blockquote>"))
        .unwrap_or_default();

    let html = format!(
        "<p>Hi {name},</p>\
         <p>You have been invited to join the team <strong>{team_name}</strong> \
         for <strong>{event_title}</strong>.</p>\
         {personal_note}\
         <p><a href=\"{invite_link}\">View the invitation and respond</a></p>",
        name = recipient.name,
    );

    OutboundEmail {
        to: recipient.email.clone(),
        subject: format!("Team invitation: {team_name} ({event_title})"),
        html,
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn user() -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.edu".into(),
            verified: true,
            department: None,
            year_of_study: None,
        }
    }

    #[test]
    fn email_carries_invite_link_and_recipient() {
        let email = invitation_email(
            &user(),
            "Alpha",
            "Hack Night",
            "https://glubs.example/teams/invite/code",
            Some("join us!"),
        );
        assert_eq!(email.to, "asha@example.edu");
        assert!(email.html.contains("https://glubs.example/teams/invite/code"));
        assert!(email.html.contains("join us!"));
        assert!(email.subject.contains("Alpha"));
    }

    #[test]
    fn blank_message_is_omitted() {
        let email = invitation_email(&user(), "Alpha", "Hack Night", "link", Some("   "));
        assert!(!email.html.contains("<blockquote>"));
    }
}
