//! End-to-end: submission event JSON -> notification -> rendered email in the log mailer.

use chrono::{TimeZone, Utc};
use core_config::{DeploymentMode, MailConfig};
use form_notifications::{
    Channel, FileUrlConfig, FixedClock, FormSubmissionNotification, FormSubmitted,
    IntegrationSettings, LogProvider, MailDispatcher, Notifiable, NotificationContext,
    SubmissionFormatter, TemplateEngine, is_valid_email,
};
use serde_json::json;
use std::sync::Arc;

fn context(mode: DeploymentMode) -> NotificationContext {
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()));
    NotificationContext::new(
        MailConfig::new("Forms", "hello@example.com", mode),
        Arc::new(SubmissionFormatter::new(
            FileUrlConfig::new("https://files.example.com", "signing-key"),
            clock.clone(),
        )),
        clock,
    )
}

fn event() -> FormSubmitted {
    serde_json::from_value(json!({
        "form": {
            "id": "contact",
            "title": "Contact Us",
            "properties": [
                { "id": "name", "name": "Name", "type": "text" },
                { "id": "heading", "type": "nf-text", "content": "<h1>Hi</h1>" },
                { "id": "email", "name": "Email", "type": "email" },
                { "id": "ref", "name": "Internal ref", "type": "text", "hidden": true },
                { "id": "cv", "name": "CV", "type": "files" }
            ]
        },
        "data": {
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "ref": "campaign-7",
            "cv": ["cv.pdf"]
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_self_hosted_submission_is_delivered_to_log_mailer() {
    let log = LogProvider::recording();
    let dispatcher = MailDispatcher::new(TemplateEngine::new().unwrap())
        .with_mailer("log", Arc::new(log.clone()));

    let settings: IntegrationSettings = serde_json::from_value(json!({
        "notification_from_email": "forms@acme.test",
        "notification_reply_to": null
    }))
    .unwrap();
    let notification =
        FormSubmissionNotification::new(event(), settings, "log", context(DeploymentMode::SelfHosted));
    let owner = Notifiable::route(Channel::Mail, "owner@acme.test");

    dispatcher.send(&notification, &owner).await.unwrap();

    let sent = log.sent_emails().await;
    assert_eq!(sent.len(), 1);
    let email = &sent[0];

    assert_eq!(email.to_email, "owner@acme.test");
    assert_eq!(email.from.as_ref().unwrap().address, "forms@acme.test");
    assert_eq!(email.from.as_ref().unwrap().name, "Forms");
    assert_eq!(email.reply_to.as_deref(), Some("ada@example.com"));
    assert_eq!(email.subject, "New form submission for \"Contact Us\"");

    // hidden fields are shown to the owner, layout blocks are not
    assert!(email.text_body.contains("campaign-7"));
    assert!(!email.html_body.contains("<h1>Hi</h1>"));

    // files are linked with signed URLs
    assert!(email.html_body.contains(">cv.pdf</a>"));
    assert!(email.text_body.contains("https://files.example.com/forms/contact/submissions/files/cv.pdf?expires"));
    assert!(email.text_body.contains("signature="));
}

#[tokio::test]
async fn test_hosted_submission_uses_tagged_sender() {
    let log = LogProvider::recording();
    let dispatcher = MailDispatcher::new(TemplateEngine::new().unwrap())
        .with_mailer("log", Arc::new(log.clone()));

    let settings = IntegrationSettings {
        notification_from_email: Some("tenant@evil.test".to_string()),
        notification_reply_to: Some("support@acme.test".to_string()),
    };
    let notification =
        FormSubmissionNotification::new(event(), settings, "log", context(DeploymentMode::Hosted));

    dispatcher
        .send(&notification, &Notifiable::route(Channel::Mail, "owner@acme.test"))
        .await
        .unwrap();

    let sent = log.sent_emails().await;
    let from = &sent[0].from.as_ref().unwrap().address;
    let expected_tag = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap().timestamp();

    assert_eq!(from, &format!("hello+{}@example.com", expected_tag));
    assert!(is_valid_email(from));
    assert_eq!(sent[0].reply_to.as_deref(), Some("support@acme.test"));
}
