use super::error::ServiceError;
use super::{notify, validate};
use crate::models::{
    CommentRequest, ContactMessage, ContactRequest, ContactStatus, ContactStatusRequest,
    ContactSubmission, InboundEmail, MessageDirection,
};
use crate::FinanceApp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct ContactDetail {
    pub submission: ContactSubmission,
    pub messages: Vec<ContactMessage>,
}

fn load(app: &FinanceApp, id: Uuid) -> Result<ContactSubmission, ServiceError> {
    app.store
        .get_contact(id)?
        .ok_or_else(|| ServiceError::not_found("Contact submission"))
}

fn thread_subject(submission: &ContactSubmission) -> String {
    format!(
        "Re: {} [#{}]",
        submission.subject.as_deref().unwrap_or("Your message"),
        submission.thread_token
    )
}

/// Public contact form. The first message opens the conversation thread.
pub fn submit(app: &FinanceApp, req: ContactRequest) -> Result<ContactSubmission, ServiceError> {
    let name = validate::text("Name", &req.name, 1, 100)?;
    let email = validate::email(&req.email)?;
    let subject = validate::optional_text("Subject", req.subject.as_deref(), 200)?;
    let message = validate::text("Message", &req.message, 10, 5000)?;

    let now = app.clock.now();
    let submission = ContactSubmission {
        id: Uuid::new_v4(),
        name,
        email,
        subject,
        message,
        status: ContactStatus::New,
        thread_token: Uuid::new_v4().simple().to_string(),
        created_at: now,
        updated_at: now,
    };
    app.store.save_contact(&submission)?;
    app.store.save_contact_message(&ContactMessage {
        id: Uuid::new_v4(),
        submission_id: submission.id,
        direction: MessageDirection::Inbound,
        sender: submission.email.clone(),
        body: submission.message.clone(),
        created_at: now,
    })?;

    notify(
        app,
        &app.config.support_email,
        format!("New contact message from {}", submission.name),
        format!(
            "From: {} <{}>\nThread: {}\n\n{}",
            submission.name, submission.email, submission.thread_token, submission.message
        ),
    );
    tracing::info!(submission_id = %submission.id, "contact form submitted");
    Ok(submission)
}

pub fn list(app: &FinanceApp, status: Option<ContactStatus>) -> Result<Vec<ContactSubmission>, ServiceError> {
    Ok(app.store.list_contacts(status)?)
}

pub fn get(app: &FinanceApp, id: Uuid) -> Result<ContactDetail, ServiceError> {
    let submission = load(app, id)?;
    Ok(ContactDetail {
        messages: app.store.list_contact_messages(submission.id)?,
        submission,
    })
}

pub fn reply(app: &FinanceApp, id: Uuid, req: CommentRequest) -> Result<ContactDetail, ServiceError> {
    let mut submission = load(app, id)?;
    let body = validate::text("Reply", &req.body, 1, 10000)?;
    let now = app.clock.now();

    app.store.save_contact_message(&ContactMessage {
        id: Uuid::new_v4(),
        submission_id: submission.id,
        direction: MessageDirection::Outbound,
        sender: app.config.support_email.clone(),
        body: body.clone(),
        created_at: now,
    })?;
    submission.status = ContactStatus::Replied;
    submission.updated_at = now;
    app.store.save_contact(&submission)?;

    notify(app, &submission.email, thread_subject(&submission), body);
    get(app, id)
}

pub fn set_status(
    app: &FinanceApp,
    id: Uuid,
    req: ContactStatusRequest,
) -> Result<ContactSubmission, ServiceError> {
    let mut submission = load(app, id)?;
    submission.status = req.status;
    submission.updated_at = app.clock.now();
    app.store.save_contact(&submission)?;
    Ok(submission)
}

/// A reply from the submitter, forwarded by the email provider. Reopens the thread.
pub fn receive_email(app: &FinanceApp, email: InboundEmail) -> Result<ContactMessage, ServiceError> {
    let mut submission = app
        .store
        .find_contact_by_thread(email.thread_token.trim())?
        .ok_or_else(|| ServiceError::NotFound("Conversation not found".to_string()))?;
    let now = app.clock.now();
    let message = ContactMessage {
        id: Uuid::new_v4(),
        submission_id: submission.id,
        direction: MessageDirection::Inbound,
        sender: email.from.trim().to_string(),
        body: validate::text("Body", &email.body, 1, 20000)?,
        created_at: now,
    };
    app.store.save_contact_message(&message)?;
    submission.status = ContactStatus::New;
    submission.updated_at = now;
    app.store.save_contact(&submission)?;

    tracing::info!(submission_id = %submission.id, "inbound email appended to thread");
    Ok(message)
}
