use super::error::ServiceError;
use super::{notify, validate};
use crate::models::{
    CommentRequest, SupportTicket, TicketComment, TicketFilter, TicketPriority, TicketRequest,
    TicketStatus, TicketStatusRequest, User,
};
use crate::FinanceApp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct TicketDetail {
    pub ticket: SupportTicket,
    pub comments: Vec<TicketComment>,
}

/// The ticket if `user` may see it. Tickets of other users read as missing unless the
/// caller is an admin.
fn visible_ticket(app: &FinanceApp, user: &User, ticket_id: Uuid) -> Result<SupportTicket, ServiceError> {
    app.store
        .get_ticket(ticket_id)?
        .filter(|t| t.user_id == user.id || user.is_admin)
        .ok_or_else(|| ServiceError::not_found("Ticket"))
}

fn notify_owner(app: &FinanceApp, ticket: &SupportTicket, body: String) {
    match app.store.get_user(ticket.user_id) {
        Ok(Some(owner)) => notify(
            app,
            &owner.email,
            format!("Update on your support ticket: {}", ticket.subject),
            body,
        ),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, ticket_id = %ticket.id, "ticket owner lookup failed"),
    }
}

pub fn create_ticket(app: &FinanceApp, user: &User, req: TicketRequest) -> Result<SupportTicket, ServiceError> {
    let now = app.clock.now();
    let ticket = SupportTicket {
        id: Uuid::new_v4(),
        user_id: user.id,
        subject: validate::text("Subject", &req.subject, 1, 200)?,
        description: validate::text("Description", &req.description, 1, 5000)?,
        category: req.category,
        priority: req.priority.unwrap_or(TicketPriority::Normal),
        status: TicketStatus::Open,
        created_at: now,
        updated_at: now,
    };
    app.store.save_ticket(&ticket)?;
    tracing::info!(ticket_id = %ticket.id, user_id = %user.id, "support ticket opened");
    Ok(ticket)
}

pub fn list_own_tickets(app: &FinanceApp, user: &User) -> Result<Vec<SupportTicket>, ServiceError> {
    Ok(app.store.list_tickets(&TicketFilter {
        user_id: Some(user.id),
        status: None,
    })?)
}

pub fn get_ticket(app: &FinanceApp, user: &User, ticket_id: Uuid) -> Result<TicketDetail, ServiceError> {
    let ticket = visible_ticket(app, user, ticket_id)?;
    Ok(TicketDetail {
        comments: app.store.list_comments(ticket.id)?,
        ticket,
    })
}

pub fn add_comment(
    app: &FinanceApp,
    user: &User,
    ticket_id: Uuid,
    req: CommentRequest,
) -> Result<TicketComment, ServiceError> {
    let mut ticket = visible_ticket(app, user, ticket_id)?;
    if ticket.status == TicketStatus::Closed {
        return Err(ServiceError::Conflict("Ticket is closed".to_string()));
    }
    let is_owner = ticket.user_id == user.id;
    let now = app.clock.now();
    let comment = TicketComment {
        id: Uuid::new_v4(),
        ticket_id,
        author_id: user.id,
        body: validate::text("Comment", &req.body, 1, 5000)?,
        staff: user.is_admin && !is_owner,
        created_at: now,
    };
    app.store.save_comment(&comment)?;

    if is_owner && ticket.status == TicketStatus::Resolved {
        ticket.status = TicketStatus::Open;
    }
    ticket.updated_at = now;
    app.store.save_ticket(&ticket)?;

    if comment.staff {
        notify_owner(app, &ticket, format!("Support replied:\n\n{}", comment.body));
    }
    Ok(comment)
}

pub fn close_ticket(app: &FinanceApp, user: &User, ticket_id: Uuid) -> Result<SupportTicket, ServiceError> {
    let mut ticket = app
        .store
        .get_ticket(ticket_id)?
        .filter(|t| t.user_id == user.id)
        .ok_or_else(|| ServiceError::not_found("Ticket"))?;
    if ticket.status == TicketStatus::Closed {
        return Err(ServiceError::Conflict("Ticket is already closed".to_string()));
    }
    ticket.status = TicketStatus::Closed;
    ticket.updated_at = app.clock.now();
    app.store.save_ticket(&ticket)?;
    Ok(ticket)
}

pub fn list_all_tickets(app: &FinanceApp, status: Option<TicketStatus>) -> Result<Vec<SupportTicket>, ServiceError> {
    Ok(app.store.list_tickets(&TicketFilter {
        user_id: None,
        status,
    })?)
}

pub fn set_ticket_status(
    app: &FinanceApp,
    ticket_id: Uuid,
    req: TicketStatusRequest,
) -> Result<SupportTicket, ServiceError> {
    let mut ticket = app
        .store
        .get_ticket(ticket_id)?
        .ok_or_else(|| ServiceError::not_found("Ticket"))?;
    if ticket.status == req.status {
        return Ok(ticket);
    }
    ticket.status = req.status;
    ticket.updated_at = app.clock.now();
    app.store.save_ticket(&ticket)?;

    notify_owner(
        app,
        &ticket,
        format!("Your ticket \"{}\" is now {}.", ticket.subject, ticket.status),
    );
    tracing::info!(%ticket_id, status = %ticket.status, "ticket status changed");
    Ok(ticket)
}
