use super::error::ServiceError;
use crate::models::{AdminFlagRequest, ContactStatus, TicketFilter, TicketStatus, User, UserInfo};
use crate::FinanceApp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct AdminCheck {
    pub is_admin: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct AdminStats {
    pub users: usize,
    pub accounts: usize,
    pub transactions: i64,
    pub open_tickets: usize,
    pub new_contacts: usize,
}

pub fn check(user: &User) -> AdminCheck {
    AdminCheck {
        is_admin: user.is_admin,
    }
}

pub fn list_users(app: &FinanceApp) -> Result<Vec<UserInfo>, ServiceError> {
    Ok(app
        .store
        .list_users()?
        .into_iter()
        .map(UserInfo::from)
        .collect())
}

pub fn set_admin(
    app: &FinanceApp,
    actor: &User,
    target_id: Uuid,
    req: AdminFlagRequest,
) -> Result<UserInfo, ServiceError> {
    if target_id == actor.id && !req.is_admin {
        return Err(ServiceError::Conflict(
            "You cannot revoke your own admin access".to_string(),
        ));
    }
    let mut user = app
        .store
        .get_user(target_id)?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
    user.is_admin = req.is_admin;
    user.updated_at = app.clock.now();
    app.store.save_user(&user)?;

    tracing::info!(actor = %actor.id, target = %target_id, is_admin = req.is_admin, "admin flag changed");
    Ok(user.into())
}

/// Tickets count as open until resolved or closed.
pub fn stats(app: &FinanceApp) -> Result<AdminStats, ServiceError> {
    let open_tickets = app
        .store
        .list_tickets(&TicketFilter::default())?
        .iter()
        .filter(|t| matches!(t.status, TicketStatus::Open | TicketStatus::InProgress))
        .count();
    Ok(AdminStats {
        users: app.store.list_users()?.len(),
        accounts: app.store.list_accounts()?.len(),
        transactions: app.store.count_transactions()?,
        open_tickets,
        new_contacts: app.store.list_contacts(Some(ContactStatus::New))?.len(),
    })
}
