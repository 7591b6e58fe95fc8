use super::access::require_owner;
use super::error::ServiceError;
use super::{notify, validate};
use crate::models::{Invitation, InvitationRequest, InvitationStatus, Member, Role};
use crate::FinanceApp;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct InvitationPreview {
    pub account_name: String,
    pub email: String,
    pub status: InvitationStatus,
    pub expires_at: NaiveDateTime,
}

/// Pending invitations past their expiry read as expired.
fn effective_status(invitation: &Invitation, now: NaiveDateTime) -> InvitationStatus {
    if invitation.status == InvitationStatus::Pending && invitation.expires_at <= now {
        InvitationStatus::Expired
    } else {
        invitation.status
    }
}

pub fn create_invitation(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    req: InvitationRequest,
) -> Result<Invitation, ServiceError> {
    let access = require_owner(app, account_id, user_id)?;
    let email = validate::email(&req.email)?;
    let now = app.clock.now();

    if let Some(existing) = app.store.find_user_by_email(&email)? {
        if app.store.get_member(account_id, existing.id)?.is_some() {
            return Err(ServiceError::Conflict("User is already a member".to_string()));
        }
    }
    // Lapsed invitations are stored as expired so the new one is the only pending row.
    for mut earlier in app.store.list_invitations(account_id)? {
        if earlier.email != email {
            continue;
        }
        match effective_status(&earlier, now) {
            InvitationStatus::Pending => {
                return Err(ServiceError::Conflict(
                    "An invitation is already pending for this email".to_string(),
                ))
            }
            InvitationStatus::Expired if earlier.status == InvitationStatus::Pending => {
                earlier.status = InvitationStatus::Expired;
                app.store.save_invitation(&earlier)?;
            }
            _ => {}
        }
    }

    let invitation = Invitation {
        id: Uuid::new_v4(),
        account_id,
        email,
        token: Uuid::new_v4().simple().to_string(),
        status: InvitationStatus::Pending,
        invited_by: user_id,
        created_at: now,
        expires_at: now + Duration::days(app.config.invitation_ttl_days),
        accepted_at: None,
    };
    app.store.save_invitation(&invitation)?;

    notify(
        app,
        &invitation.email,
        format!("You're invited to join {}", access.account.name),
        format!(
            "You have been invited to share the budget \"{}\".\n\
             Accept the invitation at /invites/{}/accept before {}.",
            access.account.name, invitation.token, invitation.expires_at
        ),
    );
    tracing::info!(%account_id, invitation_id = %invitation.id, "created invitation");
    Ok(invitation)
}

pub fn list_invitations(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<Vec<Invitation>, ServiceError> {
    require_owner(app, account_id, user_id)?;
    let now = app.clock.now();
    let mut invitations = app.store.list_invitations(account_id)?;
    for invitation in invitations.iter_mut() {
        invitation.status = effective_status(invitation, now);
    }
    Ok(invitations)
}

pub fn revoke_invitation(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    invitation_id: Uuid,
) -> Result<Invitation, ServiceError> {
    require_owner(app, account_id, user_id)?;
    let mut invitation = app
        .store
        .get_invitation(invitation_id)?
        .filter(|inv| inv.account_id == account_id)
        .ok_or_else(|| ServiceError::not_found("Invitation"))?;
    if effective_status(&invitation, app.clock.now()) != InvitationStatus::Pending {
        return Err(ServiceError::Conflict(
            "Only pending invitations can be revoked".to_string(),
        ));
    }
    invitation.status = InvitationStatus::Revoked;
    app.store.save_invitation(&invitation)?;
    Ok(invitation)
}

fn by_token(app: &FinanceApp, token: &str) -> Result<Invitation, ServiceError> {
    app.store
        .find_invitation_by_token(token)?
        .ok_or_else(|| ServiceError::not_found("Invitation"))
}

pub fn preview_invitation(app: &FinanceApp, token: &str) -> Result<InvitationPreview, ServiceError> {
    let invitation = by_token(app, token)?;
    let account = app
        .store
        .get_account(invitation.account_id)?
        .ok_or_else(|| ServiceError::not_found("Invitation"))?;
    Ok(InvitationPreview {
        account_name: account.name,
        status: effective_status(&invitation, app.clock.now()),
        email: invitation.email,
        expires_at: invitation.expires_at,
    })
}

pub fn accept_invitation(
    app: &FinanceApp,
    user_id: Uuid,
    user_email: &str,
    token: &str,
) -> Result<Member, ServiceError> {
    let mut invitation = by_token(app, token)?;
    let now = app.clock.now();

    match effective_status(&invitation, now) {
        InvitationStatus::Pending => {}
        InvitationStatus::Expired => {
            if invitation.status != InvitationStatus::Expired {
                invitation.status = InvitationStatus::Expired;
                app.store.save_invitation(&invitation)?;
            }
            return Err(ServiceError::Gone("Invitation has expired".to_string()));
        }
        _ => {
            return Err(ServiceError::Conflict(
                "Invitation is no longer pending".to_string(),
            ))
        }
    }
    if !invitation.email.eq_ignore_ascii_case(user_email) {
        return Err(ServiceError::Forbidden(
            "Invitation was sent to a different email".to_string(),
        ));
    }
    if app.store.get_member(invitation.account_id, user_id)?.is_some() {
        return Err(ServiceError::Conflict(
            "Already a member of this account".to_string(),
        ));
    }

    let member = Member {
        account_id: invitation.account_id,
        user_id,
        role: Role::Member,
        joined_at: now,
    };
    app.store.save_member(&member)?;
    invitation.status = InvitationStatus::Accepted;
    invitation.accepted_at = Some(now);
    app.store.save_invitation(&invitation)?;

    tracing::info!(account_id = %member.account_id, %user_id, "invitation accepted");
    Ok(member)
}
