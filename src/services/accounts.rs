use super::access::{require_member, require_owner};
use super::error::ServiceError;
use super::validate;
use crate::models::{AccountRequest, BudgetAccount, Member, Role, TransferRequest};
use crate::FinanceApp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct AccountSummary {
    #[serde(flatten)]
    pub account: BudgetAccount,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MemberView {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub joined_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AccountDetail {
    pub account: BudgetAccount,
    pub role: Role,
    pub members: Vec<MemberView>,
}

fn account_name(name: &str) -> Result<String, ServiceError> {
    validate::text("Account name", name, 1, 100)
}

pub fn create_account(
    app: &FinanceApp,
    user_id: Uuid,
    req: AccountRequest,
) -> Result<AccountSummary, ServiceError> {
    let name = account_name(&req.name)?;
    let now = app.clock.now();
    let account = BudgetAccount {
        id: Uuid::new_v4(),
        name,
        created_by: user_id,
        created_at: now,
        updated_at: now,
    };
    app.store.save_account(&account)?;
    app.store.save_member(&Member {
        account_id: account.id,
        user_id,
        role: Role::Owner,
        joined_at: now,
    })?;

    tracing::info!(account_id = %account.id, %user_id, "created budget account");
    Ok(AccountSummary {
        account,
        role: Role::Owner,
    })
}

pub fn list_accounts(app: &FinanceApp, user_id: Uuid) -> Result<Vec<AccountSummary>, ServiceError> {
    let mut summaries = Vec::new();
    for member in app.store.list_memberships(user_id)? {
        if let Some(account) = app.store.get_account(member.account_id)? {
            summaries.push(AccountSummary {
                account,
                role: member.role,
            });
        }
    }
    summaries.sort_by(|a, b| a.account.created_at.cmp(&b.account.created_at));
    Ok(summaries)
}

pub fn member_views(app: &FinanceApp, account_id: Uuid) -> Result<Vec<MemberView>, ServiceError> {
    let mut views = Vec::new();
    for member in app.store.list_members(account_id)? {
        // A member row without its user can only appear mid-deletion; skip it.
        if let Some(user) = app.store.get_user(member.user_id)? {
            views.push(MemberView {
                user_id: user.id,
                username: user.username,
                email: user.email,
                role: member.role,
                joined_at: member.joined_at,
            });
        }
    }
    Ok(views)
}

pub fn get_account(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<AccountDetail, ServiceError> {
    let access = require_member(app, account_id, user_id)?;
    Ok(AccountDetail {
        members: member_views(app, account_id)?,
        role: access.member.role,
        account: access.account,
    })
}

pub fn rename_account(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    req: AccountRequest,
) -> Result<BudgetAccount, ServiceError> {
    let mut account = require_owner(app, account_id, user_id)?.account;
    account.name = account_name(&req.name)?;
    account.updated_at = app.clock.now();
    app.store.save_account(&account)?;
    Ok(account)
}

pub fn delete_account(app: &FinanceApp, user_id: Uuid, account_id: Uuid) -> Result<(), ServiceError> {
    require_owner(app, account_id, user_id)?;
    app.store.delete_account(account_id)?;
    tracing::info!(%account_id, %user_id, "deleted budget account");
    Ok(())
}

pub fn list_members(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<Vec<MemberView>, ServiceError> {
    require_member(app, account_id, user_id)?;
    member_views(app, account_id)
}

pub fn remove_member(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    target_id: Uuid,
) -> Result<(), ServiceError> {
    require_owner(app, account_id, user_id)?;
    let target = app
        .store
        .get_member(account_id, target_id)?
        .ok_or_else(|| ServiceError::not_found("Member"))?;
    if target.role == Role::Owner {
        return Err(ServiceError::Conflict(
            "Cannot remove the account owner".to_string(),
        ));
    }
    app.store.delete_member(account_id, target_id)?;
    Ok(())
}

pub fn leave_account(app: &FinanceApp, user_id: Uuid, account_id: Uuid) -> Result<(), ServiceError> {
    let access = require_member(app, account_id, user_id)?;
    if access.is_owner() {
        return Err(ServiceError::Conflict(
            "Owner cannot leave the account".to_string(),
        ));
    }
    app.store.delete_member(account_id, user_id)?;
    Ok(())
}

/// Hands the owner role to another member; the previous owner stays on as a member.
pub fn transfer_ownership(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    req: TransferRequest,
) -> Result<AccountDetail, ServiceError> {
    let access = require_owner(app, account_id, user_id)?;
    if req.user_id == user_id {
        return Err(ServiceError::Conflict("You already own this account".to_string()));
    }
    let mut target = app
        .store
        .get_member(account_id, req.user_id)?
        .ok_or_else(|| ServiceError::not_found("Member"))?;

    target.role = Role::Owner;
    let mut previous = access.member;
    previous.role = Role::Member;
    app.store.save_member(&target)?;
    app.store.save_member(&previous)?;

    tracing::info!(%account_id, from = %user_id, to = %req.user_id, "transferred ownership");
    Ok(AccountDetail {
        members: member_views(app, account_id)?,
        role: Role::Member,
        account: access.account,
    })
}
