//! Membership checks shared by every account-scoped operation.

use super::error::ServiceError;
use crate::models::{BudgetAccount, Member, Role};
use crate::FinanceApp;
use uuid::Uuid;

pub struct AccountAccess {
    pub account: BudgetAccount,
    pub member: Member,
}

impl AccountAccess {
    pub fn is_owner(&self) -> bool {
        self.member.role == Role::Owner
    }
}

pub fn require_member(
    app: &FinanceApp,
    account_id: Uuid,
    user_id: Uuid,
) -> Result<AccountAccess, ServiceError> {
    let account = app
        .store
        .get_account(account_id)?
        .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;
    let member = app
        .store
        .get_member(account_id, user_id)?
        .ok_or_else(|| ServiceError::Forbidden("Not authorized".to_string()))?;
    Ok(AccountAccess { account, member })
}

pub fn require_owner(
    app: &FinanceApp,
    account_id: Uuid,
    user_id: Uuid,
) -> Result<AccountAccess, ServiceError> {
    let access = require_member(app, account_id, user_id)?;
    if !access.is_owner() {
        return Err(ServiceError::Forbidden(
            "Only the account owner can do this".to_string(),
        ));
    }
    Ok(access)
}
