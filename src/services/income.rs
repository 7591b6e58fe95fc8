use super::access::require_member;
use super::error::ServiceError;
use super::validate;
use crate::models::{IncomeSource, IncomeSourceRequest};
use crate::FinanceApp;
use uuid::Uuid;

fn load_source(app: &FinanceApp, account_id: Uuid, source_id: Uuid) -> Result<IncomeSource, ServiceError> {
    app.store
        .get_income_source(source_id)?
        .filter(|s| s.account_id == account_id)
        .ok_or_else(|| ServiceError::not_found("Income source"))
}

pub fn create_income_source(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    req: IncomeSourceRequest,
) -> Result<IncomeSource, ServiceError> {
    require_member(app, account_id, user_id)?;
    let source = IncomeSource {
        id: Uuid::new_v4(),
        account_id,
        name: validate::text("Income source name", &req.name, 1, 100)?,
        amount_cents: validate::positive_amount(req.amount_cents)?,
        frequency: req.frequency,
        next_pay_date: req.next_pay_date,
        active: req.active,
        created_at: app.clock.now(),
    };
    app.store.save_income_source(&source)?;
    Ok(source)
}

pub fn list_income_sources(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<Vec<IncomeSource>, ServiceError> {
    require_member(app, account_id, user_id)?;
    Ok(app.store.list_income_sources(account_id)?)
}

pub fn get_income_source(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    source_id: Uuid,
) -> Result<IncomeSource, ServiceError> {
    require_member(app, account_id, user_id)?;
    load_source(app, account_id, source_id)
}

pub fn update_income_source(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    source_id: Uuid,
    req: IncomeSourceRequest,
) -> Result<IncomeSource, ServiceError> {
    require_member(app, account_id, user_id)?;
    let mut source = load_source(app, account_id, source_id)?;
    source.name = validate::text("Income source name", &req.name, 1, 100)?;
    source.amount_cents = validate::positive_amount(req.amount_cents)?;
    source.frequency = req.frequency;
    source.next_pay_date = req.next_pay_date;
    source.active = req.active;
    app.store.save_income_source(&source)?;
    Ok(source)
}

pub fn delete_income_source(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    source_id: Uuid,
) -> Result<(), ServiceError> {
    require_member(app, account_id, user_id)?;
    load_source(app, account_id, source_id)?;
    app.store.delete_income_source(source_id)?;
    Ok(())
}
