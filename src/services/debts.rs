use super::access::require_member;
use super::categories;
use super::error::ServiceError;
use super::validate;
use crate::models::{Debt, DebtRequest};
use crate::month::YearMonth;
use crate::FinanceApp;
use uuid::Uuid;

pub fn load_debt(app: &FinanceApp, account_id: Uuid, debt_id: Uuid) -> Result<Debt, ServiceError> {
    app.store
        .get_debt(debt_id)?
        .filter(|d| d.account_id == account_id)
        .ok_or_else(|| ServiceError::not_found("Debt"))
}

struct DebtFields {
    name: String,
    amount_cents: i64,
    due_day: u32,
    category_id: Option<Uuid>,
    start_month: YearMonth,
    end_month: Option<YearMonth>,
    active: bool,
    notes: Option<String>,
}

fn validated(app: &FinanceApp, account_id: Uuid, req: DebtRequest) -> Result<DebtFields, ServiceError> {
    let name = validate::text("Debt name", &req.name, 1, 100)?;
    let amount_cents = validate::positive_amount(req.amount_cents)?;
    if !(1..=31).contains(&req.due_day) {
        return Err(ServiceError::invalid("Due day must be between 1 and 31"));
    }
    categories::check_reference(app, account_id, req.category_id)?;
    let start_month = req
        .start_month
        .unwrap_or_else(|| YearMonth::of(app.clock.today()));
    if let Some(end) = req.end_month {
        if end < start_month {
            return Err(ServiceError::invalid("End month cannot be before start month"));
        }
    }
    Ok(DebtFields {
        name,
        amount_cents,
        due_day: req.due_day,
        category_id: req.category_id,
        start_month,
        end_month: req.end_month,
        active: req.active,
        notes: validate::optional_text("Notes", req.notes.as_deref(), 1000)?,
    })
}

pub fn create_debt(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    req: DebtRequest,
) -> Result<Debt, ServiceError> {
    require_member(app, account_id, user_id)?;
    let fields = validated(app, account_id, req)?;
    let now = app.clock.now();
    let debt = Debt {
        id: Uuid::new_v4(),
        account_id,
        name: fields.name,
        amount_cents: fields.amount_cents,
        due_day: fields.due_day,
        category_id: fields.category_id,
        start_month: fields.start_month,
        end_month: fields.end_month,
        active: fields.active,
        notes: fields.notes,
        created_at: now,
        updated_at: now,
    };
    app.store.save_debt(&debt)?;
    Ok(debt)
}

pub fn list_debts(app: &FinanceApp, user_id: Uuid, account_id: Uuid) -> Result<Vec<Debt>, ServiceError> {
    require_member(app, account_id, user_id)?;
    Ok(app.store.list_debts(account_id)?)
}

pub fn get_debt(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    debt_id: Uuid,
) -> Result<Debt, ServiceError> {
    require_member(app, account_id, user_id)?;
    load_debt(app, account_id, debt_id)
}

/// Changes the template only; planning rows already generated keep their snapshot.
pub fn update_debt(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    debt_id: Uuid,
    req: DebtRequest,
) -> Result<Debt, ServiceError> {
    require_member(app, account_id, user_id)?;
    let mut debt = load_debt(app, account_id, debt_id)?;
    let keep_start = debt.start_month;
    let fields = validated(
        app,
        account_id,
        DebtRequest {
            start_month: req.start_month.or(Some(keep_start)),
            ..req
        },
    )?;
    debt.name = fields.name;
    debt.amount_cents = fields.amount_cents;
    debt.due_day = fields.due_day;
    debt.category_id = fields.category_id;
    debt.start_month = fields.start_month;
    debt.end_month = fields.end_month;
    debt.active = fields.active;
    debt.notes = fields.notes;
    debt.updated_at = app.clock.now();
    app.store.save_debt(&debt)?;
    Ok(debt)
}

pub fn delete_debt(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    debt_id: Uuid,
) -> Result<(), ServiceError> {
    require_member(app, account_id, user_id)?;
    load_debt(app, account_id, debt_id)?;
    app.store.delete_debt(debt_id)?;
    tracing::info!(%account_id, %debt_id, "deleted debt with its planning rows");
    Ok(())
}
