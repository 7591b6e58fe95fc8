use super::access::require_member;
use super::error::ServiceError;
use super::validate;
use crate::models::{
    DebtPlanning, PaycheckAllocation, PayRequest, PlanningUpdateRequest, Transaction,
    TransactionKind, TransactionSource,
};
use crate::month::YearMonth;
use crate::planning::{planning_status, PlanningStatus};
use crate::store::StoreError;
use crate::FinanceApp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlanningRow {
    #[serde(flatten)]
    pub row: DebtPlanning,
    pub debt_name: String,
    pub status: PlanningStatus,
    pub allocation: Option<PaycheckAllocation>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MonthPlan {
    pub month: YearMonth,
    pub rows: Vec<PlanningRow>,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub unpaid_cents: i64,
}

/// Creates the missing planning rows of `month` from the account's active debt templates
/// and returns every row of that month.
pub fn ensure_month(
    app: &FinanceApp,
    account_id: Uuid,
    month: YearMonth,
) -> Result<Vec<DebtPlanning>, ServiceError> {
    for debt in app.store.list_debts(account_id)? {
        if !debt.recurs_in(month) || app.store.find_planning(debt.id, month)?.is_some() {
            continue;
        }
        let row = DebtPlanning {
            id: Uuid::new_v4(),
            account_id,
            debt_id: debt.id,
            month,
            amount_cents: debt.amount_cents,
            due_date: month.day_clamped(debt.due_day),
            paid_on: None,
            transaction_id: None,
            created_at: app.clock.now(),
        };
        match app.store.save_planning(&row) {
            // Another request generated the same row first.
            Ok(()) | Err(StoreError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(app.store.list_planning(account_id, month, month)?)
}

pub(crate) fn debt_names(app: &FinanceApp, account_id: Uuid) -> Result<HashMap<Uuid, String>, ServiceError> {
    Ok(app
        .store
        .list_debts(account_id)?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect())
}

pub(crate) fn view_rows(
    app: &FinanceApp,
    account_id: Uuid,
    rows: Vec<DebtPlanning>,
) -> Result<Vec<PlanningRow>, ServiceError> {
    let names = debt_names(app, account_id)?;
    let today = app.clock.today();
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let allocation = app.store.get_allocation(row.id)?;
        views.push(PlanningRow {
            debt_name: names.get(&row.debt_id).cloned().unwrap_or_default(),
            status: planning_status(&row, allocation.is_some(), today),
            allocation,
            row,
        });
    }
    Ok(views)
}

pub(crate) fn load_row(app: &FinanceApp, account_id: Uuid, planning_id: Uuid) -> Result<DebtPlanning, ServiceError> {
    app.store
        .get_planning(planning_id)?
        .filter(|p| p.account_id == account_id)
        .ok_or_else(|| ServiceError::not_found("Planning row"))
}

fn single_view(app: &FinanceApp, account_id: Uuid, row: DebtPlanning) -> Result<PlanningRow, ServiceError> {
    view_rows(app, account_id, vec![row])?
        .pop()
        .ok_or_else(|| ServiceError::not_found("Planning row"))
}

pub fn month_plan(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    month: YearMonth,
) -> Result<MonthPlan, ServiceError> {
    require_member(app, account_id, user_id)?;
    let rows = view_rows(app, account_id, ensure_month(app, account_id, month)?)?;
    let total_cents = rows.iter().map(|r| r.row.amount_cents).sum();
    let paid_cents = rows
        .iter()
        .filter(|r| r.row.paid_on.is_some())
        .map(|r| r.row.amount_cents)
        .sum();
    Ok(MonthPlan {
        month,
        rows,
        total_cents,
        paid_cents,
        unpaid_cents: total_cents - paid_cents,
    })
}

/// Overrides amount and due date for this month only. A lowered amount also caps an
/// existing allocation.
pub fn update_row(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    planning_id: Uuid,
    req: PlanningUpdateRequest,
) -> Result<PlanningRow, ServiceError> {
    require_member(app, account_id, user_id)?;
    let mut row = load_row(app, account_id, planning_id)?;
    if row.paid_on.is_some() {
        return Err(ServiceError::Conflict("Payment already recorded".to_string()));
    }
    if let Some(amount) = req.amount_cents {
        row.amount_cents = validate::positive_amount(amount)?;
    }
    if let Some(due_date) = req.due_date {
        row.due_date = due_date;
    }
    app.store.save_planning(&row)?;

    if let Some(mut allocation) = app.store.get_allocation(row.id)? {
        if allocation.amount_cents > row.amount_cents {
            allocation.amount_cents = row.amount_cents;
            app.store.save_allocation(&allocation)?;
        }
    }
    single_view(app, account_id, row)
}

pub fn pay_row(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    planning_id: Uuid,
    req: PayRequest,
) -> Result<PlanningRow, ServiceError> {
    require_member(app, account_id, user_id)?;
    let mut row = load_row(app, account_id, planning_id)?;
    if row.paid_on.is_some() {
        return Err(ServiceError::Conflict("Payment already recorded".to_string()));
    }
    let paid_on: NaiveDate = req.paid_on.unwrap_or_else(|| app.clock.today());

    if req.create_transaction {
        let debt = app.store.get_debt(row.debt_id)?;
        let now = app.clock.now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            account_id,
            date: paid_on,
            description: debt
                .as_ref()
                .map(|d| d.name.clone())
                .unwrap_or_else(|| "Debt payment".to_string()),
            amount_cents: row.amount_cents,
            kind: TransactionKind::Expense,
            category_id: debt.as_ref().and_then(|d| d.category_id),
            debt_id: Some(row.debt_id),
            source: TransactionSource::Manual,
            external_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        app.store.save_transaction(&transaction)?;
        row.transaction_id = Some(transaction.id);
    }
    row.paid_on = Some(paid_on);
    app.store.save_planning(&row)?;

    tracing::info!(%account_id, %planning_id, %paid_on, "debt payment recorded");
    single_view(app, account_id, row)
}

/// Clears the payment; a transaction created by `pay_row` is removed with it.
pub fn unpay_row(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    planning_id: Uuid,
) -> Result<PlanningRow, ServiceError> {
    require_member(app, account_id, user_id)?;
    let mut row = load_row(app, account_id, planning_id)?;
    if row.paid_on.is_none() {
        return Err(ServiceError::Conflict("Payment not recorded".to_string()));
    }
    if let Some(transaction_id) = row.transaction_id.take() {
        app.store.delete_transaction(transaction_id)?;
    }
    row.paid_on = None;
    app.store.save_planning(&row)?;
    single_view(app, account_id, row)
}
