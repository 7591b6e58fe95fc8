use super::access::require_member;
use super::categories::load_category;
use super::error::ServiceError;
use crate::models::{
    Budget, BudgetLine, BudgetLineRequest, CopyBudgetRequest, TransactionFilter, TransactionKind,
};
use crate::month::YearMonth;
use crate::FinanceApp;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct BudgetLineView {
    pub category_id: Uuid,
    pub category_name: String,
    pub planned_cents: i64,
    pub spent_cents: i64,
    pub remaining_cents: i64,
}

/// Plan against actuals for one month.
#[derive(Serialize, Deserialize, Debug)]
pub struct BudgetSummary {
    pub month: YearMonth,
    pub budget_id: Option<Uuid>,
    pub lines: Vec<BudgetLineView>,
    pub total_planned_cents: i64,
    pub total_spent_cents: i64,
    pub total_remaining_cents: i64,
    pub income_cents: i64,
    /// Expense spending with no category, or a category the month does not plan for.
    pub unbudgeted_spent_cents: i64,
}

pub fn list_budgets(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<Vec<Budget>, ServiceError> {
    require_member(app, account_id, user_id)?;
    Ok(app.store.list_budgets(account_id)?)
}

fn summarize(app: &FinanceApp, account_id: Uuid, month: YearMonth) -> Result<BudgetSummary, ServiceError> {
    let budget = app.store.find_budget(account_id, month)?;
    let lines = match &budget {
        Some(b) => app.store.list_budget_lines(b.id)?,
        None => Vec::new(),
    };
    let names: HashMap<Uuid, String> = app
        .store
        .list_categories(account_id)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let filter = TransactionFilter {
        month: Some(month),
        ..TransactionFilter::default()
    };
    let mut spent: HashMap<Option<Uuid>, i64> = HashMap::new();
    let mut income_cents = 0;
    for tx in app.store.list_transactions(account_id, &filter)? {
        match tx.kind {
            TransactionKind::Expense => *spent.entry(tx.category_id).or_default() += tx.amount_cents,
            TransactionKind::Income => income_cents += tx.amount_cents,
        }
    }

    let planned: HashSet<Uuid> = lines.iter().map(|l| l.category_id).collect();
    let mut views: Vec<BudgetLineView> = lines
        .iter()
        .map(|line| {
            let spent_cents = spent.get(&Some(line.category_id)).copied().unwrap_or(0);
            BudgetLineView {
                category_id: line.category_id,
                category_name: names.get(&line.category_id).cloned().unwrap_or_default(),
                planned_cents: line.planned_cents,
                spent_cents,
                remaining_cents: line.planned_cents - spent_cents,
            }
        })
        .collect();
    views.sort_by(|a, b| a.category_name.to_lowercase().cmp(&b.category_name.to_lowercase()));

    let unbudgeted_spent_cents = spent
        .iter()
        .filter(|(category, _)| category.map_or(true, |id| !planned.contains(&id)))
        .map(|(_, cents)| cents)
        .sum();
    let total_planned_cents: i64 = views.iter().map(|v| v.planned_cents).sum();
    let total_spent_cents: i64 = views.iter().map(|v| v.spent_cents).sum();

    Ok(BudgetSummary {
        month,
        budget_id: budget.map(|b| b.id),
        lines: views,
        total_planned_cents,
        total_spent_cents,
        total_remaining_cents: total_planned_cents - total_spent_cents,
        income_cents,
        unbudgeted_spent_cents,
    })
}

pub fn budget_summary(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    month: YearMonth,
) -> Result<BudgetSummary, ServiceError> {
    require_member(app, account_id, user_id)?;
    summarize(app, account_id, month)
}

fn budget_for(app: &FinanceApp, account_id: Uuid, month: YearMonth) -> Result<Budget, ServiceError> {
    if let Some(budget) = app.store.find_budget(account_id, month)? {
        return Ok(budget);
    }
    let budget = Budget {
        id: Uuid::new_v4(),
        account_id,
        month,
        created_at: app.clock.now(),
    };
    match app.store.save_budget(&budget) {
        Ok(()) => Ok(budget),
        // Created concurrently; use the winner.
        Err(crate::store::StoreError::Conflict(_)) => app
            .store
            .find_budget(account_id, month)?
            .ok_or_else(|| ServiceError::not_found("Budget")),
        Err(e) => Err(e.into()),
    }
}

pub fn upsert_line(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    month: YearMonth,
    category_id: Uuid,
    req: BudgetLineRequest,
) -> Result<BudgetLine, ServiceError> {
    require_member(app, account_id, user_id)?;
    load_category(app, account_id, category_id)?;
    if req.planned_cents < 0 {
        return Err(ServiceError::invalid("Planned amount cannot be negative"));
    }
    let budget = budget_for(app, account_id, month)?;
    let line = BudgetLine {
        budget_id: budget.id,
        category_id,
        planned_cents: req.planned_cents,
    };
    app.store.save_budget_line(&line)?;
    Ok(line)
}

pub fn delete_line(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    month: YearMonth,
    category_id: Uuid,
) -> Result<(), ServiceError> {
    require_member(app, account_id, user_id)?;
    let removed = match app.store.find_budget(account_id, month)? {
        Some(budget) => app.store.delete_budget_line(budget.id, category_id)?,
        None => false,
    };
    if !removed {
        return Err(ServiceError::not_found("Budget line"));
    }
    Ok(())
}

/// Copies the lines of `req.from` into `month`, leaving categories already planned in
/// `month` untouched.
pub fn copy_budget(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    month: YearMonth,
    req: CopyBudgetRequest,
) -> Result<BudgetSummary, ServiceError> {
    require_member(app, account_id, user_id)?;
    if req.from == month {
        return Err(ServiceError::invalid("Cannot copy a budget onto itself"));
    }
    let source = app
        .store
        .find_budget(account_id, req.from)?
        .ok_or_else(|| ServiceError::NotFound(format!("No budget for {}", req.from)))?;

    let target = budget_for(app, account_id, month)?;
    let existing: HashSet<Uuid> = app
        .store
        .list_budget_lines(target.id)?
        .iter()
        .map(|l| l.category_id)
        .collect();

    let mut copied = 0;
    for line in app.store.list_budget_lines(source.id)? {
        if existing.contains(&line.category_id) {
            continue;
        }
        app.store.save_budget_line(&BudgetLine {
            budget_id: target.id,
            ..line
        })?;
        copied += 1;
    }
    tracing::info!(%account_id, from = %req.from, to = %month, copied, "copied budget lines");
    summarize(app, account_id, month)
}
