//! Paycheck allocation: which paycheck covers which monthly debt payment.

use super::access::require_member;
use super::debt_planning::{debt_names, ensure_month, load_row, view_rows, PlanningRow};
use super::error::ServiceError;
use crate::models::{AllocationRequest, DebtPlanning, IncomeSource, PaycheckAllocation};
use crate::month::YearMonth;
use crate::planning::{
    allocation_timing, auto_assign, build_paychecks, pay_dates, AllocationTiming, PaycheckShare,
    Slot,
};
use crate::FinanceApp;
use chrono::NaiveDate;
use rocket::FromForm;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Query window: `from` month (default current) and the number of months to cover.
#[derive(FromForm, Debug, Default, Clone)]
pub struct PlanWindow {
    pub from: Option<YearMonth>,
    pub months: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AllocationView {
    pub planning_id: Uuid,
    pub debt_id: Uuid,
    pub debt_name: String,
    pub month: YearMonth,
    pub due_date: NaiveDate,
    pub paycheck_date: NaiveDate,
    pub amount_cents: i64,
    pub paid: bool,
    pub timing: AllocationTiming,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PaycheckView {
    pub date: NaiveDate,
    pub total_cents: i64,
    pub sources: Vec<PaycheckShare>,
    pub allocations: Vec<AllocationView>,
    pub allocated_cents: i64,
    pub remaining_cents: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PaycheckPlan {
    pub from: YearMonth,
    pub to: YearMonth,
    pub paychecks: Vec<PaycheckView>,
    pub unallocated: Vec<PlanningRow>,
    /// Allocations inside the window whose paycheck date is no longer on the schedule.
    pub orphaned: Vec<AllocationView>,
    pub total_income_cents: i64,
    pub total_debt_cents: i64,
    pub total_allocated_cents: i64,
    pub total_unallocated_cents: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AutoAssignReport {
    pub assigned: Vec<AllocationView>,
    pub unassigned: Vec<PlanningRow>,
}

struct Window {
    from: YearMonth,
    to: YearMonth,
}

impl Window {
    fn start(&self) -> NaiveDate {
        self.from.first_day()
    }

    fn end(&self) -> NaiveDate {
        self.to.last_day()
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }

    fn months(&self) -> impl Iterator<Item = YearMonth> {
        let from = self.from;
        (0..=from.months_until(self.to)).map(move |n| from.add_months(n))
    }
}

fn resolve_window(app: &FinanceApp, window: &PlanWindow) -> Result<Window, ServiceError> {
    let months = window.months.unwrap_or(app.config.planning_months);
    let max = app.config.max_planning_months;
    if months < 1 || months > max {
        return Err(ServiceError::invalid(format!(
            "months must be between 1 and {}",
            max
        )));
    }
    let from = window.from.unwrap_or_else(|| YearMonth::of(app.clock.today()));
    Ok(Window {
        from,
        to: from.add_months(months as i32 - 1),
    })
}

fn is_scheduled(sources: &[IncomeSource], date: NaiveDate) -> bool {
    sources.iter().any(|s| !pay_dates(s, date, date).is_empty())
}

fn allocation_view(
    allocation: &PaycheckAllocation,
    row: &DebtPlanning,
    names: &HashMap<Uuid, String>,
) -> AllocationView {
    AllocationView {
        planning_id: row.id,
        debt_id: row.debt_id,
        debt_name: names.get(&row.debt_id).cloned().unwrap_or_default(),
        month: row.month,
        due_date: row.due_date,
        paycheck_date: allocation.paycheck_date,
        amount_cents: allocation.amount_cents,
        paid: row.paid_on.is_some(),
        timing: allocation_timing(allocation.paycheck_date, row.due_date),
    }
}

/// Planning rows of every month in the window, generating missing ones.
fn window_rows(app: &FinanceApp, account_id: Uuid, window: &Window) -> Result<Vec<DebtPlanning>, ServiceError> {
    let mut rows = Vec::new();
    for month in window.months() {
        rows.extend(ensure_month(app, account_id, month)?);
    }
    Ok(rows)
}

/// Allocations dated inside the window, with their planning rows.
fn window_allocations(
    app: &FinanceApp,
    account_id: Uuid,
    window: &Window,
) -> Result<Vec<(PaycheckAllocation, DebtPlanning)>, ServiceError> {
    let mut pairs = Vec::new();
    for allocation in app.store.list_allocations(account_id)? {
        if !window.contains(allocation.paycheck_date) {
            continue;
        }
        if let Some(row) = app.store.get_planning(allocation.planning_id)? {
            pairs.push((allocation, row));
        }
    }
    Ok(pairs)
}

fn build_plan(app: &FinanceApp, account_id: Uuid, window: Window) -> Result<PaycheckPlan, ServiceError> {
    let rows = window_rows(app, account_id, &window)?;
    let sources = app.store.list_income_sources(account_id)?;
    let names = debt_names(app, account_id)?;

    let mut by_date: BTreeMap<NaiveDate, PaycheckView> = build_paychecks(&sources, window.start(), window.end())
        .into_iter()
        .map(|p| {
            let view = PaycheckView {
                date: p.date,
                total_cents: p.total_cents,
                sources: p.sources,
                allocations: Vec::new(),
                allocated_cents: 0,
                remaining_cents: p.total_cents,
            };
            (p.date, view)
        })
        .collect();

    let mut orphaned = Vec::new();
    for (allocation, row) in window_allocations(app, account_id, &window)? {
        let view = allocation_view(&allocation, &row, &names);
        match by_date.get_mut(&allocation.paycheck_date) {
            Some(paycheck) => {
                paycheck.allocated_cents += view.amount_cents;
                paycheck.remaining_cents -= view.amount_cents;
                paycheck.allocations.push(view);
            }
            None => orphaned.push(view),
        }
    }
    for paycheck in by_date.values_mut() {
        paycheck
            .allocations
            .sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.debt_name.cmp(&b.debt_name)));
    }

    let total_debt_cents = rows.iter().map(|r| r.amount_cents).sum();
    let mut unallocated_rows = Vec::new();
    for row in rows {
        if row.paid_on.is_none() && app.store.get_allocation(row.id)?.is_none() {
            unallocated_rows.push(row);
        }
    }
    let unallocated = view_rows(app, account_id, unallocated_rows)?;

    let paychecks: Vec<PaycheckView> = by_date.into_values().collect();
    Ok(PaycheckPlan {
        from: window.from,
        to: window.to,
        total_income_cents: paychecks.iter().map(|p| p.total_cents).sum(),
        total_allocated_cents: paychecks.iter().map(|p| p.allocated_cents).sum(),
        total_unallocated_cents: unallocated.iter().map(|r| r.row.amount_cents).sum(),
        total_debt_cents,
        paychecks,
        unallocated,
        orphaned,
    })
}

pub fn paycheck_plan(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    window: &PlanWindow,
) -> Result<PaycheckPlan, ServiceError> {
    require_member(app, account_id, user_id)?;
    let window = resolve_window(app, window)?;
    build_plan(app, account_id, window)
}

pub fn assign(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    req: AllocationRequest,
) -> Result<AllocationView, ServiceError> {
    require_member(app, account_id, user_id)?;
    let row = load_row(app, account_id, req.planning_id)?;
    if row.paid_on.is_some() {
        return Err(ServiceError::Conflict(
            "Cannot reassign a paid debt".to_string(),
        ));
    }
    let amount_cents = req.amount_cents.unwrap_or(row.amount_cents);
    if amount_cents < 1 || amount_cents > row.amount_cents {
        return Err(ServiceError::invalid(format!(
            "Amount must be between 1 and {}",
            row.amount_cents
        )));
    }
    let sources = app.store.list_income_sources(account_id)?;
    if !is_scheduled(&sources, req.paycheck_date) {
        return Err(ServiceError::invalid(format!(
            "No paycheck on {}",
            req.paycheck_date
        )));
    }

    let created_at = match app.store.get_allocation(row.id)? {
        Some(existing) => existing.created_at,
        None => app.clock.now(),
    };
    let allocation = PaycheckAllocation {
        planning_id: row.id,
        account_id,
        paycheck_date: req.paycheck_date,
        amount_cents,
        created_at,
    };
    app.store.save_allocation(&allocation)?;
    Ok(allocation_view(&allocation, &row, &debt_names(app, account_id)?))
}

pub fn unassign(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    planning_id: Uuid,
) -> Result<(), ServiceError> {
    require_member(app, account_id, user_id)?;
    load_row(app, account_id, planning_id)?;
    if !app.store.delete_allocation(planning_id)? {
        return Err(ServiceError::not_found("Allocation"));
    }
    Ok(())
}

/// Fills every unpaid, unallocated row of the window onto the paychecks that can carry
/// it. Existing allocations are never moved.
pub fn auto_assign_window(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    window: &PlanWindow,
) -> Result<AutoAssignReport, ServiceError> {
    require_member(app, account_id, user_id)?;
    let window = resolve_window(app, window)?;
    let rows = window_rows(app, account_id, &window)?;
    let sources = app.store.list_income_sources(account_id)?;

    let mut committed: HashMap<NaiveDate, i64> = HashMap::new();
    for (allocation, _) in window_allocations(app, account_id, &window)? {
        *committed.entry(allocation.paycheck_date).or_default() += allocation.amount_cents;
    }
    let mut slots: Vec<Slot> = build_paychecks(&sources, window.start(), window.end())
        .into_iter()
        .map(|p| Slot {
            date: p.date,
            remaining_cents: p.total_cents - committed.get(&p.date).copied().unwrap_or(0),
        })
        .collect();

    let mut pending = Vec::new();
    for row in rows {
        if row.paid_on.is_none() && app.store.get_allocation(row.id)?.is_none() {
            pending.push(row);
        }
    }
    let outcome = auto_assign(&mut slots, &pending);

    let names = debt_names(app, account_id)?;
    let by_id: HashMap<Uuid, DebtPlanning> = pending.into_iter().map(|r| (r.id, r)).collect();
    let now = app.clock.now();
    let mut assigned = Vec::with_capacity(outcome.assigned.len());
    for (planning_id, paycheck_date, amount_cents) in outcome.assigned {
        let allocation = PaycheckAllocation {
            planning_id,
            account_id,
            paycheck_date,
            amount_cents,
            created_at: now,
        };
        app.store.save_allocation(&allocation)?;
        if let Some(row) = by_id.get(&planning_id) {
            assigned.push(allocation_view(&allocation, row, &names));
        }
    }
    let unassigned_rows: Vec<DebtPlanning> = outcome
        .unassigned
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect();

    tracing::info!(
        %account_id,
        assigned = assigned.len(),
        unassigned = unassigned_rows.len(),
        "auto-assigned debts to paychecks"
    );
    Ok(AutoAssignReport {
        assigned,
        unassigned: view_rows(app, account_id, unassigned_rows)?,
    })
}
