//! Paycheck schedule and debt-to-paycheck matching.
//!
//! Everything here is pure date arithmetic over already-loaded rows; the service layer
//! loads, calls in here and persists the outcome.

use crate::models::{DebtPlanning, IncomeSource, PayFrequency};
use crate::month::YearMonth;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaycheckShare {
    pub income_source_id: Uuid,
    pub name: String,
    pub amount_cents: i64,
}

/// All income landing on one date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Paycheck {
    pub date: NaiveDate,
    pub total_cents: i64,
    pub sources: Vec<PaycheckShare>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationTiming {
    /// Paid out of a paycheck from an earlier month than the one the debt is due in.
    MonthsAhead { months: i32 },
    OnTime,
    PastDue { days: i64 },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanningStatus {
    Paid,
    Allocated,
    Unallocated,
    Overdue,
}

/// Pay dates of one income source inside `from..=to`. Nothing is generated before the
/// source's `next_pay_date`.
pub fn pay_dates(source: &IncomeSource, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let anchor = source.next_pay_date;
    let start = from.max(anchor);
    if !source.active || start > to {
        return Vec::new();
    }

    match source.frequency {
        PayFrequency::Weekly => stepped(anchor, start, to, 7),
        PayFrequency::Biweekly => stepped(anchor, start, to, 14),
        PayFrequency::Semimonthly => months_between(start, to)
            .flat_map(|m| [m.day_clamped(15), m.last_day()])
            .filter(|d| *d >= start && *d <= to)
            .collect(),
        PayFrequency::Monthly => months_between(start, to)
            .map(|m| m.day_clamped(anchor.day()))
            .filter(|d| *d >= start && *d <= to)
            .collect(),
    }
}

fn stepped(anchor: NaiveDate, start: NaiveDate, to: NaiveDate, step: i64) -> Vec<NaiveDate> {
    let behind = (start - anchor).num_days();
    let skip = (behind + step - 1) / step;
    let mut date = anchor + Duration::days(skip * step);
    let mut dates = Vec::new();
    while date <= to {
        dates.push(date);
        date += Duration::days(step);
    }
    dates
}

fn months_between(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = YearMonth> {
    let first = YearMonth::of(from);
    let span = first.months_until(YearMonth::of(to)).max(-1);
    (0..=span).map(move |offset| first.add_months(offset))
}

/// Merges the schedules of every source into paychecks ordered by date.
pub fn build_paychecks(sources: &[IncomeSource], from: NaiveDate, to: NaiveDate) -> Vec<Paycheck> {
    let mut by_date: BTreeMap<NaiveDate, Paycheck> = BTreeMap::new();
    for source in sources {
        for date in pay_dates(source, from, to) {
            let paycheck = by_date.entry(date).or_insert_with(|| Paycheck {
                date,
                total_cents: 0,
                sources: Vec::new(),
            });
            paycheck.total_cents += source.amount_cents;
            paycheck.sources.push(PaycheckShare {
                income_source_id: source.id,
                name: source.name.clone(),
                amount_cents: source.amount_cents,
            });
        }
    }
    by_date.into_values().collect()
}

pub fn allocation_timing(paycheck_date: NaiveDate, due_date: NaiveDate) -> AllocationTiming {
    if paycheck_date > due_date {
        return AllocationTiming::PastDue {
            days: (paycheck_date - due_date).num_days(),
        };
    }
    let months = YearMonth::of(paycheck_date).months_until(YearMonth::of(due_date));
    if months > 0 {
        AllocationTiming::MonthsAhead { months }
    } else {
        AllocationTiming::OnTime
    }
}

pub fn planning_status(row: &DebtPlanning, allocated: bool, today: NaiveDate) -> PlanningStatus {
    if row.paid_on.is_some() {
        PlanningStatus::Paid
    } else if allocated {
        PlanningStatus::Allocated
    } else if row.due_date < today {
        PlanningStatus::Overdue
    } else {
        PlanningStatus::Unallocated
    }
}

/// A paycheck and what is still free on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub date: NaiveDate,
    pub remaining_cents: i64,
}

#[derive(Debug, Default, PartialEq)]
pub struct AutoAssignment {
    pub assigned: Vec<(Uuid, NaiveDate, i64)>,
    pub unassigned: Vec<Uuid>,
}

/// Places each row on the latest paycheck that lands on or before its due date and can
/// still cover the full amount. Rows are taken in due-date order, larger amounts first
/// on the same day. `slots` must be sorted by date; their remaining amounts are reduced
/// in place.
pub fn auto_assign(slots: &mut [Slot], rows: &[DebtPlanning]) -> AutoAssignment {
    let mut pending: Vec<&DebtPlanning> = rows.iter().collect();
    pending.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| b.amount_cents.cmp(&a.amount_cents))
    });

    let mut outcome = AutoAssignment::default();
    for row in pending {
        let chosen = slots
            .iter_mut()
            .rev()
            .find(|slot| slot.date <= row.due_date && slot.remaining_cents >= row.amount_cents);
        match chosen {
            Some(slot) => {
                slot.remaining_cents -= row.amount_cents;
                outcome.assigned.push((row.id, slot.date, row.amount_cents));
            }
            None => outcome.unassigned.push(row.id),
        }
    }
    outcome
}
