use super::access::require_member;
use super::categories;
use super::debts::load_debt;
use super::error::ServiceError;
use super::validate;
use crate::models::{
    SyncReport, Transaction, TransactionFilter, TransactionRequest, TransactionSource,
    TransactionSyncRequest,
};
use crate::FinanceApp;
use uuid::Uuid;

struct Fields {
    description: String,
    notes: Option<String>,
}

fn validated(app: &FinanceApp, account_id: Uuid, req: &TransactionRequest) -> Result<Fields, ServiceError> {
    let description = validate::text("Description", &req.description, 1, 200)?;
    validate::positive_amount(req.amount_cents)?;
    categories::check_reference(app, account_id, req.category_id)?;
    if let Some(debt_id) = req.debt_id {
        if load_debt(app, account_id, debt_id).is_err() {
            return Err(ServiceError::invalid("Unknown debt"));
        }
    }
    Ok(Fields {
        description,
        notes: validate::optional_text("Notes", req.notes.as_deref(), 1000)?,
    })
}

fn load_transaction(app: &FinanceApp, account_id: Uuid, id: Uuid) -> Result<Transaction, ServiceError> {
    app.store
        .get_transaction(id)?
        .filter(|t| t.account_id == account_id)
        .ok_or_else(|| ServiceError::not_found("Transaction"))
}

pub fn create_transaction(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    req: TransactionRequest,
) -> Result<Transaction, ServiceError> {
    require_member(app, account_id, user_id)?;
    let fields = validated(app, account_id, &req)?;
    let now = app.clock.now();
    let transaction = Transaction {
        id: Uuid::new_v4(),
        account_id,
        date: req.date,
        description: fields.description,
        amount_cents: req.amount_cents,
        kind: req.kind,
        category_id: req.category_id,
        debt_id: req.debt_id,
        source: TransactionSource::Manual,
        external_id: None,
        notes: fields.notes,
        created_at: now,
        updated_at: now,
    };
    app.store.save_transaction(&transaction)?;
    Ok(transaction)
}

pub fn list_transactions(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, ServiceError> {
    require_member(app, account_id, user_id)?;
    Ok(app.store.list_transactions(account_id, filter)?)
}

pub fn get_transaction(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    id: Uuid,
) -> Result<Transaction, ServiceError> {
    require_member(app, account_id, user_id)?;
    load_transaction(app, account_id, id)
}

/// Replaces every editable field; source and external id are kept.
pub fn replace_transaction(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    id: Uuid,
    req: TransactionRequest,
) -> Result<Transaction, ServiceError> {
    require_member(app, account_id, user_id)?;
    let mut transaction = load_transaction(app, account_id, id)?;
    let fields = validated(app, account_id, &req)?;
    transaction.date = req.date;
    transaction.description = fields.description;
    transaction.amount_cents = req.amount_cents;
    transaction.kind = req.kind;
    transaction.category_id = req.category_id;
    transaction.debt_id = req.debt_id;
    transaction.notes = fields.notes;
    transaction.updated_at = app.clock.now();
    app.store.save_transaction(&transaction)?;
    Ok(transaction)
}

pub fn delete_transaction(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    id: Uuid,
) -> Result<(), ServiceError> {
    require_member(app, account_id, user_id)?;
    load_transaction(app, account_id, id)?;
    app.store.delete_transaction(id)?;
    Ok(())
}

/// Ingests a batch from the bank sync provider. Pending entries are skipped until they
/// post; posted entries are matched on `(account, external_id)`.
pub fn sync_transactions(app: &FinanceApp, req: TransactionSyncRequest) -> Result<SyncReport, ServiceError> {
    let account_id = req.account_id;
    if app.store.get_account(account_id)?.is_none() {
        return Err(ServiceError::NotFound("Account not found".to_string()));
    }

    let mut report = SyncReport::default();
    for item in req.transactions {
        let external_id = item.external_id.trim();
        let description = item.description.trim();
        if item.pending || external_id.is_empty() || description.is_empty() || item.amount_cents <= 0 {
            report.skipped += 1;
            continue;
        }
        let now = app.clock.now();
        match app.store.find_transaction_by_external_id(account_id, external_id)? {
            Some(mut existing) if existing.source == TransactionSource::Synced => {
                existing.date = item.date;
                existing.description = description.to_string();
                existing.amount_cents = item.amount_cents;
                existing.kind = item.kind;
                existing.updated_at = now;
                app.store.save_transaction(&existing)?;
                report.updated += 1;
            }
            Some(_) => report.skipped += 1,
            None => {
                app.store.save_transaction(&Transaction {
                    id: Uuid::new_v4(),
                    account_id,
                    date: item.date,
                    description: description.to_string(),
                    amount_cents: item.amount_cents,
                    kind: item.kind,
                    category_id: None,
                    debt_id: None,
                    source: TransactionSource::Synced,
                    external_id: Some(external_id.to_string()),
                    notes: None,
                    created_at: now,
                    updated_at: now,
                })?;
                report.inserted += 1;
            }
        }
    }

    tracing::info!(
        %account_id,
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped,
        "transaction sync applied"
    );
    Ok(report)
}
