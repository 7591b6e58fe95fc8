use super::access::require_member;
use super::error::ServiceError;
use super::validate;
use crate::models::{Category, CategoryKind, CategoryRequest};
use crate::FinanceApp;
use uuid::Uuid;

fn ensure_unique(
    app: &FinanceApp,
    account_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> Result<(), ServiceError> {
    let taken = app
        .store
        .list_categories(account_id)?
        .iter()
        .any(|c| Some(c.id) != except && c.name.to_lowercase() == name.to_lowercase());
    if taken {
        return Err(ServiceError::Conflict("Category already exists".to_string()));
    }
    Ok(())
}

/// A category of `account_id`; categories of other accounts read as missing.
pub fn load_category(
    app: &FinanceApp,
    account_id: Uuid,
    category_id: Uuid,
) -> Result<Category, ServiceError> {
    app.store
        .get_category(category_id)?
        .filter(|c| c.account_id == account_id)
        .ok_or_else(|| ServiceError::not_found("Category"))
}

/// Validates an optional category reference from a request body.
pub fn check_reference(
    app: &FinanceApp,
    account_id: Uuid,
    category_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    if let Some(id) = category_id {
        if load_category(app, account_id, id).is_err() {
            return Err(ServiceError::invalid("Unknown category"));
        }
    }
    Ok(())
}

pub fn create_category(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    req: CategoryRequest,
) -> Result<Category, ServiceError> {
    require_member(app, account_id, user_id)?;
    let name = validate::text("Category name", &req.name, 1, 64)?;
    ensure_unique(app, account_id, &name, None)?;

    let category = Category {
        id: Uuid::new_v4(),
        account_id,
        name,
        kind: req.kind.unwrap_or(CategoryKind::Expense),
        created_at: app.clock.now(),
    };
    app.store.save_category(&category)?;
    Ok(category)
}

pub fn list_categories(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<Vec<Category>, ServiceError> {
    require_member(app, account_id, user_id)?;
    Ok(app.store.list_categories(account_id)?)
}

pub fn update_category(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    category_id: Uuid,
    req: CategoryRequest,
) -> Result<Category, ServiceError> {
    require_member(app, account_id, user_id)?;
    let mut category = load_category(app, account_id, category_id)?;
    let name = validate::text("Category name", &req.name, 1, 64)?;
    ensure_unique(app, account_id, &name, Some(category.id))?;

    category.name = name;
    if let Some(kind) = req.kind {
        category.kind = kind;
    }
    app.store.save_category(&category)?;
    Ok(category)
}

/// Budget lines for the category go with it; transactions and debts keep existing
/// without a category.
pub fn delete_category(
    app: &FinanceApp,
    user_id: Uuid,
    account_id: Uuid,
    category_id: Uuid,
) -> Result<(), ServiceError> {
    require_member(app, account_id, user_id)?;
    load_category(app, account_id, category_id)?;
    app.store.delete_category(category_id)?;
    Ok(())
}
