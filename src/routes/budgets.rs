use crate::models::{Budget, BudgetLine, BudgetLineRequest, CopyBudgetRequest};
use crate::month::YearMonth;
use crate::services::budgets::{self, BudgetSummary};
use crate::{ApiError, ApiResult, AuthenticatedUser, FinanceApp};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, routes, State};
use uuid::Uuid;

#[get("/accounts/<id>/budgets")]
pub fn list(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Vec<Budget>> {
    Ok(Json(budgets::list_budgets(app, user.0.id, id)?))
}

#[get("/accounts/<id>/budgets/<month>")]
pub fn summary(
    id: Uuid,
    month: YearMonth,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<BudgetSummary> {
    Ok(Json(budgets::budget_summary(app, user.0.id, id, month)?))
}

#[put("/accounts/<id>/budgets/<month>/lines/<category_id>", data = "<req>")]
pub fn upsert_line(
    id: Uuid,
    month: YearMonth,
    category_id: Uuid,
    req: Json<BudgetLineRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<BudgetLine> {
    Ok(Json(budgets::upsert_line(
        app,
        user.0.id,
        id,
        month,
        category_id,
        req.into_inner(),
    )?))
}

#[delete("/accounts/<id>/budgets/<month>/lines/<category_id>")]
pub fn delete_line(
    id: Uuid,
    month: YearMonth,
    category_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> Result<Status, ApiError> {
    budgets::delete_line(app, user.0.id, id, month, category_id)?;
    Ok(Status::NoContent)
}

#[post("/accounts/<id>/budgets/<month>/copy", data = "<req>")]
pub fn copy(
    id: Uuid,
    month: YearMonth,
    req: Json<CopyBudgetRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<BudgetSummary> {
    Ok(Json(budgets::copy_budget(app, user.0.id, id, month, req.into_inner())?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, summary, upsert_line, delete_line, copy]
}
