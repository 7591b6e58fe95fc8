use crate::models::{Debt, DebtRequest};
use crate::services::debts;
use crate::{ApiError, ApiResult, AuthenticatedUser, FinanceApp};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, routes, State};
use uuid::Uuid;

#[get("/accounts/<id>/debts")]
pub fn list(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Vec<Debt>> {
    Ok(Json(debts::list_debts(app, user.0.id, id)?))
}

#[post("/accounts/<id>/debts", data = "<req>")]
pub fn create(
    id: Uuid,
    req: Json<DebtRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Debt> {
    Ok(Json(debts::create_debt(app, user.0.id, id, req.into_inner())?))
}

#[get("/accounts/<id>/debts/<debt_id>")]
pub fn show(id: Uuid, debt_id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Debt> {
    Ok(Json(debts::get_debt(app, user.0.id, id, debt_id)?))
}

#[put("/accounts/<id>/debts/<debt_id>", data = "<req>")]
pub fn update(
    id: Uuid,
    debt_id: Uuid,
    req: Json<DebtRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Debt> {
    Ok(Json(debts::update_debt(app, user.0.id, id, debt_id, req.into_inner())?))
}

#[delete("/accounts/<id>/debts/<debt_id>")]
pub fn remove(
    id: Uuid,
    debt_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> Result<Status, ApiError> {
    debts::delete_debt(app, user.0.id, id, debt_id)?;
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, create, show, update, remove]
}
