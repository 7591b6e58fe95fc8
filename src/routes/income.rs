use crate::models::{IncomeSource, IncomeSourceRequest};
use crate::services::income;
use crate::{ApiError, ApiResult, AuthenticatedUser, FinanceApp};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, routes, State};
use uuid::Uuid;

#[get("/accounts/<id>/income")]
pub fn list(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Vec<IncomeSource>> {
    Ok(Json(income::list_income_sources(app, user.0.id, id)?))
}

#[post("/accounts/<id>/income", data = "<req>")]
pub fn create(
    id: Uuid,
    req: Json<IncomeSourceRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<IncomeSource> {
    Ok(Json(income::create_income_source(app, user.0.id, id, req.into_inner())?))
}

#[get("/accounts/<id>/income/<source_id>")]
pub fn show(
    id: Uuid,
    source_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<IncomeSource> {
    Ok(Json(income::get_income_source(app, user.0.id, id, source_id)?))
}

#[put("/accounts/<id>/income/<source_id>", data = "<req>")]
pub fn update(
    id: Uuid,
    source_id: Uuid,
    req: Json<IncomeSourceRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<IncomeSource> {
    Ok(Json(income::update_income_source(
        app,
        user.0.id,
        id,
        source_id,
        req.into_inner(),
    )?))
}

#[delete("/accounts/<id>/income/<source_id>")]
pub fn remove(
    id: Uuid,
    source_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> Result<Status, ApiError> {
    income::delete_income_source(app, user.0.id, id, source_id)?;
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, create, show, update, remove]
}
