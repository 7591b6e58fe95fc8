use crate::models::{AllocationRequest, PayRequest, PlanningUpdateRequest};
use crate::month::YearMonth;
use crate::services::debt_planning::{self, MonthPlan, PlanningRow};
use crate::services::paychecks::{self, AllocationView, AutoAssignReport, PaycheckPlan, PlanWindow};
use crate::{ApiError, ApiResult, AuthenticatedUser, ErrorDetail, FinanceApp};
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{delete, get, post, put, routes, State};
use uuid::Uuid;

#[get("/accounts/<id>/planning/<month>")]
pub fn month_plan(
    id: Uuid,
    month: YearMonth,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<MonthPlan> {
    Ok(Json(debt_planning::month_plan(app, user.0.id, id, month)?))
}

#[put("/accounts/<id>/planning/rows/<planning_id>", data = "<req>")]
pub fn update_row(
    id: Uuid,
    planning_id: Uuid,
    req: Json<PlanningUpdateRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<PlanningRow> {
    Ok(Json(debt_planning::update_row(
        app,
        user.0.id,
        id,
        planning_id,
        req.into_inner(),
    )?))
}

fn invalid_body(e: impl std::fmt::Display) -> ApiError {
    ApiError::InvalidInput(Json(ErrorDetail {
        error: format!("Invalid payment request: {}", e),
    }))
}

// An empty body pays today without a transaction; any other body must parse.
#[post("/accounts/<id>/planning/rows/<planning_id>/pay", data = "<req>")]
pub fn pay_row(
    id: Uuid,
    planning_id: Uuid,
    req: Result<Json<PayRequest>, json::Error<'_>>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<PlanningRow> {
    let req = match req {
        Ok(body) => body.into_inner(),
        Err(json::Error::Parse(raw, _)) if raw.trim().is_empty() => PayRequest::default(),
        Err(json::Error::Parse(_, e)) => return Err(invalid_body(e)),
        Err(json::Error::Io(e)) => return Err(invalid_body(e)),
    };
    Ok(Json(debt_planning::pay_row(app, user.0.id, id, planning_id, req)?))
}

#[post("/accounts/<id>/planning/rows/<planning_id>/unpay")]
pub fn unpay_row(
    id: Uuid,
    planning_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<PlanningRow> {
    Ok(Json(debt_planning::unpay_row(app, user.0.id, id, planning_id)?))
}

#[get("/accounts/<id>/paychecks?<window..>")]
pub fn paycheck_plan(
    id: Uuid,
    window: PlanWindow,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<PaycheckPlan> {
    Ok(Json(paychecks::paycheck_plan(app, user.0.id, id, &window)?))
}

#[post("/accounts/<id>/paychecks/assign", data = "<req>")]
pub fn assign(
    id: Uuid,
    req: Json<AllocationRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<AllocationView> {
    Ok(Json(paychecks::assign(app, user.0.id, id, req.into_inner())?))
}

#[delete("/accounts/<id>/paychecks/assign/<planning_id>")]
pub fn unassign(
    id: Uuid,
    planning_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> Result<Status, ApiError> {
    paychecks::unassign(app, user.0.id, id, planning_id)?;
    Ok(Status::NoContent)
}

#[post("/accounts/<id>/paychecks/auto-assign?<window..>")]
pub fn auto_assign(
    id: Uuid,
    window: PlanWindow,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<AutoAssignReport> {
    Ok(Json(paychecks::auto_assign_window(app, user.0.id, id, &window)?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        month_plan,
        update_row,
        pay_row,
        unpay_row,
        paycheck_plan,
        assign,
        unassign,
        auto_assign
    ]
}
