use crate::models::{
    AdminFlagRequest, CommentRequest, ContactStatus, ContactStatusRequest, ContactSubmission,
    SupportTicket, TicketStatus, TicketStatusRequest, UserInfo,
};
use crate::services::admin::{self, AdminCheck, AdminStats};
use crate::services::contact::{self, ContactDetail};
use crate::services::support;
use crate::{AdminUser, ApiError, ApiResult, AuthenticatedUser, ErrorDetail, FinanceApp};
use rocket::serde::json::Json;
use rocket::{get, post, put, routes, State};
use std::str::FromStr;
use uuid::Uuid;

/// An absent filter lists everything; an unknown value is rejected.
fn status_filter<T: FromStr<Err = String>>(raw: Option<&str>) -> Result<Option<T>, ApiError> {
    raw.map(str::parse::<T>)
        .transpose()
        .map_err(|error| ApiError::InvalidInput(Json(ErrorDetail { error })))
}

/// Open to every signed-in user so clients can decide whether to show admin tools.
#[get("/check")]
pub fn check(user: AuthenticatedUser) -> Json<AdminCheck> {
    Json(admin::check(&user.0))
}

#[get("/users")]
pub fn users(app: &State<FinanceApp>, _admin: AdminUser) -> ApiResult<Vec<UserInfo>> {
    Ok(Json(admin::list_users(app)?))
}

#[put("/users/<id>/admin", data = "<req>")]
pub fn set_admin(
    id: Uuid,
    req: Json<AdminFlagRequest>,
    app: &State<FinanceApp>,
    admin: AdminUser,
) -> ApiResult<UserInfo> {
    Ok(Json(admin::set_admin(app, &admin.0, id, req.into_inner())?))
}

#[get("/stats")]
pub fn stats(app: &State<FinanceApp>, _admin: AdminUser) -> ApiResult<AdminStats> {
    Ok(Json(admin::stats(app)?))
}

#[get("/tickets?<status>")]
pub fn tickets(
    status: Option<&str>,
    app: &State<FinanceApp>,
    _admin: AdminUser,
) -> ApiResult<Vec<SupportTicket>> {
    let status = status_filter::<TicketStatus>(status)?;
    Ok(Json(support::list_all_tickets(app, status)?))
}

#[put("/tickets/<id>/status", data = "<req>")]
pub fn ticket_status(
    id: Uuid,
    req: Json<TicketStatusRequest>,
    app: &State<FinanceApp>,
    _admin: AdminUser,
) -> ApiResult<SupportTicket> {
    Ok(Json(support::set_ticket_status(app, id, req.into_inner())?))
}

#[get("/contacts?<status>")]
pub fn contacts(
    status: Option<&str>,
    app: &State<FinanceApp>,
    _admin: AdminUser,
) -> ApiResult<Vec<ContactSubmission>> {
    let status = status_filter::<ContactStatus>(status)?;
    Ok(Json(contact::list(app, status)?))
}

#[get("/contacts/<id>")]
pub fn contact_detail(id: Uuid, app: &State<FinanceApp>, _admin: AdminUser) -> ApiResult<ContactDetail> {
    Ok(Json(contact::get(app, id)?))
}

#[post("/contacts/<id>/reply", data = "<req>")]
pub fn contact_reply(
    id: Uuid,
    req: Json<CommentRequest>,
    app: &State<FinanceApp>,
    _admin: AdminUser,
) -> ApiResult<ContactDetail> {
    Ok(Json(contact::reply(app, id, req.into_inner())?))
}

#[put("/contacts/<id>/status", data = "<req>")]
pub fn contact_status(
    id: Uuid,
    req: Json<ContactStatusRequest>,
    app: &State<FinanceApp>,
    _admin: AdminUser,
) -> ApiResult<ContactSubmission> {
    Ok(Json(contact::set_status(app, id, req.into_inner())?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        check,
        users,
        set_admin,
        stats,
        tickets,
        ticket_status,
        contacts,
        contact_detail,
        contact_reply,
        contact_status
    ]
}
