use crate::models::{CommentRequest, SupportTicket, TicketComment, TicketRequest};
use crate::services::support::{self, TicketDetail};
use crate::{ApiResult, AuthenticatedUser, FinanceApp};
use rocket::serde::json::Json;
use rocket::{get, post, routes, State};
use uuid::Uuid;

#[post("/tickets", data = "<req>")]
pub fn create(req: Json<TicketRequest>, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<SupportTicket> {
    Ok(Json(support::create_ticket(app, &user.0, req.into_inner())?))
}

#[get("/tickets")]
pub fn list_own(app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Vec<SupportTicket>> {
    Ok(Json(support::list_own_tickets(app, &user.0)?))
}

#[get("/tickets/<id>")]
pub fn show(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<TicketDetail> {
    Ok(Json(support::get_ticket(app, &user.0, id)?))
}

#[post("/tickets/<id>/comments", data = "<req>")]
pub fn comment(
    id: Uuid,
    req: Json<CommentRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<TicketComment> {
    Ok(Json(support::add_comment(app, &user.0, id, req.into_inner())?))
}

#[post("/tickets/<id>/close")]
pub fn close(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<SupportTicket> {
    Ok(Json(support::close_ticket(app, &user.0, id)?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![create, list_own, show, comment, close]
}
