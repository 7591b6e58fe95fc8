use crate::models::Member;
use crate::services::invitations::{self, InvitationPreview};
use crate::{ApiResult, AuthenticatedUser, FinanceApp};
use rocket::serde::json::Json;
use rocket::{get, post, routes, State};

#[get("/<token>")]
pub fn preview(token: &str, app: &State<FinanceApp>) -> ApiResult<InvitationPreview> {
    Ok(Json(invitations::preview_invitation(app, token)?))
}

#[post("/<token>/accept")]
pub fn accept(token: &str, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Member> {
    Ok(Json(invitations::accept_invitation(app, user.0.id, &user.0.email, token)?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![preview, accept]
}
