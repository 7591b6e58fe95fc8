use crate::models::{
    AccountRequest, BudgetAccount, Invitation, InvitationRequest, TransferRequest,
};
use crate::services::accounts::{self, AccountDetail, AccountSummary, MemberView};
use crate::services::invitations;
use crate::{ApiError, ApiResult, AuthenticatedUser, FinanceApp};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, routes, State};
use uuid::Uuid;

#[get("/accounts")]
pub fn list(app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Vec<AccountSummary>> {
    Ok(Json(accounts::list_accounts(app, user.0.id)?))
}

#[post("/accounts", data = "<req>")]
pub fn create(
    req: Json<AccountRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<AccountSummary> {
    Ok(Json(accounts::create_account(app, user.0.id, req.into_inner())?))
}

#[get("/accounts/<id>")]
pub fn detail(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<AccountDetail> {
    Ok(Json(accounts::get_account(app, user.0.id, id)?))
}

#[put("/accounts/<id>", data = "<req>")]
pub fn rename(
    id: Uuid,
    req: Json<AccountRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<BudgetAccount> {
    Ok(Json(accounts::rename_account(app, user.0.id, id, req.into_inner())?))
}

#[delete("/accounts/<id>")]
pub fn remove(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> Result<Status, ApiError> {
    accounts::delete_account(app, user.0.id, id)?;
    Ok(Status::NoContent)
}

#[get("/accounts/<id>/members")]
pub fn members(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Vec<MemberView>> {
    Ok(Json(accounts::list_members(app, user.0.id, id)?))
}

#[delete("/accounts/<id>/members/<member_id>")]
pub fn remove_member(
    id: Uuid,
    member_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> Result<Status, ApiError> {
    accounts::remove_member(app, user.0.id, id, member_id)?;
    Ok(Status::NoContent)
}

#[post("/accounts/<id>/leave")]
pub fn leave(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> Result<Status, ApiError> {
    accounts::leave_account(app, user.0.id, id)?;
    Ok(Status::NoContent)
}

#[post("/accounts/<id>/transfer", data = "<req>")]
pub fn transfer(
    id: Uuid,
    req: Json<TransferRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<AccountDetail> {
    Ok(Json(accounts::transfer_ownership(app, user.0.id, id, req.into_inner())?))
}

#[get("/accounts/<id>/invitations")]
pub fn list_invitations(
    id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Vec<Invitation>> {
    Ok(Json(invitations::list_invitations(app, user.0.id, id)?))
}

#[post("/accounts/<id>/invitations", data = "<req>")]
pub fn invite(
    id: Uuid,
    req: Json<InvitationRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Invitation> {
    Ok(Json(invitations::create_invitation(app, user.0.id, id, req.into_inner())?))
}

#[delete("/accounts/<id>/invitations/<invitation_id>")]
pub fn revoke_invitation(
    id: Uuid,
    invitation_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Invitation> {
    Ok(Json(invitations::revoke_invitation(app, user.0.id, id, invitation_id)?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list,
        create,
        detail,
        rename,
        remove,
        members,
        remove_member,
        leave,
        transfer,
        list_invitations,
        invite,
        revoke_invitation
    ]
}
