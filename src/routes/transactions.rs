use crate::models::{Transaction, TransactionFilter, TransactionRequest};
use crate::services::transactions;
use crate::{ApiError, ApiResult, AuthenticatedUser, FinanceApp};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, routes, State};
use uuid::Uuid;

#[get("/accounts/<id>/transactions?<filter..>")]
pub fn list(
    id: Uuid,
    filter: TransactionFilter,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Vec<Transaction>> {
    Ok(Json(transactions::list_transactions(app, user.0.id, id, &filter)?))
}

#[post("/accounts/<id>/transactions", data = "<req>")]
pub fn create(
    id: Uuid,
    req: Json<TransactionRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Transaction> {
    Ok(Json(transactions::create_transaction(app, user.0.id, id, req.into_inner())?))
}

#[get("/accounts/<id>/transactions/<transaction_id>")]
pub fn show(
    id: Uuid,
    transaction_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Transaction> {
    Ok(Json(transactions::get_transaction(app, user.0.id, id, transaction_id)?))
}

#[put("/accounts/<id>/transactions/<transaction_id>", data = "<req>")]
pub fn replace(
    id: Uuid,
    transaction_id: Uuid,
    req: Json<TransactionRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Transaction> {
    Ok(Json(transactions::replace_transaction(
        app,
        user.0.id,
        id,
        transaction_id,
        req.into_inner(),
    )?))
}

#[delete("/accounts/<id>/transactions/<transaction_id>")]
pub fn remove(
    id: Uuid,
    transaction_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> Result<Status, ApiError> {
    transactions::delete_transaction(app, user.0.id, id, transaction_id)?;
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, create, show, replace, remove]
}
