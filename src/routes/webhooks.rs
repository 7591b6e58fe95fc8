use crate::models::{ContactMessage, InboundEmail, SyncReport, TransactionSyncRequest};
use crate::services::{contact, transactions};
use crate::{ApiResult, FinanceApp, WebhookSecret};
use rocket::serde::json::Json;
use rocket::{post, routes, State};

#[post("/transactions", data = "<req>")]
pub fn sync_transactions(
    _secret: WebhookSecret,
    req: Json<TransactionSyncRequest>,
    app: &State<FinanceApp>,
) -> ApiResult<SyncReport> {
    Ok(Json(transactions::sync_transactions(app, req.into_inner())?))
}

#[post("/email", data = "<req>")]
pub fn inbound_email(
    _secret: WebhookSecret,
    req: Json<InboundEmail>,
    app: &State<FinanceApp>,
) -> ApiResult<ContactMessage> {
    Ok(Json(contact::receive_email(app, req.into_inner())?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![sync_transactions, inbound_email]
}
