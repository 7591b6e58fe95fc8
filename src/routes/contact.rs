use crate::models::{ContactRequest, ContactSubmission};
use crate::services::contact;
use crate::{ApiResult, FinanceApp};
use rocket::serde::json::Json;
use rocket::{post, routes, State};

#[post("/", data = "<req>")]
pub fn submit(req: Json<ContactRequest>, app: &State<FinanceApp>) -> ApiResult<ContactSubmission> {
    Ok(Json(contact::submit(app, req.into_inner())?))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![submit]
}
