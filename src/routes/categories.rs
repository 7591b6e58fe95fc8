use crate::models::{Category, CategoryRequest};
use crate::services::categories;
use crate::{ApiError, ApiResult, AuthenticatedUser, FinanceApp};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, routes, State};
use uuid::Uuid;

#[get("/accounts/<id>/categories")]
pub fn list(id: Uuid, app: &State<FinanceApp>, user: AuthenticatedUser) -> ApiResult<Vec<Category>> {
    Ok(Json(categories::list_categories(app, user.0.id, id)?))
}

#[post("/accounts/<id>/categories", data = "<req>")]
pub fn create(
    id: Uuid,
    req: Json<CategoryRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Category> {
    Ok(Json(categories::create_category(app, user.0.id, id, req.into_inner())?))
}

#[put("/accounts/<id>/categories/<category_id>", data = "<req>")]
pub fn update(
    id: Uuid,
    category_id: Uuid,
    req: Json<CategoryRequest>,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> ApiResult<Category> {
    Ok(Json(categories::update_category(
        app,
        user.0.id,
        id,
        category_id,
        req.into_inner(),
    )?))
}

#[delete("/accounts/<id>/categories/<category_id>")]
pub fn remove(
    id: Uuid,
    category_id: Uuid,
    app: &State<FinanceApp>,
    user: AuthenticatedUser,
) -> Result<Status, ApiError> {
    categories::delete_category(app, user.0.id, id, category_id)?;
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, create, update, remove]
}
