use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use crate::services::auth;
use crate::{ApiResult, AuthenticatedUser, FinanceApp, SessionToken};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::serde::json::Json;
use rocket::{get, post, routes, State};

#[post("/register", data = "<req>")]
pub fn register(req: Json<RegisterRequest>, app: &State<FinanceApp>) -> ApiResult<UserInfo> {
    Ok(Json(auth::register_user(app, req.into_inner())?))
}

#[post("/login", data = "<req>")]
pub fn login(
    req: Json<LoginRequest>,
    app: &State<FinanceApp>,
    cookies: &CookieJar<'_>,
) -> ApiResult<LoginResponse> {
    let response = auth::login_user(app, req.into_inner())?;
    cookies.add(Cookie::new("session_token", response.session_token.clone()));
    Ok(Json(response))
}

#[post("/logout")]
pub fn logout(
    app: &State<FinanceApp>,
    token: Option<SessionToken>,
    cookies: &CookieJar<'_>,
) -> Status {
    if let Some(SessionToken(token)) = token {
        if let Err(e) = auth::logout_user(app, &token) {
            tracing::warn!(error = %e, "logout could not delete session");
        }
    }
    cookies.remove(Cookie::from("session_token"));
    // NoContent whether or not a session was found.
    Status::NoContent
}

#[get("/me")]
pub fn me(user: AuthenticatedUser) -> Json<UserInfo> {
    Json(user.0.into())
}

pub fn routes() -> Vec<rocket::Route> {
    routes![register, login, logout, me]
}
