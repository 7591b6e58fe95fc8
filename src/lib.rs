use rocket::fairing::AdHoc;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::json::Json;
use rocket::{catch, catchers, Build, Responder, Rocket};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod clock;
pub mod config;
pub mod db;
pub mod mailer;
pub mod models;
pub mod month;
pub mod planning;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use clock::{Clock, SystemClock};
use config::AppConfig;
use mailer::{LogMailer, Mailer};
use models::User;
use services::auth::SessionLookup;
use store::{MemoryStore, PgStore, Store};

pub use models::LoginResponse;

/// Shared application state handed to every handler.
pub struct FinanceApp {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
    pub config: AppConfig,
}

impl FinanceApp {
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> Self {
        FinanceApp {
            store,
            mailer,
            clock,
            config,
        }
    }

    /// In-process store, log mailer, wall clock.
    pub fn in_memory(config: AppConfig) -> Self {
        FinanceApp::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogMailer),
            Arc::new(SystemClock),
            config,
        )
    }
}

// --- Request guards ---

/// Why a guard rejected the request; read back by the catchers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthError {
    MissingOrMalformedHeader,
    InvalidToken,
    SessionExpired,
    NotAdmin,
    InvalidWebhookSecret,
    NoAppState,
}

/// A caller holding a live session, given either as `Authorization: Bearer <token>` or
/// the `session_token` cookie. The header wins when both are present.
pub struct AuthenticatedUser(pub User);

/// An authenticated caller with the admin flag set.
pub struct AdminUser(pub User);

/// Raw session token from the request, without validating it.
pub struct SessionToken(pub String);

fn fail<T>(req: &Request<'_>, status: Status, reason: AuthError) -> Outcome<T, ()> {
    req.local_cache(|| Some(reason));
    Outcome::Error((status, ()))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionToken {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        if let Some(header_value) = req.headers().get_one("Authorization") {
            return match header_value.strip_prefix("Bearer ") {
                Some(token) if !token.trim().is_empty() => {
                    Outcome::Success(SessionToken(token.trim().to_string()))
                }
                _ => fail(req, Status::Unauthorized, AuthError::MissingOrMalformedHeader),
            };
        }
        match req.cookies().get("session_token") {
            Some(cookie) if !cookie.value().is_empty() => {
                Outcome::Success(SessionToken(cookie.value().to_string()))
            }
            _ => fail(req, Status::Unauthorized, AuthError::MissingOrMalformedHeader),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let app_state = match req.rocket().state::<FinanceApp>() {
            Some(s) => s,
            None => return fail(req, Status::InternalServerError, AuthError::NoAppState),
        };

        let token = match req.guard::<SessionToken>().await {
            Outcome::Success(token) => token,
            Outcome::Error(e) => return Outcome::Error(e),
            Outcome::Forward(status) => return Outcome::Forward(status),
        };

        match services::auth::lookup_session(app_state, &token.0) {
            Ok(SessionLookup::Active(user)) => Outcome::Success(AuthenticatedUser(user)),
            Ok(SessionLookup::Expired) => {
                tracing::debug!("rejected expired session");
                fail(req, Status::Unauthorized, AuthError::SessionExpired)
            }
            Ok(SessionLookup::Unknown) => {
                tracing::debug!("rejected unknown session token");
                fail(req, Status::Unauthorized, AuthError::InvalidToken)
            }
            Err(_) => Outcome::Error((Status::InternalServerError, ())),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.guard::<AuthenticatedUser>().await {
            Outcome::Success(AuthenticatedUser(user)) if user.is_admin => {
                Outcome::Success(AdminUser(user))
            }
            Outcome::Success(AuthenticatedUser(user)) => {
                tracing::warn!(user_id = %user.id, "non-admin tried an admin route");
                fail(req, Status::Forbidden, AuthError::NotAdmin)
            }
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(status) => Outcome::Forward(status),
        }
    }
}

/// Callers of `/webhooks/*` must present the configured shared secret in
/// `X-Webhook-Secret`. Without a configured secret every call is refused.
pub struct WebhookSecret;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WebhookSecret {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let app_state = match req.rocket().state::<FinanceApp>() {
            Some(s) => s,
            None => return fail(req, Status::InternalServerError, AuthError::NoAppState),
        };
        let presented = req.headers().get_one("X-Webhook-Secret");
        match (&app_state.config.webhook_secret, presented) {
            (Some(expected), Some(given)) if !expected.is_empty() && expected == given => {
                Outcome::Success(WebhookSecret)
            }
            _ => {
                tracing::warn!("webhook call rejected");
                fail(req, Status::Unauthorized, AuthError::InvalidWebhookSecret)
            }
        }
    }
}

// --- Error responses ---

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorDetail {
    pub error: String,
}

#[derive(Responder, Debug)]
pub enum ApiError {
    #[response(status = 404)]
    NotFound(Json<ErrorDetail>),
    #[response(status = 401)]
    Unauthorized(Json<ErrorDetail>),
    #[response(status = 403)]
    Forbidden(Json<ErrorDetail>),
    #[response(status = 409)]
    Conflict(Json<ErrorDetail>),
    #[response(status = 422)]
    InvalidInput(Json<ErrorDetail>),
    #[response(status = 410)]
    Gone(Json<ErrorDetail>),
    #[response(status = 500)]
    InternalError(Json<ErrorDetail>),
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

// Serializable error response struct
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

fn error_response(error: &str, message: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
    })
}

#[catch(400)]
fn bad_request_catcher() -> Json<ErrorResponse> {
    error_response("bad_request", "The request could not be understood.")
}

#[catch(401)]
fn unauthorized_catcher(req: &Request<'_>) -> Json<ErrorResponse> {
    match req.local_cache(|| None as Option<AuthError>) {
        Some(AuthError::MissingOrMalformedHeader) => error_response(
            "missing_or_malformed_header",
            "Not authenticated. Send a bearer token or session cookie.",
        ),
        Some(AuthError::InvalidToken) => {
            error_response("invalid_token", "Session token is invalid.")
        }
        Some(AuthError::SessionExpired) => {
            error_response("session_expired", "Session has expired. Log in again.")
        }
        Some(AuthError::InvalidWebhookSecret) => {
            error_response("invalid_webhook_secret", "Webhook secret is missing or wrong.")
        }
        _ => error_response("unauthorized", "Not authenticated"),
    }
}

#[catch(403)]
fn forbidden_catcher(req: &Request<'_>) -> Json<ErrorResponse> {
    match req.local_cache(|| None as Option<AuthError>) {
        Some(AuthError::NotAdmin) => error_response("not_admin", "Admin access required."),
        _ => error_response("forbidden", "Not authorized"),
    }
}

#[catch(404)]
fn not_found_catcher() -> Json<ErrorResponse> {
    error_response("not_found", "The requested resource does not exist.")
}

#[catch(422)]
fn unprocessable_catcher() -> Json<ErrorResponse> {
    error_response("unprocessable_entity", "The request body or parameters are invalid.")
}

#[catch(500)]
fn internal_server_error_catcher(req: &Request<'_>) -> Json<ErrorResponse> {
    match req.local_cache(|| None as Option<AuthError>) {
        Some(AuthError::NoAppState) => error_response(
            "no_app_state",
            "Critical application state (FinanceApp) not found.",
        ),
        _ => error_response(
            "internal_server_error",
            "An unexpected error occurred on the server.",
        ),
    }
}

fn mount_all(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/auth", routes::auth::routes())
        .mount("/invites", routes::invites::routes())
        .mount("/contact", routes::contact::routes())
        .mount("/webhooks", routes::webhooks::routes())
        .mount("/api", routes::accounts::routes())
        .mount("/api", routes::categories::routes())
        .mount("/api", routes::budgets::routes())
        .mount("/api", routes::transactions::routes())
        .mount("/api", routes::income::routes())
        .mount("/api", routes::debts::routes())
        .mount("/api", routes::planning::routes())
        .mount("/api/support", routes::support::routes())
        .mount("/api/admin", routes::admin::routes())
        .register(
            "/",
            catchers![
                bad_request_catcher,
                unauthorized_catcher,
                forbidden_catcher,
                not_found_catcher,
                unprocessable_catcher,
                internal_server_error_catcher
            ],
        )
}

/// A fully mounted instance around an already built application state.
pub fn rocket_with(app: FinanceApp) -> Rocket<Build> {
    mount_all(rocket::build()).manage(app)
}

// This function can be used by main.rs to launch the server.
// The state is built at ignite from Rocket's own configuration sources.
pub fn rocket_instance() -> Rocket<Build> {
    mount_all(rocket::build()).attach(AdHoc::try_on_ignite("Finance state", |rocket| async move {
        let config = match AppConfig::from_figment(rocket.figment()) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "invalid configuration");
                return Err(rocket);
            }
        };

        let store: Arc<dyn Store> = match config.database_url.clone() {
            Some(url) => {
                let connected =
                    rocket::tokio::task::spawn_blocking(move || PgStore::connect(&url)).await;
                match connected {
                    Ok(Ok(store)) => {
                        tracing::info!("using postgres store");
                        Arc::new(store)
                    }
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "could not open database");
                        return Err(rocket);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "database start-up task failed");
                        return Err(rocket);
                    }
                }
            }
            None => {
                tracing::warn!("DATABASE_URL not set; data is kept in memory only");
                return Ok(rocket.manage(FinanceApp::in_memory(config)));
            }
        };

        let app = FinanceApp::new(store, Arc::new(LogMailer), Arc::new(SystemClock), config);
        Ok(rocket.manage(app))
    }))
}
