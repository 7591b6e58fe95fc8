use super::error::ServiceError;
use super::validate;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, Session, User, UserInfo};
use crate::FinanceApp;
use bcrypt::{hash, verify};
use chrono::Duration;
use uuid::Uuid;

pub enum SessionLookup {
    Active(User),
    Expired,
    Unknown,
}

pub fn register_user(app: &FinanceApp, req: RegisterRequest) -> Result<UserInfo, ServiceError> {
    let username = validate::username(&req.username)?;
    let email = validate::email(&req.email)?;
    validate::password(&req.password)?;

    // Check if user already exists
    if app.store.find_user_by_username(&username)?.is_some() {
        return Err(ServiceError::Conflict("Username already exists".to_string()));
    }
    if app.store.find_user_by_email(&email)?.is_some() {
        return Err(ServiceError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash(&req.password, app.config.bcrypt_cost)?;
    let now = app.clock.now();
    let user = User {
        id: Uuid::new_v4(),
        is_admin: app.config.is_admin_email(&email),
        username,
        email,
        password_hash,
        created_at: now,
        updated_at: now,
    };
    app.store.save_user(&user)?;

    tracing::info!(user_id = %user.id, admin = user.is_admin, "registered user");
    Ok(user.into())
}

pub fn login_user(app: &FinanceApp, req: LoginRequest) -> Result<LoginResponse, ServiceError> {
    let username = req.username.trim().to_lowercase();
    let user = app
        .store
        .find_user_by_username(&username)?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

    if !verify(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "failed login");
        return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
    }

    let now = app.clock.now();
    let session = Session {
        token: Uuid::new_v4().to_string(),
        user_id: user.id,
        created_at: now,
        expires_at: now + Duration::hours(app.config.session_ttl_hours),
    };
    app.store.save_session(&session)?;

    Ok(LoginResponse {
        session_token: session.token,
        user_id: user.id,
        username: user.username,
        expires_at: session.expires_at,
    })
}

pub fn logout_user(app: &FinanceApp, token: &str) -> Result<(), ServiceError> {
    app.store.delete_session(token)?;
    Ok(())
}

/// Resolves a session token. Expired sessions are removed on sight.
pub fn lookup_session(app: &FinanceApp, token: &str) -> Result<SessionLookup, ServiceError> {
    let session = match app.store.get_session(token)? {
        Some(session) => session,
        None => return Ok(SessionLookup::Unknown),
    };
    if session.expires_at <= app.clock.now() {
        app.store.delete_session(token)?;
        return Ok(SessionLookup::Expired);
    }
    Ok(match app.store.get_user(session.user_id)? {
        Some(user) => SessionLookup::Active(user),
        None => SessionLookup::Unknown,
    })
}
