use super::error::ServiceError;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("valid username pattern")
});

/// Trims `value` and checks its length in characters.
pub fn text(field: &str, value: &str, min: usize, max: usize) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 && min > 0 {
        return Err(ServiceError::invalid(format!("{} is required", field)));
    }
    if len < min {
        return Err(ServiceError::invalid(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    if len > max {
        return Err(ServiceError::invalid(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional free text: blank becomes `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ServiceError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => text(field, v, 1, max).map(Some),
    }
}

/// Lower-cased, trimmed email address.
pub fn email(value: &str) -> Result<String, ServiceError> {
    let normalized = value.trim().to_lowercase();
    if normalized.len() > 254 || !EMAIL_RE.is_match(&normalized) {
        return Err(ServiceError::invalid("Invalid email address"));
    }
    Ok(normalized)
}

pub fn username(value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if !USERNAME_RE.is_match(trimmed) {
        return Err(ServiceError::invalid(
            "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
        ));
    }
    Ok(trimmed.to_lowercase())
}

pub fn password(value: &str) -> Result<(), ServiceError> {
    if value.chars().count() < 8 {
        return Err(ServiceError::invalid("Password must be at least 8 characters"));
    }
    Ok(())
}

pub fn positive_amount(cents: i64) -> Result<i64, ServiceError> {
    if cents <= 0 {
        return Err(ServiceError::invalid("Amount must be greater than zero"));
    }
    Ok(cents)
}
