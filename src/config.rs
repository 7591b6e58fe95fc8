use rocket::figment::providers::{Env, Serialized};
use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

/// Application settings, read from the same figment as Rocket's own
/// (`Rocket.toml`, `ROCKET_*` env) plus the bare `DATABASE_URL` / `WEBHOOK_SECRET` vars.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub session_ttl_hours: i64,
    pub invitation_ttl_days: i64,
    pub admin_emails: Vec<String>,
    pub webhook_secret: Option<String>,
    pub planning_months: u32,
    pub max_planning_months: u32,
    pub support_email: String,
    pub bcrypt_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: None,
            session_ttl_hours: 24,
            invitation_ttl_days: 7,
            admin_emails: Vec::new(),
            webhook_secret: None,
            planning_months: 3,
            max_planning_months: 12,
            support_email: "support@localhost".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AppConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        figment
            .clone()
            .join(Serialized::defaults(AppConfig::default()))
            .merge(Env::raw().only(&["DATABASE_URL", "WEBHOOK_SECRET"]))
            .extract()
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let figment = Figment::new()
            .merge(("planning_months", 6))
            .merge(("admin_emails", vec!["root@example.com"]));
        let config = AppConfig::from_figment(&figment).unwrap();
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.invitation_ttl_days, 7);
        assert_eq!(config.planning_months, 6);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.is_admin_email("Root@Example.com"));
        assert!(!config.is_admin_email("someone@example.com"));
    }
}
