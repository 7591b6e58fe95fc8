pub mod access;
pub mod accounts;
pub mod admin;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod contact;
pub mod debt_planning;
pub mod debts;
pub mod error;
pub mod income;
pub mod invitations;
pub mod paychecks;
pub mod support;
pub mod transactions;
pub mod validate;

use crate::mailer::OutgoingEmail;
use crate::FinanceApp;

/// Sends a notification; delivery failures are logged, never surfaced to the caller.
pub(crate) fn notify(app: &FinanceApp, to: &str, subject: String, body: String) {
    let email = OutgoingEmail {
        to: to.to_string(),
        subject,
        body,
    };
    if let Err(e) = app.mailer.send(email) {
        tracing::warn!(error = %e, to, "notification not delivered");
    }
}
