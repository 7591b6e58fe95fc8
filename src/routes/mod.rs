//! HTTP surface. Each module exposes `routes()` for `rocket_with` to mount.

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod contact;
pub mod debts;
pub mod income;
pub mod invites;
pub mod planning;
pub mod support;
pub mod transactions;
pub mod webhooks;
