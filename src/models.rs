// budget_backend/src/models.rs
use crate::month::YearMonth;
use chrono::{NaiveDate, NaiveDateTime};
use rocket::form::{self, FromFormField, ValueField};
use rocket::FromForm;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declares a unit enum stored as text (database column, JSON, query string).
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        #[rocket::async_trait]
        impl<'r> FromFormField<'r> for $name {
            fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
                field
                    .value
                    .parse()
                    .map_err(|e: String| form::Error::validation(e).into())
            }
        }
    };
}

text_enum!(
    /// Role of a user inside a budget account.
    Role { Owner => "owner", Member => "member" }
);

text_enum!(InvitationStatus {
    Pending => "pending",
    Accepted => "accepted",
    Revoked => "revoked",
    Expired => "expired",
});

text_enum!(CategoryKind { Expense => "expense", Income => "income" });

text_enum!(TransactionKind { Expense => "expense", Income => "income" });

text_enum!(
    /// Where a transaction came from: typed in by a user or pushed by the sync provider.
    TransactionSource { Manual => "manual", Synced => "synced" }
);

text_enum!(PayFrequency {
    Weekly => "weekly",
    Biweekly => "biweekly",
    Semimonthly => "semimonthly",
    Monthly => "monthly",
});

text_enum!(TicketStatus {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

text_enum!(TicketCategory {
    Bug => "bug",
    Feature => "feature",
    Account => "account",
    Billing => "billing",
    Other => "other",
});

text_enum!(TicketPriority { Low => "low", Normal => "normal", High => "high" });

text_enum!(ContactStatus { New => "new", Replied => "replied", Closed => "closed" });

text_enum!(MessageDirection { Inbound => "inbound", Outbound => "outbound" });

// --- Users and sessions ---

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)] // Password hash should not be sent to client
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// For returning user info without password hash
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub session_token: String,
    pub user_id: Uuid,
    pub username: String,
    pub expires_at: NaiveDateTime,
}

// --- Budget accounts ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BudgetAccount {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Member {
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub joined_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Invitation {
    pub id: Uuid,
    pub account_id: Uuid,
    pub email: String,
    pub token: String,
    pub status: InvitationStatus,
    pub invited_by: Uuid,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub accepted_at: Option<NaiveDateTime>,
}

#[derive(Deserialize, Debug)]
pub struct AccountRequest {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct TransferRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize, Debug)]
pub struct InvitationRequest {
    pub email: String,
}

// --- Categories and budgets ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub kind: CategoryKind,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct CategoryRequest {
    pub name: String,
    pub kind: Option<CategoryKind>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub account_id: Uuid,
    pub month: YearMonth,
    pub created_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BudgetLine {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub planned_cents: i64,
}

#[derive(Deserialize, Debug)]
pub struct BudgetLineRequest {
    pub planned_cents: i64,
}

#[derive(Deserialize, Debug)]
pub struct CopyBudgetRequest {
    pub from: YearMonth,
}

// --- Transactions ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub category_id: Option<Uuid>,
    pub debt_id: Option<Uuid>,
    pub source: TransactionSource,
    pub external_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TransactionRequest {
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub category_id: Option<Uuid>,
    pub debt_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(FromForm, Debug, Default, Clone)]
pub struct TransactionFilter {
    pub month: Option<YearMonth>,
    pub category_id: Option<Uuid>,
    pub debt_id: Option<Uuid>,
    pub source: Option<TransactionSource>,
    pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SyncedTransaction {
    pub external_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    #[serde(default)]
    pub pending: bool,
}

#[derive(Deserialize, Debug)]
pub struct TransactionSyncRequest {
    pub account_id: Uuid,
    pub transactions: Vec<SyncedTransaction>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

// --- Income and debts ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IncomeSource {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub amount_cents: i64,
    pub frequency: PayFrequency,
    pub next_pay_date: NaiveDate,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct IncomeSourceRequest {
    pub name: String,
    pub amount_cents: i64,
    pub frequency: PayFrequency,
    pub next_pay_date: NaiveDate,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Debt {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub amount_cents: i64,
    pub due_day: u32,
    pub category_id: Option<Uuid>,
    pub start_month: YearMonth,
    pub end_month: Option<YearMonth>,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Debt {
    /// Whether this template produces a planning row for `month`.
    pub fn recurs_in(&self, month: YearMonth) -> bool {
        self.active
            && month >= self.start_month
            && self.end_month.map_or(true, |end| month <= end)
    }
}

#[derive(Deserialize, Debug)]
pub struct DebtRequest {
    pub name: String,
    pub amount_cents: i64,
    pub due_day: u32,
    pub category_id: Option<Uuid>,
    pub start_month: Option<YearMonth>,
    pub end_month: Option<YearMonth>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}

// --- Monthly planning and paycheck allocations ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DebtPlanning {
    pub id: Uuid,
    pub account_id: Uuid,
    pub debt_id: Uuid,
    pub month: YearMonth,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub paid_on: Option<NaiveDate>,
    pub transaction_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct PlanningUpdateRequest {
    pub amount_cents: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PayRequest {
    pub paid_on: Option<NaiveDate>,
    #[serde(default)]
    pub create_transaction: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaycheckAllocation {
    pub planning_id: Uuid,
    pub account_id: Uuid,
    pub paycheck_date: NaiveDate,
    pub amount_cents: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct AllocationRequest {
    pub planning_id: Uuid,
    pub paycheck_date: NaiveDate,
    pub amount_cents: Option<i64>,
}

// --- Support and contact ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SupportTicket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TicketComment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub staff: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct TicketRequest {
    pub subject: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: Option<TicketPriority>,
}

#[derive(Deserialize, Debug)]
pub struct CommentRequest {
    pub body: String,
}

#[derive(Deserialize, Debug)]
pub struct TicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Default, Clone)]
pub struct TicketFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<TicketStatus>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: ContactStatus,
    pub thread_token: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub direction: MessageDirection,
    pub sender: String,
    pub body: String,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct ContactStatusRequest {
    pub status: ContactStatus,
}

#[derive(Deserialize, Debug)]
pub struct InboundEmail {
    pub thread_token: String,
    pub from: String,
    pub body: String,
}

#[derive(Deserialize, Debug)]
pub struct AdminFlagRequest {
    pub is_admin: bool,
}
