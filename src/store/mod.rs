//! Persistence seam.
//!
//! Every table of the schema gets `save_*` (insert-or-replace by primary key), `get_*`,
//! `list_*` and, where rows can be removed, `delete_*`. Deleting a parent follows the
//! foreign-key rules of the schema: child rows cascade, optional references are unset.

pub mod memory;
pub mod postgres;

use crate::models::{
    Budget, BudgetAccount, BudgetLine, Category, ContactMessage, ContactStatus,
    ContactSubmission, Debt, DebtPlanning, IncomeSource, Invitation, Member, PaycheckAllocation,
    Session, SupportTicket, TicketComment, TicketFilter, Transaction, TransactionFilter, User,
};
use crate::month::YearMonth;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait Store: Send + Sync {
    // users
    fn save_user(&self, user: &User) -> StoreResult<()>;
    fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    fn list_users(&self) -> StoreResult<Vec<User>>;

    // sessions
    fn save_session(&self, session: &Session) -> StoreResult<()>;
    fn get_session(&self, token: &str) -> StoreResult<Option<Session>>;
    fn delete_session(&self, token: &str) -> StoreResult<()>;

    // budget accounts and members
    fn save_account(&self, account: &BudgetAccount) -> StoreResult<()>;
    fn get_account(&self, id: Uuid) -> StoreResult<Option<BudgetAccount>>;
    fn list_accounts(&self) -> StoreResult<Vec<BudgetAccount>>;
    fn delete_account(&self, id: Uuid) -> StoreResult<bool>;
    fn save_member(&self, member: &Member) -> StoreResult<()>;
    fn get_member(&self, account_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>>;
    fn list_members(&self, account_id: Uuid) -> StoreResult<Vec<Member>>;
    fn list_memberships(&self, user_id: Uuid) -> StoreResult<Vec<Member>>;
    fn delete_member(&self, account_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    // invitations
    fn save_invitation(&self, invitation: &Invitation) -> StoreResult<()>;
    fn get_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>>;
    fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>>;
    fn list_invitations(&self, account_id: Uuid) -> StoreResult<Vec<Invitation>>;

    // categories and budgets
    fn save_category(&self, category: &Category) -> StoreResult<()>;
    fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>>;
    fn list_categories(&self, account_id: Uuid) -> StoreResult<Vec<Category>>;
    fn delete_category(&self, id: Uuid) -> StoreResult<bool>;
    fn save_budget(&self, budget: &Budget) -> StoreResult<()>;
    fn find_budget(&self, account_id: Uuid, month: YearMonth) -> StoreResult<Option<Budget>>;
    fn list_budgets(&self, account_id: Uuid) -> StoreResult<Vec<Budget>>;
    fn save_budget_line(&self, line: &BudgetLine) -> StoreResult<()>;
    fn list_budget_lines(&self, budget_id: Uuid) -> StoreResult<Vec<BudgetLine>>;
    fn delete_budget_line(&self, budget_id: Uuid, category_id: Uuid) -> StoreResult<bool>;

    // transactions
    fn save_transaction(&self, transaction: &Transaction) -> StoreResult<()>;
    fn get_transaction(&self, id: Uuid) -> StoreResult<Option<Transaction>>;
    fn find_transaction_by_external_id(
        &self,
        account_id: Uuid,
        external_id: &str,
    ) -> StoreResult<Option<Transaction>>;
    fn list_transactions(
        &self,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>>;
    fn count_transactions(&self) -> StoreResult<i64>;
    fn delete_transaction(&self, id: Uuid) -> StoreResult<bool>;

    // income sources and debts
    fn save_income_source(&self, source: &IncomeSource) -> StoreResult<()>;
    fn get_income_source(&self, id: Uuid) -> StoreResult<Option<IncomeSource>>;
    fn list_income_sources(&self, account_id: Uuid) -> StoreResult<Vec<IncomeSource>>;
    fn delete_income_source(&self, id: Uuid) -> StoreResult<bool>;
    fn save_debt(&self, debt: &Debt) -> StoreResult<()>;
    fn get_debt(&self, id: Uuid) -> StoreResult<Option<Debt>>;
    fn list_debts(&self, account_id: Uuid) -> StoreResult<Vec<Debt>>;
    fn delete_debt(&self, id: Uuid) -> StoreResult<bool>;

    // monthly planning and paycheck allocations
    fn save_planning(&self, planning: &DebtPlanning) -> StoreResult<()>;
    fn get_planning(&self, id: Uuid) -> StoreResult<Option<DebtPlanning>>;
    fn find_planning(&self, debt_id: Uuid, month: YearMonth) -> StoreResult<Option<DebtPlanning>>;
    /// Planning rows of an account whose month lies in `from..=to`.
    fn list_planning(
        &self,
        account_id: Uuid,
        from: YearMonth,
        to: YearMonth,
    ) -> StoreResult<Vec<DebtPlanning>>;
    fn save_allocation(&self, allocation: &PaycheckAllocation) -> StoreResult<()>;
    fn get_allocation(&self, planning_id: Uuid) -> StoreResult<Option<PaycheckAllocation>>;
    fn list_allocations(&self, account_id: Uuid) -> StoreResult<Vec<PaycheckAllocation>>;
    fn delete_allocation(&self, planning_id: Uuid) -> StoreResult<bool>;

    // support tickets
    fn save_ticket(&self, ticket: &SupportTicket) -> StoreResult<()>;
    fn get_ticket(&self, id: Uuid) -> StoreResult<Option<SupportTicket>>;
    fn list_tickets(&self, filter: &TicketFilter) -> StoreResult<Vec<SupportTicket>>;
    fn save_comment(&self, comment: &TicketComment) -> StoreResult<()>;
    fn list_comments(&self, ticket_id: Uuid) -> StoreResult<Vec<TicketComment>>;

    // contact submissions
    fn save_contact(&self, submission: &ContactSubmission) -> StoreResult<()>;
    fn get_contact(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>>;
    fn find_contact_by_thread(&self, thread_token: &str)
        -> StoreResult<Option<ContactSubmission>>;
    fn list_contacts(&self, status: Option<ContactStatus>) -> StoreResult<Vec<ContactSubmission>>;
    fn save_contact_message(&self, message: &ContactMessage) -> StoreResult<()>;
    fn list_contact_messages(&self, submission_id: Uuid) -> StoreResult<Vec<ContactMessage>>;
}

/// Shared ordering so both backends list rows the same way.
pub(crate) fn sort_transactions(rows: &mut [Transaction]) {
    rows.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
