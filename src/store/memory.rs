use super::{sort_transactions, Store, StoreError, StoreResult};
use crate::models::{
    Budget, BudgetAccount, BudgetLine, Category, ContactMessage, ContactStatus,
    ContactSubmission, Debt, DebtPlanning, IncomeSource, Invitation, InvitationStatus, Member,
    PaycheckAllocation, Session, SupportTicket, TicketComment, TicketFilter, Transaction,
    TransactionFilter, User,
};
use crate::month::YearMonth;
use dashmap::DashMap;
use std::hash::Hash;
use uuid::Uuid;

/// In-process tables backed by `DashMap`, used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    sessions: DashMap<String, Session>, // SessionToken (String) -> Session
    accounts: DashMap<Uuid, BudgetAccount>,
    members: DashMap<(Uuid, Uuid), Member>, // (account_id, user_id)
    invitations: DashMap<Uuid, Invitation>,
    categories: DashMap<Uuid, Category>,
    budgets: DashMap<Uuid, Budget>,
    budget_lines: DashMap<(Uuid, Uuid), BudgetLine>, // (budget_id, category_id)
    transactions: DashMap<Uuid, Transaction>,
    income_sources: DashMap<Uuid, IncomeSource>,
    debts: DashMap<Uuid, Debt>,
    planning: DashMap<Uuid, DebtPlanning>,
    allocations: DashMap<Uuid, PaycheckAllocation>, // planning_id -> allocation
    tickets: DashMap<Uuid, SupportTicket>,
    comments: DashMap<Uuid, TicketComment>,
    contacts: DashMap<Uuid, ContactSubmission>,
    contact_messages: DashMap<Uuid, ContactMessage>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cloned<K: Eq + Hash, V: Clone>(map: &DashMap<K, V>, key: &K) -> Option<V> {
    map.get(key).map(|entry| entry.value().clone())
}

fn collect<K, V, F>(map: &DashMap<K, V>, keep: F) -> Vec<V>
where
    K: Eq + Hash,
    V: Clone,
    F: Fn(&V) -> bool,
{
    map.iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| entry.value().clone())
        .collect()
}

impl Store for MemoryStore {
    fn save_user(&self, user: &User) -> StoreResult<()> {
        let taken = self.users.iter().any(|entry| {
            let other = entry.value();
            other.id != user.id
                && (other.username.eq_ignore_ascii_case(&user.username)
                    || other.email.eq_ignore_ascii_case(&user.email))
        });
        if taken {
            return Err(StoreError::Conflict("username or email already in use".to_string()));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(cloned(&self.users, &id))
    }

    fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().username.eq_ignore_ascii_case(username))
            .map(|entry| entry.value().clone()))
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().email.eq_ignore_ascii_case(email))
            .map(|entry| entry.value().clone()))
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users = collect(&self.users, |_| true);
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    fn save_session(&self, session: &Session) -> StoreResult<()> {
        self.sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    fn get_session(&self, token: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions.get(token).map(|entry| entry.value().clone()))
    }

    fn delete_session(&self, token: &str) -> StoreResult<()> {
        self.sessions.remove(token);
        Ok(())
    }

    fn save_account(&self, account: &BudgetAccount) -> StoreResult<()> {
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn get_account(&self, id: Uuid) -> StoreResult<Option<BudgetAccount>> {
        Ok(cloned(&self.accounts, &id))
    }

    fn list_accounts(&self) -> StoreResult<Vec<BudgetAccount>> {
        let mut accounts = collect(&self.accounts, |_| true);
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }

    fn delete_account(&self, id: Uuid) -> StoreResult<bool> {
        if self.accounts.remove(&id).is_none() {
            return Ok(false);
        }
        self.members.retain(|_, m| m.account_id != id);
        self.invitations.retain(|_, i| i.account_id != id);
        let budget_ids: Vec<Uuid> = collect(&self.budgets, |b| b.account_id == id)
            .into_iter()
            .map(|b| b.id)
            .collect();
        self.budget_lines.retain(|(budget_id, _), _| !budget_ids.contains(budget_id));
        self.budgets.retain(|_, b| b.account_id != id);
        self.categories.retain(|_, c| c.account_id != id);
        self.transactions.retain(|_, t| t.account_id != id);
        self.income_sources.retain(|_, s| s.account_id != id);
        self.allocations.retain(|_, a| a.account_id != id);
        self.planning.retain(|_, p| p.account_id != id);
        self.debts.retain(|_, d| d.account_id != id);
        Ok(true)
    }

    fn save_member(&self, member: &Member) -> StoreResult<()> {
        self.members
            .insert((member.account_id, member.user_id), member.clone());
        Ok(())
    }

    fn get_member(&self, account_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>> {
        Ok(cloned(&self.members, &(account_id, user_id)))
    }

    fn list_members(&self, account_id: Uuid) -> StoreResult<Vec<Member>> {
        let mut members = collect(&self.members, |m| m.account_id == account_id);
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    fn list_memberships(&self, user_id: Uuid) -> StoreResult<Vec<Member>> {
        let mut members = collect(&self.members, |m| m.user_id == user_id);
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    fn delete_member(&self, account_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.members.remove(&(account_id, user_id)).is_some())
    }

    fn save_invitation(&self, invitation: &Invitation) -> StoreResult<()> {
        if invitation.status == InvitationStatus::Pending {
            let duplicate = self.invitations.iter().any(|entry| {
                let other = entry.value();
                other.id != invitation.id
                    && other.account_id == invitation.account_id
                    && other.status == InvitationStatus::Pending
                    && other.email.eq_ignore_ascii_case(&invitation.email)
            });
            if duplicate {
                return Err(StoreError::Conflict(
                    "An invitation is already pending for this email".to_string(),
                ));
            }
        }
        self.invitations.insert(invitation.id, invitation.clone());
        Ok(())
    }

    fn get_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(cloned(&self.invitations, &id))
    }

    fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        Ok(self
            .invitations
            .iter()
            .find(|entry| entry.value().token == token)
            .map(|entry| entry.value().clone()))
    }

    fn list_invitations(&self, account_id: Uuid) -> StoreResult<Vec<Invitation>> {
        let mut invitations = collect(&self.invitations, |i| i.account_id == account_id);
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    fn save_category(&self, category: &Category) -> StoreResult<()> {
        self.categories.insert(category.id, category.clone());
        Ok(())
    }

    fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(cloned(&self.categories, &id))
    }

    fn list_categories(&self, account_id: Uuid) -> StoreResult<Vec<Category>> {
        let mut categories = collect(&self.categories, |c| c.account_id == account_id);
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        if self.categories.remove(&id).is_none() {
            return Ok(false);
        }
        self.budget_lines.retain(|(_, category_id), _| *category_id != id);
        for mut entry in self.transactions.iter_mut() {
            if entry.category_id == Some(id) {
                entry.category_id = None;
            }
        }
        for mut entry in self.debts.iter_mut() {
            if entry.category_id == Some(id) {
                entry.category_id = None;
            }
        }
        Ok(true)
    }

    fn save_budget(&self, budget: &Budget) -> StoreResult<()> {
        let duplicate = self.budgets.iter().any(|entry| {
            let other = entry.value();
            other.id != budget.id
                && other.account_id == budget.account_id
                && other.month == budget.month
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "budget for {} already exists",
                budget.month
            )));
        }
        self.budgets.insert(budget.id, budget.clone());
        Ok(())
    }

    fn find_budget(&self, account_id: Uuid, month: YearMonth) -> StoreResult<Option<Budget>> {
        Ok(self
            .budgets
            .iter()
            .find(|entry| entry.value().account_id == account_id && entry.value().month == month)
            .map(|entry| entry.value().clone()))
    }

    fn list_budgets(&self, account_id: Uuid) -> StoreResult<Vec<Budget>> {
        let mut budgets = collect(&self.budgets, |b| b.account_id == account_id);
        budgets.sort_by_key(|b| b.month);
        Ok(budgets)
    }

    fn save_budget_line(&self, line: &BudgetLine) -> StoreResult<()> {
        self.budget_lines
            .insert((line.budget_id, line.category_id), line.clone());
        Ok(())
    }

    fn list_budget_lines(&self, budget_id: Uuid) -> StoreResult<Vec<BudgetLine>> {
        Ok(collect(&self.budget_lines, |l| l.budget_id == budget_id))
    }

    fn delete_budget_line(&self, budget_id: Uuid, category_id: Uuid) -> StoreResult<bool> {
        Ok(self.budget_lines.remove(&(budget_id, category_id)).is_some())
    }

    fn save_transaction(&self, transaction: &Transaction) -> StoreResult<()> {
        self.transactions.insert(transaction.id, transaction.clone());
        Ok(())
    }

    fn get_transaction(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        Ok(cloned(&self.transactions, &id))
    }

    fn find_transaction_by_external_id(
        &self,
        account_id: Uuid,
        external_id: &str,
    ) -> StoreResult<Option<Transaction>> {
        Ok(self
            .transactions
            .iter()
            .find(|entry| {
                let t = entry.value();
                t.account_id == account_id && t.external_id.as_deref() == Some(external_id)
            })
            .map(|entry| entry.value().clone()))
    }

    fn list_transactions(
        &self,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut rows = collect(&self.transactions, |t| {
            t.account_id == account_id
                && filter.month.map_or(true, |m| m.contains(t.date))
                && filter.category_id.map_or(true, |c| t.category_id == Some(c))
                && filter.debt_id.map_or(true, |d| t.debt_id == Some(d))
                && filter.source.map_or(true, |s| t.source == s)
                && search
                    .as_ref()
                    .map_or(true, |q| t.description.to_lowercase().contains(q))
        });
        sort_transactions(&mut rows);
        Ok(rows)
    }

    fn count_transactions(&self) -> StoreResult<i64> {
        Ok(self.transactions.len() as i64)
    }

    fn delete_transaction(&self, id: Uuid) -> StoreResult<bool> {
        if self.transactions.remove(&id).is_none() {
            return Ok(false);
        }
        for mut entry in self.planning.iter_mut() {
            if entry.transaction_id == Some(id) {
                entry.transaction_id = None;
            }
        }
        Ok(true)
    }

    fn save_income_source(&self, source: &IncomeSource) -> StoreResult<()> {
        self.income_sources.insert(source.id, source.clone());
        Ok(())
    }

    fn get_income_source(&self, id: Uuid) -> StoreResult<Option<IncomeSource>> {
        Ok(cloned(&self.income_sources, &id))
    }

    fn list_income_sources(&self, account_id: Uuid) -> StoreResult<Vec<IncomeSource>> {
        let mut sources = collect(&self.income_sources, |s| s.account_id == account_id);
        sources.sort_by_key(|s| s.created_at);
        Ok(sources)
    }

    fn delete_income_source(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.income_sources.remove(&id).is_some())
    }

    fn save_debt(&self, debt: &Debt) -> StoreResult<()> {
        self.debts.insert(debt.id, debt.clone());
        Ok(())
    }

    fn get_debt(&self, id: Uuid) -> StoreResult<Option<Debt>> {
        Ok(cloned(&self.debts, &id))
    }

    fn list_debts(&self, account_id: Uuid) -> StoreResult<Vec<Debt>> {
        let mut debts = collect(&self.debts, |d| d.account_id == account_id);
        debts.sort_by(|a, b| a.due_day.cmp(&b.due_day).then_with(|| a.name.cmp(&b.name)));
        Ok(debts)
    }

    fn delete_debt(&self, id: Uuid) -> StoreResult<bool> {
        if self.debts.remove(&id).is_none() {
            return Ok(false);
        }
        let planning_ids: Vec<Uuid> = collect(&self.planning, |p| p.debt_id == id)
            .into_iter()
            .map(|p| p.id)
            .collect();
        self.allocations
            .retain(|planning_id, _| !planning_ids.contains(planning_id));
        self.planning.retain(|_, p| p.debt_id != id);
        for mut entry in self.transactions.iter_mut() {
            if entry.debt_id == Some(id) {
                entry.debt_id = None;
            }
        }
        Ok(true)
    }

    fn save_planning(&self, planning: &DebtPlanning) -> StoreResult<()> {
        let duplicate = self.planning.iter().any(|entry| {
            let other = entry.value();
            other.id != planning.id
                && other.debt_id == planning.debt_id
                && other.month == planning.month
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "planning row for {} already exists",
                planning.month
            )));
        }
        self.planning.insert(planning.id, planning.clone());
        Ok(())
    }

    fn get_planning(&self, id: Uuid) -> StoreResult<Option<DebtPlanning>> {
        Ok(cloned(&self.planning, &id))
    }

    fn find_planning(&self, debt_id: Uuid, month: YearMonth) -> StoreResult<Option<DebtPlanning>> {
        Ok(self
            .planning
            .iter()
            .find(|entry| entry.value().debt_id == debt_id && entry.value().month == month)
            .map(|entry| entry.value().clone()))
    }

    fn list_planning(
        &self,
        account_id: Uuid,
        from: YearMonth,
        to: YearMonth,
    ) -> StoreResult<Vec<DebtPlanning>> {
        let mut rows = collect(&self.planning, |p| {
            p.account_id == account_id && p.month >= from && p.month <= to
        });
        rows.sort_by_key(|p| p.due_date);
        Ok(rows)
    }

    fn save_allocation(&self, allocation: &PaycheckAllocation) -> StoreResult<()> {
        self.allocations
            .insert(allocation.planning_id, allocation.clone());
        Ok(())
    }

    fn get_allocation(&self, planning_id: Uuid) -> StoreResult<Option<PaycheckAllocation>> {
        Ok(cloned(&self.allocations, &planning_id))
    }

    fn list_allocations(&self, account_id: Uuid) -> StoreResult<Vec<PaycheckAllocation>> {
        let mut rows = collect(&self.allocations, |a| a.account_id == account_id);
        rows.sort_by_key(|a| a.paycheck_date);
        Ok(rows)
    }

    fn delete_allocation(&self, planning_id: Uuid) -> StoreResult<bool> {
        Ok(self.allocations.remove(&planning_id).is_some())
    }

    fn save_ticket(&self, ticket: &SupportTicket) -> StoreResult<()> {
        self.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    fn get_ticket(&self, id: Uuid) -> StoreResult<Option<SupportTicket>> {
        Ok(cloned(&self.tickets, &id))
    }

    fn list_tickets(&self, filter: &TicketFilter) -> StoreResult<Vec<SupportTicket>> {
        let mut tickets = collect(&self.tickets, |t| {
            filter.user_id.map_or(true, |u| t.user_id == u)
                && filter.status.map_or(true, |s| t.status == s)
        });
        tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tickets)
    }

    fn save_comment(&self, comment: &TicketComment) -> StoreResult<()> {
        self.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    fn list_comments(&self, ticket_id: Uuid) -> StoreResult<Vec<TicketComment>> {
        let mut comments = collect(&self.comments, |c| c.ticket_id == ticket_id);
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    fn save_contact(&self, submission: &ContactSubmission) -> StoreResult<()> {
        self.contacts.insert(submission.id, submission.clone());
        Ok(())
    }

    fn get_contact(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>> {
        Ok(cloned(&self.contacts, &id))
    }

    fn find_contact_by_thread(
        &self,
        thread_token: &str,
    ) -> StoreResult<Option<ContactSubmission>> {
        Ok(self
            .contacts
            .iter()
            .find(|entry| entry.value().thread_token == thread_token)
            .map(|entry| entry.value().clone()))
    }

    fn list_contacts(&self, status: Option<ContactStatus>) -> StoreResult<Vec<ContactSubmission>> {
        let mut contacts = collect(&self.contacts, |c| status.map_or(true, |s| c.status == s));
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contacts)
    }

    fn save_contact_message(&self, message: &ContactMessage) -> StoreResult<()> {
        self.contact_messages.insert(message.id, message.clone());
        Ok(())
    }

    fn list_contact_messages(&self, submission_id: Uuid) -> StoreResult<Vec<ContactMessage>> {
        let mut messages = collect(&self.contact_messages, |m| m.submission_id == submission_id);
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}
