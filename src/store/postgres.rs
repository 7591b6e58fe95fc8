use super::{Store, StoreError, StoreResult};
use crate::db::{self, PgPool, PgPooled};
use crate::models::{
    Budget, BudgetAccount, BudgetLine, Category, ContactMessage, ContactStatus,
    ContactSubmission, Debt, DebtPlanning, IncomeSource, Invitation, Member, PaycheckAllocation,
    Session, SupportTicket, TicketComment, TicketFilter, Transaction, TransactionFilter, User,
};
use crate::month::YearMonth;
use crate::schema::{
    account_members, budget_accounts, budget_lines, budgets, categories, contact_messages,
    contact_submissions, debt_planning, debts, income_sources, invitations,
    paycheck_allocations, sessions, support_tickets, ticket_comments, transactions, users,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::str::FromStr;
use uuid::Uuid;

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

fn parse<T: FromStr<Err = String>>(raw: &str) -> StoreResult<T> {
    raw.parse().map_err(StoreError::Backend)
}

fn parse_opt<T: FromStr<Err = String>>(raw: Option<&str>) -> StoreResult<Option<T>> {
    raw.map(parse).transpose()
}

/// Diesel-backed store over a Postgres pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Builds the pool and brings the schema up to date.
    pub fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = db::init_pool(database_url)?;
        db::run_migrations(&pool)?;
        Ok(PgStore { pool })
    }

    fn conn(&self) -> StoreResult<PgPooled> {
        self.pool
            .get()
            .map_err(|e| StoreError::Backend(format!("DB Connection error: {}", e)))
    }
}

// --- Row types: one per table, text columns carry enums and months ---

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        UserRow {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            is_admin: u.is_admin,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            is_admin: r.is_admin,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = sessions)]
#[diesel(primary_key(token))]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct SessionRow {
    token: String,
    user_id: Uuid,
    created_at: NaiveDateTime,
    expires_at: NaiveDateTime,
}

impl From<SessionRow> for Session {
    fn from(r: SessionRow) -> Self {
        Session {
            token: r.token,
            user_id: r.user_id,
            created_at: r.created_at,
            expires_at: r.expires_at,
        }
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = budget_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AccountRow {
    id: Uuid,
    name: String,
    created_by: Uuid,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<AccountRow> for BudgetAccount {
    fn from(r: AccountRow) -> Self {
        BudgetAccount {
            id: r.id,
            name: r.name,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = account_members)]
#[diesel(primary_key(account_id, user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct MemberRow {
    account_id: Uuid,
    user_id: Uuid,
    role: String,
    joined_at: NaiveDateTime,
}

impl TryFrom<MemberRow> for Member {
    type Error = StoreError;

    fn try_from(r: MemberRow) -> StoreResult<Self> {
        Ok(Member {
            account_id: r.account_id,
            user_id: r.user_id,
            role: parse(&r.role)?,
            joined_at: r.joined_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = invitations)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct InvitationRow {
    id: Uuid,
    account_id: Uuid,
    email: String,
    token: String,
    status: String,
    invited_by: Uuid,
    created_at: NaiveDateTime,
    expires_at: NaiveDateTime,
    accepted_at: Option<NaiveDateTime>,
}

impl From<&Invitation> for InvitationRow {
    fn from(i: &Invitation) -> Self {
        InvitationRow {
            id: i.id,
            account_id: i.account_id,
            email: i.email.clone(),
            token: i.token.clone(),
            status: i.status.as_str().to_string(),
            invited_by: i.invited_by,
            created_at: i.created_at,
            expires_at: i.expires_at,
            accepted_at: i.accepted_at,
        }
    }
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = StoreError;

    fn try_from(r: InvitationRow) -> StoreResult<Self> {
        Ok(Invitation {
            id: r.id,
            account_id: r.account_id,
            email: r.email,
            token: r.token,
            status: parse(&r.status)?,
            invited_by: r.invited_by,
            created_at: r.created_at,
            expires_at: r.expires_at,
            accepted_at: r.accepted_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct CategoryRow {
    id: Uuid,
    account_id: Uuid,
    name: String,
    kind: String,
    created_at: NaiveDateTime,
}

impl TryFrom<CategoryRow> for Category {
    type Error = StoreError;

    fn try_from(r: CategoryRow) -> StoreResult<Self> {
        Ok(Category {
            id: r.id,
            account_id: r.account_id,
            name: r.name,
            kind: parse(&r.kind)?,
            created_at: r.created_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = budgets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct BudgetRow {
    id: Uuid,
    account_id: Uuid,
    month: String,
    created_at: NaiveDateTime,
}

impl TryFrom<BudgetRow> for Budget {
    type Error = StoreError;

    fn try_from(r: BudgetRow) -> StoreResult<Self> {
        Ok(Budget {
            id: r.id,
            account_id: r.account_id,
            month: parse(&r.month)?,
            created_at: r.created_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = budget_lines)]
#[diesel(primary_key(budget_id, category_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct BudgetLineRow {
    budget_id: Uuid,
    category_id: Uuid,
    planned_cents: i64,
}

impl From<BudgetLineRow> for BudgetLine {
    fn from(r: BudgetLineRow) -> Self {
        BudgetLine {
            budget_id: r.budget_id,
            category_id: r.category_id,
            planned_cents: r.planned_cents,
        }
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = transactions)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct TransactionRow {
    id: Uuid,
    account_id: Uuid,
    date: NaiveDate,
    description: String,
    amount_cents: i64,
    kind: String,
    category_id: Option<Uuid>,
    debt_id: Option<Uuid>,
    source: String,
    external_id: Option<String>,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        TransactionRow {
            id: t.id,
            account_id: t.account_id,
            date: t.date,
            description: t.description.clone(),
            amount_cents: t.amount_cents,
            kind: t.kind.as_str().to_string(),
            category_id: t.category_id,
            debt_id: t.debt_id,
            source: t.source.as_str().to_string(),
            external_id: t.external_id.clone(),
            notes: t.notes.clone(),
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(r: TransactionRow) -> StoreResult<Self> {
        Ok(Transaction {
            id: r.id,
            account_id: r.account_id,
            date: r.date,
            description: r.description,
            amount_cents: r.amount_cents,
            kind: parse(&r.kind)?,
            category_id: r.category_id,
            debt_id: r.debt_id,
            source: parse(&r.source)?,
            external_id: r.external_id,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = income_sources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct IncomeSourceRow {
    id: Uuid,
    account_id: Uuid,
    name: String,
    amount_cents: i64,
    frequency: String,
    next_pay_date: NaiveDate,
    active: bool,
    created_at: NaiveDateTime,
}

impl TryFrom<IncomeSourceRow> for IncomeSource {
    type Error = StoreError;

    fn try_from(r: IncomeSourceRow) -> StoreResult<Self> {
        Ok(IncomeSource {
            id: r.id,
            account_id: r.account_id,
            name: r.name,
            amount_cents: r.amount_cents,
            frequency: parse(&r.frequency)?,
            next_pay_date: r.next_pay_date,
            active: r.active,
            created_at: r.created_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = debts)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct DebtRow {
    id: Uuid,
    account_id: Uuid,
    name: String,
    amount_cents: i64,
    due_day: i32,
    category_id: Option<Uuid>,
    start_month: String,
    end_month: Option<String>,
    active: bool,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<&Debt> for DebtRow {
    fn from(d: &Debt) -> Self {
        DebtRow {
            id: d.id,
            account_id: d.account_id,
            name: d.name.clone(),
            amount_cents: d.amount_cents,
            due_day: d.due_day as i32,
            category_id: d.category_id,
            start_month: d.start_month.to_string(),
            end_month: d.end_month.map(|m| m.to_string()),
            active: d.active,
            notes: d.notes.clone(),
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl TryFrom<DebtRow> for Debt {
    type Error = StoreError;

    fn try_from(r: DebtRow) -> StoreResult<Self> {
        Ok(Debt {
            id: r.id,
            account_id: r.account_id,
            name: r.name,
            amount_cents: r.amount_cents,
            due_day: u32::try_from(r.due_day)
                .map_err(|_| StoreError::Backend(format!("invalid due_day {}", r.due_day)))?,
            category_id: r.category_id,
            start_month: parse(&r.start_month)?,
            end_month: parse_opt(r.end_month.as_deref())?,
            active: r.active,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = debt_planning)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct PlanningRow {
    id: Uuid,
    account_id: Uuid,
    debt_id: Uuid,
    month: String,
    amount_cents: i64,
    due_date: NaiveDate,
    paid_on: Option<NaiveDate>,
    transaction_id: Option<Uuid>,
    created_at: NaiveDateTime,
}

impl From<&DebtPlanning> for PlanningRow {
    fn from(p: &DebtPlanning) -> Self {
        PlanningRow {
            id: p.id,
            account_id: p.account_id,
            debt_id: p.debt_id,
            month: p.month.to_string(),
            amount_cents: p.amount_cents,
            due_date: p.due_date,
            paid_on: p.paid_on,
            transaction_id: p.transaction_id,
            created_at: p.created_at,
        }
    }
}

impl TryFrom<PlanningRow> for DebtPlanning {
    type Error = StoreError;

    fn try_from(r: PlanningRow) -> StoreResult<Self> {
        Ok(DebtPlanning {
            id: r.id,
            account_id: r.account_id,
            debt_id: r.debt_id,
            month: parse(&r.month)?,
            amount_cents: r.amount_cents,
            due_date: r.due_date,
            paid_on: r.paid_on,
            transaction_id: r.transaction_id,
            created_at: r.created_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = paycheck_allocations)]
#[diesel(primary_key(planning_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AllocationRow {
    planning_id: Uuid,
    account_id: Uuid,
    paycheck_date: NaiveDate,
    amount_cents: i64,
    created_at: NaiveDateTime,
}

impl From<AllocationRow> for PaycheckAllocation {
    fn from(r: AllocationRow) -> Self {
        PaycheckAllocation {
            planning_id: r.planning_id,
            account_id: r.account_id,
            paycheck_date: r.paycheck_date,
            amount_cents: r.amount_cents,
            created_at: r.created_at,
        }
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = support_tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct TicketRow {
    id: Uuid,
    user_id: Uuid,
    subject: String,
    description: String,
    category: String,
    priority: String,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<TicketRow> for SupportTicket {
    type Error = StoreError;

    fn try_from(r: TicketRow) -> StoreResult<Self> {
        Ok(SupportTicket {
            id: r.id,
            user_id: r.user_id,
            subject: r.subject,
            description: r.description,
            category: parse(&r.category)?,
            priority: parse(&r.priority)?,
            status: parse(&r.status)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = ticket_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct CommentRow {
    id: Uuid,
    ticket_id: Uuid,
    author_id: Uuid,
    body: String,
    staff: bool,
    created_at: NaiveDateTime,
}

impl From<CommentRow> for TicketComment {
    fn from(r: CommentRow) -> Self {
        TicketComment {
            id: r.id,
            ticket_id: r.ticket_id,
            author_id: r.author_id,
            body: r.body,
            staff: r.staff,
            created_at: r.created_at,
        }
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = contact_submissions)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    subject: Option<String>,
    message: String,
    status: String,
    thread_token: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<&ContactSubmission> for ContactRow {
    fn from(c: &ContactSubmission) -> Self {
        ContactRow {
            id: c.id,
            name: c.name.clone(),
            email: c.email.clone(),
            subject: c.subject.clone(),
            message: c.message.clone(),
            status: c.status.as_str().to_string(),
            thread_token: c.thread_token.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl TryFrom<ContactRow> for ContactSubmission {
    type Error = StoreError;

    fn try_from(r: ContactRow) -> StoreResult<Self> {
        Ok(ContactSubmission {
            id: r.id,
            name: r.name,
            email: r.email,
            subject: r.subject,
            message: r.message,
            status: parse(&r.status)?,
            thread_token: r.thread_token,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = contact_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ContactMessageRow {
    id: Uuid,
    submission_id: Uuid,
    direction: String,
    sender: String,
    body: String,
    created_at: NaiveDateTime,
}

impl TryFrom<ContactMessageRow> for ContactMessage {
    type Error = StoreError;

    fn try_from(r: ContactMessageRow) -> StoreResult<Self> {
        Ok(ContactMessage {
            id: r.id,
            submission_id: r.submission_id,
            direction: parse(&r.direction)?,
            sender: r.sender,
            body: r.body,
            created_at: r.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

impl Store for PgStore {
    fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = UserRow::from(user);
        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        let row = users::table
            .find(id)
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .optional()?;
        Ok(row.map(User::from))
    }

    fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        let row = users::table
            .filter(users::username.eq(username.to_lowercase()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .optional()?;
        Ok(row.map(User::from))
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        let row = users::table
            .filter(users::email.eq(email.to_lowercase()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .optional()?;
        Ok(row.map(User::from))
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut conn = self.conn()?;
        let rows = users::table
            .order(users::created_at.asc())
            .select(UserRow::as_select())
            .load::<UserRow>(&mut conn)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    fn save_session(&self, session: &Session) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = SessionRow {
            token: session.token.clone(),
            user_id: session.user_id,
            created_at: session.created_at,
            expires_at: session.expires_at,
        };
        diesel::insert_into(sessions::table)
            .values(&row)
            .on_conflict(sessions::token)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let mut conn = self.conn()?;
        let row = sessions::table
            .find(token)
            .select(SessionRow::as_select())
            .first::<SessionRow>(&mut conn)
            .optional()?;
        Ok(row.map(Session::from))
    }

    fn delete_session(&self, token: &str) -> StoreResult<()> {
        let mut conn = self.conn()?;
        diesel::delete(sessions::table.filter(sessions::token.eq(token))).execute(&mut conn)?;
        Ok(())
    }

    fn save_account(&self, account: &BudgetAccount) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = AccountRow {
            id: account.id,
            name: account.name.clone(),
            created_by: account.created_by,
            created_at: account.created_at,
            updated_at: account.updated_at,
        };
        diesel::insert_into(budget_accounts::table)
            .values(&row)
            .on_conflict(budget_accounts::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_account(&self, id: Uuid) -> StoreResult<Option<BudgetAccount>> {
        let mut conn = self.conn()?;
        let row = budget_accounts::table
            .find(id)
            .select(AccountRow::as_select())
            .first::<AccountRow>(&mut conn)
            .optional()?;
        Ok(row.map(BudgetAccount::from))
    }

    fn list_accounts(&self) -> StoreResult<Vec<BudgetAccount>> {
        let mut conn = self.conn()?;
        let rows = budget_accounts::table
            .order(budget_accounts::created_at.asc())
            .select(AccountRow::as_select())
            .load::<AccountRow>(&mut conn)?;
        Ok(rows.into_iter().map(BudgetAccount::from).collect())
    }

    fn delete_account(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(budget_accounts::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn save_member(&self, member: &Member) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = MemberRow {
            account_id: member.account_id,
            user_id: member.user_id,
            role: member.role.as_str().to_string(),
            joined_at: member.joined_at,
        };
        diesel::insert_into(account_members::table)
            .values(&row)
            .on_conflict((account_members::account_id, account_members::user_id))
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_member(&self, account_id: Uuid, user_id: Uuid) -> StoreResult<Option<Member>> {
        let mut conn = self.conn()?;
        let row = account_members::table
            .find((account_id, user_id))
            .select(MemberRow::as_select())
            .first::<MemberRow>(&mut conn)
            .optional()?;
        row.map(Member::try_from).transpose()
    }

    fn list_members(&self, account_id: Uuid) -> StoreResult<Vec<Member>> {
        let mut conn = self.conn()?;
        let rows = account_members::table
            .filter(account_members::account_id.eq(account_id))
            .order(account_members::joined_at.asc())
            .select(MemberRow::as_select())
            .load::<MemberRow>(&mut conn)?;
        convert_all(rows)
    }

    fn list_memberships(&self, user_id: Uuid) -> StoreResult<Vec<Member>> {
        let mut conn = self.conn()?;
        let rows = account_members::table
            .filter(account_members::user_id.eq(user_id))
            .order(account_members::joined_at.asc())
            .select(MemberRow::as_select())
            .load::<MemberRow>(&mut conn)?;
        convert_all(rows)
    }

    fn delete_member(&self, account_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted =
            diesel::delete(account_members::table.find((account_id, user_id))).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn save_invitation(&self, invitation: &Invitation) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = InvitationRow::from(invitation);
        diesel::insert_into(invitations::table)
            .values(&row)
            .on_conflict(invitations::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        let mut conn = self.conn()?;
        let row = invitations::table
            .find(id)
            .select(InvitationRow::as_select())
            .first::<InvitationRow>(&mut conn)
            .optional()?;
        row.map(Invitation::try_from).transpose()
    }

    fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        let mut conn = self.conn()?;
        let row = invitations::table
            .filter(invitations::token.eq(token))
            .select(InvitationRow::as_select())
            .first::<InvitationRow>(&mut conn)
            .optional()?;
        row.map(Invitation::try_from).transpose()
    }

    fn list_invitations(&self, account_id: Uuid) -> StoreResult<Vec<Invitation>> {
        let mut conn = self.conn()?;
        let rows = invitations::table
            .filter(invitations::account_id.eq(account_id))
            .order(invitations::created_at.desc())
            .select(InvitationRow::as_select())
            .load::<InvitationRow>(&mut conn)?;
        convert_all(rows)
    }

    fn save_category(&self, category: &Category) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = CategoryRow {
            id: category.id,
            account_id: category.account_id,
            name: category.name.clone(),
            kind: category.kind.as_str().to_string(),
            created_at: category.created_at,
        };
        diesel::insert_into(categories::table)
            .values(&row)
            .on_conflict(categories::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let mut conn = self.conn()?;
        let row = categories::table
            .find(id)
            .select(CategoryRow::as_select())
            .first::<CategoryRow>(&mut conn)
            .optional()?;
        row.map(Category::try_from).transpose()
    }

    fn list_categories(&self, account_id: Uuid) -> StoreResult<Vec<Category>> {
        let mut conn = self.conn()?;
        let rows = categories::table
            .filter(categories::account_id.eq(account_id))
            .select(CategoryRow::as_select())
            .load::<CategoryRow>(&mut conn)?;
        let mut categories: Vec<Category> = convert_all(rows)?;
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(categories::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn save_budget(&self, budget: &Budget) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = BudgetRow {
            id: budget.id,
            account_id: budget.account_id,
            month: budget.month.to_string(),
            created_at: budget.created_at,
        };
        diesel::insert_into(budgets::table)
            .values(&row)
            .on_conflict(budgets::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn find_budget(&self, account_id: Uuid, month: YearMonth) -> StoreResult<Option<Budget>> {
        let mut conn = self.conn()?;
        let row = budgets::table
            .filter(budgets::account_id.eq(account_id))
            .filter(budgets::month.eq(month.to_string()))
            .select(BudgetRow::as_select())
            .first::<BudgetRow>(&mut conn)
            .optional()?;
        row.map(Budget::try_from).transpose()
    }

    fn list_budgets(&self, account_id: Uuid) -> StoreResult<Vec<Budget>> {
        let mut conn = self.conn()?;
        let rows = budgets::table
            .filter(budgets::account_id.eq(account_id))
            .order(budgets::month.asc())
            .select(BudgetRow::as_select())
            .load::<BudgetRow>(&mut conn)?;
        convert_all(rows)
    }

    fn save_budget_line(&self, line: &BudgetLine) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = BudgetLineRow {
            budget_id: line.budget_id,
            category_id: line.category_id,
            planned_cents: line.planned_cents,
        };
        diesel::insert_into(budget_lines::table)
            .values(&row)
            .on_conflict((budget_lines::budget_id, budget_lines::category_id))
            .do_update()
            .set(budget_lines::planned_cents.eq(row.planned_cents))
            .execute(&mut conn)?;
        Ok(())
    }

    fn list_budget_lines(&self, budget_id: Uuid) -> StoreResult<Vec<BudgetLine>> {
        let mut conn = self.conn()?;
        let rows = budget_lines::table
            .filter(budget_lines::budget_id.eq(budget_id))
            .select(BudgetLineRow::as_select())
            .load::<BudgetLineRow>(&mut conn)?;
        Ok(rows.into_iter().map(BudgetLine::from).collect())
    }

    fn delete_budget_line(&self, budget_id: Uuid, category_id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(budget_lines::table.find((budget_id, category_id)))
            .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn save_transaction(&self, transaction: &Transaction) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = TransactionRow::from(transaction);
        diesel::insert_into(transactions::table)
            .values(&row)
            .on_conflict(transactions::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_transaction(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        let mut conn = self.conn()?;
        let row = transactions::table
            .find(id)
            .select(TransactionRow::as_select())
            .first::<TransactionRow>(&mut conn)
            .optional()?;
        row.map(Transaction::try_from).transpose()
    }

    fn find_transaction_by_external_id(
        &self,
        account_id: Uuid,
        external_id: &str,
    ) -> StoreResult<Option<Transaction>> {
        let mut conn = self.conn()?;
        let row = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .filter(transactions::external_id.eq(external_id))
            .select(TransactionRow::as_select())
            .first::<TransactionRow>(&mut conn)
            .optional()?;
        row.map(Transaction::try_from).transpose()
    }

    fn list_transactions(
        &self,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        let mut conn = self.conn()?;

        let mut query = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .into_boxed();

        if let Some(month) = filter.month {
            query = query.filter(transactions::date.between(month.first_day(), month.last_day()));
        }
        if let Some(category) = filter.category_id {
            query = query.filter(transactions::category_id.eq(category));
        }
        if let Some(debt) = filter.debt_id {
            query = query.filter(transactions::debt_id.eq(debt));
        }
        if let Some(source) = filter.source {
            query = query.filter(transactions::source.eq(source.as_str()));
        }
        if let Some(ref search) = filter.search {
            query = query.filter(transactions::description.ilike(format!("%{}%", search)));
        }

        let rows = query
            .order((transactions::date.desc(), transactions::created_at.desc()))
            .select(TransactionRow::as_select())
            .load::<TransactionRow>(&mut conn)?;
        convert_all(rows)
    }

    fn count_transactions(&self) -> StoreResult<i64> {
        let mut conn = self.conn()?;
        let count = transactions::table.count().get_result::<i64>(&mut conn)?;
        Ok(count)
    }

    fn delete_transaction(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(transactions::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn save_income_source(&self, source: &IncomeSource) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = IncomeSourceRow {
            id: source.id,
            account_id: source.account_id,
            name: source.name.clone(),
            amount_cents: source.amount_cents,
            frequency: source.frequency.as_str().to_string(),
            next_pay_date: source.next_pay_date,
            active: source.active,
            created_at: source.created_at,
        };
        diesel::insert_into(income_sources::table)
            .values(&row)
            .on_conflict(income_sources::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_income_source(&self, id: Uuid) -> StoreResult<Option<IncomeSource>> {
        let mut conn = self.conn()?;
        let row = income_sources::table
            .find(id)
            .select(IncomeSourceRow::as_select())
            .first::<IncomeSourceRow>(&mut conn)
            .optional()?;
        row.map(IncomeSource::try_from).transpose()
    }

    fn list_income_sources(&self, account_id: Uuid) -> StoreResult<Vec<IncomeSource>> {
        let mut conn = self.conn()?;
        let rows = income_sources::table
            .filter(income_sources::account_id.eq(account_id))
            .order(income_sources::created_at.asc())
            .select(IncomeSourceRow::as_select())
            .load::<IncomeSourceRow>(&mut conn)?;
        convert_all(rows)
    }

    fn delete_income_source(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(income_sources::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn save_debt(&self, debt: &Debt) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = DebtRow::from(debt);
        diesel::insert_into(debts::table)
            .values(&row)
            .on_conflict(debts::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_debt(&self, id: Uuid) -> StoreResult<Option<Debt>> {
        let mut conn = self.conn()?;
        let row = debts::table
            .find(id)
            .select(DebtRow::as_select())
            .first::<DebtRow>(&mut conn)
            .optional()?;
        row.map(Debt::try_from).transpose()
    }

    fn list_debts(&self, account_id: Uuid) -> StoreResult<Vec<Debt>> {
        let mut conn = self.conn()?;
        let rows = debts::table
            .filter(debts::account_id.eq(account_id))
            .order((debts::due_day.asc(), debts::name.asc()))
            .select(DebtRow::as_select())
            .load::<DebtRow>(&mut conn)?;
        convert_all(rows)
    }

    fn delete_debt(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(debts::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn save_planning(&self, planning: &DebtPlanning) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = PlanningRow::from(planning);
        diesel::insert_into(debt_planning::table)
            .values(&row)
            .on_conflict(debt_planning::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_planning(&self, id: Uuid) -> StoreResult<Option<DebtPlanning>> {
        let mut conn = self.conn()?;
        let row = debt_planning::table
            .find(id)
            .select(PlanningRow::as_select())
            .first::<PlanningRow>(&mut conn)
            .optional()?;
        row.map(DebtPlanning::try_from).transpose()
    }

    fn find_planning(&self, debt_id: Uuid, month: YearMonth) -> StoreResult<Option<DebtPlanning>> {
        let mut conn = self.conn()?;
        let row = debt_planning::table
            .filter(debt_planning::debt_id.eq(debt_id))
            .filter(debt_planning::month.eq(month.to_string()))
            .select(PlanningRow::as_select())
            .first::<PlanningRow>(&mut conn)
            .optional()?;
        row.map(DebtPlanning::try_from).transpose()
    }

    fn list_planning(
        &self,
        account_id: Uuid,
        from: YearMonth,
        to: YearMonth,
    ) -> StoreResult<Vec<DebtPlanning>> {
        let mut conn = self.conn()?;
        // YYYY-MM compares correctly as text.
        let rows = debt_planning::table
            .filter(debt_planning::account_id.eq(account_id))
            .filter(debt_planning::month.ge(from.to_string()))
            .filter(debt_planning::month.le(to.to_string()))
            .order(debt_planning::due_date.asc())
            .select(PlanningRow::as_select())
            .load::<PlanningRow>(&mut conn)?;
        convert_all(rows)
    }

    fn save_allocation(&self, allocation: &PaycheckAllocation) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = AllocationRow {
            planning_id: allocation.planning_id,
            account_id: allocation.account_id,
            paycheck_date: allocation.paycheck_date,
            amount_cents: allocation.amount_cents,
            created_at: allocation.created_at,
        };
        diesel::insert_into(paycheck_allocations::table)
            .values(&row)
            .on_conflict(paycheck_allocations::planning_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_allocation(&self, planning_id: Uuid) -> StoreResult<Option<PaycheckAllocation>> {
        let mut conn = self.conn()?;
        let row = paycheck_allocations::table
            .find(planning_id)
            .select(AllocationRow::as_select())
            .first::<AllocationRow>(&mut conn)
            .optional()?;
        Ok(row.map(PaycheckAllocation::from))
    }

    fn list_allocations(&self, account_id: Uuid) -> StoreResult<Vec<PaycheckAllocation>> {
        let mut conn = self.conn()?;
        let rows = paycheck_allocations::table
            .filter(paycheck_allocations::account_id.eq(account_id))
            .order(paycheck_allocations::paycheck_date.asc())
            .select(AllocationRow::as_select())
            .load::<AllocationRow>(&mut conn)?;
        Ok(rows.into_iter().map(PaycheckAllocation::from).collect())
    }

    fn delete_allocation(&self, planning_id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted =
            diesel::delete(paycheck_allocations::table.find(planning_id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn save_ticket(&self, ticket: &SupportTicket) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = TicketRow {
            id: ticket.id,
            user_id: ticket.user_id,
            subject: ticket.subject.clone(),
            description: ticket.description.clone(),
            category: ticket.category.as_str().to_string(),
            priority: ticket.priority.as_str().to_string(),
            status: ticket.status.as_str().to_string(),
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        };
        diesel::insert_into(support_tickets::table)
            .values(&row)
            .on_conflict(support_tickets::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_ticket(&self, id: Uuid) -> StoreResult<Option<SupportTicket>> {
        let mut conn = self.conn()?;
        let row = support_tickets::table
            .find(id)
            .select(TicketRow::as_select())
            .first::<TicketRow>(&mut conn)
            .optional()?;
        row.map(SupportTicket::try_from).transpose()
    }

    fn list_tickets(&self, filter: &TicketFilter) -> StoreResult<Vec<SupportTicket>> {
        let mut conn = self.conn()?;

        let mut query = support_tickets::table.into_boxed();
        if let Some(user_id) = filter.user_id {
            query = query.filter(support_tickets::user_id.eq(user_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(support_tickets::status.eq(status.as_str()));
        }

        let rows = query
            .order(support_tickets::updated_at.desc())
            .select(TicketRow::as_select())
            .load::<TicketRow>(&mut conn)?;
        convert_all(rows)
    }

    fn save_comment(&self, comment: &TicketComment) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = CommentRow {
            id: comment.id,
            ticket_id: comment.ticket_id,
            author_id: comment.author_id,
            body: comment.body.clone(),
            staff: comment.staff,
            created_at: comment.created_at,
        };
        diesel::insert_into(ticket_comments::table)
            .values(&row)
            .on_conflict(ticket_comments::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn list_comments(&self, ticket_id: Uuid) -> StoreResult<Vec<TicketComment>> {
        let mut conn = self.conn()?;
        let rows = ticket_comments::table
            .filter(ticket_comments::ticket_id.eq(ticket_id))
            .order(ticket_comments::created_at.asc())
            .select(CommentRow::as_select())
            .load::<CommentRow>(&mut conn)?;
        Ok(rows.into_iter().map(TicketComment::from).collect())
    }

    fn save_contact(&self, submission: &ContactSubmission) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = ContactRow::from(submission);
        diesel::insert_into(contact_submissions::table)
            .values(&row)
            .on_conflict(contact_submissions::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_contact(&self, id: Uuid) -> StoreResult<Option<ContactSubmission>> {
        let mut conn = self.conn()?;
        let row = contact_submissions::table
            .find(id)
            .select(ContactRow::as_select())
            .first::<ContactRow>(&mut conn)
            .optional()?;
        row.map(ContactSubmission::try_from).transpose()
    }

    fn find_contact_by_thread(
        &self,
        thread_token: &str,
    ) -> StoreResult<Option<ContactSubmission>> {
        let mut conn = self.conn()?;
        let row = contact_submissions::table
            .filter(contact_submissions::thread_token.eq(thread_token))
            .select(ContactRow::as_select())
            .first::<ContactRow>(&mut conn)
            .optional()?;
        row.map(ContactSubmission::try_from).transpose()
    }

    fn list_contacts(&self, status: Option<ContactStatus>) -> StoreResult<Vec<ContactSubmission>> {
        let mut conn = self.conn()?;

        let mut query = contact_submissions::table.into_boxed();
        if let Some(status) = status {
            query = query.filter(contact_submissions::status.eq(status.as_str()));
        }

        let rows = query
            .order(contact_submissions::created_at.desc())
            .select(ContactRow::as_select())
            .load::<ContactRow>(&mut conn)?;
        convert_all(rows)
    }

    fn save_contact_message(&self, message: &ContactMessage) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let row = ContactMessageRow {
            id: message.id,
            submission_id: message.submission_id,
            direction: message.direction.as_str().to_string(),
            sender: message.sender.clone(),
            body: message.body.clone(),
            created_at: message.created_at,
        };
        diesel::insert_into(contact_messages::table)
            .values(&row)
            .on_conflict(contact_messages::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    fn list_contact_messages(&self, submission_id: Uuid) -> StoreResult<Vec<ContactMessage>> {
        let mut conn = self.conn()?;
        let rows = contact_messages::table
            .filter(contact_messages::submission_id.eq(submission_id))
            .order(contact_messages::created_at.asc())
            .select(ContactMessageRow::as_select())
            .load::<ContactMessageRow>(&mut conn)?;
        convert_all(rows)
    }
}
