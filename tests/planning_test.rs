mod common;

use common::*;
use rocket::http::{Method, Status};
use serde_json::{json, Value};

struct Household {
    app: TestApp,
    token: String,
    account_id: String,
    salary_id: String,
    rent_id: String,
}

impl Household {
    /// Semimonthly salary from 2024-03-15 and three monthly debts starting in March.
    fn new() -> Self {
        let app = test_app();
        let (_, token) = signup(&app.client, "victor");
        let account_id = create_account(&app.client, &token, "Household");
        let mut h = Household {
            app,
            token,
            account_id,
            salary_id: String::new(),
            rent_id: String::new(),
        };
        let (status, salary) = h.post(
            "/income",
            json!({ "name": "Salary", "amount_cents": 200000, "frequency": "semimonthly", "next_pay_date": "2024-03-15" }),
        );
        assert_eq!(status, Status::Ok, "{}", salary);
        h.salary_id = salary["id"].as_str().unwrap().to_string();
        h.rent_id = h.debt("Rent", 120000, 1);
        h.debt("Phone", 5000, 20);
        h.debt("Card", 30000, 31);
        h
    }

    fn uri(&self, path: &str) -> String {
        format!("/api/accounts/{}{}", self.account_id, path)
    }

    fn get(&self, path: &str) -> (Status, Value) {
        get(&self.app.client, &self.uri(path), &self.token)
    }

    fn post(&self, path: &str, body: Value) -> (Status, Value) {
        post(&self.app.client, &self.uri(path), &self.token, body)
    }

    fn post_empty(&self, path: &str) -> (Status, Value) {
        call(&self.app.client, Method::Post, &self.uri(path), Some(&self.token), None)
    }

    fn put(&self, path: &str, body: Value) -> (Status, Value) {
        put(&self.app.client, &self.uri(path), &self.token, body)
    }

    fn delete(&self, path: &str) -> (Status, Value) {
        delete(&self.app.client, &self.uri(path), &self.token)
    }

    fn debt(&self, name: &str, amount: i64, due_day: u32) -> String {
        let (status, debt) = self.post(
            "/debts",
            json!({ "name": name, "amount_cents": amount, "due_day": due_day, "start_month": "2024-03" }),
        );
        assert_eq!(status, Status::Ok, "{}", debt);
        debt["id"].as_str().unwrap().to_string()
    }

    fn row(&self, month: &str, debt_name: &str) -> Value {
        let (status, plan) = self.get(&format!("/planning/{}", month));
        assert_eq!(status, Status::Ok, "{}", plan);
        plan["rows"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["debt_name"] == debt_name)
            .cloned()
            .unwrap()
    }
}

#[test]
fn test_debt_validation() {
    let h = Household::new();
    let (status, _) = h.post("/debts", json!({ "name": "Bad", "amount_cents": 100, "due_day": 32 }));
    assert_eq!(status, Status::UnprocessableEntity);
    let (status, _) = h.post(
        "/debts",
        json!({ "name": "Bad", "amount_cents": 100, "due_day": 5, "start_month": "2024-05", "end_month": "2024-04" }),
    );
    assert_eq!(status, Status::UnprocessableEntity);

    // Without a start month the template starts in the current month.
    let (status, debt) = h.post("/debts", json!({ "name": "Gym", "amount_cents": 2500, "due_day": 3 }));
    assert_eq!(status, Status::Ok);
    assert_eq!(debt["start_month"], "2024-03");
    assert_eq!(debt["active"], true);
}

#[test]
fn test_month_plan_generates_rows() {
    let h = Household::new();
    let (status, plan) = h.get("/planning/2024-04");
    assert_eq!(status, Status::Ok);
    let rows = plan["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(plan["total_cents"], 155000);

    let card = rows.iter().find(|r| r["debt_name"] == "Card").unwrap();
    assert_eq!(card["due_date"], "2024-04-30");
    assert_eq!(card["status"], "unallocated");

    // Rows outside the template's range are not generated.
    let (_, february) = h.get("/planning/2024-02");
    assert!(february["rows"].as_array().unwrap().is_empty());

    // Asking twice does not duplicate rows.
    let (_, again) = h.get("/planning/2024-04");
    assert_eq!(again["rows"].as_array().unwrap().len(), 3);

    // Today is 2024-03-10, so March rent is overdue.
    let rent = h.row("2024-03", "Rent");
    assert_eq!(rent["status"], "overdue");
}

#[test]
fn test_edit_pay_and_unpay_row() {
    let h = Household::new();
    let phone = h.row("2024-03", "Phone");
    let planning_id = phone["id"].as_str().unwrap().to_string();
    let row_path = format!("/planning/rows/{}", planning_id);

    let (status, edited) = h.put(&row_path, json!({ "amount_cents": 6500, "due_date": "2024-03-22" }));
    assert_eq!(status, Status::Ok);
    assert_eq!(edited["amount_cents"], 6500);
    assert_eq!(edited["due_date"], "2024-03-22");

    let (status, paid) = h.post(&format!("{}/pay", row_path), json!({ "create_transaction": true }));
    assert_eq!(status, Status::Ok);
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["paid_on"], TODAY);
    let transaction_id = paid["transaction_id"].as_str().unwrap().to_string();

    let (_, transaction) = h.get(&format!("/transactions/{}", transaction_id));
    assert_eq!(transaction["amount_cents"], 6500);
    assert_eq!(transaction["description"], "Phone");
    assert_eq!(transaction["kind"], "expense");

    let (status, body) = h.post_empty(&format!("{}/pay", row_path));
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Payment already recorded");

    let (status, _) = h.put(&row_path, json!({ "amount_cents": 7000 }));
    assert_eq!(status, Status::Conflict);

    let (status, unpaid) = h.post_empty(&format!("{}/unpay", row_path));
    assert_eq!(status, Status::Ok);
    assert!(unpaid["paid_on"].is_null());
    let (status, _) = h.get(&format!("/transactions/{}", transaction_id));
    assert_eq!(status, Status::NotFound);
}

#[test]
fn test_paycheck_plan_groups_and_windows() {
    let h = Household::new();
    // A second source paid on the same day merges into one paycheck.
    h.post(
        "/income",
        json!({ "name": "Side job", "amount_cents": 30000, "frequency": "monthly", "next_pay_date": "2024-03-15" }),
    );

    let (status, plan) = h.get("/paychecks?from=2024-03&months=2");
    assert_eq!(status, Status::Ok, "{}", plan);
    assert_eq!(plan["from"], "2024-03");
    assert_eq!(plan["to"], "2024-04");
    let dates: Vec<&str> = plan["paychecks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-03-15", "2024-03-31", "2024-04-15", "2024-04-30"]);
    assert_eq!(plan["paychecks"][0]["total_cents"], 230000);
    assert_eq!(plan["paychecks"][0]["sources"].as_array().unwrap().len(), 2);
    assert_eq!(plan["total_income_cents"], 860000);
    assert_eq!(plan["unallocated"].as_array().unwrap().len(), 6);
    assert_eq!(plan["total_debt_cents"], 310000);

    let (status, body) = h.get("/paychecks?months=13");
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error"], "months must be between 1 and 12");
    let (status, _) = h.get("/paychecks?months=0");
    assert_eq!(status, Status::UnprocessableEntity);

    // The default window starts in the current month.
    let (_, default_plan) = h.get("/paychecks");
    assert_eq!(default_plan["from"], "2024-03");
    assert_eq!(default_plan["to"], "2024-05");
}

#[test]
fn test_manual_assignment_and_timing() {
    let h = Household::new();
    let rent_april = h.row("2024-04", "Rent");
    let rent_march = h.row("2024-03", "Rent");

    let (status, body) = h.post(
        "/paychecks/assign",
        json!({ "planning_id": rent_april["id"], "paycheck_date": "2024-03-16" }),
    );
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error"], "No paycheck on 2024-03-16");

    let (status, ahead) = h.post(
        "/paychecks/assign",
        json!({ "planning_id": rent_april["id"], "paycheck_date": "2024-03-31" }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(ahead["timing"], json!({ "kind": "months_ahead", "months": 1 }));
    assert_eq!(ahead["amount_cents"], 120000);

    let (status, late) = h.post(
        "/paychecks/assign",
        json!({ "planning_id": rent_march["id"], "paycheck_date": "2024-03-15", "amount_cents": 60000 }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(late["timing"], json!({ "kind": "past_due", "days": 14 }));

    let (status, _) = h.post(
        "/paychecks/assign",
        json!({ "planning_id": rent_march["id"], "paycheck_date": "2024-03-15", "amount_cents": 130000 }),
    );
    assert_eq!(status, Status::UnprocessableEntity);

    let (_, plan) = h.get("/paychecks?from=2024-03&months=2");
    let march_end = &plan["paychecks"][1];
    assert_eq!(march_end["date"], "2024-03-31");
    assert_eq!(march_end["allocated_cents"], 120000);
    assert_eq!(march_end["remaining_cents"], 80000);
    assert_eq!(plan["total_allocated_cents"], 180000);
    assert_eq!(h.row("2024-04", "Rent")["status"], "allocated");

    let unassign_path = format!("/paychecks/assign/{}", rent_april["id"].as_str().unwrap());
    let (status, _) = h.delete(&unassign_path);
    assert_eq!(status, Status::NoContent);
    let (status, _) = h.delete(&unassign_path);
    assert_eq!(status, Status::NotFound);
}

#[test]
fn test_paid_rows_cannot_be_reassigned() {
    let h = Household::new();
    let phone = h.row("2024-03", "Phone");
    let (status, _) = h.post_empty(&format!("/planning/rows/{}/pay", phone["id"].as_str().unwrap()));
    assert_eq!(status, Status::Ok);

    let (status, body) = h.post(
        "/paychecks/assign",
        json!({ "planning_id": phone["id"], "paycheck_date": "2024-03-15" }),
    );
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Cannot reassign a paid debt");
}

#[test]
fn test_auto_assign_fills_latest_fitting_paycheck() {
    let h = Household::new();
    let (status, report) = h.post_empty("/paychecks/auto-assign?from=2024-03&months=2");
    assert_eq!(status, Status::Ok, "{}", report);

    let assigned = report["assigned"].as_array().unwrap();
    assert_eq!(assigned.len(), 5);
    let unassigned = report["unassigned"].as_array().unwrap();
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0]["debt_name"], "Rent");
    assert_eq!(unassigned[0]["month"], "2024-03");

    let find = |name: &str, month: &str| {
        assigned
            .iter()
            .find(|a| a["debt_name"] == name && a["month"] == month)
            .cloned()
            .unwrap()
    };
    assert_eq!(find("Phone", "2024-03")["paycheck_date"], "2024-03-15");
    assert_eq!(find("Card", "2024-03")["paycheck_date"], "2024-03-31");
    let rent_april = find("Rent", "2024-04");
    assert_eq!(rent_april["paycheck_date"], "2024-03-31");
    assert_eq!(rent_april["timing"]["kind"], "months_ahead");
    assert_eq!(find("Card", "2024-04")["paycheck_date"], "2024-04-30");

    // Running again assigns nothing new.
    let (_, second) = h.post_empty("/paychecks/auto-assign?from=2024-03&months=2");
    assert!(second["assigned"].as_array().unwrap().is_empty());
    assert_eq!(second["unassigned"].as_array().unwrap().len(), 1);
}

#[test]
fn test_schedule_change_orphans_allocations() {
    let h = Household::new();
    let phone = h.row("2024-03", "Phone");
    h.post(
        "/paychecks/assign",
        json!({ "planning_id": phone["id"], "paycheck_date": "2024-03-15" }),
    );

    let (status, _) = h.put(
        &format!("/income/{}", h.salary_id),
        json!({ "name": "Salary", "amount_cents": 200000, "frequency": "semimonthly", "next_pay_date": "2024-04-15" }),
    );
    assert_eq!(status, Status::Ok);

    let (_, plan) = h.get("/paychecks?from=2024-03&months=2");
    let orphaned = plan["orphaned"].as_array().unwrap();
    assert_eq!(orphaned.len(), 1);
    assert_eq!(orphaned[0]["paycheck_date"], "2024-03-15");
    assert_eq!(plan["paychecks"][0]["date"], "2024-04-15");
}

#[test]
fn test_deleting_debt_removes_its_planning() {
    let h = Household::new();
    let rent = h.row("2024-03", "Rent");
    h.post(
        "/paychecks/assign",
        json!({ "planning_id": rent["id"], "paycheck_date": "2024-03-15" }),
    );

    let (status, _) = h.delete(&format!("/debts/{}", h.rent_id));
    assert_eq!(status, Status::NoContent);

    let (_, plan) = h.get("/planning/2024-03");
    assert_eq!(plan["rows"].as_array().unwrap().len(), 2);
    let (_, paychecks) = h.get("/paychecks?from=2024-03&months=1");
    assert_eq!(paychecks["total_allocated_cents"], 0);
}

#[test]
fn test_malformed_payment_is_rejected() {
    let h = Household::new();
    let phone = h.row("2024-03", "Phone");
    let pay_path = format!("/planning/rows/{}/pay", phone["id"].as_str().unwrap());

    let (status, _) = h.post(&pay_path, json!({ "paid_on": "2024-13-45", "create_transaction": true }));
    assert_eq!(status, Status::UnprocessableEntity);

    let phone = h.row("2024-03", "Phone");
    assert!(phone["paid_on"].is_null());
    assert_ne!(phone["status"], "paid");
    let (_, transactions) = h.get("/transactions");
    assert!(transactions.as_array().unwrap().is_empty());

    // An explicit date is kept.
    let (status, paid) = h.post(&pay_path, json!({ "paid_on": "2024-03-08" }));
    assert_eq!(status, Status::Ok);
    assert_eq!(paid["paid_on"], "2024-03-08");
    assert!(paid["transaction_id"].is_null());
}

#[test]
fn test_auto_assign_respects_existing_allocations() {
    let h = Household::new();
    h.debt("Car", 90000, 31);

    // April rent taken from the March 31 paycheck leaves 80000 there.
    let rent_april = h.row("2024-04", "Rent");
    let (status, _) = h.post(
        "/paychecks/assign",
        json!({ "planning_id": rent_april["id"], "paycheck_date": "2024-03-31" }),
    );
    assert_eq!(status, Status::Ok);

    let (status, report) = h.post_empty("/paychecks/auto-assign?from=2024-03&months=2");
    assert_eq!(status, Status::Ok, "{}", report);
    let assigned = report["assigned"].as_array().unwrap();
    assert!(assigned.iter().all(|a| a["planning_id"] != rent_april["id"]));

    let find = |name: &str, month: &str| {
        assigned
            .iter()
            .find(|a| a["debt_name"] == name && a["month"] == month)
            .cloned()
            .unwrap()
    };
    // Car (90000) no longer fits on March 31 and falls back to March 15.
    assert_eq!(find("Car", "2024-03")["paycheck_date"], "2024-03-15");
    assert_eq!(find("Card", "2024-03")["paycheck_date"], "2024-03-31");

    let (_, plan) = h.get("/paychecks?from=2024-03&months=2");
    let march_end = &plan["paychecks"][1];
    assert_eq!(march_end["date"], "2024-03-31");
    assert_eq!(march_end["allocated_cents"], 150000);
    assert_eq!(march_end["remaining_cents"], 50000);
    let march_mid = &plan["paychecks"][0];
    assert_eq!(march_mid["allocated_cents"], 95000);
}
