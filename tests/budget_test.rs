mod common;

use common::*;
use rocket::http::{ContentType, Status};
use serde_json::{json, Value};

struct Ledger {
    app: TestApp,
    token: String,
    account_id: String,
}

impl Ledger {
    fn new() -> Self {
        let app = test_app();
        let (_, token) = signup(&app.client, "walter");
        let account_id = create_account(&app.client, &token, "Household");
        Ledger {
            app,
            token,
            account_id,
        }
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

    fn put(&self, path: &str, body: Value) -> (Status, Value) {
        put(&self.app.client, &self.uri(path), &self.token, body)
    }

    fn delete(&self, path: &str) -> (Status, Value) {
        delete(&self.app.client, &self.uri(path), &self.token)
    }

    fn category(&self, name: &str, kind: &str) -> String {
        let (status, body) = self.post("/categories", json!({ "name": name, "kind": kind }));
        assert_eq!(status, Status::Ok, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    fn transaction(&self, body: Value) -> Value {
        let (status, created) = self.post("/transactions", body);
        assert_eq!(status, Status::Ok, "{}", created);
        created
    }
}

#[test]
fn test_category_crud() {
    let l = Ledger::new();
    let groceries = l.category("Groceries", "expense");
    l.category("rent", "expense");

    let (status, body) = l.post("/categories", json!({ "name": "  GROCERIES " }));
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Category already exists");

    let (status, body) = l.post("/categories", json!({ "name": "" }));
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error"], "Category name is required");

    let (_, listed) = l.get("/categories");
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Groceries", "rent"]);

    let (status, _) = l.put(&format!("/categories/{}", groceries), json!({ "name": "Rent" }));
    assert_eq!(status, Status::Conflict);

    let (status, renamed) = l.put(&format!("/categories/{}", groceries), json!({ "name": "Food" }));
    assert_eq!(status, Status::Ok);
    assert_eq!(renamed["name"], "Food");
    assert_eq!(renamed["kind"], "expense");
}

#[test]
fn test_budget_summary_tracks_spending() {
    let l = Ledger::new();
    let groceries = l.category("Groceries", "expense");
    let salary = l.category("Salary", "income");

    let (status, line) = l.put(
        &format!("/budgets/2024-03/lines/{}", groceries),
        json!({ "planned_cents": 40000 }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(line["planned_cents"], 40000);

    let (status, _) = l.put(
        &format!("/budgets/2024-03/lines/{}", groceries),
        json!({ "planned_cents": -1 }),
    );
    assert_eq!(status, Status::UnprocessableEntity);

    l.transaction(json!({ "date": "2024-03-05", "description": "Groceries run", "amount_cents": 12000, "kind": "expense", "category_id": groceries }));
    l.transaction(json!({ "date": "2024-03-07", "description": "Cinema", "amount_cents": 3000, "kind": "expense" }));
    l.transaction(json!({ "date": "2024-03-01", "description": "Paycheck", "amount_cents": 250000, "kind": "income", "category_id": salary }));
    l.transaction(json!({ "date": "2024-02-28", "description": "Groceries", "amount_cents": 5000, "kind": "expense", "category_id": groceries }));

    let (status, summary) = l.get("/budgets/2024-03");
    assert_eq!(status, Status::Ok);
    assert_eq!(summary["month"], "2024-03");
    let lines = summary["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["category_name"], "Groceries");
    assert_eq!(lines[0]["spent_cents"], 12000);
    assert_eq!(lines[0]["remaining_cents"], 28000);
    assert_eq!(summary["total_planned_cents"], 40000);
    assert_eq!(summary["income_cents"], 250000);
    assert_eq!(summary["unbudgeted_spent_cents"], 3000);

    let (_, budgets) = l.get("/budgets");
    assert_eq!(budgets.as_array().unwrap().len(), 1);

    // A month without a budget still reports actuals.
    let (status, february) = l.get("/budgets/2024-02");
    assert_eq!(status, Status::Ok);
    assert!(february["budget_id"].is_null());
    assert_eq!(february["unbudgeted_spent_cents"], 5000);

    let (status, _) = l.delete(&format!("/budgets/2024-03/lines/{}", groceries));
    assert_eq!(status, Status::NoContent);
    let (status, _) = l.delete(&format!("/budgets/2024-03/lines/{}", groceries));
    assert_eq!(status, Status::NotFound);
}

#[test]
fn test_copy_budget_keeps_existing_lines() {
    let l = Ledger::new();
    let groceries = l.category("Groceries", "expense");
    let rent = l.category("Rent", "expense");
    l.put(&format!("/budgets/2024-03/lines/{}", groceries), json!({ "planned_cents": 40000 }));
    l.put(&format!("/budgets/2024-03/lines/{}", rent), json!({ "planned_cents": 120000 }));
    l.put(&format!("/budgets/2024-04/lines/{}", rent), json!({ "planned_cents": 125000 }));

    let (status, summary) = l.post("/budgets/2024-04/copy", json!({ "from": "2024-03" }));
    assert_eq!(status, Status::Ok);
    let lines = summary["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    let rent_line = lines.iter().find(|l| l["category_name"] == "Rent").unwrap();
    assert_eq!(rent_line["planned_cents"], 125000);
    assert_eq!(summary["total_planned_cents"], 165000);

    let (status, _) = l.post("/budgets/2024-05/copy", json!({ "from": "2023-01" }));
    assert_eq!(status, Status::NotFound);
}

#[test]
fn test_transaction_filters_and_validation() {
    let l = Ledger::new();
    let groceries = l.category("Groceries", "expense");

    l.transaction(json!({ "date": "2024-03-01", "description": "Paycheck", "amount_cents": 250000, "kind": "income" }));
    l.transaction(json!({ "date": "2024-03-05", "description": "Groceries run", "amount_cents": 12000, "kind": "expense", "category_id": groceries }));
    l.transaction(json!({ "date": "2024-03-07", "description": "Cinema", "amount_cents": 3000, "kind": "expense" }));
    l.transaction(json!({ "date": "2024-02-20", "description": "Old groceries", "amount_cents": 4000, "kind": "expense", "category_id": groceries }));

    let (_, march) = l.get("/transactions?month=2024-03");
    let descriptions: Vec<&str> = march
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["description"].as_str().unwrap())
        .collect();
    assert_eq!(descriptions, vec!["Cinema", "Groceries run", "Paycheck"]);

    let (_, by_category) = l.get(&format!("/transactions?category_id={}", groceries));
    assert_eq!(by_category.as_array().unwrap().len(), 2);

    let (_, searched) = l.get("/transactions?search=GROC");
    assert_eq!(searched.as_array().unwrap().len(), 2);

    let (_, manual) = l.get("/transactions?source=manual&month=2024-02");
    assert_eq!(manual.as_array().unwrap().len(), 1);

    let (status, _) = l.post(
        "/transactions",
        json!({ "date": "2024-03-08", "description": "Free", "amount_cents": 0, "kind": "expense" }),
    );
    assert_eq!(status, Status::UnprocessableEntity);

    let (status, body) = l.post(
        "/transactions",
        json!({ "date": "2024-03-08", "description": "Lunch", "amount_cents": 900, "kind": "expense", "category_id": uuid::Uuid::new_v4() }),
    );
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error"], "Unknown category");
}

#[test]
fn test_transaction_replace_and_delete() {
    let l = Ledger::new();
    let groceries = l.category("Groceries", "expense");
    let created = l.transaction(json!({ "date": "2024-03-05", "description": "Market", "amount_cents": 1500, "kind": "expense", "notes": "cash" }));
    let path = format!("/transactions/{}", created["id"].as_str().unwrap());

    let (status, replaced) = l.put(
        &path,
        json!({ "date": "2024-03-06", "description": "Farmers market", "amount_cents": 1800, "kind": "expense", "category_id": groceries }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(replaced["description"], "Farmers market");
    assert_eq!(replaced["category_id"], groceries.as_str());
    assert!(replaced["notes"].is_null());
    assert_eq!(replaced["source"], "manual");

    // Deleting the category leaves the transaction uncategorized.
    let (status, _) = l.delete(&format!("/categories/{}", groceries));
    assert_eq!(status, Status::NoContent);
    let (_, fetched) = l.get(&path);
    assert!(fetched["category_id"].is_null());

    let (status, _) = l.delete(&path);
    assert_eq!(status, Status::NoContent);
    let (status, _) = l.get(&path);
    assert_eq!(status, Status::NotFound);
}

#[test]
fn test_webhook_sync_upserts_by_external_id() {
    let l = Ledger::new();
    let groceries = l.category("Groceries", "expense");
    let batch = |amount: i64| {
        json!({
            "account_id": l.account_id,
            "transactions": [
                { "external_id": "ext-1", "date": "2024-03-04", "description": "SUPERMARKET", "amount_cents": amount, "kind": "expense" },
                { "external_id": "ext-2", "date": "2024-03-09", "description": "PENDING CHARGE", "amount_cents": 700, "kind": "expense", "pending": true }
            ]
        })
    };

    let (status, report) = webhook(&l.app.client, "/webhooks/transactions", batch(4200));
    assert_eq!(status, Status::Ok);
    assert_eq!(report, json!({ "inserted": 1, "updated": 0, "skipped": 1 }));

    let (_, synced) = l.get("/transactions?source=synced");
    let synced = synced.as_array().unwrap();
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0]["external_id"], "ext-1");
    let path = format!("/transactions/{}", synced[0]["id"].as_str().unwrap());

    // The user files it under a category, then the provider corrects the amount.
    l.put(
        &path,
        json!({ "date": "2024-03-04", "description": "SUPERMARKET", "amount_cents": 4200, "kind": "expense", "category_id": groceries }),
    );
    let (status, report) = webhook(&l.app.client, "/webhooks/transactions", batch(4350));
    assert_eq!(status, Status::Ok);
    assert_eq!(report["updated"], 1);
    assert_eq!(report["inserted"], 0);

    let (_, refreshed) = l.get(&path);
    assert_eq!(refreshed["amount_cents"], 4350);
    assert_eq!(refreshed["category_id"], groceries.as_str());
}

#[test]
fn test_webhook_requires_secret() {
    let l = Ledger::new();
    let body = json!({ "account_id": l.account_id, "transactions": [] });

    let response = l
        .app
        .client
        .post("/webhooks/transactions")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    let error = response.into_json::<Value>().unwrap();
    assert_eq!(error["error"], "invalid_webhook_secret");

    let unknown = json!({ "account_id": uuid::Uuid::new_v4(), "transactions": [] });
    let (status, _) = webhook(&l.app.client, "/webhooks/transactions", unknown);
    assert_eq!(status, Status::NotFound);
}

#[test]
fn test_webhook_rejected_without_configured_secret() {
    let app = test_app_with(budget_backend::config::AppConfig {
        webhook_secret: None,
        ..test_config()
    });
    let (status, _) = webhook(
        &app.client,
        "/webhooks/transactions",
        json!({ "account_id": uuid::Uuid::new_v4(), "transactions": [] }),
    );
    assert_eq!(status, Status::Unauthorized);
}
