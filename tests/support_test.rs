mod common;

use common::*;
use rocket::http::{Method, Status};
use serde_json::json;

fn open_ticket(app: &TestApp, token: &str, subject: &str) -> String {
    let (status, ticket) = post(
        &app.client,
        "/api/support/tickets",
        token,
        json!({ "subject": subject, "description": "Numbers look off", "category": "bug" }),
    );
    assert_eq!(status, Status::Ok, "{}", ticket);
    ticket["id"].as_str().unwrap().to_string()
}

#[test]
fn test_ticket_lifecycle() {
    let app = test_app();
    let (_, owner) = signup(&app.client, "quinn");
    let (_, stranger) = signup(&app.client, "rupert");
    let (_, admin) = signup(&app.client, "admin");

    let ticket_id = open_ticket(&app, &owner, "Budget totals wrong");
    let ticket_uri = format!("/api/support/tickets/{}", ticket_id);

    let (_, own) = get(&app.client, "/api/support/tickets", &owner);
    assert_eq!(own.as_array().unwrap().len(), 1);
    assert_eq!(own[0]["priority"], "normal");
    assert_eq!(own[0]["status"], "open");
    let (_, none) = get(&app.client, "/api/support/tickets", &stranger);
    assert!(none.as_array().unwrap().is_empty());

    let (status, _) = get(&app.client, &ticket_uri, &stranger);
    assert_eq!(status, Status::NotFound);
    let (status, _) = get(&app.client, &ticket_uri, &admin);
    assert_eq!(status, Status::Ok);

    // Staff replies reach the owner by mail.
    let (status, comment) = post(
        &app.client,
        &format!("{}/comments", ticket_uri),
        &admin,
        json!({ "body": "Looking into it" }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(comment["staff"], true);
    let sent = app.mailer.sent();
    assert_eq!(sent.last().unwrap().to, "quinn@example.com");
    assert!(sent.last().unwrap().body.contains("Looking into it"));

    let (status, resolved) = put(
        &app.client,
        &format!("/api/admin/tickets/{}/status", ticket_id),
        &admin,
        json!({ "status": "resolved" }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(resolved["status"], "resolved");
    assert!(app.mailer.sent().last().unwrap().body.contains("resolved"));

    // The owner answering a resolved ticket reopens it.
    let (status, comment) = post(
        &app.client,
        &format!("{}/comments", ticket_uri),
        &owner,
        json!({ "body": "Still broken" }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(comment["staff"], false);
    let (_, detail) = get(&app.client, &ticket_uri, &owner);
    assert_eq!(detail["ticket"]["status"], "open");
    assert_eq!(detail["comments"].as_array().unwrap().len(), 2);

    let (status, _) = call(&app.client, Method::Post, &format!("{}/close", ticket_uri), Some(&admin), None);
    assert_eq!(status, Status::NotFound);
    let (status, closed) = call(&app.client, Method::Post, &format!("{}/close", ticket_uri), Some(&owner), None);
    assert_eq!(status, Status::Ok);
    assert_eq!(closed["status"], "closed");

    let (status, body) = post(
        &app.client,
        &format!("{}/comments", ticket_uri),
        &owner,
        json!({ "body": "Hello?" }),
    );
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Ticket is closed");
}

#[test]
fn test_ticket_validation() {
    let app = test_app();
    let (_, token) = signup(&app.client, "quinn");
    let (status, body) = post(
        &app.client,
        "/api/support/tickets",
        &token,
        json!({ "subject": " ", "description": "x", "category": "other" }),
    );
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error"], "Subject is required");
}

#[test]
fn test_admin_ticket_filter() {
    let app = test_app();
    let (_, owner) = signup(&app.client, "quinn");
    let (_, admin) = signup(&app.client, "admin");
    let first = open_ticket(&app, &owner, "First");
    open_ticket(&app, &owner, "Second");
    put(
        &app.client,
        &format!("/api/admin/tickets/{}/status", first),
        &admin,
        json!({ "status": "in_progress" }),
    );

    let (_, all) = get(&app.client, "/api/admin/tickets", &admin);
    assert_eq!(all.as_array().unwrap().len(), 2);
    let (_, in_progress) = get(&app.client, "/api/admin/tickets?status=in_progress", &admin);
    assert_eq!(in_progress.as_array().unwrap().len(), 1);
    assert_eq!(in_progress[0]["subject"], "First");

    for uri in ["/api/admin/tickets?status=bogus", "/api/admin/contacts?status=bogus"] {
        let (status, body) = get(&app.client, uri, &admin);
        assert_eq!(status, Status::UnprocessableEntity, "{}", uri);
        assert!(body["error"].as_str().unwrap().contains("'bogus'"), "{}", body);
    }
}

#[test]
fn test_contact_form_and_replies() {
    let app = test_app();
    let (_, admin) = signup(&app.client, "admin");
    let sent_before = app.mailer.sent().len();

    let (status, body) = call(
        &app.client,
        Method::Post,
        "/contact",
        None,
        Some(json!({ "name": "Sam", "email": "sam@example.com", "message": "Too short" })),
    );
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error"], "Message must be at least 10 characters");

    let (status, submission) = call(
        &app.client,
        Method::Post,
        "/contact",
        None,
        Some(json!({
            "name": "Sam",
            "email": "Sam@Example.com",
            "subject": "Pricing",
            "message": "Do you offer a family plan?"
        })),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(submission["status"], "new");
    assert_eq!(submission["email"], "sam@example.com");
    let id = submission["id"].as_str().unwrap().to_string();
    let thread_token = submission["thread_token"].as_str().unwrap().to_string();

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), sent_before + 1);
    assert_eq!(sent.last().unwrap().to, "support@localhost");

    let (_, listed) = get(&app.client, "/api/admin/contacts?status=new", &admin);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, detail) = post(
        &app.client,
        &format!("/api/admin/contacts/{}/reply", id),
        &admin,
        json!({ "body": "Yes, invite your family to a shared account." }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(detail["submission"]["status"], "replied");
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
    assert_eq!(detail["messages"][1]["direction"], "outbound");
    let reply = app.mailer.sent().last().cloned().unwrap();
    assert_eq!(reply.to, "sam@example.com");
    assert!(reply.subject.starts_with("Re: Pricing"));
    assert!(reply.subject.contains(&thread_token));

    // The answer to that mail comes back through the inbound webhook.
    let (status, message) = webhook(
        &app.client,
        "/webhooks/email",
        json!({ "thread_token": thread_token, "from": "sam@example.com", "body": "Great, thanks!" }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(message["direction"], "inbound");

    let (_, detail) = get(&app.client, &format!("/api/admin/contacts/{}", id), &admin);
    assert_eq!(detail["submission"]["status"], "new");
    assert_eq!(detail["messages"].as_array().unwrap().len(), 3);

    let (status, body) = webhook(
        &app.client,
        "/webhooks/email",
        json!({ "thread_token": "nope", "from": "x@example.com", "body": "Hi" }),
    );
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error"], "Conversation not found");

    let (status, closed) = put(
        &app.client,
        &format!("/api/admin/contacts/{}/status", id),
        &admin,
        json!({ "status": "closed" }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(closed["status"], "closed");
}

#[test]
fn test_admin_endpoints_require_admin() {
    let app = test_app();
    let (_, user) = signup(&app.client, "quinn");

    let (status, check) = get(&app.client, "/api/admin/check", &user);
    assert_eq!(status, Status::Ok);
    assert_eq!(check["is_admin"], false);

    for uri in ["/api/admin/users", "/api/admin/stats", "/api/admin/tickets", "/api/admin/contacts"] {
        let (status, body) = get(&app.client, uri, &user);
        assert_eq!(status, Status::Forbidden, "{}", uri);
        assert_eq!(body["error"], "not_admin");
    }
}

#[test]
fn test_admin_users_and_stats() {
    let app = test_app();
    let (user_id, user) = signup(&app.client, "quinn");
    let (admin_id, admin) = signup(&app.client, "admin");
    create_account(&app.client, &user, "Household");
    open_ticket(&app, &user, "Help");

    let (status, check) = get(&app.client, "/api/admin/check", &admin);
    assert_eq!(status, Status::Ok);
    assert_eq!(check["is_admin"], true);

    let (_, users) = get(&app.client, "/api/admin/users", &admin);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (_, stats) = get(&app.client, "/api/admin/stats", &admin);
    assert_eq!(
        stats,
        json!({ "users": 2, "accounts": 1, "transactions": 0, "open_tickets": 1, "new_contacts": 0 })
    );

    let (status, body) = put(
        &app.client,
        &format!("/api/admin/users/{}/admin", admin_id),
        &admin,
        json!({ "is_admin": false }),
    );
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "You cannot revoke your own admin access");

    let (status, promoted) = put(
        &app.client,
        &format!("/api/admin/users/{}/admin", user_id),
        &admin,
        json!({ "is_admin": true }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(promoted["is_admin"], true);
    let (status, _) = get(&app.client, "/api/admin/stats", &user);
    assert_eq!(status, Status::Ok);

    let (status, body) = put(
        &app.client,
        &format!("/api/admin/users/{}/admin", uuid::Uuid::new_v4()),
        &admin,
        json!({ "is_admin": true }),
    );
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error"], "User not found");
}
