mod common;

use common::*;
use rocket::http::{Method, Status};
use serde_json::json;

#[test]
fn test_create_and_list_accounts() {
    let app = test_app();
    let (_, token) = signup(&app.client, "olivia");
    let account_id = create_account(&app.client, &token, "Household");

    let (status, body) = get(&app.client, "/api/accounts", &token);
    assert_eq!(status, Status::Ok);
    let accounts = body.as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["id"], account_id.as_str());
    assert_eq!(accounts[0]["role"], "owner");

    let (status, body) = get(&app.client, &format!("/api/accounts/{}", account_id), &token);
    assert_eq!(status, Status::Ok);
    assert_eq!(body["account"]["name"], "Household");
    assert_eq!(body["members"].as_array().unwrap().len(), 1);
}

#[test]
fn test_account_name_is_required() {
    let app = test_app();
    let (_, token) = signup(&app.client, "olivia");
    let (status, body) = post(&app.client, "/api/accounts", &token, json!({ "name": "   " }));
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["error"], "Account name is required");
}

#[test]
fn test_non_member_and_missing_account() {
    let app = test_app();
    let (_, owner) = signup(&app.client, "olivia");
    let (_, stranger) = signup(&app.client, "mallory");
    let account_id = create_account(&app.client, &owner, "Household");

    let (status, body) = get(&app.client, &format!("/api/accounts/{}", account_id), &stranger);
    assert_eq!(status, Status::Forbidden);
    assert_eq!(body["error"], "Not authorized");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = get(&app.client, &format!("/api/accounts/{}", missing), &owner);
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error"], "Account not found");
}

/// Owner invites `peggy`, who accepts; returns (account_id, owner token, member id, member token).
fn account_with_member(app: &TestApp) -> (String, String, String, String) {
    let (_, owner) = signup(&app.client, "olivia");
    let (member_id, member) = signup(&app.client, "peggy");
    let account_id = create_account(&app.client, &owner, "Household");

    let (status, invitation) = post(
        &app.client,
        &format!("/api/accounts/{}/invitations", account_id),
        &owner,
        json!({ "email": "Peggy@Example.com" }),
    );
    assert_eq!(status, Status::Ok, "{}", invitation);
    let token = invitation["token"].as_str().unwrap();
    let (status, _) = call(
        &app.client,
        Method::Post,
        &format!("/invites/{}/accept", token),
        Some(&member),
        None,
    );
    assert_eq!(status, Status::Ok);
    (account_id, owner, member_id, member)
}

#[test]
fn test_invitation_flow() {
    let app = test_app();
    let (_, owner) = signup(&app.client, "olivia");
    let (_, member) = signup(&app.client, "peggy");
    let (_, other) = signup(&app.client, "trent");
    let account_id = create_account(&app.client, &owner, "Household");
    let invitations_uri = format!("/api/accounts/{}/invitations", account_id);

    let (status, invitation) = post(&app.client, &invitations_uri, &owner, json!({ "email": "peggy@example.com" }));
    assert_eq!(status, Status::Ok);
    assert_eq!(invitation["status"], "pending");
    let token = invitation["token"].as_str().unwrap().to_string();

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "peggy@example.com");
    assert!(sent[0].body.contains(&token));

    // A second pending invitation for the same address is refused.
    let (status, _) = post(&app.client, &invitations_uri, &owner, json!({ "email": "peggy@example.com" }));
    assert_eq!(status, Status::Conflict);

    let (status, preview) = call(&app.client, Method::Get, &format!("/invites/{}", token), None, None);
    assert_eq!(status, Status::Ok);
    assert_eq!(preview["account_name"], "Household");
    assert_eq!(preview["status"], "pending");

    let accept_uri = format!("/invites/{}/accept", token);
    let (status, _) = call(&app.client, Method::Post, &accept_uri, Some(&other), None);
    assert_eq!(status, Status::Forbidden);

    let (status, joined) = call(&app.client, Method::Post, &accept_uri, Some(&member), None);
    assert_eq!(status, Status::Ok);
    assert_eq!(joined["role"], "member");

    let (status, _) = call(&app.client, Method::Post, &accept_uri, Some(&member), None);
    assert_eq!(status, Status::Conflict);

    let (status, members) = get(&app.client, &format!("/api/accounts/{}/members", account_id), &member);
    assert_eq!(status, Status::Ok);
    assert_eq!(members.as_array().unwrap().len(), 2);

    // Already a member now.
    let (status, body) = post(&app.client, &invitations_uri, &owner, json!({ "email": "peggy@example.com" }));
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "User is already a member");
}

#[test]
fn test_expired_invitation_is_gone() {
    let app = test_app_with(budget_backend::config::AppConfig {
        invitation_ttl_days: 0,
        ..test_config()
    });
    let (_, owner) = signup(&app.client, "olivia");
    let (_, member) = signup(&app.client, "peggy");
    let account_id = create_account(&app.client, &owner, "Household");
    let (_, invitation) = post(
        &app.client,
        &format!("/api/accounts/{}/invitations", account_id),
        &owner,
        json!({ "email": "peggy@example.com" }),
    );
    let token = invitation["token"].as_str().unwrap();

    let (status, body) = call(
        &app.client,
        Method::Post,
        &format!("/invites/{}/accept", token),
        Some(&member),
        None,
    );
    assert_eq!(status, Status::Gone);
    assert_eq!(body["error"], "Invitation has expired");

    let (_, listed) = get(&app.client, &format!("/api/accounts/{}/invitations", account_id), &owner);
    assert_eq!(listed[0]["status"], "expired");
}

#[test]
fn test_expired_invitation_cannot_be_revoked_but_can_be_resent() {
    let app = test_app_with(budget_backend::config::AppConfig {
        invitation_ttl_days: 0,
        ..test_config()
    });
    let (_, owner) = signup(&app.client, "olivia");
    let account_id = create_account(&app.client, &owner, "Household");
    let invitations_uri = format!("/api/accounts/{}/invitations", account_id);
    let (status, invitation) = post(&app.client, &invitations_uri, &owner, json!({ "email": "peggy@example.com" }));
    assert_eq!(status, Status::Ok);

    let revoke_uri = format!("{}/{}", invitations_uri, invitation["id"].as_str().unwrap());
    let (status, body) = delete(&app.client, &revoke_uri, &owner);
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Only pending invitations can be revoked");

    // A lapsed invitation does not block a fresh one for the same address.
    let (status, resent) = post(&app.client, &invitations_uri, &owner, json!({ "email": "Peggy@example.com" }));
    assert_eq!(status, Status::Ok, "{}", resent);
    assert_ne!(resent["token"], invitation["token"]);

    let (_, listed) = get(&app.client, &invitations_uri, &owner);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|inv| inv["status"] == "expired"));
}

#[test]
fn test_revoke_invitation() {
    let app = test_app();
    let (_, owner) = signup(&app.client, "olivia");
    let (_, member) = signup(&app.client, "peggy");
    let account_id = create_account(&app.client, &owner, "Household");
    let (_, invitation) = post(
        &app.client,
        &format!("/api/accounts/{}/invitations", account_id),
        &owner,
        json!({ "email": "peggy@example.com" }),
    );
    let (status, body) = post(
        &app.client,
        &format!("/api/accounts/{}/invitations", account_id),
        &owner,
        json!({ "email": "PEGGY@example.com" }),
    );
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "An invitation is already pending for this email");

    let revoke_uri = format!(
        "/api/accounts/{}/invitations/{}",
        account_id,
        invitation["id"].as_str().unwrap()
    );

    let (status, revoked) = delete(&app.client, &revoke_uri, &owner);
    assert_eq!(status, Status::Ok);
    assert_eq!(revoked["status"], "revoked");

    let (status, _) = delete(&app.client, &revoke_uri, &owner);
    assert_eq!(status, Status::Conflict);

    let (status, _) = call(
        &app.client,
        Method::Post,
        &format!("/invites/{}/accept", invitation["token"].as_str().unwrap()),
        Some(&member),
        None,
    );
    assert_eq!(status, Status::Conflict);
}

#[test]
fn test_owner_only_operations() {
    let app = test_app();
    let (account_id, owner, _, member) = account_with_member(&app);
    let account_uri = format!("/api/accounts/{}", account_id);

    let (status, body) = put(&app.client, &account_uri, &member, json!({ "name": "Mine now" }));
    assert_eq!(status, Status::Forbidden);
    assert_eq!(body["error"], "Only the account owner can do this");

    let (status, body) = put(&app.client, &account_uri, &owner, json!({ "name": "Family" }));
    assert_eq!(status, Status::Ok);
    assert_eq!(body["name"], "Family");

    let (status, _) = delete(&app.client, &account_uri, &member);
    assert_eq!(status, Status::Forbidden);
}

#[test]
fn test_remove_and_leave() {
    let app = test_app();
    let (account_id, owner, member_id, member) = account_with_member(&app);
    let (_, owner_info) = get(&app.client, "/auth/me", &owner);
    let owner_id = owner_info["id"].as_str().unwrap().to_string();

    let (status, body) = delete(
        &app.client,
        &format!("/api/accounts/{}/members/{}", account_id, owner_id),
        &owner,
    );
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Cannot remove the account owner");

    let (status, body) = call(
        &app.client,
        Method::Post,
        &format!("/api/accounts/{}/leave", account_id),
        Some(&owner),
        None,
    );
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Owner cannot leave the account");

    let (status, _) = call(
        &app.client,
        Method::Post,
        &format!("/api/accounts/{}/leave", account_id),
        Some(&member),
        None,
    );
    assert_eq!(status, Status::NoContent);

    let (status, _) = delete(
        &app.client,
        &format!("/api/accounts/{}/members/{}", account_id, member_id),
        &owner,
    );
    assert_eq!(status, Status::NotFound);
}

#[test]
fn test_transfer_ownership() {
    let app = test_app();
    let (account_id, owner, member_id, member) = account_with_member(&app);

    let (status, detail) = post(
        &app.client,
        &format!("/api/accounts/{}/transfer", account_id),
        &owner,
        json!({ "user_id": member_id }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(detail["role"], "member");

    let (_, accounts) = get(&app.client, "/api/accounts", &member);
    assert_eq!(accounts[0]["role"], "owner");
    let (_, accounts) = get(&app.client, "/api/accounts", &owner);
    assert_eq!(accounts[0]["role"], "member");

    // The former owner can now leave.
    let (status, _) = call(
        &app.client,
        Method::Post,
        &format!("/api/accounts/{}/leave", account_id),
        Some(&owner),
        None,
    );
    assert_eq!(status, Status::NoContent);
}

#[test]
fn test_delete_account_removes_its_data() {
    let app = test_app();
    let (_, owner) = signup(&app.client, "olivia");
    let account_id = create_account(&app.client, &owner, "Household");
    let (status, _) = post(
        &app.client,
        &format!("/api/accounts/{}/categories", account_id),
        &owner,
        json!({ "name": "Groceries" }),
    );
    assert_eq!(status, Status::Ok);

    let (status, _) = delete(&app.client, &format!("/api/accounts/{}", account_id), &owner);
    assert_eq!(status, Status::NoContent);

    let (status, _) = get(&app.client, &format!("/api/accounts/{}/categories", account_id), &owner);
    assert_eq!(status, Status::NotFound);
    let (_, accounts) = get(&app.client, "/api/accounts", &owner);
    assert!(accounts.as_array().unwrap().is_empty());
}
