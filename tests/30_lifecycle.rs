mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{email, id_of, TestServer, ADMIN, CITIZEN, CLERK, NEIGHBOUR, SUPER_ADMIN};

async fn bill(server: &TestServer, citizen_id: i64, amount: f64) -> Result<i64> {
    let (status, body) = server
        .post("/api/payments", ADMIN, json!({ "citizen_id": citizen_id, "type": "permit_fee", "amount": amount }))
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "payment failed: {} {}", status, body);
    id_of(&body)
}

#[tokio::test]
async fn rejecting_a_permit_requires_a_reason() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;

    let (status, body) = server
        .post("/portal/permits", CITIZEN, json!({ "type": "building", "address": "12 Elm St" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["data"]["permit_number"].as_str().unwrap_or_default().starts_with("PRM-"));
    let path = format!("/api/permits/{}", id_of(&body)?);

    let (status, body) = server.put(&path, ADMIN, json!({ "status": "rejected" })).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert!(body["errors"]["rejection_reason"].is_string());

    let (_, body) = server.get(&path, ADMIN).await?;
    assert_eq!(body["data"]["status"], "pending", "a refused update leaves the row alone");

    let (status, body) = server
        .put(&path, ADMIN, json!({ "status": "rejected", "rejection_reason": "Zoning does not allow it" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "rejected");

    Ok(())
}

#[tokio::test]
async fn approving_a_permit_stamps_the_issue_date() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    let (_, body) = server.post("/portal/permits", CITIZEN, json!({ "type": "parking" })).await?;
    let path = format!("/api/permits/{}", id_of(&body)?);

    let (status, body) = server.put(&path, ADMIN, json!({ "status": "approved" })).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["fee"].is_string());
    assert!(body["errors"]["expiry_date"].is_string());

    let (status, body) = server
        .put(&path, ADMIN, json!({ "status": "approved", "fee": 40, "expiry_date": "2099-12-31" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["issue_date"].is_string());

    Ok(())
}

#[tokio::test]
async fn status_changes_follow_the_transition_table() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    let request_id = server.submit_request(CITIZEN, "Broken streetlight").await?;
    let path = format!("/api/requests/{}", request_id);

    let (status, body) = server.put(&path, CLERK, json!({ "status": "completed" })).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "pending cannot jump to completed: {}", body);
    assert!(body["errors"]["status"].as_str().unwrap_or_default().contains("allowed"));

    let (status, _) = server.put(&path, CLERK, json!({ "status": "in_progress" })).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = server.put(&path, CLERK, json!({ "status": "completed", "response": "Fixed" })).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["completion_date"].is_string());

    let (status, body) = server.put(&path, CLERK, json!({ "status": "pending" })).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["status"].as_str().unwrap_or_default().contains("final"));

    Ok(())
}

#[tokio::test]
async fn staff_status_changes_notify_the_owner() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    let request_id = server.submit_request(CITIZEN, "Overflowing bin").await?;

    let (status, _) = server
        .put(&format!("/api/requests/{}", request_id), ADMIN, json!({ "status": "in_progress" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let inbox = server.notifications_of(CITIZEN).await?;
    let update = inbox
        .iter()
        .find(|n| n["type"] == "request" && n["data"]["status"] == "in_progress")
        .cloned()
        .unwrap_or(Value::Null);
    assert!(update.is_object(), "no in_progress notification in {:?}", inbox);

    Ok(())
}

#[tokio::test]
async fn paying_a_bill_twice_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let citizen_id = server.onboard(CITIZEN, "NID-1").await?;
    let payment_id = bill(&server, citizen_id, 75.0).await?;
    let mails_before = server.mailer.sent().len();

    let pay = format!("/portal/payments/{}/pay", payment_id);
    let (status, body) = server.post(&pay, CITIZEN, json!({ "payment_method": "card" })).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["payment_method"], "card");
    assert!(body["data"]["payment_date"].is_string());
    let receipt = body["data"]["receipt_number"].as_str().unwrap_or_default().to_string();
    assert!(receipt.starts_with("RCP-"), "{}", body);

    let sent = server.mailer.sent();
    let new_mail: Vec<&str> = sent[mails_before..].iter().map(|m| m.to.as_str()).collect();
    assert_eq!(new_mail.len(), common::ADMIN_COUNT + 1, "payer and each admin: {:?}", new_mail);
    for user in [CITIZEN, ADMIN, SUPER_ADMIN] {
        assert!(new_mail.contains(&email(user).as_str()), "{} missing from {:?}", email(user), new_mail);
    }

    let (status, body) = server.post(&pay, CITIZEN, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (_, body) = server.get(&format!("/api/payments/{}", payment_id), ADMIN).await?;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["receipt_number"], receipt.as_str());

    Ok(())
}

#[tokio::test]
async fn another_citizens_bill_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let citizen_id = server.onboard(CITIZEN, "NID-1").await?;
    server.onboard(NEIGHBOUR, "NID-2").await?;
    let payment_id = bill(&server, citizen_id, 20.0).await?;

    let (status, _) = server
        .call(reqwest::Method::POST, &format!("/portal/payments/{}/pay", payment_id), NEIGHBOUR, None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = server.get(&format!("/api/payments/{}", payment_id), ADMIN).await?;
    assert_eq!(body["data"]["status"], "pending");

    Ok(())
}
