mod common;

use anyhow::Result;
use reqwest::{multipart, StatusCode};
use serde_json::{json, Value};

use common::{email, id_of, TestServer, ADMIN, ADMIN_COUNT, CITIZEN, NEIGHBOUR, NEWCOMER, SUPER_ADMIN};

#[tokio::test]
async fn accounts_without_a_profile_must_onboard() -> Result<()> {
    let server = TestServer::start().await?;

    for path in ["/portal/profile", "/portal/requests", "/portal/dashboard"] {
        let (status, body) = server.get(path, NEWCOMER).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}: {}", path, body);
        assert_eq!(body["code"], "NEEDS_ONBOARDING", "{}: {}", path, body);
    }

    let (status, body) = server.post("/portal/profile", NEWCOMER, json!({ "first_name": "Kim" })).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["national_id"].is_string());

    let citizen_id = server.onboard(NEWCOMER, "NID-12").await?;
    let (status, body) = server.get("/portal/profile", NEWCOMER).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], citizen_id);
    assert_eq!(body["data"]["user_id"], NEWCOMER);
    assert_eq!(body["data"]["email"], email(NEWCOMER));
    assert_eq!(body["data"]["is_verified"], false);

    let welcome = server.mailer.sent().into_iter().filter(|m| m.to == email(NEWCOMER)).count();
    assert_eq!(welcome, 1);

    let (status, body) = server
        .post("/portal/profile", NEWCOMER, json!({ "national_id": "NID-99", "first_name": "K", "last_name": "L" }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    Ok(())
}

#[tokio::test]
async fn profile_updates_are_limited_to_personal_fields() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;

    let (status, body) = server.put("/portal/profile", CITIZEN, json!({ "city": "Springfield" })).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["city"], "Springfield");

    let (status, _) = server.put("/portal/profile", CITIZEN, json!({ "is_verified": true })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn a_portal_submission_notifies_admins_and_the_citizen() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    let mails_before = server.mailer.sent().len();

    let request_id = server.submit_request(CITIZEN, "Pothole on Main St").await?;

    assert_eq!(server.mailer.sent().len() - mails_before, ADMIN_COUNT + 1);
    for user in [CITIZEN, ADMIN, SUPER_ADMIN] {
        let inbox = server.notifications_of(user).await?;
        let hit = inbox.iter().any(|n| n["type"] == "request" && n["data"]["request_id"] == request_id);
        assert!(hit, "user {} was not notified: {:?}", user, inbox);
    }

    let (_, body) = server.get(&format!("/api/requests/{}", request_id), ADMIN).await?;
    assert_eq!(body["data"]["status"], "pending");

    Ok(())
}

#[tokio::test]
async fn a_permit_application_notifies_admins_and_the_citizen() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    let mails_before = server.mailer.sent().len();

    let (status, body) = server
        .post("/portal/permits", CITIZEN, json!({ "type": "building", "address": "12 Elm St" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let permit_id = id_of(&body)?;

    assert_eq!(server.mailer.sent().len() - mails_before, ADMIN_COUNT + 1);
    for user in [CITIZEN, ADMIN, SUPER_ADMIN] {
        let inbox = server.notifications_of(user).await?;
        let hit = inbox.iter().any(|n| n["type"] == "permit" && n["data"]["permit_id"] == permit_id);
        assert!(hit, "user {} was not notified: {:?}", user, inbox);
    }

    Ok(())
}

#[tokio::test]
async fn portal_relations_stop_at_citizen_owned_rows() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    let request_id = server.submit_request(CITIZEN, "Broken streetlight").await?;

    let (_, body) = server.post("/api/departments", ADMIN, json!({ "name": "Public Works", "code": "PW", "budget": 50000 })).await?;
    let department_id = id_of(&body)?;
    let (status, body) = server
        .post(
            "/api/employees",
            ADMIN,
            json!({
                "department_id": department_id,
                "employee_number": "E-1",
                "first_name": "Bo",
                "last_name": "Ng",
                "email": "bo@example.gov",
                "position": "Inspector",
                "hire_date": "2020-01-06",
                "salary": 98765
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let employee_id = id_of(&body)?;
    let (status, body) = server
        .put(
            &format!("/api/requests/{}", request_id),
            ADMIN,
            json!({ "assigned_to": employee_id, "department_id": department_id }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    for with in ["assignee", "department", "assignee,department"] {
        let path = format!("/portal/requests/{}?with={}", request_id, with);
        let (status, body) = server.get(&path, CITIZEN).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}: {}", with, body);
        assert!(body.get("data").is_none());
        assert!(!body.to_string().contains("98765"));

        let (status, _) = server.get(&format!("/portal/requests?with={}", with), CITIZEN).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = server.get("/portal/profile?with=user", CITIZEN).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server.get("/portal/events?with=department", CITIZEN).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server.get(&format!("/portal/requests/{}?with=citizen,documents", request_id), CITIZEN).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["citizen"]["user_id"], CITIZEN);

    let (status, body) = server.get(&format!("/api/requests/{}?with=assignee", request_id), ADMIN).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assignee"]["employee_number"], "E-1");

    Ok(())
}

#[tokio::test]
async fn citizens_only_see_their_own_rows() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    server.onboard(NEIGHBOUR, "NID-2").await?;
    let mine = server.submit_request(CITIZEN, "Mine").await?;
    server.submit_request(NEIGHBOUR, "Theirs").await?;

    let (_, body) = server.get("/portal/requests", CITIZEN).await?;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["subject"], "Mine");

    let path = format!("/portal/requests/{}", mine);
    let (status, _) = server.get(&path, NEIGHBOUR).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.put(&path, NEIGHBOUR, json!({ "subject": "Hijacked" })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.delete(&path, NEIGHBOUR).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = server.get(&path, CITIZEN).await?;
    assert_eq!(body["data"]["subject"], "Mine");

    Ok(())
}

#[tokio::test]
async fn citizens_cannot_set_workflow_fields() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;

    let (status, body) = server
        .post("/portal/requests", CITIZEN, json!({
            "type": "pothole", "subject": "S", "description": "D", "status": "approved"
        }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let request_id = server.submit_request(CITIZEN, "Editable").await?;
    let path = format!("/portal/requests/{}", request_id);
    let (status, body) = server.put(&path, CITIZEN, json!({ "subject": "Edited" })).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["subject"], "Edited");

    server.put(&format!("/api/requests/{}", request_id), ADMIN, json!({ "status": "in_progress" })).await?;
    let (status, _) = server.put(&path, CITIZEN, json!({ "subject": "Too late" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server.delete(&path, CITIZEN).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn documents_upload_and_delete_their_files() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    let request_id = server.submit_request(CITIZEN, "With evidence").await?;

    let form = multipart::Form::new()
        .text("title", "Photo of the hole")
        .text("document_type", "photo")
        .text("request_id", request_id.to_string())
        .part("file", multipart::Part::bytes(b"\x89PNG fake image".to_vec()).file_name("hole.png").mime_str("image/png")?);
    let res = server
        .client()
        .post(server.url("/portal/documents"))
        .bearer_auth(server.token(CITIZEN))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    let document_id = id_of(&body)?;
    let file_path = body["data"]["file_path"].as_str().unwrap_or_default().to_string();
    assert!(file_path.starts_with("documents/"), "{}", body);
    assert_eq!(body["data"]["file_name"], "hole.png");
    assert_eq!(body["data"]["mime_type"], "image/png");
    assert_eq!(body["data"]["file_size"], 15);
    assert!(server.uploads.path().join(&file_path).exists());

    let (_, body) = server.get(&format!("/portal/requests/{}?with=documents", request_id), CITIZEN).await?;
    assert_eq!(body["data"]["documents"].as_array().map(Vec::len), Some(1));

    let (status, _) = server.delete(&format!("/portal/documents/{}", document_id), CITIZEN).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(!server.uploads.path().join(&file_path).exists());

    Ok(())
}

#[tokio::test]
async fn staff_document_deletes_remove_the_file() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;

    let form = multipart::Form::new()
        .text("document_type", "id_card")
        .part("file", multipart::Part::bytes(b"scan".to_vec()).file_name("id.jpg").mime_str("image/jpeg")?);
    let res = server
        .client()
        .post(server.url("/portal/documents"))
        .bearer_auth(server.token(CITIZEN))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    let document_id = id_of(&body)?;
    assert_eq!(body["data"]["title"], "id.jpg");
    let file_path = body["data"]["file_path"].as_str().unwrap_or_default().to_string();
    assert!(server.uploads.path().join(&file_path).exists());

    let (status, body) = server.delete(&format!("/api/documents/{}", document_id), ADMIN).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(!server.uploads.path().join(&file_path).exists());

    Ok(())
}

#[tokio::test]
async fn refused_documents_leave_no_file_behind() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;

    let form = multipart::Form::new()
        .text("title", "Missing type")
        .part("file", multipart::Part::bytes(b"%PDF-1.4".to_vec()).file_name("form.pdf"));
    let res = server
        .client()
        .post(server.url("/portal/documents"))
        .bearer_auth(server.token(CITIZEN))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<Value>().await?;
    assert!(body["errors"]["document_type"].is_string());

    let documents_dir = server.uploads.path().join("documents");
    let leftover = std::fs::read_dir(&documents_dir).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftover, 0);

    Ok(())
}

#[tokio::test]
async fn portal_events_hide_private_and_cancelled() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    for (title, is_public, status) in [
        ("Town hall", true, "scheduled"),
        ("Staff retreat", false, "scheduled"),
        ("Rained out fair", true, "cancelled"),
    ] {
        let (code, body) = server
            .post("/api/events", ADMIN, json!({
                "title": title, "start_date": "2030-06-01T18:00:00Z", "is_public": is_public, "status": status
            }))
            .await?;
        assert_eq!(code, StatusCode::CREATED, "{}", body);
    }

    let (status, body) = server.get("/portal/events", CITIZEN).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1, "{}", body);
    assert_eq!(body["data"][0]["title"], "Town hall");

    Ok(())
}

#[tokio::test]
async fn dashboards_summarise_by_status() -> Result<()> {
    let server = TestServer::start().await?;
    let citizen_id = server.onboard(CITIZEN, "NID-1").await?;
    server.submit_request(CITIZEN, "One").await?;
    server.submit_request(CITIZEN, "Two").await?;
    server.post("/api/payments", ADMIN, json!({ "citizen_id": citizen_id, "type": "tax", "amount": 12.5 })).await?;

    let (status, body) = server.get("/portal/dashboard", CITIZEN).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["requests"]["pending"], 2);
    assert_eq!(body["data"]["outstanding_payments"], 1);
    assert_eq!(body["data"]["outstanding_amount"], json!(12.5));

    let (status, body) = server.get("/api/dashboard", ADMIN).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["requests"]["total"], 2);
    assert_eq!(body["data"]["requests"]["by_status"]["pending"], 2);
    assert_eq!(body["data"]["citizens"]["total"], 1);

    Ok(())
}

#[tokio::test]
async fn notifications_can_be_marked_read_by_their_owner() -> Result<()> {
    let server = TestServer::start().await?;
    server.onboard(CITIZEN, "NID-1").await?;
    server.submit_request(CITIZEN, "Noise").await?;

    let inbox = server.notifications_of(ADMIN).await?;
    let id = inbox.first().and_then(|n| n["id"].as_i64()).unwrap_or_default();
    assert!(inbox[0]["read_at"].is_null());

    let (status, _) = server.post(&format!("/portal/notifications/{}/read", id), CITIZEN, json!({})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server.post(&format!("/api/notifications/{}/read", id), ADMIN, json!({})).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["read_at"].is_string());

    Ok(())
}

#[tokio::test]
async fn password_reset_mail_goes_to_the_user() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server.post(&format!("/api/users/{}/password-reset", CITIZEN), ADMIN, json!({})).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    let (status, body) = server
        .post(&format!("/api/users/{}/password-reset", CITIZEN), ADMIN, json!({ "token": "abc123" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let mail = server.mailer.sent().into_iter().find(|m| m.to == email(CITIZEN));
    assert!(mail.map(|m| m.body.contains("abc123")).unwrap_or(false));

    let (status, _) = server.post("/api/users/999/password-reset", ADMIN, json!({ "token": "x" })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
