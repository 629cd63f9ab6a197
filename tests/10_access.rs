mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::{TestServer, ADMIN, CITIZEN, CLERK};

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.client().get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "memory");

    let body = server.client().get(server.url("/")).send().await?.json::<Value>().await?;
    assert_eq!(body["data"]["name"], "Civic Portal API");
    let resources = body["data"]["endpoints"]["resources"].as_array().cloned().unwrap_or_default();
    assert_eq!(resources.len(), 11, "eleven exposed resources: {}", body);

    Ok(())
}

#[tokio::test]
async fn api_requires_a_valid_token() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.client().get(server.url("/api/departments")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = server
        .client()
        .get(server.url("/api/departments"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn admin_api_is_limited_to_staff_roles() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server.get("/api/departments", CITIZEN).await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = server.get("/api/departments", CLERK).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get("/api/departments", ADMIN).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn malformed_json_uses_the_error_envelope() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client()
        .post(server.url("/api/departments"))
        .bearer_auth(server.token(ADMIN))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "INVALID_JSON");

    Ok(())
}
