mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_view_logout_flow() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let user = common::register_and_login(&client, &server.base_url).await?;

    // Viewing yourself includes the email
    let resp = client
        .get(format!("{}/users/{}", server.base_url, user.id))
        .header("x-authorization", &user.token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["email"], user.email.as_str());
    assert_eq!(body["firstName"], "Test");

    // An anonymous view omits it
    let resp = client
        .get(format!("{}/users/{}", server.base_url, user.id))
        .send()
        .await?;
    let body: Value = resp.json().await?;
    assert!(body.get("email").is_none());

    // Logout invalidates the stored session
    let resp = client
        .post(format!("{}/users/logout", server.base_url))
        .header("x-authorization", &user.token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{}/users/logout", server.base_url))
        .header("x-authorization", &user.token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn registering_an_email_twice_is_forbidden() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let user = common::register_and_login(&client, &server.base_url).await?;

    let resp = client
        .post(format!("{}/users/register", server.base_url))
        .json(&json!({
            "email": user.email,
            "firstName": "Other",
            "lastName": "Person",
            "password": "different1",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn bad_credentials_and_bad_payloads_are_rejected() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let user = common::register_and_login(&client, &server.base_url).await?;

    let resp = client
        .post(format!("{}/users/login", server.base_url))
        .json(&json!({ "email": user.email, "password": "wrong-password" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{}/users/register", server.base_url))
        .json(&json!({
            "email": "not-an-email",
            "firstName": "A",
            "lastName": "B",
            "password": "longenough",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{}/users/register", server.base_url))
        .json(&json!({
            "email": "short@pw.example.com",
            "firstName": "A",
            "lastName": "B",
            "password": "tiny",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn profile_edits_are_self_only_and_password_guarded() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let alice = common::register_and_login(&client, &server.base_url).await?;
    let mallory = common::register_and_login(&client, &server.base_url).await?;

    // Someone else cannot edit the profile
    let resp = client
        .patch(format!("{}/users/{}", server.base_url, alice.id))
        .header("x-authorization", &mallory.token)
        .json(&json!({ "firstName": "Hijacked" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Name change sticks
    let resp = client
        .patch(format!("{}/users/{}", server.base_url, alice.id))
        .header("x-authorization", &alice.token)
        .json(&json!({ "firstName": "Alicia" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = client
        .get(format!("{}/users/{}", server.base_url, alice.id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["firstName"], "Alicia");

    // Password change demands the current password
    let resp = client
        .patch(format!("{}/users/{}", server.base_url, alice.id))
        .header("x-authorization", &alice.token)
        .json(&json!({ "password": "newpassword1" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .patch(format!("{}/users/{}", server.base_url, alice.id))
        .header("x-authorization", &alice.token)
        .json(&json!({ "password": "newpassword1", "currentPassword": "wrong" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .patch(format!("{}/users/{}", server.base_url, alice.id))
        .header("x-authorization", &alice.token)
        .json(&json!({ "password": "hunter22", "currentPassword": "hunter22" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // An empty patch is a bad request
    let resp = client
        .patch(format!("{}/users/{}", server.base_url, alice.id))
        .header("x-authorization", &alice.token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
