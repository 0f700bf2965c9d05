mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn created_petition_is_retrievable_with_its_tiers() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let owner = common::register_and_login(&client, &server.base_url).await?;
    let (petition_id, title) = common::create_petition(
        &client,
        &server.base_url,
        &owner,
        "Save the estuary",
        &[("Bronze", 5), ("Silver", 10)],
    )
    .await?;

    let resp = client
        .get(format!("{}/petitions/{}", server.base_url, petition_id))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["title"], title.as_str());
    assert_eq!(body["ownerId"], owner.id);
    assert_eq!(body["numberOfSupporters"], 0);
    assert_eq!(body["moneyRaised"], 0);

    let tiers = body["supportTiers"].as_array().unwrap();
    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[0]["title"], "Bronze");
    assert_eq!(tiers[0]["cost"], 5);

    Ok(())
}

#[tokio::test]
async fn listing_filters_by_cost_ceiling() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let owner = common::register_and_login(&client, &server.base_url).await?;
    common::create_petition(
        &client,
        &server.base_url,
        &owner,
        "Estuary",
        &[("T1", 5), ("T2", 10)],
    )
    .await?;

    // The cheapest tier costs 5, so a ceiling of 7 matches...
    let resp = client
        .get(format!(
            "{}/petitions?supportingCost=7&ownerId={}",
            server.base_url, owner.id
        ))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["petitions"][0]["supportingCost"], 5);

    // ...and a ceiling of 3 does not; an empty filtered set is a 404
    let resp = client
        .get(format!(
            "{}/petitions?supportingCost=3&ownerId={}",
            server.base_url, owner.id
        ))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn listing_paginates_deterministically() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let owner = common::register_and_login(&client, &server.base_url).await?;
    for i in 0..3 {
        common::create_petition(
            &client,
            &server.base_url,
            &owner,
            &format!("Pager {}", i),
            &[("Base", 1)],
        )
        .await?;
    }

    let url = format!(
        "{}/petitions?ownerId={}&sortBy=CREATED_ASC",
        server.base_url, owner.id
    );
    let all: Value = client.get(&url).send().await?.json().await?;
    assert_eq!(all["count"], 3);
    assert_eq!(all["petitions"].as_array().unwrap().len(), 3);

    // count reflects the filtered set even when the page is smaller
    let page: Value = client
        .get(format!("{}&startIndex=1&count=1", url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(page["count"], 3);
    let rows = page["petitions"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["petitionId"], all["petitions"][1]["petitionId"]);

    Ok(())
}

#[tokio::test]
async fn create_rejects_bad_categories_titles_and_tier_counts() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let owner = common::register_and_login(&client, &server.base_url).await?;
    let (_, title) = common::create_petition(
        &client,
        &server.base_url,
        &owner,
        "Original",
        &[("Base", 1)],
    )
    .await?;

    let tier = json!({ "title": "Base", "description": "d", "cost": 1 });

    // Unauthenticated
    let resp = client
        .post(format!("{}/petitions", server.base_url))
        .json(&json!({
            "title": "No session", "description": "d", "categoryId": 1,
            "supportTiers": [tier],
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Unknown category
    let resp = client
        .post(format!("{}/petitions", server.base_url))
        .header("x-authorization", &owner.token)
        .json(&json!({
            "title": "Unknown category", "description": "d", "categoryId": 999999,
            "supportTiers": [tier],
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Duplicate title, even with a valid category
    let resp = client
        .post(format!("{}/petitions", server.base_url))
        .header("x-authorization", &owner.token)
        .json(&json!({
            "title": title, "description": "d", "categoryId": 1,
            "supportTiers": [tier],
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Zero tiers and four tiers are both out of range
    for tiers in [
        json!([]),
        json!([
            { "title": "A", "description": "d", "cost": 1 },
            { "title": "B", "description": "d", "cost": 2 },
            { "title": "C", "description": "d", "cost": 3 },
            { "title": "D", "description": "d", "cost": 4 },
        ]),
    ] {
        let resp = client
            .post(format!("{}/petitions", server.base_url))
            .header("x-authorization", &owner.token)
            .json(&json!({
                "title": format!("Range {}", uuid::Uuid::new_v4().simple()),
                "description": "d", "categoryId": 1, "supportTiers": tiers,
            }))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    Ok(())
}

#[tokio::test]
async fn edits_and_deletes_are_owner_only() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let owner = common::register_and_login(&client, &server.base_url).await?;
    let intruder = common::register_and_login(&client, &server.base_url).await?;
    let (petition_id, _) = common::create_petition(
        &client,
        &server.base_url,
        &owner,
        "Editable",
        &[("Base", 1)],
    )
    .await?;

    let resp = client
        .patch(format!("{}/petitions/{}", server.base_url, petition_id))
        .header("x-authorization", &intruder.token)
        .json(&json!({ "description": "hijacked" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .patch(format!("{}/petitions/{}", server.base_url, petition_id))
        .header("x-authorization", &owner.token)
        .json(&json!({ "description": "amended" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    // An empty patch is rejected
    let resp = client
        .patch(format!("{}/petitions/{}", server.base_url, petition_id))
        .header("x-authorization", &owner.token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .delete(format!("{}/petitions/{}", server.base_url, petition_id))
        .header("x-authorization", &intruder.token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .delete(format!("{}/petitions/{}", server.base_url, petition_id))
        .header("x-authorization", &owner.token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/petitions/{}", server.base_url, petition_id))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn categories_are_seeded() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/petitions/categories", server.base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    let categories = body.as_array().unwrap();
    assert!(!categories.is_empty());
    assert!(categories[0]["categoryId"].is_i64());
    assert!(categories[0]["name"].is_string());

    Ok(())
}
