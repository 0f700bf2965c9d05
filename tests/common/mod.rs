use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// The integration suite needs a reachable Postgres; without one we skip
/// rather than fail, so the unit suite still runs anywhere.
pub fn database_configured() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/causeway-api");
        cmd.env("CAUSEWAY_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL from .env
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// A registered-and-logged-in user for exercising authenticated endpoints.
pub struct TestUser {
    pub id: i64,
    pub token: String,
    pub email: String,
}

pub async fn register_and_login(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<TestUser> {
    let email = format!("{}@causeway.test", uuid::Uuid::new_v4().simple());
    let password = "hunter22";

    let resp = client
        .post(format!("{}/users/register", base_url))
        .json(&json!({
            "email": email,
            "firstName": "Test",
            "lastName": "User",
            "password": password,
        }))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == StatusCode::CREATED, "register failed: {}", resp.status());

    let resp = client
        .post(format!("{}/users/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == StatusCode::OK, "login failed: {}", resp.status());
    let body: Value = resp.json().await?;

    Ok(TestUser {
        id: body["userId"].as_i64().context("userId missing")?,
        token: body["token"].as_str().context("token missing")?.to_string(),
        email,
    })
}

/// Create a petition owned by `user` with the given tier (title, cost) pairs.
/// Titles are suffixed to stay globally unique across test runs.
pub async fn create_petition(
    client: &reqwest::Client,
    base_url: &str,
    user: &TestUser,
    title_prefix: &str,
    tiers: &[(&str, i64)],
) -> Result<(i64, String)> {
    let title = format!("{} {}", title_prefix, uuid::Uuid::new_v4().simple());
    let tier_bodies: Vec<Value> = tiers
        .iter()
        .map(|(tier_title, cost)| {
            json!({
                "title": tier_title,
                "description": format!("{} tier", tier_title),
                "cost": cost,
            })
        })
        .collect();

    let resp = client
        .post(format!("{}/petitions", base_url))
        .header("x-authorization", &user.token)
        .json(&json!({
            "title": title,
            "description": "An integration test petition",
            "categoryId": 1,
            "supportTiers": tier_bodies,
        }))
        .send()
        .await?;
    anyhow::ensure!(
        resp.status() == StatusCode::CREATED,
        "create petition failed: {}",
        resp.status()
    );
    let body: Value = resp.json().await?;

    Ok((
        body["petitionId"].as_i64().context("petitionId missing")?,
        title,
    ))
}
