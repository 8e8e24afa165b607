//! Blackbox tests for the gateway HTTP API.
//!
//! These tests spin up a full server with in-memory backends and exercise
//! the endpoints over real HTTP, asserting the wire contracts: response
//! shapes, status codes, headers, and byte fidelity of stored objects.

use std::net::SocketAddr;

use anyhow::Result;
use secrecy::SecretBox;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use filegate_server::config::{Auth, Config, ConfigSecret, ObjectStorage, UserStorage};
use filegate_server::state::State;
use filegate_server::web::app::App;

const TOKEN_SECRET: &str = "blackbox-test-secret";

struct TestServer {
    addr: SocketAddr,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = Config {
            object_storage: ObjectStorage::Memory,
            user_storage: UserStorage::Memory,
            auth: Auth {
                token_secret: Some(SecretBox::new(Box::new(ConfigSecret::from(TOKEN_SECRET)))),
                ..Default::default()
            },
            ..Default::default()
        };

        let state = State::new(config).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(App::new(state).serve(listener));

        Self { addr }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

#[tokio::test]
async fn test_upload_list_download_roundtrip() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let part = reqwest::multipart::Part::bytes(b"hello gateway".to_vec())
        .file_name("greeting.txt")
        .mime_str("text/plain")?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = client
        .post(server.url("/api/upload"))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["ok"], json!(true));
    let key = body["key"].as_str().unwrap().to_owned();
    assert!(key.ends_with("_greeting.txt"));

    let response = client.get(server.url("/api/files")).send().await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["ok"], json!(true));
    let items = body["items"].as_array().unwrap();
    let item = items
        .iter()
        .find(|item| item["key"].as_str() == Some(&key))
        .unwrap();
    assert_eq!(item["size"], json!(13));
    assert!(item["lastModified"].is_string());

    let response = client
        .get(server.url(&format!("/api/download/{key}")))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain");
    let disposition = response.headers()["content-disposition"].to_str()?.to_owned();
    assert_eq!(disposition, format!("attachment; filename=\"{key}\""));
    assert_eq!(response.bytes().await?.as_ref(), b"hello gateway");

    Ok(())
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let response = client
        .post(server.url("/api/upload"))
        .multipart(form)
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"error": "Nenhum arquivo enviado"}));

    Ok(())
}

#[tokio::test]
async fn test_download_of_missing_key_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/download/1700000000000_missing.txt"))
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"error": "Arquivo não encontrado"}));

    Ok(())
}

#[tokio::test]
async fn test_signup_login_session_flow() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/signup"))
        .json(&json!({"email": "a@b.com", "password": "secret123"}))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"ok": true, "message": "Usuário criado"}));

    // Repeating the same signup conflicts.
    let response = client
        .post(server.url("/api/signup"))
        .json(&json!({"email": "a@b.com", "password": "secret123"}))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"error": "Email já cadastrado"}));

    let response = client
        .post(server.url("/api/login"))
        .json(&json!({"email": "a@b.com", "password": "secret123"}))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["user"], json!({"email": "a@b.com", "name": null}));
    let token = body["token"].as_str().unwrap().to_owned();

    let response = client
        .get(server.url("/api/me"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"ok": true, "me": "a@b.com"}));

    Ok(())
}

#[tokio::test]
async fn test_missing_fields_are_rejected() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for endpoint in ["/api/signup", "/api/login"] {
        for body in [
            json!({"email": "a@b.com"}),
            json!({"password": "secret123"}),
            json!({"email": "", "password": "secret123"}),
            json!({"email": "a@b.com", "password": ""}),
            json!({}),
        ] {
            let response = client.post(server.url(endpoint)).json(&body).send().await?;
            assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
            let body: Value = response.json().await?;
            assert_eq!(body, json!({"error": "Informe email e senha"}));
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    client
        .post(server.url("/api/signup"))
        .json(&json!({"email": "a@b.com", "password": "secret123"}))
        .send()
        .await?;

    let wrong_password = client
        .post(server.url("/api/login"))
        .json(&json!({"email": "a@b.com", "password": "not the password"}))
        .send()
        .await?;
    let unknown_email = client
        .post(server.url("/api/login"))
        .json(&json!({"email": "nobody@b.com", "password": "secret123"}))
        .send()
        .await?;

    assert_eq!(wrong_password.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), reqwest::StatusCode::UNAUTHORIZED);

    // Both failure modes must be byte-identical to avoid user enumeration.
    let wrong_password: Value = wrong_password.json().await?;
    let unknown_email: Value = unknown_email.json().await?;
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password, json!({"error": "Credenciais inválidas"}));

    Ok(())
}

#[tokio::test]
async fn test_emails_are_normalized() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/signup"))
        .json(&json!({"email": "USER@Example.com", "password": "secret123"}))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = client
        .post(server.url("/api/login"))
        .json(&json!({"email": "user@example.com", "password": "secret123"}))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["user"]["email"], json!("user@example.com"));

    let token = body["token"].as_str().unwrap().to_owned();
    let response = client
        .get(server.url("/api/me"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await?;
    let body: Value = response.json().await?;
    assert_eq!(body["me"], json!("user@example.com"));

    Ok(())
}

#[tokio::test]
async fn test_session_check_requires_a_token() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/api/me")).send().await?;
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"error": "Token ausente"}));

    let response = client
        .get(server.url("/api/me"))
        .header("Authorization", "Bearer not.a.token")
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"error": "Token inválido"}));

    Ok(())
}

#[tokio::test]
async fn test_expired_tokens_are_rejected() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // A token signed with the right secret but an expiry in the past.
    let claims = json!({
        "sub": "a@b.com",
        "exp": jsonwebtoken::get_current_timestamp() - 100,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TOKEN_SECRET.as_bytes()),
    )?;

    let response = client
        .get(server.url("/api/me"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"error": "Token inválido"}));

    Ok(())
}

#[tokio::test]
async fn test_concurrent_signups_resolve_to_one_winner() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let signup = |client: reqwest::Client, url: String| async move {
        client
            .post(url)
            .json(&json!({"email": "race@b.com", "password": "secret123"}))
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    };

    let (first, second) = tokio::join!(
        signup(client.clone(), server.url("/api/signup")),
        signup(client.clone(), server.url("/api/signup")),
    );

    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [200, 409]);

    Ok(())
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/health")).send().await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}
