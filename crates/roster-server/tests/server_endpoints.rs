//! End-to-end tests against a live server on an ephemeral port, with a
//! mock issuer serving the JWKS and the login endpoint, and locally
//! minted RS256 tokens.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roster_auth::{
    AuthState, CognitoClient, CognitoConfig, FetchConfig, KeyResolver, TokenVerifier,
    VerifierConfig,
};
use roster_server::{AppState, build_app};
use roster_store::UserStore;

const REGION: &str = "eu-test-1";
const POOL: &str = "eu-test-1_RosterPool";
const CLIENT_ID: &str = "client-123";

/// A pool-side signing key plus the published JWKS document.
struct TestIssuer {
    kid: String,
    encoding_key: EncodingKey,
    jwks: Value,
}

impl TestIssuer {
    fn new(kid: &str) -> Self {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();

        let public_key = private_key.to_public_key();
        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
        let jwks = json!({
            "keys": [{
                "kty": "RSA",
                "kid": kid,
                "use": "sig",
                "alg": "RS256",
                "n": n,
                "e": e,
            }]
        });

        Self {
            kid: kid.to_string(),
            encoding_key,
            jwks,
        }
    }

    fn token(&self) -> String {
        let claims = json!({
            "sub": "user-1",
            "aud": CLIENT_ID,
            "iss": format!("https://cognito-idp.{REGION}.amazonaws.com/{POOL}"),
            "exp": OffsetDateTime::now_utc().unix_timestamp() + 600,
        });
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());
        encode(&header, &claims, &self.encoding_key).unwrap()
    }
}

struct TestServer {
    base: String,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: JoinHandle<()>,
    // Held so the store file outlives the server.
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

/// Starts the mock issuer and a server on an ephemeral port.
async fn start_server(issuer: &TestIssuer) -> (MockServer, TestServer) {
    let mock_issuer = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issuer.jwks.clone()))
        .mount(&mock_issuer)
        .await;

    let jwks_url = Url::parse(&format!("{}/.well-known/jwks.json", mock_issuer.uri())).unwrap();
    let resolver = KeyResolver::fetch(&jwks_url, &FetchConfig::default().with_allow_http(true))
        .await
        .expect("fetch JWKS");

    let cognito = CognitoConfig {
        region: REGION.to_string(),
        user_pool_id: POOL.to_string(),
        app_client_id: CLIENT_ID.to_string(),
        ..CognitoConfig::default()
    };
    let verifier = TokenVerifier::new(VerifierConfig::from(&cognito), resolver);
    let login = CognitoClient::new(&cognito)
        .unwrap()
        .with_endpoint(Url::parse(&mock_issuer.uri()).unwrap());

    let dir = tempfile::tempdir().unwrap();
    let data_file = dir.path().join("users.json");
    std::fs::write(&data_file, b"[]").unwrap();

    let state = AppState {
        auth: AuthState::new(Arc::new(verifier)),
        store: Arc::new(UserStore::new(data_file)),
        login: Arc::new(login),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (
        mock_issuer,
        TestServer {
            base: format!("http://{addr}"),
            shutdown: Some(tx),
            handle,
            _dir: dir,
        },
    )
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let issuer = TestIssuer::new("key-1");
    let (_mock, server) = start_server(&issuer).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/healthz", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    server.stop().await;
}

#[tokio::test]
async fn protected_routes_reject_bad_credentials() {
    let issuer = TestIssuer::new("key-1");
    let (_mock, server) = start_server(&issuer).await;
    let client = reqwest::Client::new();
    let users = format!("{}/users", server.base);

    // No Authorization header at all.
    let resp = client.get(&users).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    // Wrong scheme, rejected before any token parsing.
    let resp = client
        .get(&users)
        .header("Authorization", "Basic xyz")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Bearer with an empty token.
    let resp = client
        .get(&users)
        .header("Authorization", "Bearer ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Bearer with garbage.
    let resp = client
        .get(&users)
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(
        resp.headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Bearer"))
    );
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid or expired token");

    // A token signed by a key the issuer never published.
    let rogue = TestIssuer::new("key-1");
    let resp = client
        .get(&users)
        .bearer_auth(rogue.token())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    server.stop().await;
}

#[tokio::test]
async fn crud_scenario_over_http() {
    let issuer = TestIssuer::new("key-1");
    let (_mock, server) = start_server(&issuer).await;
    let client = reqwest::Client::new();
    let token = issuer.token();
    let users = format!("{}/users", server.base);

    // Starts empty.
    let resp = client.get(&users).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([]));

    // Create.
    let ann = json!({"name": "Ann", "age": 30, "city": "Oslo"});
    let resp = client
        .post(&users)
        .bearer_auth(&token)
        .json(&ann)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, ann);

    // Read back at index 0.
    let resp = client
        .get(format!("{users}/0"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, ann);

    // Update.
    let older = json!({"name": "Ann", "age": 31, "city": "Oslo"});
    let resp = client
        .put(format!("{users}/0"))
        .bearer_auth(&token)
        .json(&older)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["age"], 31);

    // Delete.
    let resp = client
        .delete(format!("{users}/0"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    // Gone.
    let resp = client
        .get(format!("{users}/0"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn bad_ids_and_bodies_are_400() {
    let issuer = TestIssuer::new("key-1");
    let (_mock, server) = start_server(&issuer).await;
    let client = reqwest::Client::new();
    let token = issuer.token();
    let users = format!("{}/users", server.base);

    // Negative index is rejected before the store is consulted.
    let resp = client
        .get(format!("{users}/-1"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("{users}/abc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Malformed create body.
    let resp = client
        .post(&users)
        .bearer_auth(&token)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Wrong shape (age must be a non-negative integer).
    let resp = client
        .post(&users)
        .bearer_auth(&token)
        .json(&json!({"name": "Ann", "age": -1, "city": "Oslo"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Update paths combine both checks.
    let resp = client
        .put(format!("{users}/-1"))
        .bearer_auth(&token)
        .json(&json!({"name": "Ann", "age": 30, "city": "Oslo"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    server.stop().await;
}

#[tokio::test]
async fn profile_reports_token_subject() {
    let issuer = TestIssuer::new("key-1");
    let (_mock, server) = start_server(&issuer).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/profile", server.base))
        .bearer_auth(issuer.token())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["sub"], "user-1");

    server.stop().await;
}

#[tokio::test]
async fn login_round_trips_through_issuer() {
    let issuer = TestIssuer::new("key-1");
    let (mock, server) = start_server(&issuer).await;
    let client = reqwest::Client::new();
    let login = format!("{}/login", server.base);

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthenticationResult": {
                "AccessToken": "access",
                "IdToken": "id",
                "RefreshToken": "refresh",
                "ExpiresIn": 3600,
            },
        })))
        .mount(&mock)
        .await;

    let resp = client
        .post(&login)
        .json(&json!({"username": "ann", "password": "pw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["access_token"], "access");
    assert_eq!(body["id_token"], "id");
    assert_eq!(body["refresh_token"], "refresh");
    assert_eq!(body["expires_in"], 3600);

    // Malformed payload never reaches the issuer.
    let resp = client
        .post(&login)
        .json(&json!({"username": "ann"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    server.stop().await;
}

#[tokio::test]
async fn login_rejection_is_401() {
    let issuer = TestIssuer::new("key-1");
    let (mock, server) = start_server(&issuer).await;
    let client = reqwest::Client::new();

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "NotAuthorizedException",
            "message": "Incorrect username or password.",
        })))
        .mount(&mock)
        .await;

    let resp = client
        .post(format!("{}/login", server.base))
        .json(&json!({"username": "ann", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid username or password");

    server.stop().await;
}
