#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use http::{Request, Response};
use http_body_util::BodyExt;
use tempfile::TempDir;
use url::Url;

use vault_daemon::http_server::api::client::ApiClient;
use vault_daemon::http_server::{self, api::v0::auth::RegisterRequest};
use vault_daemon::{ServiceConfig, ServiceState};

pub struct TestVault {
    pub state: ServiceState,
    pub router: Router,
    _dir: TempDir,
}

pub async fn vault() -> TestVault {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        api_port: 0,
        sqlite_path: None,
        blobs_path: dir.path().join("blobs"),
        jwt_secret: vec![7u8; 32],
        token_ttl: Duration::from_secs(300),
        aggregate_timeout: Duration::from_secs(5),
        log_level: tracing::Level::DEBUG,
        log_dir: None,
    };
    let state = ServiceState::from_config(&config).await.unwrap();
    let router = http_server::router(
        http_server::Config::new(SocketAddr::from(([127, 0, 0, 1], 0))),
        state.clone(),
    );

    TestVault {
        state,
        router,
        _dir: dir,
    }
}

impl TestVault {
    /// Serve the router on an ephemeral port and return its base URL.
    pub async fn serve(&self) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    /// Register an account directly against the state and return a client
    /// carrying its token.
    pub async fn client_for(&self, remote: &Url, login: &str) -> ApiClient {
        let client = ApiClient::new(remote).unwrap();
        let response = client
            .call(RegisterRequest {
                login: login.to_string(),
                password: format!("{}-password", login),
            })
            .await
            .unwrap();
        client.with_token(&response.token).unwrap()
    }

    pub async fn token_for(&self, login: &str) -> String {
        let (_, token) = self
            .state
            .auth()
            .register(self.state.database(), login, &format!("{}-password", login))
            .await
            .unwrap();
        token
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
