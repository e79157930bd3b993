// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the identity authority.
//!
//! One [`SsoClient`] serves both the permission check used by the
//! authorization pipeline and the register/login pass-through. Each attempt
//! is bounded by the configured timeout. Retries happen only on transport
//! timeouts and on the statuses the authority uses for transient failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::auth::{IdentityError, IdentityProvider, PermissionError, PermissionProvider, UserId};
use crate::config::SsoConfig;

/// First retry delay; doubles per attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF_SHIFT: u32 = 5;

/// Transient for every call.
const TRANSIENT: &[StatusCode] = &[
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Also transient for the permission lookup, where "not found" and
/// "conflict" mean the authority has not caught up yet.
const TRANSIENT_LOOKUP: &[StatusCode] = &[
    StatusCode::NOT_FOUND,
    StatusCode::CONFLICT,
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

#[derive(Debug, thiserror::Error)]
pub enum SsoError {
    #[error("failed to build authority client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid authority endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Failure of a single logical call after retries.
#[derive(Debug)]
enum CallError {
    Status(StatusCode, String),
    Transport(String),
    Decode(String),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(status, body) if body.is_empty() => write!(f, "HTTP {status}"),
            Self::Status(status, body) => write!(f, "HTTP {status}: {body}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Decode(e) => write!(f, "malformed response: {e}"),
        }
    }
}

#[derive(Serialize)]
struct IsAdminRequest {
    user_id: UserId,
}

#[derive(Deserialize)]
struct IsAdminReply {
    is_admin: bool,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RegisterReply {
    user_id: UserId,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    app_id: i32,
}

#[derive(Deserialize)]
struct LoginReply {
    token: String,
}

#[derive(Debug, Clone)]
struct Endpoints {
    is_admin: Url,
    register: Url,
    login: Url,
}

impl Endpoints {
    fn new(addr: &Url) -> Result<Self, url::ParseError> {
        // Url::join drops the last segment unless the base ends with '/'.
        let mut base = addr.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            is_admin: base.join("v1/auth/is-admin")?,
            register: base.join("v1/auth/register")?,
            login: base.join("v1/auth/login")?,
        })
    }
}

/// Identity authority client.
#[derive(Clone)]
pub struct SsoClient {
    client: reqwest::Client,
    endpoints: Endpoints,
    timeout: Duration,
    retries: u32,
}

impl SsoClient {
    pub fn new(config: &SsoConfig) -> Result<Self, SsoError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoints: Endpoints::new(&config.addr)?,
            timeout: config.timeout,
            retries: config.retries,
        })
    }

    /// Worst-case wall time of one logical call, retries and backoff included.
    pub fn call_budget(&self) -> Duration {
        let attempts = self.retries.saturating_add(1);
        let backoff = (0..self.retries)
            .map(backoff)
            .fold(Duration::ZERO, Duration::saturating_add);
        self.timeout.saturating_mul(attempts).saturating_add(backoff)
    }

    async fn call<B, R>(
        &self,
        op: &'static str,
        url: &Url,
        body: &B,
        retry_on: &[StatusCode],
    ) -> Result<R, CallError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut attempt = 0;
        loop {
            let outcome = self.client.post(url.clone()).json(body).send().await;
            let retryable = match outcome {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<R>()
                        .await
                        .map_err(|e| CallError::Decode(e.to_string()));
                }
                Ok(response) => {
                    let status = response.status();
                    if !retry_on.contains(&status) || attempt >= self.retries {
                        let body = response.text().await.unwrap_or_default();
                        return Err(CallError::Status(status, body));
                    }
                    format!("HTTP {status}")
                }
                Err(e) if e.is_timeout() && attempt < self.retries => e.to_string(),
                Err(e) => return Err(CallError::Transport(e.to_string())),
            };

            let delay = backoff(attempt);
            attempt += 1;
            tracing::warn!(
                op,
                attempt,
                max_retries = self.retries,
                delay_ms = delay.as_millis() as u64,
                error = %retryable,
                "authority call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    BASE_BACKOFF.saturating_mul(1 << attempt.min(MAX_BACKOFF_SHIFT))
}

#[async_trait]
impl PermissionProvider for SsoClient {
    async fn is_admin(&self, uid: UserId) -> Result<bool, PermissionError> {
        let reply: IsAdminReply = self
            .call(
                "is_admin",
                &self.endpoints.is_admin,
                &IsAdminRequest { user_id: uid },
                TRANSIENT_LOOKUP,
            )
            .await
            .map_err(|e| match &e {
                CallError::Status(status, _) if status.is_client_error() => {
                    PermissionError::Rejected(e.to_string())
                }
                _ => PermissionError::Unavailable(e.to_string()),
            })?;
        Ok(reply.is_admin)
    }
}

fn identity_error(e: CallError) -> IdentityError {
    match e {
        CallError::Status(StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED, _) => {
            IdentityError::InvalidCredentials
        }
        CallError::Status(StatusCode::CONFLICT, _) => IdentityError::AlreadyExists,
        other => IdentityError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for SsoClient {
    async fn register(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        let reply: RegisterReply = self
            .call(
                "register",
                &self.endpoints.register,
                &RegisterRequest { email, password },
                TRANSIENT,
            )
            .await
            .map_err(identity_error)?;
        Ok(reply.user_id)
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
        app_id: i32,
    ) -> Result<String, IdentityError> {
        let reply: LoginReply = self
            .call(
                "login",
                &self.endpoints.login,
                &LoginRequest {
                    email,
                    password,
                    app_id,
                },
                TRANSIENT,
            )
            .await
            .map_err(identity_error)?;
        Ok(reply.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted authority: pops one status per request, then answers 200.
    struct FakeAuthority {
        script: Mutex<VecDeque<u16>>,
        calls: AtomicUsize,
    }

    impl FakeAuthority {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn next_status(&self) -> AxumStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let code = self.script.lock().unwrap().pop_front().unwrap_or(200);
            AxumStatus::from_u16(code).unwrap()
        }
    }

    async fn is_admin(
        State(fake): State<Arc<FakeAuthority>>,
        Json(body): Json<Value>,
    ) -> (AxumStatus, Json<Value>) {
        let status = fake.next_status();
        (status, Json(json!({"is_admin": body["user_id"] == 1})))
    }

    async fn register(
        State(fake): State<Arc<FakeAuthority>>,
        Json(_body): Json<Value>,
    ) -> (AxumStatus, Json<Value>) {
        (fake.next_status(), Json(json!({"user_id": 42})))
    }

    async fn login(
        State(fake): State<Arc<FakeAuthority>>,
        Json(body): Json<Value>,
    ) -> (AxumStatus, Json<Value>) {
        let status = fake.next_status();
        if body["password"] != "secret" {
            return (AxumStatus::UNAUTHORIZED, Json(json!({"error": "bad"})));
        }
        (status, Json(json!({"token": format!("t-{}", body["app_id"])})))
    }

    async fn spawn_authority(script: &[u16]) -> (Arc<FakeAuthority>, SocketAddr) {
        let fake = Arc::new(FakeAuthority {
            script: Mutex::new(script.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/sso/v1/auth/is-admin", post(is_admin))
            .route("/sso/v1/auth/register", post(register))
            .route("/sso/v1/auth/login", post(login))
            .with_state(fake.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (fake, addr)
    }

    fn client(addr: SocketAddr, retries: u32) -> SsoClient {
        SsoClient::new(&SsoConfig {
            addr: Url::parse(&format!("http://{addr}/sso")).unwrap(),
            timeout: Duration::from_secs(2),
            retries,
        })
        .unwrap()
    }

    #[test]
    fn endpoints_keep_base_path() {
        let endpoints = Endpoints::new(&Url::parse("http://auth.local:44044/sso").unwrap()).unwrap();
        assert_eq!(
            endpoints.is_admin.as_str(),
            "http://auth.local:44044/sso/v1/auth/is-admin"
        );
        let endpoints = Endpoints::new(&Url::parse("http://auth.local:44044").unwrap()).unwrap();
        assert_eq!(endpoints.login.as_str(), "http://auth.local:44044/v1/auth/login");
    }

    #[test]
    fn call_budget_covers_retries_and_backoff() {
        let client = SsoClient::new(&SsoConfig {
            addr: Url::parse("http://localhost:44044").unwrap(),
            timeout: Duration::from_secs(5),
            retries: 3,
        })
        .unwrap();
        // 4 attempts of 5s plus 100 + 200 + 400 ms of backoff.
        assert_eq!(client.call_budget(), Duration::from_millis(20_700));
    }

    #[test]
    fn call_budget_saturates_instead_of_overflowing() {
        let client = SsoClient::new(&SsoConfig {
            addr: Url::parse("http://localhost:44044").unwrap(),
            timeout: Duration::from_secs(u64::MAX),
            retries: 10,
        })
        .unwrap();
        assert_eq!(client.call_budget(), Duration::MAX);
    }

    #[tokio::test]
    async fn is_admin_reads_answer() {
        let (fake, addr) = spawn_authority(&[]).await;
        let client = client(addr, 2);
        assert_eq!(client.is_admin(1).await, Ok(true));
        assert_eq!(client.is_admin(2).await, Ok(false));
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn is_admin_retries_transient_statuses() {
        let (fake, addr) = spawn_authority(&[503, 404]).await;
        let client = client(addr, 2);
        assert_eq!(client.is_admin(1).await, Ok(true));
        assert_eq!(fake.calls(), 3);
    }

    #[tokio::test]
    async fn is_admin_gives_up_after_retry_budget() {
        let (fake, addr) = spawn_authority(&[503, 503, 503]).await;
        let client = client(addr, 1);
        assert!(matches!(
            client.is_admin(1).await,
            Err(PermissionError::Unavailable(_))
        ));
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn is_admin_client_error_is_rejection() {
        let (fake, addr) = spawn_authority(&[400]).await;
        let client = client(addr, 3);
        assert!(matches!(
            client.is_admin(1).await,
            Err(PermissionError::Rejected(_))
        ));
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn unreachable_authority_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(addr, 0);
        assert!(matches!(
            client.is_admin(1).await,
            Err(PermissionError::Unavailable(_))
        ));
        assert!(matches!(
            client.login("a@b.c", "secret", 1).await,
            Err(IdentityError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn login_returns_token_and_maps_rejection() {
        let (fake, addr) = spawn_authority(&[]).await;
        let client = client(addr, 3);

        assert_eq!(client.login("a@b.c", "secret", 7).await, Ok("t-7".to_string()));
        assert_eq!(
            client.login("a@b.c", "wrong", 7).await,
            Err(IdentityError::InvalidCredentials)
        );
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn register_conflict_is_not_retried() {
        let (fake, addr) = spawn_authority(&[409]).await;
        let client = client(addr, 3);

        assert_eq!(
            client.register("a@b.c", "pw").await,
            Err(IdentityError::AlreadyExists)
        );
        assert_eq!(fake.calls(), 1);
        assert_eq!(client.register("a@b.c", "pw").await, Ok(42));
    }

    #[tokio::test]
    async fn register_retries_unavailable_authority() {
        let (fake, addr) = spawn_authority(&[502, 500]).await;
        let client = client(addr, 3);

        assert!(matches!(
            client.register("a@b.c", "pw").await,
            Err(IdentityError::Unavailable(_))
        ));
        assert_eq!(fake.calls(), 2);
    }
}
