//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use caregate_api::{AppState, build_app, build_state, seed_users};
use caregate_auth::mfa::FormatCodeVerifier;
use caregate_auth::password::PasswordHasher;
use caregate_auth::provider::InMemoryIdentityProvider;
use caregate_core::config::AppConfig;
use caregate_core::config::identity::SeedUser;
use caregate_core::types::CallerId;

pub const ADMIN_EMAIL: &str = "admin@care.test";
pub const CLINICIAN_EMAIL: &str = "clinician@care.test";
pub const PATIENT_EMAIL: &str = "patient@care.test";
pub const PASSWORD: &str = "seed-password";
/// Any six digits pass the format verifier.
pub const VALID_CODE: &str = "246810";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for direct inspection
    pub state: AppState,
    /// The identity provider behind the state
    pub provider: Arc<InMemoryIdentityProvider>,
    /// Session tokens handed out by sign-in, per caller
    tokens: Mutex<HashMap<String, String>>,
}

/// Response captured from the router
pub struct TestResponse {
    pub status: StatusCode,
    pub retry_after: Option<String>,
    pub body: Value,
}

/// Accounts every test app starts with: an admin (MFA), a clinician
/// (MFA, scope `ward:3`) and a patient (no MFA).
pub fn seed() -> Vec<SeedUser> {
    vec![
        seed_user(ADMIN_EMAIL, "admin", true, &[]),
        seed_user(CLINICIAN_EMAIL, "clinician", true, &["ward:3"]),
        seed_user(PATIENT_EMAIL, "patient", false, &[]),
    ]
}

fn seed_user(email: &str, role: &str, mfa_enrolled: bool, scopes: &[&str]) -> SeedUser {
    SeedUser {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role: role.to_string(),
        mfa_enrolled,
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
    }
}

/// Default test configuration with the seeded accounts.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.identity.seed_users = seed();
    config
}

impl TestApp {
    /// Create a new test application with default settings
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a new test application with the given settings
    pub async fn with_config(config: AppConfig) -> Self {
        let provider = Arc::new(InMemoryIdentityProvider::new(
            PasswordHasher::with_cost(8, 1, 1).expect("Failed to build hasher"),
        ));
        seed_users(&provider, &config.identity.seed_users)
            .await
            .expect("Failed to seed users");

        let verifier = Arc::new(FormatCodeVerifier::new(config.mfa.code_length));
        let state =
            build_state(config, provider.clone(), verifier).expect("Failed to build state");
        let router = build_app(state.clone());

        Self {
            router,
            state,
            provider,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// The session token sign-in returned for `caller`, if any
    pub fn token(&self, caller: &str) -> Option<String> {
        self.tokens.lock().unwrap().get(caller).cloned()
    }

    /// Make an HTTP request as `caller`, presenting its session token
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        caller: Option<&str>,
    ) -> TestResponse {
        let token = caller.and_then(|c| self.token(c));
        self.request_with_token(method, path, body, caller, token.as_deref())
            .await
    }

    /// Make an HTTP request as `caller` with an explicit bearer token
    pub async fn request_with_token(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        caller: Option<&str>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(caller) = caller {
            builder = builder.header("X-Caller-Id", caller);
        }
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("Failed to encode body"))
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            retry_after,
            body,
        }
    }

    /// Sign in through the API, remember the issued token, and return the
    /// response
    pub async fn sign_in(&self, caller: &str, email: &str, password: &str) -> TestResponse {
        let response = self
            .request(
                "POST",
                "/api/auth/sign-in",
                Some(serde_json::json!({ "email": email, "password": password })),
                Some(caller),
            )
            .await;

        if let Some(token) = response.body["data"]["session_token"].as_str() {
            self.tokens
                .lock()
                .unwrap()
                .insert(caller.to_string(), token.to_string());
        }
        response
    }

    /// Sign in and, if required, pass the second factor
    pub async fn sign_in_fully(&self, caller: &str, email: &str) {
        let response = self.sign_in(caller, email, PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK, "sign-in failed: {}", response.body);

        if response.body["data"]["requires_mfa"] == Value::Bool(true) {
            let response = self
                .request(
                    "POST",
                    "/api/auth/mfa/verify",
                    Some(serde_json::json!({ "code": VALID_CODE })),
                    Some(caller),
                )
                .await;
            assert_eq!(response.status, StatusCode::OK, "verify failed: {}", response.body);
        }
    }
}

/// Parse a caller identifier
pub fn caller(id: &str) -> CallerId {
    CallerId::parse(id).expect("Invalid caller id")
}
