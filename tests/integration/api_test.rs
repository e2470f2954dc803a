//! End-to-end tests through the HTTP router.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_missing_caller_header_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/auth/session", None, None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_patient_sign_in_and_session() {
    let app = helpers::TestApp::new().await;

    let response = app
        .sign_in("tab-1", helpers::PATIENT_EMAIL, helpers::PASSWORD)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["requires_mfa"], false);
    assert_eq!(response.body["data"]["state"], "authenticated");

    let response = app.request("GET", "/api/auth/session", None, Some("tab-1")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["state"], "authenticated");
    assert_eq!(response.body["data"]["session"]["email"], helpers::PATIENT_EMAIL);
    assert_eq!(response.body["data"]["session"]["role"], "patient");
    assert!(response.body["data"]["session"].get("credential").is_none());
    assert_eq!(
        response.body["data"]["session"]["session_id"].as_str(),
        app.token("tab-1").as_deref()
    );
}

#[tokio::test]
async fn test_caller_id_alone_does_not_unlock_a_session() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-admin", helpers::ADMIN_EMAIL).await;
    let body = json!({ "users": [{ "email": "n@care.test", "password": "lunar-cobalt-prairie-63-willow", "role": "patient" }] });

    for token in [None, Some("not-a-token"), Some("7f1c1b8e-2a4b-4c55-9d1e-3f6a0b9c2d71")] {
        let response = app
            .request_with_token("POST", "/api/admin/users/bulk", Some(body.clone()), Some("tab-admin"), token)
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let response = app
            .request_with_token("GET", "/api/auth/session", None, Some("tab-admin"), token)
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let response = app
            .request_with_token("POST", "/api/auth/sign-out", None, Some("tab-admin"), token)
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
    assert!(app.state.store.current(&helpers::caller("tab-admin")).is_some());

    let response = app
        .request("POST", "/api/admin/users/bulk", Some(body), Some("tab-admin"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["created"], 1);
}

#[tokio::test]
async fn test_challenge_token_does_not_unlock_stored_session() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-shared", helpers::ADMIN_EMAIL).await;
    let admin_token = app.token("tab-shared").unwrap();

    let response = app
        .sign_in("tab-shared", helpers::CLINICIAN_EMAIL, helpers::PASSWORD)
        .await;
    assert_eq!(response.body["data"]["requires_mfa"], true);
    assert_ne!(app.token("tab-shared").unwrap(), admin_token);

    let body = json!({ "users": [{ "email": "m@care.test", "password": "lunar-cobalt-prairie-64-willow", "role": "patient" }] });
    let response = app
        .request("POST", "/api/admin/users/bulk", Some(body.clone()), Some("tab-shared"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.request("GET", "/api/auth/session", None, Some("tab-shared")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["state"], "mfa_pending");
    assert!(response.body["data"]["session"].is_null());

    let response = app
        .request_with_token(
            "POST",
            "/api/admin/users/bulk",
            Some(body),
            Some("tab-shared"),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_credentials_are_generic() {
    let app = helpers::TestApp::new().await;

    let response = app
        .sign_in("tab-1", helpers::PATIENT_EMAIL, "wrong-password")
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_malformed_email_is_a_validation_error() {
    let app = helpers::TestApp::new().await;

    let response = app.sign_in("tab-1", "not-an-email", "whatever").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mfa_flow_over_http() {
    let app = helpers::TestApp::new().await;

    let response = app
        .sign_in("tab-2", helpers::CLINICIAN_EMAIL, helpers::PASSWORD)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["requires_mfa"], true);
    assert_eq!(response.body["data"]["state"], "mfa_pending");

    // A second sign-in while the challenge is live is a conflict.
    let response = app
        .sign_in("tab-2", helpers::CLINICIAN_EMAIL, helpers::PASSWORD)
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .request(
            "POST",
            "/api/auth/mfa/verify",
            Some(json!({ "code": "12ab" })),
            Some("tab-2"),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            "POST",
            "/api/auth/mfa/verify",
            Some(json!({ "code": helpers::VALID_CODE })),
            Some("tab-2"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["state"], "authenticated");
    assert_eq!(response.body["data"]["session"]["mfa_satisfied"], true);
}

#[tokio::test]
async fn test_verify_without_challenge_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/mfa/verify",
            Some(json!({ "code": helpers::VALID_CODE })),
            Some("tab-3"),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_out_twice_is_safe() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-4", helpers::PATIENT_EMAIL).await;

    for _ in 0..2 {
        let response = app.request("POST", "/api/auth/sign-out", None, Some("tab-4")).await;
        assert_eq!(response.status, StatusCode::OK);

        let response = app.request("GET", "/api/auth/session", None, Some("tab-4")).await;
        assert_eq!(response.body["data"]["state"], "anonymous");
        assert!(response.body["data"]["session"].is_null());
    }
}

#[tokio::test]
async fn test_sign_in_is_throttled_with_retry_after() {
    let mut config = helpers::test_config();
    config.auth.sign_in_limit = 2;
    let app = helpers::TestApp::with_config(config).await;

    for _ in 0..2 {
        let response = app.sign_in("tab-5", helpers::PATIENT_EMAIL, "wrong").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = app
        .sign_in("tab-5", helpers::PATIENT_EMAIL, helpers::PASSWORD)
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["error"], "RATE_LIMITED");
    let retry_after: u64 = response.retry_after.unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));

    // Another caller has its own budget.
    let response = app
        .sign_in("tab-6", helpers::PATIENT_EMAIL, helpers::PASSWORD)
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_bulk_create_requires_admin() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-7", helpers::PATIENT_EMAIL).await;

    let body = json!({ "users": [{ "email": "x@care.test", "password": "p", "role": "patient" }] });

    let response = app
        .request("POST", "/api/admin/users/bulk", Some(body.clone()), Some("tab-anon"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("POST", "/api/admin/users/bulk", Some(body), Some("tab-7"))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_create_partial_success() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-8", helpers::ADMIN_EMAIL).await;

    let response = app
        .request(
            "POST",
            "/api/admin/users/bulk",
            Some(json!({
                "users": [
                    { "email": "a@care.test", "password": "lunar-cobalt-prairie-61-willow", "role": "researcher" },
                    "not an object",
                    { "email": "c@care.test", "password": "lunar-cobalt-prairie-62-willow", "role": "caregiver" },
                ]
            })),
            Some("tab-8"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["created"], 2);
    assert_eq!(data["failed"], 1);
    assert_eq!(data["results"][0]["success"], true);
    assert_eq!(data["results"][1]["success"], false);
    assert_eq!(data["results"][2]["email"], "c@care.test");
    assert_eq!(data["results"][2]["success"], true);
}
