//! Integration tests for admin-gated bulk provisioning.

mod helpers;

use caregate_auth::error::AccessDenied;
use caregate_auth::provider::IdentityProvider;
use caregate_auth::rate::RateToken;
use serde_json::json;

const STRONG: &str = "amber-glacier-orbit-93-meadow";

#[tokio::test]
async fn test_admin_batch_reports_each_item() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-admin", helpers::ADMIN_EMAIL).await;
    let caller = helpers::caller("tab-admin");

    let results = app
        .state
        .provisioning
        .provision(
            &caller,
            &RateToken::for_caller(&caller),
            vec![
                json!({ "email": "nurse@care.test", "password": STRONG, "role": "caregiver" }),
                json!({ "email": "broken@care.test", "password": 42 }),
                json!({ "email": "weak@care.test", "password": "password", "role": "patient" }),
                json!({ "email": "who@care.test", "password": STRONG, "role": "janitor" }),
                json!({ "email": helpers::PATIENT_EMAIL, "password": STRONG, "role": "patient" }),
            ],
        )
        .await
        .unwrap();

    let outcomes: Vec<(&str, bool)> = results
        .iter()
        .map(|r| (r.email.as_str(), r.success))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("nurse@care.test", true),
            ("broken@care.test", false),
            ("weak@care.test", false),
            ("who@care.test", false),
            (helpers::PATIENT_EMAIL, false),
        ]
    );
    assert!(results[1].message.starts_with("Malformed entry"));

    // The created account can sign in.
    assert!(
        app.provider
            .verify_credentials("nurse@care.test", STRONG)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_non_admin_batch_is_refused_before_any_item() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-doc", helpers::CLINICIAN_EMAIL).await;
    let caller = helpers::caller("tab-doc");

    let denied = app
        .state
        .provisioning
        .provision(
            &caller,
            &RateToken::for_caller(&caller),
            vec![json!({ "email": "sneaky@care.test", "password": STRONG, "role": "admin" })],
        )
        .await
        .unwrap_err();

    assert_eq!(denied, AccessDenied::InsufficientRole);
    assert!(
        app.provider
            .verify_credentials("sneaky@care.test", STRONG)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_admin_budget_applies_to_batches() {
    let mut config = helpers::test_config();
    config.rate_limit.admin_limit = 1;
    let app = helpers::TestApp::with_config(config).await;
    app.sign_in_fully("tab-admin", helpers::ADMIN_EMAIL).await;
    let caller = helpers::caller("tab-admin");
    let token = RateToken::for_caller(&caller);

    app.state
        .provisioning
        .provision(&caller, &token, vec![])
        .await
        .unwrap();
    let denied = app
        .state
        .provisioning
        .provision(&caller, &token, vec![])
        .await
        .unwrap_err();

    assert!(matches!(denied, AccessDenied::RateLimitExceeded { .. }));
}
