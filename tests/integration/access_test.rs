//! Integration tests for the access guard.

mod helpers;

use std::num::NonZeroU32;

use caregate_auth::error::AccessDenied;
use caregate_auth::flow::{AuthState, ReconcileOutcome};
use caregate_auth::provider::SessionNotification;
use caregate_auth::rate::RateToken;
use caregate_entity::session::ResourceScope;
use caregate_entity::user::{Role, RoleProfile};
use chrono::{TimeDelta, Utc};

const CLINICAL: &[Role] = &[Role::Clinician, Role::Caregiver];

fn limit(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

#[tokio::test]
async fn test_anonymous_caller_is_unauthenticated() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-anon");

    let denied = app
        .state
        .access
        .authorize(&caller, &Role::ALL, None, &RateToken::for_caller(&caller), limit(5))
        .unwrap_err();

    assert_eq!(denied, AccessDenied::Unauthenticated);
}

#[tokio::test]
async fn test_pending_challenge_is_not_a_session() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-half");
    app.sign_in(
        "tab-half",
        helpers::CLINICIAN_EMAIL,
        helpers::PASSWORD,
    )
    .await;

    let denied = app
        .state
        .access
        .authorize(&caller, CLINICAL, None, &RateToken::for_caller(&caller), limit(5))
        .unwrap_err();

    assert_eq!(denied, AccessDenied::Unauthenticated);
}

#[tokio::test]
async fn test_role_and_scope_checks() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-doc", helpers::CLINICIAN_EMAIL).await;
    app.sign_in_fully("tab-pat", helpers::PATIENT_EMAIL).await;
    let doc = helpers::caller("tab-doc");
    let pat = helpers::caller("tab-pat");
    let doc_session = app.state.store.current(&doc).unwrap();
    let doc_token = RateToken::for_user(&doc_session.user_id);

    let granted = app
        .state
        .access
        .authorize(&doc, CLINICAL, Some(&ResourceScope::new("ward:3")), &doc_token, limit(5))
        .unwrap();
    assert_eq!(granted.role, Role::Clinician);

    let denied = app
        .state
        .access
        .authorize(&doc, CLINICAL, Some(&ResourceScope::new("ward:4")), &doc_token, limit(5))
        .unwrap_err();
    assert_eq!(denied, AccessDenied::ScopeDenied);

    let pat_session = app.state.store.current(&pat).unwrap();
    let denied = app
        .state
        .access
        .authorize(
            &pat,
            CLINICAL,
            None,
            &RateToken::for_user(&pat_session.user_id),
            limit(5),
        )
        .unwrap_err();
    assert_eq!(denied, AccessDenied::InsufficientRole);
}

#[tokio::test]
async fn test_budget_is_charged_only_on_success() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-busy", helpers::CLINICIAN_EMAIL).await;
    let caller = helpers::caller("tab-busy");
    let token = RateToken::for_caller(&caller);
    let ward_9 = ResourceScope::new("ward:9");

    for _ in 0..5 {
        let denied = app
            .state
            .access
            .authorize(&caller, CLINICAL, Some(&ward_9), &token, limit(2))
            .unwrap_err();
        assert_eq!(denied, AccessDenied::ScopeDenied);
    }

    for _ in 0..2 {
        app.state
            .access
            .authorize(&caller, CLINICAL, None, &token, limit(2))
            .unwrap();
    }
    let denied = app
        .state
        .access
        .authorize(&caller, CLINICAL, None, &token, limit(2))
        .unwrap_err();
    assert!(matches!(denied, AccessDenied::RateLimitExceeded { .. }));
}

#[tokio::test]
async fn test_newly_enrolled_mfa_blocks_refreshed_session() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-enroll", helpers::PATIENT_EMAIL).await;
    let caller = helpers::caller("tab-enroll");
    let session = app.state.store.current(&caller).unwrap();

    app.provider
        .set_profile(session.user_id, RoleProfile::new(Role::Patient, true))
        .await;
    let credential = app.provider.issue_credential(session.user_id).await;
    let outcome = app
        .state
        .flow
        .handle_notification(
            SessionNotification::refreshed(
                caller.clone(),
                session.user_id,
                helpers::PATIENT_EMAIL,
                credential,
            )
            .issued_at(Utc::now() + TimeDelta::seconds(1)),
        )
        .await;
    assert_eq!(outcome, ReconcileOutcome::Applied);

    let refreshed = app.state.store.current(&caller).unwrap();
    assert_eq!(refreshed.id, session.id);
    assert!(refreshed.mfa_required);
    assert!(!refreshed.is_usable());
    assert_eq!(app.state.flow.state(&caller), AuthState::MfaPending);

    let denied = app
        .state
        .access
        .authorize(
            &caller,
            &[Role::Patient],
            None,
            &RateToken::for_user(&session.user_id),
            limit(5),
        )
        .unwrap_err();
    assert_eq!(denied, AccessDenied::MfaRequired);
}
