//! Integration tests for the sign-in flow and provider reconciliation.

mod helpers;

use std::time::Duration;

use caregate_auth::error::{AuthError, ChallengeError};
use caregate_auth::flow::{AuthState, ReconcileOutcome};
use caregate_auth::provider::SessionNotification;
use caregate_core::types::UserId;
use chrono::{TimeDelta, Utc};
use tokio::sync::watch;

use caregate_api::spawn_background_tasks;

#[tokio::test]
async fn test_patient_sign_in_is_immediately_authenticated() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-patient");

    let outcome = app
        .state
        .flow
        .sign_in(&caller, helpers::PATIENT_EMAIL, helpers::PASSWORD)
        .await
        .unwrap();

    assert!(!outcome.requires_mfa);
    assert_eq!(app.state.flow.state(&caller), AuthState::Authenticated);
    let session = app.state.store.current(&caller).unwrap();
    assert_eq!(session.email, helpers::PATIENT_EMAIL);
    assert!(session.is_usable());
}

#[tokio::test]
async fn test_email_is_case_insensitive() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-case");

    let outcome = app
        .state
        .flow
        .sign_in(&caller, "Patient@Care.Test", helpers::PASSWORD)
        .await
        .unwrap();
    assert!(!outcome.requires_mfa);
}

#[tokio::test]
async fn test_clinician_needs_code_before_session() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-clinician");

    let outcome = app
        .state
        .flow
        .sign_in(&caller, helpers::CLINICIAN_EMAIL, helpers::PASSWORD)
        .await
        .unwrap();
    assert!(outcome.requires_mfa);
    assert_eq!(app.state.flow.state(&caller), AuthState::MfaPending);
    assert!(app.state.store.current(&caller).is_none());

    app.state
        .flow
        .verify_mfa(&caller, helpers::VALID_CODE)
        .await
        .unwrap();
    assert_eq!(app.state.flow.state(&caller), AuthState::Authenticated);
    assert!(app.state.store.current(&caller).unwrap().mfa_satisfied);
}

#[tokio::test]
async fn test_bad_codes_exhaust_the_challenge() {
    let mut config = helpers::test_config();
    config.mfa.max_attempts = 2;
    let app = helpers::TestApp::with_config(config).await;
    let caller = helpers::caller("tab-guess");

    app.state
        .flow
        .sign_in(&caller, helpers::CLINICIAN_EMAIL, helpers::PASSWORD)
        .await
        .unwrap();

    let err = app.state.flow.verify_mfa(&caller, "nope").await.unwrap_err();
    assert_eq!(
        err,
        AuthError::from(ChallengeError::InvalidCode {
            remaining_attempts: 1
        })
    );
    let err = app.state.flow.verify_mfa(&caller, "nope").await.unwrap_err();
    assert_eq!(err, AuthError::from(ChallengeError::TooManyAttempts));

    // The challenge is gone; even a valid code cannot revive it.
    let err = app
        .state
        .flow
        .verify_mfa(&caller, helpers::VALID_CODE)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::from(ChallengeError::NoPendingChallenge));
    assert_eq!(app.state.flow.state(&caller), AuthState::Anonymous);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-enum");

    let wrong = app
        .state
        .flow
        .sign_in(&caller, helpers::PATIENT_EMAIL, "not-it")
        .await
        .unwrap_err();
    let unknown = app
        .state
        .flow
        .sign_in(&caller, "ghost@care.test", helpers::PASSWORD)
        .await
        .unwrap_err();

    assert_eq!(wrong, AuthError::InvalidCredentials);
    assert_eq!(unknown, AuthError::InvalidCredentials);
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[tokio::test]
async fn test_provider_outage_leaves_caller_anonymous() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-outage");
    app.provider.set_available(false);

    let err = app
        .state
        .flow
        .sign_in(&caller, helpers::PATIENT_EMAIL, helpers::PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ProviderUnavailable(_)));
    assert_eq!(app.state.flow.state(&caller), AuthState::Anonymous);
}

#[tokio::test]
async fn test_provider_sign_out_clears_session() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-remote");
    app.sign_in_fully("tab-remote", helpers::PATIENT_EMAIL).await;

    let notification =
        SessionNotification::signed_out(caller.clone()).issued_at(Utc::now() + TimeDelta::seconds(1));
    let outcome = app.state.flow.handle_notification(notification).await;

    assert_eq!(outcome, ReconcileOutcome::Applied);
    assert!(app.state.store.current(&caller).is_none());
}

#[tokio::test]
async fn test_stale_sign_out_is_ignored() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-stale");
    app.sign_in_fully("tab-stale", helpers::PATIENT_EMAIL).await;

    let notification = SessionNotification::signed_out(caller.clone())
        .issued_at(Utc::now() - TimeDelta::minutes(1));
    let outcome = app.state.flow.handle_notification(notification).await;

    assert_eq!(outcome, ReconcileOutcome::Stale);
    assert!(app.state.store.current(&caller).is_some());
}

#[tokio::test]
async fn test_refresh_for_mfa_user_requires_reverification() {
    let app = helpers::TestApp::new().await;
    app.sign_in_fully("tab-desk", helpers::CLINICIAN_EMAIL).await;
    let user_id = app
        .state
        .store
        .current(&helpers::caller("tab-desk"))
        .unwrap()
        .user_id;

    // A provider-side session on a fresh tab never becomes usable silently.
    let caller = helpers::caller("tab-silent");
    let credential = app.provider.issue_credential(user_id).await;
    let notification = SessionNotification::refreshed(
        caller.clone(),
        user_id,
        helpers::CLINICIAN_EMAIL,
        credential,
    )
    .issued_at(Utc::now() + TimeDelta::seconds(1));
    let outcome = app.state.flow.handle_notification(notification).await;

    assert_eq!(outcome, ReconcileOutcome::ReverificationRequired);
    assert!(app.state.store.current(&caller).is_none());
    assert_eq!(app.state.flow.state(&caller), AuthState::Anonymous);
}

#[tokio::test]
async fn test_refresh_for_unknown_user_changes_nothing() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-orphan");

    let notification = SessionNotification::refreshed(
        caller.clone(),
        UserId::new(),
        "orphan@care.test",
        app.provider.issue_credential(UserId::new()).await,
    );
    let outcome = app.state.flow.handle_notification(notification).await;

    assert_eq!(outcome, ReconcileOutcome::ProfileUnavailable);
    assert!(app.state.store.current(&caller).is_none());
}

#[tokio::test]
async fn test_background_reconciler_applies_provider_changes() {
    let app = helpers::TestApp::new().await;
    let caller = helpers::caller("tab-live");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = spawn_background_tasks(&app.state, shutdown_rx);

    app.sign_in_fully("tab-live", helpers::PATIENT_EMAIL).await;
    app.provider.publish(
        SessionNotification::signed_out(caller.clone()).issued_at(Utc::now() + TimeDelta::seconds(1)),
    );

    let cleared = tokio::time::timeout(Duration::from_secs(5), async {
        while app.state.store.current(&caller).is_some() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(cleared.is_ok(), "reconciler did not apply the sign-out");

    shutdown_tx.send(true).unwrap();
    for handle in handles {
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
