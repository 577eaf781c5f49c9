// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password identity tests against a local stand-in for the
//! Identity Toolkit REST API.

use axum::{
    body::Body,
    http::{header, Request, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use futures_util::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use trip_planner::config::Config;
use trip_planner::db::FirestoreDb;
use trip_planner::error::AppError;
use trip_planner::routes::create_router;
use trip_planner::services::{
    FirebaseAuth, IdentityProvider, SessionHandle, SessionOptions, TripService,
};
use trip_planner::validation::Credentials;
use trip_planner::AppState;

mod common;
use common::FakeMembership;

const KNOWN_EMAIL: &str = "ana@example.com";
const KNOWN_PASSWORD: &str = "secret1";

fn error_body(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": {"code": 400, "message": message, "errors": []}})),
    )
        .into_response()
}

async fn identity_toolkit(uri: Uri, Json(body): Json<Value>) -> axum::response::Response {
    if !uri.query().unwrap_or("").contains("key=test_api_key") {
        return error_body("API key not valid. Please pass a valid API key.");
    }

    let email = body["email"].as_str().unwrap_or("");
    let password = body["password"].as_str().unwrap_or("");

    match uri.path() {
        "/accounts:signInWithPassword" if email == KNOWN_EMAIL && password == KNOWN_PASSWORD => {
            Json(json!({
                "localId": "uid-ana",
                "email": KNOWN_EMAIL,
                "displayName": "Ana",
                "idToken": "token",
                "registered": true,
            }))
            .into_response()
        }
        "/accounts:signInWithPassword" => error_body("INVALID_LOGIN_CREDENTIALS"),
        "/accounts:signUp" if email == KNOWN_EMAIL => error_body("EMAIL_EXISTS"),
        "/accounts:signUp" => Json(json!({
            "localId": "uid-new",
            "email": email,
            "idToken": "token",
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve the stand-in on an ephemeral port and return a client for it.
async fn start_identity_toolkit() -> FirebaseAuth {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(identity_toolkit);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FirebaseAuth::new(&format!("http://{}", addr), "test_api_key")
}

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_sign_in_publishes_identity() {
    let auth = start_identity_toolkit().await;
    let mut updates = auth.subscribe();
    assert_eq!(updates.next().await.unwrap().unwrap(), None);

    let identity = auth
        .sign_in(&credentials(KNOWN_EMAIL, KNOWN_PASSWORD))
        .await
        .unwrap();

    assert_eq!(identity.uid, "uid-ana");
    assert_eq!(identity.label(), "Ana");
    assert_eq!(updates.next().await.unwrap().unwrap(), Some(identity.clone()));
    assert_eq!(auth.current_identity(), Some(identity));
}

#[tokio::test]
async fn test_sign_in_wrong_password() {
    let auth = start_identity_toolkit().await;

    let err = auth
        .sign_in(&credentials(KNOWN_EMAIL, "wrong-password"))
        .await
        .unwrap_err();

    assert!(err.is_credential_error());
    assert!(matches!(err, AppError::IdentityProvider(msg) if msg == "INVALID_LOGIN_CREDENTIALS"));
    assert_eq!(auth.current_identity(), None);
}

#[tokio::test]
async fn test_sign_up_new_account_signs_in() {
    let auth = start_identity_toolkit().await;

    let identity = auth
        .sign_up(&credentials("ben@example.com", "secret2"))
        .await
        .unwrap();

    assert_eq!(identity.uid, "uid-new");
    assert_eq!(identity.display_name, None);
    assert_eq!(identity.label(), "ben@example.com");
    assert_eq!(auth.current_identity().map(|i| i.uid), Some("uid-new".to_string()));
}

#[tokio::test]
async fn test_sign_up_existing_email() {
    let auth = start_identity_toolkit().await;

    let err = auth
        .sign_up(&credentials(KNOWN_EMAIL, "secret2"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::IdentityProvider(ref msg) if msg == AppError::EMAIL_EXISTS));
}

#[tokio::test]
async fn test_unreachable_provider_is_not_a_credential_error() {
    let auth = FirebaseAuth::new("http://127.0.0.1:1", "test_api_key");

    let err = auth
        .sign_in(&credentials(KNOWN_EMAIL, KNOWN_PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::IdentityProvider(_)));
    assert!(!err.is_credential_error());
}

#[tokio::test]
async fn test_sign_out_clears_identity() {
    let auth = start_identity_toolkit().await;
    auth.sign_in(&credentials(KNOWN_EMAIL, KNOWN_PASSWORD))
        .await
        .unwrap();

    let mut updates = auth.subscribe();
    assert!(updates.next().await.unwrap().unwrap().is_some());

    auth.sign_out().await.unwrap();
    assert_eq!(updates.next().await.unwrap().unwrap(), None);
    assert_eq!(auth.current_identity(), None);
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Router whose session follows the stand-in provider.
async fn app_with_identity_toolkit() -> (Router, Arc<AppState>) {
    let config = Config::test_default();
    let auth = start_identity_toolkit().await;
    let session = SessionHandle::spawn(
        Arc::new(auth.clone()),
        FakeMembership::new(),
        SessionOptions::from(&config),
    );

    let state = Arc::new(AppState {
        trips: TripService::new(FirestoreDb::new_mock(), config.invite_code_attempts),
        config,
        auth: auth.clone(),
        identity: Arc::new(auth),
        session,
    });

    (create_router(state.clone()), state)
}

#[tokio::test]
async fn test_sign_in_route_responds_after_session_follows() {
    let (router, state) = app_with_identity_toolkit().await;

    let response = router
        .clone()
        .oneshot(post_json(
            "/auth/sign-in",
            json!({"email": KNOWN_EMAIL, "password": KNOWN_PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let identity = state.session.snapshot().identity;
    assert_eq!(identity.map(|i| i.uid), Some("uid-ana".to_string()));

    // Reaches validation instead of being turned away as signed out
    let response = router
        .oneshot(post_json("/api/trips/join", json!({"code": "AB1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_out_route_responds_after_session_follows() {
    let (router, state) = app_with_identity_toolkit().await;
    state
        .auth
        .sign_in(&credentials(KNOWN_EMAIL, KNOWN_PASSWORD))
        .await
        .unwrap();
    state.session.wait_for_identity(Some("uid-ana")).await.unwrap();

    let response = router
        .clone()
        .oneshot(post_json("/auth/sign-out", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.session.snapshot().identity.is_none());

    let response = router
        .oneshot(post_json("/api/trips/join", json!({"code": "AB1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
