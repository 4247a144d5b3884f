use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use mangahub::{controllers::progress::ReadChaptersResponse, scope::Scope};

use crate::{AppStateTest, GUEST_ID, GUEST_ID_HEADER, bearer};

#[tokio::test]
async fn guest_is_allowed_without_authorization_header() {
    let test_state = AppStateTest::new(true);

    let request = Request::builder()
        .uri("/progress/chapters")
        .header(GUEST_ID_HEADER, GUEST_ID)
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn guest_without_id_is_rejected() {
    let test_state = AppStateTest::new(true);

    for guest_id in [None, Some(""), Some("not:valid")] {
        let mut builder = Request::builder().uri("/progress/chapters");
        if let Some(guest_id) = guest_id {
            builder = builder.header(GUEST_ID_HEADER, guest_id);
        }

        let response = test_state
            .generate_response(builder.body(Body::empty()).unwrap())
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn guest_is_forbidden_when_disabled() {
    let test_state = AppStateTest::new(false);

    let request = Request::builder()
        .uri("/progress/chapters")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn should_throw_error_when_auth_header_is_invalid() {
    let test_state = AppStateTest::new(true);

    let request = Request::builder()
        .uri("/progress/chapters")
        .header(header::AUTHORIZATION, "random-string")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_throw_error_when_auth_header_does_not_contain_bearer() {
    let test_state = AppStateTest::new(true);

    let request = Request::builder()
        .uri("/progress/chapters")
        .header(header::AUTHORIZATION, "not-bearer random-string")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_throw_error_when_jwt_token_is_invalid() {
    let test_state = AppStateTest::new(true);

    let request = Request::builder()
        .uri("/progress/chapters")
        .header(header::AUTHORIZATION, "bearer random-string")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_resolves_user_scope() {
    let test_state = AppStateTest::new(false);
    test_state
        .app_state
        .progress
        .mark_chapter_as_read(&Scope::user("user-7"), "ch-1");

    let request = Request::builder()
        .uri("/progress/chapters")
        .header(
            header::AUTHORIZATION,
            bearer(&test_state.token_for("user-7")),
        )
        .body(Body::empty())
        .unwrap();

    let response: ReadChaptersResponse = test_state.generate_json(request).await;

    assert_eq!(response.read, vec!["ch-1".to_string()]);
}
