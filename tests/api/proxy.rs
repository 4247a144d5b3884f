use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;

use crate::{AppStateTest, upstream::spawn_upstream};

#[tokio::test]
async fn escaping_path_is_rejected() {
    let test_state = AppStateTest::new(false);

    let request = Request::builder()
        .uri("/proxy/manga/%2E%2E/secret")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let test_state = AppStateTest::new(false);

    let request = Request::builder()
        .uri("/proxy/manga?includes%5B%5D=cover_art&includes%5B%5D=author")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn decoded_query_in_path_is_rejected() {
    let test_state = AppStateTest::new(false);

    for uri in ["/proxy/manga%3Flimit=100", "/proxy/manga%23top"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

        let response = test_state.generate_response(request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn successful_relay_is_cacheable_and_keeps_repeated_keys() {
    let upstream = spawn_upstream().await;
    let test_state = AppStateTest::with_upstream(upstream.base_url);

    let request = Request::builder()
        .uri("/proxy/echo?includes%5B%5D=cover_art&includes%5B%5D=author")
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "s-maxage=60, stale-while-revalidate"
    );
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        body["query"],
        "includes%5B%5D=cover_art&includes%5B%5D=author"
    );
}

#[tokio::test]
async fn upstream_failure_status_and_body_pass_through() {
    let upstream = spawn_upstream().await;
    let test_state = AppStateTest::with_upstream(upstream.base_url);

    let request = Request::builder()
        .uri("/proxy/missing")
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["result"], "error");
}
