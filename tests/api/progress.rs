use std::{collections::BTreeMap, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use mangahub::{
    controllers::progress::{ChangedResponse, CurrentlyReadingResponse, ReadChaptersResponse},
    scope::Scope,
};
use serde_json::json;

use crate::{AppStateTest, GUEST_ID, GUEST_ID_HEADER, bearer, guest_scope};

fn with_identity(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, bearer(token)),
        None => builder.header(GUEST_ID_HEADER, GUEST_ID),
    }
}

async fn mark_read(test_state: &AppStateTest, token: Option<&str>, chapter_id: &str) -> bool {
    let request = with_identity(Request::builder(), token)
        .method("POST")
        .uri(format!("/progress/chapters/{}/read", chapter_id))
        .body(Body::empty())
        .unwrap();

    let response: ChangedResponse = test_state.generate_json(request).await;
    response.changed
}

async fn read_chapters(test_state: &AppStateTest, token: Option<&str>) -> Vec<String> {
    let request = with_identity(Request::builder(), token)
        .uri("/progress/chapters")
        .body(Body::empty())
        .unwrap();

    let response: ReadChaptersResponse = test_state.generate_json(request).await;
    response.read
}

async fn set_reading(
    test_state: &AppStateTest,
    token: Option<&str>,
    manga_id: &str,
    chapter_id: &str,
) -> bool {
    let request = with_identity(Request::builder(), token)
        .method("PUT")
        .uri(format!("/progress/reading/{}", manga_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "chapter_id": chapter_id })).unwrap(),
        ))
        .unwrap();

    let response: ChangedResponse = test_state.generate_json(request).await;
    response.changed
}

async fn get_reading(test_state: &AppStateTest, token: Option<&str>, manga_id: &str) -> Option<String> {
    let request = with_identity(Request::builder(), token)
        .uri(format!("/progress/reading/{}", manga_id))
        .body(Body::empty())
        .unwrap();

    let response: CurrentlyReadingResponse = test_state.generate_json(request).await;
    response.chapter_id
}

#[tokio::test]
async fn read_chapters_is_empty_at_first() {
    let test_state = AppStateTest::new(true);

    assert!(read_chapters(&test_state, None).await.is_empty());
}

#[tokio::test]
async fn marking_twice_changes_once() {
    let test_state = AppStateTest::new(true);

    assert!(mark_read(&test_state, None, "ch-1").await);
    assert!(!mark_read(&test_state, None, "ch-1").await);

    assert_eq!(read_chapters(&test_state, None).await, vec!["ch-1"]);
}

#[tokio::test]
async fn guest_and_user_progress_are_disjoint() {
    let test_state = AppStateTest::new(true);
    let token = test_state.token_for("user-7");

    mark_read(&test_state, None, "ch-1").await;
    mark_read(&test_state, None, "ch-2").await;

    assert!(read_chapters(&test_state, Some(&token)).await.is_empty());

    mark_read(&test_state, Some(&token), "ch-3").await;

    assert_eq!(read_chapters(&test_state, None).await, vec!["ch-1", "ch-2"]);
    assert_eq!(read_chapters(&test_state, Some(&token)).await, vec!["ch-3"]);
}

#[tokio::test]
async fn reading_marker_lifecycle() {
    let test_state = AppStateTest::new(true);

    assert!(set_reading(&test_state, None, "manga-A", "ch-4").await);
    assert!(!set_reading(&test_state, None, "manga-A", "ch-4").await);
    assert_eq!(
        get_reading(&test_state, None, "manga-A").await,
        Some("ch-4".to_string())
    );

    let request = with_identity(Request::builder(), None)
        .uri("/progress/reading")
        .body(Body::empty())
        .unwrap();
    let all: BTreeMap<String, String> = test_state.generate_json(request).await;
    assert_eq!(all.get("manga-A"), Some(&"ch-4".to_string()));

    mark_read(&test_state, None, "ch-4").await;
    assert_eq!(get_reading(&test_state, None, "manga-A").await, None);
}

#[tokio::test]
async fn reading_marker_rejects_read_chapter() {
    let test_state = AppStateTest::new(true);

    mark_read(&test_state, None, "ch-9").await;

    assert!(!set_reading(&test_state, None, "manga-A", "ch-9").await);
    assert_eq!(get_reading(&test_state, None, "manga-A").await, None);
}

#[tokio::test]
async fn delete_reading_marker_is_idempotent() {
    let test_state = AppStateTest::new(true);
    set_reading(&test_state, None, "manga-A", "ch-1").await;

    for expected in [true, false] {
        let request = with_identity(Request::builder(), None)
            .method("DELETE")
            .uri("/progress/reading/manga-A")
            .body(Body::empty())
            .unwrap();

        let response = test_state.generate_response(request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let changed: ChangedResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(changed.changed, expected);
    }
}

#[tokio::test]
async fn events_stream_only_own_scope_changes() {
    let test_state = AppStateTest::new(true);

    let request = with_identity(Request::builder(), None)
        .uri("/progress/events")
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let progress = &test_state.app_state.progress;
    progress.mark_chapter_as_read(&Scope::user("user-7"), "ch-other");
    progress.mark_chapter_as_read(&Scope::device("device-other").unwrap(), "ch-guest");
    progress.mark_chapter_as_read(&guest_scope(), "ch-1");

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("no event within timeout")
        .unwrap()
        .unwrap();
    let data = frame.into_data().unwrap();
    let text = String::from_utf8(data.to_vec()).unwrap();

    assert!(text.contains("event: progress"));
    assert!(text.contains("\"chapter_id\":\"ch-1\""));
    assert!(!text.contains("ch-other"));
    assert!(!text.contains("ch-guest"));
}

#[tokio::test]
async fn guests_with_different_ids_are_disjoint() {
    let test_state = AppStateTest::new(true);

    let request = Request::builder()
        .method("POST")
        .uri("/progress/chapters/ch-A/read")
        .header(GUEST_ID_HEADER, "device-a")
        .body(Body::empty())
        .unwrap();
    let response: ChangedResponse = test_state.generate_json(request).await;
    assert!(response.changed);

    let request = Request::builder()
        .uri("/progress/chapters")
        .header(GUEST_ID_HEADER, "device-b")
        .body(Body::empty())
        .unwrap();
    let response: ReadChaptersResponse = test_state.generate_json(request).await;
    assert!(response.read.is_empty());

    assert_eq!(
        test_state
            .app_state
            .progress
            .read_chapters(&Scope::device("device-a").unwrap())
            .len(),
        1
    );
}
