use std::{collections::BTreeMap, convert::Infallible};

use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    error::Error, scope::Scope, state::SharedAppState, telemetry::spawn_blocking_with_tracing,
};

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ReadChaptersResponse {
    pub read: Vec<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq)]
pub struct ChangedResponse {
    pub changed: bool,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct CurrentlyReadingResponse {
    pub chapter_id: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct CurrentlyReadingRequest {
    pub chapter_id: String,
}

#[tracing::instrument(name = "[GET] progress chapters", skip_all, fields(scope = %scope))]
pub async fn read_index(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
) -> Result<Json<ReadChaptersResponse>, Error> {
    let read = spawn_blocking_with_tracing(move || app_state.progress.read_chapters(&scope))
        .await
        .context("get read chapters")
        .map_err(Error::Other)?;

    Ok(Json(ReadChaptersResponse {
        read: read.into_iter().collect(),
    }))
}

#[tracing::instrument(name = "[POST] progress chapters/{id}/read", skip_all, fields(scope = %scope, chapter_id))]
pub async fn read_store(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
    Path(chapter_id): Path<String>,
) -> Result<Json<ChangedResponse>, Error> {
    let changed = spawn_blocking_with_tracing(move || {
        app_state.progress.mark_chapter_as_read(&scope, &chapter_id)
    })
    .await
    .context("mark chapter as read")
    .map_err(Error::Other)?;

    Ok(Json(ChangedResponse { changed }))
}

#[tracing::instrument(name = "[GET] progress reading", skip_all, fields(scope = %scope))]
pub async fn reading_index(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
) -> Result<Json<BTreeMap<String, String>>, Error> {
    let reading = spawn_blocking_with_tracing(move || app_state.progress.currently_reading_all(&scope))
        .await
        .context("get currently reading")
        .map_err(Error::Other)?;

    Ok(Json(reading))
}

#[tracing::instrument(name = "[GET] progress reading/{id}", skip_all, fields(scope = %scope))]
pub async fn reading_show(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
    Path(manga_id): Path<String>,
) -> Result<Json<CurrentlyReadingResponse>, Error> {
    let chapter_id = spawn_blocking_with_tracing(move || {
        app_state.progress.currently_reading(&scope, &manga_id)
    })
    .await
    .context("get currently reading chapter")
    .map_err(Error::Other)?;

    Ok(Json(CurrentlyReadingResponse { chapter_id }))
}

#[tracing::instrument(name = "[PUT] progress reading/{id}", skip_all, fields(scope = %scope))]
pub async fn reading_update(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
    Path(manga_id): Path<String>,
    Json(request): Json<CurrentlyReadingRequest>,
) -> Result<Json<ChangedResponse>, Error> {
    let changed = spawn_blocking_with_tracing(move || {
        app_state
            .progress
            .set_currently_reading(&scope, &manga_id, &request.chapter_id)
    })
    .await
    .context("set currently reading")
    .map_err(Error::Other)?;

    Ok(Json(ChangedResponse { changed }))
}

#[tracing::instrument(name = "[DELETE] progress reading/{id}", skip_all, fields(scope = %scope))]
pub async fn reading_destroy(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
    Path(manga_id): Path<String>,
) -> Result<Json<ChangedResponse>, Error> {
    let changed = spawn_blocking_with_tracing(move || {
        app_state.progress.remove_currently_reading(&scope, &manga_id)
    })
    .await
    .context("remove currently reading")
    .map_err(Error::Other)?;

    Ok(Json(ChangedResponse { changed }))
}

/// Server-sent progress changes of the caller's own scope. A `resync` event
/// means changes were dropped and the client should re-read everything.
#[tracing::instrument(name = "[GET] progress events", skip_all, fields(scope = %scope))]
pub async fn events(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.progress.subscribe();

    let stream = futures::stream::unfold((rx, scope), |(mut rx, scope)| async move {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    if change.scope != scope {
                        continue;
                    }

                    let event = match Event::default().event("progress").json_data(&change) {
                        Ok(event) => event,
                        Err(error) => {
                            tracing::warn!(err.msg = %error, "Failed to encode progress change");
                            continue;
                        }
                    };
                    return Some((Ok(event), (rx, scope)));
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("Progress broadcast lagged by {} messages", n);
                    return Some((Ok(Event::default().event("resync").data("")), (rx, scope)));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
