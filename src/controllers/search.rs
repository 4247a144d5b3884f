use anyhow::Context;
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use validator::Validate;

use crate::{
    content::SearchPage,
    error::Error,
    scope::Scope,
    search::{PAGE_SIZE, SearchFilters},
    state::SharedAppState,
    telemetry::spawn_blocking_with_tracing,
};

#[tracing::instrument(name = "[GET] search state", skip_all, fields(scope = %scope))]
pub async fn show(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
) -> Result<Response, Error> {
    let snapshot = spawn_blocking_with_tracing(move || app_state.search.load_snapshot(&scope))
        .await
        .context("load search snapshot")
        .map_err(Error::Other)?;

    Ok(match snapshot {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[tracing::instrument(name = "[PUT] search state", skip_all, fields(scope = %scope))]
pub async fn update(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
    Json(filters): Json<SearchFilters>,
) -> Result<StatusCode, Error> {
    filters.validate().map_err(Error::Validation)?;

    spawn_blocking_with_tracing(move || app_state.search.save_snapshot(&scope, &filters))
        .await
        .context("save search snapshot")
        .map_err(Error::Other)?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "[DELETE] search state", skip_all, fields(scope = %scope))]
pub async fn destroy(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
) -> Result<StatusCode, Error> {
    spawn_blocking_with_tracing(move || app_state.search.clear_snapshot(&scope))
        .await
        .context("clear search snapshot")
        .map_err(Error::Other)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Runs the search upstream and remembers the filters, unless a newer
/// search for the same scope was started while this one was in flight.
#[tracing::instrument(name = "[POST] search", skip_all, fields(scope = %scope))]
pub async fn execute(
    Extension(scope): Extension<Scope>,
    State(app_state): State<SharedAppState>,
    Json(filters): Json<SearchFilters>,
) -> Result<Json<SearchPage>, Error> {
    filters.validate().map_err(Error::Validation)?;

    let ticket = app_state.search_sequence.issue(&scope);

    let page = match app_state.content.search(&filters, PAGE_SIZE).await {
        Ok(page) => page,
        Err(error) => {
            app_state.search_sequence.finish(&ticket);
            return Err(error.into());
        }
    };

    if app_state.search_sequence.is_latest(&ticket) {
        let state = app_state.clone();
        let saved = spawn_blocking_with_tracing(move || state.search.save_snapshot(&scope, &filters))
            .await
            .context("save search snapshot")
            .map_err(Error::Other);
        app_state.search_sequence.finish(&ticket);
        saved?;
    } else {
        tracing::debug!(seq = ticket.seq, "Newer search in flight, not caching filters");
    }

    Ok(Json(page))
}
