use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, Request, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{controllers, middlewares::identity_middleware, state::AppState};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn init_router(app_state: AppState) -> Router {
    let state = Arc::new(app_state);

    let app = Router::new()
        .route("/", get(controllers::home::index))
        .route("/proxy/{*path}", get(controllers::proxy::show));

    let progress_route = Router::new()
        .route("/chapters", get(controllers::progress::read_index))
        .route(
            "/chapters/{chapter_id}/read",
            post(controllers::progress::read_store),
        )
        .route("/reading", get(controllers::progress::reading_index))
        .route(
            "/reading/{manga_id}",
            get(controllers::progress::reading_show)
                .put(controllers::progress::reading_update)
                .delete(controllers::progress::reading_destroy),
        )
        .route("/events", get(controllers::progress::events))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    let search_route = Router::new()
        .route("/", post(controllers::search::execute))
        .route(
            "/state",
            get(controllers::search::show)
                .put(controllers::search::update)
                .delete(controllers::search::destroy),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    let x_request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();
                let user_agent = request
                    .headers()
                    .get(header::USER_AGENT)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();

                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);

                tracing::info_span!(
                    "http_request",
                    request_id,
                    method = ?request.method(),
                    uri = ?request.uri(),
                    path = matched_path,
                    version = ?request.version(),
                    user_agent,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id_header));

    app.nest("/progress", progress_route)
        .nest("/search", search_route)
        .layer(CompressionLayer::new())
        .layer(request_id_middleware)
        .with_state(state)
}
