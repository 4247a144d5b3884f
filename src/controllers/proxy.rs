use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{error::Error, state::SharedAppState};

const CACHE_CONTROL_VALUE: &str = "s-maxage=60, stale-while-revalidate";

/// Relays a GET to the content API. Repeated query keys such as
/// `includes[]=a&includes[]=b` are forwarded as repeated keys.
#[tracing::instrument(name = "[GET] proxy", skip(app_state, query))]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Path(path): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, Error> {
    let relayed = app_state.content.relay(&path, &query).await?;

    let status = StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response = (status, relayed.body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if status.is_success() {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_VALUE),
        );
    }

    Ok(response)
}
