//! HTTP middleware for the tasks API
//!
//! - `request_context` gives every request its own [`RequestContext`]
//! - `require_basic_auth` guards destructive routes
//! - `json_content_type` stamps JSON responses

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tower_http::set_header::SetResponseHeaderLayer;

use tm_core::RequestContext;

use crate::routes::route_error;
use crate::state::AppState;

/// Attach a per-request context bounded by the configured timeout.
///
/// The context is a child of the shutdown context, and it is cancelled when
/// the request finishes or its future is dropped (client disconnect).
pub async fn request_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = state
        .shutdown()
        .with_timeout(state.config().request_timeout);
    let _guard = ctx.drop_guard();

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Reject requests without the configured Basic credentials
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let admin = &state.config().admin;
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_basic_auth)
        .is_some_and(|(username, password)| {
            username == admin.username && password == admin.password
        });

    if !authorized {
        tracing::warn!("Rejected unauthorized {} {}", req.method(), req.uri().path());
        return (
            [(header::WWW_AUTHENTICATE, r#"Basic realm="Restricted""#)],
            route_error(StatusCode::UNAUTHORIZED, "Unauthorized"),
        )
            .into_response();
    }

    next.run(req).await
}

pub fn json_content_type() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    )
}

/// Split an `Authorization: Basic ...` value into username and password
fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
