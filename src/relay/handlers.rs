use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::Relay;
use crate::{
    config::{Config, FailureMode},
    service,
};

pub fn build_router(config: &Config) -> anyhow::Result<Router> {
    let state = Arc::new(Relay::new(config)?);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Every path goes through the same handler, whatever the method
    Ok(Router::new()
        .route("/", any(relay_handler))
        .fallback(relay_handler)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub async fn relay_handler(
    State(relay): State<Arc<Relay>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let result = match body {
        Ok(body) => relay.relay(body).await,
        Err(rejection) => Err(body_error(rejection)),
    };

    match result {
        Ok(text) => text_reply(text),
        Err(error) => failure_reply(relay.failure_mode(), error),
    }
}

fn body_error(rejection: BytesRejection) -> service::Error {
    tracing::error!("Error reading request body: {}", rejection.body_text());
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        service::Error::PayloadTooLarge
    } else {
        service::Error::ReadBody(rejection.body_text().into())
    }
}

fn text_reply(text: String) -> Response {
    if text.is_empty() {
        StatusCode::OK.into_response()
    } else {
        (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], text).into_response()
    }
}

fn failure_reply(failure_mode: FailureMode, error: service::Error) -> Response {
    match failure_mode {
        FailureMode::Compat => {
            tracing::error!("Relay failed, replying with an empty body: {}", error);
            StatusCode::OK.into_response()
        },
        FailureMode::Strict => {
            tracing::error!("Relay failed with {}: {}", error.status(), error);
            error.into_response()
        },
    }
}
