use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Box<str>),
    #[error("Payload Too Large")]
    PayloadTooLarge,
    #[error("Failed to read request body: {0}")]
    ReadBody(Box<str>),
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(Box<str>),
    #[error("Upstream timed out")]
    UpstreamTimeout,
    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(Box<str>),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::ReadBody(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::UpstreamUnavailable(_) | Error::UpstreamStatus(_) | Error::InvalidResponse(_) => {
                StatusCode::BAD_GATEWAY
            },
            Error::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::UpstreamTimeout
        } else if error.is_decode() {
            Error::InvalidResponse(error.to_string().into())
        } else {
            Error::UpstreamUnavailable(error.to_string().into())
        }
    }
}

#[derive(Serialize)]
struct HttpErrorBody {
    error: Box<str>,
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            Error::BadRequest(msg) => Some(msg),
            Error::UpstreamStatus(code) => Some(format!("Upstream returned status {code}").into()),
            // Transport and parse details stay in the log.
            _ => None,
        };

        match message {
            Some(error) => (status, axum::Json(HttpErrorBody { error })).into_response(),
            None => status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn maps_errors_to_statuses() {
        assert_eq!(Error::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(Error::UpstreamUnavailable("refused".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(Error::UpstreamStatus(500).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(Error::InvalidResponse("eof".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(Error::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            Error::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_carries_json_message() {
        let response = Error::BadRequest("prompt is not valid UTF-8".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
