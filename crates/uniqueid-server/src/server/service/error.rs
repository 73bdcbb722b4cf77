//! Mapping from generation failures to HTTP responses.
//!
//! Each [`uniqueid::Error`] variant maps to its own status and a stable message,
//! so clients can tell a bad partition key apart from a Redis outage or a
//! clock problem. Anything that escapes as a panic is turned into the generic
//! `Internal Server Error` envelope by [`handle_panic`].

use core::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::server::{service::response::ApiResponse, telemetry::increment_generation_errors};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Generation(#[from] uniqueid::Error),

    /// The shared-counter route was called while Redis is turned off.
    #[error("Redis ID generation is disabled")]
    Disabled,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        use uniqueid::Error;

        match self {
            Self::Generation(Error::InvalidKey { .. }) => StatusCode::BAD_REQUEST,
            Self::Generation(Error::BackendUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Generation(Error::InconsistentResult { .. }) => StatusCode::BAD_GATEWAY,
            Self::Generation(_) | Self::Disabled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message placed in the response envelope.
    ///
    /// Store errors are summarized; their details only go to the log.
    pub fn message(&self) -> String {
        use uniqueid::Error;

        match self {
            Self::Generation(Error::Configuration { reason }) => {
                format!("Generator misconfigured: {reason}")
            }
            Self::Generation(Error::ClockBeforeEpoch { .. }) => {
                "System clock is behind the ID epoch".to_owned()
            }
            Self::Generation(Error::TimestampOverflow { .. }) => {
                "Timestamp exceeds the 41-bit range of the epoch".to_owned()
            }
            Self::Generation(Error::BackendUnavailable { .. }) => {
                "Counter store unavailable".to_owned()
            }
            other => other.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Generation(e) => e.kind(),
            Self::Disabled => "disabled",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = ?self, "ID generation failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "rejected ID request");
        }
        increment_generation_errors(self.kind());

        ApiResponse::<()>::error(status, self.message()).into_response()
    }
}

/// Response for a handler that panicked.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = details, "handler panicked");
    increment_generation_errors("panic");

    ApiResponse::<()>::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniqueid::Error;

    fn generation(err: Error) -> ApiError {
        ApiError::Generation(err)
    }

    #[test]
    fn each_failure_has_a_distinct_status_or_message() {
        let cases = [
            (
                generation(Error::InvalidKey {
                    key: "NOPE".into(),
                }),
                StatusCode::BAD_REQUEST,
                "Invalid keyPrefix: NOPE",
            ),
            (
                generation(Error::ClockSkew { skew_ms: 7 }),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Clock moved backwards, refusing to generate ID for 7 milliseconds",
            ),
            (
                generation(Error::ClockBeforeEpoch { unix_millis: 0 }),
                StatusCode::INTERNAL_SERVER_ERROR,
                "System clock is behind the ID epoch",
            ),
            (
                generation(Error::TimestampOverflow { millis: 1 << 41 }),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Timestamp exceeds the 41-bit range of the epoch",
            ),
            (
                generation(Error::BackendUnavailable {
                    key: "ORDER:id".into(),
                    source: "connection refused".into(),
                }),
                StatusCode::SERVICE_UNAVAILABLE,
                "Counter store unavailable",
            ),
            (
                generation(Error::InconsistentResult {
                    key: "ORDER".into(),
                }),
                StatusCode::BAD_GATEWAY,
                "ID generation failed for keyPrefix: ORDER",
            ),
            (
                ApiError::Disabled,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Redis ID generation is disabled",
            ),
        ];

        for (err, status, message) in cases {
            assert_eq!(err.status(), status, "{err:?}");
            assert_eq!(err.message(), message);
        }
    }

    #[test]
    fn panic_payloads_map_to_generic_envelope() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(42_u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
