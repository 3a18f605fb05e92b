//! Mapping of source errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::sources::SourceError;

/// Error returned by the lookup handlers
///
/// Always answered with 500 and the error's display text, whatever the
/// underlying cause; existing clients only look at the body.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub SourceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Lookup failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_is_500() {
        let errors = [
            SourceError::NotFound("ISBN".to_string()),
            SourceError::InvalidRequest("bad".to_string()),
            SourceError::Network("down".to_string()),
            SourceError::Api("HTTP 404".to_string()),
        ];

        for error in errors {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
