use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

use crate::error::ApiError;

// A generic error report
// Produced via `Err(some_err).wrap_err("Some context")`
// or `Err(color_eyre::eyre::Report::new(SomeError))`
pub struct Report(color_eyre::Report);

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> From<E> for Report
where
    E: Into<color_eyre::Report>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Tell axum how to convert `Report` into a response.
impl IntoResponse for Report {
    fn into_response(self) -> Response<Body> {
        let err = self.0;

        // Domain errors carry their own status; anything else is opaque.
        if let Some(api_err) = err.downcast_ref::<ApiError>() {
            let status = match api_err {
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                ApiError::MissingCredential | ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
                ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            };

            tracing::warn!("Request failed: {api_err}");
            return (status, api_err.to_string()).into_response();
        }

        let err_string = format!("{err:?}");
        tracing::error!("{err_string}");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong".to_string(),
        )
            .into_response()
    }
}
