use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::cache::CacheError;
use crate::extractor::ExtractError;
use crate::fetcher::FetchError;
use crate::rewrite::RewriteError;

/// Anything that fails a mirror request. Missing page fields never get here.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl MirrorError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Fetch(err) | Self::Cache(CacheError::Fetch(err)) => {
                if err.status() == Some(StatusCode::NOT_FOUND) {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            // the origin served markup we cannot use
            Self::Extract(_) | Self::Rewrite(_) => StatusCode::BAD_GATEWAY,
            Self::Cache(CacheError::InvalidRequest(_) | CacheError::Rewrite(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Cache(CacheError::Io { .. } | CacheError::Vanished(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for MirrorError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, status = %status, "mirror request failed");
        } else {
            warn!(error = %self, status = %status, "mirror request rejected");
        }
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, format!("{} {}\n", status.as_u16(), reason)).into_response()
    }
}
