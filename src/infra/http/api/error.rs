use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use popit_api_types::ApiResult;

use crate::application::error::ErrorReport;
use crate::application::pagination::PaginationError;
use crate::application::posts::PostServiceError;
use crate::application::repos::RepoError;
use crate::application::spotlight::SpotlightError;
use crate::infra::remote::RemoteError;

const SOURCE: &str = "infra::http::api";

/// Failure envelope returned by every API handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    chain: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            chain: vec![message.clone()],
            message,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Use the error's own text as the message and keep its source chain for logging.
    pub fn from_error(status: StatusCode, error: &dyn StdError) -> Self {
        let report = ErrorReport::from_error(SOURCE, status, error);
        Self {
            status,
            message: error.to_string(),
            chain: report.messages,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResult::<()>::failure(self.message);
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport {
            source: SOURCE,
            status: self.status,
            messages: self.chain,
        }
        .attach(&mut response);
        response
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        Self::from_error(StatusCode::BAD_REQUEST, &err)
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        Self::from_error(repo_status(&err), &err)
    }
}

impl From<PostServiceError> for ApiError {
    fn from(err: PostServiceError) -> Self {
        Self::from_error(post_status(&err), &err)
    }
}

impl From<SpotlightError> for ApiError {
    fn from(err: SpotlightError) -> Self {
        let status = match &err {
            SpotlightError::Candidates { source, .. } => repo_status(source),
            SpotlightError::Resolution { source, .. } => post_status(&source.source),
        };
        Self::from_error(status, &err)
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        Self::from_error(StatusCode::BAD_GATEWAY, &err)
    }
}

fn repo_status(err: &RepoError) -> StatusCode {
    match err {
        RepoError::NotFound => StatusCode::NOT_FOUND,
        RepoError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        RepoError::Duplicate { .. } | RepoError::Persistence(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn post_status(err: &PostServiceError) -> StatusCode {
    match err {
        PostServiceError::UnknownTerm { .. }
        | PostServiceError::UnknownAuthorLogin { .. }
        | PostServiceError::UnknownAuthorId { .. }
        | PostServiceError::UnknownPermalink { .. }
        | PostServiceError::MissingAuthor { .. } => StatusCode::NOT_FOUND,
        PostServiceError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PostServiceError::Repo(inner) => repo_status(inner),
    }
}
