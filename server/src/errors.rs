// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Mapping of service errors to HTTP responses. Every error is answered with
//! an [`ErrorBody`].

use std::fmt::{self, Display};

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse, ResponseError,
};
use rptvbackend::{auth_service::errors::AuthError, invites::InviteError, xtream::XtreamError};
use rptvtypes::messages::ErrorBody;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let body = ErrorBody {
            status: self.status.as_u16(),
            error: self
                .status
                .canonical_reason()
                .unwrap_or_default()
                .to_owned(),
            message: self.message.clone(),
        };
        let mut response = HttpResponse::build(self.status);
        if self.status == StatusCode::UNAUTHORIZED {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(body)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(e) => Self::bad_request(e.to_string()),
            AuthError::InvalidInviteCode => Self::not_found(e.to_string()),
            AuthError::InviteExpired | AuthError::InviteUsedUp => Self::bad_request(e.to_string()),
            AuthError::EmailTaken => Self::conflict(e.to_string()),
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenRevoked
            | AuthError::RefreshTokenExpired
            | AuthError::UnknownUser => Self::unauthorized(e.to_string()),
            AuthError::StorageError | AuthError::LibraryError => Self::internal(),
        }
    }
}

impl From<InviteError> for ApiError {
    fn from(e: InviteError) -> Self {
        match e {
            InviteError::Validation(e) => Self::bad_request(e.to_string()),
            InviteError::DuplicateCode => Self::conflict(e.to_string()),
            InviteError::NotFound => Self::not_found(e.to_string()),
            InviteError::StorageError => Self::internal(),
        }
    }
}

impl From<XtreamError> for ApiError {
    fn from(e: XtreamError) -> Self {
        match e {
            XtreamError::Validation(e) => Self::bad_request(e.to_string()),
            XtreamError::NotFound => Self::not_found(e.to_string()),
            XtreamError::StorageError | XtreamError::LibraryError => Self::internal(),
        }
    }
}

/// Answer malformed JSON bodies with a 400 [`ErrorBody`].
pub fn json_error_handler(error: JsonPayloadError, _request: &HttpRequest) -> actix_web::Error {
    let message = match &error {
        JsonPayloadError::ContentType => "Content type must be application/json".to_owned(),
        other => format!("Malformed request body: {other}"),
    };
    ApiError::bad_request(message).into()
}

/// Answer malformed or incomplete query strings with a 400 [`ErrorBody`].
pub fn query_error_handler(error: QueryPayloadError, _request: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(format!("Malformed query parameters: {error}")).into()
}

/// Path parameters that don't parse, such as malformed ids, are a bad
/// request rather than an unknown route.
pub fn path_error_handler(error: PathError, _request: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(format!("Malformed path parameter: {error}")).into()
}

/// Fallback for unknown routes.
pub async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::not_found("Not found"))
}
