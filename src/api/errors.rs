// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::iam::Caller;
use crate::services::ServiceError;
use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

pub const LOGIN_PATH: &str = "/login";
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

pub fn error_json(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        error: message.to_string(),
        code: code.to_string(),
    })
}

pub fn login_redirect(return_path: Option<&str>) -> HttpResponse {
    let location = match return_path {
        Some(path) => format!("{}?return_path={}", LOGIN_PATH, urlencoding::encode(path)),
        None => LOGIN_PATH.to_string(),
    };
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn access_denied_redirect() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, ACCESS_DENIED_PATH))
        .finish()
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Unauthenticated | ServiceError::Denied => StatusCode::FOUND,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Unauthenticated => login_redirect(None),
            ServiceError::Denied => access_denied_redirect(),
            ServiceError::Store(msg) => {
                log::error!("Request failed on storage: {}", msg);
                error_json(
                    self.status_code(),
                    self.code(),
                    "The request could not be completed",
                )
            }
            other => error_json(other.status_code(), other.code(), &other.to_string()),
        }
    }
}

/// A [`ServiceError`] bound to the request that caused it, so the login redirect
/// can send the caller back afterwards.
#[derive(Debug)]
pub struct ApiError {
    error: ServiceError,
    return_path: Option<String>,
}

impl ApiError {
    pub fn new(caller: &Caller, error: ServiceError) -> Self {
        Self {
            error,
            return_path: Some(caller.requested_path().to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self {
            error,
            return_path: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.error.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        match (&self.error, self.return_path.as_deref()) {
            (ServiceError::Unauthenticated, Some(path)) if !path.is_empty() => {
                login_redirect(Some(path))
            }
            (error, _) => error.error_response(),
        }
    }
}

pub type ApiResult = Result<HttpResponse, ApiError>;

pub trait ForCaller<T> {
    fn for_caller(self, caller: &Caller) -> Result<T, ApiError>;
}

impl<T> ForCaller<T> for Result<T, ServiceError> {
    fn for_caller(self, caller: &Caller) -> Result<T, ApiError> {
        self.map_err(|error| ApiError::new(caller, error))
    }
}
