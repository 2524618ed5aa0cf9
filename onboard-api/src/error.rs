//! Error taxonomy shared by every engine operation.
//!
//! Engine and orm code fails with the most specific [`ApiError`] kind it can
//! determine; route handlers return it directly and the `Responder` impl maps
//! kind to HTTP status uniformly, so no call site inspects messages.

use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) | ApiError::InvalidState(_) => Status::BadRequest,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match e {
            Error::NotFound => ApiError::NotFound("record not found".to_string()),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ApiError::Conflict(info.message().to_string())
            }
            other => {
                error!("database error: {:?}", other);
                ApiError::Internal("database error".to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let body = Json(ErrorBody {
            success: false,
            message: self.to_string(),
        });
        response::status::Custom(status, body).respond_to(req)
    }
}

/// Success envelope used by every endpoint: `{success, message?, data?}`.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: Some(message.into()),
            data: None,
        })
    }
}

/// Pagination block attached to list responses.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        Pagination {
            total,
            page,
            pages: (total + limit - 1) / limit,
            limit,
        }
    }
}

/// List envelope: `{success, data, pagination}`.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct PagedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PagedResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Json<Self> {
        Json(PagedResponse {
            success: true,
            data,
            pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_expected_statuses() {
        assert_eq!(
            ApiError::validation("x").status(),
            Status::BadRequest
        );
        assert_eq!(
            ApiError::InvalidState("x".into()).status(),
            Status::BadRequest
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            Status::Unauthorized
        );
        assert_eq!(ApiError::forbidden("x").status(), Status::Forbidden);
        assert_eq!(ApiError::not_found("x").status(), Status::NotFound);
        assert_eq!(ApiError::Conflict("x".into()).status(), Status::Conflict);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            Status::InternalServerError
        );
    }

    #[test]
    fn diesel_not_found_becomes_not_found() {
        let err: ApiError = diesel::result::Error::NotFound.into();
        assert_eq!(err.status(), Status::NotFound);
    }

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(21, 1, 10);
        assert_eq!(p.pages, 3);
        let p = Pagination::new(0, 1, 10);
        assert_eq!(p.pages, 0);
    }
}
