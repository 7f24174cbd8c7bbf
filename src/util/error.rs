use actix_web::http::header::ContentType;
use actix_web::http::{ConnectionType, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::repository::RepositoryError;
use crate::service::snippet::SnippetError;
use crate::service::user::UserError;
use crate::templates::TemplateError;
use crate::util::password::PasswordError;

/// 请求级错误：客户端只会看到标准状态短语，细节只写入日志
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("bad request")]
    BadRequest,
    #[error("csrf token missing or invalid")]
    Csrf,
    #[error(transparent)]
    DbError(#[from] DbError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    InternalError(#[from] InternalError),
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session write failed: {0}")]
    Insert(String),
}

#[derive(Debug, Error)]
pub enum InternalError {
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("recovered panic: {0}")]
    Panic(String),
    #[error("unhandled error: {0}")]
    Unhandled(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(err) => AppError::from(DbError::from(err)),
            // 约束相关的变体由 service 层处理
            RepositoryError::DuplicateEmail => {
                AppError::from(InternalError::Unhandled(err.to_string()))
            }
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Repository(err) => AppError::from(err),
            UserError::Password(err) => AppError::from(InternalError::from(err)),
            UserError::DuplicateEmail | UserError::InvalidCredentials | UserError::Hash(_) => {
                AppError::from(InternalError::Unhandled(err.to_string()))
            }
        }
    }
}

impl From<SnippetError> for AppError {
    fn from(err: SnippetError) -> Self {
        match err {
            SnippetError::NoRecord => AppError::NotFound,
            SnippetError::InvalidExpiry(_) => AppError::BadRequest,
            SnippetError::Repository(err) => AppError::from(err),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest | AppError::Csrf => StatusCode::BAD_REQUEST,
            AppError::DbError(_)
            | AppError::Template(_)
            | AppError::Session(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = status_text_response(self.status_code());
        // panic 之后连接状态不可信，响应后关闭连接
        if matches!(self, AppError::InternalError(InternalError::Panic(_))) {
            response
                .head_mut()
                .set_connection_type(ConnectionType::Close);
        }
        response
    }
}

/// 仅包含标准状态短语的纯文本响应
pub fn status_text_response(status: StatusCode) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(ContentType::plaintext())
        .insert_header(("X-Content-Type-Options", "nosniff"))
        .body(format!("{}\n", status.canonical_reason().unwrap_or("Unknown")))
}
