use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{config::ConfigError, notify::MailError, session::SessionError, store::StoreError};

/// Anything that stops the server from being built.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("mail transport: {0}")]
    Mail(#[from] MailError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("Session failure: {0}")]
    Session(#[from] SessionError),

    #[error("Password hashing failure: {0}")]
    Hashing(String),
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::Validation(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Storage(_) | AppError::Session(_) | AppError::Hashing(_) => {
                Status::InternalServerError
            }
        }
    }

    /// What the caller gets to see. Internal failures stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(_) | AppError::NotFound(_) => self.to_string(),
            _ => String::from("Server error."),
        }
    }

    fn log(&self, req: &Request<'_>) {
        if self.status() == Status::InternalServerError {
            error!(method = %req.method(), uri = %req.uri(), "{self}");
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        self.log(req);
        (self.status(), self.public_message()).respond_to(req)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `AppError` rendered as `{ "success": false, "message": ... }`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        self.0.log(req);
        let body = ApiReply {
            success: false,
            status: None,
            message: Some(self.0.public_message()),
        };
        (self.0.status(), Json(body)).respond_to(req)
    }
}
