use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Winning entry has already been claimed")]
    AlreadyClaimed,

    /// Prize number and ticket number did not match. Carries no detail so that
    /// an unknown prize number and a wrong ticket look identical.
    #[error("Prize number and ticket number do not match a winning entry")]
    InvalidVerification,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Stable, machine-checkable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    AlreadyClaimed,
    Invalid,
    BadRequest,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::AlreadyClaimed => ErrorKind::AlreadyClaimed,
            Error::InvalidVerification => ErrorKind::Invalid,
            Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::Redis(_) | Error::JsonSerialization(_) | Error::Io(_) | Error::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// `AlreadyClaimed` is a specialisation of a conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict | ErrorKind::AlreadyClaimed)
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::AlreadyClaimed => "already_claimed",
            ErrorKind::Invalid => "invalid",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
