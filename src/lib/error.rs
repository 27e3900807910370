use jsonwebtoken::errors::{Error as JwtError};
use actix_web::{http::StatusCode, Error as ActixWebError, ResponseError, HttpResponse};
use std::fmt::{Display, Formatter, Error as FmtError};
use sqlx_core::{Error as SqlxError};
use serde::Serialize;

/// This is the global server error type implemented as a convenient wrapper around all kind of
/// errors we could encounter using external libraries.
///
/// Please, try to use this type of error instead of specific ones at least at the front-end of the
/// server, as it will be updated to handle more error cases as we add more libraries or more
/// crate-specific errors.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerError {
    ActixWebError(
        #[serde(skip_serializing)]
        ActixWebError
    ),
    JwtError(
        #[serde(skip_serializing)]
        JwtError
    ),
    InternalError(
        #[serde(rename(serialize = "reason"))]
        InternalError
    ),
    SqlxError(
        #[serde(skip_serializing)]
        SqlxError
    ),
    JsonError(
        #[serde(skip_serializing)]
        serde_json::Error
    ),
}

impl ServerError {
    pub fn if_row_not_found(entity: &'static str) -> impl FnOnce(SqlxError) -> Self {
        move |e| {
            match e {
                SqlxError::RowNotFound => InternalError::NotFound(entity).into(),
                _ => e.into()
            }
        }
    }
}

impl From<ActixWebError> for ServerError {
    fn from(error:ActixWebError) -> Self { Self::ActixWebError(error) }
}

impl From<JwtError> for ServerError {
    fn from(error:JwtError) -> Self { Self::JwtError(error) }
}

impl From<InternalError> for ServerError {
    fn from(error:InternalError) -> Self { Self::InternalError(error) }
}

impl From<SqlxError> for ServerError {
    fn from(error:SqlxError) -> Self { Self::SqlxError(error) }
}

impl From<serde_json::Error> for ServerError {
    fn from(error:serde_json::Error) -> Self { Self::JsonError(error) }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for ServerError {}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {

        use InternalError::*;

        match self {
            ServerError::ActixWebError(e) => e.as_response_error().status_code(),
            ServerError::JwtError(_) => StatusCode::UNAUTHORIZED,
            ServerError::InternalError(e) => match e {
                NoAuthorizationGiven | InvalidCredentials => StatusCode::UNAUTHORIZED,
                AccessDenied => StatusCode::FORBIDDEN,
                NotFound(_) => StatusCode::NOT_FOUND,
                Conflict | AlreadySubmitted => StatusCode::CONFLICT,
                AlreadyJoined | GameNotOpen | UsernameTaken | EmailTaken
                    | InvalidPlayerCount | InvalidOrder(_) => StatusCode::BAD_REQUEST,
            },
            ServerError::SqlxError(e) => match e {
                SqlxError::RowNotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::JsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log::debug!("{:?}", self);
        HttpResponse::build(self.status_code())
            .json(self)
    }
}

/// This enum represents all kinds of errors this specific server can encounter.
#[derive(Debug, Serialize)]
pub enum InternalError {
    /// A player tried to perform a restricted operation
    AccessDenied,
    /// A required data does not exist
    NotFound(& 'static str),
    /// The requested operation conflicts with data
    Conflict,
    /// A user already in a game tries to join it again
    AlreadyJoined,
    /// A player re-submitted an already submitted turn
    AlreadySubmitted,
    /// A user tried to join a game that is full or already running
    GameNotOpen,
    /// Registration with a username another user already took
    UsernameTaken,
    /// Registration with an email another user already took
    EmailTaken,
    /// Game creation outside the 2-8 player range
    InvalidPlayerCount,
    /// An order failed one of the validation rules; carries the specific rule
    InvalidOrder(String),
    /// A Claims was requested by the route but none were given
    NoAuthorizationGiven,
    /// Login with an unknown username or a wrong password
    InvalidCredentials,
}

impl InternalError {
    pub fn invalid_order<S: Into<String>>(detail: S) -> Self {
        Self::InvalidOrder(detail.into())
    }
}
