use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use db::LedgerError;
use log::error;
use thiserror::Error;

use crate::utils::web_utils::removal_cookie;
use crate::views;

/// Every way a request can fail. Each is terminal for the request and is
/// rendered as an apology page, except `NotAuthenticated` which redirects.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("cannot afford")]
    InsufficientFunds,

    #[error("you do not have enough shares")]
    InsufficientShares,

    #[error("{0}")]
    AuthFailure(String),

    #[error("not logged in")]
    NotAuthenticated,

    #[error("internal server error")]
    Internal(String),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidInput(message) => AppError::InvalidInput(message),
            LedgerError::InsufficientFunds { .. } => AppError::InsufficientFunds,
            LedgerError::InsufficientShares { .. } => AppError::InsufficientShares,
            LedgerError::UserNotFound(_) => AppError::NotAuthenticated,
            LedgerError::UsernameTaken(_) => AppError::AuthFailure("user already exists".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::UnknownSymbol(_)
            | AppError::InsufficientFunds
            | AppError::InsufficientShares => StatusCode::BAD_REQUEST,
            AppError::AuthFailure(_) => StatusCode::FORBIDDEN,
            AppError::NotAuthenticated => StatusCode::FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotAuthenticated => HttpResponse::Found()
                .insert_header((header::LOCATION, "/login"))
                .cookie(removal_cookie())
                .finish(),
            AppError::Internal(details) => {
                error!("Request failed: {}", details);
                views::apology(self.status_code(), &self.to_string())
            }
            _ => views::apology(self.status_code(), &self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn ledger_errors_map_to_user_facing_kinds() {
        let funds: AppError = LedgerError::InsufficientFunds {
            required: BigDecimal::from(2),
            available: BigDecimal::from(1),
        }
        .into();
        assert!(matches!(funds, AppError::InsufficientFunds));
        assert_eq!(funds.status_code(), StatusCode::BAD_REQUEST);

        let taken: AppError = LedgerError::UsernameTaken("alice".into()).into();
        assert_eq!(taken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(taken.to_string(), "user already exists");

        let gone: AppError = LedgerError::UserNotFound(7).into();
        assert!(matches!(gone, AppError::NotAuthenticated));

        let corrupt: AppError = LedgerError::Corrupt("users.cash".into()).into();
        assert_eq!(corrupt.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(corrupt.to_string(), "internal server error");
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let response = AppError::NotAuthenticated.error_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login"
        );
    }
}
