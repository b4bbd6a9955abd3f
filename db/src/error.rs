use bigdecimal::BigDecimal;
use diesel::r2d2::PoolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("cannot afford: need {required}, have {available}")]
    InsufficientFunds {
        required: BigDecimal,
        available: BigDecimal,
    },

    #[error("not enough shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("user {0} not found")]
    UserNotFound(i32),

    #[error("username {0} is already taken")]
    UsernameTaken(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("migration failed: {0}")]
    Migration(String),
}
