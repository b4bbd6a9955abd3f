use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::error::LedgerError;

/// Parses a decimal column stored as TEXT.
pub(crate) fn parse_decimal(value: &str, column: &str) -> Result<BigDecimal, LedgerError> {
    BigDecimal::from_str(value)
        .map_err(|e| LedgerError::Corrupt(format!("{} = {:?}: {}", column, value, e)))
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub hash: String,
    pub cash: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub hash: &'a str,
    pub cash: String,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub cash: BigDecimal,
}

impl TryFrom<UserRow> for User {
    type Error = LedgerError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let cash = parse_decimal(&row.cash, "users.cash")?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.hash,
            cash,
        })
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionRow {
    pub id: i32,
    pub user_id: i32,
    pub symbol: String,
    pub shares: i64,
    pub price: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::transactions)]
pub struct NewTransaction<'a> {
    pub user_id: i32,
    pub symbol: &'a str,
    pub shares: i64,
    pub price: String,
    pub timestamp: NaiveDateTime,
}

/// One row of the append-only ledger. Positive `shares` is a buy, negative a sell.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i32,
    pub user_id: i32,
    pub symbol: String,
    pub shares: i64,
    pub price: BigDecimal,
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub fn is_buy(&self) -> bool {
        self.shares > 0
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = LedgerError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let price = parse_decimal(&row.price, "transactions.price")?;
        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            symbol: row.symbol,
            shares: row.shares,
            price,
            timestamp: row.timestamp,
        })
    }
}

/// Net position in one symbol, derived from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub symbol: String,
    pub shares: i64,
}
