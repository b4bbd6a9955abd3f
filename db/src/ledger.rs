//! The ledger engine.
//!
//! Holdings are never stored: they are derived from the append-only
//! `transactions` table. Every mutation runs inside one immediate SQLite
//! transaction, so the read-validate-write sequence of a trade cannot
//! interleave with another writer.

use std::collections::BTreeMap;

use bigdecimal::num_bigint::Sign;
use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::info;

use crate::error::LedgerError;
use crate::models::{parse_decimal, Holding, NewTransaction, Transaction, TransactionRow};
use crate::schema::{transactions, users};

/// How many shares a sell order covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellAmount {
    /// The whole current holding of the symbol.
    All,
    Shares(i64),
}

/// Outcome of a successful trade.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub transaction: Transaction,
    pub cash: BigDecimal,
}

/// Groups signed share counts by symbol and keeps the positive totals, sorted
/// by symbol. Sums are exact; a total outside `i64` means the ledger is corrupt.
pub fn derive_holdings<I, S>(rows: I) -> Result<Vec<Holding>, LedgerError>
where
    I: IntoIterator<Item = (S, i64)>,
    S: Into<String>,
{
    let mut totals: BTreeMap<String, i128> = BTreeMap::new();
    for (symbol, shares) in rows {
        *totals.entry(symbol.into()).or_insert(0) += i128::from(shares);
    }

    totals
        .into_iter()
        .filter(|(_, shares)| *shares > 0)
        .map(|(symbol, total)| {
            share_total(total, &symbol).map(|shares| Holding { symbol, shares })
        })
        .collect()
}

fn share_total(total: i128, symbol: &str) -> Result<i64, LedgerError> {
    i64::try_from(total)
        .map_err(|_| LedgerError::Corrupt(format!("share total of {} out of range", symbol)))
}

pub fn get_holdings(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Vec<Holding>, LedgerError> {
    let rows = transactions::table
        .filter(transactions::user_id.eq(user_id))
        .select((transactions::symbol, transactions::shares))
        .load::<(String, i64)>(conn)?;
    derive_holdings(rows)
}

/// Signed total of `symbol` for the user; zero when never traded.
pub fn net_shares(
    conn: &mut SqliteConnection,
    user_id: i32,
    symbol: &str,
) -> Result<i64, LedgerError> {
    let shares = transactions::table
        .filter(transactions::user_id.eq(user_id))
        .filter(transactions::symbol.eq(symbol))
        .select(transactions::shares)
        .load::<i64>(conn)?;
    share_total(shares.into_iter().map(i128::from).sum(), symbol)
}

/// Every transaction of the user, oldest first.
pub fn history(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Vec<Transaction>, LedgerError> {
    transactions::table
        .filter(transactions::user_id.eq(user_id))
        .order(transactions::id.asc())
        .select(TransactionRow::as_select())
        .load(conn)?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
}

pub fn cash_balance(conn: &mut SqliteConnection, user_id: i32) -> Result<BigDecimal, LedgerError> {
    let cash = users::table
        .find(user_id)
        .select(users::cash)
        .first::<String>(conn)
        .optional()?
        .ok_or(LedgerError::UserNotFound(user_id))?;
    parse_decimal(&cash, "users.cash")
}

fn set_cash(
    conn: &mut SqliteConnection,
    user_id: i32,
    cash: &BigDecimal,
) -> Result<(), LedgerError> {
    diesel::update(users::table.find(user_id))
        .set(users::cash.eq(cash.to_string()))
        .execute(conn)?;
    Ok(())
}

fn record(
    conn: &mut SqliteConnection,
    user_id: i32,
    symbol: &str,
    shares: i64,
    price: &BigDecimal,
) -> Result<Transaction, LedgerError> {
    let row = diesel::insert_into(transactions::table)
        .values(&NewTransaction {
            user_id,
            symbol,
            shares,
            price: price.to_string(),
            timestamp: Utc::now().naive_utc(),
        })
        .returning(TransactionRow::as_returning())
        .get_result(conn)?;
    Transaction::try_from(row)
}

/// Buys `shares` of `symbol` at `price`, debiting the cost from the user's cash.
pub fn buy(
    conn: &mut SqliteConnection,
    user_id: i32,
    symbol: &str,
    shares: i64,
    price: &BigDecimal,
) -> Result<Receipt, LedgerError> {
    if shares <= 0 {
        return Err(LedgerError::InvalidInput(
            "must provide positive shares".to_string(),
        ));
    }

    let receipt = conn.immediate_transaction(|conn| {
        let available = cash_balance(conn, user_id)?;
        let held = net_shares(conn, user_id, symbol)?;
        if held.checked_add(shares).is_none() {
            return Err(LedgerError::InvalidInput(
                "position would exceed the maximum share count".to_string(),
            ));
        }
        let cost = price * &BigDecimal::from(shares);
        if cost > available {
            return Err(LedgerError::InsufficientFunds {
                required: cost,
                available,
            });
        }

        let cash = available - cost;
        set_cash(conn, user_id, &cash)?;
        let transaction = record(conn, user_id, symbol, shares, price)?;
        Ok(Receipt { transaction, cash })
    })?;

    info!(
        "User {} bought {} {} at {}",
        user_id, shares, symbol, price
    );
    Ok(receipt)
}

/// Sells from the user's current holding of `symbol` at `price`. The holding is
/// recomputed inside the write transaction; selling "all" of nothing is an
/// `InsufficientShares` error rather than an empty ledger row.
pub fn sell(
    conn: &mut SqliteConnection,
    user_id: i32,
    symbol: &str,
    amount: SellAmount,
    price: &BigDecimal,
) -> Result<Receipt, LedgerError> {
    if let SellAmount::Shares(shares) = amount {
        if shares <= 0 {
            return Err(LedgerError::InvalidInput(
                "must provide positive shares".to_string(),
            ));
        }
    }

    let receipt = conn.immediate_transaction(|conn| {
        let available = cash_balance(conn, user_id)?;
        let held = net_shares(conn, user_id, symbol)?;
        let shares = match amount {
            SellAmount::All => held,
            SellAmount::Shares(shares) => shares,
        };
        if shares <= 0 || shares > held {
            return Err(LedgerError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: shares,
                held,
            });
        }

        let cash = available + price * &BigDecimal::from(shares);
        let transaction = record(conn, user_id, symbol, -shares, price)?;
        set_cash(conn, user_id, &cash)?;
        Ok(Receipt { transaction, cash })
    })?;

    info!(
        "User {} sold {} {} at {}",
        user_id, -receipt.transaction.shares, symbol, price
    );
    Ok(receipt)
}

/// Largest deposit has this many digits before the decimal point.
pub const MAX_DEPOSIT_WHOLE_DIGITS: i64 = 12;

/// Accepts a positive amount of whole cents below 10^12 dollars. Digit counts
/// are checked before any arithmetic touches the value.
pub fn validate_deposit(amount: &BigDecimal) -> Result<(), LedgerError> {
    let invalid = |message: &str| Err(LedgerError::InvalidInput(message.to_string()));

    if amount.sign() != Sign::Plus {
        return invalid("must provide a positive amount");
    }
    let scale = amount.fractional_digit_count();
    let whole_digits = (amount.digits() as i64).saturating_sub(scale);
    if whole_digits > MAX_DEPOSIT_WHOLE_DIGITS {
        return invalid("cash amount is too large");
    }
    if scale > 2 && (scale > 18 || amount.normalized().fractional_digit_count() > 2) {
        return invalid("cash amount can't have fractional cents");
    }
    Ok(())
}

/// Credits `amount` to the user's cash and returns the new balance.
pub fn add_cash(
    conn: &mut SqliteConnection,
    user_id: i32,
    amount: &BigDecimal,
) -> Result<BigDecimal, LedgerError> {
    validate_deposit(amount)?;

    let cash = conn.immediate_transaction(|conn| {
        let cash = cash_balance(conn, user_id)? + amount;
        set_cash(conn, user_id, &cash)?;
        Ok::<_, LedgerError>(cash)
    })?;

    info!("User {} deposited {}", user_id, amount);
    Ok(cash)
}
