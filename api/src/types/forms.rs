//! Raw form bodies and the typed inputs parsed out of them. Every handler
//! parses its form completely before touching the ledger.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use db::ledger::{self, SellAmount};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::errors::AppError;
use crate::quotes::normalize_symbol;

const MAX_USERNAME_CHARS: usize = 64;

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "must provide username"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must provide password"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "must provide username"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must provide password"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must confirm password"))]
    pub confirmation: String,
}

#[derive(Deserialize)]
pub struct QuoteForm {
    #[serde(default)]
    pub symbol: String,
}

#[derive(Deserialize)]
pub struct BuyForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: String,
}

#[derive(Deserialize)]
pub struct SellForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: String,
    #[serde(default)]
    pub sellall: String,
}

#[derive(Deserialize)]
pub struct CashForm {
    #[serde(default)]
    pub add: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct BuyOrder {
    pub symbol: String,
    pub shares: i64,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SellOrder {
    pub symbol: String,
    pub amount: SellAmount,
}

/// Why a share count was refused. All causes surface as `InvalidInput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareCountError {
    Missing,
    NotAnInteger,
    NotPositive,
}

impl ShareCountError {
    fn message(self, verb: &str) -> String {
        match self {
            ShareCountError::Missing => "must provide number of shares".to_string(),
            ShareCountError::NotAnInteger => format!("can't {} fractional shares", verb),
            ShareCountError::NotPositive => "must provide positive shares".to_string(),
        }
    }
}

pub fn parse_share_count(raw: &str) -> Result<i64, ShareCountError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ShareCountError::Missing);
    }
    let shares: i64 = raw.parse().map_err(|_| ShareCountError::NotAnInteger)?;
    if shares <= 0 {
        return Err(ShareCountError::NotPositive);
    }
    Ok(shares)
}

/// First message among `fields`, in the order given.
fn first_message(errors: &ValidationErrors, fields: &[&str]) -> String {
    let field_errors = errors.field_errors();
    fields
        .iter()
        .filter_map(|field| field_errors.get(*field))
        .filter_map(|errors| errors.first())
        .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "invalid form".to_string())
}

fn required_symbol(symbol: &str) -> Result<String, AppError> {
    let symbol = normalize_symbol(symbol);
    if symbol.is_empty() {
        return Err(AppError::InvalidInput("must provide a symbol".to_string()));
    }
    Ok(symbol)
}

impl LoginForm {
    /// Login failures of any kind are reported as auth failures.
    pub fn parse(self) -> Result<Credentials, AppError> {
        self.validate()
            .map_err(|e| AppError::AuthFailure(first_message(&e, &["username", "password"])))?;
        Ok(Credentials {
            username: self.username.trim().to_string(),
            password: self.password,
        })
    }
}

impl RegisterForm {
    pub fn parse(self) -> Result<Credentials, AppError> {
        self.validate().map_err(|e| {
            AppError::InvalidInput(first_message(&e, &["username", "password", "confirmation"]))
        })?;
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::InvalidInput("must provide username".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(AppError::InvalidInput(format!(
                "username must be at most {} characters",
                MAX_USERNAME_CHARS
            )));
        }
        if self.password != self.confirmation {
            return Err(AppError::InvalidInput("passwords must match".to_string()));
        }
        Ok(Credentials {
            username,
            password: self.password,
        })
    }
}

impl QuoteForm {
    pub fn parse(self) -> Result<String, AppError> {
        required_symbol(&self.symbol)
    }
}

impl BuyForm {
    pub fn parse(self) -> Result<BuyOrder, AppError> {
        let symbol = required_symbol(&self.symbol)?;
        let shares = parse_share_count(&self.shares)
            .map_err(|e| AppError::InvalidInput(e.message("buy")))?;
        Ok(BuyOrder { symbol, shares })
    }
}

impl SellForm {
    pub fn parse(self) -> Result<SellOrder, AppError> {
        let symbol = required_symbol(&self.symbol)?;
        let amount = if self.sellall == "sellall" {
            SellAmount::All
        } else {
            let shares = parse_share_count(&self.shares)
                .map_err(|e| AppError::InvalidInput(e.message("sell")))?;
            SellAmount::Shares(shares)
        };
        Ok(SellOrder { symbol, amount })
    }
}

impl CashForm {
    pub fn parse(self) -> Result<BigDecimal, AppError> {
        let raw = self.add.trim();
        if raw.is_empty() {
            return Err(AppError::InvalidInput("must provide amount of cash".to_string()));
        }
        let amount = BigDecimal::from_str(raw)
            .map_err(|_| AppError::InvalidInput("must provide cash amount".to_string()))?;
        ledger::validate_deposit(&amount)?;
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: AppError) -> String {
        match err {
            AppError::InvalidInput(message) | AppError::AuthFailure(message) => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn share_count_failure_causes_are_distinct() {
        assert_eq!(parse_share_count(" 12 "), Ok(12));
        assert_eq!(parse_share_count(""), Err(ShareCountError::Missing));
        assert_eq!(parse_share_count("1.5"), Err(ShareCountError::NotAnInteger));
        assert_eq!(parse_share_count("ten"), Err(ShareCountError::NotAnInteger));
        assert_eq!(parse_share_count("0"), Err(ShareCountError::NotPositive));
        assert_eq!(parse_share_count("-4"), Err(ShareCountError::NotPositive));
    }

    #[test]
    fn buy_form_checks_symbol_before_shares() {
        let form = BuyForm {
            symbol: " ".into(),
            shares: "abc".into(),
        };
        assert_eq!(message(form.parse().unwrap_err()), "must provide a symbol");

        let form = BuyForm {
            symbol: "aapl".into(),
            shares: "0".into(),
        };
        assert_eq!(message(form.parse().unwrap_err()), "must provide positive shares");

        let form = BuyForm {
            symbol: " aapl ".into(),
            shares: "3".into(),
        };
        assert_eq!(
            form.parse().unwrap(),
            BuyOrder {
                symbol: "AAPL".into(),
                shares: 3
            }
        );
    }

    #[test]
    fn sell_all_ignores_shares_field() {
        let form = SellForm {
            symbol: "NFLX".into(),
            shares: "".into(),
            sellall: "sellall".into(),
        };
        assert_eq!(form.parse().unwrap().amount, SellAmount::All);

        let form = SellForm {
            symbol: "NFLX".into(),
            shares: "2.5".into(),
            sellall: "".into(),
        };
        assert_eq!(message(form.parse().unwrap_err()), "can't sell fractional shares");
    }

    #[test]
    fn cash_amount_must_be_positive_and_bounded() {
        let parse = |add: &str| CashForm { add: add.into() }.parse();
        assert_eq!(parse("250.75").unwrap(), BigDecimal::from_str("250.75").unwrap());
        assert_eq!(message(parse("").unwrap_err()), "must provide amount of cash");
        assert_eq!(message(parse("lots").unwrap_err()), "must provide cash amount");
        assert_eq!(message(parse("0").unwrap_err()), "must provide a positive amount");
        assert_eq!(message(parse("-10").unwrap_err()), "must provide a positive amount");
        assert_eq!(message(parse("1e20000000").unwrap_err()), "cash amount is too large");
        assert_eq!(message(parse("1000000000000").unwrap_err()), "cash amount is too large");
        assert_eq!(
            message(parse("0.001").unwrap_err()),
            "cash amount can't have fractional cents"
        );
        assert_eq!(parse("999999999999.99").unwrap(), BigDecimal::from_str("999999999999.99").unwrap());
        assert_eq!(parse("12.500").unwrap(), BigDecimal::from_str("12.5").unwrap());
    }

    #[test]
    fn register_form_messages_follow_field_order() {
        let form = |u: &str, p: &str, c: &str| RegisterForm {
            username: u.into(),
            password: p.into(),
            confirmation: c.into(),
        };
        assert_eq!(message(form("", "", "").parse().unwrap_err()), "must provide username");
        assert_eq!(message(form("bob", "", "").parse().unwrap_err()), "must provide password");
        assert_eq!(message(form("bob", "pw", "").parse().unwrap_err()), "must confirm password");
        assert_eq!(message(form("bob", "pw", "px").parse().unwrap_err()), "passwords must match");
        let long = "x".repeat(65);
        assert_eq!(
            message(form(&long, "pw", "pw").parse().unwrap_err()),
            "username must be at most 64 characters"
        );
        assert_eq!(
            form(" bob ", "pw", "pw").parse().unwrap(),
            Credentials {
                username: "bob".into(),
                password: "pw".into()
            }
        );
    }

    #[test]
    fn login_form_failures_are_auth_failures() {
        let form = LoginForm {
            username: "".into(),
            password: "pw".into(),
        };
        let err = form.parse().unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(ref m) if m == "must provide username"));
    }
}
