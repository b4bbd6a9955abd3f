use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::ServiceRequest;
use actix_web::web;
use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use db::{DbPool, LedgerError};
use diesel::sqlite::SqliteConnection;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AuthSettings;

pub const TOKEN_COOKIE: &str = "token";
pub const FLASH_COOKIE: &str = "flash";

/// The authenticated user of a request, inserted by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i32);

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub fn create_token(user_id: i32, auth: &AuthSettings) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(auth.token_ttl_hours)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
}

pub fn decode_token(token: &str, auth: &AuthSettings) -> Option<UserId> {
    let decoding_key = DecodingKey::from_secret(auth.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default()).ok()?;
    token_data.claims.sub.parse().ok().map(UserId)
}

pub fn get_user_from_jwt(req: &ServiceRequest, auth: &AuthSettings) -> Option<UserId> {
    let cookie = req.cookie(TOKEN_COOKIE)?;
    decode_token(cookie.value(), auth)
}

pub fn token_cookie(token: String, auth: &AuthSettings) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(auth.cookie_secure)
        .same_site(SameSite::Lax)
        .finish()
}

/// Expires the session cookie.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(TOKEN_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// One-shot notices shown on the portfolio page after a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Bought,
    Sold,
    CashAdded,
    Registered,
}

impl Flash {
    pub fn code(self) -> &'static str {
        match self {
            Flash::Bought => "bought",
            Flash::Sold => "sold",
            Flash::CashAdded => "cash-added",
            Flash::Registered => "registered",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "bought" => Some(Flash::Bought),
            "sold" => Some(Flash::Sold),
            "cash-added" => Some(Flash::CashAdded),
            "registered" => Some(Flash::Registered),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::Bought => "Bought!",
            Flash::Sold => "Sold!",
            Flash::CashAdded => "Cash Added!",
            Flash::Registered => "Registered!",
        }
    }

    pub fn cookie(self) -> Cookie<'static> {
        Cookie::build(FLASH_COOKIE, self.code())
            .path("/")
            .http_only(true)
            .finish()
    }

    pub fn removal_cookie() -> Cookie<'static> {
        let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
        cookie.make_removal();
        cookie
    }
}

/// Runs a ledger operation on the blocking pool with a pooled connection.
pub async fn run_db<F, T>(pool: &DbPool, f: F) -> Result<T, AppError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    let result = web::block(move || {
        let mut conn = pool.get()?;
        f(&mut conn)
    })
    .await
    .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?;
    Ok(result?)
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    web::block(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let verified = web::block(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?;
    // A malformed stored hash cannot match anything.
    Ok(verified.unwrap_or(false))
}

/// Formats an amount as US dollars: `$1,234.50`.
pub fn usd(value: &BigDecimal) -> String {
    let rounded = value.round(2).with_scale(2).to_string();
    let (negative, digits) = match rounded.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, rounded.as_str()),
    };
    let (whole, cents) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // "-0.00" rounds to zero and is shown unsigned.
    let negative = negative && digits.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
            cookie_secure: false,
            bcrypt_cost: 4,
        }
    }

    #[test]
    fn formats_usd() {
        let cases = [
            ("0", "$0.00"),
            ("5", "$5.00"),
            ("9500", "$9,500.00"),
            ("1234567.891", "$1,234,567.89"),
            ("100000", "$100,000.00"),
            ("12.3", "$12.30"),
            ("-42.5", "-$42.50"),
            ("-1234", "-$1,234.00"),
        ];
        for (input, expected) in cases {
            assert_eq!(usd(&BigDecimal::from_str(input).unwrap()), expected, "{input}");
        }
    }

    #[test]
    fn token_round_trip() {
        let auth = settings();
        let token = create_token(42, &auth).unwrap();
        assert_eq!(decode_token(&token, &auth), Some(UserId(42)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(42, &settings()).unwrap();
        let other = AuthSettings {
            jwt_secret: "another-secret".to_string(),
            ..settings()
        };
        assert_eq!(decode_token(&token, &other), None);
        assert_eq!(decode_token("not-a-jwt", &settings()), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = AuthSettings {
            token_ttl_hours: -2,
            ..settings()
        };
        let token = create_token(42, &auth).unwrap();
        assert_eq!(decode_token(&token, &auth), None);
    }

    #[test]
    fn flash_codes_round_trip() {
        for flash in [Flash::Bought, Flash::Sold, Flash::CashAdded, Flash::Registered] {
            assert_eq!(Flash::from_code(flash.code()), Some(flash));
        }
        assert_eq!(Flash::from_code("<script>"), None);
    }

    #[actix_web::test]
    async fn password_hash_verifies() {
        let hash = hash_password("hunter2".to_string(), 4).await.unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter3".to_string(), hash).await.unwrap());
        assert!(!verify_password("x".to_string(), "garbage".to_string()).await.unwrap());
    }
}
