#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use api::quotes::{FixedQuotes, Quote};
use api::state::{AppState, AuthSettings};
use bigdecimal::BigDecimal;
use tempfile::TempDir;

/// A fresh app state backed by a throwaway SQLite file. Keep the `TempDir`
/// alive for as long as the state is used.
pub fn test_state() -> (AppState, TempDir) {
    let (state, _quotes, dir) = test_state_with_quotes();
    (state, dir)
}

/// Like `test_state`, also handing back the price table so a test can move
/// or delist prices while the app runs.
pub fn test_state_with_quotes() -> (AppState, Arc<FixedQuotes>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = dir.path().join("finance.db");
    let pool = db::establish_connection_pool(url.to_str().expect("utf-8 path")).expect("pool");
    db::run_migrations(&pool).expect("migrations");

    let quotes = Arc::new(FixedQuotes::new([
        quote("AAPL", "Apple Inc.", "50"),
        quote("NFLX", "Netflix", "200"),
    ]));
    let auth = AuthSettings {
        jwt_secret: "integration-secret".to_string(),
        token_ttl_hours: 1,
        cookie_secure: false,
        bcrypt_cost: 4,
    };
    let state = AppState::new(pool, quotes.clone(), auth, BigDecimal::from(10000));
    (state, quotes, dir)
}

fn quote(symbol: &str, name: &str, price: &str) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        name: name.to_string(),
        price: BigDecimal::from_str(price).expect("price"),
    }
}

pub fn cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Registers `$username` with password "secret" and evaluates to the session cookie.
macro_rules! register {
    ($app:expr, $username:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/register")
            .set_form([
                ("username", $username),
                ("password", "secret"),
                ("confirmation", "secret"),
            ])
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        $crate::common::cookie(&resp, "token").expect("session cookie")
    }};
}

/// GETs `$uri` with the session cookie and evaluates to the body text.
macro_rules! page {
    ($app:expr, $token:expr, $uri:expr) => {{
        let req = actix_web::test::TestRequest::get()
            .uri($uri)
            .cookie($token.clone())
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK, "GET {}", $uri);
        let body = actix_web::test::read_body(resp).await;
        String::from_utf8(body.to_vec()).expect("utf-8 body")
    }};
}

/// POSTs a form with the session cookie and evaluates to the response.
macro_rules! submit {
    ($app:expr, $token:expr, $uri:expr, $form:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri($uri)
            .cookie($token.clone())
            .set_form($form)
            .to_request();
        actix_web::test::call_service(&$app, req).await
    }};
}
