use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use db::ledger;
use diesel::Connection;
use futures::future::join_all;

use crate::errors::AppError;
use crate::quotes::resolve;
use crate::state::AppState;
use crate::utils::web_utils::{run_db, usd, Flash, UserId, FLASH_COOKIE};
use crate::views::{self, HistoryRow, HistoryTemplate, IndexTemplate, PortfolioRow};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/history", web::get().to(history));
}

/// Holdings valued at live prices. A holding whose quote cannot be fetched is
/// listed without a price and left out of the total.
async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: web::ReqData<UserId>,
) -> Result<HttpResponse, AppError> {
    let UserId(user_id) = user.into_inner();
    let (cash, holdings) = run_db(&state.pool, move |conn| {
        conn.transaction(|conn| {
            let cash = ledger::cash_balance(conn, user_id)?;
            let holdings = ledger::get_holdings(conn, user_id)?;
            Ok((cash, holdings))
        })
    })
    .await?;

    let quotes = join_all(
        holdings
            .iter()
            .map(|holding| resolve(state.quotes.as_ref(), &holding.symbol)),
    )
    .await;

    let mut total = cash.clone();
    let rows = holdings
        .into_iter()
        .zip(quotes)
        .map(|(holding, quote)| match quote {
            Some(quote) => {
                let value = &quote.price * &BigDecimal::from(holding.shares);
                let row = PortfolioRow {
                    symbol: holding.symbol,
                    name: quote.name,
                    shares: holding.shares,
                    price: usd(&quote.price),
                    total: usd(&value),
                };
                total += value;
                row
            }
            None => PortfolioRow {
                name: holding.symbol.clone(),
                symbol: holding.symbol,
                shares: holding.shares,
                price: "n/a".to_string(),
                total: "n/a".to_string(),
            },
        })
        .collect();

    let flash = req
        .cookie(FLASH_COOKIE)
        .and_then(|cookie| Flash::from_code(cookie.value()))
        .map(Flash::message)
        .unwrap_or_default()
        .to_string();

    let body = views::render_html(&IndexTemplate {
        flash,
        rows,
        cash: usd(&cash),
        total: usd(&total),
    })?;
    Ok(HttpResponse::Ok()
        .content_type(header::ContentType::html())
        .cookie(Flash::removal_cookie())
        .body(body))
}

async fn history(
    state: web::Data<AppState>,
    user: web::ReqData<UserId>,
) -> Result<HttpResponse, AppError> {
    let UserId(user_id) = user.into_inner();
    let transactions = run_db(&state.pool, move |conn| ledger::history(conn, user_id)).await?;

    let rows = transactions
        .into_iter()
        .map(|transaction| HistoryRow {
            kind: if transaction.is_buy() { "Bought" } else { "Sold" },
            price: usd(&transaction.price),
            timestamp: transaction.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            shares: transaction.shares,
            symbol: transaction.symbol,
        })
        .collect();

    views::render(&HistoryTemplate { rows })
}
