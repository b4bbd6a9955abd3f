use actix_web::http::header;
use actix_web::{web, HttpResponse};
use db::ledger;
use log::debug;

use crate::errors::AppError;
use crate::quotes::resolve;
use crate::state::AppState;
use crate::types::forms::{BuyForm, SellForm};
use crate::utils::web_utils::{run_db, Flash, UserId};
use crate::views::{self, BuyTemplate, SellTemplate};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/buy")
            .route(web::get().to(buy_form))
            .route(web::post().to(buy)),
    )
    .service(
        web::resource("/sell")
            .route(web::get().to(sell_form))
            .route(web::post().to(sell)),
    );
}

fn redirect_home(flash: Flash) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(flash.cookie())
        .finish()
}

async fn buy_form() -> Result<HttpResponse, AppError> {
    views::render(&BuyTemplate {})
}

async fn buy(
    state: web::Data<AppState>,
    user: web::ReqData<UserId>,
    form: web::Form<BuyForm>,
) -> Result<HttpResponse, AppError> {
    let UserId(user_id) = user.into_inner();
    let order = form.into_inner().parse()?;

    let quote = resolve(state.quotes.as_ref(), &order.symbol)
        .await
        .ok_or_else(|| AppError::UnknownSymbol(order.symbol.clone()))?;
    debug!("Buying {} {} at {}", order.shares, quote.symbol, quote.price);

    run_db(&state.pool, move |conn| {
        ledger::buy(conn, user_id, &quote.symbol, order.shares, &quote.price)
    })
    .await?;

    Ok(redirect_home(Flash::Bought))
}

/// The symbol list offers only what the user currently holds.
async fn sell_form(
    state: web::Data<AppState>,
    user: web::ReqData<UserId>,
) -> Result<HttpResponse, AppError> {
    let UserId(user_id) = user.into_inner();
    let holdings = run_db(&state.pool, move |conn| ledger::get_holdings(conn, user_id)).await?;
    let symbols = holdings.into_iter().map(|holding| holding.symbol).collect();
    views::render(&SellTemplate { symbols })
}

async fn sell(
    state: web::Data<AppState>,
    user: web::ReqData<UserId>,
    form: web::Form<SellForm>,
) -> Result<HttpResponse, AppError> {
    let UserId(user_id) = user.into_inner();
    let order = form.into_inner().parse()?;

    let quote = resolve(state.quotes.as_ref(), &order.symbol)
        .await
        .ok_or_else(|| AppError::UnknownSymbol(order.symbol.clone()))?;

    run_db(&state.pool, move |conn| {
        ledger::sell(conn, user_id, &quote.symbol, order.amount, &quote.price)
    })
    .await?;

    Ok(redirect_home(Flash::Sold))
}
