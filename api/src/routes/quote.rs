use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::quotes::resolve;
use crate::state::AppState;
use crate::types::forms::QuoteForm;
use crate::utils::web_utils::usd;
use crate::views::{self, QuoteTemplate, QuotedTemplate};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/quote")
            .route(web::get().to(quote_form))
            .route(web::post().to(quote)),
    );
}

async fn quote_form() -> Result<HttpResponse, AppError> {
    views::render(&QuoteTemplate {})
}

async fn quote(
    state: web::Data<AppState>,
    form: web::Form<QuoteForm>,
) -> Result<HttpResponse, AppError> {
    let symbol = form.into_inner().parse()?;
    let quote = resolve(state.quotes.as_ref(), &symbol)
        .await
        .ok_or(AppError::UnknownSymbol(symbol))?;

    views::render(&QuotedTemplate {
        price: usd(&quote.price),
        name: quote.name,
        symbol: quote.symbol,
    })
}
