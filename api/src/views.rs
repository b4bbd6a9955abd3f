use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use askama::Template;
use log::error;

use crate::errors::AppError;

pub struct PortfolioRow {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: String,
    pub total: String,
}

pub struct HistoryRow {
    pub kind: &'static str,
    pub symbol: String,
    pub shares: i64,
    pub price: String,
    pub timestamp: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub flash: String,
    pub rows: Vec<PortfolioRow>,
    pub cash: String,
    pub total: String,
}

#[derive(Template)]
#[template(path = "buy.html")]
pub struct BuyTemplate {}

#[derive(Template)]
#[template(path = "sell.html")]
pub struct SellTemplate {
    pub symbols: Vec<String>,
}

#[derive(Template)]
#[template(path = "quote.html")]
pub struct QuoteTemplate {}

#[derive(Template)]
#[template(path = "quoted.html")]
pub struct QuotedTemplate {
    pub name: String,
    pub symbol: String,
    pub price: String,
}

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub rows: Vec<HistoryRow>,
}

#[derive(Template)]
#[template(path = "addcash.html")]
pub struct AddCashTemplate {}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {}

#[derive(Template)]
#[template(path = "apology.html")]
pub struct ApologyTemplate<'a> {
    pub code: u16,
    pub message: &'a str,
}

pub fn render_html<T: Template>(template: &T) -> Result<String, AppError> {
    template
        .render()
        .map_err(|e| AppError::Internal(format!("template rendering failed: {}", e)))
}

pub fn render<T: Template>(template: &T) -> Result<HttpResponse, AppError> {
    let body = render_html(template)?;
    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(body))
}

/// The error page. Falls back to plain text if the template itself fails.
pub fn apology(status: StatusCode, message: &str) -> HttpResponse {
    let template = ApologyTemplate {
        code: status.as_u16(),
        message,
    };
    match template.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type(ContentType::html())
            .body(body),
        Err(e) => {
            error!("Failed to render apology: {}", e);
            HttpResponse::build(status)
                .content_type(ContentType::plaintext())
                .body(format!("{} {}", status.as_u16(), message))
        }
    }
}
