use actix_web::web;

pub mod auth;
pub mod cash;
pub mod portfolio;
pub mod quote;
pub mod trade;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth::config)
        .configure(portfolio::config)
        .configure(quote::config)
        .configure(trade::config)
        .configure(cash::config);
}
