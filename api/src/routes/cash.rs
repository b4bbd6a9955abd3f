use actix_web::http::header;
use actix_web::{web, HttpResponse};
use db::ledger;

use crate::errors::AppError;
use crate::state::AppState;
use crate::types::forms::CashForm;
use crate::utils::web_utils::{run_db, Flash, UserId};
use crate::views::{self, AddCashTemplate};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/addcash")
            .route(web::get().to(add_cash_form))
            .route(web::post().to(add_cash)),
    );
}

async fn add_cash_form() -> Result<HttpResponse, AppError> {
    views::render(&AddCashTemplate {})
}

async fn add_cash(
    state: web::Data<AppState>,
    user: web::ReqData<UserId>,
    form: web::Form<CashForm>,
) -> Result<HttpResponse, AppError> {
    let UserId(user_id) = user.into_inner();
    let amount = form.into_inner().parse()?;
    run_db(&state.pool, move |conn| ledger::add_cash(conn, user_id, &amount)).await?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(Flash::CashAdded.cookie())
        .finish())
}
