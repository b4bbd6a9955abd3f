use actix_web::http::header;
use actix_web::{web, HttpResponse};
use db::users;
use log::info;

use crate::errors::AppError;
use crate::state::AppState;
use crate::types::forms::{LoginForm, RegisterForm};
use crate::utils::web_utils::{
    create_token, hash_password, removal_cookie, run_db, token_cookie, verify_password, Flash,
};
use crate::views::{self, LoginTemplate, RegisterTemplate};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/login")
            .route(web::get().to(login_form))
            .route(web::post().to(login)),
    )
    .service(
        web::resource("/register")
            .route(web::get().to(register_form))
            .route(web::post().to(register)),
    )
    .route("/logout", web::get().to(logout));
}

/// Showing the login or registration form ends any current session.
async fn login_form() -> Result<HttpResponse, AppError> {
    let body = views::render_html(&LoginTemplate {})?;
    Ok(HttpResponse::Ok()
        .content_type(header::ContentType::html())
        .cookie(removal_cookie())
        .body(body))
}

async fn register_form() -> Result<HttpResponse, AppError> {
    let body = views::render_html(&RegisterTemplate {})?;
    Ok(HttpResponse::Ok()
        .content_type(header::ContentType::html())
        .cookie(removal_cookie())
        .body(body))
}

async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let credentials = form.into_inner().parse()?;

    let username = credentials.username.clone();
    let user = run_db(&state.pool, move |conn| users::find_by_username(conn, &username)).await?;

    let invalid = || AppError::AuthFailure("invalid username and/or password".to_string());
    let user = user.ok_or_else(invalid)?;
    if !verify_password(credentials.password, user.password_hash.clone()).await? {
        info!("Failed login for {}", user.username);
        return Err(invalid());
    }

    let token = create_token(user.id, &state.auth)?;
    info!("User {} logged in", user.id);
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(token_cookie(token, &state.auth))
        .finish())
}

async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    let credentials = form.into_inner().parse()?;
    let password_hash = hash_password(credentials.password, state.auth.bcrypt_cost).await?;

    let starting_cash = state.starting_cash.clone();
    let username = credentials.username;
    let user = run_db(&state.pool, move |conn| {
        users::create_user(conn, &username, &password_hash, &starting_cash)
    })
    .await?;

    let token = create_token(user.id, &state.auth)?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(token_cookie(token, &state.auth))
        .cookie(Flash::Registered.cookie())
        .finish())
}

async fn logout() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(removal_cookie())
        .finish()
}
