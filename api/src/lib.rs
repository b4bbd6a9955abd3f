use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::{middleware, web, App, Error};

pub mod config;
pub mod errors;
pub mod middlewares;
pub mod quotes;
pub mod routes;
pub mod state;
pub mod types;
pub mod utils;
pub mod views;

pub use state::{build_state, AppState};

use middlewares::auth::AuthService;

/// The full application: routes, session check, cache headers and request log.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(AuthService::new())
        .wrap(
            middleware::DefaultHeaders::new()
                .add((header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
                .add((header::EXPIRES, "0"))
                .add((header::PRAGMA, "no-cache")),
        )
        .wrap(middleware::Logger::default())
        .configure(routes::config)
}
