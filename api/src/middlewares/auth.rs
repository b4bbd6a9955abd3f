use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use std::future::{ready, Ready};
use actix_web::{dev, dev::Service, dev::Transform, Error, HttpResponse, web::Data, HttpMessage};
use futures_util::future::LocalBoxFuture;
use log::debug;
use crate::state::AppState;
use crate::utils::web_utils::get_user_from_jwt;

/// Routes reachable without a session.
const PUBLIC_ROUTES: [&str; 3] = ["/login", "/register", "/logout"];

pub struct AuthMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_ROUTES.iter().any(|route| *route == req.path()) {
            let res = self.service.call(req);
            return Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) });
        }

        let user = req
            .app_data::<Data<AppState>>()
            .and_then(|state| get_user_from_jwt(&req, &state.auth));

        if let Some(user) = user {
            req.extensions_mut().insert(user);
            let res = self.service.call(req);
            Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) })
        } else {
            debug!("No session for {}, redirecting to login", req.path());
            let (request, _pl) = req.into_parts();
            let response = HttpResponse::Found()
                .insert_header((header::LOCATION, "/login"))
                .finish()
                .map_into_right_body();

            Box::pin(async { Ok(ServiceResponse::new(request, response)) })
        }
    }
}

/// Resolves the session cookie to a `UserId` request extension, or redirects
/// to `/login` before the handler runs.
#[derive(Clone, Default)]
pub struct AuthService;

impl AuthService {
    pub fn new() -> Self {
        AuthService
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthService
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddleware { service }))
    }
}
