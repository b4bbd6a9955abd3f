#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use api::build_app;

use common::{cookie, location, test_state};

#[actix_web::test]
async fn duplicate_username_is_refused() {
    let (state, _dir) = test_state();
    let app = test::init_service(build_app(state)).await;
    register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/register")
        .set_form([("username", "alice"), ("password", "x"), ("confirmation", "x")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(cookie(&resp, "token").is_none());
}

#[actix_web::test]
async fn registration_validates_its_fields() {
    let (state, _dir) = test_state();
    let app = test::init_service(build_app(state)).await;

    let forms = [
        [("username", ""), ("password", "pw"), ("confirmation", "pw")],
        [("username", "gina"), ("password", ""), ("confirmation", "")],
        [("username", "gina"), ("password", "pw"), ("confirmation", "wp")],
    ];
    for form in forms {
        let req = test::TestRequest::post()
            .uri("/register")
            .set_form(form)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{form:?}");
    }
}

#[actix_web::test]
async fn login_checks_the_password() {
    let (state, _dir) = test_state();
    let app = test::init_service(build_app(state)).await;
    register!(app, "henry");

    let login = |password: &'static str| {
        test::TestRequest::post()
            .uri("/login")
            .set_form([("username", "henry"), ("password", password)])
            .to_request()
    };

    let resp = test::call_service(&app, login("wrong")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, login("")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("username", "nobody"), ("password", "secret")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, login("secret")).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    let token = cookie(&resp, "token").expect("session cookie");

    let body = page!(app, token, "/");
    assert!(body.contains("$10,000.00"));
}

#[actix_web::test]
async fn logout_clears_the_session() {
    let (state, _dir) = test_state();
    let app = test::init_service(build_app(state)).await;
    let token = register!(app, "iris");

    let req = test::TestRequest::get()
        .uri("/logout")
        .cookie(token)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let cleared = cookie(&resp, "token").expect("removal cookie");
    assert_eq!(cleared.value(), "");
}
