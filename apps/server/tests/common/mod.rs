#![allow(dead_code)]

use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::{test, web};
use server::{build_app, AppState};

// Logging is auto-installed for every test binary that includes this module
#[ctor::ctor]
fn init_logging() {
    server_test_support::logging::init();
}

/// Send `req` through a freshly built app with no database attached.
pub async fn call_app(req: test::TestRequest) -> ServiceResponse<BoxBody> {
    let app = test::init_service(build_app(web::Data::new(AppState::without_db()))).await;
    test::call_service(&app, req.to_request())
        .await
        .map_into_boxed_body()
}
