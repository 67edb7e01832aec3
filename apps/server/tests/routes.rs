mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::call_app;
use server_test_support::problem_details::assert_problem_details_from_service_response;

#[actix_web::test]
async fn root_get_is_not_implemented() {
    let resp = call_app(test::TestRequest::get().uri("/")).await;

    assert_problem_details_from_service_response(
        resp,
        "NOT_IMPLEMENTED",
        StatusCode::NOT_IMPLEMENTED,
    )
    .await;
}

#[actix_web::test]
async fn root_answers_501_for_any_method() {
    for req in [
        test::TestRequest::post().uri("/"),
        test::TestRequest::put().uri("/"),
        test::TestRequest::delete().uri("/"),
    ] {
        let resp = call_app(req).await;
        assert_problem_details_from_service_response(
            resp,
            "NOT_IMPLEMENTED",
            StatusCode::NOT_IMPLEMENTED,
        )
        .await;
    }
}

#[actix_web::test]
async fn unknown_path_is_not_found() {
    let resp = call_app(test::TestRequest::get().uri("/missing")).await;

    assert_problem_details_from_service_response(resp, "NOT_FOUND", StatusCode::NOT_FOUND).await;
}

#[actix_web::test]
async fn nested_path_under_root_is_not_found() {
    let resp = call_app(test::TestRequest::get().uri("/api/v1/users")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "no route for /api/v1/users");
}
