mod common;

use actix_web::test;
use common::call_app;

#[actix_web::test]
async fn placeholder_error_body_has_all_fields() {
    let resp = call_app(test::TestRequest::get().uri("/")).await;

    assert_eq!(resp.status().as_u16(), 501);
    let content_type = resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(content_type, "application/problem+json");

    let problem_details: serde_json::Value = test::read_body_json(resp).await;

    assert_eq!(problem_details["type"], "urn:problem-type:NOT_IMPLEMENTED");
    assert_eq!(problem_details["title"], "Not Implemented");
    assert_eq!(problem_details["status"], 501);
    assert_eq!(problem_details["code"], "NOT_IMPLEMENTED");
    assert_eq!(
        problem_details["detail"],
        "This endpoint is not implemented yet"
    );
}
