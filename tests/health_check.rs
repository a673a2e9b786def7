mod common;

use axum::http::{Method, StatusCode};

use common::TestApp;
use user_api::version::BuildInfo;

#[tokio::test]
async fn health_check_reports_liveness_and_build_info() {
    let app = TestApp::spawn();

    let (status, body) = app.send(Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let info = BuildInfo::from_build_env();
    assert_eq!(body["Version"], info.version.as_str());
    assert_eq!(body["Revision"], info.revision.as_str());
    assert_eq!(body["Branch"], info.branch.as_str());
    assert_eq!(body["Built By"], info.build_user.as_str());
    assert_eq!(body["Build Date"], info.build_date.as_str());
    assert_eq!(body["Rust Version"], info.rust_version.as_str());
}

#[tokio::test]
async fn health_check_does_not_touch_storage() {
    let app = TestApp::spawn();
    app.store.fail_with("database is down");

    let (status, _) = app.send(Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn health_check_answers_any_method() {
    let app = TestApp::spawn();

    for method in [Method::POST, Method::PUT, Method::DELETE] {
        let (status, body) = app.send(method.clone(), "/", None).await;
        assert_eq!(status, StatusCode::OK, "{method} /");
        assert_eq!(body["ok"], true);
    }
}
