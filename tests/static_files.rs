mod common;

use common::{assert_cors, body_bytes, body_text, request, test_config, test_state};
use hyper::StatusCode;
use std::fs;

const UNUSED_UPSTREAM: &str = "http://127.0.0.1:9";

fn site() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("index.html"), "<h1>home</h1>").unwrap();
    fs::write(root.path().join("app.js"), "console.log(1);").unwrap();
    fs::create_dir_all(root.path().join("docs")).unwrap();
    fs::write(root.path().join("docs/guide.txt"), "read me").unwrap();
    fs::create_dir_all(root.path().join("assets/img")).unwrap();
    fs::write(root.path().join("assets/logo.svg"), "<svg/>").unwrap();
    root
}

#[tokio::test]
async fn test_serves_file_with_content_type() {
    let root = site();
    let state = test_state(test_config(root.path(), UNUSED_UPSTREAM));

    let response = state.router.handle(request("GET", "/app.js", b"")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/javascript; charset=utf-8");
    assert_eq!(response.headers()["content-length"], "15");
    assert!(response.headers().contains_key("last-modified"));
    assert_cors(&response);
    assert_eq!(body_text(response).await, "console.log(1);");
}

#[tokio::test]
async fn test_root_serves_index() {
    let root = site();
    let state = test_state(test_config(root.path(), UNUSED_UPSTREAM));

    let response = state.router.handle(request("GET", "/", b"")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
    assert_eq!(body_text(response).await, "<h1>home</h1>");
}

#[tokio::test]
async fn test_missing_file_is_404_with_cors() {
    let root = site();
    let state = test_state(test_config(root.path(), UNUSED_UPSTREAM));

    let response = state.router.handle(request("GET", "/nope.css", b"")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);
    assert!(body_text(response).await.contains("File not found"));
}

#[tokio::test]
async fn test_directory_without_slash_redirects() {
    let root = site();
    let state = test_state(test_config(root.path(), UNUSED_UPSTREAM));

    let response = state.router.handle(request("GET", "/docs?x=1", b"")).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "/docs/?x=1");
    assert_cors(&response);
}

#[tokio::test]
async fn test_directory_listing() {
    let root = site();
    let state = test_state(test_config(root.path(), UNUSED_UPSTREAM));

    let response = state.router.handle(request("GET", "/assets/", b"")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("href=\"img/\""));
    assert!(html.contains("href=\"logo.svg\""));
}

#[tokio::test]
async fn test_directory_listing_disabled() {
    let root = site();
    let mut config = test_config(root.path(), UNUSED_UPSTREAM);
    config.static_files.directory_listing = false;
    let state = test_state(config);

    let response = state.router.handle(request("GET", "/assets/", b"")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_stays_inside_root() {
    let outer = tempfile::tempdir().unwrap();
    fs::write(outer.path().join("secret.txt"), "top secret").unwrap();
    let root = outer.path().join("public");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("ok.txt"), "fine").unwrap();
    let state = test_state(test_config(&root, UNUSED_UPSTREAM));

    for target in ["/../secret.txt", "/%2e%2e/secret.txt", "/a/../../secret.txt"] {
        let response = state.router.handle(request("GET", target, b"")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{target}");
    }

    let response = state.router.handle(request("GET", "/x/../ok.txt", b"")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_head_has_headers_but_no_body() {
    let root = site();
    let state = test_state(test_config(root.path(), UNUSED_UPSTREAM));

    let response = state.router.handle(request("HEAD", "/docs/guide.txt", b"")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-length"], "7");
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_if_modified_since_gives_304() {
    let root = site();
    let state = test_state(test_config(root.path(), UNUSED_UPSTREAM));

    let first = state.router.handle(request("GET", "/app.js", b"")).await;
    let last_modified = first.headers()["last-modified"].clone();

    let req = hyper::Request::builder()
        .uri("/app.js")
        .header("if-modified-since", last_modified)
        .body(http_body_util::Full::new(hyper::body::Bytes::new()))
        .unwrap();
    let response = state.router.handle(req).await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_cors(&response);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_write_method_outside_prefixes_is_404() {
    let root = site();
    let state = test_state(test_config(root.path(), UNUSED_UPSTREAM));

    for method in ["POST", "PUT", "DELETE"] {
        let response = state.router.handle(request(method, "/app.js", b"{}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
        assert_cors(&response);
    }
}
