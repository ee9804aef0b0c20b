#![allow(dead_code)]

use devproxy::config::{
    AppState, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    StaticFilesConfig, UpstreamConfig,
};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Test configuration pointing at `upstream` and serving `root`
pub fn test_config(root: &Path, upstream: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: None,
        },
        upstream: UpstreamConfig {
            base_url: upstream.to_string(),
            prefixes: vec!["/api/".to_string(), "/auth/".to_string()],
            timeout_secs: 10,
        },
        static_files: StaticFilesConfig {
            root: root.to_string_lossy().into_owned(),
            index_files: vec!["index.html".to_string()],
            directory_listing: true,
        },
        logging: LoggingConfig {
            level: "error".to_string(),
            access_log: false,
            access_log_format: "common".to_string(),
            access_log_file: None,
            error_log_file: None,
        },
        performance: PerformanceConfig {
            keep_alive: true,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
        },
        http: HttpConfig {
            server_name: "devproxy-test".to_string(),
            max_body_size: 1024 * 1024,
        },
    }
}

pub fn test_state(config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(config).expect("valid test config"))
}

/// Run a one-handler HTTP server on an ephemeral port
pub async fn spawn_upstream<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let handler = handler.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { Ok::<_, Infallible>(handler(req).await) }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    addr
}

/// Upstream that echoes the request line, headers and body back as text
pub async fn spawn_echo_upstream() -> SocketAddr {
    spawn_upstream(|req: Request<Incoming>| async move {
        let (parts, body) = req.into_parts();
        let body = body.collect().await.unwrap().to_bytes();

        let mut text = format!(
            "{} {}\n",
            parts.method,
            parts.uri.path_and_query().map_or("/", |pq| pq.as_str())
        );
        for (name, value) in &parts.headers {
            text.push_str(&format!("{}: {}\n", name, value.to_str().unwrap_or("?")));
        }
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&body));

        Response::builder()
            .status(200)
            .header("content-type", "text/plain")
            .header("x-upstream", "echo")
            .body(Full::new(Bytes::from(text)))
            .unwrap()
    })
    .await
}

/// An address nothing is listening on
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn request(method: &str, uri: &str, body: &'static [u8]) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "localhost:3000")
        .body(Full::new(Bytes::from_static(body)))
        .unwrap()
}

pub async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_text(response: Response<Full<Bytes>>) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

pub fn assert_cors(response: &Response<Full<Bytes>>) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-methods"],
        "GET, POST, PUT, DELETE, OPTIONS"
    );
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
}
