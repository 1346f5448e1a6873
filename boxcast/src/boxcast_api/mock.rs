//! Mock BoxCast server for testing the client.
//!
//! The server listens on a random local port and answers every request through a handler
//! closure, recording each request it sees so tests can assert on exactly what the client
//! sent. Token and resource endpoints share the one server; see
//! [`ClientConfig::with_base_url`](crate::config::ClientConfig::with_base_url).

use http_body_util::{BodyExt, Full};
use hyper::body::{self, Bytes};
use hyper::service::service_fn;
use hyper::{Request, Response};
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// A request as the mock server saw it.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    /// Value of query parameter `key`, if present.
    pub fn query_param(&self, key: &str) -> Option<String> {
        form_urlencoded::parse(self.query.as_deref().unwrap_or("").as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// What the handler wants the server to answer.
#[derive(Debug, Clone)]
pub(crate) struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// A list page whose `X-Pagination` header is `pagination`.
    pub fn page(items: serde_json::Value, pagination: serde_json::Value) -> Self {
        Self::json(200, items).with_header("X-Pagination", pagination.to_string())
    }

    /// A successful client-credentials token response.
    pub fn token(access_token: &str) -> Self {
        Self::json(
            200,
            serde_json::json!({
                "access_token": access_token,
                "token_type": "bearer",
                "expires_in": 3600,
            }),
        )
    }
}

type Handler = dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync;

pub(crate) struct MockBoxCast {
    base_url: Url,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    server: tokio::task::JoinHandle<()>,
}

impl MockBoxCast {
    /// Starts a server that answers every request with `handler`.
    pub async fn start(
        handler: impl Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    ) -> Self {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to localhost");
        let addr = socket.local_addr().expect("get local address");
        let base_url = Url::parse(&format!("http://{}:{}/", addr.ip(), addr.port()))
            .expect("construct base url");

        let handler: Arc<Handler> = Arc::new(handler);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let server = tokio::spawn(async move {
            while let Ok((conn, _)) = socket.accept().await {
                let conn = hyper_util::rt::TokioIo::new(conn);
                let handler = Arc::clone(&handler);
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let handler = Arc::clone(&handler);
                        let recorded = Arc::clone(&recorded);
                        async move {
                            let (parts, body) = req.into_parts();
                            let body = body.collect().await?.to_bytes();
                            let request = RecordedRequest {
                                method: parts.method.to_string(),
                                path: parts.uri.path().to_string(),
                                query: parts.uri.query().map(str::to_string),
                                authorization: parts
                                    .headers
                                    .get(http::header::AUTHORIZATION)
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_string),
                                body: String::from_utf8_lossy(&body).into_owned(),
                            };
                            let response = handler(&request);
                            recorded.lock().await.push(request);

                            let mut builder = Response::builder().status(response.status);
                            for (name, value) in &response.headers {
                                builder = builder.header(name, value);
                            }
                            Ok::<_, hyper::Error>(
                                builder
                                    .body(Full::new(Bytes::from(response.body)))
                                    .expect("mock response is valid"),
                            )
                        }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(conn, service)
                        .await;
                });
            }
        });

        Self {
            base_url,
            requests,
            server,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Every request received so far, token requests included.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    /// Requests received so far, excluding token requests.
    pub async fn api_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.path != "/oauth2/token")
            .collect()
    }

    pub async fn token_requests(&self) -> usize {
        self.requests()
            .await
            .iter()
            .filter(|r| r.path == "/oauth2/token")
            .count()
    }
}

impl Drop for MockBoxCast {
    fn drop(&mut self) {
        self.server.abort();
    }
}
