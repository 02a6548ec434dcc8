#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;

/// A canned response: status, extra headers and body.
///
/// `{base}` in headers and body is replaced by the server's base URL.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Canned {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn with_next(mut self, next: &str) -> Self {
        self.headers
            .push(("Link".to_string(), format!("<{{base}}{}>; rel=\"next\"", next)));
        self
    }
}

/// A received request: path with query, and lower-cased headers.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub target: String,
    pub headers: HashMap<String, String>,
}

#[derive(Clone)]
struct Routes {
    base: String,
    canned: Arc<HashMap<String, Canned>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// A hosting API stand-in answering by exact request target.
pub struct MockApi {
    pub base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    pub async fn start(routes: Vec<(&str, Canned)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = Routes {
            base: base.clone(),
            canned: Arc::new(
                routes
                    .into_iter()
                    .map(|(target, canned)| (target.to_string(), canned))
                    .collect(),
            ),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().fallback(answer).with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock API failed");
        });

        Self { base, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn answer(State(routes): State<Routes>, uri: Uri, headers: HeaderMap) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    routes.requests.lock().unwrap().push(Recorded {
        target: target.clone(),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect(),
    });

    let canned = routes
        .canned
        .get(&target)
        .cloned()
        .unwrap_or_else(|| Canned::status(404, r#"{"message":"Not Found"}"#));

    let mut response = (
        StatusCode::from_u16(canned.status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        canned.body.replace("{base}", &routes.base),
    )
        .into_response();
    for (name, value) in &canned.headers {
        response.headers_mut().insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(&value.replace("{base}", &routes.base)).unwrap(),
        );
    }
    response
}
