#![allow(dead_code)]

use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One request as seen by [`FakeApi`].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

type Responder = dyn Fn(&str, &str) -> (u16, String) + Send + Sync;

#[derive(Clone)]
struct FakeState {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    respond: Arc<Responder>,
}

/// Stand-in for the monitoring backend, served by axum on a loopback port.
pub struct FakeApi {
    pub addr: SocketAddr,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl FakeApi {
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().expect("poisoned").clone()
    }
}

/// Serve `respond(method, path) -> (status, json body)` until the test ends.
///
/// The status and upload endpoints are routed explicitly; anything else lands
/// in the fallback so a test can still see a wrong path.
pub async fn spawn_fake_api<F>(respond: F) -> FakeApi
where
    F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = FakeState {
        seen: seen.clone(),
        respond: Arc::new(respond),
    };
    let app = Router::new()
        .route("/api/realtime-data/status/", get(record))
        .route("/api/realtime-data/", post(record))
        .fallback(record)
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake api");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    FakeApi { addr, seen }
}

async fn record(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    let (status, payload) = (state.respond)(method.as_str(), &path);
    state.seen.lock().expect("poisoned").push(SeenRequest {
        method: method.to_string(),
        path,
        body,
    });

    let status = StatusCode::from_u16(status).expect("valid status code");
    (status, [(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
