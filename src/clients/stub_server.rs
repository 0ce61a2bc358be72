use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One request as seen by the stub service.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

struct StubState {
    status: StatusCode,
    body: &'static str,
    delay: Duration,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Downstream service double listening on an ephemeral local port. Every
/// route answers `status` with `body` after `delay`.
pub(crate) struct StubServer {
    pub base_url: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub fn start(status: u16, body: &'static str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO)
    }

    pub fn start_with_delay(status: u16, body: &'static str, delay: Duration) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Mutex::new(Vec::new()));

        let state = web::Data::new(StubState {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            delay,
            recorded: recorded.clone(),
        });

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .default_service(web::to(handle))
        })
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();
        actix_web::rt::spawn(server);

        Self {
            base_url: format!("http://{addr}"),
            recorded,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().clone()
    }
}

async fn handle(req: HttpRequest, body: web::Bytes, state: web::Data<StubState>) -> HttpResponse {
    let headers = req
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();

    state.recorded.lock().push(RecordedRequest {
        method: req.method().to_string(),
        path: req.path().to_string(),
        query: req.query_string().to_string(),
        headers,
        body: body.to_vec(),
    });

    if !state.delay.is_zero() {
        actix_web::rt::time::sleep(state.delay).await;
    }

    HttpResponse::build(state.status)
        .content_type("application/json")
        .body(state.body)
}
