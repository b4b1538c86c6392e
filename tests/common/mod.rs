//! In-process stand-in for the site backend, bound to an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "tok-1";

#[derive(Default)]
pub struct Backend {
    pub messages: Vec<Value>,
    pub videos: Vec<Value>,
    pub locations: Vec<Value>,
    /// Whole-list writes answer 404, as if the route were gone.
    pub reject_list_writes: bool,
    pub responses: Map<String, Value>,
    pub texts: Map<String, Value>,
    pub next_id: u64,
    /// Token the backend currently accepts; `None` rejects everything.
    pub accepted_token: Option<String>,
    /// `METHOD path?query auth` of every request after login.
    pub log: Vec<String>,
}

#[derive(Clone)]
pub struct Stub {
    backend: Arc<Mutex<Backend>>,
    pub base_url: String,
}

type Reply = (StatusCode, Json<Value>);

impl Stub {
    pub async fn start() -> Self {
        let backend = Arc::new(Mutex::new(Backend {
            messages: vec![
                json!({"id": 1, "name": "Ion", "phone": "0722", "email": "ion@example.ro",
                       "message": "Gândaci", "timestamp": "2024-05-01T10:00:00"}),
                json!({"id": 2, "name": "Ana", "phone": "0733", "email": "ana@example.ro",
                       "message": "Rozătoare", "timestamp": "2024-05-02T10:00:00"}),
            ],
            videos: vec![json!("111"), json!("222")],
            locations: vec![json!({
                "name": "Vaslui",
                "address": "Str. Ștefan cel Mare 10",
                "phone": "0235 000 000",
                "coordinates": [46.64, 27.73],
                "description": "Sediul central"
            })],
            reject_list_writes: false,
            responses: json!({"pret": "Sunați-ne pentru ofertă."})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            texts: json!({"hero_title": "Sofimar"}).as_object().cloned().unwrap_or_default(),
            next_id: 10,
            accepted_token: Some(TOKEN.to_string()),
            log: Vec::new(),
        }));

        let app = Router::new()
            .route("/api/login", post(login))
            .route("/api/validate", get(validate))
            .route("/api/stats", get(stats))
            .route("/api/messages", get(list_messages).post(add_message).delete(delete_message))
            .route("/api/tiktok-videos", get(list_videos).post(save_videos))
            .route("/api/locations", get(list_locations).post(save_locations))
            .route(
                "/api/chatbot-responses",
                get(list_responses).post(add_response).delete(delete_response),
            )
            .route("/api/site-texts", get(get_texts).post(save_texts))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { backend, base_url: format!("http://{addr}/api") }
    }

    pub fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap()
    }

    pub fn revoke_token(&self) {
        self.backend().accepted_token = None;
    }

    pub fn log(&self) -> Vec<String> {
        self.backend().log.clone()
    }
}

type Shared = State<Arc<Mutex<Backend>>>;

fn record(backend: &mut Backend, line: &str, headers: &HeaderMap) -> bool {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    backend.log.push(format!("{line} {auth}"));
    match &backend.accepted_token {
        Some(token) => auth == format!("Bearer {token}"),
        None => false,
    }
}

fn unauthorized() -> Reply {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})))
}

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

fn not_found() -> Reply {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"})))
}

async fn login(State(state): Shared, Json(body): Json<Value>) -> Reply {
    let backend = state.lock().unwrap();
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        match &backend.accepted_token {
            Some(token) => ok(json!({"token": token})),
            None => unauthorized(),
        }
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid credentials"})))
    }
}

async fn validate(State(state): Shared, headers: HeaderMap) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "GET validate", &headers) {
        return unauthorized();
    }
    ok(json!({"valid": true}))
}

async fn stats(State(state): Shared, headers: HeaderMap) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "GET stats", &headers) {
        return unauthorized();
    }
    ok(json!({
        "messages": backend.messages.len(),
        "tiktok": backend.videos.len(),
        "chatbot_responses": backend.responses.len()
    }))
}

async fn list_messages(State(state): Shared, headers: HeaderMap) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "GET messages", &headers) {
        return unauthorized();
    }
    ok(Value::Array(backend.messages.clone()))
}

async fn add_message(State(state): Shared, headers: HeaderMap, Json(mut body): Json<Value>) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "POST messages", &headers) {
        return unauthorized();
    }
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Missing fields"})));
    }
    backend.next_id += 1;
    let id = backend.next_id;
    body["id"] = json!(id);
    backend.messages.push(body);
    ok(json!({"success": true, "id": id}))
}

async fn delete_message(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let mut backend = state.lock().unwrap();
    let line = match (query.get("id"), query.get("all")) {
        (Some(id), _) => format!("DELETE messages?id={id}"),
        (None, Some(_)) => "DELETE messages?all=1".to_string(),
        (None, None) => "DELETE messages".to_string(),
    };
    if !record(&mut backend, &line, &headers) {
        return unauthorized();
    }
    if query.contains_key("all") {
        backend.messages.clear();
        return ok(json!({"success": true}));
    }
    let Some(id) = query.get("id") else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Missing id"})));
    };
    let before = backend.messages.len();
    backend.messages.retain(|m| m["id"].to_string() != *id);
    if backend.messages.len() == before {
        return not_found();
    }
    ok(json!({"success": true}))
}

async fn list_videos(State(state): Shared, headers: HeaderMap) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "GET tiktok-videos", &headers) {
        return unauthorized();
    }
    ok(Value::Array(backend.videos.clone()))
}

async fn save_videos(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "POST tiktok-videos", &headers) {
        return unauthorized();
    }
    if backend.reject_list_writes {
        return not_found();
    }
    match body.get("videos").and_then(Value::as_array) {
        Some(videos) => {
            backend.videos = videos.clone();
            ok(json!({"success": true}))
        }
        None => (StatusCode::BAD_REQUEST, Json(json!({"error": "videos required"}))),
    }
}

async fn list_locations(State(state): Shared, headers: HeaderMap) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "GET locations", &headers) {
        return unauthorized();
    }
    ok(Value::Array(backend.locations.clone()))
}

async fn save_locations(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "POST locations", &headers) {
        return unauthorized();
    }
    if backend.reject_list_writes {
        return not_found();
    }
    match body.get("locations").and_then(Value::as_array) {
        Some(locations) => {
            backend.locations = locations.clone();
            ok(json!({"success": true}))
        }
        None => (StatusCode::BAD_REQUEST, Json(json!({"error": "locations required"}))),
    }
}

async fn list_responses(State(state): Shared, headers: HeaderMap) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "GET chatbot-responses", &headers) {
        return unauthorized();
    }
    ok(Value::Object(backend.responses.clone()))
}

async fn add_response(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "POST chatbot-responses", &headers) {
        return unauthorized();
    }
    let keyword = body["keyword"].as_str().unwrap_or_default().to_string();
    backend.responses.insert(keyword, body["response"].clone());
    ok(json!({"success": true}))
}

async fn delete_response(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let mut backend = state.lock().unwrap();
    let keyword = query.get("keyword").cloned().unwrap_or_default();
    if !record(&mut backend, &format!("DELETE chatbot-responses?keyword={keyword}"), &headers) {
        return unauthorized();
    }
    match backend.responses.remove(&keyword) {
        Some(_) => ok(json!({"success": true})),
        None => not_found(),
    }
}

async fn get_texts(State(state): Shared, headers: HeaderMap) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "GET site-texts", &headers) {
        return unauthorized();
    }
    ok(Value::Object(backend.texts.clone()))
}

async fn save_texts(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut backend = state.lock().unwrap();
    if !record(&mut backend, "POST site-texts", &headers) {
        return unauthorized();
    }
    if let Some(fields) = body.as_object() {
        backend.texts = fields.clone();
    }
    ok(json!({"success": true}))
}
