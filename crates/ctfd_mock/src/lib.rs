// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

//! A small in-memory imitation of a CTFd platform with the container plugin installed.
//!
//! It serves the REST endpoints the CLI consumes, the login pages used for token generation, and
//! challenge attachments. One team plays; it may run a single instance at a time.

use axum::body::{Body, Bytes};
use axum::extract::{Form, Path, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::debug;

pub const MOCK_TOKEN: &str = "ctfd_4f1c0ffee5eed";
pub const MOCK_USER: &str = "player";
pub const MOCK_PASSWORD: &str = "hunter2";
pub const CSRF_NONCE: &str = "b2f6c1e9a07d";
pub const STOP_FIRST_ERROR: &str =
    "You already have a running instance. Please stop it before starting another one.";

const SESSION_COOKIE: &str = "session=mock-session";
const STREAM_CHUNK: usize = 4096;

#[derive(Debug, Clone)]
pub struct MockChallenge {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub kind: String,
    pub value: i64,
    pub description: String,
    pub flag: String,
    pub files: Vec<String>,
    /// `http` or `tcp`, for container challenges
    pub connect: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MockFile {
    pub name: String,
    pub content: Vec<u8>,
    /// Served as a stream without a content length
    pub chunked: bool,
}

#[derive(Debug, Clone)]
pub struct MockPlatform {
    pub token: String,
    pub challenges: Vec<MockChallenge>,
    pub files: Vec<MockFile>,
    /// Team name and score, best first
    pub scoreboard: Vec<(String, i64)>,
    /// Solver name and date per challenge id
    pub solves: HashMap<u64, Vec<(String, String)>>,
}

#[derive(Default)]
struct Progress {
    solved: HashSet<u64>,
    running: Option<u64>,
}

struct AppState {
    platform: MockPlatform,
    progress: Mutex<Progress>,
}

/// A running mock bound to a local port.
pub struct MockServer {
    pub addr: SocketAddr,
    state: Arc<AppState>,
}

impl MockServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn running_instance(&self) -> Option<u64> {
        self.state.progress.lock().ok().and_then(|p| p.running)
    }

    pub fn is_solved(&self, id: u64) -> bool {
        self.state
            .progress
            .lock()
            .map(|p| p.solved.contains(&id))
            .unwrap_or(false)
    }
}

/// Binds the mock to an ephemeral port on localhost and serves it in the background.
pub async fn spawn(platform: MockPlatform) -> anyhow::Result<MockServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(AppState {
        platform,
        progress: Mutex::new(Progress::default()),
    });
    let app = router(state.clone());

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, app).await {
            tracing::error!(%error, "mock platform stopped");
        }
    });

    Ok(MockServer { addr, state })
}

/// Serves the mock on `listener` until the process ends.
pub async fn serve(listener: TcpListener, platform: MockPlatform) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        platform,
        progress: Mutex::new(Progress::default()),
    });
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/challenges", get(challenges_page))
        .route("/api/v1/users", get(users))
        .route("/api/v1/tokens", post(create_token))
        .route("/api/v1/challenges", get(list_challenges))
        .route("/api/v1/challenges/attempt", post(attempt))
        .route("/api/v1/challenges/{id}", get(get_challenge))
        .route("/api/v1/challenges/{id}/solves", get(get_solves))
        .route("/api/v1/scoreboard/top/{count}", get(scoreboard))
        .route("/containers/api/request", post(request_instance))
        .route("/containers/api/renew", post(renew_instance))
        .route("/containers/api/stop", post(stop_instance))
        .route("/files/{key}/{name}", get(download))
        .with_state(state)
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let expected = format!("Token {}", state.platform.token);
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected)
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "message": "You don't have the permission to access the requested resource. It is either read-protected or not readable by the server."
        })),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "message": "The requested URL was not found on the server. If you entered the URL manually please check your spelling and try again."
        })),
    )
        .into_response()
}

fn data(value: Value) -> Response {
    Json(json!({ "success": true, "data": value })).into_response()
}

fn container_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn page(body: &str) -> Html<String> {
    Html(format!(
        r#"<html><head><script>
    var init = {{
        'urlRoot': "",
        'csrfNonce': "{CSRF_NONCE}",
        'userMode': "teams",
    }}
</script></head><body>{body}</body></html>"#
    ))
}

fn find(state: &AppState, id: u64) -> Option<&MockChallenge> {
    state.platform.challenges.iter().find(|c| c.id == id)
}

async fn index() -> Html<String> {
    page("<h1>Mock CTF</h1>")
}

async fn login_page() -> Html<String> {
    page(r#"<form method="post"><input name="name"><input name="password"></form>"#)
}

async fn challenges_page() -> Html<String> {
    page("<h1>Challenges</h1>")
}

#[derive(Deserialize)]
struct LoginForm {
    name: String,
    password: String,
    nonce: String,
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.name == MOCK_USER && form.password == MOCK_PASSWORD && form.nonce == CSRF_NONCE {
        debug!(name = form.name, "login accepted");
        ([(SET_COOKIE, SESSION_COOKIE)], Redirect::to("/challenges")).into_response()
    } else {
        page("<div>Your username or password is incorrect</div>").into_response()
    }
}

async fn create_token(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let has_session = headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(SESSION_COOKIE));
    let has_nonce = headers
        .get("CSRF-Token")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == CSRF_NONCE);
    if !has_session || !has_nonce {
        return forbidden();
    }

    data(json!({
        "id": 1,
        "type": "user",
        "value": state.platform.token,
        "expiration": "2099-01-01T00:00:00+00:00",
    }))
}

async fn users(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return forbidden();
    }
    data(json!([{ "id": 1, "name": MOCK_USER }]))
}

async fn list_challenges(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return forbidden();
    }
    let solved = state
        .progress
        .lock()
        .map(|p| p.solved.clone())
        .unwrap_or_default();
    let entries: Vec<Value> = state
        .platform
        .challenges
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "type": c.kind,
                "name": c.name,
                "value": c.value,
                "solves": state.platform.solves.get(&c.id).map_or(0, Vec::len),
                "solved_by_me": solved.contains(&c.id),
                "category": c.category,
                "tags": [],
                "template": "/plugins/challenges/assets/view.html",
                "script": "/plugins/challenges/assets/view.js",
            })
        })
        .collect();
    data(Value::Array(entries))
}

async fn get_challenge(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if !authorized(&state, &headers) {
        return forbidden();
    }
    let Some(c) = find(&state, id) else {
        return not_found();
    };
    data(json!({
        "id": c.id,
        "name": c.name,
        "category": c.category,
        "type": c.kind,
        "value": c.value,
        "description": c.description,
        "connection_info": null,
        "files": c.files,
        "tags": [],
        "hints": [],
        "state": "visible",
    }))
}

#[derive(Deserialize)]
struct AttemptRequest {
    challenge_id: u64,
    submission: String,
}

async fn attempt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AttemptRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return forbidden();
    }
    let Some(challenge) = find(&state, request.challenge_id) else {
        return not_found();
    };
    let Ok(mut progress) = state.progress.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let (status, message) = if progress.solved.contains(&challenge.id) {
        ("already_solved", "You already solved this")
    } else if request.submission.trim() == challenge.flag {
        progress.solved.insert(challenge.id);
        ("correct", "Correct")
    } else {
        ("incorrect", "Incorrect")
    };
    data(json!({ "status": status, "message": message }))
}

async fn get_solves(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if !authorized(&state, &headers) {
        return forbidden();
    }
    if find(&state, id).is_none() {
        return not_found();
    }
    let solves: Vec<Value> = state
        .platform
        .solves
        .get(&id)
        .map(|solves| {
            solves
                .iter()
                .enumerate()
                .map(|(i, (name, date))| {
                    json!({
                        "account_id": i + 1,
                        "name": name,
                        "date": date,
                        "account_url": format!("/teams/{}", i + 1),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    data(Value::Array(solves))
}

async fn scoreboard(State(state): State<Arc<AppState>>, Path(count): Path<usize>) -> Response {
    let entries: serde_json::Map<String, Value> = state
        .platform
        .scoreboard
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, (name, score))| {
            let rank = i + 1;
            (
                rank.to_string(),
                json!({
                    "id": rank,
                    "account_url": format!("/teams/{rank}"),
                    "name": name,
                    "score": score,
                    "solves": [{ "challenge_id": 1, "account_id": rank, "value": score }],
                }),
            )
        })
        .collect();
    data(Value::Object(entries))
}

#[derive(Deserialize)]
struct ContainerRequest {
    chal_id: u64,
}

fn connection(challenge: &MockChallenge, status: Option<&str>) -> Value {
    let mut info = json!({
        "hostname": "127.0.0.1",
        "port": 30000 + challenge.id,
        "connect": challenge.connect.as_deref().unwrap_or("tcp"),
        "expires": 1_900_000_000,
    });
    if let (Some(status), Some(map)) = (status, info.as_object_mut()) {
        map.insert("status".to_string(), json!(status));
    }
    info
}

async fn request_instance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ContainerRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return forbidden();
    }
    let Some(challenge) = find(&state, request.chal_id).filter(|c| c.kind == "container") else {
        return container_error(StatusCode::BAD_REQUEST, "Invalid challenge");
    };
    let Ok(mut progress) = state.progress.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    match progress.running {
        Some(id) if id == challenge.id => {
            Json(connection(challenge, Some("already_running"))).into_response()
        }
        Some(_) => container_error(StatusCode::FORBIDDEN, STOP_FIRST_ERROR),
        None => {
            progress.running = Some(challenge.id);
            Json(connection(challenge, Some("started"))).into_response()
        }
    }
}

async fn renew_instance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ContainerRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return forbidden();
    }
    let Some(challenge) = find(&state, request.chal_id) else {
        return container_error(StatusCode::BAD_REQUEST, "Invalid challenge");
    };
    let running = state.progress.lock().ok().and_then(|p| p.running);
    if running != Some(challenge.id) {
        return container_error(StatusCode::NOT_FOUND, "Instance not found");
    }
    Json(connection(challenge, None)).into_response()
}

async fn stop_instance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ContainerRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return forbidden();
    }
    if let Ok(mut progress) = state.progress.lock() {
        if progress.running == Some(request.chal_id) {
            progress.running = None;
        }
    }
    Json(json!({ "success": "Instance stopped" })).into_response()
}

async fn download(
    State(state): State<Arc<AppState>>,
    Path((_key, name)): Path<(String, String)>,
) -> Response {
    let Some(file) = state.platform.files.iter().find(|f| f.name == name) else {
        return not_found();
    };

    if file.chunked {
        let chunks: Vec<Result<Bytes, std::io::Error>> = file
            .content
            .chunks(STREAM_CHUNK)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Body::from_stream(futures::stream::iter(chunks)).into_response()
    } else {
        Bytes::from(file.content.clone()).into_response()
    }
}

#[allow(clippy::too_many_arguments)]
fn challenge(
    id: u64,
    name: &str,
    category: &str,
    kind: &str,
    value: i64,
    flag: &str,
    files: &[&str],
    connect: Option<&str>,
) -> MockChallenge {
    MockChallenge {
        id,
        name: name.to_string(),
        category: category.to_string(),
        kind: kind.to_string(),
        value,
        description: format!("Solve {name} to get the flag."),
        flag: flag.to_string(),
        files: files.iter().map(|f| f.to_string()).collect(),
        connect: connect.map(str::to_string),
    }
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            token: MOCK_TOKEN.to_string(),
            challenges: vec![
                challenge(
                    1,
                    "Baby RE",
                    "rev",
                    "standard",
                    100,
                    "flag{baby_re}",
                    &["/files/3f2a9c/crackme?token=eyJ1c2VyX2lkIjoxfQ"],
                    None,
                ),
                challenge(2, "Baby RE", "pwn", "standard", 200, "flag{baby_pwn}", &[], None),
                challenge(
                    3,
                    "Web Portal",
                    "web",
                    "container",
                    300,
                    "flag{portal}",
                    &[],
                    Some("http"),
                ),
                challenge(
                    4,
                    "Echo Server",
                    "pwn",
                    "container",
                    250,
                    "flag{echo}",
                    &["/files/77d0e1/echo?token=eyJ1c2VyX2lkIjoxfQ"],
                    Some("tcp"),
                ),
                challenge(
                    5,
                    "Sanity Check",
                    "misc",
                    "standard",
                    10,
                    "flag{sanity}",
                    &["/files/9b1c44/notes.txt", "/files/0c5e2d/capture.pcap"],
                    None,
                ),
            ],
            files: vec![
                MockFile {
                    name: "crackme".to_string(),
                    content: pattern(20_000),
                    chunked: false,
                },
                MockFile {
                    name: "echo".to_string(),
                    content: pattern(1_337),
                    chunked: false,
                },
                MockFile {
                    name: "notes.txt".to_string(),
                    content: b"the flag format is flag{...}\n".to_vec(),
                    chunked: false,
                },
                MockFile {
                    name: "capture.pcap".to_string(),
                    content: pattern(50_000),
                    chunked: true,
                },
            ],
            scoreboard: vec![
                ("Cyberlandslaget".to_string(), 1250),
                ("flagbearers".to_string(), 900),
                ("null pointers".to_string(), 410),
            ],
            solves: HashMap::from([(
                1,
                vec![
                    (
                        "Cyberlandslaget".to_string(),
                        "2024-03-14T10:02:11.000000Z".to_string(),
                    ),
                    (
                        "flagbearers".to_string(),
                        "2024-03-14T11:45:09.000000Z".to_string(),
                    ),
                ],
            )]),
        }
    }
}
