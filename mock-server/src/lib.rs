//! A small in-memory imitation of the GitLab v4 REST API.
//!
//! Serves seeded users with GitLab-style pagination headers, CRUD over
//! projects, an echo endpoint that reports the exact request it received, and
//! a route that answers 200 with a body that is not JSON.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Full replacement: a missing or null `description` clears it.
#[derive(Deserialize)]
pub struct ReplaceProject {
    pub name: String,
    pub description: Option<String>,
}

/// What `/echo` saw on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Deserialize)]
pub struct Pagination {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

const DEFAULT_PER_PAGE: usize = 20;

#[derive(Default)]
pub struct Store {
    users: Vec<User>,
    projects: BTreeMap<u64, Project>,
    next_project_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

/// Seeded with `user_count` users named `user1..=userN`.
pub fn app_with_users(user_count: u64) -> Router {
    let store = Store {
        users: (1..=user_count)
            .map(|id| User {
                id,
                username: format!("user{id}"),
                name: format!("User {id}"),
            })
            .collect(),
        projects: BTreeMap::new(),
        next_project_id: 1,
    };
    let db: Db = Arc::new(RwLock::new(store));

    let api = Router::new()
        .route("/users", get(list_users))
        .route("/projects", post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).put(replace_project).delete(delete_project),
        )
        .route("/echo", post(echo).put(echo))
        .route("/broken", get(broken));

    Router::new()
        .nest("/api/v4", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub fn app() -> Router {
    app_with_users(5)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn gitlab_message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

fn project_not_found() -> Response {
    gitlab_message(StatusCode::NOT_FOUND, "404 Project Not Found")
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 Not Found")
}

async fn list_users(State(db): State<Db>, Query(paging): Query<Pagination>) -> Response {
    let store = db.read().await;
    let per_page = paging.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
    let page = paging.page.unwrap_or(1).max(1);
    let total = store.users.len();
    let total_pages = total.div_ceil(per_page).max(1);

    let items: Vec<User> = store
        .users
        .iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .cloned()
        .collect();

    let mut headers = HeaderMap::new();
    let mut set = |name: &'static str, value: String| {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.append(name, value);
        }
    };
    set("x-total", total.to_string());
    set("x-total-pages", total_pages.to_string());
    set("x-page", page.to_string());
    set("x-per-page", per_page.to_string());
    set(
        "x-next-page",
        if page < total_pages { (page + 1).to_string() } else { String::new() },
    );
    if page < total_pages {
        set(
            "link",
            format!("</api/v4/users?page={}&per_page={per_page}>; rel=\"next\"", page + 1),
        );
    }
    set(
        "link",
        format!("</api/v4/users?page={total_pages}&per_page={per_page}>; rel=\"last\""),
    );

    (headers, Json(items)).into_response()
}

async fn create_project(State(db): State<Db>, Json(input): Json<CreateProject>) -> Response {
    let Some(name) = input.name.filter(|n| !n.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "name is missing" })),
        )
            .into_response();
    };

    let mut store = db.write().await;
    let id = store.next_project_id;
    store.next_project_id += 1;
    let project = Project {
        id,
        name,
        description: input.description,
    };
    store.projects.insert(id, project.clone());
    tracing::info!(id, "created project");

    (StatusCode::CREATED, Json(project)).into_response()
}

async fn get_project(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    match db.read().await.projects.get(&id) {
        Some(project) => Json(project.clone()).into_response(),
        None => project_not_found(),
    }
}

async fn replace_project(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<ReplaceProject>,
) -> Response {
    let mut store = db.write().await;
    let Some(project) = store.projects.get_mut(&id) else {
        return project_not_found();
    };
    project.name = input.name;
    project.description = input.description;
    Json(project.clone()).into_response()
}

async fn delete_project(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    match db.write().await.projects.remove(&id) {
        Some(_) => gitlab_message(StatusCode::ACCEPTED, "202 Accepted"),
        None => project_not_found(),
    }
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn broken() -> &'static str {
    "this is not json"
}
