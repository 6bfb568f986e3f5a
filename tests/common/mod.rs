use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Json;
use http_body_util::BodyExt;
use serde_json::{Value, json};

pub const TEST_EMAIL: &str = "me@example.com";
pub const TEST_PASSWORD: &str = "hunter2";

/// Shared state behind the mock remote blog API.
#[derive(Default)]
pub struct MockData {
    pub posts: Vec<Value>,
    pub tags: Vec<Value>,
    pub tag_types: Vec<Value>,
    pub user: Option<(String, String)>,
    /// When set, read endpoints return 500 so degraded rendering can be
    /// exercised without tearing the mock down.
    pub fail_reads: bool,
    next_id: i64,
}

impl MockData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MockApi(pub Arc<Mutex<MockData>>);

impl MockApi {
    pub fn lock(&self) -> std::sync::MutexGuard<'_, MockData> {
        self.0.lock().unwrap()
    }

    /// Insert a post directly into the mock store.
    pub fn seed_post(&self, title: &str, created_at: &str, tag_ids: &[i64]) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        let tags: Vec<Value> = tag_ids
            .iter()
            .filter_map(|tag_id| {
                data.tags
                    .iter()
                    .find(|t| t["id"] == json!(tag_id))
                    .cloned()
            })
            .collect();
        data.posts.push(json!({
            "id": id,
            "title": title,
            "content": format!("<p>{title} body</p>"),
            "created_at": created_at,
            "tags": tags,
        }));
        id
    }

    pub fn seed_tag_type(&self, name: &str, color: &str) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        data.tag_types.push(json!({"id": id, "name": name, "color": color}));
        id
    }

    pub fn seed_tag(&self, name: &str, type_name: &str) -> i64 {
        let mut data = self.lock();
        let id = data.next_id();
        let tag_type = data
            .tag_types
            .iter()
            .find(|t| t["name"] == json!(type_name))
            .cloned()
            .unwrap_or_else(|| json!({"name": type_name, "color": "#808080"}));
        data.tags.push(json!({
            "id": id,
            "name": name,
            "tag_type": {"name": tag_type["name"], "color": tag_type["color"]},
        }));
        id
    }
}

fn page_of(items: &[Value], params: &HashMap<String, String>) -> Value {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let total_pages = items.len().div_ceil(limit.max(1));
    let start = (page.max(1) - 1).saturating_mul(limit);
    let posts: Vec<Value> = items.iter().skip(start).take(limit).cloned().collect();
    json!({"posts": posts, "total_pages": total_pages})
}

async fn mock_list_posts(
    State(api): State<MockApi>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let data = api.lock();
    if data.fail_reads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    let filtered: Vec<Value> = match (params.get("year"), params.get("month")) {
        (Some(year), Some(month)) => {
            let month: u32 = month.parse().unwrap_or(0);
            let prefix = format!("{year}-{month:02}-");
            data.posts
                .iter()
                .filter(|p| {
                    p["created_at"]
                        .as_str()
                        .is_some_and(|c| c.starts_with(&prefix))
                })
                .cloned()
                .collect()
        }
        _ => data.posts.clone(),
    };
    Json(page_of(&filtered, &params)).into_response()
}

async fn mock_search_posts(
    State(api): State<MockApi>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let data = api.lock();
    if data.fail_reads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    let query = params.get("query").cloned().unwrap_or_default().to_lowercase();
    let matched: Vec<Value> = data
        .posts
        .iter()
        .filter(|p| {
            let title = p["title"].as_str().unwrap_or_default().to_lowercase();
            let content = p["content"].as_str().unwrap_or_default().to_lowercase();
            title.contains(&query) || content.contains(&query)
        })
        .cloned()
        .collect();
    Json(page_of(&matched, &params)).into_response()
}

async fn mock_get_post(State(api): State<MockApi>, Path(id): Path<i64>) -> Response {
    let data = api.lock();
    match data.posts.iter().find(|p| p["id"] == json!(id)) {
        Some(post) => Json(post.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "post not found").into_response(),
    }
}

async fn mock_create_post(State(api): State<MockApi>, Json(body): Json<Value>) -> Response {
    let mut data = api.lock();
    let id = data.next_id();
    let tag_names: Vec<String> = body["tags"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let tags: Vec<Value> = data
        .tags
        .iter()
        .filter(|t| tag_names.iter().any(|n| t["name"] == json!(n)))
        .cloned()
        .collect();
    let post = json!({
        "id": id,
        "title": body["title"],
        "content": body["content"],
        "created_at": body.get("created_at").cloned().unwrap_or(json!("2024-01-01T12:00:00Z")),
        "tags": tags,
    });
    data.posts.push(post.clone());
    Json(post).into_response()
}

async fn mock_update_post(
    State(api): State<MockApi>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = api.lock();
    let tags: Vec<Value> = {
        let tag_names: Vec<String> = body["tags"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        data.tags
            .iter()
            .filter(|t| tag_names.iter().any(|n| t["name"] == json!(n)))
            .cloned()
            .collect()
    };
    match data.posts.iter_mut().find(|p| p["id"] == json!(id)) {
        Some(post) => {
            post["title"] = body["title"].clone();
            post["content"] = body["content"].clone();
            if let Some(created_at) = body.get("created_at") {
                post["created_at"] = created_at.clone();
            }
            post["tags"] = json!(tags);
            Json(post.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "post not found").into_response(),
    }
}

async fn mock_delete_post(State(api): State<MockApi>, Path(id): Path<i64>) -> Response {
    let mut data = api.lock();
    let before = data.posts.len();
    data.posts.retain(|p| p["id"] != json!(id));
    if data.posts.len() == before {
        (StatusCode::NOT_FOUND, "post not found").into_response()
    } else {
        Json(json!({})).into_response()
    }
}

async fn mock_list_tags(State(api): State<MockApi>) -> Response {
    let data = api.lock();
    if data.fail_reads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!(data.tags)).into_response()
}

async fn mock_create_tag(State(api): State<MockApi>, Json(body): Json<Value>) -> Response {
    let mut data = api.lock();
    let id = data.next_id();
    let tag_type = data
        .tag_types
        .iter()
        .find(|t| t["name"] == body["tag_type"])
        .cloned()
        .unwrap_or_else(|| json!({"name": "default", "color": "#808080"}));
    let tag = json!({
        "id": id,
        "name": body["name"],
        "tag_type": {"name": tag_type["name"], "color": tag_type["color"]},
    });
    data.tags.push(tag.clone());
    Json(tag).into_response()
}

async fn mock_delete_tag(State(api): State<MockApi>, Path(id): Path<i64>) -> Response {
    let mut data = api.lock();
    let before = data.tags.len();
    data.tags.retain(|t| t["id"] != json!(id));
    if data.tags.len() == before {
        (StatusCode::NOT_FOUND, "tag not found").into_response()
    } else {
        Json(json!({})).into_response()
    }
}

async fn mock_list_tag_types(State(api): State<MockApi>) -> Response {
    let data = api.lock();
    if data.fail_reads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!(data.tag_types)).into_response()
}

async fn mock_create_tag_type(State(api): State<MockApi>, Json(body): Json<Value>) -> Response {
    let mut data = api.lock();
    let id = data.next_id();
    let tag_type = json!({"id": id, "name": body["name"], "color": body["color"]});
    data.tag_types.push(tag_type.clone());
    Json(tag_type).into_response()
}

async fn mock_update_tag_type(
    State(api): State<MockApi>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = api.lock();
    match data.tag_types.iter_mut().find(|t| t["id"] == json!(id)) {
        Some(tag_type) => {
            tag_type["color"] = body["color"].clone();
            Json(tag_type.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "tag type not found").into_response(),
    }
}

async fn mock_delete_tag_type(State(api): State<MockApi>, Path(id): Path<i64>) -> Response {
    let mut data = api.lock();
    let Some(tag_type) = data.tag_types.iter().find(|t| t["id"] == json!(id)).cloned() else {
        return (StatusCode::NOT_FOUND, "tag type not found").into_response();
    };
    let referenced = data
        .tags
        .iter()
        .any(|t| t["tag_type"]["name"] == tag_type["name"]);
    if referenced {
        return (StatusCode::CONFLICT, "tag type has tags").into_response();
    }
    data.tag_types.retain(|t| t["id"] != json!(id));
    Json(json!({})).into_response()
}

async fn mock_user_exists(State(api): State<MockApi>) -> Json<Value> {
    Json(json!({"user_exists": api.lock().user.is_some()}))
}

async fn mock_create_user(State(api): State<MockApi>, Json(body): Json<Value>) -> Json<Value> {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    api.lock().user = Some((email, password));
    Json(json!({}))
}

async fn mock_sign_in(State(api): State<MockApi>, Json(body): Json<Value>) -> Response {
    let data = api.lock();
    let matches = data.user.as_ref().is_some_and(|(email, password)| {
        body["email"] == json!(email) && body["password"] == json!(password)
    });
    if matches {
        Json(json!({"token": "test-token"})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "bad credentials").into_response()
    }
}

fn mock_router(api: MockApi) -> Router {
    Router::new()
        .route("/posts", get(mock_list_posts))
        .route("/posts", post(mock_create_post))
        .route("/posts/search", get(mock_search_posts))
        .route("/posts/{id}", get(mock_get_post))
        .route("/posts/{id}", put(mock_update_post))
        .route("/posts/{id}", delete(mock_delete_post))
        .route("/tags", get(mock_list_tags))
        .route("/tags", post(mock_create_tag))
        .route("/tags/tag_types", get(mock_list_tag_types))
        .route("/tags/tag_types", post(mock_create_tag_type))
        .route("/tags/tag_types/{id}", put(mock_update_tag_type))
        .route("/tags/tag_types/{id}", delete(mock_delete_tag_type))
        .route("/tags/{id}", delete(mock_delete_tag))
        .route("/users/exists", get(mock_user_exists))
        .route("/users", post(mock_create_user))
        .route("/users/sign_in", post(mock_sign_in))
        .with_state(api)
}

pub struct TestApp {
    pub router: Router,
    pub api: MockApi,
}

/// An app wired to an API base URL nothing listens on, for checking that
/// views degrade instead of erroring when the remote is unreachable.
pub fn dead_app() -> Router {
    let config = daybook::config::Config {
        api_url: "http://127.0.0.1:9".parse().expect("valid URL"),
        api_key: "test-key".to_string(),
        timeout: 1,
        secure_cookies: false,
    };
    daybook::build_app(&config)
}

impl TestApp {
    /// Start the mock remote API on an ephemeral port and build the app
    /// against it. reqwest needs a real socket, so the mock is served for
    /// real rather than driven with oneshot.
    pub async fn new() -> Self {
        let api = MockApi::default();

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind mock API listener");
        let addr = listener.local_addr().expect("Mock API has a local addr");
        let mock = mock_router(api.clone());
        tokio::spawn(async move {
            axum::serve(listener, mock).await.expect("Mock API server failed");
        });

        let config = daybook::config::Config {
            api_url: format!("http://{addr}").parse().expect("valid mock URL"),
            api_key: "test-key".to_string(),
            timeout: 5,
            secure_cookies: false,
        };
        let router = daybook::build_app(&config);

        Self { router, api }
    }

    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Seed an account in the mock API, sign in through the app, and
    /// return the session cookie.
    pub async fn login(&self) -> String {
        self.api.lock().user = Some((TEST_EMAIL.to_string(), TEST_PASSWORD.to_string()));

        let body = format!(
            "email={}&password={}",
            TEST_EMAIL.replace('@', "%40"),
            TEST_PASSWORD
        );
        let resp = self.post_form("/login", &body, None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}
