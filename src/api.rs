//! Typed client for the remote blog API.
//!
//! Every piece of durable state (posts, tags, tag types, users) lives
//! behind this API; the rest of the application only ever sees the typed
//! methods here. The static API key rides on every request; session-gated
//! calls additionally carry the bearer token issued at sign-in.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Config;
use crate::models::{Credentials, Post, PostInput, PostPage, SignInResponse, Tag, TagType, UserExists};

const API_KEY_HEADER: &str = "x-api-key";

/// Page size used when fetching a whole month of posts at once. Large
/// enough that a month of journaling realistically fits in one page.
pub const MONTH_PAGE_LIMIT: i64 = 500;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure or undecodable response body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401 from the API: the session token is missing or expired.
    #[error("Authentication required")]
    Unauthorized,

    /// 404: the referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409: the operation violates referential integrity on the remote
    /// side, e.g. deleting a tag type that still has tags.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 4xx: the API rejected the payload.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anything else the API reports as its own failure.
    #[error("API error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ApiResult<T> {
        let mut request = self
            .client
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .client
            .put(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str, token: &str) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::classify(status, response.text().await.unwrap_or_default()))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::classify(status, text));
        }
        response.json().await.map_err(Into::into)
    }

    fn classify(status: StatusCode, text: String) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(text),
            StatusCode::CONFLICT => ApiError::Conflict(text),
            s if s.is_client_error() => ApiError::Validation(text),
            _ => ApiError::Internal(text),
        }
    }

    // ========== Posts ==========

    /// One page of the home feed, newest first.
    pub async fn posts(&self, page: i64, limit: i64) -> ApiResult<PostPage> {
        self.get(
            "/posts",
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Every post whose `created_at` falls within the given month.
    /// Requests one oversized page rather than paginating.
    pub async fn posts_for_month(&self, year: i32, month: u32) -> ApiResult<Vec<Post>> {
        let page: PostPage = self
            .get(
                "/posts",
                &[
                    ("year", year.to_string()),
                    ("month", month.to_string()),
                    ("page", "1".to_string()),
                    ("limit", MONTH_PAGE_LIMIT.to_string()),
                ],
            )
            .await?;
        Ok(page.posts)
    }

    pub async fn post(&self, id: i64) -> ApiResult<Post> {
        self.get(&format!("/posts/{id}"), &[]).await
    }

    pub async fn create_post(&self, token: &str, input: &PostInput) -> ApiResult<Post> {
        self.post_json("/posts", Some(token), input).await
    }

    pub async fn update_post(&self, token: &str, id: i64, input: &PostInput) -> ApiResult<Post> {
        self.put(&format!("/posts/{id}"), token, input).await
    }

    pub async fn delete_post(&self, token: &str, id: i64) -> ApiResult<()> {
        self.delete(&format!("/posts/{id}"), token).await
    }

    pub async fn search(&self, query: &str, page: i64, limit: i64) -> ApiResult<PostPage> {
        self.get(
            "/posts/search",
            &[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    // ========== Tags ==========

    pub async fn tags(&self) -> ApiResult<Vec<Tag>> {
        self.get("/tags", &[]).await
    }

    pub async fn create_tag(&self, token: &str, name: &str, tag_type: &str) -> ApiResult<Tag> {
        #[derive(Serialize)]
        struct NewTag<'a> {
            name: &'a str,
            tag_type: &'a str,
        }
        self.post_json("/tags", Some(token), &NewTag { name, tag_type }).await
    }

    pub async fn delete_tag(&self, token: &str, id: i64) -> ApiResult<()> {
        self.delete(&format!("/tags/{id}"), token).await
    }

    pub async fn tag_types(&self) -> ApiResult<Vec<TagType>> {
        self.get("/tags/tag_types", &[]).await
    }

    pub async fn create_tag_type(&self, token: &str, name: &str, color: &str) -> ApiResult<TagType> {
        #[derive(Serialize)]
        struct NewTagType<'a> {
            name: &'a str,
            color: &'a str,
        }
        self.post_json("/tags/tag_types", Some(token), &NewTagType { name, color })
            .await
    }

    pub async fn update_tag_type(&self, token: &str, id: i64, color: &str) -> ApiResult<TagType> {
        #[derive(Serialize)]
        struct TagTypeUpdate<'a> {
            color: &'a str,
        }
        self.put(&format!("/tags/tag_types/{id}"), token, &TagTypeUpdate { color })
            .await
    }

    pub async fn delete_tag_type(&self, token: &str, id: i64) -> ApiResult<()> {
        self.delete(&format!("/tags/tag_types/{id}"), token).await
    }

    // ========== Users ==========

    /// Whether any account exists yet. Drives the first-run registration
    /// form on the login page.
    pub async fn user_exists(&self) -> ApiResult<bool> {
        let exists: UserExists = self.get("/users/exists", &[]).await?;
        Ok(exists.user_exists)
    }

    pub async fn register(&self, credentials: &Credentials) -> ApiResult<()> {
        let _: serde_json::Value = self.post_json("/users", None, credentials).await?;
        Ok(())
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> ApiResult<String> {
        let response: SignInResponse = self.post_json("/users/sign_in", None, credentials).await?;
        Ok(response.token)
    }
}
