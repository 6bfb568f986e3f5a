use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::Post;

const EXPORT_PAGE_SIZE: i64 = 100;

#[derive(Serialize)]
struct ExportPost {
    id: i64,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    tags: Vec<String>,
}

#[derive(Serialize)]
struct ExportData {
    exported_at: DateTime<Utc>,
    posts: Vec<ExportPost>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/export", get(export_data))
}

/// Walk every page of the feed and hand the lot back as a JSON download.
async fn export_data(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let mut posts: Vec<Post> = Vec::new();
    let mut page = 1;
    loop {
        let batch = state.api.posts(page, EXPORT_PAGE_SIZE).await?;
        let total_pages = batch.total_pages;
        posts.extend(batch.posts);
        if page >= total_pages {
            break;
        }
        page += 1;
    }

    let export = ExportData {
        exported_at: Utc::now(),
        posts: posts
            .into_iter()
            .map(|post| ExportPost {
                id: post.id,
                title: post.title,
                content: post.content,
                created_at: post.created_at,
                tags: post.tags.into_iter().map(|t| t.name).collect(),
            })
            .collect(),
    };

    let filename = format!("daybook-export-{}.json", Utc::now().format("%Y-%m-%d"));
    let content_disposition = format!("attachment; filename=\"{filename}\"");

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    Ok((headers, Json(export)))
}
