use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::home::{PostCard, post_card};
use crate::routes::{PageLink, page_window};

const SEARCH_PAGE_SIZE: i64 = 10;

#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate {
    query: String,
    searched: bool,
    error: Option<String>,
    posts: Vec<PostCard>,
    page: i64,
    total_pages: i64,
    pages: Vec<PageLink>,
    show_first: bool,
    show_last: bool,
    static_hash: &'static str,
    email: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
    page: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search))
}

async fn search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.query.unwrap_or_default();
    let page = params.page.unwrap_or(1).max(1);

    let mut searched = false;
    let mut error = None;
    let mut posts = vec![];
    let mut total_pages = 0;

    if !query.trim().is_empty() {
        searched = true;
        match state.api.search(query.trim(), page, SEARCH_PAGE_SIZE).await {
            Ok(result) => {
                posts = result.posts.into_iter().map(post_card).collect();
                total_pages = result.total_pages;
            }
            Err(e) => {
                tracing::error!("Search failed: {e}");
                error = Some("Search failed, try again.".to_string());
            }
        }
    }

    let window = page_window(page, total_pages, 3);
    let template = SearchTemplate {
        query,
        searched,
        error,
        posts,
        page,
        total_pages,
        pages: window.pages,
        show_first: window.show_first,
        show_last: window.show_last,
        static_hash: crate::STATIC_HASH,
        email: user.email,
    };
    Ok(Html(template.render()?))
}
